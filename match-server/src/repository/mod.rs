//! Read-only SQL repositories over the routing schema.
//!
//! Every query constrains infrastructure links through the
//! `infrastructure_link_safely_traversed_by_vehicle_type` association for the
//! requested vehicle type. Geometry crosses the SQL boundary as GeoJSON:
//! `ST_AsGeoJSON(ST_Transform(geom, 4326))` on the way out and
//! `ST_GeomFromGeoJSON` / `ST_MakePoint` on the way in.

pub mod edge_query;
pub mod link;
pub mod node;
pub mod routing;
pub mod stop;

/// Error from the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database query failed: {0}")]
    Db(#[from] sqlx::Error),

    #[error("invalid geometry in query result: {0}")]
    Geometry(#[from] crate::geometry::GeometryError),

    #[error("invalid value in query result: {0}")]
    InvalidRow(String),
}

impl RepositoryError {
    pub(crate) fn invalid_row(error: impl std::fmt::Display) -> Self {
        RepositoryError::InvalidRow(error.to_string())
    }
}
