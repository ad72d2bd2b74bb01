//! Queries over public transport stops.

use geo_types::Point;
use sqlx::{PgPool, Row};

use crate::domain::{LinkSide, SnappedPointOnLink, VehicleType};

use super::RepositoryError;
use super::link::snapped_point_from_row;

/// Parameters for matching one public transport stop by its national id.
#[derive(Debug, Clone, PartialEq)]
pub struct StopMatchParameters {
    pub national_id: i32,
    /// The stop location known to the caller, in WGS84. Used to discard
    /// stops whose stored location deviates too far from it.
    pub source_location: Point<f64>,
}

/// A stop matched by national id, snapped onto its owning infrastructure
/// link.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapStopToLinkResult {
    pub stop_national_id: i32,
    pub stop_side_on_link: LinkSide,
    pub point_on_link: SnappedPointOnLink,
}

/// Match stops by national id and snap each onto the link it is located on.
///
/// A stop qualifies only when its stored location lies within
/// `max_location_deviation_meters` of the caller-supplied location, and when
/// its owning link is safely traversable by the given vehicle type.
pub async fn find_stops_and_snap_to_links(
    pool: &PgPool,
    stop_match_params: &[StopMatchParameters],
    vehicle_type: VehicleType,
    max_location_deviation_meters: f64,
) -> Result<Vec<SnapStopToLinkResult>, RepositoryError> {
    if stop_match_params.is_empty() {
        return Ok(Vec::new());
    }

    let national_ids: Vec<i32> = stop_match_params.iter().map(|p| p.national_id).collect();
    let lngs: Vec<f64> = stop_match_params
        .iter()
        .map(|p| p.source_location.x())
        .collect();
    let lats: Vec<f64> = stop_match_params
        .iter()
        .map(|p| p.source_location.y())
        .collect();

    let rows = sqlx::query(FIND_STOPS_AND_SNAP_SQL)
        .bind(national_ids)
        .bind(lngs)
        .bind(lats)
        .bind(vehicle_type.as_str())
        .bind(max_location_deviation_meters)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let stop_national_id: i32 = row.try_get("public_transport_stop_national_id")?;
            let forward_flag: Option<bool> = row.try_get("is_on_direction_of_link_forward_traversal")?;

            Ok(SnapStopToLinkResult {
                stop_national_id,
                stop_side_on_link: LinkSide::from_forward_traversal_flag(forward_flag),
                point_on_link: snapped_point_from_row(row)?,
            })
        })
        .collect()
}

const FIND_STOPS_AND_SNAP_SQL: &str = r#"
SELECT
    stop.public_transport_stop_national_id,
    stop.is_on_direction_of_link_forward_traversal,
    link.infrastructure_link_id,
    0.0::float8 AS closest_distance,
    link.traffic_flow_direction_type,
    ST_LineLocatePoint(link.geom, stop.geom) AS fractional_measure,
    ST_Length(link.geom) AS link_length,
    link.start_node_id,
    link.end_node_id
FROM (
    SELECT ord AS seq,
        national_id,
        ST_Transform(ST_SetSRID(ST_MakePoint(lng, lat), 4326), 3067) AS src_location
    FROM unnest($1::int[], $2::float8[], $3::float8[])
        WITH ORDINALITY AS params (national_id, lng, lat, ord)
) stop_params
INNER JOIN routing.public_transport_stop stop
    ON stop.public_transport_stop_national_id = stop_params.national_id
INNER JOIN routing.infrastructure_link link
    ON link.infrastructure_link_id = stop.located_on_infrastructure_link_id
INNER JOIN routing.infrastructure_link_safely_traversed_by_vehicle_type safe
    ON safe.infrastructure_link_id = link.infrastructure_link_id
WHERE ST_DWithin(stop.geom, stop_params.src_location, $5)
    AND safe.vehicle_type = $4
ORDER BY stop_params.seq
"#;
