//! Queries over infrastructure links.

use std::collections::BTreeMap;

use geo_types::{LineString, Point};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::{
    InfrastructureLinkId, InfrastructureNodeId, MultilingualString, SnappedPointOnLink,
    TrafficFlowDirection, VehicleType,
};
use crate::geometry::linestring_from_geojson_text;

use super::RepositoryError;

/// A full row of the `infrastructure_link` table.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureLinkRecord {
    pub infrastructure_link_id: InfrastructureLinkId,
    pub infrastructure_source_id: i32,
    pub external_link_id: String,
    pub traffic_flow_direction: TrafficFlowDirection,
    pub municipality_code: Option<i32>,
    pub external_link_type: Option<i32>,
    pub external_link_state: Option<i32>,
    pub name: MultilingualString,
    /// Link geometry transformed to WGS84.
    pub geometry: LineString<f64>,
    pub start_node_id: InfrastructureNodeId,
    pub end_node_id: InfrastructureNodeId,
    pub cost: f64,
    pub reverse_cost: f64,
}

/// Result of snapping one source point to its closest infrastructure link.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPointToLinkResult {
    /// The source point, in WGS84.
    pub point: Point<f64>,
    /// The search radius the snap was performed with, in meters.
    pub link_query_distance: f64,
    pub point_on_link: SnappedPointOnLink,
}

pub async fn find_by_ids(
    pool: &PgPool,
    ids: &[InfrastructureLinkId],
) -> Result<Vec<InfrastructureLinkRecord>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let id_values: Vec<i64> = ids.iter().map(|id| id.value()).collect();

    let rows = sqlx::query(FIND_BY_IDS_SQL)
        .bind(id_values)
        .fetch_all(pool)
        .await?;

    rows.iter().map(link_record_from_row).collect()
}

/// Find the closest infrastructure link for each given point.
///
/// The returned map is keyed by the 1-based ordering of the input points;
/// points with no link within `distance_in_meters` are absent from it.
pub async fn find_closest_links(
    pool: &PgPool,
    points: &[Point<f64>],
    vehicle_type: VehicleType,
    distance_in_meters: f64,
) -> Result<BTreeMap<usize, SnapPointToLinkResult>, RepositoryError> {
    if points.is_empty() {
        return Ok(BTreeMap::new());
    }

    let lngs: Vec<f64> = points.iter().map(|p| p.x()).collect();
    let lats: Vec<f64> = points.iter().map(|p| p.y()).collect();

    let rows = sqlx::query(FIND_CLOSEST_LINKS_SQL)
        .bind(lngs)
        .bind(lats)
        .bind(vehicle_type.as_str())
        .bind(distance_in_meters)
        .fetch_all(pool)
        .await?;

    let mut results = BTreeMap::new();

    for row in &rows {
        let seq: i64 = row.try_get("seq")?;
        let point_index = (seq - 1) as usize;
        let point = *points
            .get(point_index)
            .ok_or_else(|| RepositoryError::invalid_row(format!("point ordering out of range: {seq}")))?;

        results.insert(
            seq as usize,
            SnapPointToLinkResult {
                point,
                link_query_distance: distance_in_meters,
                point_on_link: snapped_point_from_row(row)?,
            },
        );
    }

    Ok(results)
}

/// Find up to `limit` closest links around one point, ordered by distance.
///
/// Used for resolving candidate terminus links at route endpoints.
pub async fn find_closest_terminus_links(
    pool: &PgPool,
    point: Point<f64>,
    vehicle_type: VehicleType,
    distance_in_meters: f64,
    limit: i64,
) -> Result<Vec<SnappedPointOnLink>, RepositoryError> {
    let rows = sqlx::query(FIND_CLOSEST_TERMINUS_LINKS_SQL)
        .bind(point.x())
        .bind(point.y())
        .bind(vehicle_type.as_str())
        .bind(distance_in_meters)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    rows.iter().map(snapped_point_from_row).collect()
}

pub(crate) fn snapped_point_from_row(row: &PgRow) -> Result<SnappedPointOnLink, RepositoryError> {
    let link_id: i64 = row.try_get("infrastructure_link_id")?;
    let closest_distance: f64 = row.try_get("closest_distance")?;
    let fractional_measure: f64 = row.try_get("fractional_measure")?;
    let direction_value: i32 = row.try_get("traffic_flow_direction_type")?;
    let link_length: f64 = row.try_get("link_length")?;
    let start_node_id: i64 = row.try_get("start_node_id")?;
    let end_node_id: i64 = row.try_get("end_node_id")?;

    SnappedPointOnLink::new(
        InfrastructureLinkId::new(link_id).map_err(RepositoryError::invalid_row)?,
        closest_distance.max(0.0),
        fractional_measure.clamp(0.0, 1.0),
        TrafficFlowDirection::from_db_value(direction_value).map_err(RepositoryError::invalid_row)?,
        link_length,
        InfrastructureNodeId::new(start_node_id).map_err(RepositoryError::invalid_row)?,
        InfrastructureNodeId::new(end_node_id).map_err(RepositoryError::invalid_row)?,
    )
    .map_err(RepositoryError::invalid_row)
}

fn link_record_from_row(row: &PgRow) -> Result<InfrastructureLinkRecord, RepositoryError> {
    let link_id: i64 = row.try_get("infrastructure_link_id")?;
    let name_json: Option<String> = row.try_get("link_name")?;
    let geom_json: String = row.try_get("geom_json")?;
    let direction_value: i32 = row.try_get("traffic_flow_direction_type")?;
    let start_node_id: i64 = row.try_get("start_node_id")?;
    let end_node_id: i64 = row.try_get("end_node_id")?;

    Ok(InfrastructureLinkRecord {
        infrastructure_link_id: InfrastructureLinkId::new(link_id)
            .map_err(RepositoryError::invalid_row)?,
        infrastructure_source_id: row.try_get("infrastructure_source_id")?,
        external_link_id: row.try_get("external_link_id")?,
        traffic_flow_direction: TrafficFlowDirection::from_db_value(direction_value)
            .map_err(RepositoryError::invalid_row)?,
        municipality_code: row.try_get("municipality_code")?,
        external_link_type: row.try_get("external_link_type")?,
        external_link_state: row.try_get("external_link_state")?,
        name: name_json
            .as_deref()
            .map(MultilingualString::from_json_text)
            .transpose()
            .map_err(RepositoryError::invalid_row)?
            .unwrap_or_default(),
        geometry: linestring_from_geojson_text(&geom_json)?,
        start_node_id: InfrastructureNodeId::new(start_node_id)
            .map_err(RepositoryError::invalid_row)?,
        end_node_id: InfrastructureNodeId::new(end_node_id)
            .map_err(RepositoryError::invalid_row)?,
        cost: row.try_get("cost")?,
        reverse_cost: row.try_get("reverse_cost")?,
    })
}

const FIND_BY_IDS_SQL: &str = r#"
SELECT
    link.infrastructure_link_id,
    link.infrastructure_source_id,
    link.external_link_id,
    link.traffic_flow_direction_type,
    link.municipality_code,
    link.external_link_type,
    link.external_link_state,
    link.name::text AS link_name,
    ST_AsGeoJSON(ST_Transform(link.geom, 4326)) AS geom_json,
    link.start_node_id,
    link.end_node_id,
    link.cost,
    link.reverse_cost
FROM routing.infrastructure_link link
WHERE link.infrastructure_link_id = ANY($1)
ORDER BY link.infrastructure_link_id
"#;

const FIND_CLOSEST_LINKS_SQL: &str = r#"
SELECT
    point.seq,
    closest_link.infrastructure_link_id,
    closest_link.distance AS closest_distance,
    closest_link.traffic_flow_direction_type,
    closest_link.fractional_measure,
    closest_link.link_length,
    closest_link.start_node_id,
    closest_link.end_node_id
FROM (
    SELECT ord AS seq,
        ST_Transform(ST_SetSRID(ST_MakePoint(lng, lat), 4326), 3067) AS geom
    FROM unnest($1::float8[], $2::float8[]) WITH ORDINALITY AS coords (lng, lat, ord)
) point
CROSS JOIN LATERAL (
    SELECT
        link.infrastructure_link_id,
        link.traffic_flow_direction_type,
        link.start_node_id,
        link.end_node_id,
        point.geom <-> link.geom AS distance,
        ST_LineLocatePoint(link.geom, point.geom) AS fractional_measure,
        ST_Length(link.geom) AS link_length
    FROM routing.infrastructure_link link
    INNER JOIN routing.infrastructure_link_safely_traversed_by_vehicle_type safe
        ON safe.infrastructure_link_id = link.infrastructure_link_id
    WHERE ST_DWithin(point.geom, link.geom, $4)
        AND safe.vehicle_type = $3
    ORDER BY distance
    LIMIT 1
) closest_link
ORDER BY point.seq
"#;

const FIND_CLOSEST_TERMINUS_LINKS_SQL: &str = r#"
SELECT
    candidate.infrastructure_link_id,
    candidate.distance AS closest_distance,
    candidate.traffic_flow_direction_type,
    candidate.fractional_measure,
    candidate.link_length,
    candidate.start_node_id,
    candidate.end_node_id
FROM (
    SELECT ST_Transform(ST_SetSRID(ST_MakePoint($1, $2), 4326), 3067) AS geom
) point
CROSS JOIN LATERAL (
    SELECT
        link.infrastructure_link_id,
        link.traffic_flow_direction_type,
        link.start_node_id,
        link.end_node_id,
        point.geom <-> link.geom AS distance,
        ST_LineLocatePoint(link.geom, point.geom) AS fractional_measure,
        ST_Length(link.geom) AS link_length
    FROM routing.infrastructure_link link
    INNER JOIN routing.infrastructure_link_safely_traversed_by_vehicle_type safe
        ON safe.infrastructure_link_id = link.infrastructure_link_id
    WHERE ST_DWithin(point.geom, link.geom, $4)
        AND safe.vehicle_type = $3
    ORDER BY distance
    LIMIT $5
) candidate
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_link_queries_constrain_by_vehicle_type() {
        for sql in [FIND_CLOSEST_LINKS_SQL, FIND_CLOSEST_TERMINUS_LINKS_SQL] {
            assert!(sql.contains("infrastructure_link_safely_traversed_by_vehicle_type"));
            assert!(sql.contains("safe.vehicle_type = $3"));
            assert!(sql.contains("ST_DWithin"));
            assert!(sql.contains("ST_LineLocatePoint"));
        }
    }

    #[test]
    fn closest_link_search_is_distance_ordered() {
        assert!(FIND_CLOSEST_LINKS_SQL.contains("ORDER BY distance\n    LIMIT 1"));
        assert!(FIND_CLOSEST_TERMINUS_LINKS_SQL.contains("ORDER BY distance\n    LIMIT $5"));
    }

    #[test]
    fn link_rows_come_back_as_wgs84_geojson() {
        assert!(FIND_BY_IDS_SQL.contains("ST_AsGeoJSON(ST_Transform(link.geom, 4326))"));
    }
}
