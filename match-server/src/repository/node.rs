//! Queries over infrastructure network nodes (pgRouting vertices).

use std::collections::BTreeMap;

use geo_types::Point;
use sqlx::{PgPool, Row};

use crate::domain::{
    InfrastructureLinkId, InfrastructureNodeId, NodeIdSequence, NodeProximity, VehicleType,
};

use super::RepositoryError;
use super::edge_query;
use super::routing::BufferAreaRestriction;
use crate::geometry::linestring_to_geojson_text;

/// Nodes found around one source point, ordered by distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPointToNodesResult {
    /// The source point, in WGS84.
    pub point: Point<f64>,
    /// The search radius the query was performed with, in meters.
    pub node_query_distance: f64,
    pub nodes: Vec<NodeProximity>,
}

/// Find the topology nodes within `distance_in_meters` of each given point.
///
/// Only nodes terminating at least one link safely traversable by the given
/// vehicle type qualify. The returned map is keyed by the 1-based ordering
/// of the input points; per point, nodes are ordered closest first.
pub async fn find_n_closest_nodes(
    pool: &PgPool,
    points: &[Point<f64>],
    vehicle_type: VehicleType,
    distance_in_meters: f64,
) -> Result<BTreeMap<usize, SnapPointToNodesResult>, RepositoryError> {
    if points.is_empty() {
        return Ok(BTreeMap::new());
    }

    let lngs: Vec<f64> = points.iter().map(|p| p.x()).collect();
    let lats: Vec<f64> = points.iter().map(|p| p.y()).collect();

    let rows = sqlx::query(FIND_N_CLOSEST_NODES_SQL)
        .bind(lngs)
        .bind(lats)
        .bind(vehicle_type.as_str())
        .bind(distance_in_meters)
        .fetch_all(pool)
        .await?;

    let mut results: BTreeMap<usize, SnapPointToNodesResult> = BTreeMap::new();

    for row in &rows {
        let point_seq: i64 = row.try_get("point_seq")?;
        let node_id: i64 = row.try_get("node_id")?;
        let node_distance: f64 = row.try_get("node_distance")?;

        let point_index = (point_seq - 1) as usize;
        let point = *points.get(point_index).ok_or_else(|| {
            RepositoryError::invalid_row(format!("point ordering out of range: {point_seq}"))
        })?;

        let proximity = NodeProximity {
            id: InfrastructureNodeId::new(node_id).map_err(RepositoryError::invalid_row)?,
            distance_to_node: node_distance.max(0.0),
        };

        results
            .entry(point_seq as usize)
            .or_insert_with(|| SnapPointToNodesResult {
                point,
                node_query_distance: distance_in_meters,
                nodes: Vec::new(),
            })
            .nodes
            .push(proximity);
    }

    Ok(results)
}

/// Pick the best of up to four candidate node sequences between two terminus
/// links.
///
/// Each sequence is routed with `pgr_dijkstraVia` inside the query; a
/// sequence qualifies only when its traversed edge set contains both
/// terminus links, and the cheapest qualifying sequence wins. Returns `None`
/// when no sequence produces a valid route.
pub async fn resolve_best_node_sequence(
    pool: &PgPool,
    start_link_id: InfrastructureLinkId,
    end_link_id: InfrastructureLinkId,
    node_id_sequences: &[NodeIdSequence],
    vehicle_type: VehicleType,
    buffer_area_restriction: Option<&BufferAreaRestriction>,
) -> Result<Option<NodeIdSequence>, RepositoryError> {
    if node_id_sequences.is_empty() {
        return Ok(None);
    }
    if node_id_sequences.len() > 4 {
        return Err(RepositoryError::InvalidRow(format!(
            "at most four node sequences may be given: {}",
            node_id_sequences.len()
        )));
    }

    // Pad to exactly four array parameters; empty arrays are filtered out
    // inside the query.
    let mut sequences: Vec<Vec<i64>> = node_id_sequences
        .iter()
        .map(NodeIdSequence::to_values)
        .collect();
    sequences.resize(4, Vec::new());

    let rows = match buffer_area_restriction {
        None => {
            let sql = resolve_best_node_sequence_sql(&edge_query::vehicle_type_constrained(7));
            sqlx::query(&sql)
                .bind(sequences[0].clone())
                .bind(sequences[1].clone())
                .bind(sequences[2].clone())
                .bind(sequences[3].clone())
                .bind(start_link_id.value())
                .bind(end_link_id.value())
                .bind(vehicle_type.as_str())
                .fetch_all(pool)
                .await?
        }
        Some(buffer) => {
            let sql = resolve_best_node_sequence_sql(
                &edge_query::vehicle_type_and_buffer_area_constrained(7, Some(8), Some(9), 10, 11),
            );
            sqlx::query(&sql)
                .bind(sequences[0].clone())
                .bind(sequences[1].clone())
                .bind(sequences[2].clone())
                .bind(sequences[3].clone())
                .bind(start_link_id.value())
                .bind(end_link_id.value())
                .bind(vehicle_type.as_str())
                .bind(buffer.terminus_link_ids_literal())
                .bind(buffer.terminus_node_ids_literal())
                .bind(linestring_to_geojson_text(&buffer.line_geometry))
                .bind(buffer.buffer_radius_meters)
                .fetch_all(pool)
                .await?
        }
    };

    let node_ids = rows
        .iter()
        .map(|row| {
            let node_id: i64 = row.try_get("node_id")?;
            InfrastructureNodeId::new(node_id).map_err(RepositoryError::invalid_row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if node_ids.is_empty() {
        Ok(None)
    } else {
        Ok(Some(NodeIdSequence::new(node_ids)))
    }
}

const FIND_N_CLOSEST_NODES_SQL: &str = r#"
SELECT
    point.seq AS point_seq,
    close_node.id AS node_id,
    close_node.distance AS node_distance
FROM (
    SELECT ord AS seq,
        ST_Transform(ST_SetSRID(ST_MakePoint(lng, lat), 4326), 3067) AS geom
    FROM unnest($1::float8[], $2::float8[]) WITH ORDINALITY AS coords (lng, lat, ord)
) point
CROSS JOIN LATERAL (
    SELECT
        node.id,
        point.geom <-> node.the_geom AS distance
    FROM routing.infrastructure_link_vertices_pgr node
    WHERE ST_DWithin(point.geom, node.the_geom, $4)
        AND EXISTS (
            SELECT 1
            FROM routing.infrastructure_link link
            INNER JOIN routing.infrastructure_link_safely_traversed_by_vehicle_type safe
                ON safe.infrastructure_link_id = link.infrastructure_link_id
            WHERE safe.vehicle_type = $3
                AND (link.start_node_id = node.id OR link.end_node_id = node.id)
        )
) close_node
ORDER BY point_seq, distance
"#;

/// Query choosing the cheapest node sequence whose route covers both
/// terminus links. The four candidate sequences are bound as bigint arrays;
/// empty arrays stand for absent candidates.
fn resolve_best_node_sequence_sql(edge_query_sql: &str) -> String {
    format!(
        r#"
SELECT unnest(best.node_arr) AS node_id
FROM (
    SELECT node_seq.node_arr
    FROM (
        SELECT _node_seq.*
        FROM (
            SELECT 1 AS node_seq_id, $1::bigint[] AS node_arr
            UNION SELECT 2, $2::bigint[]
            UNION SELECT 3, $3::bigint[]
            UNION SELECT 4, $4::bigint[]
        ) _node_seq
        WHERE cardinality(_node_seq.node_arr) > 0
    ) AS node_seq
    CROSS JOIN (
        SELECT $5::bigint AS start_link_id, $6::bigint AS end_link_id
    ) AS terminus_links
    CROSS JOIN LATERAL (
        SELECT max(pgr.route_agg_cost) AS route_agg_cost
        FROM pgr_dijkstraVia(
            {edge_query_sql},
            node_seq.node_arr,
            directed := true,
            strict := true,
            U_turn_on_edge := true
        ) AS pgr
        GROUP BY node_seq.node_seq_id
        HAVING array_agg(pgr.edge) @> ARRAY[terminus_links.start_link_id, terminus_links.end_link_id]
    ) route_overview
    ORDER BY route_overview.route_agg_cost
    LIMIT 1
) best
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_node_query_requires_traversable_incident_link() {
        assert!(FIND_N_CLOSEST_NODES_SQL.contains("infrastructure_link_vertices_pgr"));
        assert!(FIND_N_CLOSEST_NODES_SQL
            .contains("link.start_node_id = node.id OR link.end_node_id = node.id"));
        assert!(FIND_N_CLOSEST_NODES_SQL.contains("safe.vehicle_type = $3"));
        assert!(FIND_N_CLOSEST_NODES_SQL.contains("ORDER BY point_seq, distance"));
    }

    #[test]
    fn best_sequence_query_requires_both_terminus_links_on_route() {
        let sql = resolve_best_node_sequence_sql(&edge_query::vehicle_type_constrained(7));
        assert!(sql.contains("HAVING array_agg(pgr.edge) @> ARRAY[terminus_links.start_link_id, terminus_links.end_link_id]"));
        assert!(sql.contains("WHERE cardinality(_node_seq.node_arr) > 0"));
        assert!(sql.contains("ORDER BY route_overview.route_agg_cost"));
        assert!(sql.contains("LIMIT 1"));
    }
}
