//! Shortest-path queries through pgRouting.

use std::collections::BTreeSet;

use geo_types::LineString;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::{
    ExternalLinkReference, InfrastructureLinkId, InfrastructureNodeId, LinkTraversal,
    MultilingualString, NodeIdSequence, SnappedPointOnLink, VehicleType,
};
use crate::geometry::{linestring_from_geojson_text, linestring_to_geojson_text};

use super::RepositoryError;
use super::edge_query;

/// Explicit terminus link/node references admitted into the routable edge
/// set even when they fall outside the buffer area.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExplicitLinkReferences {
    pub terminus_link_ids: BTreeSet<InfrastructureLinkId>,
    pub terminus_node_ids: BTreeSet<InfrastructureNodeId>,
}

impl ExplicitLinkReferences {
    /// Derive references from a pair of terminus links.
    ///
    /// A link whose snap coincides with an endpoint node is referenced
    /// through that node; otherwise the link itself must be admitted.
    pub fn from_terminus_links(
        start_link: &SnappedPointOnLink,
        end_link: &SnappedPointOnLink,
    ) -> Self {
        let mut refs = ExplicitLinkReferences::default();

        match start_link.snapped_node() {
            Some(node_id) => {
                refs.terminus_node_ids.insert(node_id);
            }
            None => {
                refs.terminus_link_ids.insert(start_link.link_id);
            }
        }
        match end_link.snapped_node() {
            Some(node_id) => {
                refs.terminus_node_ids.insert(node_id);
            }
            None => {
                refs.terminus_link_ids.insert(end_link.link_id);
            }
        }

        refs
    }
}

/// Restricts the routable edge set to links contained in a polygon formed by
/// expanding a line geometry in all directions by a buffer radius.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferAreaRestriction {
    /// The line to expand, in WGS84.
    pub line_geometry: LineString<f64>,
    pub buffer_radius_meters: f64,
    pub explicit_references: Option<ExplicitLinkReferences>,
}

impl BufferAreaRestriction {
    pub fn new(line_geometry: LineString<f64>, buffer_radius_meters: f64) -> Self {
        Self {
            line_geometry,
            buffer_radius_meters,
            explicit_references: None,
        }
    }

    pub fn with_terminus_links(
        line_geometry: LineString<f64>,
        buffer_radius_meters: f64,
        start_link: &SnappedPointOnLink,
        end_link: &SnappedPointOnLink,
    ) -> Self {
        Self {
            line_geometry,
            buffer_radius_meters,
            explicit_references: Some(ExplicitLinkReferences::from_terminus_links(
                start_link, end_link,
            )),
        }
    }

    pub(crate) fn terminus_link_ids_literal(&self) -> String {
        edge_query::array_literal(
            self.explicit_references
                .iter()
                .flat_map(|refs| refs.terminus_link_ids.iter().map(|id| id.value())),
        )
    }

    pub(crate) fn terminus_node_ids_literal(&self) -> String {
        edge_query::array_literal(
            self.explicit_references
                .iter()
                .flat_map(|refs| refs.terminus_node_ids.iter().map(|id| id.value())),
        )
    }
}

/// One traversed link of a resolved route, in route order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLink {
    pub sequence_number: i32,
    pub traversal: LinkTraversal,
}

/// Route resolution result: the traversed links plus trimmed variants of the
/// terminus links when the route starts or ends mid-link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteDto {
    pub route_links: Vec<RouteLink>,
    pub trimmed_start_link: Option<RouteLink>,
    pub trimmed_end_link: Option<RouteLink>,
}

impl RouteDto {
    pub fn is_empty(&self) -> bool {
        self.route_links.is_empty()
    }

    /// Route links with the first and last link replaced by their trimmed
    /// variants, which model the actually traversed path.
    pub fn route_links_with_trimmed_termini(&self) -> Vec<RouteLink> {
        match self.route_links.len() {
            0 => Vec::new(),
            1 => vec![
                self.trimmed_start_link
                    .clone()
                    .unwrap_or_else(|| self.route_links[0].clone()),
            ],
            _ => {
                let mut links = Vec::with_capacity(self.route_links.len());
                links.push(
                    self.trimmed_start_link
                        .clone()
                        .unwrap_or_else(|| self.route_links[0].clone()),
                );
                links.extend_from_slice(&self.route_links[1..self.route_links.len() - 1]);
                links.push(
                    self.trimmed_end_link
                        .clone()
                        .unwrap_or_else(|| self.route_links[self.route_links.len() - 1].clone()),
                );
                links
            }
        }
    }
}

/// Resolve the shortest path visiting the given network nodes in order.
///
/// The returned links carry the traversal direction recovered by comparing
/// each pgRouting step's start node with the link's own start node. When
/// fractional measures are given, additionally computes trimmed geometries
/// for the terminus links via `ST_LineSubstring`.
pub async fn find_route_via_nodes(
    pool: &PgPool,
    node_ids: &NodeIdSequence,
    vehicle_type: VehicleType,
    fractional_start_location: Option<f64>,
    fractional_end_location: Option<f64>,
    buffer_area_restriction: Option<&BufferAreaRestriction>,
) -> Result<RouteDto, RepositoryError> {
    if node_ids.is_empty() {
        return Ok(RouteDto::default());
    }

    let node_id_values = node_ids.to_values();

    let rows = match buffer_area_restriction {
        None => {
            let sql = route_via_nodes_sql(&edge_query::vehicle_type_constrained(1), 2, 3, 4);
            sqlx::query(&sql)
                .bind(vehicle_type.as_str())
                .bind(node_id_values)
                .bind(fractional_start_location)
                .bind(fractional_end_location)
                .fetch_all(pool)
                .await?
        }
        Some(buffer) => {
            let sql = route_via_nodes_sql(
                &edge_query::vehicle_type_and_buffer_area_constrained(1, Some(2), Some(3), 4, 5),
                6,
                7,
                8,
            );
            sqlx::query(&sql)
                .bind(vehicle_type.as_str())
                .bind(buffer.terminus_link_ids_literal())
                .bind(buffer.terminus_node_ids_literal())
                .bind(linestring_to_geojson_text(&buffer.line_geometry))
                .bind(buffer.buffer_radius_meters)
                .bind(node_id_values)
                .bind(fractional_start_location)
                .bind(fractional_end_location)
                .fetch_all(pool)
                .await?
        }
    };

    let mut route_links: Vec<RouteLink> = Vec::new();
    let mut trimmed_links: Vec<RouteLink> = Vec::new();

    for row in &rows {
        let trimmed: bool = row.try_get("trimmed")?;
        let link = route_link_from_row(row)?;

        if trimmed {
            trimmed_links.push(link);
        } else {
            route_links.push(link);
        }
    }

    route_links.sort_by_key(|link| link.sequence_number);
    trimmed_links.sort_by_key(|link| link.sequence_number);

    let first_seq = route_links.first().map(|link| link.sequence_number);

    let trimmed_start_link = trimmed_links
        .first()
        .filter(|link| Some(link.sequence_number) == first_seq)
        .cloned();
    let trimmed_end_link = trimmed_links
        .last()
        .filter(|link| Some(link.sequence_number) != first_seq)
        .cloned();

    Ok(RouteDto {
        route_links,
        trimmed_start_link,
        trimmed_end_link,
    })
}

fn route_link_from_row(row: &PgRow) -> Result<RouteLink, RepositoryError> {
    let sequence_number: i32 = row.try_get("seq")?;
    let link_id: i64 = row.try_get("infrastructure_link_id")?;
    let is_traversal_forwards: bool = row.try_get("is_traversal_forwards")?;
    let cost: f64 = row.try_get("cost")?;
    let infrastructure_source: String = row.try_get("infrastructure_source_name")?;
    let external_link_id: String = row.try_get("external_link_id")?;
    let link_name_json: Option<String> = row.try_get("link_name_json")?;
    let geom_json: String = row.try_get("geom_json")?;

    Ok(RouteLink {
        sequence_number,
        traversal: LinkTraversal {
            link_id: InfrastructureLinkId::new(link_id).map_err(RepositoryError::invalid_row)?,
            external_link_ref: ExternalLinkReference {
                infrastructure_source,
                external_link_id,
            },
            geometry: linestring_from_geojson_text(&geom_json)?,
            is_traversal_forwards,
            cost,
            link_name: link_name_json
                .as_deref()
                .map(MultilingualString::from_json_text)
                .transpose()
                .map_err(RepositoryError::invalid_row)?
                .unwrap_or_default(),
        },
    })
}

/// The via-nodes routing query.
///
/// `pgr_dijkstraVia` reports traversed edges but not the direction each one
/// is traversed in; the direction is recovered by comparing the step's start
/// node against the link's digitised start node. Terminus links are
/// additionally trimmed with `ST_LineSubstring` using the fractional snap
/// locations, producing the actually traversed sub-geometries.
fn route_via_nodes_sql(
    edge_query_sql: &str,
    node_ids_placeholder: usize,
    start_fraction_placeholder: usize,
    end_fraction_placeholder: usize,
) -> String {
    format!(
        r#"
WITH route_link AS (
    SELECT
        pgr.seq,
        link.infrastructure_link_id,
        (pgr.node = link.start_node_id) AS is_traversal_forwards,
        pgr.cost,
        src.infrastructure_source_name,
        link.external_link_id,
        link.name AS link_name,
        link.geom
    FROM pgr_dijkstraVia(
        {edge_query_sql},
        ${node_ids_placeholder}::bigint[],
        directed := true,
        strict := true,
        U_turn_on_edge := true
    ) pgr
    INNER JOIN routing.infrastructure_link link ON link.infrastructure_link_id = pgr.edge
    INNER JOIN routing.infrastructure_source src ON src.infrastructure_source_id = link.infrastructure_source_id
),
trimmed_terminus_link AS (
    SELECT
        seq,
        infrastructure_link_id,
        is_traversal_forwards,
        infrastructure_source_name,
        external_link_id,
        link_name,
        CASE
            WHEN max_seq = min_seq THEN CASE
                WHEN is_traversal_forwards = true AND start_link_fractional < end_link_fractional
                    THEN ST_LineSubstring(geom, start_link_fractional, end_link_fractional)
                WHEN is_traversal_forwards = false AND start_link_fractional > end_link_fractional
                    THEN ST_LineSubstring(geom, end_link_fractional, start_link_fractional)
                ELSE NULL
            END
            WHEN seq = min_seq THEN CASE
                WHEN is_traversal_forwards = true AND start_link_fractional < 1.0
                    THEN ST_LineSubstring(geom, start_link_fractional, 1.0)
                WHEN is_traversal_forwards = false AND start_link_fractional > 0.0
                    THEN ST_LineSubstring(geom, 0.0, start_link_fractional)
                ELSE NULL
            END
            ELSE CASE
                WHEN is_traversal_forwards = true AND end_link_fractional > 0.0
                    THEN ST_LineSubstring(geom, 0.0, end_link_fractional)
                WHEN is_traversal_forwards = false AND end_link_fractional < 1.0
                    THEN ST_LineSubstring(geom, end_link_fractional, 1.0)
                ELSE NULL
            END
        END AS geom
    FROM (
        SELECT min(seq) AS min_seq, max(seq) AS max_seq FROM route_link
    ) min_max_seq
    INNER JOIN route_link ON seq IN (min_seq, max_seq)
    CROSS JOIN (
        SELECT ${start_fraction_placeholder}::float8 AS start_link_fractional,
            ${end_fraction_placeholder}::float8 AS end_link_fractional
    ) substring_param
    WHERE start_link_fractional IS NOT NULL AND end_link_fractional IS NOT NULL
)
SELECT *
FROM (
    SELECT false AS trimmed,
        rl.seq,
        rl.infrastructure_link_id,
        rl.is_traversal_forwards,
        rl.cost,
        rl.infrastructure_source_name,
        rl.external_link_id,
        rl.link_name::text AS link_name_json,
        ST_AsGeoJSON(ST_Transform(rl.geom, 4326)) AS geom_json
    FROM route_link rl
    UNION ALL
    SELECT true AS trimmed,
        ttl.seq,
        ttl.infrastructure_link_id,
        ttl.is_traversal_forwards,
        ST_Length(ttl.geom) AS cost,
        ttl.infrastructure_source_name,
        ttl.external_link_id,
        ttl.link_name::text AS link_name_json,
        ST_AsGeoJSON(ST_Transform(ttl.geom, 4326)) AS geom_json
    FROM trimmed_terminus_link ttl
    WHERE ttl.geom IS NOT NULL
) combined
ORDER BY seq, trimmed
"#
    )
}
