//! Map-matching of public transport routes against the infrastructure
//! network.
//!
//! A route is matched by resolving which infrastructure links its endpoints
//! snap to, which links its stop points live on, which nodes its junction
//! points coincide with, and then routing through the resulting node
//! sequence restricted to a buffer area around the route geometry.

pub mod junctions;
pub mod stops;
pub mod terminus;

use std::collections::{BTreeMap, HashSet};

use geo_types::{LineString, Point};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::domain::{
    InfrastructureNodeId, RoutePoint, SnappedPointOnLink, VehicleMode, VehicleType,
    filter_consecutive_duplicates,
};
use crate::repository::link::find_closest_terminus_links;
use crate::repository::routing::{BufferAreaRestriction, find_route_via_nodes};
use crate::service::node::candidates::NodeSequenceCandidates;
use crate::service::node::combinations::node_id_sequence_combinations;
use crate::service::node::visited::resolve_visited_nodes;
use crate::service::node::{NodeSequenceResolution, resolve_node_id_sequence};
use crate::service::response::{RouteResult, create_route_result};

use super::RoutingFailure;
use terminus::{
    SourceRouteTerminusPoint, TerminusLinkCandidate, TerminusType,
    resolve_terminus_link_candidates, source_route_terminus_point,
};

/// Parameters for matching road junction route points to topology nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionMatchingParameters {
    /// Maximum distance between a junction route point and a node for the
    /// node to be considered its match, in meters.
    pub junction_node_match_distance: f64,
    /// Distance within which the matched node must be the only node around
    /// the junction route point, in meters.
    pub junction_node_clearing_distance: f64,
}

impl Default for JunctionMatchingParameters {
    fn default() -> Self {
        Self {
            junction_node_match_distance: 5.0,
            junction_node_clearing_distance: 30.0,
        }
    }
}

/// Tunable parameters of public transport route matching.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingParameters {
    /// Radius used to expand the route geometry into the polygon that
    /// restricts the routable edge set, in meters.
    pub buffer_radius_meters: f64,
    /// Search distance for candidate terminus links around route endpoints,
    /// in meters.
    pub terminus_link_query_distance: f64,
    /// Maximum number of candidate terminus links considered per endpoint.
    pub terminus_link_query_limit: i64,
    /// Maximum allowed distance between the caller-supplied and the locally
    /// stored location of a stop, in meters.
    pub max_stop_location_deviation: f64,
    /// Junction matching configuration; `None` disables junction matching.
    pub junction_matching: Option<JunctionMatchingParameters>,
}

impl Default for MatchingParameters {
    fn default() -> Self {
        Self {
            buffer_radius_meters: 55.0,
            terminus_link_query_distance: 50.0,
            terminus_link_query_limit: 5,
            max_stop_location_deviation: 80.0,
            junction_matching: Some(JunctionMatchingParameters::default()),
        }
    }
}

/// Validate map-matching input. Returns an error message for invalid input.
pub fn validate_input(route_points: &[RoutePoint], vehicle_type: VehicleType) -> Option<String> {
    if vehicle_type.vehicle_mode() != VehicleMode::Bus {
        return Some("Only bus infrastructure is currently supported in map-matching".to_string());
    }

    let locations: Vec<Point<f64>> = route_points.iter().map(RoutePoint::location).collect();
    if filter_consecutive_duplicates(&locations).len() < 2 {
        return Some("At least 2 distinct locations within route points must be given".to_string());
    }

    None
}

/// Build node sequence candidates for every pair of terminus link
/// candidates, ordered by preference.
///
/// Pairs whose links host the terminus stop points sort first, then pairs
/// with closer snap distances. Node sequences already produced by an
/// earlier pair are dropped, which avoids routing the same sequence twice
/// when several candidate links snap onto shared endpoint nodes.
pub fn sorted_node_sequence_candidates(
    start_link_candidates: &[TerminusLinkCandidate],
    end_link_candidates: &[TerminusLinkCandidate],
    via_node_ids: &[InfrastructureNodeId],
) -> Vec<NodeSequenceCandidates> {
    let link_id_of_start_stop = start_link_candidates
        .iter()
        .find(|c| c.stop_match_found_by_national_id)
        .map(|c| c.point_on_link.link_id);
    let link_id_of_end_stop = end_link_candidates
        .iter()
        .find(|c| c.stop_match_found_by_national_id)
        .map(|c| c.point_on_link.link_id);

    let mut seen_sequences: HashSet<Vec<i64>> = HashSet::new();
    let mut candidates: Vec<NodeSequenceCandidates> = Vec::new();

    for start_candidate in start_link_candidates {
        for end_candidate in end_link_candidates {
            let start_link: &SnappedPointOnLink = &start_candidate.point_on_link;
            let end_link: &SnappedPointOnLink = &end_candidate.point_on_link;

            let nodes_to_visit = resolve_visited_nodes(start_link, via_node_ids, end_link);

            let node_id_sequences: Vec<_> = node_id_sequence_combinations(&nodes_to_visit)
                .into_iter()
                .filter(|sequence| seen_sequences.insert(sequence.to_values()))
                .collect();

            if node_id_sequences.is_empty() {
                continue;
            }

            if let Ok(candidate) =
                NodeSequenceCandidates::new(start_link.clone(), end_link.clone(), node_id_sequences)
            {
                if candidate.is_route_possible() {
                    candidates.push(candidate);
                }
            }
        }
    }

    let terminus_stop_count = |candidate: &NodeSequenceCandidates| -> usize {
        let start_matches = link_id_of_start_stop
            .is_some_and(|id| id == candidate.point_on_start_link.link_id);
        let end_matches =
            link_id_of_end_stop.is_some_and(|id| id == candidate.point_on_end_link.link_id);
        usize::from(start_matches) + usize::from(end_matches)
    };

    candidates.sort_by(|a, b| {
        terminus_stop_count(b)
            .cmp(&terminus_stop_count(a))
            .then_with(|| a.compare_by_terminus_distance(b))
    });

    candidates
}

/// Match a public transport route against the infrastructure network.
pub async fn find_match(
    pool: &PgPool,
    route_geometry: &LineString<f64>,
    route_points: &[RoutePoint],
    vehicle_type: VehicleType,
    parameters: &MatchingParameters,
) -> Result<RouteResult, RoutingFailure> {
    if let Some(message) = validate_input(route_points, vehicle_type) {
        return Err(RoutingFailure::InvalidValue(message));
    }

    // Stop points matched by national id; their links become via links.
    let stops_by_route_point_index = stops::find_stop_points_indexed_by_route_point_ordering(
        pool,
        route_points,
        vehicle_type,
        parameters.max_stop_location_deviation,
    )
    .await
    .map_err(|e| RoutingFailure::no_segment(e.to_string()))?;

    let stop_links_by_national_id: BTreeMap<i32, SnappedPointOnLink> = stops_by_route_point_index
        .values()
        .map(|snap| (snap.stop_national_id, snap.point_on_link.clone()))
        .collect();

    // Candidate terminus links around the endpoints of the route geometry.
    let (start_terminus, end_terminus) = route_terminus_points(route_geometry, route_points)?;

    let closest_start_links =
        closest_terminus_links(pool, &start_terminus, vehicle_type, parameters).await?;
    let closest_end_links =
        closest_terminus_links(pool, &end_terminus, vehicle_type, parameters).await?;

    let start_link_candidates = resolve_terminus_link_candidates(
        &closest_start_links,
        &start_terminus,
        &stop_links_by_national_id,
    );
    let end_link_candidates = resolve_terminus_link_candidates(
        &closest_end_links,
        &end_terminus,
        &stop_links_by_national_id,
    );

    // Junction points matched to topology nodes.
    let junction_nodes_by_route_point_index = match &parameters.junction_matching {
        Some(junction_parameters) => junctions::find_junction_nodes_indexed_by_route_point_ordering(
            pool,
            route_points,
            vehicle_type,
            junction_parameters,
        )
        .await
        .map_err(|e| RoutingFailure::no_segment(e.to_string()))?,
        None => BTreeMap::new(),
    };

    // Interim route points contribute via nodes: a matched stop through the
    // closer endpoint node of its link, a matched junction directly.
    let via_node_ids: Vec<InfrastructureNodeId> = route_points
        .iter()
        .enumerate()
        .skip(1)
        .take(route_points.len().saturating_sub(2))
        .filter_map(|(index, route_point)| match route_point {
            RoutePoint::Stop { .. } => stops_by_route_point_index
                .get(&index)
                .map(|snap| snap.point_on_link.closer_node_id()),
            RoutePoint::Junction { .. } => junction_nodes_by_route_point_index
                .get(&index)
                .map(|node| node.id),
            RoutePoint::Other { .. } => None,
        })
        .collect();

    let node_sequence_candidates =
        sorted_node_sequence_candidates(&start_link_candidates, &end_link_candidates, &via_node_ids);

    if node_sequence_candidates.is_empty() {
        return Err(RoutingFailure::no_segment(
            "Could not resolve node sequence candidates between terminus links",
        ));
    }

    let buffer = BufferAreaRestriction::new(route_geometry.clone(), parameters.buffer_radius_meters);

    let resolution = resolve_node_id_sequence(
        pool,
        &node_sequence_candidates,
        vehicle_type,
        Some(&buffer),
    )
    .await?;

    let (node_ids, start_link, end_link) = match resolution {
        NodeSequenceResolution::Succeeded {
            node_ids,
            point_on_start_link,
            point_on_end_link,
        } => (node_ids, point_on_start_link, point_on_end_link),
        NodeSequenceResolution::Failed { message } => {
            warn!(message, "node sequence resolution failed in map-matching");
            return Err(RoutingFailure::no_segment(message));
        }
    };

    debug!(node_ids = %node_ids, "resolved node sequence for matched route");

    let route = find_route_via_nodes(
        pool,
        &node_ids,
        vehicle_type,
        Some(start_link.fractional_measure),
        Some(end_link.fractional_measure),
        Some(&BufferAreaRestriction::with_terminus_links(
            route_geometry.clone(),
            parameters.buffer_radius_meters,
            &start_link,
            &end_link,
        )),
    )
    .await?;

    create_route_result(&route)
}

fn route_terminus_points(
    route_geometry: &LineString<f64>,
    route_points: &[RoutePoint],
) -> Result<(SourceRouteTerminusPoint, SourceRouteTerminusPoint), RoutingFailure> {
    let (first_coord, last_coord) = match (route_geometry.0.first(), route_geometry.0.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(RoutingFailure::invalid_value(
                "Route geometry must not be empty",
            ));
        }
    };
    let (first_point, last_point) = match (route_points.first(), route_points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(RoutingFailure::invalid_value(
                "At least 2 route points must be given",
            ));
        }
    };

    Ok((
        source_route_terminus_point(first_point, Point::from(first_coord), TerminusType::Start),
        source_route_terminus_point(last_point, Point::from(last_coord), TerminusType::End),
    ))
}

async fn closest_terminus_links(
    pool: &PgPool,
    terminus_point: &SourceRouteTerminusPoint,
    vehicle_type: VehicleType,
    parameters: &MatchingParameters,
) -> Result<Vec<SnappedPointOnLink>, RoutingFailure> {
    let links = find_closest_terminus_links(
        pool,
        terminus_point.location(),
        vehicle_type,
        parameters.terminus_link_query_distance,
        parameters.terminus_link_query_limit,
    )
    .await
    .map_err(|e| RoutingFailure::no_segment(e.to_string()))?;

    if links.is_empty() {
        return Err(RoutingFailure::no_segment(format!(
            "Could not find any infrastructure link within {} meters from route {} point",
            parameters.terminus_link_query_distance,
            terminus_point.terminus_type(),
        )));
    }

    Ok(links)
}
