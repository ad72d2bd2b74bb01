//! Route resolution through via points.

use geo_types::Point;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::domain::{LatLng, VehicleType, filter_consecutive_duplicates};
use crate::repository::link::{SnapPointToLinkResult, find_closest_links};
use crate::repository::routing::find_route_via_nodes;
use crate::service::node::candidates::NodeSequenceCandidates;
use crate::service::node::combinations::node_id_sequence_combinations;
use crate::service::node::visited::resolve_visited_nodes;
use crate::service::node::{NodeSequenceResolution, resolve_node_id_sequence};
use crate::service::response::{RouteResult, create_route_result};

use super::RoutingFailure;

/// Distance within which a snapped terminus location is clamped onto a link
/// endpoint node, in meters.
pub const SNAP_TO_LINK_ENDPOINT_DISTANCE_IN_METERS: f64 = 2.0;

/// Find a route through the infrastructure network via the given points.
///
/// Each point is snapped to its closest infrastructure link within
/// `link_query_distance` meters; the nodes to visit are derived from the
/// snaps, and the interim points contribute their closer endpoint nodes as
/// via nodes.
pub async fn find_route(
    pool: &PgPool,
    coordinates: &[LatLng],
    vehicle_type: VehicleType,
    link_query_distance: f64,
) -> Result<RouteResult, RoutingFailure> {
    let points: Vec<Point<f64>> = coordinates.iter().map(|c| c.to_point()).collect();
    let filtered_points = filter_consecutive_duplicates(&points);

    if count_distinct_points(&filtered_points) < 2 {
        return Err(RoutingFailure::invalid_value(
            "At least 2 distinct points must be given",
        ));
    }

    let closest_links =
        find_closest_links(pool, &filtered_points, vehicle_type, link_query_distance).await?;

    debug!(
        matched = closest_links.len(),
        requested = filtered_points.len(),
        radius_meters = link_query_distance,
        "snapped source points to closest links"
    );

    if closest_links.len() < filtered_points.len() {
        let unmatched = find_unmatched_points(&closest_links.values().collect::<Vec<_>>(), &filtered_points);
        return Err(RoutingFailure::no_segment(format!(
            "Could not match infrastructure link for following coordinates: {}",
            unmatched
                .iter()
                .map(|p| LatLng::from_point(*p).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut snaps: Vec<SnapPointToLinkResult> = closest_links.into_values().collect();

    // Terminus locations snap onto link endpoint nodes when close enough.
    if let Some(first) = snaps.first_mut() {
        first.point_on_link = first
            .point_on_link
            .snapped_to_terminus_node_within(SNAP_TO_LINK_ENDPOINT_DISTANCE_IN_METERS);
    }
    if snaps.len() > 1 {
        if let Some(last) = snaps.last_mut() {
            last.point_on_link = last
                .point_on_link
                .snapped_to_terminus_node_within(SNAP_TO_LINK_ENDPOINT_DISTANCE_IN_METERS);
        }
    }

    let point_on_start_link = snaps.first().map(|s| s.point_on_link.clone()).ok_or_else(
        || RoutingFailure::no_segment("Could not match infrastructure links"),
    )?;
    let point_on_end_link = snaps.last().map(|s| s.point_on_link.clone()).ok_or_else(
        || RoutingFailure::no_segment("Could not match infrastructure links"),
    )?;

    // Interim points contribute their closer endpoint node as a via node.
    let via_node_ids: Vec<_> = if snaps.len() > 2 {
        snaps[1..snaps.len() - 1]
            .iter()
            .map(|s| s.point_on_link.closer_node_id())
            .collect()
    } else {
        Vec::new()
    };

    let nodes_to_visit = resolve_visited_nodes(&point_on_start_link, &via_node_ids, &point_on_end_link);
    let node_id_sequences = node_id_sequence_combinations(&nodes_to_visit);

    let candidates = NodeSequenceCandidates::new(
        point_on_start_link.clone(),
        point_on_end_link.clone(),
        node_id_sequences,
    )
    .map_err(|e| RoutingFailure::no_segment(e.to_string()))?;

    if !candidates.is_route_possible() {
        return Err(RoutingFailure::no_segment(
            "Cannot produce route based on single infrastructure node",
        ));
    }

    let resolution =
        resolve_node_id_sequence(pool, std::slice::from_ref(&candidates), vehicle_type, None)
            .await?;

    let (node_ids, start_link, end_link) = match resolution {
        NodeSequenceResolution::Succeeded {
            node_ids,
            point_on_start_link,
            point_on_end_link,
        } => (node_ids, point_on_start_link, point_on_end_link),
        NodeSequenceResolution::Failed { message } => {
            warn!(message, "node sequence resolution failed");
            return Err(RoutingFailure::no_segment(message));
        }
    };

    debug!(node_ids = %node_ids, "resolved node sequence for route");

    let route = find_route_via_nodes(
        pool,
        &node_ids,
        vehicle_type,
        Some(start_link.fractional_measure),
        Some(end_link.fractional_measure),
        None,
    )
    .await?;

    create_route_result(&route)
}

fn count_distinct_points(points: &[Point<f64>]) -> usize {
    let mut distinct: Vec<Point<f64>> = Vec::with_capacity(points.len());
    for point in points {
        if !distinct.contains(point) {
            distinct.push(*point);
        }
    }
    distinct.len()
}

fn find_unmatched_points(
    snaps: &[&SnapPointToLinkResult],
    points: &[Point<f64>],
) -> Vec<Point<f64>> {
    points
        .iter()
        .filter(|point| !snaps.iter().any(|snap| snap.point == **point))
        .copied()
        .collect()
}
