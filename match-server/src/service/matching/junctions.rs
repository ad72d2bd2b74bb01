//! Matching of road junction route points against topology nodes.

use std::collections::BTreeMap;

use geo_types::Point;
use sqlx::PgPool;
use tracing::debug;

use crate::domain::{NodeProximity, RoutePoint, VehicleType};
use crate::repository::RepositoryError;
use crate::repository::node::find_n_closest_nodes;

use super::JunctionMatchingParameters;

/// Decide whether nearby nodes constitute a reliable junction match.
///
/// A junction point matches only when exactly one node lies within the
/// clearing distance, and that node is within the match distance. With two
/// or more nodes in the vicinity the wrong one could be picked, so no match
/// is made.
pub fn accept_junction_match(
    nodes_within_clearing_distance: &[NodeProximity],
    match_distance: f64,
) -> Option<NodeProximity> {
    match nodes_within_clearing_distance {
        [only] if only.distance_to_node <= match_distance => Some(*only),
        _ => None,
    }
}

/// Match junction route points to infrastructure nodes. Keyed by route
/// point index.
pub async fn find_junction_nodes_indexed_by_route_point_ordering(
    pool: &PgPool,
    route_points: &[RoutePoint],
    vehicle_type: VehicleType,
    parameters: &JunctionMatchingParameters,
) -> Result<BTreeMap<usize, NodeProximity>, RepositoryError> {
    let junction_points: Vec<(usize, Point<f64>)> = route_points
        .iter()
        .enumerate()
        .filter(|(_, route_point)| route_point.is_junction_point())
        .map(|(index, route_point)| (index, route_point.location()))
        .collect();

    if junction_points.is_empty() {
        return Ok(BTreeMap::new());
    }

    let locations: Vec<Point<f64>> = junction_points.iter().map(|(_, p)| *p).collect();

    let nodes_per_point = find_n_closest_nodes(
        pool,
        &locations,
        vehicle_type,
        parameters.junction_node_clearing_distance,
    )
    .await?;

    let mut matches = BTreeMap::new();

    for (seq, snap) in &nodes_per_point {
        let Some((route_point_index, _)) = junction_points.get(seq - 1) else {
            continue;
        };

        if let Some(node) =
            accept_junction_match(&snap.nodes, parameters.junction_node_match_distance)
        {
            matches.insert(*route_point_index, node);
        }
    }

    debug!(
        matched = matches.len(),
        junction_points = junction_points.len(),
        "matched road junction points to infrastructure nodes"
    );

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InfrastructureNodeId;

    fn proximity(id: i64, distance: f64) -> NodeProximity {
        NodeProximity {
            id: InfrastructureNodeId::new(id).unwrap(),
            distance_to_node: distance,
        }
    }

    #[test]
    fn single_close_node_matches() {
        let node = accept_junction_match(&[proximity(1, 3.0)], 5.0);
        assert_eq!(node, Some(proximity(1, 3.0)));
    }

    #[test]
    fn single_node_beyond_match_distance_does_not_match() {
        assert_eq!(accept_junction_match(&[proximity(1, 7.0)], 5.0), None);
    }

    #[test]
    fn multiple_nodes_in_clearing_distance_block_the_match() {
        // Even though the closest node is within match distance, a second
        // nearby node makes the match ambiguous.
        assert_eq!(
            accept_junction_match(&[proximity(1, 2.0), proximity(2, 20.0)], 5.0),
            None
        );
    }

    #[test]
    fn no_nodes_no_match() {
        assert_eq!(accept_junction_match(&[], 5.0), None);
    }
}
