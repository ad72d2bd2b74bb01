//! Candidate node sequences between a pair of snapped terminus links.

use std::cmp::Ordering;

use crate::domain::{NodeIdSequence, SnappedPointOnLink};

/// Error for a malformed candidate set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCandidates {
    #[error("at least one node id sequence must be provided")]
    Empty,

    #[error("at most four node id sequences may be provided: {0}")]
    TooMany(usize),

    #[error("empty node id sequence not allowed")]
    EmptySequence,
}

/// Candidate node id sequences between the links snapped from a route's
/// start and end points.
///
/// Variance between the sequences stems from bidirectional terminus links,
/// whose direction of traversal cannot be known in advance: each ordering of
/// endpoint nodes is a candidate, and the cheapest one that still traverses
/// both terminus links wins.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSequenceCandidates {
    pub point_on_start_link: SnappedPointOnLink,
    pub point_on_end_link: SnappedPointOnLink,
    pub node_id_sequences: Vec<NodeIdSequence>,
}

impl NodeSequenceCandidates {
    pub fn new(
        point_on_start_link: SnappedPointOnLink,
        point_on_end_link: SnappedPointOnLink,
        node_id_sequences: Vec<NodeIdSequence>,
    ) -> Result<Self, InvalidCandidates> {
        if node_id_sequences.is_empty() {
            return Err(InvalidCandidates::Empty);
        }
        if node_id_sequences.len() > 4 {
            return Err(InvalidCandidates::TooMany(node_id_sequences.len()));
        }
        if node_id_sequences.iter().any(NodeIdSequence::is_empty) {
            return Err(InvalidCandidates::EmptySequence);
        }

        Ok(Self {
            point_on_start_link,
            point_on_end_link,
            node_id_sequences,
        })
    }

    /// Whether a route can be formed at all. A single sequence holding a
    /// single node cannot produce a route.
    pub fn is_route_possible(&self) -> bool {
        self.node_id_sequences.len() > 1 || self.node_id_sequences[0].len() > 1
    }

    fn distance_to_closer_terminus_link(&self) -> f64 {
        self.point_on_start_link
            .closest_distance
            .min(self.point_on_end_link.closest_distance)
    }

    fn distance_to_further_terminus_link(&self) -> f64 {
        self.point_on_start_link
            .closest_distance
            .max(self.point_on_end_link.closest_distance)
    }

    /// Order candidate pairs by how close their terminus links were snapped:
    /// first by the closer of the two distances, then by the further one.
    pub fn compare_by_terminus_distance(&self, other: &Self) -> Ordering {
        self.distance_to_closer_terminus_link()
            .total_cmp(&other.distance_to_closer_terminus_link())
            .then_with(|| {
                self.distance_to_further_terminus_link()
                    .total_cmp(&other.distance_to_further_terminus_link())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        InfrastructureLinkId, InfrastructureNodeId, TrafficFlowDirection,
    };

    fn node(id: i64) -> InfrastructureNodeId {
        InfrastructureNodeId::new(id).unwrap()
    }

    fn seq(ids: &[i64]) -> NodeIdSequence {
        NodeIdSequence::new(ids.iter().map(|&id| node(id)).collect())
    }

    fn snap(link: i64, distance: f64) -> SnappedPointOnLink {
        SnappedPointOnLink::new(
            InfrastructureLinkId::new(link).unwrap(),
            distance,
            0.5,
            TrafficFlowDirection::Bidirectional,
            100.0,
            node(link * 10),
            node(link * 10 + 1),
        )
        .unwrap()
    }

    fn candidates(
        start_distance: f64,
        end_distance: f64,
        sequences: Vec<NodeIdSequence>,
    ) -> NodeSequenceCandidates {
        NodeSequenceCandidates::new(snap(1, start_distance), snap(2, end_distance), sequences)
            .unwrap()
    }

    #[test]
    fn construction_enforces_sequence_count() {
        assert_eq!(
            NodeSequenceCandidates::new(snap(1, 0.0), snap(2, 0.0), vec![]),
            Err(InvalidCandidates::Empty)
        );
        assert_eq!(
            NodeSequenceCandidates::new(
                snap(1, 0.0),
                snap(2, 0.0),
                vec![seq(&[1]); 5]
            ),
            Err(InvalidCandidates::TooMany(5))
        );
        assert_eq!(
            NodeSequenceCandidates::new(
                snap(1, 0.0),
                snap(2, 0.0),
                vec![NodeIdSequence::empty()]
            ),
            Err(InvalidCandidates::EmptySequence)
        );
    }

    #[test]
    fn single_node_sequence_cannot_form_a_route() {
        assert!(!candidates(0.0, 0.0, vec![seq(&[1])]).is_route_possible());
        assert!(candidates(0.0, 0.0, vec![seq(&[1, 2])]).is_route_possible());
        assert!(candidates(0.0, 0.0, vec![seq(&[1]), seq(&[2])]).is_route_possible());
    }

    #[test]
    fn ordering_prefers_closer_terminus_snaps() {
        let near = candidates(1.0, 9.0, vec![seq(&[1, 2])]);
        let far = candidates(3.0, 5.0, vec![seq(&[1, 2])]);

        assert_eq!(near.compare_by_terminus_distance(&far), Ordering::Less);

        // Equal closer distances fall back to the further distance.
        let a = candidates(1.0, 5.0, vec![seq(&[1, 2])]);
        let b = candidates(1.0, 9.0, vec![seq(&[1, 2])]);
        assert_eq!(a.compare_by_terminus_distance(&b), Ordering::Less);
    }
}
