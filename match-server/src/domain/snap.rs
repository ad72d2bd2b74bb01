//! Snapping of arbitrary points onto infrastructure links and nodes.

use crate::geometry::{DEFAULT_DOUBLE_TOLERANCE, within_tolerance};

use super::ids::{InfrastructureLinkId, InfrastructureNodeId};
use super::traffic_flow::TrafficFlowDirection;

/// An infrastructure node together with its distance from some point of
/// interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeProximity {
    pub id: InfrastructureNodeId,
    pub distance_to_node: f64,
}

/// Error returned when snap data read from a query result is inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidSnap {
    #[error("closest distance must be non-negative: {0}")]
    NegativeDistance(f64),

    #[error("fractional measure must be within 0.0..=1.0: {0}")]
    FractionOutOfRange(f64),

    #[error("link length must be positive: {0}")]
    NonPositiveLength(f64),
}

/// A snap from an arbitrary point to the closest point on an infrastructure
/// link.
///
/// The snapped location is expressed through linear referencing: a fractional
/// measure in `0.0..=1.0` along the link's 2D geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPointOnLink {
    pub link_id: InfrastructureLinkId,
    pub closest_distance: f64,
    pub fractional_measure: f64,
    pub direction: TrafficFlowDirection,
    pub link_length: f64,
    pub start_node_id: InfrastructureNodeId,
    pub end_node_id: InfrastructureNodeId,
}

impl SnappedPointOnLink {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        link_id: InfrastructureLinkId,
        closest_distance: f64,
        fractional_measure: f64,
        direction: TrafficFlowDirection,
        link_length: f64,
        start_node_id: InfrastructureNodeId,
        end_node_id: InfrastructureNodeId,
    ) -> Result<Self, InvalidSnap> {
        if closest_distance < 0.0 {
            return Err(InvalidSnap::NegativeDistance(closest_distance));
        }
        if !(0.0..=1.0).contains(&fractional_measure) {
            return Err(InvalidSnap::FractionOutOfRange(fractional_measure));
        }
        if link_length <= 0.0 {
            return Err(InvalidSnap::NonPositiveLength(link_length));
        }
        Ok(Self {
            link_id,
            closest_distance,
            fractional_measure,
            direction,
            link_length,
            start_node_id,
            end_node_id,
        })
    }

    pub fn is_start_node_closer(&self) -> bool {
        self.fractional_measure <= 0.5
    }

    /// The endpoint node closer to the snapped location.
    pub fn closer_node_id(&self) -> InfrastructureNodeId {
        if self.is_start_node_closer() {
            self.start_node_id
        } else {
            self.end_node_id
        }
    }

    /// The endpoint node further away from the snapped location.
    pub fn further_node_id(&self) -> InfrastructureNodeId {
        if self.is_start_node_closer() {
            self.end_node_id
        } else {
            self.start_node_id
        }
    }

    pub fn is_snapped_to_start_node(&self) -> bool {
        within_tolerance(self.fractional_measure, 0.0, DEFAULT_DOUBLE_TOLERANCE)
    }

    pub fn is_snapped_to_end_node(&self) -> bool {
        within_tolerance(self.fractional_measure, 1.0, DEFAULT_DOUBLE_TOLERANCE)
    }

    /// The endpoint node the location coincides with, if any.
    pub fn snapped_node(&self) -> Option<InfrastructureNodeId> {
        if self.is_snapped_to_start_node() {
            Some(self.start_node_id)
        } else if self.is_snapped_to_end_node() {
            Some(self.end_node_id)
        } else {
            None
        }
    }

    /// Whether the link's endpoints are distinct nodes. A closed-loop link
    /// starts from and ends at the same node.
    pub fn has_discrete_nodes(&self) -> bool {
        self.start_node_id != self.end_node_id
    }

    pub fn is_on_link_terminated_by(&self, node_id: InfrastructureNodeId) -> bool {
        self.start_node_id == node_id || self.end_node_id == node_id
    }

    pub fn is_on_same_link_as(&self, other: &SnappedPointOnLink) -> bool {
        self.link_id == other.link_id
    }

    /// Distance from the start of the link to the snapped location, in meters.
    pub fn distance_to_start_of_link(&self) -> f64 {
        self.fractional_measure * self.link_length
    }

    /// Clamp the snapped location onto an endpoint node when it lies within
    /// `threshold_meters` of one.
    pub fn snapped_to_terminus_node_within(&self, threshold_meters: f64) -> SnappedPointOnLink {
        let distance_to_start = self.distance_to_start_of_link();

        if within_tolerance(distance_to_start, 0.0, threshold_meters) {
            self.with_fractional_measure(0.0)
        } else if within_tolerance(distance_to_start, self.link_length, threshold_meters) {
            self.with_fractional_measure(1.0)
        } else {
            self.clone()
        }
    }

    /// Move an endpoint snap slightly towards the link interior.
    ///
    /// A snap lying exactly at an endpoint node may leave the link itself out
    /// of the resolved route, depending on the direction of travel from the
    /// node. Moving the snap inwards keeps the link on the route. A no-op
    /// when the snap is not at an endpoint or the offset does not fit within
    /// the link.
    pub fn moved_inwards_if_at_endpoint(&self, offset_meters: f64) -> SnappedPointOnLink {
        if offset_meters >= self.link_length {
            return self.clone();
        }

        if self.is_snapped_to_start_node() {
            self.with_fractional_measure(offset_meters / self.link_length)
        } else if self.is_snapped_to_end_node() {
            self.with_fractional_measure(1.0 - offset_meters / self.link_length)
        } else {
            self.clone()
        }
    }

    fn with_fractional_measure(&self, fractional_measure: f64) -> SnappedPointOnLink {
        SnappedPointOnLink {
            fractional_measure,
            ..self.clone()
        }
    }
}
