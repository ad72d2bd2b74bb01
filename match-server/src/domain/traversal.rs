//! Traversals of infrastructure links along a resolved route.

use geo_types::LineString;

use crate::geometry::reversed;

use super::ids::InfrastructureLinkId;
use super::multilingual::MultilingualString;

/// Reference to a link in the external source system the link data
/// originates from (e.g. a Digiroad import).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLinkReference {
    pub infrastructure_source: String,
    pub external_link_id: String,
}

/// One link of a resolved route: which infrastructure link is traversed, in
/// which direction, and at what cost.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTraversal {
    pub link_id: InfrastructureLinkId,
    pub external_link_ref: ExternalLinkReference,
    /// Link geometry as stored (digitised direction), in WGS84.
    pub geometry: LineString<f64>,
    /// Whether the link is traversed along (true) or against (false) the
    /// digitised direction of its geometry.
    pub is_traversal_forwards: bool,
    pub cost: f64,
    pub link_name: MultilingualString,
}

impl LinkTraversal {
    /// Link geometry oriented according to the direction of traversal.
    pub fn geometry_in_traversal_direction(&self) -> LineString<f64> {
        if self.is_traversal_forwards {
            self.geometry.clone()
        } else {
            reversed(&self.geometry)
        }
    }
}
