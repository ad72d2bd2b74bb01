//! Domain types for the map-matching server.
//!
//! These model the routing schema vocabulary (identifiers, vehicle types,
//! traffic flow directions) and the derived concepts the matching and
//! routing algorithms operate on (snapped points, node sequences, link
//! traversals). Validation happens at construction time, so code receiving
//! these types can trust their invariants.

mod coordinates;
mod ids;
mod multilingual;
mod node_sequence;
mod route_point;
mod side;
mod snap;
mod traffic_flow;
mod traversal;
mod vehicle;

pub use coordinates::LatLng;
pub use ids::{InfrastructureLinkId, InfrastructureNodeId, InvalidId};
pub use multilingual::MultilingualString;
pub use node_sequence::{NodeIdSequence, filter_consecutive_duplicates};
pub use route_point::RoutePoint;
pub use side::LinkSide;
pub use snap::{InvalidSnap, NodeProximity, SnappedPointOnLink};
pub use traffic_flow::{TrafficFlowDirection, UnknownTrafficFlowDirection};
pub use traversal::{ExternalLinkReference, LinkTraversal};
pub use vehicle::{VehicleMode, VehicleType};
