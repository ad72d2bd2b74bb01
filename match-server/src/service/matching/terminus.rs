//! Terminus link candidates at the ends of a route to be matched.

use std::collections::BTreeMap;
use std::fmt;

use geo_types::Point;

use crate::domain::{RoutePoint, SnappedPointOnLink};

/// Offset used to nudge a terminus stop's endpoint snap towards the link
/// interior, in meters. Keeps the stop's link on the resolved route.
const TERMINUS_STOP_SNAP_INWARDS_OFFSET_IN_METERS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminusType {
    Start,
    End,
}

impl fmt::Display for TerminusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminusType::Start => write!(f, "start"),
            TerminusType::End => write!(f, "end"),
        }
    }
}

/// A route endpoint, as derived from the source route geometry and the
/// first/last route point.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRouteTerminusPoint {
    StopPoint {
        /// Endpoint location taken from the route geometry.
        location: Point<f64>,
        terminus_type: TerminusType,
        national_id: Option<i32>,
    },
    OtherPoint {
        location: Point<f64>,
        terminus_type: TerminusType,
    },
}

impl SourceRouteTerminusPoint {
    pub fn location(&self) -> Point<f64> {
        match self {
            SourceRouteTerminusPoint::StopPoint { location, .. }
            | SourceRouteTerminusPoint::OtherPoint { location, .. } => *location,
        }
    }

    pub fn terminus_type(&self) -> TerminusType {
        match self {
            SourceRouteTerminusPoint::StopPoint { terminus_type, .. }
            | SourceRouteTerminusPoint::OtherPoint { terminus_type, .. } => *terminus_type,
        }
    }

    pub fn stop_national_id(&self) -> Option<i32> {
        match self {
            SourceRouteTerminusPoint::StopPoint { national_id, .. } => *national_id,
            SourceRouteTerminusPoint::OtherPoint { .. } => None,
        }
    }
}

/// Derive the terminus point descriptor from a route point and the endpoint
/// location of the route geometry.
pub fn source_route_terminus_point(
    route_point: &RoutePoint,
    terminus_location_from_route_line: Point<f64>,
    terminus_type: TerminusType,
) -> SourceRouteTerminusPoint {
    match route_point {
        RoutePoint::Stop { national_id, .. } => SourceRouteTerminusPoint::StopPoint {
            location: terminus_location_from_route_line,
            terminus_type,
            national_id: *national_id,
        },
        _ => SourceRouteTerminusPoint::OtherPoint {
            location: terminus_location_from_route_line,
            terminus_type,
        },
    }
}

/// An infrastructure link candidate for the first or last link of a matched
/// route.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminusLinkCandidate {
    pub point_on_link: SnappedPointOnLink,
    /// Whether this link hosts the public transport stop matched (by
    /// national id) from the terminus route point.
    pub stop_match_found_by_national_id: bool,
}

/// Mark the candidate links of one route terminus, preferring the link that
/// hosts the terminus stop point.
///
/// When the terminus stop's own link is among the candidates, its endpoint
/// snaps are nudged slightly inwards so the link cannot drop off the route.
pub fn resolve_terminus_link_candidates(
    closest_links: &[SnappedPointOnLink],
    terminus_point: &SourceRouteTerminusPoint,
    stop_links_by_national_id: &BTreeMap<i32, SnappedPointOnLink>,
) -> Vec<TerminusLinkCandidate> {
    let link_id_of_terminus_stop = terminus_point
        .stop_national_id()
        .and_then(|national_id| stop_links_by_national_id.get(&national_id))
        .map(|link| link.link_id);

    closest_links
        .iter()
        .map(|snapped_link| match link_id_of_terminus_stop {
            Some(stop_link_id) if snapped_link.link_id == stop_link_id => TerminusLinkCandidate {
                point_on_link: snapped_link
                    .moved_inwards_if_at_endpoint(TERMINUS_STOP_SNAP_INWARDS_OFFSET_IN_METERS),
                stop_match_found_by_national_id: true,
            },
            _ => TerminusLinkCandidate {
                point_on_link: snapped_link.clone(),
                stop_match_found_by_national_id: false,
            },
        })
        .collect()
}
