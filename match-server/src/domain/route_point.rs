//! Route points of a public transport route to be map-matched.

use geo_types::Point;

/// A point along a source route, as supplied by the client.
///
/// Stop points may carry the national identifier of the public transport stop
/// they represent, which allows matching them against stops hosted in the
/// routing database. Junction points mark road junctions the route passes
/// through.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePoint {
    Stop {
        location: Point<f64>,
        /// Location of the stop projected onto the route geometry by the
        /// client. Preferred over `location` when matching, as it tends to
        /// lie closer to the infrastructure.
        projected_location: Option<Point<f64>>,
        national_id: Option<i32>,
    },
    Junction {
        location: Point<f64>,
    },
    Other {
        location: Point<f64>,
    },
}

impl RoutePoint {
    pub fn location(&self) -> Point<f64> {
        match self {
            RoutePoint::Stop { location, .. }
            | RoutePoint::Junction { location }
            | RoutePoint::Other { location } => *location,
        }
    }

    pub fn is_stop_point(&self) -> bool {
        matches!(self, RoutePoint::Stop { .. })
    }

    pub fn is_junction_point(&self) -> bool {
        matches!(self, RoutePoint::Junction { .. })
    }

    /// The location to use when matching a stop point against the stop
    /// registry.
    pub fn stop_match_location(&self) -> Option<Point<f64>> {
        match self {
            RoutePoint::Stop {
                location,
                projected_location,
                ..
            } => Some(projected_location.unwrap_or(*location)),
            _ => None,
        }
    }
}
