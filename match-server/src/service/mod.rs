//! Routing and map-matching services.

pub mod matching;
pub mod node;
pub mod response;
pub mod routing;

use crate::repository::RepositoryError;

/// Failure of a routing or matching request.
///
/// `InvalidValue` and `NoSegment` surface as failure codes in the response
/// body, mirroring how clients consume routing results; `Repository` is an
/// internal error.
#[derive(Debug, thiserror::Error)]
pub enum RoutingFailure {
    #[error("{0}")]
    InvalidValue(String),

    #[error("{0}")]
    NoSegment(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RoutingFailure {
    pub fn no_segment(message: impl Into<String>) -> Self {
        RoutingFailure::NoSegment(message.into())
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        RoutingFailure::InvalidValue(message.into())
    }
}
