//! Identifier newtypes for the infrastructure network.

use std::fmt;

/// Error returned when constructing an identifier from a non-positive value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be greater than zero: {value}")]
pub struct InvalidId {
    value: i64,
}

/// Identifier of an infrastructure link (a graph edge).
///
/// pgRouting requires integer edge identifiers; the database uses positive
/// bigints, and this type guarantees positivity by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfrastructureLinkId(i64);

impl InfrastructureLinkId {
    pub fn new(value: i64) -> Result<Self, InvalidId> {
        if value < 1 {
            return Err(InvalidId { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for InfrastructureLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an infrastructure network node (a graph vertex).
///
/// Node identifiers originate from the pgRouting-maintained vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfrastructureNodeId(i64);

impl InfrastructureNodeId {
    pub fn new(value: i64) -> Result<Self, InvalidId> {
        if value < 1 {
            return Err(InvalidId { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for InfrastructureNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_are_accepted() {
        assert_eq!(InfrastructureLinkId::new(1).unwrap().value(), 1);
        assert_eq!(InfrastructureNodeId::new(i64::MAX).unwrap().value(), i64::MAX);
    }

    #[test]
    fn non_positive_values_are_rejected() {
        assert!(InfrastructureLinkId::new(0).is_err());
        assert!(InfrastructureLinkId::new(-5).is_err());
        assert!(InfrastructureNodeId::new(0).is_err());
        assert!(InfrastructureNodeId::new(i64::MIN).is_err());
    }

    #[test]
    fn display_prints_the_raw_value() {
        assert_eq!(InfrastructureLinkId::new(42).unwrap().to_string(), "42");
        assert_eq!(InfrastructureNodeId::new(7).unwrap().to_string(), "7");
    }
}
