//! Ordered sequences of infrastructure network node identifiers.

use std::fmt;

use super::ids::InfrastructureNodeId;

/// Drop elements that equal their immediate predecessor.
pub fn filter_consecutive_duplicates<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut result: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if result.last() != Some(item) {
            result.push(item.clone());
        }
    }
    result
}

/// A sequence of node identifiers describing an ordered visit through the
/// infrastructure network.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdSequence(Vec<InfrastructureNodeId>);

impl NodeIdSequence {
    pub fn new(ids: Vec<InfrastructureNodeId>) -> Self {
        Self(ids)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[InfrastructureNodeId] {
        &self.0
    }

    pub fn to_values(&self) -> Vec<i64> {
        self.0.iter().map(|id| id.value()).collect()
    }

    pub fn concat(&self, other: &NodeIdSequence) -> NodeIdSequence {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut ids = self.0.clone();
        ids.extend_from_slice(&other.0);
        NodeIdSequence(ids)
    }

    pub fn duplicates_removed(&self) -> NodeIdSequence {
        NodeIdSequence(filter_consecutive_duplicates(&self.0))
    }
}

impl fmt::Display for NodeIdSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIdSequence(")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, ")")
    }
}
