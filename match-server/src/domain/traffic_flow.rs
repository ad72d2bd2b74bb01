//! Traffic flow direction of an infrastructure link.

/// Error returned for a database value outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown traffic flow direction type: {value}")]
pub struct UnknownTrafficFlowDirection {
    value: i32,
}

/// Which traversal directions are legal on a link, relative to the digitised
/// direction of its linestring geometry.
///
/// The numeric values are rows of the `traffic_flow_direction` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficFlowDirection {
    Bidirectional,
    AgainstDigitisedDirection,
    AlongDigitisedDirection,
}

impl TrafficFlowDirection {
    pub fn from_db_value(value: i32) -> Result<Self, UnknownTrafficFlowDirection> {
        match value {
            2 => Ok(TrafficFlowDirection::Bidirectional),
            3 => Ok(TrafficFlowDirection::AgainstDigitisedDirection),
            4 => Ok(TrafficFlowDirection::AlongDigitisedDirection),
            _ => Err(UnknownTrafficFlowDirection { value }),
        }
    }

    pub fn db_value(self) -> i32 {
        match self {
            TrafficFlowDirection::Bidirectional => 2,
            TrafficFlowDirection::AgainstDigitisedDirection => 3,
            TrafficFlowDirection::AlongDigitisedDirection => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_roundtrip() {
        for v in [2, 3, 4] {
            assert_eq!(
                TrafficFlowDirection::from_db_value(v).unwrap().db_value(),
                v
            );
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(TrafficFlowDirection::from_db_value(0).is_err());
        assert!(TrafficFlowDirection::from_db_value(1).is_err());
        assert!(TrafficFlowDirection::from_db_value(5).is_err());
        assert!(TrafficFlowDirection::from_db_value(-2).is_err());
    }
}
