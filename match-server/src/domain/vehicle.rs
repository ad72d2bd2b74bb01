//! Vehicle mode and type vocabularies.
//!
//! These mirror the `vehicle_mode` and `vehicle_type` tables of the routing
//! schema. Every vehicle type belongs to exactly one mode, and routing is
//! always constrained to links safely traversable by a given vehicle type.

/// Transport mode, e.g. bus or tram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleMode {
    Bus,
    Tram,
    Train,
    Metro,
    Ferry,
}

impl VehicleMode {
    /// The code used in the database and in request URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleMode::Bus => "bus",
            VehicleMode::Tram => "tram",
            VehicleMode::Train => "train",
            VehicleMode::Metro => "metro",
            VehicleMode::Ferry => "ferry",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bus" => Some(VehicleMode::Bus),
            "tram" => Some(VehicleMode::Tram),
            "train" => Some(VehicleMode::Train),
            "metro" => Some(VehicleMode::Metro),
            "ferry" => Some(VehicleMode::Ferry),
            _ => None,
        }
    }
}

/// Vehicle type from the controlled vocabulary of the `vehicle_type` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleType {
    GenericBus,
    GenericTram,
    GenericTrain,
    GenericMetro,
    GenericFerry,
    TallElectricBus,
}

impl VehicleType {
    /// The code used in the database and in request URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::GenericBus => "generic_bus",
            VehicleType::GenericTram => "generic_tram",
            VehicleType::GenericTrain => "generic_train",
            VehicleType::GenericMetro => "generic_metro",
            VehicleType::GenericFerry => "generic_ferry",
            VehicleType::TallElectricBus => "tall_electric_bus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "generic_bus" => Some(VehicleType::GenericBus),
            "generic_tram" => Some(VehicleType::GenericTram),
            "generic_train" => Some(VehicleType::GenericTrain),
            "generic_metro" => Some(VehicleType::GenericMetro),
            "generic_ferry" => Some(VehicleType::GenericFerry),
            "tall_electric_bus" => Some(VehicleType::TallElectricBus),
            _ => None,
        }
    }

    /// The mode this vehicle type belongs to.
    pub fn vehicle_mode(self) -> VehicleMode {
        match self {
            VehicleType::GenericBus | VehicleType::TallElectricBus => VehicleMode::Bus,
            VehicleType::GenericTram => VehicleMode::Tram,
            VehicleType::GenericTrain => VehicleMode::Train,
            VehicleType::GenericMetro => VehicleMode::Metro,
            VehicleType::GenericFerry => VehicleMode::Ferry,
        }
    }

    /// The default vehicle type for a mode, used when a request names only
    /// the transportation mode.
    pub fn default_for_mode(mode: VehicleMode) -> Self {
        match mode {
            VehicleMode::Bus => VehicleType::GenericBus,
            VehicleMode::Tram => VehicleType::GenericTram,
            VehicleMode::Train => VehicleType::GenericTrain,
            VehicleMode::Metro => VehicleType::GenericMetro,
            VehicleMode::Ferry => VehicleType::GenericFerry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes_roundtrip() {
        for mode in [
            VehicleMode::Bus,
            VehicleMode::Tram,
            VehicleMode::Train,
            VehicleMode::Metro,
            VehicleMode::Ferry,
        ] {
            assert_eq!(VehicleMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(VehicleMode::from_str("zeppelin"), None);
    }

    #[test]
    fn type_codes_roundtrip() {
        for vt in [
            VehicleType::GenericBus,
            VehicleType::GenericTram,
            VehicleType::GenericTrain,
            VehicleType::GenericMetro,
            VehicleType::GenericFerry,
            VehicleType::TallElectricBus,
        ] {
            assert_eq!(VehicleType::from_str(vt.as_str()), Some(vt));
        }
        assert_eq!(VehicleType::from_str(""), None);
    }

    #[test]
    fn every_type_belongs_to_its_mode() {
        assert_eq!(VehicleType::GenericBus.vehicle_mode(), VehicleMode::Bus);
        assert_eq!(VehicleType::TallElectricBus.vehicle_mode(), VehicleMode::Bus);
        assert_eq!(VehicleType::GenericTram.vehicle_mode(), VehicleMode::Tram);
        assert_eq!(VehicleType::GenericFerry.vehicle_mode(), VehicleMode::Ferry);
    }

    #[test]
    fn default_type_per_mode() {
        assert_eq!(
            VehicleType::default_for_mode(VehicleMode::Bus),
            VehicleType::GenericBus
        );
        assert_eq!(
            VehicleType::default_for_mode(VehicleMode::Metro),
            VehicleType::GenericMetro
        );
    }
}
