//! Parsing of URL path parameters.

use crate::domain::{LatLng, VehicleMode, VehicleType};

/// Error returned for a malformed coordinate sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate sequence: \"{input}\"")]
pub struct InvalidCoordinateSequence {
    input: String,
}

/// Parse a coordinate sequence of the form `lng,lat~lng,lat~…`.
///
/// Coordinates are unsigned decimal numbers (the service area lies in the
/// north-eastern hemisphere); anything else is rejected.
pub fn parse_coordinates(coordinates: &str) -> Result<Vec<LatLng>, InvalidCoordinateSequence> {
    let invalid = || InvalidCoordinateSequence {
        input: coordinates.to_string(),
    };

    coordinates
        .split('~')
        .map(|token| {
            let (lng, lat) = token.split_once(',').ok_or_else(invalid)?;

            if !is_unsigned_decimal(lng) || !is_unsigned_decimal(lat) {
                return Err(invalid());
            }

            let lng: f64 = lng.parse().map_err(|_| invalid())?;
            let lat: f64 = lat.parse().map_err(|_| invalid())?;

            Ok(LatLng::new(lat, lng))
        })
        .collect()
}

/// `digits[.digits]`, no sign, no exponent.
fn is_unsigned_decimal(s: &str) -> bool {
    let (integer, fraction) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    all_digits(integer) && fraction.is_none_or(all_digits)
}

/// Resolve the vehicle type from a transportation mode parameter and an
/// optional vehicle type parameter.
///
/// A given vehicle type must belong to the given mode; without one, the
/// mode's generic vehicle type is used.
pub fn find_vehicle_type(
    transportation_mode: &str,
    vehicle_type: Option<&str>,
) -> Option<VehicleType> {
    let mode = VehicleMode::from_str(transportation_mode)?;

    match vehicle_type {
        Some(vehicle_type_param) => {
            VehicleType::from_str(vehicle_type_param).filter(|vt| vt.vehicle_mode() == mode)
        }
        None => Some(VehicleType::default_for_mode(mode)),
    }
}
