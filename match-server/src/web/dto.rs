//! Request and response bodies of the web API.

use serde::{Deserialize, Serialize};

use crate::domain::{LinkTraversal, MultilingualString, RoutePoint};
use crate::geometry::{GeometryError, linestring_to_geojson, point_from_geojson};
use crate::service::RoutingFailure;
use crate::service::matching::{JunctionMatchingParameters, MatchingParameters};
use crate::service::response::RouteResult;

/// Failure classification carried in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseCode {
    Ok,
    InvalidUrl,
    InvalidValue,
    NoSegment,
}

/// The routing response body: either a successful set of routes or a coded
/// failure with a message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RoutingResponse {
    Success {
        code: ResponseCode,
        routes: Vec<RouteResultDto>,
    },
    Failure {
        code: ResponseCode,
        message: String,
    },
}

impl RoutingResponse {
    pub fn ok(route: RouteResultDto) -> Self {
        RoutingResponse::Success {
            code: ResponseCode::Ok,
            routes: vec![route],
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        RoutingResponse::Failure {
            code: ResponseCode::InvalidUrl,
            message: message.into(),
        }
    }

    pub fn invalid_transportation_mode(transportation_mode: &str) -> Self {
        Self::invalid_url(format!(
            "Failed to resolve transportation mode from: '{transportation_mode}'"
        ))
    }

    pub fn invalid_transportation_profile(transportation_mode: &str, vehicle_type: &str) -> Self {
        Self::invalid_url(format!(
            "Failed to resolve a valid combination of transportation mode and vehicle type from: '{transportation_mode}/{vehicle_type}'"
        ))
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        RoutingResponse::Failure {
            code: ResponseCode::InvalidValue,
            message: message.into(),
        }
    }

    pub fn no_segment(message: impl Into<String>) -> Self {
        RoutingResponse::Failure {
            code: ResponseCode::NoSegment,
            message: message.into(),
        }
    }
}

/// A resolved route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResultDto {
    /// The traversed path as a GeoJSON LineString in WGS84.
    pub geometry: geojson::Geometry,
    pub weight: f64,
    pub distance: f64,
    /// The traversed infrastructure links in route order.
    pub paths: Vec<LinkTraversalDto>,
}

impl RouteResultDto {
    pub fn from_route_result(result: &RouteResult) -> Self {
        Self {
            geometry: linestring_to_geojson(&result.geometry),
            weight: result.weight,
            distance: result.distance,
            paths: result
                .paths
                .iter()
                .map(LinkTraversalDto::from_traversal)
                .collect(),
        }
    }
}

/// External source reference of a traversed link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLinkReferenceDto {
    pub infrastructure_source: String,
    pub external_link_id: String,
}

/// One traversed infrastructure link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTraversalDto {
    pub infrastructure_link_id: i64,
    pub external_link_ref: ExternalLinkReferenceDto,
    pub is_traversal_forwards: bool,
    /// Link geometry as stored (digitised direction, never reversed).
    pub geometry: geojson::Geometry,
    pub weight: f64,
    pub distance: f64,
    pub infrastructure_link_name: MultilingualString,
}

impl LinkTraversalDto {
    pub fn from_traversal(traversal: &LinkTraversal) -> Self {
        Self {
            infrastructure_link_id: traversal.link_id.value(),
            external_link_ref: ExternalLinkReferenceDto {
                infrastructure_source: traversal.external_link_ref.infrastructure_source.clone(),
                external_link_id: traversal.external_link_ref.external_link_id.clone(),
            },
            is_traversal_forwards: traversal.is_traversal_forwards,
            geometry: linestring_to_geojson(&traversal.geometry),
            weight: traversal.cost,
            distance: traversal.cost,
            infrastructure_link_name: traversal.link_name.clone(),
        }
    }
}

impl From<RoutingFailure> for RoutingResponse {
    fn from(failure: RoutingFailure) -> Self {
        match failure {
            RoutingFailure::InvalidValue(message) => RoutingResponse::invalid_value(message),
            RoutingFailure::NoSegment(message) => RoutingResponse::no_segment(message),
            RoutingFailure::Repository(error) => RoutingResponse::no_segment(error.to_string()),
        }
    }
}

/// Request body for map-matching a public transport route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTransportRouteMatchRequest {
    /// Optional identifier for the route, used in diagnostics only.
    pub route_id: Option<String>,
    /// Route geometry as a GeoJSON LineString in WGS84.
    pub route_geometry: geojson::Geometry,
    pub route_points: Vec<RoutePointDto>,
    pub matching_parameters: Option<MapMatchingParametersDto>,
}

/// A route point in a match request.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum RoutePointDto {
    PublicTransportStop {
        location: geojson::Geometry,
        projected_location: Option<geojson::Geometry>,
        national_id: Option<i32>,
        #[allow(dead_code)]
        passenger_id: Option<String>,
    },
    RoadJunction {
        location: geojson::Geometry,
    },
    Other {
        location: geojson::Geometry,
    },
}

impl RoutePointDto {
    pub fn to_route_point(&self) -> Result<RoutePoint, GeometryError> {
        Ok(match self {
            RoutePointDto::PublicTransportStop {
                location,
                projected_location,
                national_id,
                ..
            } => RoutePoint::Stop {
                location: point_from_geojson(location)?,
                projected_location: projected_location
                    .as_ref()
                    .map(point_from_geojson)
                    .transpose()?,
                national_id: *national_id,
            },
            RoutePointDto::RoadJunction { location } => RoutePoint::Junction {
                location: point_from_geojson(location)?,
            },
            RoutePointDto::Other { location } => RoutePoint::Other {
                location: point_from_geojson(location)?,
            },
        })
    }
}

/// Matching parameter overrides in a match request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMatchingParametersDto {
    pub buffer_radius_in_meters: Option<f64>,
    pub terminus_link_query_distance: Option<f64>,
    pub terminus_link_query_limit: Option<i64>,
    pub max_stop_location_deviation: Option<f64>,
    pub road_junction_matching_enabled: Option<bool>,
    pub junction_node_match_distance: Option<f64>,
    pub junction_node_clearing_distance: Option<f64>,
}

impl MapMatchingParametersDto {
    /// Validate the overrides and merge them over the defaults.
    pub fn to_matching_parameters(&self) -> Result<MatchingParameters, String> {
        let junction_matching_enabled = self.road_junction_matching_enabled != Some(false);

        if !junction_matching_enabled
            && (self.junction_node_match_distance.is_some()
                || self.junction_node_clearing_distance.is_some())
        {
            return Err(
                "Junction node distances must not be given when road junction matching is disabled"
                    .to_string(),
            );
        }

        if let (Some(match_distance), Some(clearing_distance)) = (
            self.junction_node_match_distance,
            self.junction_node_clearing_distance,
        ) {
            if match_distance > clearing_distance {
                return Err(format!(
                    "Junction node match distance must not be greater than clearing distance: {match_distance} > {clearing_distance}"
                ));
            }
        }

        let defaults = MatchingParameters::default();
        let junction_defaults = JunctionMatchingParameters::default();

        Ok(MatchingParameters {
            buffer_radius_meters: self
                .buffer_radius_in_meters
                .unwrap_or(defaults.buffer_radius_meters),
            terminus_link_query_distance: self
                .terminus_link_query_distance
                .unwrap_or(defaults.terminus_link_query_distance),
            terminus_link_query_limit: self
                .terminus_link_query_limit
                .unwrap_or(defaults.terminus_link_query_limit),
            max_stop_location_deviation: self
                .max_stop_location_deviation
                .unwrap_or(defaults.max_stop_location_deviation),
            junction_matching: junction_matching_enabled.then(|| JunctionMatchingParameters {
                junction_node_match_distance: self
                    .junction_node_match_distance
                    .unwrap_or(junction_defaults.junction_node_match_distance),
                junction_node_clearing_distance: self
                    .junction_node_clearing_distance
                    .unwrap_or(junction_defaults.junction_node_clearing_distance),
            }),
        })
    }
}

impl PublicTransportRouteMatchRequest {
    /// Validate the request body. Returns an error message for invalid
    /// input.
    pub fn validate(&self) -> Option<String> {
        if self.route_points.len() < 2 {
            return Some("At least 2 route points must be given".to_string());
        }

        if let Some(route_id) = &self.route_id {
            let valid = (1..=50).contains(&route_id.chars().count())
                && route_id
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' '));
            if !valid {
                return Some(format!("Invalid route identifier: \"{route_id}\""));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExternalLinkReference, InfrastructureLinkId};
    use geo_types::{Coord, LineString};

    fn geojson_point(lng: f64, lat: f64) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(vec![lng, lat]))
    }

    fn match_request(route_id: Option<&str>, n_points: usize) -> PublicTransportRouteMatchRequest {
        PublicTransportRouteMatchRequest {
            route_id: route_id.map(String::from),
            route_geometry: geojson::Geometry::new(geojson::Value::LineString(vec![
                vec![24.94, 60.17],
                vec![24.95, 60.18],
            ])),
            route_points: (0..n_points)
                .map(|i| RoutePointDto::Other {
                    location: geojson_point(24.94 + i as f64 * 0.01, 60.17),
                })
                .collect(),
            matching_parameters: None,
        }
    }

    #[test]
    fn success_response_serialises_with_ok_code() {
        let result = RouteResult {
            geometry: LineString::new(vec![
                Coord { x: 24.94, y: 60.17 },
                Coord { x: 24.95, y: 60.18 },
            ]),
            weight: 120.5,
            distance: 120.5,
            paths: vec![LinkTraversal {
                link_id: InfrastructureLinkId::new(7).unwrap(),
                external_link_ref: ExternalLinkReference {
                    infrastructure_source: "digiroad_r".to_string(),
                    external_link_id: "441872".to_string(),
                },
                geometry: LineString::new(vec![
                    Coord { x: 24.94, y: 60.17 },
                    Coord { x: 24.95, y: 60.18 },
                ]),
                is_traversal_forwards: true,
                cost: 120.5,
                link_name: MultilingualString::from_json_text(r#"{"fi":"Tie"}"#).unwrap(),
            }],
        };

        let response = RoutingResponse::ok(RouteResultDto::from_route_result(&result));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["code"], "Ok");
        assert_eq!(json["routes"][0]["weight"], 120.5);
        assert_eq!(json["routes"][0]["geometry"]["type"], "LineString");

        let path = &json["routes"][0]["paths"][0];
        assert_eq!(path["infrastructureLinkId"], 7);
        assert_eq!(path["externalLinkRef"]["infrastructureSource"], "digiroad_r");
        assert_eq!(path["externalLinkRef"]["externalLinkId"], "441872");
        assert_eq!(path["isTraversalForwards"], true);
        assert_eq!(path["infrastructureLinkName"]["fi"], "Tie");
    }

    #[test]
    fn failure_responses_carry_code_and_message() {
        let json = serde_json::to_value(RoutingResponse::no_segment("no route")).unwrap();
        assert_eq!(json["code"], "NoSegment");
        assert_eq!(json["message"], "no route");

        let json =
            serde_json::to_value(RoutingResponse::invalid_transportation_mode("hovercraft"))
                .unwrap();
        assert_eq!(json["code"], "InvalidUrl");

        let json = serde_json::to_value(RoutingResponse::invalid_value("bad input")).unwrap();
        assert_eq!(json["code"], "InvalidValue");
    }

    #[test]
    fn route_points_deserialise_by_type_tag() {
        let body = r#"
        {
            "routeId": "route-1",
            "routeGeometry": {"type": "LineString", "coordinates": [[24.94, 60.17], [24.95, 60.18]]},
            "routePoints": [
                {
                    "type": "PUBLIC_TRANSPORT_STOP",
                    "location": {"type": "Point", "coordinates": [24.94, 60.17]},
                    "projectedLocation": {"type": "Point", "coordinates": [24.941, 60.171]},
                    "nationalId": 123456,
                    "passengerId": "H1234"
                },
                {"type": "ROAD_JUNCTION", "location": {"type": "Point", "coordinates": [24.95, 60.18]}},
                {"type": "OTHER", "location": {"type": "Point", "coordinates": [24.96, 60.19]}}
            ]
        }"#;

        let request: PublicTransportRouteMatchRequest = serde_json::from_str(body).unwrap();
        assert!(request.validate().is_none());

        let points: Vec<RoutePoint> = request
            .route_points
            .iter()
            .map(|p| p.to_route_point().unwrap())
            .collect();

        match &points[0] {
            RoutePoint::Stop {
                national_id,
                projected_location,
                ..
            } => {
                assert_eq!(*national_id, Some(123456));
                assert!(projected_location.is_some());
            }
            other => panic!("expected stop point, got {other:?}"),
        }
        assert!(points[1].is_junction_point());
        assert!(!points[2].is_stop_point());
    }

    #[test]
    fn validation_requires_two_route_points() {
        assert!(match_request(None, 1).validate().is_some());
        assert!(match_request(None, 2).validate().is_none());
    }

    #[test]
    fn validation_rejects_malformed_route_ids() {
        assert!(match_request(Some("route 1_a-b"), 2).validate().is_none());
        assert!(match_request(Some(""), 2).validate().is_some());
        assert!(match_request(Some("bad/route"), 2).validate().is_some());
        assert!(match_request(Some(&"x".repeat(51)), 2).validate().is_some());
    }

    #[test]
    fn matching_parameter_overrides_merge_over_defaults() {
        let dto = MapMatchingParametersDto {
            buffer_radius_in_meters: Some(100.0),
            junction_node_match_distance: Some(4.0),
            ..Default::default()
        };

        let parameters = dto.to_matching_parameters().unwrap();
        assert_eq!(parameters.buffer_radius_meters, 100.0);
        assert_eq!(parameters.terminus_link_query_distance, 50.0);

        let junction = parameters.junction_matching.unwrap();
        assert_eq!(junction.junction_node_match_distance, 4.0);
        assert_eq!(junction.junction_node_clearing_distance, 30.0);
    }

    #[test]
    fn disabling_junction_matching_rejects_junction_distances() {
        let dto = MapMatchingParametersDto {
            road_junction_matching_enabled: Some(false),
            junction_node_match_distance: Some(4.0),
            ..Default::default()
        };
        assert!(dto.to_matching_parameters().is_err());

        let dto = MapMatchingParametersDto {
            road_junction_matching_enabled: Some(false),
            ..Default::default()
        };
        assert!(dto.to_matching_parameters().unwrap().junction_matching.is_none());
    }

    #[test]
    fn match_distance_must_not_exceed_clearing_distance() {
        let dto = MapMatchingParametersDto {
            junction_node_match_distance: Some(40.0),
            junction_node_clearing_distance: Some(30.0),
            ..Default::default()
        };
        assert!(dto.to_matching_parameters().is_err());
    }
}
