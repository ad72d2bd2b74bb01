//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, error};

use crate::domain::RoutePoint;
use crate::geometry::linestring_from_geojson;
use crate::service::RoutingFailure;
use crate::service::matching::MatchingParameters;
use crate::service::response::RouteResult;
use crate::service::{matching, routing};

use super::dto::{
    PublicTransportRouteMatchRequest, RouteResultDto, RoutingResponse,
};
use super::params::{find_vehicle_type, parse_coordinates};
use super::state::AppState;

/// Search radius for snapping route via points to links when the request
/// does not override it, in meters.
const DEFAULT_LINK_SEARCH_RADIUS_IN_METERS: f64 = 150.0;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/route/v1/:transportation_mode/:coords", get(find_route_with_mode))
        .route(
            "/api/route/v1/:transportation_mode/:vehicle_type/:coords",
            get(find_route_with_profile),
        )
        .route(
            "/api/match/public-transport-route/v1/:transportation_mode",
            post(match_route_with_mode),
        )
        .route(
            "/api/match/public-transport-route/v1/:transportation_mode/:vehicle_type",
            post(match_route_with_profile),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindRouteQuery {
    link_search_radius: Option<f64>,
}

/// Find a route using the default vehicle type of a transportation mode.
async fn find_route_with_mode(
    State(state): State<AppState>,
    Path((transportation_mode, coords)): Path<(String, String)>,
    Query(query): Query<FindRouteQuery>,
) -> Response {
    debug!(transportation_mode, coords, "route request");

    let Some(vehicle_type) = find_vehicle_type(&transportation_mode, None) else {
        return Json(RoutingResponse::invalid_transportation_mode(&transportation_mode))
            .into_response();
    };

    find_route_response(&state, vehicle_type, &coords, query.link_search_radius).await
}

/// Find a route using an explicit transportation mode / vehicle type
/// profile.
async fn find_route_with_profile(
    State(state): State<AppState>,
    Path((transportation_mode, vehicle_type_param, coords)): Path<(String, String, String)>,
    Query(query): Query<FindRouteQuery>,
) -> Response {
    debug!(transportation_mode, vehicle_type_param, coords, "route request");

    let Some(vehicle_type) = find_vehicle_type(&transportation_mode, Some(&vehicle_type_param))
    else {
        return Json(RoutingResponse::invalid_transportation_profile(
            &transportation_mode,
            &vehicle_type_param,
        ))
        .into_response();
    };

    find_route_response(&state, vehicle_type, &coords, query.link_search_radius).await
}

async fn find_route_response(
    state: &AppState,
    vehicle_type: crate::domain::VehicleType,
    coords: &str,
    link_search_radius: Option<f64>,
) -> Response {
    // Allow a trailing ".json" suffix on the coordinate path segment.
    let coords = coords.strip_suffix(".json").unwrap_or(coords);

    let coordinates = match parse_coordinates(coords) {
        Ok(coordinates) => coordinates,
        Err(e) => return Json(RoutingResponse::invalid_url(e.to_string())).into_response(),
    };

    let result = routing::find_route(
        &state.pool,
        &coordinates,
        vehicle_type,
        link_search_radius.unwrap_or(DEFAULT_LINK_SEARCH_RADIUS_IN_METERS),
    )
    .await;

    routing_response(result)
}

/// Match a public transport route using the default vehicle type of a
/// transportation mode.
async fn match_route_with_mode(
    State(state): State<AppState>,
    Path(transportation_mode): Path<String>,
    Json(request): Json<PublicTransportRouteMatchRequest>,
) -> Response {
    let transportation_mode = strip_json_suffix(&transportation_mode);

    let Some(vehicle_type) = find_vehicle_type(transportation_mode, None) else {
        return Json(RoutingResponse::invalid_transportation_mode(transportation_mode))
            .into_response();
    };

    match_route_response(&state, vehicle_type, request).await
}

/// Match a public transport route using an explicit transportation mode /
/// vehicle type profile.
async fn match_route_with_profile(
    State(state): State<AppState>,
    Path((transportation_mode, vehicle_type_param)): Path<(String, String)>,
    Json(request): Json<PublicTransportRouteMatchRequest>,
) -> Response {
    let vehicle_type_param = strip_json_suffix(&vehicle_type_param);

    let Some(vehicle_type) = find_vehicle_type(&transportation_mode, Some(vehicle_type_param))
    else {
        return Json(RoutingResponse::invalid_transportation_profile(
            &transportation_mode,
            vehicle_type_param,
        ))
        .into_response();
    };

    match_route_response(&state, vehicle_type, request).await
}

async fn match_route_response(
    state: &AppState,
    vehicle_type: crate::domain::VehicleType,
    request: PublicTransportRouteMatchRequest,
) -> Response {
    if let Some(message) = request.validate() {
        return Json(RoutingResponse::invalid_value(message)).into_response();
    }

    let route_geometry = match linestring_from_geojson(&request.route_geometry) {
        Ok(line) => line,
        Err(e) => {
            return Json(RoutingResponse::invalid_value(format!("Invalid route geometry: {e}")))
                .into_response();
        }
    };

    let route_points: Vec<RoutePoint> = match request
        .route_points
        .iter()
        .map(|p| p.to_route_point())
        .collect::<Result<_, _>>()
    {
        Ok(points) => points,
        Err(e) => {
            return Json(RoutingResponse::invalid_value(format!(
                "Invalid route point location: {e}"
            )))
            .into_response();
        }
    };

    let matching_parameters = match &request.matching_parameters {
        Some(dto) => match dto.to_matching_parameters() {
            Ok(parameters) => parameters,
            Err(message) => return Json(RoutingResponse::invalid_value(message)).into_response(),
        },
        None => MatchingParameters::default(),
    };

    if let Some(route_id) = &request.route_id {
        debug!(route_id, route_points = route_points.len(), "match request");
    }

    let result = matching::find_match(
        &state.pool,
        &route_geometry,
        &route_points,
        vehicle_type,
        &matching_parameters,
    )
    .await;

    routing_response(result)
}

fn strip_json_suffix(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

fn routing_response(result: Result<RouteResult, RoutingFailure>) -> Response {
    match result {
        Ok(route) => {
            Json(RoutingResponse::ok(RouteResultDto::from_route_result(&route))).into_response()
        }
        Err(RoutingFailure::Repository(error)) => {
            error!(%error, "repository failure while resolving route");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RoutingResponse::no_segment(
                    "Internal error while resolving route",
                )),
            )
                .into_response()
        }
        Err(failure) => Json(RoutingResponse::from(failure)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_suffix_is_stripped() {
        assert_eq!(strip_json_suffix("bus.json"), "bus");
        assert_eq!(strip_json_suffix("bus"), "bus");
        assert_eq!(strip_json_suffix(".json"), "");
    }
}
