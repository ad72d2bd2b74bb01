//! Matching of stop route points against the public transport stop registry.

use std::collections::BTreeMap;

use sqlx::PgPool;
use tracing::debug;

use crate::domain::{RoutePoint, VehicleType};
use crate::repository::RepositoryError;
use crate::repository::stop::{
    SnapStopToLinkResult, StopMatchParameters, find_stops_and_snap_to_links,
};

/// Stop match parameters per route point index, for the stop points carrying
/// a national id.
pub fn stop_match_parameters(
    route_points: &[RoutePoint],
) -> BTreeMap<usize, StopMatchParameters> {
    route_points
        .iter()
        .enumerate()
        .filter_map(|(index, route_point)| match route_point {
            RoutePoint::Stop {
                national_id: Some(national_id),
                ..
            } => Some((
                index,
                StopMatchParameters {
                    national_id: *national_id,
                    // Projected locations lie closer to the stop registry
                    // locations than raw route point locations do.
                    source_location: route_point.stop_match_location()?,
                },
            )),
            _ => None,
        })
        .collect()
}

/// Match the stop points of a route by national id and snap each matched
/// stop onto its owning link. Keyed by route point index.
pub async fn find_stop_points_indexed_by_route_point_ordering(
    pool: &PgPool,
    route_points: &[RoutePoint],
    vehicle_type: VehicleType,
    max_stop_location_deviation: f64,
) -> Result<BTreeMap<usize, SnapStopToLinkResult>, RepositoryError> {
    let match_params_by_index = stop_match_parameters(route_points);

    let params: Vec<StopMatchParameters> = match_params_by_index.values().cloned().collect();

    let snapped_stops =
        find_stops_and_snap_to_links(pool, &params, vehicle_type, max_stop_location_deviation)
            .await?;

    let by_national_id: BTreeMap<i32, SnapStopToLinkResult> = snapped_stops
        .into_iter()
        .map(|snap| (snap.stop_national_id, snap))
        .collect();

    let matched: BTreeMap<usize, SnapStopToLinkResult> = match_params_by_index
        .iter()
        .filter_map(|(index, params)| {
            by_national_id
                .get(&params.national_id)
                .map(|snap| (*index, snap.clone()))
        })
        .collect();

    debug!(
        matched = matched.len(),
        requested = match_params_by_index.len(),
        "matched stop points from source route points"
    );

    Ok(matched)
}
