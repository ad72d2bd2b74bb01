//! Assembly of route results from resolved route links.

use geo_types::LineString;

use crate::domain::LinkTraversal;
use crate::geometry::merge_continuous_lines;
use crate::repository::routing::RouteDto;

use super::RoutingFailure;

/// A successfully resolved route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// The traversed path as one continuous WGS84 linestring, built from
    /// the terminus-trimmed link geometries.
    pub geometry: LineString<f64>,
    pub weight: f64,
    pub distance: f64,
    /// Per-link traversals with untrimmed link geometries.
    pub paths: Vec<LinkTraversal>,
}

/// Build a route result from the links of a resolved route.
///
/// The merged geometry uses the trimmed terminus links, so it models the
/// actually traversed path; the per-link entries expose each link geometry
/// as stored.
pub fn create_route_result(route: &RouteDto) -> Result<RouteResult, RoutingFailure> {
    if route.is_empty() {
        return Err(RoutingFailure::no_segment("Could not find a matching route"));
    }

    let trimmed_traversals: Vec<LinkTraversal> = route
        .route_links_with_trimmed_termini()
        .into_iter()
        .map(|link| link.traversal)
        .collect();

    let total_cost: f64 = trimmed_traversals.iter().map(|t| t.cost).sum();

    let oriented_geometries: Vec<LineString<f64>> = trimmed_traversals
        .iter()
        .map(LinkTraversal::geometry_in_traversal_direction)
        .collect();

    let merged_geometry = merge_continuous_lines(&oriented_geometries)
        .map_err(|e| RoutingFailure::no_segment(e.to_string()))?;

    let paths: Vec<LinkTraversal> = route
        .route_links
        .iter()
        .map(|link| link.traversal.clone())
        .collect();

    Ok(RouteResult {
        geometry: merged_geometry,
        weight: total_cost,
        distance: total_cost,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ExternalLinkReference, InfrastructureLinkId, MultilingualString,
    };
    use crate::repository::routing::RouteLink;
    use geo_types::Coord;

    fn traversal(link: i64, coords: &[(f64, f64)], forwards: bool, cost: f64) -> LinkTraversal {
        LinkTraversal {
            link_id: InfrastructureLinkId::new(link).unwrap(),
            external_link_ref: ExternalLinkReference {
                infrastructure_source: "digiroad_r".to_string(),
                external_link_id: link.to_string(),
            },
            geometry: LineString::new(coords.iter().map(|&(x, y)| Coord { x, y }).collect()),
            is_traversal_forwards: forwards,
            cost,
            link_name: MultilingualString::empty(),
        }
    }

    fn route_link(seq: i32, traversal: LinkTraversal) -> RouteLink {
        RouteLink {
            sequence_number: seq,
            traversal,
        }
    }

    #[test]
    fn empty_route_is_a_no_segment_failure() {
        let result = create_route_result(&RouteDto::default());
        assert!(matches!(result, Err(RoutingFailure::NoSegment(_))));
    }

    #[test]
    fn merges_forward_traversals_and_sums_costs() {
        let route = RouteDto {
            route_links: vec![
                route_link(1, traversal(1, &[(0.0, 0.0), (1.0, 0.0)], true, 10.0)),
                route_link(2, traversal(2, &[(1.0, 0.0), (2.0, 0.0)], true, 5.0)),
            ],
            trimmed_start_link: None,
            trimmed_end_link: None,
        };

        let result = create_route_result(&route).unwrap();

        assert_eq!(result.weight, 15.0);
        assert_eq!(result.distance, 15.0);
        assert_eq!(result.paths.len(), 2);
        assert_eq!(
            result.geometry,
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 2.0, y: 0.0 },
            ])
        );
    }

    #[test]
    fn backward_traversals_are_reversed_before_merging() {
        // Second link is digitised away from the route direction.
        let route = RouteDto {
            route_links: vec![
                route_link(1, traversal(1, &[(0.0, 0.0), (1.0, 0.0)], true, 1.0)),
                route_link(2, traversal(2, &[(2.0, 0.0), (1.0, 0.0)], false, 1.0)),
            ],
            trimmed_start_link: None,
            trimmed_end_link: None,
        };

        let result = create_route_result(&route).unwrap();
        assert_eq!(result.geometry.0.last(), Some(&Coord { x: 2.0, y: 0.0 }));
    }

    #[test]
    fn trimmed_termini_shape_the_merged_geometry_but_not_the_paths() {
        let route = RouteDto {
            route_links: vec![
                route_link(1, traversal(1, &[(0.0, 0.0), (1.0, 0.0)], true, 10.0)),
                route_link(2, traversal(2, &[(1.0, 0.0), (2.0, 0.0)], true, 10.0)),
            ],
            trimmed_start_link: Some(route_link(
                1,
                traversal(1, &[(0.5, 0.0), (1.0, 0.0)], true, 5.0),
            )),
            trimmed_end_link: Some(route_link(
                2,
                traversal(2, &[(1.0, 0.0), (1.5, 0.0)], true, 5.0),
            )),
        };

        let result = create_route_result(&route).unwrap();

        // Total cost reflects the trimmed traversals.
        assert_eq!(result.weight, 10.0);
        // The merged geometry starts and ends at the trim points.
        assert_eq!(result.geometry.0.first(), Some(&Coord { x: 0.5, y: 0.0 }));
        assert_eq!(result.geometry.0.last(), Some(&Coord { x: 1.5, y: 0.0 }));
        // Paths keep the untrimmed link geometries.
        assert_eq!(result.paths[0].geometry.0.first(), Some(&Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn discontinuous_links_fail_as_no_segment() {
        let route = RouteDto {
            route_links: vec![
                route_link(1, traversal(1, &[(0.0, 0.0), (1.0, 0.0)], true, 1.0)),
                route_link(2, traversal(2, &[(9.0, 9.0), (10.0, 9.0)], true, 1.0)),
            ],
            trimmed_start_link: None,
            trimmed_end_link: None,
        };

        assert!(matches!(
            create_route_result(&route),
            Err(RoutingFailure::NoSegment(_))
        ));
    }
}
