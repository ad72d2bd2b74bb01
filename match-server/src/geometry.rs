//! Geometry helpers over `geo-types` primitives and the GeoJSON boundary.
//!
//! All geometries exchanged with clients are WGS84; the database stores
//! planar EPSG:3067 geometries and transforms at the SQL boundary.

use geo_types::{Coord, LineString, Point};

/// Default tolerance for floating-point comparisons of measures and
/// fractional locations.
pub const DEFAULT_DOUBLE_TOLERANCE: f64 = 0.00001;

/// Maximum gap allowed between endpoints of consecutive lines when merging
/// link geometries into one route geometry. This is in WGS84 degrees and
/// corresponds to roughly 5.5 millimeters at northern latitudes.
const LINE_ENDPOINT_CONNECTION_TOLERANCE: f64 = 0.0000001;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry does not represent a 2D point")]
    NotAPoint,

    #[error("geometry does not represent a 2D linestring")]
    NotALineString,

    #[error("a linestring must have at least two positions")]
    TooFewPositions,

    #[error("must have at least one linestring to merge")]
    NothingToMerge,

    #[error(
        "not a topologically continuous sequence of lines, gap between consecutive line endpoints: {gap}"
    )]
    DiscontinuousLines { gap: f64 },
}

pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Planar distance between two coordinates, in the units of the coordinate
/// system the coordinates are expressed in.
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Merge link geometries that form a continuous path into one linestring.
///
/// Consecutive lines must connect end-to-start within a small tolerance;
/// source data occasionally carries sub-millimeter topology inaccuracies,
/// which are absorbed, but anything larger is an error.
pub fn merge_continuous_lines(
    lines: &[LineString<f64>],
) -> Result<LineString<f64>, GeometryError> {
    let first = lines.first().ok_or(GeometryError::NothingToMerge)?;

    let mut coords: Vec<Coord<f64>> = first.0.clone();

    for line in &lines[1..] {
        let prev_end = *coords.last().ok_or(GeometryError::TooFewPositions)?;
        let start = *line.0.first().ok_or(GeometryError::TooFewPositions)?;

        if start != prev_end {
            let gap = planar_distance(prev_end, start);
            if gap >= LINE_ENDPOINT_CONNECTION_TOLERANCE {
                return Err(GeometryError::DiscontinuousLines { gap });
            }
        }

        // The shared position was already added with the previous line.
        coords.extend_from_slice(&line.0[1..]);
    }

    Ok(LineString::new(coords))
}

/// A linestring with its coordinate order reversed.
pub fn reversed(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    coords.reverse();
    LineString::new(coords)
}

pub fn point_from_geojson(geometry: &geojson::Geometry) -> Result<Point<f64>, GeometryError> {
    match &geometry.value {
        geojson::Value::Point(position) if position.len() >= 2 => {
            Ok(Point::new(position[0], position[1]))
        }
        _ => Err(GeometryError::NotAPoint),
    }
}

pub fn linestring_from_geojson(
    geometry: &geojson::Geometry,
) -> Result<LineString<f64>, GeometryError> {
    match &geometry.value {
        geojson::Value::LineString(positions) => {
            if positions.len() < 2 {
                return Err(GeometryError::TooFewPositions);
            }
            let coords = positions
                .iter()
                .map(|position| {
                    if position.len() < 2 {
                        return Err(GeometryError::NotALineString);
                    }
                    Ok(Coord {
                        x: position[0],
                        y: position[1],
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LineString::new(coords))
        }
        _ => Err(GeometryError::NotALineString),
    }
}

/// Parse the output of `ST_AsGeoJSON` into a linestring.
pub fn linestring_from_geojson_text(text: &str) -> Result<LineString<f64>, GeometryError> {
    let geometry: geojson::Geometry =
        serde_json::from_str(text).map_err(|_| GeometryError::NotALineString)?;
    linestring_from_geojson(&geometry)
}

pub fn linestring_to_geojson(line: &LineString<f64>) -> geojson::Geometry {
    let positions = line.0.iter().map(|c| vec![c.x, c.y]).collect();
    geojson::Geometry::new(geojson::Value::LineString(positions))
}

/// Serialise a linestring to GeoJSON text for passing to `ST_GeomFromGeoJSON`.
pub fn linestring_to_geojson_text(line: &LineString<f64>) -> String {
    geojson::GeoJson::Geometry(linestring_to_geojson(line)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(coords.iter().map(|&(x, y)| Coord { x, y }).collect())
    }

    #[test]
    fn merges_lines_sharing_endpoints() {
        let merged = merge_continuous_lines(&[
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0)]),
        ])
        .unwrap();

        assert_eq!(merged, line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0)]));
    }

    #[test]
    fn single_line_merges_to_itself() {
        let original = line(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(merge_continuous_lines(&[original.clone()]).unwrap(), original);
    }

    #[test]
    fn sub_tolerance_gaps_are_absorbed() {
        let merged = merge_continuous_lines(&[
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0 + 1e-8, 0.0), (2.0, 0.0)]),
        ])
        .unwrap();

        // The second line's start is kept as-is; the gap is below tolerance.
        assert_eq!(merged.0.len(), 3);
    }

    #[test]
    fn discontinuous_lines_are_rejected() {
        let result = merge_continuous_lines(&[
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(5.0, 5.0), (6.0, 5.0)]),
        ]);

        assert!(matches!(result, Err(GeometryError::DiscontinuousLines { .. })));
    }

    #[test]
    fn merging_nothing_is_an_error() {
        assert_eq!(merge_continuous_lines(&[]), Err(GeometryError::NothingToMerge));
    }

    #[test]
    fn reversed_flips_coordinate_order() {
        assert_eq!(
            reversed(&line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 1.0)])),
            line(&[(2.0, 1.0), (1.0, 0.0), (0.0, 0.0)])
        );
    }

    #[test]
    fn geojson_point_conversion() {
        let geometry = geojson::Geometry::new(geojson::Value::Point(vec![24.94, 60.17]));
        let point = point_from_geojson(&geometry).unwrap();
        assert_eq!(point, Point::new(24.94, 60.17));
    }

    #[test]
    fn geojson_point_rejects_other_geometries() {
        let geometry =
            geojson::Geometry::new(geojson::Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
        assert_eq!(point_from_geojson(&geometry), Err(GeometryError::NotAPoint));
    }

    #[test]
    fn geojson_linestring_roundtrip() {
        let original = line(&[(24.94, 60.17), (24.95, 60.18)]);
        let geometry = linestring_to_geojson(&original);
        assert_eq!(linestring_from_geojson(&geometry).unwrap(), original);
    }

    #[test]
    fn geojson_linestring_requires_two_positions() {
        let geometry = geojson::Geometry::new(geojson::Value::LineString(vec![vec![1.0, 2.0]]));
        assert_eq!(
            linestring_from_geojson(&geometry),
            Err(GeometryError::TooFewPositions)
        );
    }

    #[test]
    fn linestring_parses_from_geojson_text() {
        let parsed =
            linestring_from_geojson_text(r#"{"type":"LineString","coordinates":[[0.0,0.0],[1.0,2.0]]}"#)
                .unwrap();
        assert_eq!(parsed, line(&[(0.0, 0.0), (1.0, 2.0)]));
    }

    #[test]
    fn within_tolerance_is_strict() {
        assert!(within_tolerance(1.0, 1.0 + 1e-6, DEFAULT_DOUBLE_TOLERANCE));
        assert!(!within_tolerance(1.0, 1.0 + 1e-4, DEFAULT_DOUBLE_TOLERANCE));
    }

    #[test]
    fn planar_distance_is_euclidean() {
        use approx::assert_relative_eq;

        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 3.0, y: 4.0 };
        assert_relative_eq!(planar_distance(a, b), 5.0);
        assert_relative_eq!(planar_distance(b, a), 5.0);
        assert_relative_eq!(planar_distance(a, a), 0.0);
    }
}
