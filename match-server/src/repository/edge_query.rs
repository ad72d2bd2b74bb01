//! Link-selection subqueries passed to pgRouting functions.
//!
//! pgRouting functions take the edge set as an SQL string argument. The
//! builders here produce dollar-quoted SQL fragments that concatenate bind
//! placeholders through `quote_literal(..)`, so the actual values are still
//! bound through the driver rather than interpolated in Rust.

/// Columns pgRouting expects from the edge query: id, source, target, cost
/// and reverse_cost. Negative costs exclude the respective traversal
/// direction from shortest-path search.
const EDGE_QUERY_BODY: &str = "SELECT l.infrastructure_link_id AS id,\n  l.start_node_id AS source,\n  l.end_node_id AS target,\n  l.cost,\n  l.reverse_cost\nFROM routing.infrastructure_link l\nINNER JOIN routing.infrastructure_link_safely_traversed_by_vehicle_type s\n  ON s.infrastructure_link_id = l.infrastructure_link_id\nWHERE s.vehicle_type = ";

/// Edge query constrained by vehicle type only.
///
/// `vehicle_type_placeholder` is the 1-based index of the bind parameter
/// holding the vehicle type code.
pub fn vehicle_type_constrained(vehicle_type_placeholder: usize) -> String {
    format!("$edge$ {EDGE_QUERY_BODY}$edge$ || quote_literal(${vehicle_type_placeholder})")
}

/// Edge query constrained by vehicle type and a buffer area around a line
/// geometry, with optional explicit terminus link/node escape hatches.
///
/// Terminus links regularly poke out of the buffer polygon, so they (or
/// their endpoint nodes) can be admitted explicitly via array-literal bind
/// parameters (`{1,2,3}` syntax, see [`array_literal`]).
pub fn vehicle_type_and_buffer_area_constrained(
    vehicle_type_placeholder: usize,
    terminus_link_ids_placeholder: Option<usize>,
    terminus_node_ids_placeholder: Option<usize>,
    line_geojson_placeholder: usize,
    buffer_radius_placeholder: usize,
) -> String {
    let mut predicates: Vec<String> = Vec::new();

    if let Some(ph) = terminus_link_ids_placeholder {
        predicates.push(format!(
            "l.infrastructure_link_id = ANY(($edge$ || quote_literal(${ph}) || $edge$)::bigint[])"
        ));
    }
    if let Some(ph) = terminus_node_ids_placeholder {
        predicates.push(format!(
            "($edge$ || quote_literal(${ph}) || $edge$)::bigint[] && ARRAY[l.start_node_id, l.end_node_id]"
        ));
    }

    // The buffer area restriction is always applied.
    predicates.push(format!(
        "ST_Contains(ST_Buffer(ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON($edge$ || quote_literal(${line_geojson_placeholder}) || $edge$), 4326), 3067), ($edge$ || quote_literal(${buffer_radius_placeholder}::text) || $edge$)::float8), l.geom)"
    ));

    let restriction = if predicates.len() == 1 {
        format!("\n  AND {}", predicates[0])
    } else {
        format!("\n  AND (\n    {}\n  )", predicates.join("\n    OR "))
    };

    format!(
        "$edge$ {EDGE_QUERY_BODY}$edge$ || quote_literal(${vehicle_type_placeholder}) || $edge${restriction}$edge$"
    )
}

/// Render identifiers as a PostgreSQL array literal, e.g. `{1,2,3}`.
pub fn array_literal(ids: impl IntoIterator<Item = i64>) -> String {
    let mut literal = String::from("{");
    for (i, id) in ids.into_iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&id.to_string());
    }
    literal.push('}');
    literal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_type_query_exposes_pgrouting_columns() {
        let query = vehicle_type_constrained(1);
        for fragment in [
            "infrastructure_link_id AS id",
            "start_node_id AS source",
            "end_node_id AS target",
            "l.cost",
            "l.reverse_cost",
            "quote_literal($1)",
        ] {
            assert!(query.contains(fragment), "missing: {fragment}");
        }
    }

    #[test]
    fn vehicle_type_query_is_balanced_dollar_quoting() {
        let query = vehicle_type_constrained(3);
        assert_eq!(query.matches("$edge$").count() % 2, 0);
        assert!(query.ends_with("quote_literal($3)"));
    }

    #[test]
    fn buffer_query_without_explicit_references() {
        let query = vehicle_type_and_buffer_area_constrained(1, None, None, 2, 3);
        assert!(query.contains("ST_Contains(ST_Buffer("));
        assert!(query.contains("quote_literal($2)"));
        assert!(query.contains("quote_literal($3::text)"));
        assert!(query.contains("\n  AND ST_Contains"));
        assert!(!query.contains("ANY"));
        assert!(!query.contains("ARRAY[l.start_node_id, l.end_node_id]"));
    }

    #[test]
    fn buffer_query_with_terminus_links_and_nodes() {
        let query = vehicle_type_and_buffer_area_constrained(1, Some(2), Some(3), 4, 5);
        assert!(query.contains("l.infrastructure_link_id = ANY(($edge$ || quote_literal($2)"));
        assert!(query.contains("quote_literal($3) || $edge$)::bigint[] && ARRAY[l.start_node_id, l.end_node_id]"));
        assert!(query.contains("\n  AND (\n    "));
        assert!(query.contains("\n    OR "));
        assert_eq!(query.matches("$edge$").count() % 2, 0);
    }

    #[test]
    fn array_literal_renders_postgres_syntax() {
        assert_eq!(array_literal([1, 2, 3]), "{1,2,3}");
        assert_eq!(array_literal([]), "{}");
        assert_eq!(array_literal([42]), "{42}");
    }
}
