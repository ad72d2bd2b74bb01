//! Reference DDL for the `routing` schema.
//!
//! The relational schema is the wire contract of this service: every query
//! issued by the repository layer targets these tables. Rows are created and
//! maintained by external import processes, and the vertex table is
//! regenerated by pgRouting's `pgr_createTopology`; this service never
//! writes to the schema. The DDL below is carried as reference so the
//! contract is reviewable next to the queries that depend on it.

pub const ROUTING_SCHEMA_DDL: &str = r#"
CREATE SCHEMA IF NOT EXISTS routing;

CREATE TABLE routing.infrastructure_source (
    infrastructure_source_id serial PRIMARY KEY,
    infrastructure_source_name text NOT NULL UNIQUE,
    description text
);

CREATE TABLE routing.traffic_flow_direction (
    traffic_flow_direction_type int PRIMARY KEY,
    traffic_flow_direction_name text NOT NULL UNIQUE,
    description text
);

INSERT INTO routing.traffic_flow_direction
    (traffic_flow_direction_type, traffic_flow_direction_name, description) VALUES
    (2, 'bidirectional', 'Traffic flows in both directions of the link'),
    (3, 'against digitised direction', 'Traffic flows against the digitised direction of the link geometry'),
    (4, 'along digitised direction', 'Traffic flows along the digitised direction of the link geometry');

CREATE TABLE routing.vehicle_mode (
    vehicle_mode text PRIMARY KEY
);

CREATE TABLE routing.vehicle_type (
    vehicle_type text PRIMARY KEY,
    belonging_to_vehicle_mode text NOT NULL REFERENCES routing.vehicle_mode (vehicle_mode)
);

CREATE TABLE routing.infrastructure_link (
    infrastructure_link_id bigserial PRIMARY KEY,
    infrastructure_source_id int NOT NULL REFERENCES routing.infrastructure_source (infrastructure_source_id),
    external_link_id text NOT NULL,
    traffic_flow_direction_type int NOT NULL REFERENCES routing.traffic_flow_direction (traffic_flow_direction_type),
    municipality_code int,
    external_link_type int,
    external_link_state int,
    name jsonb,
    geom geometry(LineString, 3067) NOT NULL,
    start_node_id bigint,
    end_node_id bigint,
    cost double precision,
    reverse_cost double precision,
    CONSTRAINT infrastructure_link_external_ref_unique
        UNIQUE (infrastructure_source_id, external_link_id)
);

COMMENT ON COLUMN routing.infrastructure_link.geom IS
    'The 2D linestring geometry describing the shape of the infrastructure link. Two-dimensionality and metric unit are required by pgRouting. EPSG:3067 is the coordinate system used by Digiroad.';
COMMENT ON COLUMN routing.infrastructure_link.start_node_id IS
    'The ID of the start node of the link, resolved by the pgr_createTopology function of pgRouting.';
COMMENT ON COLUMN routing.infrastructure_link.end_node_id IS
    'The ID of the end node of the link, resolved by the pgr_createTopology function of pgRouting.';
COMMENT ON COLUMN routing.infrastructure_link.cost IS
    'The graph traversal weight for the forward direction of the link geometry. When negative, the forward direction is excluded from shortest-path search.';
COMMENT ON COLUMN routing.infrastructure_link.reverse_cost IS
    'The graph traversal weight for the reverse direction of the link geometry. When negative, the reverse direction is excluded from shortest-path search.';

CREATE INDEX infrastructure_link_geom_idx
    ON routing.infrastructure_link USING gist (geom);

CREATE TABLE routing.infrastructure_link_safely_traversed_by_vehicle_type (
    infrastructure_link_id bigint NOT NULL REFERENCES routing.infrastructure_link (infrastructure_link_id),
    vehicle_type text NOT NULL REFERENCES routing.vehicle_type (vehicle_type),
    PRIMARY KEY (infrastructure_link_id, vehicle_type)
);

CREATE TABLE routing.public_transport_stop (
    public_transport_stop_id bigserial PRIMARY KEY,
    public_transport_stop_national_id int,
    located_on_infrastructure_link_id bigint NOT NULL REFERENCES routing.infrastructure_link (infrastructure_link_id),
    infrastructure_source_id int NOT NULL REFERENCES routing.infrastructure_source (infrastructure_source_id),
    is_on_direction_of_link_forward_traversal boolean,
    distance_from_link_start_in_meters double precision NOT NULL,
    municipality_code int,
    name jsonb,
    geom geometry(Point, 3067) NOT NULL
);

COMMENT ON COLUMN routing.public_transport_stop.is_on_direction_of_link_forward_traversal IS
    'Is the direction of traffic on this stop the same as the direction of the linestring describing the infrastructure link? If NULL, the direction is undefined.';
COMMENT ON COLUMN routing.public_transport_stop.distance_from_link_start_in_meters IS
    'The M value of the stop from the start of the linestring describing the infrastructure link, in meters.';

CREATE INDEX public_transport_stop_geom_idx
    ON routing.public_transport_stop USING gist (geom);

-- Maintained by pgr_createTopology; listed here for reference only.
CREATE TABLE routing.infrastructure_link_vertices_pgr (
    id bigserial PRIMARY KEY,
    cnt int,
    chk int,
    ein int,
    eout int,
    the_geom geometry(Point, 3067)
);

CREATE INDEX infrastructure_link_vertices_pgr_the_geom_idx
    ON routing.infrastructure_link_vertices_pgr USING gist (the_geom);
"#;
