//! Map-matching and routing server.
//!
//! A web service that matches public transport routes against an
//! infrastructure-link network stored in a PostGIS/pgRouting database,
//! and resolves shortest-path routes through that network.

pub mod domain;
pub mod geometry;
pub mod repository;
pub mod schema;
pub mod service;
pub mod web;
