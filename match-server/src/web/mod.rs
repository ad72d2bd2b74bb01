//! Web layer of the map-matching server.
//!
//! Provides HTTP endpoints for finding routes through the infrastructure
//! network and for map-matching public transport routes.

pub mod dto;
pub mod params;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
