//! API Module
//!
//! Operational HTTP surface for dashboards and change-notification relays.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /metrics` - Cache counters
//! - `GET /info` - Cache summary
//! - `POST /invalidate` - Pattern invalidation
//! - `POST /invalidate/:domain` - Named domain invalidation
//! - `DELETE /clear` - Clear the cache
//! - `PATCH /config` - Update configuration

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
