//! HTTP surface for the triage engine.
//!
//! Thin layer: handlers parse requests, run the engine on the blocking
//! pool, and map errors to structured JSON. No triage logic lives here.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, serve_on};
pub use types::ApiContext;
