//! Repository layer — case-scoped database operations.
//!
//! Plain functions over a borrowed `Connection`. Cases are append-only, so
//! only insert and read operations exist.

mod case;

pub use case::*;
