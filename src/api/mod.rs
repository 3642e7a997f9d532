//! REST API
//!
//! `router` wires the routes, `handlers` holds one module per resource, and
//! `state` is the shared handle every handler receives as an extension.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::{build_router, cors_layer};
pub use state::AppState;
