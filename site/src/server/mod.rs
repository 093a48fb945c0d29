//! HTTP server for the wedding site.
//!
//! - Application state wiring
//! - Router configuration and operational endpoints

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
