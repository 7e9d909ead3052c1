//! Health check handlers
//!
//! ## Endpoints
//! - GET /healthz - liveness probe
//! - GET /readyz - readiness probe (503 once the registry is shut down)

mod healthz;
mod readyz;

pub use healthz::healthz_handler;
pub use readyz::readyz_handler;
