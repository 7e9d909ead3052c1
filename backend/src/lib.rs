//! Mercato Server Library
//!
//! Exposes the server modules to the binary and to integration tests.

pub mod lifecycle;
pub mod logging;
pub mod middleware;
