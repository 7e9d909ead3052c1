//! mercato-configs
//!
//! Server configuration types and loader for Mercato.

pub mod config;

pub use config::defaults;
pub use config::*;
