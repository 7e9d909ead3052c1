// Mercato API Library
//
// This crate provides the REST API layer for Mercato: schema administration
// endpoints, the dynamic document routes and health probes, all answering with
// the same response envelope.

pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::configure_routes;
