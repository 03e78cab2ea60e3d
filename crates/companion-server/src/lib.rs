//! Campus companion server library - HTTP/WebSocket surface over the core data layer.
//!
//! Routes, the live history feed, and application state live here, apart
//! from main.rs, so integration tests can drive the router directly.

pub mod config;
pub mod history_ws;
pub mod logging;
pub mod routes;
pub mod state;
