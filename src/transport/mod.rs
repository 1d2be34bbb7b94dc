//! HTTP transport for the admin API.

pub mod http;

pub use http::{AppState, HttpServer, router};
