//! MySQL Admin Server Library
//!
//! HTTP backend for a browser-based MySQL administration tool: schema
//! browsing, record editing, ad-hoc SQL, structure changes and SQL/CSV
//! export, all against per-user session credentials.

pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod session;
pub mod sql;
pub mod transport;

pub use config::Config;
pub use error::{AdminError, AdminResult};
pub use session::SessionStore;
