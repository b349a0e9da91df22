//! ratewise-client — Scoring backend integration.
//!
//! Implements the `EvaluationApi` trait over HTTP, validates the backend's
//! loosely typed JSON, and loads the ratewise configuration.

pub mod config;
mod dto;
pub mod http;
pub mod mock;

pub use config::{load_config, load_config_from, RatewiseConfig};
pub use http::{HttpClient, StoredEvaluation};
pub use mock::MockApi;
