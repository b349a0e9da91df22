//! ratewise-core — Scoring engine, evaluation model, and workflow.
//!
//! This crate defines the data model, the weighted scoring rules, the
//! evaluation form lifecycle, and the traits that the HTTP client and the
//! local store implement.

pub mod error;
pub mod form;
pub mod grade;
pub mod identity;
pub mod loader;
pub mod model;
pub mod project;
pub mod result;
pub mod scoring;
pub mod service;
pub mod settings;
pub mod store;
pub mod traits;
