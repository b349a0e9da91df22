//! ratewise-store — File-backed key-value storage.
//!
//! Persists the local cache (projects, settings, saved evaluations, session
//! identity) as one JSON object on disk, the way a browser keeps its local
//! storage.

pub mod file;

pub use file::JsonFileStore;
