//! Mock backends and sinks for controller tests
//!
//! They record how often they were called so tests can assert that a
//! rejected request never reached the backend.

pub mod mock_backend;

pub use mock_backend::{track, MockDownload, MockSearch, RecordingSink};
