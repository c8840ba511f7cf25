//! Shared test utilities for the volcano-viz workspace.
//!
//! Provides an in-process fake data server speaking the GETDATA line
//! protocol, for integration tests that exercise pooling and dispatch
//! without a real backend.

pub mod fake_backend;

pub use fake_backend::{FakeBackend, FakeResponse};
