//! Data models for the centroid finder server.
//!
//! Domain models and the JSON DTOs returned by the default controller.

mod job;

pub use job::*;
