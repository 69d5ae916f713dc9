//! Shared leaf types for the terrella viewer.
//!
//! # Invariants
//! - `Transform::default()` is the identity transform.
//! - `NodeId`s are unique per construction.

pub mod types;

pub use types::{NodeId, Transform};
