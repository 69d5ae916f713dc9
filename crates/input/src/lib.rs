//! Orbit input: pointer and wheel gestures mapped to camera orbiting.
//!
//! # Invariants
//! - The controller is the only writer of camera placement; projection
//!   parameters belong to the resize handler.
//! - Gestures buffer between ticks and are consumed by exactly one
//!   `update` call.

pub mod orbit;

pub use orbit::{OrbitController, OrbitEvent};
