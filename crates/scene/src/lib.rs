//! Scene composition for the planet viewer: transform hierarchy, materials,
//! lights, sphere geometry, camera, and starfield generation.
//!
//! This crate is GPU-free; it owns everything the render loop mutates each
//! frame and everything assembled once at startup. Renderers read from it
//! and never write back.
//!
//! # Invariants
//! - A node's world transform is its local matrix pre-multiplied by its
//!   parent's world transform; the root's world transform is identity.
//! - Layer spin is derived from the graph tick count, so accumulated
//!   rotation is exactly `ticks x increment` at any frame.
//! - Scene assembly either fully succeeds or fails before the first frame.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;
pub mod planet;
pub mod starfield;

pub use camera::{Camera, Viewport};
pub use geometry::SphereMesh;
pub use graph::{MeshInstance, Payload, SceneGraph, SceneNode};
pub use light::{Light, ShadowConfig};
pub use material::{BlendMode, Material};
pub use planet::{PlanetNodes, PlanetSpec, SceneNodes, SceneSpec, assemble_planet, assemble_scene};
pub use starfield::{PointCloud, StarPoint, StarfieldConfig};

/// Errors raised while validating or assembling a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid starfield configuration: {0}")]
    InvalidStarfield(String),
    #[error("invalid viewport: dimensions must be positive, got {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
    #[error("invalid shadow map size: {width}x{height}")]
    InvalidShadowMap { width: u32, height: u32 },
}
