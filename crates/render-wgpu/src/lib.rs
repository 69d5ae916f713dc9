//! wgpu render backend for the planet viewer.
//!
//! Draws the layered planet (lit surface, additive night lights and clouds),
//! the starfield billboards, and the sun marker, with a depth-only shadow
//! pass for the directional light.
//!
//! # Invariants
//! - The renderer never mutates scene state; it reads the graph and camera
//!   each frame and re-derives world transforms.
//! - Shapes shared between layers are uploaded to the GPU exactly once.
//! - Missing texture maps resolve to neutral fallbacks, never to errors.

mod gpu;
mod mesh;
mod shaders;
mod texture;

pub use gpu::WgpuRenderer;
