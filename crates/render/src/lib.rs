//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the scene graph or the camera.
//! - Render output derives from scene state and camera state alone.
//!
//! The trait is the seam between the frame loop and the GPU backend; the
//! debug text renderer exercises it without a device.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};
