use terrella_scene::{Camera, Payload, SceneGraph};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene graph and camera, then produces output for
/// one frame. It never writes back; frame mutation belongs to the loop.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and camera.
    fn render(&self, graph: &SceneGraph, camera: &Camera) -> Self::Output;
}

/// Debug text renderer.
///
/// Produces a human-readable description of the frame: tick counter, camera
/// placement, and one line per renderable node. Useful for logging and for
/// testing the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, graph: &SceneGraph, camera: &Camera) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame (tick={}, nodes={}) ===\n",
            graph.ticks(),
            graph.len()
        ));
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) aspect={:.4}\n",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.aspect
        ));

        for (id, node) in graph.nodes() {
            let kind = match &node.payload {
                Some(Payload::Mesh(m)) => format!("mesh({})", m.material.name),
                Some(Payload::Points(p)) => format!("points({})", p.len()),
                Some(Payload::Light(_)) => "light".into(),
                None => "group".into(),
            };
            out.push_str(&format!(
                "  {} [{kind}] spin={:.4}\n",
                node.name,
                graph.spin_angle(id)
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrella_assets::PlanetTextures;
    use terrella_scene::{SceneSpec, assemble_scene};

    #[test]
    fn debug_renderer_empty_scene() {
        let graph = SceneGraph::new();
        let output = DebugTextRenderer::new().render(&graph, &Camera::default());
        assert!(output.contains("tick=0"));
        assert!(output.contains("nodes=1"));
    }

    #[test]
    fn debug_renderer_lists_planet_layers() {
        let mut graph = SceneGraph::new();
        assemble_scene(&mut graph, &SceneSpec::default(), &PlanetTextures::default()).unwrap();
        graph.tick();

        let output = DebugTextRenderer::new().render(&graph, &Camera::default());
        assert!(output.contains("tick=1"));
        assert!(output.contains("surface"));
        assert!(output.contains("night_lights"));
        assert!(output.contains("clouds"));
        assert!(output.contains("points(5000)"));
    }
}
