use crate::geometry::SphereMesh;
use crate::light::Light;
use crate::material::Material;
use crate::starfield::PointCloud;
use glam::{Mat4, Quat};
use std::collections::BTreeMap;
use std::sync::Arc;
use terrella_common::{NodeId, Transform};

/// A renderable mesh: a shared geometric shape paired with a material owned
/// by this instance alone.
///
/// Layers that should be visually coincident share one `Arc<SphereMesh>`;
/// pointer identity tells the renderer to upload the shape once.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub shape: Arc<SphereMesh>,
    pub material: Material,
}

/// What a scene node renders, if anything.
#[derive(Debug, Clone)]
pub enum Payload {
    Mesh(MeshInstance),
    Points(PointCloud),
    Light(Light),
}

/// One node in the transform hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    /// Rotation increment about the local Y axis, radians per tick.
    /// Zero for nodes that do not spin.
    pub spin: f32,
    pub payload: Option<Payload>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            spin: 0.0,
            payload: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Transform hierarchy with a single root.
///
/// Uses BTreeMap for deterministic iteration order. Spin is not accumulated
/// into node transforms; the effective spin angle is derived from the tick
/// counter, so a layer's total rotation after n ticks is exactly
/// `n as f32 * spin` with no drift from repeated quaternion products.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    root: NodeId,
    nodes: BTreeMap<NodeId, SceneNode>,
    ticks: u64,
}

impl SceneGraph {
    /// Create a graph containing only the root node (identity transform).
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = BTreeMap::new();
        nodes.insert(root, SceneNode::new("root"));
        Self {
            root,
            nodes,
            ticks: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of frame ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Insert a node under the given parent. Returns the new node's id.
    ///
    /// # Panics
    /// Panics if `parent` is not in the graph; scene assembly runs once at
    /// startup and a dangling parent is a construction bug.
    pub fn insert(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        assert!(self.nodes.contains_key(&parent), "parent node not in graph");
        let id = NodeId::new();
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Advance the frame tick. Every spinning node's effective rotation
    /// advances by its per-tick increment.
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    /// A node's accumulated spin angle in radians at the current tick.
    pub fn spin_angle(&self, id: NodeId) -> f32 {
        self.nodes
            .get(&id)
            .map(|n| n.spin * self.ticks as f32)
            .unwrap_or(0.0)
    }

    /// A node's local matrix including its current spin rotation.
    fn local_matrix(&self, node: &SceneNode) -> Mat4 {
        if node.spin == 0.0 {
            return node.transform.matrix();
        }
        let spun = Transform {
            rotation: node.transform.rotation * Quat::from_rotation_y(node.spin * self.ticks as f32),
            ..node.transform
        };
        spun.matrix()
    }

    /// World transform of one node, composed root-to-leaf.
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let Some(node) = self.nodes.get(&id) else {
            return Mat4::IDENTITY;
        };
        let local = self.local_matrix(node);
        match node.parent {
            Some(parent) => self.world_transform(parent) * local,
            // Root contributes identity regardless of its own transform.
            None => Mat4::IDENTITY,
        }
    }

    /// World transforms for every node, computed in one traversal.
    pub fn world_transforms(&self) -> BTreeMap<NodeId, Mat4> {
        let mut out = BTreeMap::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, world)) = stack.pop() {
            out.insert(id, world);
            if let Some(node) = self.nodes.get(&id) {
                for &child in &node.children {
                    if let Some(child_node) = self.nodes.get(&child) {
                        stack.push((child, world * self.local_matrix(child_node)));
                    }
                }
            }
        }
        out
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn root_world_transform_is_identity() {
        let graph = SceneGraph::new();
        assert_eq!(graph.world_transform(graph.root()), Mat4::IDENTITY);
    }

    #[test]
    fn world_transform_composes_parent_to_child() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(
            graph.root(),
            SceneNode::new("parent").with_transform(Transform {
                position: Vec3::new(1.0, 0.0, 0.0),
                ..Transform::default()
            }),
        );
        let child = graph.insert(
            parent,
            SceneNode::new("child").with_transform(Transform {
                position: Vec3::new(0.0, 2.0, 0.0),
                ..Transform::default()
            }),
        );
        let world = graph.world_transform(child);
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn world_transforms_match_single_node_queries() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(
            graph.root(),
            SceneNode::new("a").with_transform(Transform {
                position: Vec3::new(0.0, 0.0, 3.0),
                scale: Vec3::splat(2.0),
                ..Transform::default()
            }),
        );
        let b = graph.insert(a, SceneNode::new("b"));
        let all = graph.world_transforms();
        assert_eq!(all[&a], graph.world_transform(a));
        assert_eq!(all[&b], graph.world_transform(b));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn spin_angle_is_exactly_ticks_times_increment() {
        let mut graph = SceneGraph::new();
        let layer = graph.insert(graph.root(), SceneNode::new("layer").with_spin(0.002));
        for _ in 0..500 {
            graph.tick();
        }
        assert_eq!(graph.spin_angle(layer), 500.0 * 0.002);
    }

    #[test]
    fn spin_does_not_touch_node_transform() {
        let mut graph = SceneGraph::new();
        let tilt = Quat::from_rotation_z(-0.408_407_04);
        let group = graph.insert(
            graph.root(),
            SceneNode::new("group").with_transform(Transform {
                rotation: tilt,
                ..Transform::default()
            }),
        );
        for _ in 0..1000 {
            graph.tick();
        }
        let rotation = graph.get(group).unwrap().transform.rotation;
        assert_eq!(rotation.to_array(), tilt.to_array());
    }

    #[test]
    fn non_spinning_node_is_constant_across_ticks() {
        let mut graph = SceneGraph::new();
        let id = graph.insert(graph.root(), SceneNode::new("static"));
        let before = graph.world_transform(id);
        graph.tick();
        graph.tick();
        assert_eq!(graph.world_transform(id), before);
    }

    #[test]
    #[should_panic(expected = "parent node not in graph")]
    fn insert_under_unknown_parent_panics() {
        let mut graph = SceneGraph::new();
        graph.insert(NodeId::new(), SceneNode::new("orphan"));
    }
}
