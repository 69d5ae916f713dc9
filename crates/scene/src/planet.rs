use crate::SceneError;
use crate::geometry::SphereMesh;
use crate::graph::{MeshInstance, Payload, SceneGraph, SceneNode};
use crate::light::{Light, ShadowConfig};
use crate::material::{BlendMode, Material};
use crate::starfield::{self, StarfieldConfig};
use glam::{Quat, Vec3};
use std::sync::Arc;
use terrella_assets::PlanetTextures;
use terrella_common::{NodeId, Transform};

/// Planet construction parameters. Defaults carry the viewer's standard
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetSpec {
    pub radius: f32,
    pub segments: u32,
    pub rings: u32,
    /// Axial tilt about Z in radians, applied to the group exactly once.
    pub tilt: f32,
    /// Layer rotation in radians per frame tick.
    pub spin: f32,
    /// Clouds layer scale relative to the surface; slightly above 1 to keep
    /// the two sphere shells from z-fighting.
    pub cloud_scale: f32,
    pub cloud_opacity: f32,
    pub night_lights_opacity: f32,
}

impl Default for PlanetSpec {
    fn default() -> Self {
        Self {
            radius: 1.0,
            segments: 64,
            rings: 64,
            tilt: -23.4_f32.to_radians(),
            spin: 0.002,
            cloud_scale: 1.003,
            cloud_opacity: 0.5,
            night_lights_opacity: 0.4,
        }
    }
}

/// Node ids of the assembled planet group and its layers.
#[derive(Debug, Clone, Copy)]
pub struct PlanetNodes {
    pub group: NodeId,
    pub surface: NodeId,
    pub night_lights: NodeId,
    pub clouds: NodeId,
}

impl PlanetNodes {
    pub fn layers(&self) -> [NodeId; 3] {
        [self.surface, self.night_lights, self.clouds]
    }
}

fn surface_material(textures: &PlanetTextures) -> Material {
    Material {
        name: "surface".into(),
        albedo: textures.surface,
        normal_map: textures.normal,
        normal_scale: 0.8,
        displacement_map: textures.displacement,
        displacement_scale: 0.05,
        emissive: Vec3::splat(0x22 as f32 / 255.0),
        emissive_intensity: 0.5,
        roughness: 0.5,
        metalness: 0.2,
        cast_shadow: true,
        receive_shadow: true,
        ..Material::default()
    }
}

fn night_lights_material(textures: &PlanetTextures, opacity: f32) -> Material {
    Material {
        name: "night_lights".into(),
        albedo: textures.night_lights,
        opacity,
        blend: BlendMode::Additive,
        lit: false,
        ..Material::default()
    }
}

fn clouds_material(textures: &PlanetTextures, opacity: f32) -> Material {
    Material {
        name: "clouds".into(),
        albedo: textures.clouds,
        opacity,
        blend: BlendMode::Additive,
        ..Material::default()
    }
}

/// Build the planet group: one tilted parent holding three layers that share
/// a single sphere shape but own distinct materials.
pub fn assemble_planet(
    graph: &mut SceneGraph,
    spec: &PlanetSpec,
    textures: &PlanetTextures,
) -> PlanetNodes {
    let shape = Arc::new(SphereMesh::new(spec.radius, spec.segments, spec.rings));

    let group = graph.insert(
        graph.root(),
        SceneNode::new("planet").with_transform(Transform {
            rotation: Quat::from_rotation_z(spec.tilt),
            ..Transform::default()
        }),
    );

    let surface = graph.insert(
        group,
        SceneNode::new("surface")
            .with_payload(Payload::Mesh(MeshInstance {
                shape: Arc::clone(&shape),
                material: surface_material(textures),
            }))
            .with_spin(spec.spin),
    );

    let night_lights = graph.insert(
        group,
        SceneNode::new("night_lights")
            .with_payload(Payload::Mesh(MeshInstance {
                shape: Arc::clone(&shape),
                material: night_lights_material(textures, spec.night_lights_opacity),
            }))
            .with_spin(spec.spin),
    );

    let clouds = graph.insert(
        group,
        SceneNode::new("clouds")
            .with_payload(Payload::Mesh(MeshInstance {
                shape,
                material: clouds_material(textures, spec.cloud_opacity),
            }))
            .with_transform(Transform {
                scale: Vec3::splat(spec.cloud_scale),
                ..Transform::default()
            })
            .with_spin(spec.spin),
    );

    PlanetNodes {
        group,
        surface,
        night_lights,
        clouds,
    }
}

/// Full scene construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSpec {
    pub planet: PlanetSpec,
    pub starfield: StarfieldConfig,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
    pub shadow: ShadowConfig,
    pub sun_marker_radius: f32,
}

impl Default for SceneSpec {
    fn default() -> Self {
        Self {
            planet: PlanetSpec::default(),
            starfield: StarfieldConfig::default(),
            ambient_color: Vec3::splat(0x40 as f32 / 255.0),
            ambient_intensity: 1.5,
            sun_color: Vec3::ONE,
            sun_intensity: 2.0,
            sun_position: Vec3::new(-5.0, 3.0, 5.0),
            shadow: ShadowConfig::default(),
            sun_marker_radius: 0.1,
        }
    }
}

/// Node ids of everything inserted at scene assembly.
#[derive(Debug, Clone, Copy)]
pub struct SceneNodes {
    pub planet: PlanetNodes,
    pub starfield: NodeId,
    pub ambient: NodeId,
    pub sun: NodeId,
    pub sun_marker: NodeId,
}

/// Compose the root scene: planet group, starfield, ambient light, shadowed
/// sun light, and a small marker sphere at the sun's position.
///
/// Fails before the first frame on invalid configuration.
pub fn assemble_scene(
    graph: &mut SceneGraph,
    spec: &SceneSpec,
    textures: &PlanetTextures,
) -> Result<SceneNodes, SceneError> {
    if spec.shadow.map_width == 0 || spec.shadow.map_height == 0 {
        return Err(SceneError::InvalidShadowMap {
            width: spec.shadow.map_width,
            height: spec.shadow.map_height,
        });
    }
    let stars = starfield::generate(&spec.starfield)?;
    tracing::info!("starfield generated with {} stars", stars.len());

    let planet = assemble_planet(graph, &spec.planet, textures);

    let starfield = graph.insert(
        graph.root(),
        SceneNode::new("starfield").with_payload(Payload::Points(stars)),
    );

    let ambient = graph.insert(
        graph.root(),
        SceneNode::new("ambient_light").with_payload(Payload::Light(Light::Ambient {
            color: spec.ambient_color,
            intensity: spec.ambient_intensity,
        })),
    );

    let sun = graph.insert(
        graph.root(),
        SceneNode::new("sun_light")
            .with_transform(Transform {
                position: spec.sun_position,
                ..Transform::default()
            })
            .with_payload(Payload::Light(Light::Directional {
                color: spec.sun_color,
                intensity: spec.sun_intensity,
                shadow: Some(spec.shadow),
            })),
    );

    let sun_marker = graph.insert(
        graph.root(),
        SceneNode::new("sun_marker")
            .with_transform(Transform {
                position: spec.sun_position,
                ..Transform::default()
            })
            .with_payload(Payload::Mesh(MeshInstance {
                shape: Arc::new(SphereMesh::new(spec.sun_marker_radius, 16, 16)),
                material: Material {
                    name: "sun_marker".into(),
                    base_color: Vec3::new(1.0, 1.0, 0.0),
                    ..Material::default()
                },
            })),
    );

    tracing::info!("scene assembled with {} nodes", graph.len());

    Ok(SceneNodes {
        planet,
        starfield,
        ambient,
        sun,
        sun_marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembled() -> (SceneGraph, SceneNodes) {
        let mut graph = SceneGraph::new();
        let nodes = assemble_scene(&mut graph, &SceneSpec::default(), &PlanetTextures::default())
            .unwrap();
        (graph, nodes)
    }

    #[test]
    fn layers_share_one_shape_with_distinct_materials() {
        let (graph, nodes) = assembled();
        let shape_of = |id| match graph.get(id).unwrap().payload.as_ref() {
            Some(Payload::Mesh(m)) => Arc::clone(&m.shape),
            _ => panic!("layer is not a mesh"),
        };
        let surface = shape_of(nodes.planet.surface);
        let lights = shape_of(nodes.planet.night_lights);
        let clouds = shape_of(nodes.planet.clouds);
        assert!(Arc::ptr_eq(&surface, &lights));
        assert!(Arc::ptr_eq(&surface, &clouds));

        let material_of = |id| match graph.get(id).unwrap().payload.as_ref() {
            Some(Payload::Mesh(m)) => m.material.clone(),
            _ => unreachable!(),
        };
        assert_eq!(material_of(nodes.planet.surface).blend, BlendMode::Opaque);
        assert_eq!(
            material_of(nodes.planet.night_lights).blend,
            BlendMode::Additive
        );
        assert!(!material_of(nodes.planet.night_lights).lit);
        assert!(material_of(nodes.planet.clouds).lit);
    }

    #[test]
    fn clouds_scale_sits_just_above_surface_scale() {
        let (graph, nodes) = assembled();
        let surface_scale = graph.get(nodes.planet.surface).unwrap().transform.scale.x;
        let clouds_scale = graph.get(nodes.planet.clouds).unwrap().transform.scale.x;
        let ratio = clouds_scale / surface_scale;
        assert!(ratio > 1.001 && ratio < 1.01, "ratio = {ratio}");
    }

    #[test]
    fn tilt_is_set_once_and_never_changes() {
        let (mut graph, nodes) = assembled();
        let tilt = graph.get(nodes.planet.group).unwrap().transform.rotation;
        assert_eq!(
            tilt.to_array(),
            Quat::from_rotation_z(-23.4_f32.to_radians()).to_array()
        );
        for _ in 0..500 {
            graph.tick();
        }
        let after = graph.get(nodes.planet.group).unwrap().transform.rotation;
        assert_eq!(tilt.to_array(), after.to_array());
    }

    #[test]
    fn all_layers_spin_identically_every_tick() {
        let (mut graph, nodes) = assembled();
        for tick in 1..=500u64 {
            graph.tick();
            let angles: Vec<f32> = nodes
                .planet
                .layers()
                .iter()
                .map(|&id| graph.spin_angle(id))
                .collect();
            assert_eq!(angles[0], angles[1]);
            assert_eq!(angles[0], angles[2]);
            assert_eq!(angles[0], tick as f32 * 0.002);
        }
    }

    #[test]
    fn scene_contains_expected_payloads() {
        let (graph, nodes) = assembled();
        match graph.get(nodes.starfield).unwrap().payload.as_ref() {
            Some(Payload::Points(cloud)) => assert_eq!(cloud.len(), 5000),
            _ => panic!("starfield node is not a point cloud"),
        }
        assert!(matches!(
            graph.get(nodes.ambient).unwrap().payload,
            Some(Payload::Light(Light::Ambient { .. }))
        ));
        assert!(matches!(
            graph.get(nodes.sun).unwrap().payload,
            Some(Payload::Light(Light::Directional { .. }))
        ));
    }

    #[test]
    fn sun_marker_sits_at_the_light_position() {
        let (graph, nodes) = assembled();
        let light_pos = graph.get(nodes.sun).unwrap().transform.position;
        let marker_pos = graph.get(nodes.sun_marker).unwrap().transform.position;
        assert_eq!(light_pos, marker_pos);
        assert_eq!(light_pos, Vec3::new(-5.0, 3.0, 5.0));
    }

    #[test]
    fn invalid_starfield_aborts_assembly() {
        let mut graph = SceneGraph::new();
        let spec = SceneSpec {
            starfield: StarfieldConfig {
                num_stars: 0,
                ..StarfieldConfig::default()
            },
            ..SceneSpec::default()
        };
        assert!(assemble_scene(&mut graph, &spec, &PlanetTextures::default()).is_err());
    }

    #[test]
    fn invalid_shadow_map_aborts_assembly() {
        let mut graph = SceneGraph::new();
        let spec = SceneSpec {
            shadow: ShadowConfig {
                map_width: 0,
                ..ShadowConfig::default()
            },
            ..SceneSpec::default()
        };
        assert!(matches!(
            assemble_scene(&mut graph, &spec, &PlanetTextures::default()),
            Err(SceneError::InvalidShadowMap { .. })
        ));
    }
}
