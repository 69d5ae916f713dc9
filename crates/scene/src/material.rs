use glam::Vec3;
use serde::{Deserialize, Serialize};
use terrella_assets::AssetId;

/// How a layer's fragments combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Replaces the destination; drawn in the opaque pass with depth writes.
    Opaque,
    /// Adds onto the destination; drawn after opaques without depth writes.
    Additive,
}

/// Surface description for one renderable layer.
///
/// Texture slots hold handles into the texture registry; a `None` slot
/// renders with a neutral built-in fallback. Layers sharing a shape still
/// own distinct `Material` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Multiplied with the albedo sample.
    pub base_color: Vec3,
    pub albedo: Option<AssetId>,
    pub normal_map: Option<AssetId>,
    pub normal_scale: f32,
    pub displacement_map: Option<AssetId>,
    pub displacement_scale: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub blend: BlendMode,
    /// Unlit materials skip the lighting model entirely.
    pub lit: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: Vec3::ONE,
            albedo: None,
            normal_map: None,
            normal_scale: 1.0,
            displacement_map: None,
            displacement_scale: 0.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 0.0,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            blend: BlendMode::Opaque,
            lit: true,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_opaque_and_lit() {
        let m = Material::default();
        assert_eq!(m.blend, BlendMode::Opaque);
        assert!(m.lit);
        assert_eq!(m.opacity, 1.0);
        assert!(m.albedo.is_none());
    }

    #[test]
    fn materials_do_not_share_state() {
        let a = Material::default();
        let mut b = a.clone();
        b.opacity = 0.4;
        assert_eq!(a.opacity, 1.0);
    }
}
