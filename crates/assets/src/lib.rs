//! Texture loading: decode image files into RGBA8 pixel data held in a
//! content-addressed registry.
//!
//! Textures are identified by a hash of the source bytes. Consumers hold
//! [`AssetId`] handles, never raw file paths.
//!
//! # Degradation
//! A texture that fails to read or decode is reported with a warning and
//! resolved to `None`; the affected material renders without that map.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Content-addressed texture ID computed from the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Decoded RGBA8 pixel data for one texture.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Errors from texture operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture not found: {0:?}")]
    NotFound(AssetId),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Content-addressed texture registry.
///
/// Uses BTreeMap for deterministic iteration order. Loading the same file
/// twice yields the same ID and a single registry entry.
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    textures: BTreeMap<AssetId, TextureData>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and decode an image file, registering it under its content hash.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetId, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let id = content_hash(&bytes);
        if self.textures.contains_key(&id) {
            return Ok(id);
        }

        let decoded = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".into());
        tracing::debug!("loaded texture {name} ({width}x{height})");

        self.textures.insert(
            id,
            TextureData {
                name,
                width,
                height,
                pixels: decoded.into_raw(),
            },
        );
        Ok(id)
    }

    /// Register pre-decoded pixel data. The ID is a hash of the pixels.
    pub fn register(&mut self, name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> AssetId {
        let id = content_hash(&pixels);
        self.textures.insert(
            id,
            TextureData {
                name: name.into(),
                width,
                height,
                pixels,
            },
        );
        id
    }

    /// Get a texture by ID.
    pub fn get(&self, id: AssetId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    /// Number of registered textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn content_hash(bytes: &[u8]) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    AssetId(u64::from_le_bytes(id))
}

/// File names for each planet texture role, overridable via `manifest.json`
/// in the texture directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureManifest {
    pub surface: String,
    pub night_lights: String,
    pub normal: String,
    pub displacement: String,
    pub clouds: String,
}

impl Default for TextureManifest {
    fn default() -> Self {
        Self {
            surface: "surface.jpg".into(),
            night_lights: "night_lights.jpg".into(),
            normal: "normal.jpg".into(),
            displacement: "displacement.jpg".into(),
            clouds: "clouds.jpg".into(),
        }
    }
}

impl TextureManifest {
    /// Read `manifest.json` from the texture directory, or fall back to the
    /// conventional file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = dir.as_ref().join("manifest.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        let manifest: Self = serde_json::from_reader(file)?;
        Ok(manifest)
    }
}

/// Resolved texture handles for each planet surface role.
///
/// Each role loads independently; a failure leaves that role `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanetTextures {
    pub surface: Option<AssetId>,
    pub night_lights: Option<AssetId>,
    pub normal: Option<AssetId>,
    pub displacement: Option<AssetId>,
    pub clouds: Option<AssetId>,
}

impl PlanetTextures {
    /// Load every role from the texture directory.
    pub fn load(store: &mut TextureStore, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let manifest = match TextureManifest::from_dir(dir) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("unreadable texture manifest in {}: {e}", dir.display());
                TextureManifest::default()
            }
        };

        let mut load_role = |role: &str, file: &str| match store.load(dir.join(file)) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("{role} texture {file} unavailable: {e}");
                None
            }
        };

        Self {
            surface: load_role("surface", &manifest.surface),
            night_lights: load_role("night lights", &manifest.night_lights),
            normal: load_role("normal", &manifest.normal),
            displacement: load_role("displacement", &manifest.displacement),
            clouds: load_role("clouds", &manifest.clouds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_pixels(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        pixels
    }

    #[test]
    fn register_and_get_roundtrip() {
        let mut store = TextureStore::new();
        let id = store.register("checker", 4, 4, checker_pixels(4, 4));
        let tex = store.get(id).unwrap();
        assert_eq!(tex.width, 4);
        assert_eq!(tex.height, 4);
        assert_eq!(tex.pixels.len(), 4 * 4 * 4);
    }

    #[test]
    fn content_hash_is_stable() {
        let mut store = TextureStore::new();
        let a = store.register("a", 2, 2, checker_pixels(2, 2));
        let b = store.register("b", 2, 2, checker_pixels(2, 2));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let mut store = TextureStore::new();
        let err = store.load("/nonexistent/texture.png").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn load_decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.png");
        let img = image::RgbaImage::from_raw(4, 4, checker_pixels(4, 4)).unwrap();
        img.save(&path).unwrap();

        let mut store = TextureStore::new();
        let id = store.load(&path).unwrap();
        let tex = store.get(id).unwrap();
        assert_eq!((tex.width, tex.height), (4, 4));
        assert_eq!(tex.name, "surface");

        // Loading the same file again dedupes on content hash.
        let id2 = store.load(&path).unwrap();
        assert_eq!(id, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn planet_textures_degrade_per_role() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_raw(2, 2, checker_pixels(2, 2)).unwrap();
        img.save(dir.path().join("clouds.jpg")).ok();
        // jpeg encode of RGBA may be refused; fall back to the png name via manifest
        let manifest = TextureManifest {
            clouds: "clouds.png".into(),
            ..TextureManifest::default()
        };
        std::fs::write(
            dir.path().join("manifest.json"),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();
        img.save(dir.path().join("clouds.png")).unwrap();

        let mut store = TextureStore::new();
        let set = PlanetTextures::load(&mut store, dir.path());
        assert!(set.clouds.is_some());
        assert!(set.surface.is_none());
        assert!(set.normal.is_none());
    }

    #[test]
    fn manifest_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = TextureManifest::from_dir(dir.path()).unwrap();
        assert_eq!(manifest.surface, "surface.jpg");
        assert_eq!(manifest.clouds, "clouds.jpg");
    }
}
