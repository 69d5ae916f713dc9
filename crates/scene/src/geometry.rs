use serde::{Deserialize, Serialize};

/// CPU-side UV sphere mesh, generated by latitude/longitude subdivision.
///
/// `segments` divides the equator, `rings` runs pole to pole. Vertices carry
/// positions, outward normals, tangents along increasing longitude (for
/// normal mapping), and equirectangular UVs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereMesh {
    pub radius: f32,
    pub segments: u32,
    pub rings: u32,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn new(radius: f32, segments: u32, rings: u32) -> Self {
        let vertex_count = ((segments + 1) * (rings + 1)) as usize;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut tangents = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                positions.push([x * radius, y * radius, z * radius]);
                normals.push([x, y, z]);
                tangents.push([-theta.sin(), 0.0, theta.cos()]);
                uvs.push([
                    1.0 - seg as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ]);
            }
        }

        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self {
            radius,
            segments,
            rings,
            positions,
            normals,
            tangents,
            uvs,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn vertex_and_index_counts_match_subdivision() {
        let mesh = SphereMesh::new(1.0, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        assert_eq!(mesh.index_count(), 64 * 64 * 6);
    }

    #[test]
    fn normals_are_unit_length_and_radial() {
        let mesh = SphereMesh::new(2.0, 16, 8);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let pos = Vec3::from_array(*p);
            let normal = Vec3::from_array(*n);
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!((pos - normal * 2.0).length() < 1e-4);
        }
    }

    #[test]
    fn tangents_are_orthogonal_to_normals() {
        let mesh = SphereMesh::new(1.0, 16, 8);
        for (n, t) in mesh.normals.iter().zip(&mesh.tangents) {
            let dot = Vec3::from_array(*n).dot(Vec3::from_array(*t));
            assert!(dot.abs() < 1e-5, "tangent not orthogonal: dot = {dot}");
        }
    }

    #[test]
    fn uvs_cover_unit_square() {
        let mesh = SphereMesh::new(1.0, 8, 4);
        for [u, v] in &mesh.uvs {
            assert!((0.0..=1.0).contains(u));
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn indices_are_in_range() {
        let mesh = SphereMesh::new(1.0, 8, 4);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
    }
}
