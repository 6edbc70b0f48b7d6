//! Triangle mesh construction helpers.

use strata_math::{Vec2, Vec3, PI};

use crate::triangle::{Triangle, Vertex};

/// Expand an indexed mesh into triangles.
///
/// Every three indices form a triangle. Normals and UVs are optional; missing
/// normals use the face normal, missing UVs the unit triangle.
/// Out-of-range indices skip the face with a warning.
pub fn from_indexed(
    positions: &[Vec3],
    normals: Option<&[Vec3]>,
    uvs: Option<&[Vec2]>,
    indices: &[u32],
) -> Vec<Triangle> {
    let mut triangles = Vec::with_capacity(indices.len() / 3);

    for chunk in indices.chunks_exact(3) {
        let face = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];
        if face.iter().any(|&i| i >= positions.len()) {
            log::warn!(
                "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                face[0],
                face[1],
                face[2],
                positions.len()
            );
            continue;
        }

        let flat = Triangle::from_positions(positions[face[0]], positions[face[1]], positions[face[2]]);
        let vertices = std::array::from_fn(|k| {
            let i = face[k];
            let normal = normals
                .and_then(|n| n.get(i).copied())
                .unwrap_or(flat.vertices[k].normal);
            let uv = uvs.and_then(|t| t.get(i).copied()).unwrap_or(flat.vertices[k].uv);
            Vertex::new(positions[i], normal, uv)
        });
        triangles.push(Triangle { vertices });
    }

    triangles
}

/// Two triangles spanning `center ± u ± v`, facing along `u × v`.
pub fn quad(center: Vec3, u: Vec3, v: Vec3) -> Vec<Triangle> {
    let positions = [
        center - u - v,
        center + u - v,
        center + u + v,
        center - u + v,
    ];
    let normal = u.cross(v).normalize_or_zero();
    let normals = [normal; 4];
    let uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    from_indexed(&positions, Some(&normals), Some(&uvs), &[0, 1, 2, 0, 2, 3])
}

/// Latitude/longitude sphere with smooth outward normals.
///
/// `rings` counts latitude bands from pole to pole, `segments` longitude
/// slices around the Y axis.
pub fn uv_sphere(center: Vec3, radius: f32, segments: u32, rings: u32) -> Vec<Triangle> {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    let mut uvs = Vec::with_capacity(positions.capacity());
    for i in 0..=rings {
        let theta = PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let phi = 2.0 * PI * j as f32 / segments as f32;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            positions.push(center + radius * n);
            normals.push(n);
            uvs.push(Vec2::new(j as f32 / segments as f32, 1.0 - i as f32 / rings as f32));
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for i in 0..rings {
        for j in 0..segments {
            let v00 = i * stride + j;
            let v01 = v00 + 1;
            let v10 = v00 + stride;
            let v11 = v10 + 1;
            // Pole rows collapse one triangle of each quad.
            if i + 1 < rings {
                indices.extend_from_slice(&[v00, v11, v10]);
            }
            if i > 0 {
                indices.extend_from_slice(&[v00, v01, v11]);
            }
        }
    }

    from_indexed(&positions, Some(&normals), Some(&uvs), &indices)
}
