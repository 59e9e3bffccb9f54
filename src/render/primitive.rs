use crate::render::mesh::{Mesh, Vertex};

/// Axis-aligned cube with per-face normals, tangents and uvs.
pub fn create_cube_mesh(name: &str, half_extent: f32) -> Mesh {
    // (normal, tangent) per face; bitangent = normal x tangent.
    let faces: [([f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, tangent) in faces {
        let n = cgmath::Vector3::from(normal);
        let t = cgmath::Vector3::from(tangent);
        let b = n.cross(t);
        let base = vertices.len() as u32;

        for (u, v) in [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)] {
            let position = (n + t * (u * 2.0 - 1.0) + b * (1.0 - v * 2.0)) * half_extent;

            vertices.push(Vertex {
                position: position.into(),
                normal,
                color: [1.0, 1.0, 1.0],
                tangent,
                bitangent: b.into(),
                uv: [u, v],
            });
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Mesh::new(name, vertices, Some(indices))
}
