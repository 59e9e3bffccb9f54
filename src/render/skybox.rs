use cgmath::InnerSpace;

use crate::render::mesh::{Mesh, Vertex};

#[rustfmt::skip]
const SKYBOX_POSITIONS: [f32; 108] = [
    -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0,
    -1.0, 1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0,
    -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0,
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0,
    -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
];

/// Unit cube seen from the inside. Normals point at the viewer in the center.
pub fn create_sky_mesh() -> Mesh {
    let vertices = SKYBOX_POSITIONS
        .chunks_exact(3)
        .map(|position| {
            let position = [position[0], position[1], position[2]];
            let normal = -cgmath::Vector3::from(position).normalize();
            Vertex::new(position, normal.into(), [0.0, 0.0])
        })
        .collect();

    Mesh::new("SKYBOX", vertices, None)
}
