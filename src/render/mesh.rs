use std::cell::Cell;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 6] = [
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, tangent) as wgpu::BufferAddress,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, bitangent) as wgpu::BufferAddress,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(Vertex, uv) as wgpu::BufferAddress,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x2,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Vertex::ATTRIBUTES,
        }
    }

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            color: [1.0, 1.0, 1.0],
            uv,
            ..Default::default()
        }
    }
}

/// Where a mesh landed in the vertex and index arenas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MeshPlacement {
    pub vertex_offset: u32,
    pub index_offset: Option<u32>,
}

pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
    placement: Cell<Option<MeshPlacement>>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Option<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            placement: Cell::new(None),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> Option<u32> {
        self.indices.as_ref().map(|indices| indices.len() as u32)
    }

    pub fn placement(&self) -> Option<MeshPlacement> {
        self.placement.get()
    }

    /// Placements are written once; later calls keep the first value.
    pub(crate) fn set_placement(&self, placement: MeshPlacement) {
        if self.placement.get().is_none() {
            self.placement.set(Some(placement));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_seventeen_tightly_packed_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 17 * 4);
        assert_eq!(Vertex::ATTRIBUTES[5].offset, 15 * 4);
        assert_eq!(Vertex::layout().array_stride, 68);
    }

    #[test]
    fn placement_is_write_once() {
        let mesh = Mesh::new("triangle", vec![Vertex::default(); 3], None);

        mesh.set_placement(MeshPlacement {
            vertex_offset: 12,
            index_offset: None,
        });
        mesh.set_placement(MeshPlacement {
            vertex_offset: 99,
            index_offset: Some(4),
        });

        assert_eq!(mesh.placement().map(|p| p.vertex_offset), Some(12));
    }
}
