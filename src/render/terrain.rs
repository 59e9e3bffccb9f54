use std::rc::Rc;

use anyhow::Result;

use crate::args::ArenaCapacities;
use crate::data::transform::Transform;
use crate::render::backend::RenderBackend;
use crate::render::buffer::allocator::BufferArena;
use crate::render::buffer::BufferCategory;
use crate::render::mesh::{Mesh, MeshPlacement, Vertex};
use crate::render::storage::{DrawCall, DrawRecord};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainModelRecord {
    pub transform: [[f32; 4]; 4],
}

impl From<Transform> for TerrainModelRecord {
    fn from(value: Transform) -> Self {
        Self {
            transform: cgmath::Matrix4::from(value).into(),
        }
    }
}

/// Terrain patch geometry and instances, kept in arenas separate from scene entities.
pub struct TerrainPatches<B: RenderBackend> {
    pub vertices: BufferArena<B, Vertex>,
    pub indices: BufferArena<B, u32>,
    pub models: BufferArena<B, TerrainModelRecord>,
    placements: Vec<(Rc<Mesh>, MeshPlacement)>,
    draws: Vec<DrawRecord>,
}

impl<B: RenderBackend> TerrainPatches<B> {
    pub fn new(backend: Rc<B>, capacities: &ArenaCapacities) -> Self {
        Self {
            vertices: BufferArena::new(
                backend.clone(),
                BufferCategory::TerrainVertex,
                capacities.terrain_vertices,
            ),
            indices: BufferArena::new(
                backend.clone(),
                BufferCategory::TerrainIndex,
                capacities.terrain_indices,
            ),
            models: BufferArena::new(
                backend,
                BufferCategory::TerrainModel,
                capacities.terrain_patches,
            ),
            placements: vec![],
            draws: vec![],
        }
    }

    /// Adds one patch instance. The mesh geometry is uploaded on its first use only.
    pub fn add_patch(&mut self, mesh: &Rc<Mesh>, transform: Transform) -> Result<u32> {
        let placement = self.place_mesh(mesh)?;
        let id = self.models.append(&[TerrainModelRecord::from(transform)])?;

        log::debug!(
            "Registered terrain patch {id} using {} at vertex offset {}",
            mesh.name,
            placement.vertex_offset
        );

        match self.draws.last_mut() {
            Some(draw)
                if Rc::ptr_eq(&draw.mesh, mesh) && draw.first_instance + draw.instance_count == id =>
            {
                draw.instance_count += 1;
            }
            _ => self.draws.push(DrawRecord {
                mesh: mesh.clone(),
                first_instance: id,
                instance_count: 1,
            }),
        }

        Ok(id)
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.draws
            .iter()
            .filter_map(|draw| self.placement(&draw.mesh).map(|placement| draw.draw_call(placement)))
            .collect()
    }

    pub fn placement(&self, mesh: &Rc<Mesh>) -> Option<MeshPlacement> {
        self.placements
            .iter()
            .find(|(placed, _)| Rc::ptr_eq(placed, mesh))
            .map(|(_, placement)| *placement)
    }

    fn place_mesh(&mut self, mesh: &Rc<Mesh>) -> Result<MeshPlacement> {
        if let Some(placement) = self.placement(mesh) {
            return Ok(placement);
        }

        log::debug!("Loading terrain patch mesh: {}", mesh.name);

        self.vertices.ensure_fits(mesh.vertices.len())?;
        if let Some(indices) = &mesh.indices {
            self.indices.ensure_fits(indices.len())?;
        }

        let vertex_offset = self.vertices.append(&mesh.vertices)?;
        let index_offset = match &mesh.indices {
            Some(indices) => Some(self.indices.append(indices)?),
            None => None,
        };

        let placement = MeshPlacement {
            vertex_offset,
            index_offset,
        };
        self.placements.push((mesh.clone(), placement));

        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::testing::RecordingBackend;

    fn patches() -> TerrainPatches<RecordingBackend> {
        TerrainPatches::new(
            Rc::new(RecordingBackend::default()),
            &ArenaCapacities {
                vertices: 1,
                indices: 1,
                models: 1,
                materials: 1,
                terrain_vertices: 64,
                terrain_indices: 64,
                terrain_patches: 16,
            },
        )
    }

    fn grid() -> Rc<Mesh> {
        Rc::new(Mesh::new(
            "grid",
            vec![Vertex::default(); 4],
            Some(vec![0, 1, 2, 2, 3, 0]),
        ))
    }

    #[test]
    fn patches_sharing_a_mesh_are_instanced() {
        let mut patches = patches();
        let mesh = grid();

        for x in 0..4 {
            patches
                .add_patch(&mesh, Transform::from_translation(x as f32 * 16.0, 0.0, 0.0))
                .unwrap();
        }

        assert_eq!(patches.vertices.cursor(), 4);
        assert_eq!(patches.indices.cursor(), 6);
        assert_eq!(patches.models.cursor(), 4);
        assert_eq!(patches.draws().len(), 1);
        assert_eq!(patches.draws()[0].instances(), 0..4);
    }

    #[test]
    fn a_second_patch_mesh_gets_its_own_offsets() {
        let mut patches = patches();
        let near = grid();
        let far = grid();

        patches.add_patch(&near, Transform::default()).unwrap();
        patches.add_patch(&far, Transform::default()).unwrap();

        assert_eq!(patches.placement(&far).map(|p| p.vertex_offset), Some(4));
        assert_eq!(patches.placement(&far).and_then(|p| p.index_offset), Some(6));
        assert_eq!(patches.draws().len(), 2);
        assert!(near.placement().is_none());
        assert_eq!(
            patches.draw_calls()[1],
            DrawCall::Indexed {
                indices: 6..12,
                base_vertex: 4,
                instances: 1..2,
            }
        );
    }

    #[test]
    fn oversized_patch_indices_leave_the_vertex_arena_untouched() {
        let mut patches = patches();
        let mesh = Rc::new(Mesh::new(
            "too_many_indices",
            vec![Vertex::default(); 4],
            Some(vec![0; 65]),
        ));

        assert!(patches.add_patch(&mesh, Transform::default()).is_err());

        assert_eq!(patches.vertices.cursor(), 0);
        assert_eq!(patches.models.cursor(), 0);
        assert!(patches.placement(&mesh).is_none());
    }
}
