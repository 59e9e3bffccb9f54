use std::rc::Rc;

use anyhow::Result;

use crate::args::ArenaCapacities;
use crate::error::Error;
use crate::render::backend::RenderBackend;
use crate::render::buffer::allocator::BufferArena;
use crate::render::buffer::BufferCategory;
use crate::render::entity::{Entity, EntityId, ModelRecord};
use crate::render::material::{Material, MaterialRecord};
use crate::render::mesh::{Mesh, MeshPlacement, Vertex};
use crate::render::registry::ResourceRegistry;
use crate::render::terrain::{TerrainModelRecord, TerrainPatches};

pub struct GpuArenas<B: RenderBackend> {
    pub vertices: BufferArena<B, Vertex>,
    pub indices: BufferArena<B, u32>,
    pub models: BufferArena<B, ModelRecord>,
}

impl<B: RenderBackend> GpuArenas<B> {
    pub fn new(backend: Rc<B>, capacities: &ArenaCapacities) -> Self {
        Self {
            vertices: BufferArena::new(backend.clone(), BufferCategory::Vertex, capacities.vertices),
            indices: BufferArena::new(backend.clone(), BufferCategory::Index, capacities.indices),
            models: BufferArena::new(backend, BufferCategory::Model, capacities.models),
        }
    }
}

/// One draw call: a placed mesh drawn for a contiguous run of entity ids.
#[derive(Clone)]
pub struct DrawRecord {
    pub mesh: Rc<Mesh>,
    pub first_instance: u32,
    pub instance_count: u32,
}

impl DrawRecord {
    pub fn instances(&self) -> std::ops::Range<u32> {
        self.first_instance..self.first_instance + self.instance_count
    }

    pub fn draw_call(&self, placement: MeshPlacement) -> DrawCall {
        match (placement.index_offset, self.mesh.index_count()) {
            (Some(index_offset), Some(index_count)) => DrawCall::Indexed {
                indices: index_offset..index_offset + index_count,
                base_vertex: placement.vertex_offset as i32,
                instances: self.instances(),
            },
            _ => DrawCall::NonIndexed {
                vertices: placement.vertex_offset..placement.vertex_offset + self.mesh.vertex_count(),
                instances: self.instances(),
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DrawCall {
    Indexed {
        indices: std::ops::Range<u32>,
        base_vertex: i32,
        instances: std::ops::Range<u32>,
    },
    NonIndexed {
        vertices: std::ops::Range<u32>,
        instances: std::ops::Range<u32>,
    },
}

impl DrawCall {
    pub fn record(self, render_pass: &mut wgpu::RenderPass) {
        match self {
            DrawCall::Indexed {
                indices,
                base_vertex,
                instances,
            } => render_pass.draw_indexed(indices, base_vertex, instances),
            DrawCall::NonIndexed {
                vertices,
                instances,
            } => render_pass.draw(vertices, instances),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Base,
    Instance { prototype: EntityId },
    Sky,
}

pub struct RegisteredEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub entity: Entity,
    pub mesh: Rc<Mesh>,
    pub material: Rc<Material>,
}

pub struct RenderSystemSceneStorage<B: RenderBackend> {
    pub arenas: GpuArenas<B>,
    pub registry: ResourceRegistry<B>,
    pub terrain: TerrainPatches<B>,
    pub entities: Vec<RegisteredEntity>,
    pub renderables: Vec<DrawRecord>,
    pub sky: Option<DrawRecord>,
}

impl<B: RenderBackend> RenderSystemSceneStorage<B> {
    pub fn new(backend: Rc<B>, capacities: &ArenaCapacities) -> Result<Self> {
        Ok(Self {
            arenas: GpuArenas::new(backend.clone(), capacities),
            registry: ResourceRegistry::new(backend.clone(), capacities.materials)?,
            terrain: TerrainPatches::new(backend, capacities),
            entities: vec![],
            renderables: vec![],
            sky: None,
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&RegisteredEntity> {
        self.entities.get(id.0 as usize)
    }

    pub fn geometry_draw_calls(&self) -> Vec<DrawCall> {
        self.renderables
            .iter()
            .filter_map(|draw| draw.mesh.placement().map(|placement| draw.draw_call(placement)))
            .collect()
    }

    pub fn sky_draw_call(&self) -> Option<DrawCall> {
        let sky = self.sky.as_ref()?;
        Some(sky.draw_call(sky.mesh.placement()?))
    }
}

/// Rejects capacities that are zero or larger than the device can bind.
pub fn check_capacities(capacities: &ArenaCapacities, limits: &wgpu::Limits) -> Result<()> {
    let arenas = [
        (BufferCategory::Vertex, capacities.vertices, std::mem::size_of::<Vertex>(), false),
        (BufferCategory::Index, capacities.indices, std::mem::size_of::<u32>(), false),
        (BufferCategory::Model, capacities.models, std::mem::size_of::<ModelRecord>(), true),
        (BufferCategory::Material, capacities.materials, std::mem::size_of::<MaterialRecord>(), true),
        (BufferCategory::TerrainVertex, capacities.terrain_vertices, std::mem::size_of::<Vertex>(), false),
        (BufferCategory::TerrainIndex, capacities.terrain_indices, std::mem::size_of::<u32>(), false),
        (
            BufferCategory::TerrainModel,
            capacities.terrain_patches,
            std::mem::size_of::<TerrainModelRecord>(),
            true,
        ),
    ];

    for (category, capacity, element_size, is_storage) in arenas {
        if capacity == 0 {
            return Err(Error::new(format!("The {category} arena capacity must not be zero")).into());
        }

        let size = capacity as u64 * element_size as u64;
        let limit = match is_storage {
            true => limits.max_buffer_size.min(limits.max_storage_buffer_binding_size as u64),
            false => limits.max_buffer_size,
        };

        if size > limit {
            return Err(Error::new(format!(
                "The {category} arena needs {size} bytes but the device allows at most {limit}"
            ))
            .into());
        }
    }

    Ok(())
}
