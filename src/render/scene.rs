use std::rc::Rc;

use anyhow::Result;

use crate::error::Error;
use crate::render::backend::RenderBackend;
use crate::render::entity::{Entity, EntityId, ModelRecord};
use crate::render::mesh::{Mesh, MeshPlacement};
use crate::render::storage::{DrawRecord, EntityKind, RegisteredEntity, RenderSystemSceneStorage};

impl<B: RenderBackend> RenderSystemSceneStorage<B> {
    /// Registers an entity and returns its id, which is also its model record slot.
    ///
    /// Entities with `instance_of` set go through [`Self::add_instance`]; an
    /// instance whose prototype is unknown is reported as an error here.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        if let Some(prototype) = entity.instance_of {
            return match self.add_instance(entity)? {
                Some(id) => Ok(id),
                None => Err(Error::new(format!(
                    "Unable to register an instance of unknown prototype {prototype}"
                ))
                .into()),
            };
        }

        let (id, mesh) = self.register_base(entity, EntityKind::Base)?;
        self.push_draw(mesh, id);

        Ok(id)
    }

    /// Registers an entity that reuses the geometry of its prototype.
    ///
    /// Returns `Ok(None)` without registering anything when the entity is not an
    /// instance or its prototype does not exist.
    pub fn add_instance(&mut self, entity: Entity) -> Result<Option<EntityId>> {
        let prototype_id = match entity.instance_of {
            Some(prototype_id) => prototype_id,
            None => {
                log::error!(
                    "The entity {} is not an instance of another entity",
                    entity.log_name()
                );
                return Ok(None);
            }
        };

        let (mesh, prototype_material) = match self.entity(prototype_id) {
            Some(prototype) => (prototype.mesh.clone(), prototype.material.clone()),
            None => {
                log::error!(
                    "The entity {} references unknown prototype {prototype_id}",
                    entity.log_name()
                );
                return Ok(None);
            }
        };

        let material = match &entity.material {
            Some(material) => material.clone(),
            None => prototype_material,
        };
        let material_index = self.registry.register_material(&material)?;

        let id = EntityId(self.arenas.models.append(&[ModelRecord::new(
            entity.transform,
            material_index,
            false,
        )])?);

        log::debug!(
            "Registered instance {} {id} of prototype {prototype_id}",
            entity.log_name()
        );

        self.push_draw(mesh.clone(), id);
        self.push_entity(RegisteredEntity {
            id,
            kind: EntityKind::Instance {
                prototype: prototype_id,
            },
            entity,
            mesh,
            material,
        });

        Ok(Some(id))
    }

    /// Registers the sky entity. A later call replaces the sky drawn by the
    /// skybox pass; the earlier entity keeps its slots.
    pub fn set_sky(&mut self, entity: Entity) -> Result<EntityId> {
        let (id, mesh) = self.register_base(entity, EntityKind::Sky)?;

        if let Some(previous) = &self.sky {
            log::debug!(
                "Replacing sky entity #{} with {id}",
                previous.first_instance
            );
        }

        self.sky = Some(DrawRecord {
            mesh,
            first_instance: id.0,
            instance_count: 1,
        });

        Ok(id)
    }

    fn register_base(&mut self, entity: Entity, kind: EntityKind) -> Result<(EntityId, Rc<Mesh>)> {
        let mesh = match &entity.mesh {
            Some(mesh) => mesh.clone(),
            None => {
                return Err(Error::new(format!(
                    "The entity {} has no mesh to register",
                    entity.log_name()
                ))
                .into())
            }
        };

        self.place_mesh(&mesh)?;

        let material = match &entity.material {
            Some(material) => material.clone(),
            None => self.registry.default_material().clone(),
        };
        let material_index = self.registry.register_material(&material)?;

        let id = EntityId(self.arenas.models.append(&[ModelRecord::new(
            entity.transform,
            material_index,
            kind == EntityKind::Sky,
        )])?);

        log::debug!("Registered entity {} {id} ({kind:?})", entity.log_name());

        self.push_entity(RegisteredEntity {
            id,
            kind,
            entity,
            mesh: mesh.clone(),
            material,
        });

        Ok((id, mesh))
    }

    fn place_mesh(&mut self, mesh: &Mesh) -> Result<MeshPlacement> {
        if let Some(placement) = mesh.placement() {
            log::debug!("Skipping duplicate load of mesh: {}", mesh.name);
            return Ok(placement);
        }

        log::debug!(
            "Loading mesh: {} ({} vertices)",
            mesh.name,
            mesh.vertex_count()
        );

        self.arenas.vertices.ensure_fits(mesh.vertices.len())?;
        if let Some(indices) = &mesh.indices {
            self.arenas.indices.ensure_fits(indices.len())?;
        }

        let vertex_offset = self.arenas.vertices.append(&mesh.vertices)?;
        let index_offset = match &mesh.indices {
            Some(indices) => Some(self.arenas.indices.append(indices)?),
            None => None,
        };

        let placement = MeshPlacement {
            vertex_offset,
            index_offset,
        };
        mesh.set_placement(placement);

        Ok(placement)
    }

    fn push_draw(&mut self, mesh: Rc<Mesh>, id: EntityId) {
        match self.renderables.last_mut() {
            Some(draw)
                if Rc::ptr_eq(&draw.mesh, &mesh)
                    && draw.first_instance + draw.instance_count == id.0 =>
            {
                draw.instance_count += 1;
            }
            _ => self.renderables.push(DrawRecord {
                mesh,
                first_instance: id.0,
                instance_count: 1,
            }),
        }
    }

    fn push_entity(&mut self, registered: RegisteredEntity) {
        debug_assert_eq!(registered.id.0 as usize, self.entities.len());
        self.entities.push(registered);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::args::ArenaCapacities;
    use crate::data::transform::Transform;
    use crate::render::backend::testing::RecordingBackend;
    use crate::render::material::{Material, DEFAULT_MATERIAL_INDEX};
    use crate::render::mesh::Vertex;
    use crate::render::storage::DrawCall;

    fn capacities() -> ArenaCapacities {
        ArenaCapacities {
            vertices: 512,
            indices: 512,
            models: 64,
            materials: 8,
            terrain_vertices: 64,
            terrain_indices: 64,
            terrain_patches: 8,
        }
    }

    fn storage() -> RenderSystemSceneStorage<RecordingBackend> {
        RenderSystemSceneStorage::new(Rc::new(RecordingBackend::default()), &capacities()).unwrap()
    }

    fn triangle() -> Rc<Mesh> {
        Rc::new(Mesh::new(
            "triangle",
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            None,
        ))
    }

    fn cube() -> Rc<Mesh> {
        Rc::new(Mesh::new("cube", vec![Vertex::default(); 36], None))
    }

    fn model_records(storage: &RenderSystemSceneStorage<RecordingBackend>) -> Vec<ModelRecord> {
        let count = storage.arenas.models.cursor() as usize;
        storage.arenas.models.buffer().gpu_buffer.records::<ModelRecord>()[..count].to_vec()
    }

    #[test]
    fn triangle_entity_gets_id_zero_and_three_vertices() {
        let mut storage = storage();

        let id = storage
            .add_entity(Entity::new().with_mesh(triangle()))
            .unwrap();

        assert_eq!(id, EntityId(0));
        assert_eq!(storage.arenas.vertices.cursor(), 3);

        let records = model_records(&storage);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], ModelRecord::new(Transform::default(), DEFAULT_MATERIAL_INDEX, false));
        assert_eq!(
            storage.geometry_draw_calls(),
            vec![DrawCall::NonIndexed {
                vertices: 0..3,
                instances: 0..1,
            }]
        );
    }

    #[test]
    fn cube_prototype_with_ten_instances_uploads_geometry_once() {
        let mut storage = storage();
        let cube = cube();

        let prototype = storage
            .add_entity(Entity::new().with_name("cube").with_mesh(cube.clone()))
            .unwrap();
        let placement = cube.placement();
        let vertex_cursor = storage.arenas.vertices.cursor();

        for i in 0..10 {
            let instance = Entity::new()
                .with_transform(Transform::from_translation(i as f32 * 2.0, 0.0, 0.0))
                .instance_of(prototype);
            storage.add_entity(instance).unwrap();
            assert_eq!(storage.arenas.vertices.cursor(), vertex_cursor);
        }

        assert_eq!(storage.arenas.vertices.cursor(), 36);
        assert_eq!(cube.placement(), placement);
        assert_eq!(model_records(&storage).len(), 11);
        assert_eq!(storage.renderables.len(), 1);
        assert_eq!(storage.renderables[0].instances(), 0..11);
        assert_eq!(
            storage.geometry_draw_calls(),
            vec![DrawCall::NonIndexed {
                vertices: 0..36,
                instances: 0..11,
            }]
        );
    }

    #[test]
    fn instances_inherit_the_prototype_material_unless_overridden() {
        let mut storage = storage();
        let red = Rc::new(Material::new("red", [1.0, 0.0, 0.0], 0.5));
        let blue = Rc::new(Material::new("blue", [0.0, 0.0, 1.0], 0.5));

        let prototype = storage
            .add_entity(Entity::new().with_mesh(cube()).with_material(red.clone()))
            .unwrap();
        storage.add_entity(Entity::new().instance_of(prototype)).unwrap();
        storage
            .add_entity(Entity::new().instance_of(prototype).with_material(blue.clone()))
            .unwrap();

        let records = model_records(&storage);
        assert_eq!(records[1].material_index, red.material_index().unwrap());
        assert_eq!(records[2].material_index, blue.material_index().unwrap());
    }

    #[test]
    fn instance_path_rejects_entities_without_a_prototype() {
        let mut storage = storage();

        let result = storage
            .add_instance(Entity::new().with_mesh(triangle()))
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(storage.arenas.models.cursor(), 0);
        assert!(storage.entities.is_empty());
    }

    #[test]
    fn unknown_prototype_is_rejected() {
        let mut storage = storage();

        assert_eq!(
            storage
                .add_instance(Entity::new().instance_of(EntityId(7)))
                .unwrap(),
            None
        );
        assert!(storage
            .add_entity(Entity::new().instance_of(EntityId(7)))
            .is_err());
    }

    #[test]
    fn base_entity_without_mesh_is_an_error() {
        let mut storage = storage();

        assert!(storage.add_entity(Entity::new()).is_err());
        assert_eq!(storage.arenas.models.cursor(), 0);
    }

    #[test]
    fn sky_sets_the_skybox_flag_and_replaces_the_previous_sky() {
        let mut storage = storage();

        let first = storage.set_sky(Entity::new().with_mesh(cube())).unwrap();
        let second = storage.set_sky(Entity::new().with_mesh(cube())).unwrap();

        let records = model_records(&storage);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.is_skybox == 1));
        assert_eq!(storage.sky.as_ref().map(|sky| sky.first_instance), Some(second.0));
        assert_ne!(first, second);
        assert!(storage.renderables.is_empty());
        assert!(storage.geometry_draw_calls().is_empty());
        assert_eq!(storage.entity(first).map(|e| e.kind), Some(EntityKind::Sky));
        assert_eq!(
            storage.sky_draw_call(),
            Some(DrawCall::NonIndexed {
                vertices: 36..72,
                instances: 1..2,
            })
        );
    }

    #[test]
    fn indexed_meshes_record_both_offsets() {
        let mut storage = storage();
        storage.add_entity(Entity::new().with_mesh(triangle())).unwrap();
        let quad = Rc::new(Mesh::new(
            "quad",
            vec![Vertex::default(); 4],
            Some(vec![0, 1, 2, 2, 3, 0]),
        ));

        storage.add_entity(Entity::new().with_mesh(quad.clone())).unwrap();

        assert_eq!(
            quad.placement(),
            Some(MeshPlacement {
                vertex_offset: 3,
                index_offset: Some(0),
            })
        );
        assert_eq!(storage.arenas.indices.cursor(), 6);
        assert_eq!(
            storage.geometry_draw_calls()[1],
            DrawCall::Indexed {
                indices: 0..6,
                base_vertex: 3,
                instances: 1..2,
            }
        );
    }

    #[test]
    fn base_entities_sharing_a_mesh_upload_it_once() {
        let mut storage = storage();
        let mesh = triangle();

        storage.add_entity(Entity::new().with_mesh(mesh.clone())).unwrap();
        storage.add_entity(Entity::new().with_mesh(mesh.clone())).unwrap();

        assert_eq!(storage.arenas.vertices.cursor(), 3);
        assert_eq!(storage.renderables.len(), 1);
        assert_eq!(storage.renderables[0].instance_count, 2);
    }

    #[test]
    fn model_arena_overflow_propagates() {
        let capacities = ArenaCapacities {
            models: 1,
            ..capacities()
        };
        let mut storage =
            RenderSystemSceneStorage::new(Rc::new(RecordingBackend::default()), &capacities)
                .unwrap();

        storage.add_entity(Entity::new().with_mesh(triangle())).unwrap();

        assert!(storage.add_entity(Entity::new().with_mesh(triangle())).is_err());
    }

    #[test]
    fn index_overflow_writes_no_vertices_and_leaves_the_mesh_unplaced() {
        let capacities = ArenaCapacities {
            indices: 4,
            ..capacities()
        };
        let mut storage =
            RenderSystemSceneStorage::new(Rc::new(RecordingBackend::default()), &capacities)
                .unwrap();
        let quad = Rc::new(Mesh::new(
            "quad",
            vec![Vertex::default(); 4],
            Some(vec![0, 1, 2, 2, 1, 3]),
        ));

        assert!(storage.add_entity(Entity::new().with_mesh(quad.clone())).is_err());

        assert_eq!(storage.arenas.vertices.cursor(), 0);
        assert_eq!(storage.arenas.indices.cursor(), 0);
        assert_eq!(storage.arenas.models.cursor(), 0);
        assert_eq!(quad.placement(), None);
    }
}
