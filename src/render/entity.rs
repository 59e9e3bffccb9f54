use std::rc::Rc;

use crate::data::transform::Transform;
use crate::render::material::Material;
use crate::render::mesh::Mesh;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Component set of a scene entity. Every component is optional except the transform.
#[derive(Clone, Default)]
pub struct Entity {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<Rc<Mesh>>,
    pub material: Option<Rc<Material>>,
    pub instance_of: Option<EntityId>,
}

impl Entity {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Rc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: Rc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn instance_of(mut self, prototype: EntityId) -> Self {
        self.instance_of = Some(prototype);
        self
    }

    pub fn log_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<UNNAMED>")
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelRecord {
    pub transform: [[f32; 4]; 4],
    pub material_index: u32,
    pub is_skybox: u32,
    _padding: [u32; 2],
}

impl ModelRecord {
    pub fn new(transform: Transform, material_index: u32, is_skybox: bool) -> Self {
        Self {
            transform: cgmath::Matrix4::from(transform).into(),
            material_index,
            is_skybox: is_skybox as u32,
            _padding: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_record_matches_the_shader_layout() {
        assert_eq!(std::mem::size_of::<ModelRecord>(), 80);
        assert_eq!(std::mem::offset_of!(ModelRecord, material_index), 64);
    }

    #[test]
    fn default_transform_produces_an_identity_record() {
        let record = ModelRecord::new(Transform::default(), 3, true);

        assert_eq!(
            record.transform,
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]
        );
        assert_eq!(record.material_index, 3);
        assert_eq!(record.is_skybox, 1);
    }
}
