use std::cell::Cell;
use std::rc::Rc;

use crate::render::texture::Texture;

pub const DEFAULT_MATERIAL_INDEX: u32 = 0;
pub const DEFAULT_TEXTURE_INDEX: u32 = 0;

pub struct Material {
    pub name: String,
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub diffuse_texture: Option<Rc<Texture>>,
    pub normal_texture: Option<Rc<Texture>>,
    material_index: Cell<Option<u32>>,
}

impl Material {
    pub fn new(name: impl Into<String>, base_color: [f32; 3], roughness: f32) -> Self {
        Self {
            name: name.into(),
            base_color,
            roughness,
            diffuse_texture: None,
            normal_texture: None,
            material_index: Cell::new(None),
        }
    }

    pub fn with_diffuse_texture(mut self, texture: Rc<Texture>) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    pub fn with_normal_texture(mut self, texture: Rc<Texture>) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    /// Magenta fallback occupying material slot 0.
    pub fn missing() -> Self {
        Material::new("DEFAULT", [1.0, 0.0, 1.0], 1.0)
    }

    pub fn material_index(&self) -> Option<u32> {
        self.material_index.get()
    }

    pub(crate) fn set_material_index(&self, index: u32) {
        self.material_index.set(Some(index));
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialRecord {
    pub base_color: [f32; 3],
    pub diffuse_texture_index: u32,
    pub normal_texture_index: u32,
    pub roughness: f32,
    _padding: [f32; 2],
}

impl MaterialRecord {
    pub fn new(
        base_color: [f32; 3],
        roughness: f32,
        diffuse_texture_index: u32,
        normal_texture_index: u32,
    ) -> Self {
        Self {
            base_color,
            diffuse_texture_index,
            normal_texture_index,
            roughness,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_record_matches_the_shader_layout() {
        assert_eq!(std::mem::size_of::<MaterialRecord>(), 32);
        assert_eq!(std::mem::offset_of!(MaterialRecord, diffuse_texture_index), 12);
        assert_eq!(std::mem::offset_of!(MaterialRecord, roughness), 20);
    }

    #[test]
    fn new_materials_start_unregistered() {
        let material = Material::missing();

        assert_eq!(material.material_index(), None);
        assert_eq!(material.base_color, [1.0, 0.0, 1.0]);
    }
}
