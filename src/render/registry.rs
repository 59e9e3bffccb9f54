use std::rc::Rc;

use anyhow::Result;

use crate::render::backend::RenderBackend;
use crate::render::buffer::allocator::BufferArena;
use crate::render::buffer::BufferCategory;
use crate::render::material::{Material, MaterialRecord, DEFAULT_TEXTURE_INDEX};
use crate::render::texture::{generate_mip_chain, Texture, TextureAllocation};

/// Uploads textures and materials once and hands out their stable indices.
pub struct ResourceRegistry<B: RenderBackend> {
    backend: Rc<B>,
    textures: Vec<B::Texture>,
    materials: BufferArena<B, MaterialRecord>,
    default_material: Rc<Material>,
    generation: u64,
}

impl<B: RenderBackend> ResourceRegistry<B> {
    /// Creates the registry with the white default texture and the magenta
    /// default material occupying index 0 of their lists.
    pub fn new(backend: Rc<B>, material_capacity: u32) -> Result<Self> {
        let materials = BufferArena::new(backend.clone(), BufferCategory::Material, material_capacity);

        let mut registry = Self {
            backend,
            textures: vec![],
            materials,
            default_material: Rc::new(Material::missing()),
            generation: 0,
        };

        let default_texture = Texture::solid("DEFAULT", [255, 255, 255, 255]);
        registry.register_texture(&default_texture)?;

        let default_material = registry.default_material.clone();
        registry.register_material(&default_material)?;

        Ok(registry)
    }

    pub fn register_texture(&mut self, texture: &Texture) -> Result<u32> {
        if let Some(texture_index) = texture.texture_index() {
            log::debug!("Skipping duplicate load of texture: {}", texture.name);
            return Ok(texture_index);
        }

        log::debug!(
            "Loading texture: {} ({}x{}, {} mip levels)",
            texture.name,
            texture.width,
            texture.height,
            texture.mip_level_count
        );

        let gpu_texture = self.backend.create_texture(&TextureAllocation {
            label: format!("TEXTURE_{}", texture.name),
            width: texture.width,
            height: texture.height,
            mip_level_count: texture.mip_level_count,
        });

        for level in generate_mip_chain(
            &texture.pixels,
            texture.width,
            texture.height,
            texture.mip_level_count,
        ) {
            self.backend.write_texture_level(&gpu_texture, &level);
        }

        self.textures.push(gpu_texture);
        self.generation += 1;

        let texture_index = (self.textures.len() - 1) as u32;
        texture.set_texture_index(texture_index);

        Ok(texture_index)
    }

    pub fn register_material(&mut self, material: &Material) -> Result<u32> {
        if let Some(material_index) = material.material_index() {
            log::debug!("Skipping duplicate load of material: {}", material.name);
            return Ok(material_index);
        }

        log::debug!("Loading material: {}", material.name);

        let diffuse_texture_index = match &material.diffuse_texture {
            Some(texture) => self.register_texture(texture)?,
            None => DEFAULT_TEXTURE_INDEX,
        };

        let normal_texture_index = match &material.normal_texture {
            Some(texture) => self.register_texture(texture)?,
            None => DEFAULT_TEXTURE_INDEX,
        };

        let material_index = self.materials.append(&[MaterialRecord::new(
            material.base_color,
            material.roughness,
            diffuse_texture_index,
            normal_texture_index,
        )])?;
        material.set_material_index(material_index);

        Ok(material_index)
    }

    pub fn default_material(&self) -> &Rc<Material> {
        &self.default_material
    }

    pub fn textures(&self) -> &[B::Texture] {
        &self.textures
    }

    pub fn texture_count(&self) -> u32 {
        self.textures.len() as u32
    }

    pub fn material_arena(&self) -> &BufferArena<B, MaterialRecord> {
        &self.materials
    }

    /// Grows whenever a texture is added, so bind groups know to rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
