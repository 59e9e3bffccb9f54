use std::num::NonZeroU32;

use anyhow::Result;

use crate::error::Error;
use crate::render::backend::WgpuBackend;
use crate::render::storage::RenderSystemSceneStorage;
use crate::render::texture::DEFAULT_MIP_LEVEL_COUNT;
use crate::render::view::ViewEnvironment;

pub const UNIFORM_BINDING: u32 = 0;
pub const TEXTURES_BINDING: u32 = 1;
pub const SAMPLER_BINDING: u32 = 2;
pub const MODELS_BINDING: u32 = 3;
pub const MATERIALS_BINDING: u32 = 4;

pub const TERRAIN_MODELS_BINDING: u32 = 1;

pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::TEXTURE_BINDING_ARRAY
    .union(wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING);

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layout of the bind group shared by the skybox and geometry passes.
pub fn scene_layout_entries(texture_count: u32) -> Result<Vec<wgpu::BindGroupLayoutEntry>> {
    let count = match NonZeroU32::new(texture_count) {
        Some(count) => count,
        None => {
            return Err(Error::new(String::from(
                "The scene texture array must hold at least the default texture",
            ))
            .into())
        }
    };

    Ok(vec![
        uniform_entry(UNIFORM_BINDING),
        wgpu::BindGroupLayoutEntry {
            binding: TEXTURES_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: Some(count),
        },
        wgpu::BindGroupLayoutEntry {
            binding: SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
        storage_entry(MODELS_BINDING, wgpu::ShaderStages::VERTEX_FRAGMENT),
        storage_entry(MATERIALS_BINDING, wgpu::ShaderStages::FRAGMENT),
    ])
}

pub fn terrain_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    vec![
        uniform_entry(UNIFORM_BINDING),
        storage_entry(TERRAIN_MODELS_BINDING, wgpu::ShaderStages::VERTEX),
    ]
}

pub fn check_texture_count(texture_count: u32, limits: &wgpu::Limits) -> Result<()> {
    if texture_count > limits.max_sampled_textures_per_shader_stage {
        return Err(Error::new(format!(
            "{texture_count} textures are registered but the device samples at most {} per shader stage",
            limits.max_sampled_textures_per_shader_stage
        ))
        .into());
    }

    Ok(())
}

pub fn create_texture_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("SCENE_TEXTURE_SAMPLER"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        lod_min_clamp: 0.0,
        lod_max_clamp: DEFAULT_MIP_LEVEL_COUNT as f32,
        ..Default::default()
    })
}

/// Scene bind group built for one state of the texture list.
pub struct SceneBindings {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub texture_count: u32,
    generation: u64,
}

impl SceneBindings {
    pub fn from_storage(
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        view_environment: &ViewEnvironment<WgpuBackend>,
        storage: &RenderSystemSceneStorage<WgpuBackend>,
    ) -> Result<Self> {
        let texture_count = storage.registry.texture_count();
        check_texture_count(texture_count, &device.limits())?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SCENE_BIND_GROUP_LAYOUT"),
            entries: &scene_layout_entries(texture_count)?,
        });

        let texture_views = storage
            .registry
            .textures()
            .iter()
            .map(|texture| &texture.gpu_texture_view)
            .collect::<Vec<_>>();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SCENE_BIND_GROUP"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: view_environment
                        .uniform_buffer()
                        .gpu_buffer
                        .as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: TEXTURES_BINDING,
                    resource: wgpu::BindingResource::TextureViewArray(&texture_views),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: MODELS_BINDING,
                    resource: storage.arenas.models.buffer().gpu_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: MATERIALS_BINDING,
                    resource: storage
                        .registry
                        .material_arena()
                        .buffer()
                        .gpu_buffer
                        .as_entire_binding(),
                },
            ],
        });

        log::debug!("Created scene bind group with {texture_count} textures");

        Ok(Self {
            layout,
            bind_group,
            texture_count,
            generation: storage.registry.generation(),
        })
    }

    pub fn is_stale(&self, registry_generation: u64) -> bool {
        self.generation != registry_generation
    }
}

pub struct TerrainBindings {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl TerrainBindings {
    pub fn from_storage(
        device: &wgpu::Device,
        view_environment: &ViewEnvironment<WgpuBackend>,
        storage: &RenderSystemSceneStorage<WgpuBackend>,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TERRAIN_BIND_GROUP_LAYOUT"),
            entries: &terrain_layout_entries(),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TERRAIN_BIND_GROUP"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: view_environment
                        .uniform_buffer()
                        .gpu_buffer
                        .as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: TERRAIN_MODELS_BINDING,
                    resource: storage.terrain.models.buffer().gpu_buffer.as_entire_binding(),
                },
            ],
        });

        Self { layout, bind_group }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_array_length_follows_the_registry() {
        let entries = scene_layout_entries(3).unwrap();

        let textures = entries
            .iter()
            .find(|entry| entry.binding == TEXTURES_BINDING)
            .unwrap();
        assert_eq!(textures.count, NonZeroU32::new(3));
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn empty_texture_array_is_rejected() {
        assert!(scene_layout_entries(0).is_err());
    }

    #[test]
    fn record_arrays_bind_as_read_only_storage() {
        let entries = scene_layout_entries(1).unwrap();

        for binding in [MODELS_BINDING, MATERIALS_BINDING] {
            let entry = entries.iter().find(|entry| entry.binding == binding).unwrap();
            assert!(matches!(
                entry.ty,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    ..
                }
            ));
        }
    }

    #[test]
    fn texture_count_is_checked_against_the_stage_limit() {
        let limits = wgpu::Limits {
            max_sampled_textures_per_shader_stage: 16,
            ..Default::default()
        };

        check_texture_count(16, &limits).unwrap();
        assert!(check_texture_count(17, &limits).is_err());
    }
}
