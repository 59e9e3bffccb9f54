use crate::render::backend::RenderBackend;

pub mod allocator;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferCategory {
    Vertex,
    Index,
    Model,
    Material,
    TerrainVertex,
    TerrainIndex,
    TerrainModel,
    Uniform,
}

impl BufferCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BufferCategory::Vertex => "VERTEX",
            BufferCategory::Index => "INDEX",
            BufferCategory::Model => "MODEL",
            BufferCategory::Material => "MATERIAL",
            BufferCategory::TerrainVertex => "TERRAIN_VERTEX",
            BufferCategory::TerrainIndex => "TERRAIN_INDEX",
            BufferCategory::TerrainModel => "TERRAIN_MODEL",
            BufferCategory::Uniform => "UNIFORM",
        }
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        let usage = match self {
            BufferCategory::Vertex | BufferCategory::TerrainVertex => wgpu::BufferUsages::VERTEX,
            BufferCategory::Index | BufferCategory::TerrainIndex => wgpu::BufferUsages::INDEX,
            BufferCategory::Model | BufferCategory::Material | BufferCategory::TerrainModel => {
                wgpu::BufferUsages::STORAGE
            }
            BufferCategory::Uniform => wgpu::BufferUsages::UNIFORM,
        };

        usage | wgpu::BufferUsages::COPY_DST
    }
}

impl std::fmt::Display for BufferCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label().to_lowercase().replace('_', " "))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BufferBindingInfo {
    pub min_binding_size: Option<wgpu::BufferSize>,
    pub has_dynamic_offset: bool,
}

#[derive(Clone, Debug)]
pub struct GpuBufferDescriptor {
    pub label: String,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub binding: BufferBindingInfo,
}

impl GpuBufferDescriptor {
    /// Describes a buffer holding `capacity` elements of `element_size` bytes.
    pub fn for_category(category: BufferCategory, capacity: u64, element_size: u64) -> Self {
        Self {
            label: format!("{}_BUFFER", category.label()),
            size: capacity * element_size,
            usage: category.usage(),
            binding: BufferBindingInfo {
                min_binding_size: wgpu::BufferSize::new(element_size),
                has_dynamic_offset: false,
            },
        }
    }
}

pub struct GpuBuffer<B: RenderBackend> {
    pub gpu_buffer: B::Buffer,
    pub label: String,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub binding: BufferBindingInfo,
}

impl<B: RenderBackend> GpuBuffer<B> {
    pub fn from_backend(backend: &B, descriptor: GpuBufferDescriptor) -> Self {
        log::debug!(
            "Creating GPU buffer {} ({} bytes)",
            descriptor.label,
            descriptor.size
        );

        Self {
            gpu_buffer: backend.create_buffer(&descriptor),
            label: descriptor.label,
            size: descriptor.size,
            usage: descriptor.usage,
            binding: descriptor.binding,
        }
    }

    pub fn binding_type(&self) -> wgpu::BindingType {
        let ty = match self.usage.contains(wgpu::BufferUsages::UNIFORM) {
            true => wgpu::BufferBindingType::Uniform,
            false => wgpu::BufferBindingType::Storage { read_only: true },
        };

        wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: self.binding.has_dynamic_offset,
            min_binding_size: self.binding.min_binding_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::testing::RecordingBackend;

    #[test]
    fn storage_categories_bind_as_read_only_storage() {
        let backend = RecordingBackend::default();
        let buffer = GpuBuffer::from_backend(
            &backend,
            GpuBufferDescriptor::for_category(BufferCategory::Model, 4, 80),
        );

        assert_eq!(buffer.size, 320);
        assert_eq!(buffer.label, "MODEL_BUFFER");
        assert_eq!(
            buffer.binding_type(),
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(80),
            }
        );
    }

    #[test]
    fn uniform_category_binds_as_uniform() {
        let backend = RecordingBackend::default();
        let buffer = GpuBuffer::from_backend(
            &backend,
            GpuBufferDescriptor::for_category(BufferCategory::Uniform, 1, 144),
        );

        assert!(buffer.usage.contains(wgpu::BufferUsages::COPY_DST));
        assert!(matches!(
            buffer.binding_type(),
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
    }
}
