use crate::render::buffer::GpuBufferDescriptor;
use crate::render::texture::{MipLevel, Texture2DPackage, TextureAllocation};

/// Device capability handle used by every component that creates or fills GPU resources.
pub trait RenderBackend {
    type Buffer;
    type Texture;

    fn create_buffer(&self, descriptor: &GpuBufferDescriptor) -> Self::Buffer;

    fn write_buffer(&self, buffer: &Self::Buffer, byte_offset: u64, data: &[u8]);

    fn create_texture(&self, allocation: &TextureAllocation) -> Self::Texture;

    fn write_texture_level(&self, texture: &Self::Texture, level: &MipLevel);
}

pub struct WgpuBackend {
    pub device: std::rc::Rc<wgpu::Device>,
    pub queue: std::rc::Rc<wgpu::Queue>,
}

impl WgpuBackend {
    pub fn new(device: std::rc::Rc<wgpu::Device>, queue: std::rc::Rc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }
}

impl RenderBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = Texture2DPackage;

    fn create_buffer(&self, descriptor: &GpuBufferDescriptor) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&descriptor.label),
            size: descriptor.size,
            usage: descriptor.usage,
            mapped_at_creation: false,
        })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, byte_offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, byte_offset, data);
    }

    fn create_texture(&self, allocation: &TextureAllocation) -> Texture2DPackage {
        let gpu_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&allocation.label),
            size: wgpu::Extent3d {
                width: allocation.width,
                height: allocation.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: allocation.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Texture2DPackage {
            gpu_texture,
            gpu_texture_view,
        }
    }

    fn write_texture_level(&self, texture: &Texture2DPackage, level: &MipLevel) {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture.gpu_texture,
                mip_level: level.level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &level.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * level.width),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
}
