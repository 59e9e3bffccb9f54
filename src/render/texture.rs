use std::cell::Cell;

use anyhow::Result;

use crate::error::Error;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

pub const DEFAULT_MIP_LEVEL_COUNT: u32 = 8;

const CHANNEL_COUNT: usize = 4;

/// RGBA8 pixel data waiting to be registered with the GPU.
pub struct Texture {
    pub name: String,
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    texture_index: Cell<Option<u32>>,
}

impl Texture {
    pub fn new(
        name: impl Into<String>,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        mip_level_count: u32,
    ) -> Result<Self> {
        let name = name.into();

        if width == 0 || height == 0 {
            return Err(Error::new(format!(
                "The texture {name} has an empty size: {width}x{height}"
            ))
            .into());
        }

        let expected_length = width as usize * height as usize * CHANNEL_COUNT;
        if pixels.len() != expected_length {
            return Err(Error::new(format!(
                "The texture {name} holds {} bytes, expected {expected_length} for {width}x{height} RGBA",
                pixels.len()
            ))
            .into());
        }

        let full_chain_length = full_mip_chain_length(width, height);
        let mip_level_count = mip_level_count.clamp(1, full_chain_length);

        Ok(Self {
            name,
            pixels,
            width,
            height,
            mip_level_count,
            texture_index: Cell::new(None),
        })
    }

    pub fn from_rgba_image(name: impl Into<String>, image: image::RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Texture::new(name, image.into_raw(), width, height, DEFAULT_MIP_LEVEL_COUNT)
    }

    /// 1x1 texture filled with a single color.
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            pixels: rgba.to_vec(),
            width: 1,
            height: 1,
            mip_level_count: 1,
            texture_index: Cell::new(None),
        }
    }

    pub fn texture_index(&self) -> Option<u32> {
        self.texture_index.get()
    }

    pub(crate) fn set_texture_index(&self, index: u32) {
        self.texture_index.set(Some(index));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureAllocation {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MipLevel {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn full_mip_chain_length(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Builds `level_count` mip levels starting with the given pixels as level 0.
///
/// Each level halves the previous one (never below 1x1) and every texel is the
/// truncating per-channel average of its 2x2 source block. Source coordinates
/// past the right or bottom edge are clamped to the last row or column.
pub fn generate_mip_chain(pixels: &[u8], width: u32, height: u32, level_count: u32) -> Vec<MipLevel> {
    let mut levels = vec![MipLevel {
        level: 0,
        width,
        height,
        pixels: pixels.to_vec(),
    }];

    for level in 1..level_count.max(1) {
        let previous = &levels[levels.len() - 1];
        let next = downsample(previous, level);
        levels.push(next);
    }

    levels
}

fn downsample(source: &MipLevel, level: u32) -> MipLevel {
    let width = (source.width / 2).max(1);
    let height = (source.height / 2).max(1);
    let mut pixels = vec![0u8; width as usize * height as usize * CHANNEL_COUNT];

    let texel = |x: u32, y: u32, channel: usize| -> u32 {
        let x = x.min(source.width - 1) as usize;
        let y = y.min(source.height - 1) as usize;
        source.pixels[(y * source.width as usize + x) * CHANNEL_COUNT + channel] as u32
    };

    for y in 0..height {
        for x in 0..width {
            for channel in 0..CHANNEL_COUNT {
                let sum = texel(2 * x, 2 * y, channel)
                    + texel(2 * x + 1, 2 * y, channel)
                    + texel(2 * x, 2 * y + 1, channel)
                    + texel(2 * x + 1, 2 * y + 1, channel);

                pixels[(y as usize * width as usize + x as usize) * CHANNEL_COUNT + channel] =
                    (sum / 4) as u8;
            }
        }
    }

    MipLevel {
        level,
        width,
        height,
        pixels,
    }
}

pub struct Texture2DPackage {
    #[allow(dead_code)]
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
}

pub struct DepthTexture2DPackage {
    #[allow(dead_code)]
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
}

impl DepthTexture2DPackage {
    pub fn from_device(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("DEPTH_TEXTURE"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            gpu_texture,
            gpu_texture_view,
        }
    }
}
