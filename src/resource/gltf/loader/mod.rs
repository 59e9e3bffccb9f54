use anyhow::Result;

use crate::resource::gltf::asset::GltfAsset;

pub mod file;

pub trait GltfLoader {
    fn asset(&self) -> &impl GltfAsset;
    fn load_buffer(&mut self, buffer_id: usize) -> Result<()>;
    fn buffer_data(&self, buffer_id: usize) -> Option<&[u8]>;
    fn load_image(&mut self, image_id: usize) -> Result<image::RgbaImage>;
}
