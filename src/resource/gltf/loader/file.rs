use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::error::Error;
use crate::resource::gltf::asset::file::FileSystemGltfAsset;
use crate::resource::gltf::asset::GltfAsset;
use crate::resource::gltf::loader::GltfLoader;

pub struct FileSystemGltfLoader<'a> {
    asset: &'a FileSystemGltfAsset,
    buffer_registry: HashMap<usize, Vec<u8>>,
}

impl<'a> FileSystemGltfLoader<'a> {
    pub fn new(asset: &'a FileSystemGltfAsset) -> Self {
        Self {
            asset,
            buffer_registry: HashMap::new(),
        }
    }

    fn get_buffer(&self, buffer_id: usize) -> Result<gltf::Buffer<'a>> {
        match self.asset.gltf().buffers().nth(buffer_id) {
            Some(buffer) => Ok(buffer),
            None => Err(Error::new(format!("The given buffer ID is invalid: {buffer_id}")).into()),
        }
    }

    fn read_buffer_file(&self, buffer: &gltf::Buffer) -> Result<Vec<u8>> {
        match buffer.source() {
            gltf::buffer::Source::Uri(uri) => {
                let buffer_path = self.asset.root.join(uri);
                std::fs::read(&buffer_path)
                    .with_context(|| format!("Unable to read glTF buffer {}", buffer_path.display()))
            }
            gltf::buffer::Source::Bin => match &self.asset.gltf().blob {
                Some(blob) => Ok(blob.clone()),
                None => Err(Error::new(String::from(
                    "The asset references a binary chunk but has none.",
                ))
                .into()),
            },
        }
    }

    fn read_view_data(&self, view: &gltf::buffer::View) -> Result<&[u8]> {
        let buffer_id = view.buffer().index();

        let data = match self.buffer_registry.get(&buffer_id) {
            Some(data) => data,
            None => {
                return Err(Error::new(format!(
                    "The given buffer ID is not associated with a loaded buffer: {buffer_id}"
                ))
                .into())
            }
        };

        match data.get(view.offset()..view.offset() + view.length()) {
            Some(data) => Ok(data),
            None => Err(Error::new(format!(
                "The buffer view {} reaches past the end of buffer {buffer_id}",
                view.index()
            ))
            .into()),
        }
    }
}

impl<'a> GltfLoader for FileSystemGltfLoader<'a> {
    fn asset(&self) -> &impl GltfAsset {
        self.asset
    }

    fn load_buffer(&mut self, buffer_id: usize) -> Result<()> {
        if self.buffer_registry.contains_key(&buffer_id) {
            return Ok(());
        }

        let buffer = self.get_buffer(buffer_id)?;
        let data = self.read_buffer_file(&buffer)?;

        if data.len() < buffer.length() {
            return Err(Error::new(format!(
                "The buffer {buffer_id} holds {} bytes but declares {}",
                data.len(),
                buffer.length()
            ))
            .into());
        }

        self.buffer_registry.insert(buffer_id, data);

        Ok(())
    }

    fn buffer_data(&self, buffer_id: usize) -> Option<&[u8]> {
        self.buffer_registry.get(&buffer_id).map(Vec::as_slice)
    }

    fn load_image(&mut self, image_id: usize) -> Result<image::RgbaImage> {
        let image = match self.asset.gltf().images().nth(image_id) {
            Some(image) => image,
            None => {
                return Err(Error::new(format!("The given image ID is invalid: {image_id}")).into())
            }
        };

        let loaded_image = match image.source() {
            gltf::image::Source::Uri { uri, .. } => {
                let image_path = self.asset.root.join(uri);
                image::open(&image_path)
                    .with_context(|| format!("Unable to open glTF image {}", image_path.display()))?
            }
            gltf::image::Source::View { view, mime_type } => {
                self.load_buffer(view.buffer().index())?;
                let data = self.read_view_data(&view)?;

                match image::ImageFormat::from_mime_type(mime_type) {
                    Some(image_format) => image::load_from_memory_with_format(data, image_format)?,
                    None => {
                        return Err(Error::new(format!(
                            "The given MIME type is not supported: {mime_type}"
                        ))
                        .into())
                    }
                }
            }
        };

        Ok(loaded_image.to_rgba8())
    }
}
