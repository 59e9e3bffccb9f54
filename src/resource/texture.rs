use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::render::texture::{Texture, DEFAULT_MIP_LEVEL_COUNT};

pub const MISSING_TEXTURE_COLOR: [u8; 4] = [255, 0, 255, 255];

pub trait TextureLoader {
    /// Loads the texture at `path`. Failures yield the magenta placeholder.
    fn load_texture(&self, path: &Path) -> Rc<Texture>;
}

/// Loads textures with the `image` crate and hands out one shared texture per path.
pub struct FileSystemTextureLoader {
    mip_level_count: u32,
    texture_registry: RefCell<HashMap<PathBuf, Rc<Texture>>>,
    missing_texture: Rc<Texture>,
}

impl FileSystemTextureLoader {
    pub fn new(mip_level_count: u32) -> Self {
        Self {
            mip_level_count,
            texture_registry: RefCell::new(HashMap::new()),
            missing_texture: Rc::new(Texture::solid("MISSING", MISSING_TEXTURE_COLOR)),
        }
    }

    fn read_texture(&self, path: &Path) -> Result<Texture> {
        let image = image::open(path)
            .with_context(|| format!("Unable to open image {}", path.display()))?
            .to_rgba8();

        let (width, height) = image.dimensions();

        Texture::new(
            path.display().to_string(),
            image.into_raw(),
            width,
            height,
            self.mip_level_count,
        )
    }
}

impl Default for FileSystemTextureLoader {
    fn default() -> Self {
        FileSystemTextureLoader::new(DEFAULT_MIP_LEVEL_COUNT)
    }
}

impl TextureLoader for FileSystemTextureLoader {
    fn load_texture(&self, path: &Path) -> Rc<Texture> {
        if let Some(texture) = self.texture_registry.borrow().get(path) {
            log::debug!("Skipping duplicate load of texture file: {}", path.display());
            return texture.clone();
        }

        let texture = match self.read_texture(path) {
            Ok(texture) => Rc::new(texture),
            Err(error) => {
                log::error!("{error:#}; using the missing texture instead");
                self.missing_texture.clone()
            }
        };

        self.texture_registry
            .borrow_mut()
            .insert(path.to_path_buf(), texture.clone());

        texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_yields_the_shared_missing_texture() {
        let loader = FileSystemTextureLoader::default();

        let first = loader.load_texture(Path::new("does/not/exist.png"));
        let second = loader.load_texture(Path::new("also/missing.jpg"));

        assert_eq!(first.pixels, MISSING_TEXTURE_COLOR.to_vec());
        assert_eq!((first.width, first.height), (1, 1));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn image_files_are_loaded_once_with_clamped_mips() {
        let path = std::env::temp_dir().join("arena_renderer_texture_loader_test.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let loader = FileSystemTextureLoader::default();

        let first = loader.load_texture(&path);
        let second = loader.load_texture(&path);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!((first.width, first.height), (4, 2));
        assert_eq!(first.mip_level_count, 3);
        assert_eq!(&first.pixels[..4], &[10, 20, 30, 255]);

        let _ = std::fs::remove_file(path);
    }
}
