use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::Error;
use crate::resource::gltf::asset::GltfAsset;

pub struct FileSystemGltfAsset {
    gltf: gltf::Gltf,
    pub root: PathBuf,
}

impl FileSystemGltfAsset {
    pub fn from_path(gltf_path: &Path) -> Result<Self> {
        let absolute_path = gltf_path
            .canonicalize()
            .with_context(|| format!("Unable to resolve glTF path {}", gltf_path.display()))?;

        if !absolute_path.is_file() {
            return Err(Error::new(format!(
                "The given path is not a file: {}",
                gltf_path.display()
            ))
            .into());
        }

        let root = match absolute_path.parent() {
            Some(root) => root.to_path_buf(),
            None => {
                return Err(Error::new(format!(
                    "Unable to find the parent directory of the given path: {}",
                    gltf_path.display()
                ))
                .into())
            }
        };

        let gltf = gltf::Gltf::open(&absolute_path)
            .with_context(|| format!("Unable to parse glTF file {}", gltf_path.display()))?;

        log::info!(
            "Opened glTF asset {} ({} meshes, {} materials)",
            gltf_path.display(),
            gltf.meshes().len(),
            gltf.materials().len()
        );

        Ok(Self { gltf, root })
    }
}

impl GltfAsset for FileSystemGltfAsset {
    fn gltf(&self) -> &gltf::Gltf {
        &self.gltf
    }
}
