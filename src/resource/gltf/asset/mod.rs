use anyhow::Result;

use crate::error::Error;

pub mod file;

pub trait GltfAsset {
    fn gltf(&self) -> &gltf::Gltf;

    fn get_scene(&self, scene_id: usize) -> Result<gltf::Scene> {
        match self.gltf().scenes().nth(scene_id) {
            Some(scene) => Ok(scene),
            None => {
                Err(Error::new(format!("No scene exists with the given ID: {scene_id}")).into())
            }
        }
    }

    /// The scene marked as default, or the first one.
    fn default_scene_id(&self) -> Result<usize> {
        match self.gltf().default_scene().or_else(|| self.gltf().scenes().next()) {
            Some(scene) => Ok(scene.index()),
            None => Err(Error::new(String::from("The asset contains no scenes.")).into()),
        }
    }
}
