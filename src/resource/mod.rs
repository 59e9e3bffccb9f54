pub mod gltf;
pub mod heightmap;
pub mod texture;
