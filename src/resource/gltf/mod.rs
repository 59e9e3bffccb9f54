pub mod asset;
pub mod loader;
pub mod scene;
