use std::path::Path;

use anyhow::{Context, Result};

pub struct Args {
    pub gltf: Option<String>,
    pub sky: Option<String>,
    pub heightmap: Option<String>,
    pub instances: u32,
    pub config: EngineConfig,
}

/// Element capacities of the fixed-size GPU arenas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaCapacities {
    pub vertices: u32,
    pub indices: u32,
    pub models: u32,
    pub materials: u32,
    pub terrain_vertices: u32,
    pub terrain_indices: u32,
    pub terrain_patches: u32,
}

impl Default for ArenaCapacities {
    fn default() -> Self {
        Self {
            vertices: 1_000_000,
            indices: 1_000_000,
            models: 1_000_000,
            materials: 1_024,
            terrain_vertices: 262_144,
            terrain_indices: 1_048_576,
            terrain_patches: 4_096,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub capacities: ArenaCapacities,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_width: 720,
            window_height: 480,
            capacities: Default::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;

        EngineConfig::from_json(&json)
            .with_context(|| format!("Unable to parse config file {}", path.display()))
    }
}
