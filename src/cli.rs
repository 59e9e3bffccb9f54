use clap::{Args, Parser};

use arena_renderer::args::ArenaCapacities;

/// Renders a scene out of fixed-size GPU arenas: a sky, glTF meshes, instanced cubes and terrain
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional .gltf file whose default scene is added to the geometry pass
    pub gltf: Option<String>,

    /// Path to an equirectangular image used as the sky texture
    #[arg(short = 'S', long)]
    pub sky: Option<String>,

    /// Path to a grayscale image used as the terrain heightmap
    #[arg(short = 'H', long)]
    pub heightmap: Option<String>,

    /// Number of cube instances placed around the cube prototype
    #[arg(short, long, default_value_t = 10)]
    pub instances: u32,

    /// Path to a JSON engine configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub capacities: CapacityOverrides,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CapacityOverrides {
    /// Capacity of the vertex arena, in vertices
    #[arg(long)]
    pub max_vertices: Option<u32>,

    /// Capacity of the index arena, in indices
    #[arg(long)]
    pub max_indices: Option<u32>,

    /// Capacity of the model arena, in entities
    #[arg(long)]
    pub max_models: Option<u32>,

    /// Capacity of the material arena, in materials
    #[arg(long)]
    pub max_materials: Option<u32>,

    /// Capacity of the terrain vertex arena, in vertices
    #[arg(long)]
    pub max_terrain_vertices: Option<u32>,

    /// Capacity of the terrain index arena, in indices
    #[arg(long)]
    pub max_terrain_indices: Option<u32>,

    /// Capacity of the terrain model arena, in patches
    #[arg(long)]
    pub max_terrain_patches: Option<u32>,
}

impl CapacityOverrides {
    pub fn apply(&self, capacities: &mut ArenaCapacities) {
        if let Some(vertices) = self.max_vertices {
            capacities.vertices = vertices;
        }
        if let Some(indices) = self.max_indices {
            capacities.indices = indices;
        }
        if let Some(models) = self.max_models {
            capacities.models = models;
        }
        if let Some(materials) = self.max_materials {
            capacities.materials = materials;
        }
        if let Some(terrain_vertices) = self.max_terrain_vertices {
            capacities.terrain_vertices = terrain_vertices;
        }
        if let Some(terrain_indices) = self.max_terrain_indices {
            capacities.terrain_indices = terrain_indices;
        }
        if let Some(terrain_patches) = self.max_terrain_patches {
            capacities.terrain_patches = terrain_patches;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_the_given_capacities() {
        let cli = Cli::parse_from(["arena_renderer", "--max-vertices", "4096", "--max-materials", "8"]);
        let mut capacities = ArenaCapacities::default();

        cli.capacities.apply(&mut capacities);

        assert_eq!(capacities.vertices, 4096);
        assert_eq!(capacities.materials, 8);
        assert_eq!(capacities.indices, ArenaCapacities::default().indices);
        assert_eq!(cli.instances, 10);
        assert!(cli.gltf.is_none());
    }

    #[test]
    fn terrain_arenas_can_be_sized_from_the_command_line() {
        let cli = Cli::parse_from([
            "arena_renderer",
            "--max-terrain-vertices",
            "1024",
            "--max-terrain-indices",
            "6144",
            "--max-terrain-patches",
            "9",
        ]);
        let mut capacities = ArenaCapacities::default();

        cli.capacities.apply(&mut capacities);

        assert_eq!(capacities.terrain_vertices, 1024);
        assert_eq!(capacities.terrain_indices, 6144);
        assert_eq!(capacities.terrain_patches, 9);
        assert_eq!(capacities.vertices, ArenaCapacities::default().vertices);
    }
}
