use std::path::Path;

use clap::Parser;

use crate::cli::Cli;
use arena_renderer::args::{Args, EngineConfig};
use arena_renderer::run;

mod cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => EngineConfig::from_path(Path::new(config_path))?,
        None => EngineConfig::default(),
    };
    cli.capacities.apply(&mut config.capacities);

    run(Args {
        gltf: cli.gltf,
        sky: cli.sky,
        heightmap: cli.heightmap,
        instances: cli.instances,
        config,
    })
}
