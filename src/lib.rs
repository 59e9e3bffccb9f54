use anyhow::{Context, Result};

use crate::app::App;
use crate::args::Args;

mod app;
pub mod args;
mod camera;
pub mod data;
mod demo;
pub mod error;
pub mod render;
pub mod resource;
mod view;

pub fn run(args: Args) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = App::create_event_loop().context("Unable to create the event loop")?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new(&event_loop, args);

    event_loop
        .run_app(&mut app)
        .context("The event loop terminated abnormally")?;

    app.into_result()
}
