use std::rc::Rc;

use anyhow::{Context, Result};

use crate::args::EngineConfig;
use crate::data::projection::PerspectiveProjection;
use crate::data::transform::Transform;
use crate::render::backend::WgpuBackend;
use crate::render::bindings::{create_texture_sampler, SceneBindings, TerrainBindings};
use crate::render::entity::{Entity, EntityId};
use crate::render::frame::{FrameEvent, FramePhase};
use crate::render::material::Material;
use crate::render::mesh::Mesh;
use crate::render::pass::{FramePass, FRAME_PASS_ORDER};
use crate::render::pipeline::FramePipelines;
use crate::render::state::RenderSystemState;
use crate::render::storage::{check_capacities, DrawCall, RenderSystemSceneStorage};
use crate::render::view::ViewEnvironment;

pub mod backend;
pub mod bindings;
pub mod buffer;
pub mod entity;
pub mod frame;
pub mod material;
pub mod mesh;
pub mod pass;
pub mod pipeline;
pub mod primitive;
pub mod registry;
pub mod scene;
pub mod shader;
pub mod skybox;
pub mod state;
pub mod storage;
pub mod terrain;
pub mod texture;
pub mod view;

pub struct RenderSystem {
    state: RenderSystemState,
    storage: RenderSystemSceneStorage<WgpuBackend>,
    view_environment: ViewEnvironment<WgpuBackend>,
    sampler: wgpu::Sampler,
    scene_bindings: SceneBindings,
    terrain_bindings: TerrainBindings,
    pipelines: FramePipelines,
    phase: FramePhase,
}

impl RenderSystem {
    pub async fn from_window(
        window: std::sync::Arc<winit::window::Window>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let mut phase = FramePhase::Uninitialized;

        let state = RenderSystemState::from_window(window)
            .await
            .context("Unable to initialize the device and surface")?;
        phase = phase.transition(FrameEvent::DeviceAcquired)?;
        phase = phase.transition(FrameEvent::SurfaceConfigured)?;

        check_capacities(&config.capacities, &state.device.limits())
            .context("Unable to fit the configured arena capacities")?;

        let backend = Rc::new(WgpuBackend::new(state.device.clone(), state.queue.clone()));

        let storage = RenderSystemSceneStorage::new(backend.clone(), &config.capacities)
            .context("Unable to create the scene arenas")?;
        log::info!("Created scene arenas: {:?}", config.capacities);

        let view_environment = ViewEnvironment::from_backend(
            backend,
            PerspectiveProjection::default().with_aspect_ratio(state.aspect_ratio()),
        );

        let sampler = create_texture_sampler(&state.device);

        let scene_bindings =
            SceneBindings::from_storage(&state.device, &sampler, &view_environment, &storage)
                .context("Unable to create the scene bindings")?;
        let terrain_bindings =
            TerrainBindings::from_storage(&state.device, &view_environment, &storage);

        let pipelines = FramePipelines::from_device(
            &state.device,
            &state.tera,
            state.surface_config.format,
            &scene_bindings.layout,
            &terrain_bindings.layout,
            scene_bindings.texture_count,
        )
        .context("Unable to create the render pipelines")?;

        log::info!("Render system ready");

        Ok(Self {
            state,
            storage,
            view_environment,
            sampler,
            scene_bindings,
            terrain_bindings,
            pipelines,
            phase,
        })
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        self.storage.add_entity(entity)
    }

    pub fn add_instance(&mut self, entity: Entity) -> Result<Option<EntityId>> {
        self.storage.add_instance(entity)
    }

    pub fn set_sky(&mut self, entity: Entity) -> Result<EntityId> {
        self.storage.set_sky(entity)
    }

    pub fn register_material(&mut self, material: &Material) -> Result<u32> {
        self.storage.registry.register_material(material)
    }

    pub fn add_terrain_patch(&mut self, mesh: &Rc<Mesh>, transform: Transform) -> Result<u32> {
        self.storage.terrain.add_patch(mesh, transform)
    }

    pub fn sync_view_dimensions(&mut self) -> Result<()> {
        self.set_view_dimensions(self.state.view_dimensions)
    }

    pub fn set_view_dimensions(
        &mut self,
        view_dimensions: winit::dpi::PhysicalSize<u32>,
    ) -> Result<()> {
        if view_dimensions.width == 0 || view_dimensions.height == 0 {
            return Ok(());
        }

        self.phase = self.phase.transition(FrameEvent::ResizeRequested)?;

        self.state.set_view_dimensions(view_dimensions);
        self.view_environment
            .set_aspect_ratio(view_dimensions.width as f32 / view_dimensions.height as f32);

        self.phase = self.phase.transition(FrameEvent::ResizeCompleted)?;

        log::debug!(
            "Resized view to {}x{}",
            view_dimensions.width,
            view_dimensions.height
        );

        Ok(())
    }

    pub fn set_camera_transform(&mut self, transform: Transform) {
        self.view_environment.set_camera_transform(transform);
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.phase = self.phase.transition(FrameEvent::Shutdown)?;
        log::info!("Render system shut down");
        Ok(())
    }

    pub fn render(&mut self, time: f32) -> Result<()> {
        self.phase = self.phase.transition(FrameEvent::FrameStarted)?;

        self.view_environment.set_time(time);

        let output = match self.state.surface.get_current_texture() {
            Ok(output) => output,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {error}, reconfiguring and skipping the frame");
                return self.sync_view_dimensions();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping the frame");
                return Ok(());
            }
            Err(error) => return Err(error).context("Unable to acquire the next surface texture"),
        };

        self.rebuild_bindings_if_stale()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for pass in FRAME_PASS_ORDER {
            let mut encoder =
                self.state
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some(&format!("{}_COMMAND_ENCODER", pass.label())),
                    });

            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(&format!("{}_RENDER_PASS", pass.label())),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: pass.color_operations(),
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.state.depth_texture.gpu_texture_view,
                        depth_ops: Some(pass.depth_operations()),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                self.record_pass(pass, &mut render_pass);
            }

            self.state.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        Ok(())
    }

    fn record_pass(&self, pass: FramePass, render_pass: &mut wgpu::RenderPass) {
        let (draw_calls, bind_group, arenas) = match pass {
            FramePass::Skybox => (
                self.storage.sky_draw_call().into_iter().collect::<Vec<_>>(),
                &self.scene_bindings.bind_group,
                (&self.storage.arenas.vertices, &self.storage.arenas.indices),
            ),
            FramePass::Geometry => (
                self.storage.geometry_draw_calls(),
                &self.scene_bindings.bind_group,
                (&self.storage.arenas.vertices, &self.storage.arenas.indices),
            ),
            FramePass::Terrain => (
                self.storage.terrain.draw_calls(),
                &self.terrain_bindings.bind_group,
                (&self.storage.terrain.vertices, &self.storage.terrain.indices),
            ),
        };

        if draw_calls.is_empty() {
            return;
        }

        let (vertices, indices) = arenas;

        render_pass.set_pipeline(&self.pipelines.for_pass(pass).gpu_pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertices.buffer().gpu_buffer.slice(..));

        if draw_calls
            .iter()
            .any(|draw_call| matches!(draw_call, DrawCall::Indexed { .. }))
        {
            render_pass.set_index_buffer(
                indices.buffer().gpu_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
        }

        for draw_call in draw_calls {
            draw_call.record(render_pass);
        }
    }

    fn rebuild_bindings_if_stale(&mut self) -> Result<()> {
        if !self
            .scene_bindings
            .is_stale(self.storage.registry.generation())
        {
            return Ok(());
        }

        self.scene_bindings = SceneBindings::from_storage(
            &self.state.device,
            &self.sampler,
            &self.view_environment,
            &self.storage,
        )?;

        self.pipelines = FramePipelines::from_device(
            &self.state.device,
            &self.state.tera,
            self.state.surface_config.format,
            &self.scene_bindings.layout,
            &self.terrain_bindings.layout,
            self.scene_bindings.texture_count,
        )?;

        log::info!(
            "Rebuilt scene bindings and pipelines for {} textures",
            self.scene_bindings.texture_count
        );

        Ok(())
    }
}
