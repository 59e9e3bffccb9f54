use anyhow::Result;

use crate::render::mesh::Vertex;
use crate::render::pass::FramePass;
use crate::render::shader::{ShaderModulePackage, ShaderTemplateConfiguration};
use crate::render::texture::DEPTH_FORMAT;

pub struct RenderPipeline {
    pub config: RenderPipelineConfiguration,
    pub gpu_pipeline: wgpu::RenderPipeline,
}

impl RenderPipeline {
    pub fn from_config(
        config: RenderPipelineConfiguration,
        device: &wgpu::Device,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        shader_module_package: &ShaderModulePackage,
        format: wgpu::TextureFormat,
    ) -> Self {
        let name = config.pass.label();

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{name}_RENDER_PIPELINE_LAYOUT")),
                bind_group_layouts,
                push_constant_ranges: &[],
            });

        let gpu_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{name}_RENDER_PIPELINE")),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module_package.vertex_shader_module,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module_package.fragment_shader_module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent::REPLACE,
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: config.depth_write_enabled,
                depth_compare: config.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            config,
            gpu_pipeline,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RenderPipelineConfiguration {
    pub pass: FramePass,
    pub depth_write_enabled: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub cull_mode: Option<wgpu::Face>,
}

impl RenderPipelineConfiguration {
    pub fn for_pass(pass: FramePass) -> Self {
        match pass {
            // Drawn from inside the cube, behind everything the later passes draw.
            FramePass::Skybox => Self {
                pass,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                cull_mode: None,
            },
            FramePass::Geometry | FramePass::Terrain => Self {
                pass,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                cull_mode: Some(wgpu::Face::Back),
            },
        }
    }

    pub fn shader_template_names(&self) -> (&'static str, &'static str) {
        match self.pass {
            FramePass::Skybox => ("skybox/skybox.vert", "skybox/skybox.frag"),
            FramePass::Geometry => ("scene/scene.vert", "scene/scene.frag"),
            FramePass::Terrain => ("terrain/terrain.vert", "terrain/terrain.frag"),
        }
    }
}

/// One pipeline per frame pass.
pub struct FramePipelines {
    pub skybox: RenderPipeline,
    pub geometry: RenderPipeline,
    pub terrain: RenderPipeline,
}

impl FramePipelines {
    pub fn from_device(
        device: &wgpu::Device,
        tera: &tera::Tera,
        format: wgpu::TextureFormat,
        scene_bind_group_layout: &wgpu::BindGroupLayout,
        terrain_bind_group_layout: &wgpu::BindGroupLayout,
        texture_count: u32,
    ) -> Result<Self> {
        let shader_template_config = ShaderTemplateConfiguration { texture_count };

        let create = |pass: FramePass, layout: &wgpu::BindGroupLayout| -> Result<RenderPipeline> {
            let config = RenderPipelineConfiguration::for_pass(pass);
            let (vertex_template_name, fragment_template_name) = config.shader_template_names();

            let shader_module_package = ShaderModulePackage::from_templates(
                vertex_template_name,
                fragment_template_name,
                pass.label(),
                device,
                tera,
                &shader_template_config,
            )?;

            Ok(RenderPipeline::from_config(
                config,
                device,
                &[layout],
                &shader_module_package,
                format,
            ))
        };

        Ok(Self {
            skybox: create(FramePass::Skybox, scene_bind_group_layout)?,
            geometry: create(FramePass::Geometry, scene_bind_group_layout)?,
            terrain: create(FramePass::Terrain, terrain_bind_group_layout)?,
        })
    }

    pub fn for_pass(&self, pass: FramePass) -> &RenderPipeline {
        match pass {
            FramePass::Skybox => &self.skybox,
            FramePass::Geometry => &self.geometry,
            FramePass::Terrain => &self.terrain,
        }
    }
}
