use anyhow::{Context, Result};

use crate::error::Error;
use crate::render::bindings::REQUIRED_FEATURES;
use crate::render::texture::DepthTexture2DPackage;

pub struct RenderSystemState {
    #[allow(dead_code)]
    pub instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub device: std::rc::Rc<wgpu::Device>,
    pub queue: std::rc::Rc<wgpu::Queue>,
    pub depth_texture: DepthTexture2DPackage,
    pub tera: tera::Tera,
    pub view_dimensions: winit::dpi::PhysicalSize<u32>,
}

impl RenderSystemState {
    pub async fn from_window(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let view_dimensions = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("Unable to create the window surface")?;

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Some(adapter) => adapter,
            None => return Err(Error::new(String::from("Failed to retrieve adapter.")).into()),
        };

        log::info!("Using adapter: {:?}", adapter.get_info());

        let missing_features = REQUIRED_FEATURES.difference(adapter.features());
        if !missing_features.is_empty() {
            return Err(Error::MissingFeatures(missing_features).into());
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: REQUIRED_FEATURES,
                    required_limits: adapter.limits(),
                    label: Some("RENDER_SYSTEM_DEVICE"),
                    ..Default::default()
                },
                None,
            )
            .await
            .context("Unable to request the device")?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("Uncaptured device error: {error}");
        }));

        let device = std::rc::Rc::new(device);
        let queue = std::rc::Rc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = match surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
        {
            Some(surface_format) => *surface_format,
            None => {
                return Err(Error::new(String::from(
                    "The surface is not compatible with the adapter.",
                ))
                .into())
            }
        };

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: view_dimensions.width.max(1),
            height: view_dimensions.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        log::info!(
            "Configured {:?} surface at {}x{}",
            surface_format,
            surface_config.width,
            surface_config.height
        );

        let depth_texture = DepthTexture2DPackage::from_device(
            &device,
            surface_config.width,
            surface_config.height,
        );

        let tera = tera::Tera::new("shaders/**/*").context("Unable to load the shader templates")?;

        Ok(Self {
            instance,
            surface,
            surface_config,
            adapter,
            device,
            queue,
            depth_texture,
            tera,
            view_dimensions,
        })
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        self.view_dimensions = view_dimensions;
        self.surface_config.width = view_dimensions.width;
        self.surface_config.height = view_dimensions.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture = DepthTexture2DPackage::from_device(
            &self.device,
            view_dimensions.width,
            view_dimensions.height,
        );
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height as f32
    }
}
