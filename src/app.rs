use std::time::Instant;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::args::Args;
use crate::demo::populate_scene;
use crate::error::Error;
use crate::view::ViewSystem;

pub struct App {
    event_loop_proxy: EventLoopProxy<UserEvent>,
    args: Args,
    view_system: Option<ViewSystem>,
    last_render_time: Instant,
    fatal_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(event_loop: &EventLoop<UserEvent>, args: Args) -> Self {
        App {
            event_loop_proxy: event_loop.create_proxy(),
            args,
            view_system: None,
            last_render_time: Instant::now(),
            fatal_error: None,
        }
    }

    pub fn create_event_loop() -> Result<EventLoop<UserEvent>, EventLoopError> {
        EventLoop::<UserEvent>::with_user_event().build()
    }

    /// The error that stopped the event loop, if any.
    pub fn into_result(self) -> Result<()> {
        match self.fatal_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Window> {
        let attributes = Window::default_attributes()
            .with_title("arena renderer")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.args.config.window_width,
                self.args.config.window_height,
            ));

        Ok(event_loop.create_window(attributes)?)
    }

    async fn initialize_view_system(
        event_loop_proxy: EventLoopProxy<UserEvent>,
        window: Window,
        args: &Args,
    ) -> Result<()> {
        let view_system = ViewSystem::from_window(window, &args.config).await?;

        match event_loop_proxy.send_event(UserEvent::ViewSystemReady(view_system)) {
            Ok(_) => Ok(()),
            Err(_) => Err(Error::new(String::from("The event loop closed before the view system was ready.")).into()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");

        if let Some(mut view_system) = self.view_system.take() {
            if let Err(error) = view_system.render_system.shutdown() {
                log::debug!("{error:#}");
            }
        }

        self.fatal_error = Some(error);
        event_loop.exit();
    }

    /// Shuts the render system down and drops the view system, so events still
    /// queued for this loop iteration find nothing to drive.
    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut view_system) = self.view_system.take() {
            if let Err(error) = view_system.render_system.shutdown() {
                log::warn!("{error:#}");
            }
        }

        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Application resumed");

        if self.view_system.is_some() || self.fatal_error.is_some() {
            return;
        }

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(error) => return self.fail(event_loop, error),
        };

        let event_loop_proxy = self.event_loop_proxy.clone();

        if let Err(error) = pollster::block_on(App::initialize_view_system(
            event_loop_proxy,
            window,
            &self.args,
        )) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let view_system = match &mut self.view_system {
            Some(view_system) if !view_system.render_system.phase().is_terminated() => view_system,
            _ => return,
        };

        if view_system.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.exit(event_loop),
            WindowEvent::Resized(new_size) => {
                if let Err(error) = view_system.render_system.set_view_dimensions(new_size) {
                    self.fail(event_loop, error);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_time = now - self.last_render_time;

                if let Err(error) = view_system.update_view(delta_time) {
                    return self.fail(event_loop, error);
                }

                self.last_render_time = now;
                view_system.window.request_redraw();
            }
            WindowEvent::MouseInput {
                device_id: _,
                state,
                button,
            } => {
                view_system
                    .camera_controller
                    .handle_mouse_input(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                view_system.camera_controller.handle_mouse_wheel(delta);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let view_system = match &mut self.view_system {
            Some(view_system) if !view_system.render_system.phase().is_terminated() => view_system,
            _ => return,
        };

        if let DeviceEvent::MouseMotion { delta } = event {
            view_system
                .camera_controller
                .handle_mouse_movement(delta.0 as f32, delta.1 as f32);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        let UserEvent::ViewSystemReady(mut view_system) = event;

        log::info!("View system created");

        if let Err(error) = populate_scene(&mut view_system.render_system, &self.args) {
            self.view_system = Some(view_system);
            return self.fail(event_loop, error);
        }

        if let Err(error) = view_system.render_system.sync_view_dimensions() {
            self.view_system = Some(view_system);
            return self.fail(event_loop, error);
        }

        view_system.window.request_redraw();
        self.view_system = Some(view_system);
        self.last_render_time = Instant::now();
    }
}

pub enum UserEvent {
    ViewSystemReady(ViewSystem),
}
