use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use roam::controller::input::native::{device_event_to_input, window_event_to_input};
use roam::controller::{CursorRequest, FrameLoop, SurfaceSize};
use roam::model::SceneDescription;
use roam::view::{build_ui, GpuContext, SceneRenderer, UiActions};
use roam::{logging, Options};

struct Viewer {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: SceneRenderer,

    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    frame_loop: FrameLoop,

    last_frame_time: Instant,
    fps: f32,
    frame_count: u32,
    fps_timer: f32,
}

impl Viewer {
    async fn new(window: Arc<Window>, options: Options) -> roam::Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone()).await?;

        let mut frame_loop = FrameLoop::new(options, SurfaceSize::new(size.width, size.height));
        let scene = SceneDescription::demo_house();
        frame_loop.load_scene(&scene);
        let renderer = SceneRenderer::new(&gpu, &scene, frame_loop.collider().map(|c| c.as_ref()));

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.format,
            egui_wgpu::RendererOptions::default(),
        );

        let mut viewer = Self {
            window,
            gpu,
            renderer,
            egui_renderer,
            egui_state,
            egui_ctx,
            frame_loop,
            last_frame_time: Instant::now(),
            fps: 0.0,
            frame_count: 0,
            fps_timer: 0.0,
        };
        viewer.apply_cursor_request();
        Ok(viewer)
    }

    /// Grab or free the OS cursor as the active controller asked.
    fn apply_cursor_request(&mut self) {
        match self.frame_loop.take_cursor_request() {
            Some(CursorRequest::Capture) => {
                let grabbed = self
                    .window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    warn!(error = %e, "cursor grab unavailable");
                }
                self.window.set_cursor_visible(false);
            }
            Some(CursorRequest::Release) => {
                let _ = self.window.set_cursor_grab(CursorGrabMode::None);
                self.window.set_cursor_visible(true);
            }
            None => {}
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.renderer.resize(&self.gpu.device, width, height);
        self.frame_loop.resize(width, height);
        self.apply_cursor_request();
    }

    fn update(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.frame_count += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }

        self.frame_loop.tick(dt);
        self.apply_cursor_request();
        dt
    }

    fn render(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let status = self.frame_loop.status().clone();
        let locked = self.frame_loop.is_pointer_locked();
        let fps = self.fps;
        let navigation = &mut self.frame_loop.options.navigation;
        let mut actions = UiActions::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = build_ui(ctx, &status, navigation, locked, fps);
        });
        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);

        if let Some(mode) = actions.requested_mode {
            self.frame_loop.set_mode(mode);
            self.apply_cursor_request();
        }

        let pixels_per_point = self.window.scale_factor() as f32;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
            pixels_per_point,
        };
        let primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        self.renderer.prepare(&self.gpu.device, &self.gpu.queue, &self.frame_loop, dt);

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
        }
        let egui_commands = self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &primitives,
            &screen_descriptor,
        );

        self.renderer.draw(&mut encoder, &view, self.frame_loop.options.navigation.show_collision_mesh);

        // egui on top
        {
            let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut egui_pass.forget_lifetime(), &primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.gpu
            .queue
            .submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }
}

struct App {
    options: Option<Options>,
    viewer: Option<Viewer>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("roam")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!(error = %e, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let options = self.options.take().unwrap_or_default();
        match pollster::block_on(Viewer::new(window, options)) {
            Ok(viewer) => {
                info!("viewer ready");
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                error!(error = %e, "failed to initialize viewer");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if window_id != viewer.window.id() {
            return;
        }

        let egui_response = viewer.egui_state.on_window_event(&viewer.window, &event);

        match &event {
            WindowEvent::CloseRequested => {
                viewer.frame_loop.dispose();
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => viewer.resize(size.width, size.height),
            WindowEvent::Focused(false) => {
                viewer.frame_loop.set_pointer_locked(false);
                viewer.apply_cursor_request();
            }
            WindowEvent::RedrawRequested => {
                let dt = viewer.update();
                match viewer.render(dt) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = viewer.window.inner_size();
                        viewer.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory");
                        event_loop.exit();
                    }
                    Err(e) => warn!(error = ?e, "dropped frame"),
                }
                return;
            }
            _ => {}
        }

        // While the cursor is captured the HUD is not interactive
        if egui_response.consumed && !viewer.frame_loop.is_pointer_locked() {
            return;
        }
        if let Some(input) = window_event_to_input(&event) {
            viewer.frame_loop.handle_event(&input);
            viewer.apply_cursor_request();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if let Some(input) = device_event_to_input(&event) {
            viewer.frame_loop.handle_event(&input);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn main() -> roam::Result<()> {
    logging::init();

    let options = Options::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "could not load options, using defaults");
        Options::default()
    });

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App { options: Some(options), viewer: None };
    event_loop.run_app(&mut app)?;
    Ok(())
}
