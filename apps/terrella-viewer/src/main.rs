use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use terrella_assets::{PlanetTextures, TextureStore};
use terrella_input::{OrbitController, OrbitEvent};
use terrella_render::{DebugTextRenderer, Renderer};
use terrella_render_wgpu::WgpuRenderer;
use terrella_scene::{Camera, SceneGraph, assemble_scene};

mod config;
use config::ViewerConfig;

#[derive(Parser)]
#[command(name = "terrella-viewer", about = "Interactive rotating planet viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Texture directory
    #[arg(long, default_value = "./textures")]
    textures: String,

    /// Number of background stars
    #[arg(long)]
    stars: Option<u32>,

    /// Window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    height: Option<u32>,
}

/// Everything the render loop reads and mutates each tick.
///
/// Owned by the application context; the loop and the resize handler share
/// the one camera, with the resize handler writing only the aspect ratio.
struct ViewerState {
    graph: SceneGraph,
    camera: Camera,
    controller: OrbitController,
    textures: TextureStore,
}

impl ViewerState {
    fn new(config: &ViewerConfig) -> Result<Self> {
        let mut textures = TextureStore::new();
        let planet_textures = PlanetTextures::load(&mut textures, &config.texture_dir);

        let mut graph = SceneGraph::new();
        assemble_scene(&mut graph, &config.scene, &planet_textures)
            .context("scene assembly failed")?;

        let camera = config.camera;
        let mut controller = OrbitController::new(&camera);
        controller.damping_enabled = config.damping_enabled;
        controller.damping_factor = config.damping_factor;

        Ok(Self {
            graph,
            camera,
            controller,
            textures,
        })
    }

    /// One frame tick: advance layer rotations, then let the controller
    /// consume buffered input and rewrite the camera.
    fn tick(&mut self) {
        self.graph.tick();
        self.controller.update(&mut self.camera);
    }
}

struct ViewerApp {
    state: ViewerState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    window_size: (u32, u32),
    dragging: bool,
    /// Checked before each redraw re-arm; cleared on close request.
    running: bool,
}

impl ViewerApp {
    fn new(state: ViewerState, config: &ViewerConfig) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            surface_config: None,
            renderer: None,
            window_size: (config.window_width, config.window_height),
            dragging: false,
            running: true,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.window_size;
        let attrs = Window::default_attributes()
            .with_title("Terrella")
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("terrella_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        // Physical pixel size: logical size already scaled by the window's
        // pixel density.
        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        self.state.camera.set_viewport(size.width, size.height);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            size.width,
            size.height,
            &self.state.graph,
            &self.state.textures,
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.surface_config = Some(surface_config);
        self.renderer = Some(renderer);

        tracing::info!(
            "GPU initialized with {} backend at {}x{} (scale factor {})",
            adapter.get_info().backend.to_str(),
            size.width,
            size.height,
            self.window.as_ref().map(|w| w.scale_factor()).unwrap_or(1.0)
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.surface_config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.camera.set_viewport(config.width, config.height);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.state.controller.push(OrbitEvent::Zoom(amount));
            }
            WindowEvent::RedrawRequested => {
                self.state.tick();

                let (Some(surface), Some(device), Some(queue)) =
                    (&self.surface, &self.device, &self.queue)
                else {
                    return;
                };

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Outdated) => {
                        // Resize race: skip this frame only.
                        if let Some(config) = &self.surface_config {
                            surface.configure(device, config);
                        }
                        return;
                    }
                    Err(e) => {
                        // Surface loss is fatal; stop producing frames.
                        tracing::error!("drawing surface lost: {e}");
                        self.running = false;
                        event_loop.exit();
                        return;
                    }
                };

                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                if let Some(renderer) = &self.renderer {
                    renderer.render(device, queue, &view, &self.state.graph, &self.state.camera);
                }

                output.present();
                if self.running {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.dragging {
                self.state
                    .controller
                    .push(OrbitEvent::Rotate(delta.0 as f32, delta.1 as f32));
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.running {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("terrella-viewer starting");

    let mut config = ViewerConfig {
        texture_dir: cli.textures,
        ..ViewerConfig::default()
    };
    if let Some(stars) = cli.stars {
        config = config.with_stars(stars);
    }
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        config = config.with_window(width, height);
    }

    let state = ViewerState::new(&config)?;
    tracing::debug!(
        "assembled scene:\n{}",
        DebugTextRenderer::new().render(&state.graph, &state.camera)
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(state, &config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
