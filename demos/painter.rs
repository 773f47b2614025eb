//! Windowed demo: batched rectangles, lines, a gradient, scissored text.
//!
//! Run with an optional TTF path to get text output:
//! `cargo run --example painter -- /path/to/font.ttf`

use std::sync::Arc;

use anyhow::{Context, Result};
use polonium_2d::{
    Align, Color, FontAtlas, Pipeline2d, Position, RenderContext, RenderQueue, Size,
    TextureBindings, UvRect,
};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

struct Painter {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    ctx: RenderContext,
    pipeline: Pipeline2d,
    queue: RenderQueue,
    font: Option<FontAtlas>,
    textures: TextureBindings,
    frame: u64,
}

impl Painter {
    fn new(event_loop: &ActiveEventLoop, font_path: Option<String>) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("polonium painter")
                    .with_inner_size(winit::dpi::PhysicalSize::new(800, 600)),
            )?,
        );
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible adapter")?;
        let (device, gpu_queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor::default(),
            None,
        ))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: SURFACE_FORMAT,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![SURFACE_FORMAT],
        };
        surface.configure(&device, &config);

        let ctx = RenderContext::new(device, gpu_queue);
        let mut pipeline = Pipeline2d::prepare(&ctx, SURFACE_FORMAT);
        pipeline.set_viewport(&ctx, config.width as f32, config.height as f32);
        let queue = RenderQueue::create(
            &ctx,
            RenderQueue::DEFAULT_VERTEX_CAPACITY,
            RenderQueue::DEFAULT_INDEX_CAPACITY,
        );

        let mut textures = TextureBindings::new();
        let font = match font_path {
            Some(path) => {
                let data = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
                let font = FontAtlas::new(&ctx, &pipeline, data, 24.0)?;
                if let Some(bind_group) = font.bind_group() {
                    textures.insert(font.texture_id(), bind_group.clone());
                }
                Some(font)
            }
            None => {
                log::info!("no font path given, drawing shapes only");
                None
            }
        };

        Ok(Self {
            window,
            surface,
            config,
            ctx,
            pipeline,
            queue,
            font,
            textures,
            frame: 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.ctx.device, &self.config);
        self.pipeline
            .set_viewport(&self.ctx, self.config.width as f32, self.config.height as f32);
    }

    fn draw(&mut self) -> Result<()> {
        self.frame += 1;
        let t = self.frame as f32 / 60.0;
        let (w, h) = (self.config.width as f32, self.config.height as f32);

        self.queue.clear();
        self.queue.push_gradient_rectangle(
            Position::new(0.0, 0.0),
            Size::new(w, h),
            Color::rgb(30, 30, 60),
            Color::rgb(30, 30, 60),
            Color::rgb(10, 10, 20),
            Color::rgb(10, 10, 20),
            None,
            UvRect::ZERO,
        );
        for i in 0..8u8 {
            let x = 40.0 + i as f32 * 90.0;
            let y = h * 0.5 + (t + i as f32 * 0.7).sin() * 80.0;
            self.queue.push_filled_rectangle(
                Position::new(x, y),
                Size::new(60.0, 60.0),
                Color::rgba(255, 120 + i * 15, 40, 220),
                None,
                UvRect::ZERO,
            );
        }
        self.queue.push_line(
            Position::new(20.0, 20.0),
            Position::new(w - 20.0, h - 20.0),
            Color::rgba(255, 255, 255, 90),
            3.0,
        );

        if let Some(font) = &self.font {
            self.queue
                .push_scissor(Position::new(0.0, 0.0), Size::new(w, h * 0.5));
            self.queue.push_text(
                font.table(),
                Position::new(w * 0.5, 40.0),
                "polonium painter\nclipped to the top half",
                Color::WHITE,
                Align::X_CENTER,
            );
            self.queue
                .push_scissor(Position::new(0.0, 0.0), Size::new(w, h));
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("painter pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.pipeline.begin(&mut rpass);
            self.queue
                .flush(&self.ctx, &mut rpass, &self.pipeline, &self.textures);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[derive(Default)]
struct App {
    painter: Option<Painter>,
    font_path: Option<String>,
}

impl ApplicationHandler<()> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.painter.is_none() {
            match Painter::new(event_loop, self.font_path.clone()) {
                Ok(painter) => self.painter = Some(painter),
                Err(err) => {
                    log::error!("setup failed: {err:#}");
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(painter) = &mut self.painter else {
            return;
        };
        match event {
            WindowEvent::Resized(size) => painter.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if let Err(err) = painter.draw() {
                    log::error!("frame failed: {err:#}");
                }
                painter.window.request_redraw();
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            _ => (),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = App {
        painter: None,
        font_path: std::env::args().nth(1),
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
