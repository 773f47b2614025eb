use std::borrow::Cow;

use crate::context::RenderContext;
use crate::traits::{ResetPhase, Resettable};
use crate::utils::Vertex;

struct PipelineGpu {
    pipeline: wgpu::RenderPipeline,
    screen_buffer: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    white_bind_group: wgpu::BindGroup,
}

/// The fixed render state every queue flush assumes: premultiplied-style
/// alpha blending with separate color/alpha factors, no depth test or write,
/// no culling, bilinear filtering with wrap addressing, and a screen-size
/// uniform that maps pixel coordinates to clip space in the vertex shader.
///
/// Re-invoke [`begin`](Pipeline2d::begin) on a pass whenever external code
/// may have bound a different pipeline or bind groups.
pub struct Pipeline2d {
    format: wgpu::TextureFormat,
    viewport: [f32; 2],
    texture_layout: wgpu::BindGroupLayout,
    screen_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    gpu: Option<PipelineGpu>,
}

impl Pipeline2d {
    pub fn prepare(ctx: &RenderContext, format: wgpu::TextureFormat) -> Self {
        let texture_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("texture_bind_group_layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let screen_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("screen_bind_group_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<[f32; 4]>() as _,
                            ),
                        },
                        count: None,
                    }],
                });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Pipeline Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut pipeline = Self {
            format,
            viewport: [1.0, 1.0],
            texture_layout,
            screen_layout,
            sampler,
            gpu: None,
        };
        pipeline.create_gpu(ctx);
        pipeline
    }

    fn create_gpu(&mut self, ctx: &RenderContext) {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("2D Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "../shaders/shader.wgsl"
                ))),
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("2D Pipeline Layout"),
                bind_group_layouts: &[&self.texture_layout, &self.screen_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("2D Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState {
                            color: wgpu::BlendComponent {
                                src_factor: wgpu::BlendFactor::SrcAlpha,
                                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                                operation: wgpu::BlendOperation::Add,
                            },
                            alpha: wgpu::BlendComponent {
                                src_factor: wgpu::BlendFactor::One,
                                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                                operation: wgpu::BlendOperation::Add,
                            },
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let screen_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen Uniform"),
            size: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let screen_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.screen_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
            label: Some("Screen Bind Group"),
        });

        // A 1x1 white texture backs untextured drawcalls, so the fragment
        // shader has a single path.
        let white = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("White Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &white,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0xff; 4],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let white_view = white.create_view(&wgpu::TextureViewDescriptor::default());
        let white_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&white_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some("White Bind Group"),
        });

        self.gpu = Some(PipelineGpu {
            pipeline,
            screen_buffer,
            screen_bind_group,
            white_bind_group,
        });
        self.upload_viewport(ctx);
    }

    fn upload_viewport(&self, ctx: &RenderContext) {
        if let Some(gpu) = &self.gpu {
            let data = [self.viewport[0], self.viewport[1], 0.0, 0.0];
            ctx.queue
                .write_buffer(&gpu.screen_buffer, 0, bytemuck::bytes_of(&data));
        }
    }

    /// Records the render target size in pixels. Must be called before the
    /// first frame and on every resize; positions pushed into queues are in
    /// this pixel space.
    pub fn set_viewport(&mut self, ctx: &RenderContext, width: f32, height: f32) {
        self.viewport = [width.max(1.0), height.max(1.0)];
        self.upload_viewport(ctx);
    }

    /// Binds the pipeline and the screen uniform on a pass. Call once per
    /// pass before flushing queues into it.
    pub fn begin<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        if let Some(gpu) = &self.gpu {
            rpass.set_pipeline(&gpu.pipeline);
            rpass.set_bind_group(1, &gpu.screen_bind_group, &[]);
        }
    }

    /// Layout shared by every texture this pipeline samples; atlases build
    /// their bind groups against it.
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Fallback binding for drawcalls without a texture key. `None` between
    /// a `Pre` and `Post` reset; queue flushes skip in that window.
    pub fn white_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.white_bind_group)
    }

    /// A clone of the underlying pipeline, for `RenderQueue::push_pipeline`
    /// to restore after a mid-queue pipeline switch.
    pub fn render_pipeline(&self) -> Option<wgpu::RenderPipeline> {
        self.gpu.as_ref().map(|gpu| gpu.pipeline.clone())
    }
}

impl Resettable for Pipeline2d {
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool {
        match phase {
            ResetPhase::Pre => {
                self.gpu = None;
            }
            ResetPhase::Post => {
                self.create_gpu(ctx);
            }
        }
        true
    }
}
