use std::collections::HashMap;

use uuid::Uuid;

use crate::buffer::GrowBuffer;
use crate::context::RenderContext;
use crate::pipeline::Pipeline2d;
use crate::text::{Align, GlyphTable};
use crate::traits::{ResetPhase, Resettable};
use crate::utils::{Color, Position, Size, UvRect, Vertex};

/// Texture bindings the flush resolves drawcall texture keys against.
/// Atlases and font atlases register their bind groups here under their
/// `texture_id`; a missing or `None` key falls back to the pipeline's white
/// texture (untextured drawing).
pub type TextureBindings = HashMap<Uuid, wgpu::BindGroup>;

/// One unit of GPU work in submission order: an indexed triangle draw, a
/// sticky scissor change, or a pipeline rebind.
#[derive(Debug, Clone)]
pub enum DrawCall {
    Triangles {
        texture: Option<Uuid>,
        vertices: u32,
        indices: u32,
        primitives: u32,
    },
    /// Applies until the next scissor call; there is no implicit push/pop.
    Scissor { position: Position, size: Size },
    Pipeline(wgpu::RenderPipeline),
}

/// Accumulates 2D draw primitives into vertex/index buffers and a drawcall
/// list, merging consecutive same-texture geometry into single draws.
///
/// Batching is greedy and local: only the immediately preceding drawcall is
/// considered, so submission order — which matters for overlapping
/// alpha-blended geometry — is preserved exactly.
///
/// `new` builds a CPU-only queue; attach GPU buffers with
/// [`create_gpu`](RenderQueue::create_gpu) (or use
/// [`create`](RenderQueue::create)) before flushing. `push_*` may run on a
/// producer thread; `create_gpu`, `sync` and `flush` belong to the render
/// thread.
pub struct RenderQueue {
    vertices: GrowBuffer<Vertex>,
    indices: GrowBuffer<u16>,
    drawcalls: Vec<DrawCall>,
    dirty: bool,
}

impl RenderQueue {
    pub const DEFAULT_VERTEX_CAPACITY: usize = 32767;
    pub const DEFAULT_INDEX_CAPACITY: usize = 65535;

    /// Largest vertex count one drawcall can hold with `u16` indices.
    const MAX_BATCH_VERTICES: u32 = 1 << 16;

    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        Self {
            vertices: GrowBuffer::new(
                max_vertices,
                wgpu::BufferUsages::VERTEX,
                "Queue Vertex Buffer",
            ),
            indices: GrowBuffer::new(
                max_indices,
                wgpu::BufferUsages::INDEX,
                "Queue Index Buffer",
            ),
            drawcalls: Vec::new(),
            dirty: false,
        }
    }

    pub fn create(ctx: &RenderContext, max_vertices: usize, max_indices: usize) -> Self {
        let mut queue = Self::new(max_vertices, max_indices);
        queue.create_gpu(ctx);
        queue
    }

    /// Index base for `incoming` vertices about to be pushed:
    /// `Some(vertex_count)` when the last drawcall is a triangle batch with
    /// the identical texture key and room left in the `u16` index range,
    /// `None` when a fresh drawcall is needed.
    fn batch_base(&self, texture: Option<Uuid>, incoming: u32) -> Option<u32> {
        match self.drawcalls.last() {
            Some(DrawCall::Triangles {
                texture: last,
                vertices,
                ..
            }) if *last == texture && *vertices + incoming <= Self::MAX_BATCH_VERTICES => {
                Some(*vertices)
            }
            _ => None,
        }
    }

    /// Extends the last drawcall or appends a new one, and marks the GPU
    /// buffers stale.
    fn commit(
        &mut self,
        batched: bool,
        vertices: u32,
        indices: u32,
        primitives: u32,
        texture: Option<Uuid>,
    ) {
        if batched {
            match self.drawcalls.last_mut() {
                Some(DrawCall::Triangles {
                    vertices: v,
                    indices: i,
                    primitives: p,
                    ..
                }) => {
                    *v += vertices;
                    *i += indices;
                    *p += primitives;
                }
                _ => unreachable!("batch_base only matches a trailing triangle call"),
            }
        } else {
            self.drawcalls.push(DrawCall::Triangles {
                texture,
                vertices,
                indices,
                primitives,
            });
        }
        self.dirty = true;
    }

    /// Rectangle with an independently colored corner per vertex (c1 top
    /// left, c2 top right, c3 bottom left, c4 bottom right). Positions are
    /// floored to pixel boundaries.
    #[allow(clippy::too_many_arguments)]
    pub fn push_gradient_rectangle(
        &mut self,
        position: Position,
        size: Size,
        c1: Color,
        c2: Color,
        c3: Color,
        c4: Color,
        texture: Option<Uuid>,
        uv: UvRect,
    ) {
        self.vertices.ensure(4);
        self.indices.ensure(6);

        let base = self.batch_base(texture, 4);
        let first = base.unwrap_or(0) as u16;

        let (x0, y0) = (position.x.floor(), position.y.floor());
        let (x1, y1) = (
            (position.x + size.width).floor(),
            (position.y + size.height).floor(),
        );
        self.vertices.extend_from_slice(&[
            Vertex::new(x0, y0, c1, uv.u_min, uv.v_min),
            Vertex::new(x1, y0, c2, uv.u_max, uv.v_min),
            Vertex::new(x1, y1, c4, uv.u_max, uv.v_max),
            Vertex::new(x0, y1, c3, uv.u_min, uv.v_max),
        ]);
        self.indices.extend_from_slice(&[
            first,
            first + 1,
            first + 3,
            first + 3,
            first + 2,
            first + 1,
        ]);

        self.commit(base.is_some(), 4, 6, 2, texture);
    }

    /// A filled rectangle is a gradient rectangle with one color everywhere.
    pub fn push_filled_rectangle(
        &mut self,
        position: Position,
        size: Size,
        color: Color,
        texture: Option<Uuid>,
        uv: UvRect,
    ) {
        self.push_gradient_rectangle(position, size, color, color, color, color, texture, uv);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push_filled_triangle(
        &mut self,
        p1: Position,
        p2: Position,
        p3: Position,
        c1: Color,
        c2: Color,
        c3: Color,
        texture: Option<Uuid>,
        uvs: [Position; 3],
    ) {
        self.vertices.ensure(3);
        self.indices.ensure(3);

        let base = self.batch_base(texture, 3);
        let first = base.unwrap_or(0) as u16;

        self.vertices.extend_from_slice(&[
            Vertex::new(p1.x.floor(), p1.y.floor(), c1, uvs[0].x, uvs[0].y),
            Vertex::new(p2.x.floor(), p2.y.floor(), c2, uvs[1].x, uvs[1].y),
            Vertex::new(p3.x.floor(), p3.y.floor(), c3, uvs[2].x, uvs[2].y),
        ]);
        self.indices
            .extend_from_slice(&[first, first + 1, first + 2]);

        self.commit(base.is_some(), 3, 3, 1, texture);
    }

    /// A line is a thin untextured quad: the endpoints offset by a
    /// perpendicular half-width vector.
    pub fn push_line(&mut self, p1: Position, p2: Position, color: Color, width: f32) {
        self.vertices.ensure(4);
        self.indices.ensure(6);

        let base = self.batch_base(None, 4);
        let first = base.unwrap_or(0) as u16;

        let delta = p2 - p1;
        let length = (delta.x * delta.x + delta.y * delta.y).sqrt() + f32::EPSILON;
        let scale = width / (2.0 * length);
        let radius = Position::new(-scale * delta.y, scale * delta.x);

        self.vertices.extend_from_slice(&[
            Vertex::new(p1.x - radius.x, p1.y - radius.y, color, 0.0, 0.0),
            Vertex::new(p1.x + radius.x, p1.y + radius.y, color, 1.0, 0.0),
            Vertex::new(p2.x - radius.x, p2.y - radius.y, color, 1.0, 1.0),
            Vertex::new(p2.x + radius.x, p2.y + radius.y, color, 0.0, 1.0),
        ]);
        self.indices.extend_from_slice(&[
            first,
            first + 1,
            first + 2,
            first + 2,
            first + 3,
            first + 1,
        ]);

        self.commit(base.is_some(), 4, 6, 2, None);
    }

    /// Lays out and pushes one string as glyph quads, all batched into the
    /// font texture's drawcall where possible.
    ///
    /// Newlines reset x and advance y by one row height; control characters
    /// are skipped; spaces advance the pen without geometry; glyphs the font
    /// doesn't cover are skipped entirely. Alignment flags shift the start
    /// position by the pre-measured extent.
    pub fn push_text(
        &mut self,
        font: &GlyphTable,
        position: Position,
        text: &str,
        color: Color,
        align: Align,
    ) {
        // Pessimistic reservation: every char as a full quad, so layout can
        // run in a single pass.
        let chars = text.chars().count();
        self.vertices.ensure(chars * 4);
        self.indices.ensure(chars * 6);

        let texture = Some(font.texture_id());
        let base = self.batch_base(texture, 4);
        let mut merge = base.is_some();
        let mut first = base.unwrap_or(0);

        let mut pen = position;
        if !align.is_empty() {
            let extent = font.text_extent(text);
            if align.contains(Align::X_CENTER) {
                pen.x -= (0.5 * extent.width).floor();
            } else if align.contains(Align::X_RIGHT) {
                pen.x -= extent.width.floor();
            }
            if align.contains(Align::Y_CENTER) {
                pen.y -= (0.5 * extent.height).floor();
            } else if align.contains(Align::Y_BOTTOM) {
                pen.y -= extent.height.floor();
            }
        }

        // The recorded UVs carry a spacing inset on the left edge; shift the
        // pen so the first glyph's ink starts at the requested position.
        pen.x -= font.spacing() as f32 / font.scale();
        let start_x = pen.x;
        let row_height = font.row_height();

        let mut vertices = 0u32;
        let mut indices = 0u32;
        let mut primitives = 0u32;

        for c in text.chars() {
            if c == '\n' {
                pen.x = start_x;
                pen.y += row_height;
                continue;
            }
            if c < ' ' {
                continue;
            }
            let Some(uv) = font.coords(c) else {
                continue;
            };
            let (w, h) = font.cell_size(uv);

            if c != ' ' {
                // Long runs split before the quad would leave the u16
                // index range.
                if first + vertices + 4 > Self::MAX_BATCH_VERTICES {
                    self.commit(merge, vertices, indices, primitives, texture);
                    merge = false;
                    first = 0;
                    vertices = 0;
                    indices = 0;
                    primitives = 0;
                }
                let quad_first = (first + vertices) as u16;
                let (x, y) = (pen.x - 0.5, pen.y - 0.5);
                self.vertices.extend_from_slice(&[
                    Vertex::new(x, y + h, color, uv.u_min, uv.v_max),
                    Vertex::new(x, y, color, uv.u_min, uv.v_min),
                    Vertex::new(x + w, y + h, color, uv.u_max, uv.v_max),
                    Vertex::new(x + w, y, color, uv.u_max, uv.v_min),
                ]);
                self.indices.extend_from_slice(&[
                    quad_first,
                    quad_first + 1,
                    quad_first + 2,
                    quad_first + 3,
                    quad_first + 2,
                    quad_first + 1,
                ]);
                vertices += 4;
                indices += 6;
                primitives += 2;
            }

            pen.x += font.advance(uv);
        }

        // Nothing drawable (empty string, all spaces) leaves no empty
        // drawcall behind.
        if vertices > 0 {
            self.commit(merge, vertices, indices, primitives, texture);
        }
    }

    /// Clips subsequent drawcalls to a rectangle. Never merged with adjacent
    /// geometry and stays in effect until the next scissor call; push the
    /// previous rectangle explicitly to restore it.
    pub fn push_scissor(&mut self, position: Position, size: Size) {
        self.drawcalls.push(DrawCall::Scissor { position, size });
    }

    /// Rebinds the render pipeline for subsequent drawcalls. Always its own
    /// entry.
    pub fn push_pipeline(&mut self, pipeline: wgpu::RenderPipeline) {
        self.drawcalls.push(DrawCall::Pipeline(pipeline));
    }

    /// Resets logical sizes and the drawcall list for per-frame reuse.
    /// Capacity — CPU and GPU — is retained.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.drawcalls.clear();
    }

    pub fn drawcalls(&self) -> &[DrawCall] {
        &self.drawcalls
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    pub fn index_capacity(&self) -> usize {
        self.indices.capacity()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn vertex_data(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    pub fn index_data(&self) -> &[u16] {
        self.indices.as_slice()
    }

    /// Render thread only: creates the GPU buffer pair at the recorded
    /// capacities.
    pub fn create_gpu(&mut self, ctx: &RenderContext) {
        self.vertices.create_gpu(ctx);
        self.indices.create_gpu(ctx);
    }

    /// Render thread only: re-uploads CPU data, recreating any GPU buffer
    /// whose capacity grew since the last sync.
    pub fn sync(&mut self, ctx: &RenderContext) {
        self.vertices.sync(ctx);
        self.indices.sync(ctx);
        self.dirty = false;
    }

    /// Issues the recorded drawcalls into a render pass. No-op when the
    /// drawcall list is empty. `pipeline.begin` must have run on the pass
    /// (or an equivalent pipeline must be bound).
    pub fn flush<'a>(
        &'a mut self,
        ctx: &RenderContext,
        rpass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a Pipeline2d,
        textures: &'a TextureBindings,
    ) {
        if self.drawcalls.is_empty() {
            return;
        }
        let Some(white) = pipeline.white_bind_group() else {
            log::warn!("flush skipped: pipeline GPU state released, awaiting reset");
            return;
        };
        if self.dirty || self.vertices.gpu().is_none() || self.indices.gpu().is_none() {
            self.sync(ctx);
        }

        let vertex_buffer = self.vertices.gpu().expect("synced above");
        let index_buffer = self.indices.gpu().expect("synced above");
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
        rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        let mut vertex_offset = 0u32;
        let mut index_offset = 0u32;

        for call in &self.drawcalls {
            match call {
                DrawCall::Triangles {
                    texture,
                    vertices,
                    indices,
                    ..
                } => {
                    let bind_group = texture.and_then(|id| textures.get(&id)).unwrap_or(white);
                    rpass.set_bind_group(0, bind_group, &[]);
                    rpass.draw_indexed(
                        index_offset..index_offset + indices,
                        vertex_offset as i32,
                        0..1,
                    );
                    vertex_offset += vertices;
                    index_offset += indices;
                }
                DrawCall::Scissor { position, size } => {
                    let x = position.x.max(0.0) as u32;
                    let y = position.y.max(0.0) as u32;
                    rpass.set_scissor_rect(
                        x,
                        y,
                        size.width.max(0.0) as u32,
                        size.height.max(0.0) as u32,
                    );
                }
                DrawCall::Pipeline(pipeline) => {
                    rpass.set_pipeline(pipeline);
                }
            }
        }
    }
}

impl Resettable for RenderQueue {
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool {
        match phase {
            ResetPhase::Pre => {
                self.vertices.release_gpu();
                self.indices.release_gpu();
            }
            ResetPhase::Post => {
                self.create_gpu(ctx);
                self.dirty = true;
            }
        }
        true
    }
}
