use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use rusttype::{point, Font, Scale};
use uuid::Uuid;

use crate::context::RenderContext;
use crate::pipeline::Pipeline2d;
use crate::traits::{ResetPhase, Resettable};
use crate::utils::{Size, UvRect};

#[derive(Debug)]
pub enum FontError {
    /// The byte buffer is not a parseable font.
    InvalidFontData,
    /// The font declares no drawable glyphs.
    NoGlyphs,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::InvalidFontData => write!(f, "invalid font data"),
            FontError::NoGlyphs => write!(f, "font declares no drawable glyphs"),
        }
    }
}

impl std::error::Error for FontError {}

bitflags! {
    /// Text alignment relative to the anchor position. X and Y flags combine
    /// independently; empty means top-left.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Align: u16 {
        const X_LEFT = 1 << 0;
        const X_CENTER = 1 << 1;
        const X_RIGHT = 1 << 2;
        const Y_TOP = 1 << 3;
        const Y_CENTER = 1 << 4;
        const Y_BOTTOM = 1 << 5;
    }
}

/// Glyph-to-UV lookup for one rasterized font, plus the constants needed to
/// turn those UVs back into on-screen glyph cells: atlas dimensions, the
/// inter-glyph spacing inset baked into every rectangle, and the scale
/// factor applied when the font had to be shrunk to fit the hardware's
/// texture limit.
///
/// This is pure CPU state; `RenderQueue::push_text` and `text_extent` work
/// entirely from it.
pub struct GlyphTable {
    texture_id: Uuid,
    coords: HashMap<char, UvRect>,
    width: u32,
    height: u32,
    spacing: u32,
    scale: f32,
}

impl GlyphTable {
    pub fn new(texture_id: Uuid, width: u32, height: u32, spacing: u32, scale: f32) -> Self {
        Self {
            texture_id,
            coords: HashMap::new(),
            width,
            height,
            spacing,
            scale,
        }
    }

    pub fn insert(&mut self, c: char, uv: UvRect) {
        self.coords.insert(c, uv);
    }

    /// UV rectangle for a glyph, or `None` when the font doesn't cover it.
    /// Draw paths skip uncovered glyphs; this is the explicit miss signal.
    pub fn coords(&self, c: char) -> Option<UvRect> {
        self.coords.get(&c).copied()
    }

    pub fn contains(&self, c: char) -> bool {
        self.coords.contains_key(&c)
    }

    pub fn texture_id(&self) -> Uuid {
        self.texture_id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Scale shrink applied during rasterization; on-screen sizes are the
    /// atlas cell sizes divided by this. 1.0 unless the atlas hit the
    /// hardware texture limit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// On-screen glyph cell size for a recorded UV rectangle (includes the
    /// spacing inset on both horizontal edges).
    pub fn cell_size(&self, uv: UvRect) -> (f32, f32) {
        (
            uv.width() * self.width as f32 / self.scale,
            uv.height() * self.height as f32 / self.scale,
        )
    }

    /// Horizontal pen advance for a glyph: its cell width minus the spacing
    /// inset on both sides.
    pub fn advance(&self, uv: UvRect) -> f32 {
        (uv.width() * self.width as f32 - 2.0 * self.spacing as f32) / self.scale
    }

    /// Every cell shares the font's line height, so any recorded glyph can
    /// serve as the reference; space is always covered.
    pub fn row_height(&self) -> f32 {
        let uv = self
            .coords(' ')
            .or_else(|| self.coords.values().next().copied())
            .unwrap_or(UvRect::ZERO);
        uv.height() * self.height as f32 / self.scale
    }

    /// Bounding box of `text` laid out the way `push_text` draws it: width
    /// is the widest line, height accumulates one row per line including the
    /// first. Nothing is drawn.
    pub fn text_extent(&self, text: &str) -> Size {
        let row_height = self.row_height();
        let mut row_width = 0.0f32;
        let mut width = 0.0f32;
        let mut height = row_height;

        for c in text.chars() {
            if c == '\n' {
                row_width = 0.0;
                height += row_height;
                continue;
            }
            if c < ' ' {
                continue;
            }
            let Some(uv) = self.coords(c) else { continue };
            row_width += self.advance(uv);
            if row_width > width {
                width = row_width;
            }
        }

        Size::new(width, height)
    }
}

/// One glyph's packed slot in the atlas: pixel origin plus cell width. Cell
/// height is uniform (the font's line height).
struct GlyphSlot {
    c: char,
    x: u32,
    y: u32,
    width: u32,
}

/// Packs glyph cells left-to-right with `spacing` margins, wrapping rows at
/// the atlas edge. Returns `None` when the atlas is too small — the sizing
/// loop reacts by doubling the atlas or shrinking the font.
fn layout_glyphs(
    widths: &[(char, u32)],
    cell_height: u32,
    spacing: u32,
    dim: u32,
) -> Option<Vec<GlyphSlot>> {
    let mut slots = Vec::with_capacity(widths.len());
    let mut x = spacing;
    let mut y = 0u32;

    for &(c, width) in widths {
        if x + width + spacing > dim {
            x = spacing;
            y += cell_height + 1;
        }
        if y + cell_height > dim {
            return None;
        }
        slots.push(GlyphSlot { c, x, y, width });
        x += width + 2 * spacing;
    }

    Some(slots)
}

struct GlyphTexture {
    bind_group: wgpu::BindGroup,
}

/// Rasterizes a font's full declared coverage into a square power-of-two
/// glyph atlas and owns the resulting GPU texture.
///
/// The texture stores white pixels with glyph coverage as alpha; text color
/// comes entirely from vertex color modulation at draw time. When the
/// required atlas would exceed the device's texture limit, the font is
/// rendered at a reduced scale instead and the factor is recorded on the
/// [`GlyphTable`].
pub struct FontAtlas {
    font: Font<'static>,
    px_height: f32,
    table: GlyphTable,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    gpu: Option<GlyphTexture>,
}

impl FontAtlas {
    pub fn new(
        ctx: &RenderContext,
        pipeline: &Pipeline2d,
        font_data: Vec<u8>,
        px_height: f32,
    ) -> Result<Self, FontError> {
        let font = Font::try_from_vec(font_data).ok_or(FontError::InvalidFontData)?;
        let mut atlas = Self {
            font,
            px_height,
            table: GlyphTable::new(Uuid::new_v4(), 0, 0, 0, 1.0),
            layout: pipeline.texture_layout().clone(),
            sampler: pipeline.sampler().clone(),
            gpu: None,
        };
        atlas.rasterize(ctx)?;
        Ok(atlas)
    }

    pub fn table(&self) -> &GlyphTable {
        &self.table
    }

    pub fn texture_id(&self) -> Uuid {
        self.table.texture_id()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    pub fn text_extent(&self, text: &str) -> Size {
        self.table.text_extent(text)
    }

    /// Every BMP code point the font maps to a real glyph. The cmap decides
    /// coverage; anything outside it is silently skipped at draw time.
    fn coverage(&self) -> Vec<char> {
        (0x20u32..=0xFFFF)
            .filter_map(char::from_u32)
            .filter(|&c| self.font.glyph(c).id().0 != 0)
            .collect()
    }

    fn rasterize(&mut self, ctx: &RenderContext) -> Result<(), FontError> {
        let coverage = self.coverage();
        if coverage.is_empty() {
            return Err(FontError::NoGlyphs);
        }

        let max_dim = ctx.max_texture_dimension();
        let mut dim = 128u32.min(max_dim);
        let mut scale_factor = 1.0f32;

        // Dry-run sizing: double the atlas until the coverage fits, then
        // clamp at the hardware limit and shrink the font instead.
        let (slots, cell_height, spacing) = loop {
            let scale = Scale::uniform(self.px_height * scale_factor);
            let v = self.font.v_metrics(scale);
            let cell_height = (v.ascent - v.descent).ceil().max(1.0) as u32;
            let spacing = (cell_height as f32 * 0.3).ceil() as u32;
            let widths: Vec<(char, u32)> = coverage
                .iter()
                .map(|&c| {
                    let advance = self.font.glyph(c).scaled(scale).h_metrics().advance_width;
                    (c, advance.ceil().max(1.0) as u32)
                })
                .collect();

            if let Some(slots) = layout_glyphs(&widths, cell_height, spacing, dim) {
                break (slots, cell_height, spacing);
            }

            if dim.saturating_mul(2) <= max_dim {
                dim *= 2;
            } else if scale_factor == 1.0 {
                scale_factor = max_dim as f32 / (dim as f32 * 2.0);
                dim = max_dim;
                log::warn!(
                    "glyph atlas clamped to {max_dim}px, shrinking font scale to {scale_factor:.3}"
                );
            } else {
                scale_factor *= 0.9;
            }
        };

        // Real pass: draw each glyph into its packed slot and record UVs
        // with the spacing inset.
        let scale = Scale::uniform(self.px_height * scale_factor);
        let ascent = self.font.v_metrics(scale).ascent;
        let mut bitmap = vec![0u8; (dim * dim) as usize];
        let mut table = GlyphTable::new(self.table.texture_id(), dim, dim, spacing, scale_factor);

        for slot in &slots {
            let glyph = self
                .font
                .glyph(slot.c)
                .scaled(scale)
                .positioned(point(slot.x as f32, slot.y as f32 + ascent));
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let px = bb.min.x + gx as i32;
                    let py = bb.min.y + gy as i32;
                    if px >= 0 && py >= 0 && (px as u32) < dim && (py as u32) < dim {
                        let idx = (py as u32 * dim + px as u32) as usize;
                        bitmap[idx] = bitmap[idx].max((v * 255.0) as u8);
                    }
                });
            }
            table.insert(
                slot.c,
                UvRect::new(
                    (slot.x - spacing) as f32 / dim as f32,
                    slot.y as f32 / dim as f32,
                    (slot.x + slot.width + spacing) as f32 / dim as f32,
                    (slot.y + cell_height) as f32 / dim as f32,
                ),
            );
        }

        // White RGB with coverage as alpha; draw calls modulate by vertex
        // color.
        let mut pixels = vec![255u8; (dim * dim * 4) as usize];
        for (i, &alpha) in bitmap.iter().enumerate() {
            pixels[i * 4 + 3] = alpha;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph Atlas"),
            size: wgpu::Extent3d {
                width: dim,
                height: dim,
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
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(dim * 4),
                rows_per_image: Some(dim),
            },
            wgpu::Extent3d {
                width: dim,
                height: dim,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some("Glyph Atlas Bind Group"),
        });

        self.table = table;
        self.gpu = Some(GlyphTexture { bind_group });
        Ok(())
    }
}

impl Resettable for FontAtlas {
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool {
        match phase {
            ResetPhase::Pre => {
                self.gpu = None;
                true
            }
            // Full re-rasterization; hosts should avoid per-frame resets.
            ResetPhase::Post => self.rasterize(ctx).is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_wraps_and_rejects_overflow() {
        let widths = [('a', 10), ('b', 10), ('c', 10)];
        // dim 30, spacing 2: 'a' at x=2, 'b' at x=16, then 'c' would start
        // at x=30 and wraps to the next row.
        let slots = layout_glyphs(&widths, 8, 2, 30).unwrap();
        assert_eq!((slots[0].x, slots[0].y), (2, 0));
        assert_eq!((slots[1].x, slots[1].y), (16, 0));
        assert_eq!((slots[2].x, slots[2].y), (2, 9));

        assert!(layout_glyphs(&widths, 16, 2, 30).is_none());
    }
}
