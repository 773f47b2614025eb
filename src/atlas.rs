use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::context::RenderContext;
use crate::pipeline::Pipeline2d;
use crate::traits::{ResetPhase, Resettable};
use crate::utils::UvRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasError {
    /// The image does not fit in the remaining atlas space. The atlas never
    /// grows; previously appended entries are unaffected.
    OutOfSpace,
    /// The pixel buffer is shorter than `width * height * 4` bytes.
    SizeMismatch { expected: usize, provided: usize },
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::OutOfSpace => write!(f, "atlas is out of space"),
            AtlasError::SizeMismatch { expected, provided } => write!(
                f,
                "pixel buffer too short: expected {expected} bytes, got {provided}"
            ),
        }
    }
}

impl std::error::Error for AtlasError {}

/// CPU-side bookkeeping for a shelf-packed atlas: the packing cursor plus the
/// id-to-UV table. Kept separate from the GPU texture so the packing
/// algorithm is testable on its own.
///
/// Shelf packing places images left-to-right in rows; when an image doesn't
/// fit horizontally the cursor drops down by the tallest image of the current
/// row and starts a new one.
pub struct AtlasMap {
    width: u32,
    height: u32,
    cursor_x: u32,
    cursor_y: u32,
    shelf_height: u32,
    coords: HashMap<u32, UvRect>,
}

impl AtlasMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cursor_x: 0,
            cursor_y: 0,
            shelf_height: 0,
            coords: HashMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserves a `width` x `height` slot, records its UV rectangle under
    /// `id` and returns the slot's pixel origin. Fails without mutating any
    /// state when the atlas is full.
    pub fn allocate(&mut self, id: u32, width: u32, height: u32) -> Result<(u32, u32), AtlasError> {
        let (mut x, mut y) = (self.cursor_x, self.cursor_y);
        let mut shelf = self.shelf_height;
        if x + width > self.width {
            y += shelf;
            x = 0;
            shelf = 0;
        }
        // A fresh shelf still has to fit the image horizontally.
        if x + width > self.width || y + height > self.height {
            return Err(AtlasError::OutOfSpace);
        }
        self.cursor_x = x + width;
        self.cursor_y = y;
        self.shelf_height = shelf.max(height);

        let w = self.width as f32;
        let h = self.height as f32;
        self.coords.insert(
            id,
            UvRect::new(
                x as f32 / w,
                y as f32 / h,
                (x + width) as f32 / w,
                (y + height) as f32 / h,
            ),
        );
        Ok((x, y))
    }

    pub fn coords(&self, id: u32) -> Option<UvRect> {
        self.coords.get(&id).copied()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.coords.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Back to an empty atlas: cursor at origin, no recorded rectangles.
    pub fn reset(&mut self) {
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.shelf_height = 0;
        self.coords.clear();
    }
}

struct AtlasTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// A fixed-size GPU texture subdivided by shelf packing. Callers append raw
/// RGBA pixel buffers under integer ids and get back normalized UV
/// rectangles to draw with.
///
/// After a device reset the pixel contents are gone: the post-reset phase
/// recreates an empty surface at the same dimensions and callers must
/// re-append their images.
pub struct TextureAtlas {
    id: Uuid,
    map: AtlasMap,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    gpu: Option<AtlasTexture>,
}

impl TextureAtlas {
    pub fn new(ctx: &RenderContext, pipeline: &Pipeline2d, width: u32, height: u32) -> Self {
        let mut atlas = Self {
            id: Uuid::new_v4(),
            map: AtlasMap::new(width, height),
            layout: pipeline.texture_layout().clone(),
            sampler: pipeline.sampler().clone(),
            gpu: None,
        };
        atlas.create_gpu(ctx);
        atlas
    }

    fn create_gpu(&mut self, ctx: &RenderContext) {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Texture Atlas"),
            size: wgpu::Extent3d {
                width: self.map.width(),
                height: self.map.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
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
            label: Some("Atlas Bind Group"),
        });
        self.gpu = Some(AtlasTexture {
            texture,
            bind_group,
        });
    }

    /// Key under which the queue batches draws against this atlas. Register
    /// [`bind_group`](TextureAtlas::bind_group) under this id in the texture
    /// bindings passed to `RenderQueue::flush`.
    pub fn texture_id(&self) -> Uuid {
        self.id
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    /// Shelf-packs one RGBA image (4 bytes per pixel, row-major) and records
    /// its UV rectangle under `id`. The total byte requirement is validated
    /// up front, so a failed append never leaves a partially copied image or
    /// a dangling table entry.
    pub fn append(
        &mut self,
        ctx: &RenderContext,
        id: u32,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<UvRect, AtlasError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() < expected {
            return Err(AtlasError::SizeMismatch {
                expected,
                provided: pixels.len(),
            });
        }
        let (x, y) = self.map.allocate(id, width, height)?;
        if let Some(gpu) = &self.gpu {
            ctx.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x, y, z: 0 },
                    aspect: wgpu::TextureAspect::All,
                },
                &pixels[..expected],
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }
        Ok(self.map.coords(id).expect("rectangle recorded by allocate"))
    }

    pub fn coords(&self, id: u32) -> Option<UvRect> {
        self.map.coords(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.map.contains(id)
    }

}

impl Resettable for TextureAtlas {
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool {
        match phase {
            ResetPhase::Pre => {
                self.gpu = None;
            }
            ResetPhase::Post => {
                // Pixel storage is not preserved across recreation; callers
                // must re-append their images.
                self.map.reset();
                self.create_gpu(ctx);
            }
        }
        true
    }
}
