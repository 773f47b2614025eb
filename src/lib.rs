//! Immediate-mode 2D rendering on wgpu: push rectangles, lines, triangles
//! and text into a [`RenderQueue`] each frame, then flush it as a handful of
//! batched indexed draws.
//!
//! The building blocks are independent: [`TextureAtlas`] shelf-packs images
//! into one texture, [`FontAtlas`] rasterizes a font's coverage into a glyph
//! texture, and [`Pipeline2d`] owns the fixed alpha-blended pipeline state
//! they all render through. [`DoubleQueue`] pairs two queues for a
//! fill-one/flush-the-other frame loop.

pub mod atlas;
pub mod buffer;
pub mod context;
pub mod double_queue;
pub mod pipeline;
pub mod queue;
pub mod text;
pub mod traits;
pub mod utils;

pub use atlas::{AtlasError, AtlasMap, TextureAtlas};
pub use buffer::GrowBuffer;
pub use context::RenderContext;
pub use double_queue::DoubleQueue;
pub use pipeline::Pipeline2d;
pub use queue::{DrawCall, RenderQueue, TextureBindings};
pub use text::{Align, FontAtlas, FontError, GlyphTable};
pub use traits::{reset_all, ResetPhase, Resettable};
pub use utils::{Color, Position, Rectangle, Size, UvRect, Vertex};
