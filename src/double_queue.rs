use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::RenderContext;
use crate::pipeline::Pipeline2d;
use crate::queue::{RenderQueue, TextureBindings};
use crate::traits::{ResetPhase, Resettable};

/// Two render queues behind one atomic toggle: one side accepts pushes while
/// the other is flushed, then [`swap`](DoubleQueue::swap) exchanges the roles.
///
/// This is a single-producer/single-consumer handoff, not a general
/// concurrent queue. The toggle is the only synchronization: the producer
/// must finish pushing and call `swap` before the consumer flushes the
/// newly completed side. To drive the two sides from different threads, wrap
/// the pair in the sharing primitive of your choice and hand each thread its
/// half via [`split`](DoubleQueue::split) after every swap.
pub struct DoubleQueue {
    queues: [RenderQueue; 2],
    flip: AtomicBool,
}

impl DoubleQueue {
    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        Self {
            queues: [
                RenderQueue::new(max_vertices, max_indices),
                RenderQueue::new(max_vertices, max_indices),
            ],
            flip: AtomicBool::new(false),
        }
    }

    pub fn create(ctx: &RenderContext, max_vertices: usize, max_indices: usize) -> Self {
        let mut queues = Self::new(max_vertices, max_indices);
        queues.create_gpu(ctx);
        queues
    }

    fn flush_index(&self) -> usize {
        self.flip.load(Ordering::Acquire) as usize
    }

    /// The write target: the side producers push into. Always the opposite of
    /// what [`flush`](DoubleQueue::flush) drains.
    pub fn queue(&mut self) -> &mut RenderQueue {
        &mut self.queues[1 - self.flush_index()]
    }

    /// Both sides at once, write target first. For callers that interleave
    /// filling and draining on one thread, or that fan the halves out to two.
    pub fn split(&mut self) -> (&mut RenderQueue, &mut RenderQueue) {
        let flush = self.flush_index();
        let (a, b) = self.queues.split_at_mut(1);
        if flush == 0 {
            (&mut b[0], &mut a[0])
        } else {
            (&mut a[0], &mut b[0])
        }
    }

    /// Exchanges write and flush targets. A single atomic flip; the producer
    /// must be done pushing before the consumer flushes the swapped-in side.
    pub fn swap(&self) {
        self.flip.fetch_xor(true, Ordering::AcqRel);
    }

    /// Flushes the side most recently completed by a swap.
    pub fn flush<'a>(
        &'a mut self,
        ctx: &RenderContext,
        rpass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a Pipeline2d,
        textures: &'a TextureBindings,
    ) {
        let flush = self.flush_index();
        self.queues[flush].flush(ctx, rpass, pipeline, textures);
    }

    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }

    pub fn create_gpu(&mut self, ctx: &RenderContext) {
        for queue in &mut self.queues {
            queue.create_gpu(ctx);
        }
    }
}

impl Resettable for DoubleQueue {
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool {
        let mut ok = true;
        for queue in &mut self.queues {
            ok &= queue.reset(ctx, phase);
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Color, Position, Size, UvRect};

    #[test]
    fn swap_exchanges_write_and_flush_targets() {
        let mut queues = DoubleQueue::new(8, 12);
        queues.queue().push_filled_rectangle(
            Position::new(0.0, 0.0),
            Size::new(10.0, 10.0),
            Color::WHITE,
            None,
            UvRect::ZERO,
        );
        assert_eq!(queues.queue().vertex_count(), 4);

        queues.swap();
        // The filled side is now the flush target; the write target is empty.
        assert_eq!(queues.queue().vertex_count(), 0);
        let (write, flush) = queues.split();
        assert_eq!(write.vertex_count(), 0);
        assert_eq!(flush.vertex_count(), 4);

        queues.swap();
        assert_eq!(queues.queue().vertex_count(), 4);
    }
}
