use crate::context::RenderContext;

/// A typed growable CPU buffer paired with a GPU buffer of matching capacity.
///
/// Capacity is counted in elements and only ever grows, by doubling. Growth
/// on the CPU side may happen from any thread; the GPU buffer is never
/// touched there — a pending-reallocation flag records that it must be
/// recreated the next time [`sync`](GrowBuffer::sync) runs on the render
/// thread.
pub struct GrowBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    label: &'static str,
    usage: wgpu::BufferUsages,
    gpu: Option<wgpu::Buffer>,
    realloc_pending: bool,
}

impl<T: bytemuck::Pod> GrowBuffer<T> {
    pub fn new(capacity: usize, usage: wgpu::BufferUsages, label: &'static str) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            gpu: None,
            realloc_pending: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Guarantees room for `additional` more elements, doubling capacity
    /// until it fits. Existing contents are preserved. Allocation goes
    /// through `Vec::reserve_exact`, which aborts on failure rather than
    /// letting a later write land out of bounds.
    pub fn ensure(&mut self, additional: usize) {
        let required = self.data.len() + additional;
        if required <= self.capacity {
            return;
        }
        let old = self.capacity;
        while self.capacity < required {
            self.capacity *= 2;
        }
        self.data.reserve_exact(self.capacity - self.data.len());
        self.realloc_pending = true;
        log::debug!(
            "{}: capacity {} -> {} ({} elements pending)",
            self.label,
            old,
            self.capacity,
            required
        );
    }

    /// Appends elements. Callers must have reserved space with
    /// [`ensure`](GrowBuffer::ensure) first.
    pub fn extend_from_slice(&mut self, items: &[T]) {
        debug_assert!(self.data.len() + items.len() <= self.capacity);
        self.data.extend_from_slice(items);
    }

    /// Resets the logical size to zero. Capacity, CPU allocation and the GPU
    /// buffer are all retained for reuse.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn gpu(&self) -> Option<&wgpu::Buffer> {
        self.gpu.as_ref()
    }

    /// Render thread only: creates the GPU buffer at the current capacity.
    pub fn create_gpu(&mut self, ctx: &RenderContext) {
        let size = (self.capacity * std::mem::size_of::<T>()) as wgpu::BufferAddress;
        let align = wgpu::COPY_BUFFER_ALIGNMENT;
        let size = size.div_ceil(align) * align;
        self.gpu = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size,
            usage: self.usage,
            mapped_at_creation: false,
        }));
        self.realloc_pending = false;
    }

    pub fn release_gpu(&mut self) {
        self.gpu = None;
    }

    /// Render thread only: recreates the GPU buffer if a growth flagged it
    /// (or it was never created), then uploads the used region in one write.
    pub fn sync(&mut self, ctx: &RenderContext) {
        if self.realloc_pending || self.gpu.is_none() {
            self.create_gpu(ctx);
        }
        if self.data.is_empty() {
            return;
        }
        let buffer = self.gpu.as_ref().expect("gpu buffer just ensured");
        let bytes = bytemuck::cast_slice(&self.data);
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if bytes.len() % align == 0 {
            ctx.queue.write_buffer(buffer, 0, bytes);
        } else {
            // write_buffer requires 4-byte-aligned sizes; pad the tail.
            let mut padded = bytes.to_vec();
            padded.resize(bytes.len().div_ceil(align) * align, 0);
            ctx.queue.write_buffer(buffer, 0, &padded);
        }
    }
}
