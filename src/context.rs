/// Handle to the active graphics device and submission queue.
///
/// Every GPU-touching operation in this crate takes a `RenderContext`
/// explicitly instead of reading process-wide state. `wgpu` handles are
/// reference-counted, so the context is cheap to clone; dropping the last
/// clone releases the retained device.
#[derive(Clone)]
pub struct RenderContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl RenderContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Largest 2D texture dimension the device supports. Font atlas sizing
    /// clamps against this.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
