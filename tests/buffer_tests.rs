use polonium_2d::GrowBuffer;

fn vertex_usage() -> wgpu::BufferUsages {
    wgpu::BufferUsages::VERTEX
}

#[test]
fn capacity_doubles_until_the_request_fits() {
    let mut buffer: GrowBuffer<u32> = GrowBuffer::new(4, vertex_usage(), "test");
    buffer.ensure(3);
    assert_eq!(buffer.capacity(), 4, "no growth while the request fits");

    buffer.ensure(9);
    assert_eq!(buffer.capacity(), 16, "4 -> 8 -> 16 to hold 9 elements");

    buffer.ensure(17);
    assert_eq!(buffer.capacity(), 32);
}

#[test]
fn growth_preserves_existing_contents() {
    let mut buffer: GrowBuffer<u32> = GrowBuffer::new(2, vertex_usage(), "test");
    buffer.extend_from_slice(&[1, 2]);
    buffer.ensure(100);
    buffer.extend_from_slice(&[3]);

    assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    assert_eq!(buffer.len(), 3);
}

#[test]
fn clear_drops_contents_but_not_capacity() {
    let mut buffer: GrowBuffer<u16> = GrowBuffer::new(2, vertex_usage(), "test");
    buffer.ensure(50);
    let capacity = buffer.capacity();
    buffer.extend_from_slice(&[7; 50]);

    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), capacity);
}

#[test]
fn zero_capacity_request_is_clamped() {
    let buffer: GrowBuffer<u8> = GrowBuffer::new(0, vertex_usage(), "test");
    assert!(buffer.capacity() >= 1, "doubling needs a nonzero start");
}
