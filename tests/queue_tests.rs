use polonium_2d::{Align, Color, DrawCall, GlyphTable, Position, RenderQueue, Size, UvRect};
use uuid::Uuid;

fn white_rect(queue: &mut RenderQueue, texture: Option<Uuid>) {
    queue.push_filled_rectangle(
        Position::new(25.0, 25.0),
        Size::new(75.0, 75.0),
        Color::WHITE,
        texture,
        UvRect::ZERO,
    );
}

#[test]
fn one_rectangle_is_one_drawcall() {
    let mut queue = RenderQueue::new(16, 24);
    white_rect(&mut queue, None);

    assert_eq!(queue.drawcalls().len(), 1);
    assert_eq!(queue.vertex_count(), 4);
    assert_eq!(queue.index_count(), 6);
    assert!(queue.is_dirty(), "pushing geometry should mark the queue dirty");
    match queue.drawcalls()[0] {
        DrawCall::Triangles {
            texture,
            vertices,
            indices,
            primitives,
        } => {
            assert_eq!(texture, None);
            assert_eq!((vertices, indices, primitives), (4, 6, 2));
        }
        _ => panic!("expected a triangle drawcall"),
    }
}

#[test]
fn consecutive_same_texture_calls_merge() {
    let mut queue = RenderQueue::new(16, 24);
    white_rect(&mut queue, None);
    white_rect(&mut queue, None);
    queue.push_line(
        Position::new(0.0, 0.0),
        Position::new(10.0, 10.0),
        Color::BLACK,
        1.0,
    );

    assert_eq!(
        queue.drawcalls().len(),
        1,
        "untextured geometry should share one drawcall"
    );
    match queue.drawcalls()[0] {
        DrawCall::Triangles {
            vertices,
            indices,
            primitives,
            ..
        } => assert_eq!((vertices, indices, primitives), (12, 18, 6)),
        _ => panic!("expected a triangle drawcall"),
    }
    // The second rectangle's indices continue from the first's vertices.
    assert_eq!(queue.index_data()[6], 4);
}

#[test]
fn interleaved_textures_never_merge() {
    let mut queue = RenderQueue::new(16, 24);
    let id = Uuid::new_v4();
    white_rect(&mut queue, None);
    white_rect(&mut queue, Some(id));
    white_rect(&mut queue, None);

    assert_eq!(queue.drawcalls().len(), 3);
    // Each drawcall restarts its index base at zero.
    assert_eq!(queue.index_data()[6], 0);
}

#[test]
fn same_texture_resumes_merging_after_reuse() {
    let mut queue = RenderQueue::new(16, 24);
    let id = Uuid::new_v4();
    white_rect(&mut queue, Some(id));
    white_rect(&mut queue, Some(id));

    assert_eq!(queue.drawcalls().len(), 1);
    match queue.drawcalls()[0] {
        DrawCall::Triangles { texture, vertices, .. } => {
            assert_eq!(texture, Some(id));
            assert_eq!(vertices, 8);
        }
        _ => panic!("expected a triangle drawcall"),
    }
}

#[test]
fn scissor_breaks_a_batch() {
    let mut queue = RenderQueue::new(16, 24);
    white_rect(&mut queue, None);
    queue.push_scissor(Position::new(0.0, 0.0), Size::new(50.0, 50.0));
    white_rect(&mut queue, None);

    assert_eq!(queue.drawcalls().len(), 3);
    match queue.drawcalls()[1] {
        DrawCall::Scissor { position, size } => {
            assert_eq!(position, Position::new(0.0, 0.0));
            assert_eq!(size, Size::new(50.0, 50.0));
        }
        _ => panic!("expected the scissor to keep its own drawcall"),
    }
    match (&queue.drawcalls()[0], &queue.drawcalls()[2]) {
        (DrawCall::Triangles { vertices: a, .. }, DrawCall::Triangles { vertices: b, .. }) => {
            assert_eq!((*a, *b), (4, 4), "scissor should split the triangle batch");
        }
        _ => panic!("expected triangles around the scissor"),
    }
}

#[test]
fn clear_resets_contents_but_keeps_capacity() {
    let mut queue = RenderQueue::new(2, 3);
    white_rect(&mut queue, None);
    let grown_vertices = queue.vertex_capacity();
    let grown_indices = queue.index_capacity();
    assert!(grown_vertices >= 4 && grown_indices >= 6);

    queue.clear();
    assert_eq!(queue.vertex_count(), 0);
    assert_eq!(queue.index_count(), 0);
    assert!(queue.drawcalls().is_empty());
    assert_eq!(queue.vertex_capacity(), grown_vertices);
    assert_eq!(queue.index_capacity(), grown_indices);

    white_rect(&mut queue, None);
    assert_eq!(queue.vertex_count(), 4);
}

#[test]
fn gradient_corners_keep_their_colors() {
    let mut queue = RenderQueue::new(4, 6);
    let (c1, c2, c3, c4) = (
        Color::rgb(255, 0, 0),
        Color::rgb(0, 255, 0),
        Color::rgb(0, 0, 255),
        Color::rgb(255, 255, 0),
    );
    queue.push_gradient_rectangle(
        Position::new(0.0, 0.0),
        Size::new(10.0, 10.0),
        c1,
        c2,
        c3,
        c4,
        None,
        UvRect::FULL,
    );

    let v = queue.vertex_data();
    // Winding: top-left, top-right, bottom-right, bottom-left.
    assert_eq!(v[0].position[..2], [0.0, 0.0]);
    assert_eq!(v[1].position[..2], [10.0, 0.0]);
    assert_eq!(v[2].position[..2], [10.0, 10.0]);
    assert_eq!(v[3].position[..2], [0.0, 10.0]);
    assert_eq!(v[0].color, c1);
    assert_eq!(v[1].color, c2);
    assert_eq!(v[2].color, c4);
    assert_eq!(v[3].color, c3);
}

#[test]
fn rectangle_positions_snap_to_pixels() {
    let mut queue = RenderQueue::new(4, 6);
    queue.push_filled_rectangle(
        Position::new(1.7, 2.3),
        Size::new(10.0, 10.0),
        Color::WHITE,
        None,
        UvRect::ZERO,
    );
    let v = queue.vertex_data();
    assert_eq!(v[0].position[..2], [1.0, 2.0]);
    assert_eq!(v[2].position[..2], [11.0, 12.0]);
}

#[test]
fn line_is_a_quad_perpendicular_to_its_direction() {
    let mut queue = RenderQueue::new(4, 6);
    queue.push_line(
        Position::new(0.0, 0.0),
        Position::new(10.0, 0.0),
        Color::WHITE,
        2.0,
    );

    let v = queue.vertex_data();
    assert_eq!(v.len(), 4);
    // A horizontal line of width 2 extends one pixel above and below.
    assert!((v[0].position[1] - -1.0).abs() < 1e-4);
    assert!((v[1].position[1] - 1.0).abs() < 1e-4);
    assert!((v[2].position[0] - 10.0).abs() < 1e-4);
    match queue.drawcalls()[0] {
        DrawCall::Triangles { primitives, .. } => assert_eq!(primitives, 2),
        _ => panic!("expected a triangle drawcall"),
    }
}

#[test]
fn batches_split_before_the_index_range_runs_out() {
    let mut queue = RenderQueue::new(4, 6);
    // 16385 quads are 65540 vertices, four more than u16 indices can
    // address in one drawcall.
    for _ in 0..16385 {
        white_rect(&mut queue, None);
    }

    assert_eq!(queue.drawcalls().len(), 2);
    match (&queue.drawcalls()[0], &queue.drawcalls()[1]) {
        (DrawCall::Triangles { vertices: a, .. }, DrawCall::Triangles { vertices: b, .. }) => {
            assert_eq!((*a, *b), (65536, 4));
        }
        _ => panic!("expected two triangle drawcalls"),
    }
    // The overflow quad restarts its indices at a fresh base instead of
    // wrapping back onto the batch's first vertices.
    let tail = &queue.index_data()[queue.index_count() - 6..];
    assert_eq!(tail, &[0u16, 1, 3, 3, 2, 1]);
}

// A hand-built glyph table: 100x100 atlas, 20px cells, 2px spacing, no
// shrink. Every cell spans 14px of atlas width, so each advance is
// 14 - 2*2 = 10 on-screen pixels.
fn test_table() -> GlyphTable {
    let mut table = GlyphTable::new(Uuid::new_v4(), 100, 100, 2, 1.0);
    for (i, c) in [' ', 'A', 'B'].into_iter().enumerate() {
        let u = i as f32 * 0.14;
        table.insert(c, UvRect::new(u, 0.0, u + 0.14, 0.2));
    }
    table
}

#[test]
fn text_batches_glyphs_into_the_font_texture() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "AB", Color::WHITE, Align::empty());

    assert_eq!(queue.drawcalls().len(), 1);
    match queue.drawcalls()[0] {
        DrawCall::Triangles {
            texture,
            vertices,
            indices,
            primitives,
        } => {
            assert_eq!(texture, Some(table.texture_id()));
            assert_eq!((vertices, indices, primitives), (8, 12, 4));
        }
        _ => panic!("expected a triangle drawcall"),
    }
}

#[test]
fn spaces_advance_without_geometry() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "A A", Color::WHITE, Align::empty());

    assert_eq!(queue.vertex_count(), 8, "two drawn glyphs, one skipped space");
    // Second 'A' sits two advances (20px) right of the first.
    let v = queue.vertex_data();
    assert!((v[4].position[0] - v[0].position[0] - 20.0).abs() < 1e-3);
}

#[test]
fn newline_moves_the_pen_down_one_row() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "A\nB", Color::WHITE, Align::empty());

    let v = queue.vertex_data();
    // Row height is 0.2 * 100 = 20px; both glyphs start at the same x.
    assert!((v[4].position[1] - v[0].position[1] - 20.0).abs() < 1e-3);
    assert!((v[4].position[0] - v[0].position[0]).abs() < 1e-3);
}

#[test]
fn uncovered_glyphs_are_skipped_entirely() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "AZB", Color::WHITE, Align::empty());

    assert_eq!(queue.vertex_count(), 8);
    // 'Z' contributes no advance either: 'B' is one advance right of 'A'.
    let v = queue.vertex_data();
    assert!((v[4].position[0] - v[0].position[0] - 10.0).abs() < 1e-3);
}

#[test]
fn empty_text_leaves_no_drawcall_behind() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "   ", Color::WHITE, Align::empty());

    assert!(queue.drawcalls().is_empty());
    assert_eq!(queue.vertex_count(), 0);
}

#[test]
fn right_alignment_shifts_text_left_by_its_extent() {
    let table = test_table();
    let extent = table.text_extent("AB");

    let mut left = RenderQueue::new(64, 96);
    left.push_text(&table, Position::new(100.0, 0.0), "AB", Color::WHITE, Align::empty());
    let mut right = RenderQueue::new(64, 96);
    right.push_text(&table, Position::new(100.0, 0.0), "AB", Color::WHITE, Align::X_RIGHT);

    let shift = left.vertex_data()[0].position[0] - right.vertex_data()[0].position[0];
    assert!((shift - extent.width.floor()).abs() < 1e-3);
}

#[test]
fn long_text_runs_split_into_multiple_drawcalls() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    let text = "A".repeat(16385);
    queue.push_text(&table, Position::new(0.0, 0.0), &text, Color::WHITE, Align::empty());

    assert_eq!(queue.drawcalls().len(), 2);
    match (&queue.drawcalls()[0], &queue.drawcalls()[1]) {
        (
            DrawCall::Triangles { vertices: a, texture: t1, .. },
            DrawCall::Triangles { vertices: b, texture: t2, .. },
        ) => {
            assert_eq!((*a, *b), (65536, 4));
            assert_eq!(t1, t2, "both halves draw from the font texture");
        }
        _ => panic!("expected two triangle drawcalls"),
    }
    let tail = &queue.index_data()[queue.index_count() - 6..];
    assert_eq!(tail, &[0u16, 1, 2, 3, 2, 1]);
}

#[test]
fn consecutive_text_calls_share_one_drawcall() {
    let table = test_table();
    let mut queue = RenderQueue::new(64, 96);
    queue.push_text(&table, Position::new(0.0, 0.0), "A", Color::WHITE, Align::empty());
    queue.push_text(&table, Position::new(0.0, 30.0), "B", Color::WHITE, Align::empty());

    assert_eq!(queue.drawcalls().len(), 1);
    // The second call's indices continue from the first call's vertices.
    assert_eq!(queue.index_data()[6], 4);
}
