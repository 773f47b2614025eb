use polonium_2d::{AtlasError, AtlasMap};

#[test]
fn uv_rectangle_is_proportional_to_pixel_slot() {
    let mut map = AtlasMap::new(64, 64);
    let (x, y) = map.allocate(7, 16, 16).unwrap();
    assert_eq!((x, y), (0, 0));

    let uv = map.coords(7).unwrap();
    assert_eq!((uv.u_min, uv.v_min), (0.0, 0.0));
    assert_eq!((uv.u_max, uv.v_max), (0.25, 0.25));
}

#[test]
fn second_image_packs_to_the_right() {
    let mut map = AtlasMap::new(64, 64);
    map.allocate(1, 16, 16).unwrap();
    let (x, y) = map.allocate(2, 16, 16).unwrap();
    assert_eq!((x, y), (16, 0));

    let uv = map.coords(2).unwrap();
    assert_eq!(uv.u_min, 0.25);
}

#[test]
fn full_width_image_takes_a_whole_shelf() {
    let mut map = AtlasMap::new(64, 64);
    map.allocate(1, 64, 10).unwrap();
    let (x, y) = map.allocate(2, 8, 8).unwrap();
    assert_eq!((x, y), (0, 10));
}

#[test]
fn overflow_fails_without_touching_prior_entries() {
    let mut map = AtlasMap::new(32, 32);
    map.allocate(1, 32, 20).unwrap();
    let before = map.coords(1).unwrap();

    let err = map.allocate(2, 8, 20).unwrap_err();
    assert_eq!(err, AtlasError::OutOfSpace);
    assert!(!map.contains(2), "failed allocation must not record a rectangle");
    assert_eq!(map.len(), 1);
    assert_eq!(map.coords(1).unwrap(), before);

    // A shorter image still fits below the first shelf.
    map.allocate(3, 8, 10).unwrap();
    assert_eq!(map.len(), 2);
}

#[test]
fn image_wider_than_the_atlas_is_rejected() {
    let mut map = AtlasMap::new(16, 16);
    let err = map.allocate(1, 20, 4).unwrap_err();
    assert_eq!(err, AtlasError::OutOfSpace);
    assert!(map.is_empty(), "failed allocation must not record a rectangle");

    // The cursor is untouched, so fitting images still pack from origin.
    let (x, y) = map.allocate(2, 8, 4).unwrap();
    assert_eq!((x, y), (0, 0));
}

#[test]
fn missing_id_is_an_explicit_miss() {
    let map = AtlasMap::new(16, 16);
    assert!(map.coords(42).is_none());
    assert!(!map.contains(42));
    assert!(map.is_empty());
}
