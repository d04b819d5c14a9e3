use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_transparent_dst_copies_src() {
    let src = [100, 110, 120, 200];
    assert_eq!(over([0, 0, 0, 0], src, 1.0), src);
}

#[test]
fn row_span_clips_both_sides() {
    let mut dst = vec![0u8; 3 * 4];
    let src = [9u8, 9, 9, 255].repeat(4);

    over_row_at(&mut dst, &src, -2, 1.0).unwrap();
    assert_eq!(&dst[0..4], &[9, 9, 9, 255]);
    assert_eq!(&dst[4..8], &[9, 9, 9, 255]);
    assert_eq!(&dst[8..12], &[0, 0, 0, 0]);

    let mut dst = vec![0u8; 3 * 4];
    over_row_at(&mut dst, &src, 2, 1.0).unwrap();
    assert_eq!(&dst[0..8], &[0u8; 8]);
    assert_eq!(&dst[8..12], &[9, 9, 9, 255]);
}

#[test]
fn row_span_rejects_partial_pixels() {
    let mut dst = vec![0u8; 5];
    assert!(over_row_at(&mut dst, &[0u8; 4], 0, 1.0).is_err());
}
