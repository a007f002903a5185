use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn multiply_with_white_keeps_scene() {
    let scene = [120, 80, 40, 255];
    assert_eq!(multiply(scene, [255, 255, 255, 255], 1.0), scene);
}

#[test]
fn multiply_with_black_darkens_fully() {
    let scene = [120, 80, 40, 255];
    assert_eq!(multiply(scene, [0, 0, 0, 255], 1.0), [0, 0, 0, 255]);
}

#[test]
fn multiply_preserves_shadow_ratio() {
    // A shadowed scene pixel stays darker than a lit one under the same poster color.
    let poster = [200, 100, 50, 255];
    let lit = multiply([240, 240, 240, 255], poster, 1.0);
    let shadow = multiply([120, 120, 120, 255], poster, 1.0);
    for i in 0..3 {
        assert!(shadow[i] < lit[i]);
    }
    assert_eq!(lit[3], 255);
}

#[test]
fn multiply_half_opacity_is_between() {
    let scene = [200, 200, 200, 255];
    let out = multiply(scene, [0, 0, 0, 255], 0.5);
    assert!(out[0] > 90 && out[0] < 110, "{out:?}");
}

#[test]
fn masked_blend_skips_uncovered_pixels() {
    let mut dst = vec![10u8, 10, 10, 255, 10, 10, 10, 255];
    let src = vec![250u8, 0, 0, 255, 250, 0, 0, 255];
    blend_masked_in_place(&mut dst, &src, &[0, 255], BlendMode::Normal, 1.0).unwrap();
    assert_eq!(&dst[..4], &[10, 10, 10, 255]);
    assert_eq!(&dst[4..], &[250, 0, 0, 255]);
}

#[test]
fn masked_blend_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(
        blend_masked_in_place(&mut dst, &[0u8; 8], &[0u8; 1], BlendMode::Multiply, 1.0).is_err()
    );
}

#[test]
fn blend_mode_names_round_trip() {
    assert_eq!("Multiply".parse::<BlendMode>().unwrap(), BlendMode::Multiply);
    assert_eq!(BlendMode::Normal.to_string(), "normal");
    assert!("screen".parse::<BlendMode>().is_err());
}
