use super::*;

#[test]
fn mul_div255_edges() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(0, 255), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u16(255, 128), 128);
}

#[test]
fn unit_quantization_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(round_clamp_u8(300.0), 255);
    assert_eq!(round_clamp_u8(-3.0), 0);
}

#[test]
fn cross_sign_follows_screen_winding() {
    let a = kurbo::Point::new(0.0, 0.0);
    let b = kurbo::Point::new(1.0, 0.0);
    let c = kurbo::Point::new(1.0, 1.0);
    assert!(cross3(a, b, c) > 0.0);
    assert!(cross3(a, c, b) < 0.0);
    assert_eq!(cross3(a, b, kurbo::Point::new(2.0, 0.0)), 0.0);
}
