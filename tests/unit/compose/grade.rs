use super::*;

fn gradient() -> Vec<u8> {
    (0..=255u8).flat_map(|v| [v, v / 2, 255 - v, 255]).collect()
}

#[test]
fn none_is_identity() {
    let mut buf = gradient();
    ColorGrade::None.apply_in_place(&mut buf).unwrap();
    assert_eq!(buf, gradient());
}

#[test]
fn presets_are_deterministic() {
    for grade in ColorGrade::ALL {
        let mut a = gradient();
        let mut b = gradient();
        grade.apply_in_place(&mut a).unwrap();
        grade.apply_in_place(&mut b).unwrap();
        assert_eq!(a, b, "{grade}");
    }
}

#[test]
fn every_real_preset_changes_the_image() {
    for grade in ColorGrade::ALL.into_iter().filter(|g| *g != ColorGrade::None) {
        let mut buf = gradient();
        grade.apply_in_place(&mut buf).unwrap();
        assert_ne!(buf, gradient(), "{grade}");
    }
}

#[test]
fn warm_pushes_red_over_blue() {
    let mut px = vec![128u8, 128, 128, 255];
    ColorGrade::Warm.apply_in_place(&mut px).unwrap();
    assert!(px[0] > px[2], "{px:?}");
    let mut px = vec![128u8, 128, 128, 255];
    ColorGrade::Cool.apply_in_place(&mut px).unwrap();
    assert!(px[2] > px[0], "{px:?}");
}

#[test]
fn alpha_is_untouched_and_transparent_pixels_skipped() {
    let mut buf = vec![0u8, 0, 0, 0, 60, 60, 60, 128];
    ColorGrade::Moody.apply_in_place(&mut buf).unwrap();
    assert_eq!(&buf[..4], &[0, 0, 0, 0]);
    assert_eq!(buf[7], 128);
    assert!(buf[4] <= 128);
}

#[test]
fn names_parse_case_insensitively() {
    assert_eq!("Moody".parse::<ColorGrade>().unwrap(), ColorGrade::Moody);
    assert_eq!("none".parse::<ColorGrade>().unwrap(), ColorGrade::None);
    assert!("sepia".parse::<ColorGrade>().is_err());
    assert_eq!(serde_json::to_string(&ColorGrade::Vintage).unwrap(), "\"vintage\"");
}
