use super::*;
use crate::geometry::quad::Quadrilateral;
use crate::store::template::{SceneImage, TemplateDraft, TemplateId};

fn template() -> MockupTemplate {
    TemplateDraft::new(
        "Hall",
        SceneImage::new("hall.png", 800, 600),
        Quadrilateral::from([[100.0, 100.0], [500.0, 100.0], [520.0, 500.0], [80.0, 520.0]]),
    )
    .into_template(TemplateId::new("tpl-1"))
}

fn key(poster: &[u8], t: &MockupTemplate, fill: FillMode, grade: ColorGrade) -> RequestKey {
    CompositionRequest {
        poster: PosterHash::of(poster),
        template: t,
        fill_mode: fill,
        color_grade: grade,
        render: &RenderOpts::default(),
    }
    .key()
}

#[test]
fn identical_requests_share_a_key() {
    let t = template();
    assert_eq!(
        key(b"poster", &t, FillMode::Fill, ColorGrade::Warm),
        key(b"poster", &t, FillMode::Fill, ColorGrade::Warm)
    );
}

#[test]
fn every_field_changes_the_key() {
    let t = template();
    let base = key(b"poster", &t, FillMode::Fill, ColorGrade::None);

    assert_ne!(base, key(b"poster2", &t, FillMode::Fill, ColorGrade::None));
    assert_ne!(base, key(b"poster", &t, FillMode::Fit, ColorGrade::None));
    assert_ne!(base, key(b"poster", &t, FillMode::Fill, ColorGrade::Cool));

    let mut moved = t.clone();
    moved.corners = Quadrilateral::from([
        [101.0, 100.0],
        [500.0, 100.0],
        [520.0, 500.0],
        [80.0, 520.0],
    ]);
    assert_ne!(base, key(b"poster", &moved, FillMode::Fill, ColorGrade::None));

    let mut bumped = t.clone();
    bumped.revision += 1;
    assert_ne!(base, key(b"poster", &bumped, FillMode::Fill, ColorGrade::None));

    let mut other_id = t.clone();
    other_id.id = TemplateId::new("tpl-2");
    assert_ne!(base, key(b"poster", &other_id, FillMode::Fill, ColorGrade::None));

    let opts = RenderOpts {
        supersample: 2,
        ..RenderOpts::default()
    };
    let with_opts = CompositionRequest {
        poster: PosterHash::of(b"poster"),
        template: &t,
        fill_mode: FillMode::Fill,
        color_grade: ColorGrade::None,
        render: &opts,
    }
    .key();
    assert_ne!(base, with_opts);
}

#[test]
fn key_display_is_32_hex_digits() {
    let k = key(b"p", &template(), FillMode::Stretch, ColorGrade::None);
    let s = k.to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}
