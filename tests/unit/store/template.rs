use super::*;

fn draft() -> TemplateDraft {
    TemplateDraft::new(
        "Living room",
        SceneImage::new("scenes/living.png", 800, 600),
        Quadrilateral::from([[100.0, 100.0], [500.0, 100.0], [520.0, 500.0], [80.0, 520.0]]),
    )
}

#[test]
fn draft_defaults_and_conversion() {
    let t = draft().into_template(TemplateId::new("tpl-1"));
    assert_eq!(t.blend_mode, BlendMode::Normal);
    assert_eq!(t.blend_alpha, 1.0);
    assert_eq!(t.feather_radius, 2);
    assert!(t.is_active);
    assert_eq!(t.revision, 1);
    t.validate().unwrap();
}

#[test]
fn validation_catches_bad_fields() {
    let mut t = draft().into_template(TemplateId::new("tpl-1"));
    t.blend_alpha = 1.5;
    assert!(matches!(t.validate(), Err(MockupError::Validation(_))));

    let mut t = draft().into_template(TemplateId::new("tpl-1"));
    t.corners = Quadrilateral::from([[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [0.0, 10.0]]);
    assert!(matches!(t.validate(), Err(MockupError::Geometry(_))));

    let mut t = draft().into_template(TemplateId::new("tpl-1"));
    t.scene_image.width = 0;
    assert!(t.validate().is_err());

    let mut t = draft().into_template(TemplateId::new("tpl-1"));
    t.name = "  ".to_owned();
    assert!(t.validate().is_err());
}

#[test]
fn missing_optional_fields_take_defaults_on_read() {
    let json = r#"{
        "id": "tpl-9",
        "name": "Hall",
        "scene_image": {"url": "hall.png", "width": 640, "height": 480},
        "corners": [[10, 10], [200, 10], [200, 300], [10, 300]]
    }"#;
    let t: MockupTemplate = serde_json::from_str(json).unwrap();
    assert_eq!(t.id.as_str(), "tpl-9");
    assert_eq!(t.feather_radius, 2);
    assert!(t.is_active);
    t.validate().unwrap();
}

#[test]
fn patch_applies_only_set_fields() {
    let mut t = draft().into_template(TemplateId::new("tpl-1"));
    let before = t.clone();
    let patch = TemplatePatch {
        blend_mode: Some(BlendMode::Multiply),
        ..TemplatePatch::default()
    };
    assert!(!patch.is_empty());
    patch.apply_to(&mut t);
    assert_eq!(t.blend_mode, BlendMode::Multiply);
    assert_eq!(t.corners, before.corners);
    assert_eq!(t.name, before.name);
    assert!(TemplatePatch::default().is_empty());
}

#[test]
fn composite_spec_maps_canvas_onto_corners() {
    let t = draft().into_template(TemplateId::new("tpl-1"));
    let poster = PixelSize::new(1000, 1250).unwrap();
    let spec = t.composite_spec(poster, FillMode::Fill, ColorGrade::None).unwrap();
    let mapped = spec.transform.forward_rect(spec.selection.canvas);
    for (m, c) in mapped.iter().zip(t.corners.corners()) {
        assert!((m.x - c.x).abs() < 1e-6 && (m.y - c.y).abs() < 1e-6);
    }
    assert!(!spec.selection.is_padded());
}
