use super::*;
use crate::foundation::error::MockupError;

const CORNERS: &str = "[[100, 100], [500, 100], [520, 600], [80, 620]]";

#[test]
fn reads_image_size_array() {
    let json = format!(r#"{{"corners": {CORNERS}, "image_size": [1200, 900], "blend_alpha": 0.9, "feather_radius": 3}}"#);
    let cfg = TemplateConfig::from_json_str(&json).unwrap();
    assert_eq!(cfg.image_size, [1200, 900]);
    assert_eq!(cfg.blend_alpha, 0.9);
    assert_eq!(cfg.feather_radius, 3);
    cfg.validate().unwrap();
}

#[test]
fn reads_separate_width_and_height() {
    let json = format!(r#"{{"corners": {CORNERS}, "width": 1200, "height": 900, "blend_alpha": 1.0, "feather_radius": 0}}"#);
    let cfg = TemplateConfig::from_json_str(&json).unwrap();
    assert_eq!(cfg.image_size, [1200, 900]);
    assert_eq!(cfg.scene_size().unwrap(), PixelSize::new(1200, 900).unwrap());
}

#[test]
fn both_shapes_must_agree() {
    let ok = format!(r#"{{"corners": {CORNERS}, "image_size": [10, 20], "width": 10, "height": 20}}"#);
    assert!(TemplateConfig::from_json_str(&ok).is_ok());
    let bad = format!(r#"{{"corners": {CORNERS}, "image_size": [10, 20], "width": 11}}"#);
    assert!(matches!(TemplateConfig::from_json_str(&bad), Err(MockupError::Serde(_))));
}

#[test]
fn size_is_required() {
    let json = format!(r#"{{"corners": {CORNERS}, "width": 10}}"#);
    let err = TemplateConfig::from_json_str(&json).unwrap_err();
    assert!(err.to_string().contains("image_size"));
}

#[test]
fn defaults_fill_missing_blend_fields() {
    let json = format!(r#"{{"corners": {CORNERS}, "image_size": [800, 800]}}"#);
    let cfg = TemplateConfig::from_json_str(&json).unwrap();
    assert_eq!(cfg.blend_alpha, 1.0);
    assert_eq!(cfg.feather_radius, 2);
    assert_eq!(cfg.blend_mode, BlendMode::Normal);
}

#[test]
fn writer_always_emits_image_size() {
    let json = format!(r#"{{"corners": {CORNERS}, "width": 640, "height": 480}}"#);
    let cfg = TemplateConfig::from_json_str(&json).unwrap();
    let out = cfg.to_json_string().unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["image_size"], serde_json::json!([640, 480]));
    assert!(v.get("width").is_none());
    assert!(v.get("blend_mode").is_none());
    assert_eq!(TemplateConfig::from_json_str(&out).unwrap(), cfg);
}

#[test]
fn template_round_trip_is_lossless() {
    let draft = TemplateDraft::new(
        "Studio",
        SceneImage::new("studio.png", 1000, 800),
        Quadrilateral::from([[10.5, 20.25], [300.0, 22.0], [310.0, 400.0], [12.0, 390.0]]),
    )
    .with_blend(BlendMode::Multiply, 0.85)
    .with_feather_radius(4);
    let cfg_draft = TemplateConfig {
        corners: draft.corners.into(),
        image_size: [1000, 800],
        blend_alpha: 0.85,
        feather_radius: 4,
        blend_mode: BlendMode::Multiply,
        name: Some("Studio".to_owned()),
        scene_url: Some("studio.png".to_owned()),
    };
    let text = cfg_draft.to_json_string().unwrap();
    let back = TemplateConfig::from_json_str(&text).unwrap();
    assert_eq!(back.to_draft("x", "y"), draft);
}

#[test]
fn invalid_geometry_fails_validation() {
    let json = r#"{"corners": [[0,0],[10,0],[20,0],[0,10]], "image_size": [100, 100]}"#;
    let cfg = TemplateConfig::from_json_str(json).unwrap();
    assert!(matches!(cfg.validate(), Err(MockupError::Geometry(_))));
}
