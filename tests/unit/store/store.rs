use super::*;
use crate::geometry::quad::Quadrilateral;
use crate::store::template::SceneImage;

fn draft(name: &str) -> TemplateDraft {
    TemplateDraft::new(
        name,
        SceneImage::new(format!("{name}.png"), 800, 600),
        Quadrilateral::from([[100.0, 100.0], [500.0, 100.0], [520.0, 500.0], [80.0, 520.0]]),
    )
}

fn degenerate() -> Quadrilateral {
    Quadrilateral::from([[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [0.0, 10.0]])
}

#[test]
fn ids_are_assigned_in_order() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    let b = store.create_template(draft("b")).unwrap();
    assert_eq!(a.id.as_str(), "tpl-1");
    assert_eq!(b.id.as_str(), "tpl-2");
    let names: Vec<_> = store.list_templates().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn degenerate_corners_are_never_persisted() {
    let mut store = TemplateStore::new();
    let mut bad = draft("bad");
    bad.corners = degenerate();
    assert!(matches!(store.create_template(bad), Err(MockupError::Geometry(_))));
    assert!(store.list_templates().is_empty());

    let t = store.create_template(draft("ok")).unwrap();
    assert_eq!(t.id.as_str(), "tpl-1");
    let err = store
        .update_template(&t.id, &TemplatePatch::corners(degenerate()))
        .unwrap_err();
    assert!(matches!(err, MockupError::Geometry(_)));
    assert_eq!(store.template(&t.id).unwrap(), &t);
}

#[test]
fn updates_bump_revision_but_activation_does_not() {
    let mut store = TemplateStore::new();
    let t = store.create_template(draft("a")).unwrap();
    let moved = Quadrilateral::from([
        [110.0, 100.0],
        [500.0, 100.0],
        [520.0, 500.0],
        [80.0, 520.0],
    ]);
    let t2 = store.update_template(&t.id, &TemplatePatch::corners(moved)).unwrap();
    assert_eq!(t2.revision, t.revision + 1);
    let t3 = store.update_template(&t.id, &TemplatePatch::default()).unwrap();
    assert_eq!(t3.revision, t2.revision);

    store.set_active(&t.id, false).unwrap();
    assert_eq!(store.template(&t.id).unwrap().revision, t2.revision);
    assert!(store.list_active().is_empty());
}

#[test]
fn packs_require_existing_unique_templates() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    let missing = PackDraft::new(
        "p",
        vec![a.id.clone(), TemplateId::from("tpl-404")],
        ColorGrade::Warm,
    );
    assert!(matches!(store.create_pack(missing), Err(MockupError::Validation(_))));
    let dup = PackDraft::new("p", vec![a.id.clone(), a.id.clone()], ColorGrade::Warm);
    assert!(store.create_pack(dup).is_err());
    let ok = store
        .create_pack(PackDraft::new("p", vec![a.id.clone()], ColorGrade::Warm))
        .unwrap();
    assert_eq!(ok.id.as_str(), "pack-1");
}

#[test]
fn deleted_template_dangles_and_is_skipped() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    let b = store.create_template(draft("b")).unwrap();
    let c = store.create_template(draft("c")).unwrap();
    let pack = store
        .create_pack(PackDraft::new(
            "p",
            vec![c.id.clone(), a.id.clone(), b.id.clone()],
            ColorGrade::Moody,
        ))
        .unwrap();
    store.delete_template(&a.id).unwrap();
    store.set_active(&b.id, false).unwrap();

    let resolved = store.resolve_pack(&pack.id).unwrap();
    let ids: Vec<_> = resolved.templates.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![c.id.clone()]);
    assert_eq!(resolved.dangling, vec![a.id.clone()]);
    assert_eq!(resolved.inactive, vec![b.id.clone()]);
    assert_eq!(resolved.color_grade, Some(ColorGrade::Moody));

    // Explicit lists ignore activation.
    let explicit = store.resolve_templates(&[b.id.clone(), a.id.clone()]);
    assert_eq!(explicit.templates.len(), 1);
    assert_eq!(explicit.dangling, vec![a.id]);
}

#[test]
fn deleting_a_pack_keeps_templates() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    let pack = store
        .create_pack(PackDraft::new("p", vec![a.id.clone()], ColorGrade::None))
        .unwrap();
    store.delete_pack(&pack.id).unwrap();
    assert!(store.list_packs().is_empty());
    assert!(store.template(&a.id).is_ok());
    assert!(matches!(store.pack(&pack.id), Err(MockupError::NotFound(_))));
}

#[test]
fn snapshot_round_trip_preserves_everything() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    store
        .create_pack(PackDraft::new("p", vec![a.id.clone()], ColorGrade::Vintage))
        .unwrap();
    let text = store.to_json_string().unwrap();
    let mut back = TemplateStore::from_json_str(&text).unwrap();
    assert_eq!(back, store);
    // Sequence counters survive, so new ids do not collide.
    assert_eq!(back.create_template(draft("b")).unwrap().id.as_str(), "tpl-2");
}

#[test]
fn stale_sequence_counters_are_raised_past_loaded_ids() {
    let mut store = TemplateStore::new();
    let a = store.create_template(draft("a")).unwrap();
    store.create_template(draft("b")).unwrap();
    store
        .create_pack(PackDraft::new("p", vec![a.id.clone()], ColorGrade::None))
        .unwrap();
    let text = store
        .to_json_string()
        .unwrap()
        .replace("\"next_template_seq\": 2", "\"next_template_seq\": 0")
        .replace("\"next_pack_seq\": 1", "\"next_pack_seq\": 0");
    assert!(text.contains("\"next_template_seq\": 0"));

    let mut back = TemplateStore::from_json_str(&text).unwrap();
    assert_eq!(back.create_template(draft("c")).unwrap().id.as_str(), "tpl-3");
    let pack = back
        .create_pack(PackDraft::new("q", vec![a.id], ColorGrade::None))
        .unwrap();
    assert_eq!(pack.id.as_str(), "pack-2");
}

#[test]
fn snapshot_load_revalidates_templates() {
    let mut store = TemplateStore::new();
    store.create_template(draft("a")).unwrap();
    let text = store
        .to_json_string()
        .unwrap()
        .replace("\"blend_alpha\": 1.0", "\"blend_alpha\": 3.0");
    assert!(TemplateStore::from_json_str(&text).is_err());
}

#[test]
fn config_import_export() {
    let mut store = TemplateStore::new();
    let cfg = TemplateConfig::from_json_str(
        r#"{"corners": [[10,10],[90,10],[90,90],[10,90]], "width": 100, "height": 100, "feather_radius": 5}"#,
    )
    .unwrap();
    let t = store.import_config(&cfg, "Imported", "scene.png").unwrap();
    assert_eq!(t.name, "Imported");
    assert_eq!(t.scene_image.url, "scene.png");
    assert_eq!(t.feather_radius, 5);
    let exported = store.export_config(&t.id).unwrap();
    assert_eq!(exported.image_size, [100, 100]);
    assert_eq!(exported.corners, cfg.corners);
}
