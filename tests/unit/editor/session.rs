use super::*;
use crate::store::template::TemplateId;

fn session() -> EditorSession {
    EditorSession::new("wall", SceneImage::new("scenes/wall.jpg", 800, 600)).unwrap()
}

fn close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn screen_and_natural_are_inverse() {
    let mut s = session();
    s.zoom_at(Point::new(10.0, 20.0), 2.5).unwrap();
    s.pan_by(Vec2::new(-7.0, 3.0));
    let p = Point::new(123.25, 456.5);
    assert!(close(s.to_natural(s.to_screen(p)), p));
}

#[test]
fn zoom_keeps_the_point_under_the_cursor() {
    let mut s = session();
    s.fit_view(Size::new(1024.0, 768.0), 0.9).unwrap();
    let cursor = Point::new(311.0, 207.0);
    let before = s.to_natural(cursor);
    for factor in [1.1, 1.1, 3.0, 0.25, 0.9] {
        s.zoom_at(cursor, factor).unwrap();
        assert!(s.to_screen(before).distance(cursor) < 1e-6);
    }
}

#[test]
fn zoom_is_clamped() {
    let mut s = session();
    assert_eq!(s.zoom_at(Point::ORIGIN, 1000.0).unwrap(), MAX_ZOOM);
    assert_eq!(s.zoom_at(Point::ORIGIN, 1e-9).unwrap(), MIN_ZOOM);
    assert!(s.zoom_at(Point::ORIGIN, 0.0).is_err());
    assert!(s.zoom_at(Point::ORIGIN, f64::NAN).is_err());
}

#[test]
fn fit_view_centers_the_scene() {
    let mut s = session();
    s.fit_view(Size::new(400.0, 400.0), 1.0).unwrap();
    assert_eq!(s.zoom(), 0.5);
    assert!(close(s.to_screen(Point::new(0.0, 0.0)), Point::new(0.0, 50.0)));
    assert!(close(s.to_screen(Point::new(800.0, 600.0)), Point::new(400.0, 350.0)));

    s.fit_view(Size::new(400.0, 400.0), 0.5).unwrap();
    assert_eq!(s.zoom(), 0.25);
    assert!(close(s.to_screen(Point::new(400.0, 300.0)), Point::new(200.0, 200.0)));
    assert!(s.fit_view(Size::new(0.0, 10.0), 1.0).is_err());
    assert!(s.fit_view(Size::new(10.0, 10.0), 1.5).is_err());
}

#[test]
fn placing_stops_at_four_corners() {
    let mut s = session();
    s.zoom_at(Point::ORIGIN, 2.0).unwrap();
    for (i, p) in [(20.0, 20.0), (200.0, 20.0), (200.0, 200.0), (20.0, 200.0)]
        .into_iter()
        .enumerate()
    {
        assert_eq!(s.place_corner(Point::new(p.0, p.1)).unwrap(), i);
    }
    assert_eq!(s.corners()[1], Point::new(100.0, 10.0));
    assert_eq!(s.selected(), Some(3));
    assert!(s.place_corner(Point::new(5.0, 5.0)).is_err());
    assert_eq!(s.corners().len(), 4);
}

#[test]
fn dragging_and_nudging_clamp_to_the_scene() {
    let mut s = session();
    s.place_corner(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(
        s.drag_corner(0, Point::new(-50.0, 9000.0)).unwrap(),
        Point::new(0.0, 600.0)
    );
    assert!(s.drag_corner(1, Point::ORIGIN).is_err());

    assert_eq!(s.nudge(NudgeDirection::Left, false), Some(Point::new(0.0, 600.0)));
    assert_eq!(s.nudge(NudgeDirection::Up, false), Some(Point::new(0.0, 599.0)));
    assert_eq!(s.nudge(NudgeDirection::Right, true), Some(Point::new(5.0, 599.0)));
    s.select(None).unwrap();
    assert_eq!(s.nudge(NudgeDirection::Down, true), None);
    assert!(s.select(Some(2)).is_err());
}

#[test]
fn hit_test_picks_the_nearest_corner_in_screen_space() {
    let mut s = session();
    s.place_corner(Point::new(100.0, 100.0)).unwrap();
    s.place_corner(Point::new(110.0, 100.0)).unwrap();
    assert_eq!(s.hit_test(Point::new(108.0, 101.0), 6.0), Some(1));
    assert_eq!(s.hit_test(Point::new(150.0, 150.0), 6.0), None);

    s.zoom_at(Point::ORIGIN, 0.1).unwrap();
    assert_eq!(s.hit_test(Point::new(10.0, 10.0), 0.5), Some(0));
}

#[test]
fn incomplete_or_degenerate_quads_cannot_be_saved() {
    let mut s = session();
    s.place_corner(Point::new(10.0, 10.0)).unwrap();
    s.place_corner(Point::new(100.0, 10.0)).unwrap();
    s.place_corner(Point::new(100.0, 100.0)).unwrap();
    assert!(matches!(s.to_template_config(), Err(MockupError::Validation(_))));

    s.place_corner(Point::new(100.0, 100.0)).unwrap();
    assert!(matches!(s.quad(), Err(MockupError::Geometry(_))));

    assert_eq!(s.undo_corner(), Some(Point::new(100.0, 100.0)));
    assert_eq!(s.selected(), Some(2));
    s.clear_corners();
    assert!(s.corners().is_empty());
    assert_eq!(s.selected(), None);
}

#[test]
fn corners_placed_in_any_order_save_as_tl_tr_br_bl() {
    let mut s = session();
    for p in [(700.0, 520.0), (60.0, 40.0), (90.0, 560.0), (740.0, 30.0)] {
        s.place_corner(Point::new(p.0, p.1)).unwrap();
    }
    let cfg = s.to_template_config().unwrap();
    assert_eq!(
        cfg.corners,
        [[60.0, 40.0], [740.0, 30.0], [700.0, 520.0], [90.0, 560.0]]
    );
}

#[test]
fn template_round_trips_through_the_session() {
    let template = MockupTemplate {
        id: TemplateId::from("tpl-9"),
        name: "shelf".to_owned(),
        scene_image: SceneImage::new("scenes/shelf.png", 1200, 900),
        corners: Quadrilateral::from([
            [100.0, 100.0],
            [500.0, 100.0],
            [520.0, 600.0],
            [80.0, 620.0],
        ]),
        blend_mode: BlendMode::Multiply,
        blend_alpha: 0.85,
        feather_radius: 4,
        is_active: true,
        revision: 3,
    };
    let mut s = EditorSession::from_template(&template);
    s.fit_view(Size::new(640.0, 480.0), 0.9).unwrap();
    assert_eq!(s.to_template_config().unwrap(), TemplateConfig::from_template(&template));

    let patch = s.to_patch().unwrap();
    assert_eq!(patch.corners, Some(template.corners));
    assert_eq!(patch.blend_alpha, Some(0.85));

    let json = serde_json::to_string(&s).unwrap();
    let back: EditorSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}

#[test]
fn skewed_template_keeps_its_corner_labels() {
    // BL has a smaller x + y than TL; the stored order must survive a reopen and save.
    let corners = Quadrilateral::from([
        [300.0, 100.0],
        [600.0, 150.0],
        [600.0, 250.0],
        [150.0, 200.0],
    ]);
    corners.validate().unwrap();
    let template = MockupTemplate {
        id: TemplateId::from("tpl-4"),
        name: "skewed".to_owned(),
        scene_image: SceneImage::new("scenes/desk.png", 800, 600),
        corners,
        blend_mode: BlendMode::Normal,
        blend_alpha: 1.0,
        feather_radius: 0,
        is_active: true,
        revision: 1,
    };
    let s = EditorSession::from_template(&template);
    assert_eq!(s.to_patch().unwrap().corners, Some(corners));
    assert_eq!(s.to_template_config().unwrap().corners, <[[f64; 2]; 4]>::from(corners));
}

#[test]
fn config_opens_with_its_blend_parameters() {
    let cfg = TemplateConfig::from_json_str(
        r#"{"corners":[[1,1],[50,1],[50,40],[1,40]],"width":64,"height":48,"blend_alpha":0.5}"#,
    )
    .unwrap();
    let s = EditorSession::from_config(&cfg, "imported", "scene.png").unwrap();
    assert_eq!(s.name(), "imported");
    assert_eq!(s.scene(), &SceneImage::new("scene.png", 64, 48));
    assert_eq!(s.blend(), (BlendMode::Normal, 0.5, DEFAULT_FEATHER_RADIUS));
    assert_eq!(s.corners().len(), 4);
}
