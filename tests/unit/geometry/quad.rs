use super::*;

fn quad(pts: [[f64; 2]; 4]) -> Quadrilateral {
    Quadrilateral::from(pts)
}

#[test]
fn accepts_perspective_quad() {
    let q = quad([[100.0, 100.0], [500.0, 100.0], [520.0, 600.0], [80.0, 620.0]]);
    q.validate().unwrap();
    assert!(q.area() > 0.0);
    let bb = q.bounding_box();
    assert_eq!((bb.x0, bb.y0, bb.x1, bb.y1), (80.0, 100.0, 520.0, 620.0));
}

#[test]
fn rejects_coincident_corners() {
    let q = quad([[10.0, 10.0], [10.0, 10.0], [50.0, 50.0], [0.0, 50.0]]);
    let err = q.validate().unwrap_err();
    assert!(matches!(err, MockupError::Geometry(_)));
}

#[test]
fn rejects_three_collinear_corners() {
    let q = quad([[0.0, 0.0], [50.0, 0.0], [100.0, 0.0], [0.0, 80.0]]);
    assert!(q.validate().unwrap_err().to_string().contains("collinear"));
}

#[test]
fn rejects_zero_area() {
    let q = quad([[0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]);
    assert!(q.validate().is_err());
}

#[test]
fn rejects_bowtie() {
    let q = quad([[0.0, 0.0], [100.0, 0.0], [0.0, 100.0], [100.0, 100.0]]);
    assert!(
        q.validate()
            .unwrap_err()
            .to_string()
            .contains("self-intersecting")
    );
}

#[test]
fn rejects_concave() {
    let q = quad([[0.0, 0.0], [100.0, 0.0], [30.0, 30.0], [0.0, 100.0]]);
    assert!(q.validate().unwrap_err().to_string().contains("concave"));
}

#[test]
fn rejects_mirrored_order() {
    let q = quad([[0.0, 0.0], [0.0, 100.0], [100.0, 100.0], [100.0, 0.0]]);
    assert!(
        q.validate()
            .unwrap_err()
            .to_string()
            .contains("counter-clockwise")
    );
}

#[test]
fn rejects_non_finite() {
    let q = quad([[f64::NAN, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    assert!(q.validate().is_err());
}

#[test]
fn normalized_order_sorts_clicks() {
    let shuffled = quad([[520.0, 600.0], [100.0, 100.0], [80.0, 620.0], [500.0, 100.0]]);
    let q = shuffled.normalized_order();
    assert_eq!(
        <[[f64; 2]; 4]>::from(q),
        [[100.0, 100.0], [500.0, 100.0], [520.0, 600.0], [80.0, 620.0]]
    );
    q.validate().unwrap();
}

#[test]
fn normalized_order_is_identity_on_ordered_input() {
    let q = quad([[10.0, 20.0], [300.0, 5.0], [310.0, 400.0], [0.0, 390.0]]);
    assert_eq!(q.normalized_order(), q);
}

#[test]
fn contains_inside_and_outside() {
    let q = quad([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
    assert!(q.contains(Point::new(5.0, 5.0)));
    assert!(q.contains(Point::new(0.0, 0.0)));
    assert!(!q.contains(Point::new(11.0, 5.0)));
}

#[test]
fn serde_uses_nested_arrays() {
    let q = quad([[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 4.0]]);
    let json = serde_json::to_string(&q).unwrap();
    assert_eq!(json, "[[1.0,2.0],[3.0,2.0],[3.0,4.0],[1.0,4.0]]");
    let back: Quadrilateral = serde_json::from_str(&json).unwrap();
    assert_eq!(back, q);
}

#[test]
fn clamp_keeps_points_inside_bounds() {
    let q = quad([[-5.0, 2.0], [30.0, -1.0], [30.0, 30.0], [0.0, 12.0]]);
    let c = q.clamped_to(Rect::new(0.0, 0.0, 20.0, 20.0));
    assert_eq!(
        <[[f64; 2]; 4]>::from(c),
        [[0.0, 2.0], [20.0, 0.0], [20.0, 20.0], [0.0, 12.0]]
    );
}
