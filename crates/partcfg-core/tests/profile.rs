use partcfg_core::drawing::CustomShape;
use partcfg_core::geom::Vec2;
use partcfg_core::model::{Form, Hole, PartConfig, Point};
use partcfg_core::path::{FlattenTolerance, Segment};
use partcfg_core::profile::{build_profile, pentagon_vertices, rectangle};

fn custom(points: &[(f64, f64)]) -> PartConfig {
    PartConfig {
        form: Form::CustomPolygon,
        custom: CustomShape {
            points: points.iter().map(|&(x, y)| Point { x, y }).collect(),
            finalized: false,
        },
        ..PartConfig::default()
    }
}

#[test]
fn oversized_corner_radius_is_clamped_to_half_side() {
    let contour = rectangle(100.0, 100.0, 60.0);
    let radii: Vec<f64> = contour
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::Arc { radius, .. } => Some(*radius),
            _ => None,
        })
        .collect();
    assert_eq!(radii, vec![50.0; 4]);

    // With r = 50 the four quarter arcs meet exactly: the outline is a circle.
    let center = Vec2::new(50.0, 50.0);
    for p in contour.flatten(&FlattenTolerance::default()) {
        assert!((p.distance(center) - 50.0).abs() < 1e-9, "{p:?}");
    }
}

#[test]
fn rounded_rectangle_stays_inside_its_box() {
    let contour = rectangle(200.0, 80.0, 15.0);
    assert!(contour.closed);
    let bbox = contour.bbox();
    assert!((bbox.min.x).abs() < 1e-9 && (bbox.min.y).abs() < 1e-9);
    assert!((bbox.max.x - 200.0).abs() < 1e-9 && (bbox.max.y - 80.0).abs() < 1e-9);
}

#[test]
fn custom_polygon_closes_at_three_points() {
    let open = build_profile(&custom(&[(10.0, 10.0), (100.0, 10.0)]));
    assert!(open.outline.is_some());
    assert!(!open.is_closed());

    let closed = build_profile(&custom(&[(10.0, 10.0), (100.0, 10.0), (50.0, 90.0)]));
    assert!(closed.is_closed());

    assert!(build_profile(&custom(&[])).outline.is_none());
}

#[test]
fn rounded_custom_polygon_uses_one_curve_per_corner() {
    let mut config = custom(&[(10.0, 10.0), (200.0, 10.0), (100.0, 150.0)]);
    config.corner_radius = 10.0;
    let outline = build_profile(&config).outline.expect("outline");
    let quads = outline
        .segments
        .iter()
        .filter(|s| matches!(s, Segment::Quad { .. }))
        .count();
    assert_eq!(quads, 3);
    assert!(outline.closed);
}

#[test]
fn pentagon_points_up() {
    let vertices = pentagon_vertices(440.0, 600.0);
    assert_eq!(vertices.len(), 5);
    assert!((vertices[0].x - 220.0).abs() < 1e-9);
    assert!((vertices[0].y - 520.0).abs() < 1e-9);
    let top = vertices
        .iter()
        .fold(f64::MIN, |acc, v| acc.max(v.y));
    assert_eq!(top, vertices[0].y);
}

#[test]
fn circle_ignores_height() {
    let config = PartConfig {
        form: Form::Circle,
        width: 200.0,
        height: 500.0,
        ..PartConfig::default()
    };
    let bbox = build_profile(&config).bbox().expect("bbox");
    assert!((bbox.width() - 200.0).abs() < 1e-6);
    assert!((bbox.height() - 200.0).abs() < 1e-6);
    assert!((bbox.center().y - 250.0).abs() < 1e-6);
}

#[test]
fn line_form_has_minimum_width() {
    let config = PartConfig {
        form: Form::Line,
        thickness: 2.0,
        ..PartConfig::default()
    };
    let bbox = build_profile(&config).bbox().expect("bbox");
    assert!((bbox.width() - 5.0).abs() < 1e-9);
    assert!((bbox.center().x - 220.0).abs() < 1e-9);
}

#[test]
fn no_form_or_bad_dimensions_yield_no_outline() {
    let none = PartConfig {
        form: Form::None,
        ..PartConfig::default()
    };
    assert!(build_profile(&none).outline.is_none());

    let nan = PartConfig {
        width: f64::NAN,
        ..PartConfig::default()
    };
    assert!(build_profile(&nan).outline.is_none());
}

#[test]
fn rings_drop_holes_outside_the_outline() {
    let config = PartConfig {
        form: Form::Pentagon,
        holes: vec![
            Hole {
                id: "corner".into(),
                x: 10.0,
                y: 10.0,
                diameter: 8.0,
            },
            Hole {
                id: "middle".into(),
                x: 220.0,
                y: 300.0,
                diameter: 20.0,
            },
        ],
        ..PartConfig::default()
    };
    let profile = build_profile(&config);
    assert_eq!(profile.holes.len(), 2);

    let regions = profile.rings(&FlattenTolerance::default()).expect("rings");
    assert_eq!(regions.len(), 1);
    let rings = &regions[0];
    assert_eq!(rings.holes.len(), 1);
    assert!(partcfg_core::geom::signed_area(&rings.outer) > 0.0);
    assert!(partcfg_core::geom::signed_area(&rings.holes[0]) < 0.0);
}

fn hole(id: &str, x: f64, y: f64, diameter: f64) -> Hole {
    Hole {
        id: id.into(),
        x,
        y,
        diameter,
    }
}

#[test]
fn overlapping_holes_merge_into_one_cutout() {
    let config = PartConfig {
        holes: vec![
            hole("a", 100.0, 100.0, 20.0),
            hole("b", 110.0, 100.0, 20.0),
            hole("c", 300.0, 300.0, 8.0),
            hole("d", 300.0, 300.0, 8.0),
        ],
        ..PartConfig::default()
    };
    let regions = build_profile(&config)
        .rings(&FlattenTolerance::default())
        .expect("rings");
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].holes.len(), 2);
    assert!(regions[0]
        .holes
        .iter()
        .all(|ring| partcfg_core::geom::signed_area(ring) < 0.0));
}

#[test]
fn hole_across_a_thin_bar_splits_it() {
    let config = PartConfig {
        form: Form::Rectangle,
        width: 200.0,
        height: 10.0,
        holes: vec![hole("wide", 100.0, 5.0, 30.0)],
        ..PartConfig::default()
    };
    let regions = build_profile(&config)
        .rings(&FlattenTolerance::default())
        .expect("rings");
    assert_eq!(regions.len(), 2);
    for region in &regions {
        assert!(region.holes.is_empty());
        assert!(partcfg_core::geom::signed_area(&region.outer) > 0.0);
    }
}
