use partcfg_core::geom::Vec2;
use partcfg_core::model::{Hole, PartConfig, Point, ViewMode};
use partcfg_core::viewport::{
    compute_layout, find_hole_at, find_point_at, Layout, Viewport, MAX_ZOOM, MIN_ZOOM,
};

fn scaled_layout(scale: f64) -> Layout {
    Layout {
        canvas_width: 800.0,
        canvas_height: 600.0,
        display_width: 200.0,
        display_height: 200.0,
        scale,
        offset_x: 0.0,
        offset_y: 400.0,
    }
}

#[test]
fn pixel_mapping_round_trips_across_zoom_and_pan() {
    let config = PartConfig::default();
    let samples = [
        Vec2::new(0.0, 0.0),
        Vec2::new(440.0, 600.0),
        Vec2::new(123.4, 56.7),
        Vec2::new(-20.0, 700.0),
    ];
    for zoom in [0.5, 0.75, 1.0, 2.5, 5.0] {
        for pan in [Vec2::ZERO, Vec2::new(120.0, -45.0), Vec2::new(-300.0, 210.5)] {
            let mut viewport = Viewport::default();
            viewport.set_zoom(zoom);
            viewport.pan = pan;
            let layout = compute_layout(800.0, 600.0, &config, &viewport);
            for p in samples {
                let back = layout.to_part(layout.to_pixel(p));
                assert!((back.x - p.x).abs() < 1e-9, "zoom {zoom} pan {pan:?}");
                assert!((back.y - p.y).abs() < 1e-9, "zoom {zoom} pan {pan:?}");
            }
        }
    }
}

#[test]
fn wheel_zoom_stays_clamped() {
    let mut viewport = Viewport::default();
    for _ in 0..100 {
        viewport.wheel(-1.0);
        assert!(viewport.zoom <= MAX_ZOOM);
    }
    assert_eq!(viewport.zoom, MAX_ZOOM);
    for _ in 0..100 {
        viewport.wheel(1.0);
        assert!(viewport.zoom >= MIN_ZOOM);
    }
    assert_eq!(viewport.zoom, MIN_ZOOM);

    viewport.wheel(0.0);
    assert_eq!(viewport.zoom, MIN_ZOOM);
}

#[test]
fn wheel_steps_are_multiplicative() {
    let mut viewport = Viewport::default();
    viewport.wheel(3.0);
    assert!((viewport.zoom - 0.9).abs() < 1e-12);
    viewport.wheel(-3.0);
    assert!((viewport.zoom - 0.99).abs() < 1e-12);
}

#[test]
fn layout_centers_part_inside_padding() {
    let config = PartConfig::default();
    let layout = compute_layout(800.0, 600.0, &config, &Viewport::default());
    // 440 x 600 mm into 720 x 520 px: height limits.
    assert!((layout.scale - 520.0 / 600.0).abs() < 1e-12);

    let bottom_left = layout.to_pixel(Vec2::new(0.0, 0.0));
    let top_right = layout.to_pixel(Vec2::new(440.0, 600.0));
    assert!((bottom_left.y - 560.0).abs() < 1e-9);
    assert!((top_right.y - 40.0).abs() < 1e-9);
    assert!(((bottom_left.x + top_right.x) * 0.5 - 400.0).abs() < 1e-9);
}

#[test]
fn side_view_displays_thickness_by_height() {
    let config = PartConfig {
        view_mode: ViewMode::Side,
        ..PartConfig::default()
    };
    let layout = compute_layout(800.0, 600.0, &config, &Viewport::default());
    assert_eq!(layout.display_width, 5.0);
    assert_eq!(layout.display_height, 600.0);
}

#[test]
fn hole_hit_test_includes_tolerance_ring() {
    let layout = scaled_layout(2.0);
    let holes = vec![Hole {
        id: "h1".into(),
        x: 50.0,
        y: 50.0,
        diameter: 10.0,
    }];
    let center = layout.to_pixel(Vec2::new(50.0, 50.0));
    assert_eq!(center, Vec2::new(100.0, 300.0));

    assert!(find_hole_at(&layout, &holes, center).is_some());
    assert!(find_hole_at(&layout, &holes, Vec2::new(115.0, 300.0)).is_some());
    assert!(find_hole_at(&layout, &holes, Vec2::new(100.0, 285.0)).is_some());
    assert!(find_hole_at(&layout, &holes, Vec2::new(115.5, 300.0)).is_none());
    assert!(find_hole_at(&layout, &holes, Vec2::new(112.0, 312.0)).is_none());
}

#[test]
fn first_hole_in_insertion_order_wins() {
    let layout = scaled_layout(1.0);
    let holes = vec![
        Hole {
            id: "first".into(),
            x: 50.0,
            y: 50.0,
            diameter: 20.0,
        },
        Hole {
            id: "second".into(),
            x: 55.0,
            y: 50.0,
            diameter: 20.0,
        },
    ];
    let px = layout.to_pixel(Vec2::new(53.0, 50.0));
    assert_eq!(find_hole_at(&layout, &holes, px).map(|h| h.id.as_str()), Some("first"));
}

#[test]
fn point_hit_radius_is_eight_pixels() {
    let layout = scaled_layout(1.0);
    let points = [Point { x: 10.0, y: 10.0 }, Point { x: 100.0, y: 10.0 }];
    let p = layout.to_pixel(Vec2::new(100.0, 10.0));
    assert_eq!(find_point_at(&layout, &points, p + Vec2::new(8.0, 0.0)), Some(1));
    assert_eq!(find_point_at(&layout, &points, p + Vec2::new(8.1, 0.0)), None);
}
