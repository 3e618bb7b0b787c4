use partcfg_core::drawing::CustomShape;
use partcfg_core::extrude::{extrude_config, ExtrudeOptions, Mesh, MeshCache};
use partcfg_core::model::{Form, Hole, PartConfig, Point};
use partcfg_core::ExtrudeError;

fn with_hole() -> PartConfig {
    PartConfig {
        holes: vec![Hole {
            id: "h1".into(),
            x: 100.0,
            y: 100.0,
            diameter: 20.0,
        }],
        ..PartConfig::default()
    }
}

fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.map(|i| mesh.positions[i as usize].map(f64::from));
            let cross = [
                b[1] * c[2] - b[2] * c[1],
                b[2] * c[0] - b[0] * c[2],
                b[0] * c[1] - b[1] * c[0],
            ];
            (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
        })
        .sum()
}

#[test]
fn extrusion_is_idempotent() {
    let config = with_hole();
    let opts = ExtrudeOptions::default();
    let a = extrude_config(&config, &opts).unwrap();
    let b = extrude_config(&config, &opts).unwrap();
    assert_eq!(a.vertex_count(), b.vertex_count());
    assert_eq!(a.bounds(), b.bounds());
    assert_eq!(a, b);
}

#[test]
fn solid_fills_the_part_envelope() {
    let mesh = extrude_config(&PartConfig::default(), &ExtrudeOptions::default()).unwrap();
    let bounds = mesh.bounds().unwrap();
    assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
    assert_eq!(bounds.max, [440.0, 600.0, 5.0]);
}

#[test]
fn sharp_box_has_expected_topology() {
    let opts = ExtrudeOptions {
        bevel: 0.0,
        ..ExtrudeOptions::default()
    };
    let mesh = extrude_config(&PartConfig::default(), &opts).unwrap();
    // Two rings of four vertices; four wall quads plus two caps of two triangles.
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 12);
    assert!((signed_volume(&mesh) - 440.0 * 600.0 * 5.0).abs() < 1.0);
}

#[test]
fn bevelled_box_adds_layers_and_stays_closed() {
    let mesh = extrude_config(&PartConfig::default(), &ExtrudeOptions::default()).unwrap();
    // Six layers (3 per bevelled edge) of four vertices.
    assert_eq!(mesh.vertex_count(), 24);
    assert_eq!(mesh.triangle_count(), 5 * 4 * 2 + 4);

    let full = 440.0 * 600.0 * 5.0;
    let volume = signed_volume(&mesh);
    assert!(volume > 0.99 * full && volume < full, "{volume}");
}

#[test]
fn holes_cut_through_the_solid() {
    let plain = extrude_config(&PartConfig::default(), &ExtrudeOptions::default()).unwrap();
    let holed = extrude_config(&with_hole(), &ExtrudeOptions::default()).unwrap();
    assert!(holed.vertex_count() > plain.vertex_count());

    let removed = signed_volume(&plain) - signed_volume(&holed);
    let cylinder = std::f64::consts::PI * 10.0 * 10.0 * 5.0;
    assert!(removed > 0.9 * cylinder && removed < 1.2 * cylinder, "{removed}");
}

#[test]
fn hole_outside_a_circle_is_ignored() {
    let mut config = with_hole();
    config.form = Form::Circle;
    config.holes[0].x = 15.0;
    config.holes[0].y = 15.0;
    let mut plain = config.clone();
    plain.holes.clear();

    let opts = ExtrudeOptions::default();
    assert_eq!(
        extrude_config(&config, &opts).unwrap().vertex_count(),
        extrude_config(&plain, &opts).unwrap().vertex_count()
    );
}

fn removed_by(holes: Vec<Hole>) -> f64 {
    let opts = ExtrudeOptions::default();
    let plain = extrude_config(&PartConfig::default(), &opts).unwrap();
    let config = PartConfig {
        holes,
        ..PartConfig::default()
    };
    let holed = extrude_config(&config, &opts).unwrap();
    signed_volume(&plain) - signed_volume(&holed)
}

fn hole_at(id: &str, x: f64, y: f64, diameter: f64) -> Hole {
    Hole {
        id: id.into(),
        x,
        y,
        diameter,
    }
}

#[test]
fn coincident_holes_cut_like_one() {
    let single = removed_by(vec![hole_at("a", 100.0, 100.0, 8.0)]);
    let doubled = removed_by(vec![
        hole_at("a", 100.0, 100.0, 8.0),
        hole_at("b", 100.0, 100.0, 8.0),
    ]);
    assert!((single - doubled).abs() < 1.0, "{single} vs {doubled}");
}

#[test]
fn overlapping_holes_remove_their_union() {
    let removed = removed_by(vec![
        hole_at("a", 100.0, 100.0, 20.0),
        hole_at("b", 110.0, 100.0, 20.0),
    ]);
    // Two r = 10 disks 10 mm apart cover 2πr² minus their 122.84 mm² lens.
    let union = (2.0 * std::f64::consts::PI * 100.0 - 122.84) * 5.0;
    assert!(removed > 0.95 * union && removed < 1.1 * union, "{removed}");
}

#[test]
fn hole_crossing_the_outline_stays_inside_the_envelope() {
    let plain = PartConfig {
        form: Form::Circle,
        width: 100.0,
        height: 100.0,
        ..PartConfig::default()
    };
    let opts = ExtrudeOptions::default();
    let full = signed_volume(&extrude_config(&plain, &opts).unwrap());

    // Tangent to the rim, then clearly across it with about 40 mm² inside.
    for (x, min_removed) in [(96.0, -1.0), (98.0, 100.0)] {
        let notched = PartConfig {
            holes: vec![hole_at("edge", x, 50.0, 8.0)],
            ..plain.clone()
        };
        let mesh = extrude_config(&notched, &opts).unwrap();

        let bounds = mesh.bounds().unwrap();
        assert!(bounds.max[0] <= 100.0 + 1e-3, "x = {x}: {:?}", bounds.max);
        assert!(bounds.min[0] >= -1e-3 && bounds.min[1] >= -1e-3);
        assert!(bounds.max[1] <= 100.0 + 1e-3);
        let volume = signed_volume(&mesh);
        assert!(volume > 0.0 && full - volume > min_removed, "x = {x}: {volume}");
    }
}

#[test]
fn hole_swallowing_the_part_leaves_no_material() {
    let config = PartConfig {
        width: 20.0,
        height: 20.0,
        holes: vec![hole_at("huge", 10.0, 10.0, 100.0)],
        ..PartConfig::default()
    };
    assert_eq!(
        extrude_config(&config, &ExtrudeOptions::default()),
        Err(ExtrudeError::NoMaterial)
    );
}

#[test]
fn rejects_unusable_profiles() {
    let opts = ExtrudeOptions::default();

    let none = PartConfig {
        form: Form::None,
        ..PartConfig::default()
    };
    assert_eq!(extrude_config(&none, &opts), Err(ExtrudeError::NoOutline));

    let open = PartConfig {
        form: Form::CustomPolygon,
        custom: CustomShape {
            points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 10.0, y: 0.0 }],
            finalized: false,
        },
        ..PartConfig::default()
    };
    assert_eq!(extrude_config(&open, &opts), Err(ExtrudeError::OpenOutline));

    let flat = PartConfig {
        thickness: 0.0,
        ..PartConfig::default()
    };
    assert_eq!(
        extrude_config(&flat, &opts),
        Err(ExtrudeError::InvalidThickness(0.0))
    );
}

#[test]
fn cache_only_rebuilds_on_geometry_change() {
    let mut cache = MeshCache::new(ExtrudeOptions::default());
    let mut config = with_hole();

    let first = cache.get(&config).unwrap().clone();
    cache.get(&config).unwrap();
    assert_eq!(cache.rebuilds(), 1);

    config.color = "#ff0000".into();
    config.show_measurements = false;
    assert_eq!(cache.get(&config).unwrap(), &first);
    assert_eq!(cache.rebuilds(), 1);

    config.holes[0].diameter = 30.0;
    cache.get(&config).unwrap();
    assert_eq!(cache.rebuilds(), 2);

    config.form = Form::None;
    assert!(cache.get(&config).is_err());
    assert!(cache.get(&config).is_err());
    assert_eq!(cache.rebuilds(), 3);
}
