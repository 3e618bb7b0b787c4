use chrono::Utc;
use partcfg_core::model::{Hole, Material, PartConfig};
use partcfg_core::quote::{quote, PartMetadata};
use partcfg_core::ConfigError;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn prices_single_part() {
    // 0.264 m² of PE 500 plus 2.08 m of cutting.
    let q = quote(&PartConfig::default(), 1).unwrap();
    assert!(close(q.material_cost, 13.2));
    assert!(close(q.cutting_cost, 10.4));
    assert_eq!(q.discount, 0.0);
    assert!(close(q.total, 23.6));
}

#[test]
fn applies_quantity_discounts() {
    let config = PartConfig {
        material: Material::Pom,
        holes: vec![Hole {
            id: "h".into(),
            x: 50.0,
            y: 50.0,
            diameter: 8.0,
        }],
        ..PartConfig::default()
    };
    // 80 * 0.264 + 2 + 10.4 = 33.52 per part.
    assert!(close(quote(&config, 4).unwrap().total, 134.08));
    assert!(close(quote(&config, 5).unwrap().total, 159.22));
    assert!(close(quote(&config, 10).unwrap().total, 301.68));
}

#[test]
fn rejects_quantity_outside_range() {
    let config = PartConfig::default();
    assert_eq!(quote(&config, 0), Err(ConfigError::Quantity(0)));
    assert_eq!(quote(&config, 1001), Err(ConfigError::Quantity(1001)));
    assert!(quote(&config, 1000).is_ok());
}

#[test]
fn metadata_uses_envelope() {
    let meta = PartMetadata::for_config(&PartConfig::default(), Utc::now());
    assert_eq!(meta.area_mm2, Some(264_000.0));
    assert_eq!(meta.volume_mm3, Some(1_320_000.0));
    assert_eq!(meta.holes_count, 0);

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["material"], "PE 500");
}
