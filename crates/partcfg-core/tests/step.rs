use chrono::{TimeZone, Utc};
use partcfg_core::model::{Hole, Material, PartConfig};
use partcfg_core::step::{fallback_step, FALLBACK_MARKER};
use partcfg_core::validate::{validate_step, validate_step_file};

fn part() -> PartConfig {
    PartConfig {
        material: Material::Pe1000,
        thickness: 12.5,
        holes: vec![
            Hole {
                id: "h1".into(),
                x: 50.0,
                y: 50.0,
                diameter: 8.0,
            },
            Hole {
                id: "h2".into(),
                x: 390.0,
                y: 550.0,
                diameter: 8.0,
            },
        ],
        ..PartConfig::default()
    }
}

#[test]
fn writes_fallback_step_skeleton() {
    let generated_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let step = fallback_step(&part(), generated_at);

    assert!(step.starts_with("ISO-10303-21;"));
    assert!(step.trim_end().ends_with("END-ISO-10303-21;"));
    assert!(step.contains("'2024-03-01T12:30:00'"));
    assert!(step.contains(FALLBACK_MARKER));
    assert!(step.contains("PRODUCT('PlasticPart_PE_1000'"));
    assert!(step.contains("PROPERTY_DEFINITION('material','PE 1000'"));
    assert!(step.contains("PROPERTY_DEFINITION('thickness','12.5'"));
    assert!(step.contains("/* Holes: 2 */"));
    assert!(step.contains("CARTESIAN_POINT('',(440.000000,600.000000,12.500000))"));
    assert!(step.contains("POLYLINE('outline'"));
    assert_eq!(step.matches("CIRCLE('h").count(), 2);
}

#[test]
fn fallback_output_passes_validation() {
    let config = part();
    let step = fallback_step(&config, Utc::now());
    let report = validate_step(&step, &config);
    assert!(report.valid, "{report:?}");
    assert!(report.warnings.is_empty(), "{report:?}");
    assert_eq!(report.file_size, Some(step.len() as u64));
    assert!(report.message.starts_with("Valid STEP file"));
}

#[test]
fn rejects_truncated_content() {
    let report = validate_step("HEADER;", &part());
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 3);
    assert_eq!(report.message, "Invalid STEP file: 3 error(s)");
}

#[test]
fn warns_when_fallback_lacks_material() {
    let config = part();
    let step = fallback_step(&config, Utc::now());
    let other = PartConfig {
        material: Material::Pom,
        ..config
    };
    let report = validate_step(&step, &other);
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.message.ends_with("with 1 warning(s)"));
}

#[test]
fn validates_files_on_disk() {
    let config = part();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part.step");

    let missing = validate_step_file(&path, &config);
    assert!(!missing.valid);
    assert_eq!(missing.message, "File not found");

    std::fs::write(&path, fallback_step(&config, Utc::now())).unwrap();
    assert!(validate_step_file(&path, &config).valid);
}
