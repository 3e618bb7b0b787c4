//! Sanity checks for STEP files, whether produced by the CAD backend or by
//! [`crate::step::fallback_step`].

use crate::canvas::format_mm;
use crate::model::PartConfig;
use crate::step::FALLBACK_MARKER;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Files smaller than this cannot hold a meaningful part.
pub const MIN_STEP_BYTES: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl StepValidation {
    fn finish(errors: Vec<String>, warnings: Vec<String>, file_size: Option<u64>) -> Self {
        let valid = errors.is_empty();
        let size = file_size.unwrap_or(0);
        let message = if valid && warnings.is_empty() {
            format!("Valid STEP file ({size} bytes)")
        } else if valid {
            format!(
                "Valid STEP file ({size} bytes) with {} warning(s)",
                warnings.len()
            )
        } else {
            format!("Invalid STEP file: {} error(s)", errors.len())
        };
        Self {
            valid,
            errors,
            warnings,
            message,
            file_size,
        }
    }
}

pub fn validate_step(content: &str, config: &PartConfig) -> StepValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let size = content.len() as u64;

    if size == 0 {
        errors.push("STEP file is empty (0 bytes)".to_string());
    } else if size < MIN_STEP_BYTES {
        errors.push(format!("STEP file is too small ({size} bytes)"));
    }
    if !content.starts_with("ISO-10303-21") {
        errors.push("Invalid STEP format: missing ISO-10303-21 header".to_string());
    }
    if !content.contains("END-ISO-10303-21") {
        errors.push("Invalid STEP format: missing END-ISO-10303-21 footer".to_string());
    }

    let material = config.material.name();
    let material_found = [
        material.to_string(),
        material.replace(' ', "_"),
        material.replace(' ', ""),
    ]
    .iter()
    .any(|m| content.contains(m.as_str()));
    // Backend exports do not carry custom properties, only fallback files do.
    if !material_found && content.contains(FALLBACK_MARKER) {
        warnings.push(format!("Material \"{material}\" not found in STEP file"));
    }

    for (name, value) in [
        ("Width", config.width),
        ("Height", config.height),
        ("Thickness", config.thickness),
    ] {
        if !mentions_dimension(content, value) {
            warnings.push(format!(
                "{name} dimension ({}mm) not clearly referenced",
                format_mm(value)
            ));
        }
    }

    let holes = config.holes.len();
    if holes > 0
        && !content.contains("CYLINDRICAL_SURFACE")
        && !content.contains("CIRCLE")
        && !content.contains(&holes.to_string())
    {
        warnings.push(format!(
            "Expected {holes} holes but no cylindrical surfaces found"
        ));
    }

    StepValidation::finish(errors, warnings, Some(size))
}

pub fn validate_step_file(path: &Path, config: &PartConfig) -> StepValidation {
    match std::fs::read(path) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            validate_step(&content, config)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StepValidation {
            valid: false,
            errors: vec!["STEP file does not exist".to_string()],
            warnings: Vec::new(),
            message: "File not found".to_string(),
            file_size: None,
        },
        Err(err) => StepValidation::finish(
            vec![format!("Error reading STEP file: {err}")],
            Vec::new(),
            None,
        ),
    }
}

/// Dimensions appear either as integers (`440`, `440.`) or decimals (`12.5`).
fn mentions_dimension(content: &str, value: f64) -> bool {
    let short = format_mm(value);
    let variants = [
        short.clone(),
        format!("{short}."),
        format!("{value}"),
        format!("{value:.1}"),
        format!("{short}mm"),
    ];
    variants.iter().any(|v| content.contains(v.as_str()))
}
