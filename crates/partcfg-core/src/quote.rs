use crate::error::ConfigError;
use crate::model::{Material, PartConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const QUANTITY_RANGE: (u32, u32) = (1, 1000);
pub const HOLE_COST: f64 = 2.0;
/// Cutting cost per metre of envelope perimeter.
pub const CUTTING_COST_PER_M: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quantity: u32,
    pub material_cost: f64,
    pub hole_cost: f64,
    pub cutting_cost: f64,
    pub unit_price: f64,
    /// Fraction taken off the gross price, e.g. `0.05`.
    pub discount: f64,
    pub total: f64,
}

pub fn quantity_discount(quantity: u32) -> f64 {
    if quantity >= 10 {
        0.10
    } else if quantity >= 5 {
        0.05
    } else {
        0.0
    }
}

pub fn quote(config: &PartConfig, quantity: u32) -> Result<Quote, ConfigError> {
    if !(QUANTITY_RANGE.0..=QUANTITY_RANGE.1).contains(&quantity) {
        return Err(ConfigError::Quantity(quantity));
    }
    let area_m2 = config.width * config.height / 1_000_000.0;
    let material_cost = config.material.cost_per_m2() * area_m2;
    let hole_cost = config.holes.len() as f64 * HOLE_COST;
    let perimeter_m = 2.0 * (config.width + config.height) / 1000.0;
    let cutting_cost = perimeter_m * CUTTING_COST_PER_M;

    let unit_price = material_cost + hole_cost + cutting_cost;
    let discount = quantity_discount(quantity);
    let total = round_cents(unit_price * quantity as f64 * (1.0 - discount));

    Ok(Quote {
        quantity,
        material_cost,
        hole_cost,
        cutting_cost,
        unit_price,
        discount,
        total,
    })
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Summary attached to generated CAD files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartMetadata {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub material: Material,
    pub holes_count: usize,
    /// ISO-8601; the backend may omit the UTC offset.
    pub generated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_mm2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mm3: Option<f64>,
}

impl PartMetadata {
    /// Area and volume use the bounding envelope, matching how parts are priced.
    pub fn for_config(config: &PartConfig, generated_at: DateTime<Utc>) -> Self {
        let area = config.width * config.height;
        Self {
            width: config.width,
            height: config.height,
            thickness: config.thickness,
            material: config.material,
            holes_count: config.holes.len(),
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            area_mm2: Some(area),
            volume_mm3: Some(area * config.thickness),
        }
    }
}
