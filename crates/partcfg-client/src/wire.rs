//! JSON bodies exchanged with the CAD / order backend.

use partcfg_core::model::{Hole, Material, PartConfig};
use partcfg_core::quote::PartMetadata;
use partcfg_core::validate::StepValidation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The part as the backend sees it: dimensions, material and holes only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePart {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub material: Material,
    pub holes: Vec<Hole>,
}

impl From<&PartConfig> for WirePart {
    fn from(c: &PartConfig) -> Self {
        Self {
            width: c.width,
            height: c.height,
            thickness: c.thickness,
            material: c.material,
            holes: c.holes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadRequest {
    pub config: WirePart,
    pub format: String,
}

impl CadRequest {
    pub fn both(part: &PartConfig) -> Self {
        Self {
            config: part.into(),
            format: "both".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadResponse {
    pub step_file_url: String,
    pub dxf_file_url: String,
    #[serde(default)]
    pub glb_file_url: Option<String>,
    #[serde(default)]
    pub preview_images: Vec<String>,
    pub metadata: PartMetadata,
    #[serde(default)]
    pub validation: Option<StepValidation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub config: WirePart,
    pub quantity: u32,
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub step_file_url: Option<String>,
    #[serde(default)]
    pub dxf_file_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// `ORD-YYYYMMDD-XXXXXX` with an uppercase hex suffix.
pub fn is_order_number(s: &str) -> bool {
    let mut parts = s.split('-');
    let (Some("ORD"), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && chrono::NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && suffix.len() == 6
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_follow_backend_format() {
        assert!(is_order_number("ORD-20240301-A1B2C3"));
        assert!(!is_order_number("ORD-20241301-A1B2C3"));
        assert!(!is_order_number("ORD-20240301-a1b2c3"));
        assert!(!is_order_number("ORD-20240301-A1B2C3-X"));
        assert!(!is_order_number("20240301-A1B2C3"));
    }

    #[test]
    fn cad_request_matches_backend_shape() {
        let json = serde_json::to_value(CadRequest::both(&PartConfig::default())).unwrap();
        assert_eq!(json["format"], "both");
        assert_eq!(json["config"]["material"], "PE 500");
        assert_eq!(json["config"]["width"], 440.0);
        assert!(json["config"]["holes"].as_array().unwrap().is_empty());
        assert!(json["config"].get("form").is_none());
    }
}
