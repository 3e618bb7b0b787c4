use crate::drawing::CustomShape;
use crate::geom::{clamp_with_margin, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diameter given to holes placed by clicking on the canvas.
pub const DEFAULT_HOLE_DIAMETER: f64 = 8.0;
/// Narrowest outline drawn for the `Line` form.
pub const MIN_LINE_WIDTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    Rectangle,
    Circle,
    Pentagon,
    CustomPolygon,
    Line,
    None,
}

impl Form {
    pub const ALL: [Form; 6] = [
        Form::Rectangle,
        Form::Circle,
        Form::Pentagon,
        Form::CustomPolygon,
        Form::Line,
        Form::None,
    ];

    pub fn uses_corner_radius(self) -> bool {
        matches!(self, Form::Rectangle | Form::Pentagon | Form::CustomPolygon)
    }

    pub fn label(self) -> &'static str {
        match self {
            Form::Rectangle => "Rectangle",
            Form::Circle => "Circle",
            Form::Pentagon => "Pentagon",
            Form::CustomPolygon => "Custom shape",
            Form::Line => "Line",
            Form::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "PE 500")]
    Pe500,
    #[serde(rename = "PE 1000")]
    Pe1000,
    #[serde(rename = "PP")]
    Pp,
    #[serde(rename = "POM")]
    Pom,
}

impl Material {
    pub const ALL: [Material; 4] = [Material::Pe500, Material::Pe1000, Material::Pp, Material::Pom];

    pub fn name(self) -> &'static str {
        match self {
            Material::Pe500 => "PE 500",
            Material::Pe1000 => "PE 1000",
            Material::Pp => "PP",
            Material::Pom => "POM",
        }
    }

    /// Sheet cost per square metre.
    pub fn cost_per_m2(self) -> f64 {
        match self {
            Material::Pe500 => 50.0,
            Material::Pe1000 => 65.0,
            Material::Pp => 45.0,
            Material::Pom => 80.0,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Front,
    Side,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Vec2 {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Point {
        Point { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
}

impl Hole {
    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Pull the center back inside `[r, extent - r]` on both axes.
    pub fn clamp_to(&mut self, width: f64, height: f64) {
        let r = self.radius();
        self.x = clamp_with_margin(self.x, r, width);
        self.y = clamp_with_margin(self.y, r, height);
    }

    pub fn is_within(&self, width: f64, height: f64) -> bool {
        let r = self.radius();
        self.x >= r && self.x <= width - r && self.y >= r && self.y <= height - r
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    pub form: Form,
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    #[serde(default)]
    pub corner_radius: f64,
    pub color: String,
    pub material: Material,
    #[serde(default)]
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub custom: CustomShape,
    pub view_mode: ViewMode,
    #[serde(default = "default_true")]
    pub show_measurements: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            form: Form::Rectangle,
            width: 440.0,
            height: 600.0,
            thickness: 5.0,
            corner_radius: 0.0,
            color: "#ffffff".to_string(),
            material: Material::Pe500,
            holes: Vec::new(),
            custom: CustomShape::default(),
            view_mode: ViewMode::Front,
            show_measurements: true,
        }
    }
}

/// A problem that blocks manufacturing, reported rather than thrown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub code: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
        }
    }
}

pub const WIDTH_RANGE: (f64, f64) = (50.0, 3000.0);
pub const HEIGHT_RANGE: (f64, f64) = (50.0, 2000.0);
pub const THICKNESS_RANGE: (f64, f64) = (1.0, 50.0);
pub const MAX_HOLE_DIAMETER: f64 = 100.0;

impl PartConfig {
    pub fn hole(&self, id: &str) -> Option<&Hole> {
        self.holes.iter().find(|h| h.id == id)
    }

    pub fn hole_mut(&mut self, id: &str) -> Option<&mut Hole> {
        self.holes.iter_mut().find(|h| h.id == id)
    }

    pub fn has_valid_dimensions(&self) -> bool {
        [self.width, self.height, self.thickness]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Manufacturing limits checked before an order is placed.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        check_range(&mut issues, "width", self.width, WIDTH_RANGE);
        check_range(&mut issues, "height", self.height, HEIGHT_RANGE);
        check_range(&mut issues, "thickness", self.thickness, THICKNESS_RANGE);

        if self.form == Form::None {
            issues.push(ConfigIssue::new("no_form", "No shape selected.".to_string()));
        }
        if self.form == Form::CustomPolygon && !self.custom.is_closed() {
            issues.push(ConfigIssue::new(
                "open_custom_shape",
                format!(
                    "Custom shape needs at least 3 points, has {}.",
                    self.custom.points.len()
                ),
            ));
        }

        for hole in &self.holes {
            if !(hole.diameter > 0.0 && hole.diameter <= MAX_HOLE_DIAMETER) {
                issues.push(ConfigIssue::new(
                    "hole_diameter",
                    format!(
                        "Hole {} diameter {} mm outside (0, {MAX_HOLE_DIAMETER}].",
                        hole.id, hole.diameter
                    ),
                ));
            }
            if !hole.is_within(self.width, self.height) {
                issues.push(ConfigIssue::new(
                    "hole_out_of_bounds",
                    format!("Hole {} does not fit inside the part.", hole.id),
                ));
            }
        }
        issues
    }
}

fn check_range(issues: &mut Vec<ConfigIssue>, field: &str, value: f64, (min, max): (f64, f64)) {
    if !(value >= min && value <= max) {
        issues.push(ConfigIssue::new(
            "dimension_out_of_range",
            format!("{field} {value} mm outside [{min}, {max}]."),
        ));
    }
}

/// Parse a number typed into a dimension field. Empty or non-numeric input is
/// rejected instead of becoming NaN.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, crate::error::ConfigError> {
    let trimmed = raw.trim().replace(',', ".");
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(crate::error::ConfigError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}
