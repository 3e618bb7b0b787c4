//! Single owner of the [`PartConfig`]. Every mutation goes through a command
//! method, bumps the revision, raises the dirty flag and notifies subscribers.

use crate::drawing::CustomShape;
use crate::error::ConfigError;
use crate::model::{Form, Hole, Material, PartConfig, Point, ViewMode};
use tracing::debug;

pub type Subscriber = Box<dyn FnMut(&PartConfig)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HoleUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub diameter: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
    Thickness,
}

impl Dimension {
    fn field(self) -> &'static str {
        match self {
            Dimension::Width => "width",
            Dimension::Height => "height",
            Dimension::Thickness => "thickness",
        }
    }
}

pub struct ConfigStore {
    config: PartConfig,
    /// Custom shape parked while another form is active.
    saved_custom: Option<CustomShape>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: usize,
    revision: u64,
    dirty: bool,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(PartConfig::default())
    }
}

impl ConfigStore {
    pub fn new(config: PartConfig) -> Self {
        Self {
            config,
            saved_custom: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            revision: 0,
            dirty: true,
        }
    }

    pub fn config(&self) -> &PartConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, f: impl FnMut(&PartConfig) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn commit(&mut self) -> &PartConfig {
        self.revision += 1;
        self.dirty = true;
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.config);
        }
        &self.config
    }

    pub fn replace(&mut self, config: PartConfig) -> &PartConfig {
        self.config = config;
        self.saved_custom = None;
        self.commit()
    }

    // -- holes -------------------------------------------------------------

    /// Adds a hole (clamped into the part) and returns its id.
    pub fn add_hole(&mut self, x: f64, y: f64, diameter: f64) -> Result<String, ConfigError> {
        let x = finite("x", x)?;
        let y = finite("y", y)?;
        let diameter = positive("diameter", diameter)?;

        let mut hole = Hole {
            id: new_hole_id(),
            x,
            y,
            diameter,
        };
        hole.clamp_to(self.config.width, self.config.height);
        let id = hole.id.clone();
        debug!(%id, x = hole.x, y = hole.y, diameter, "add hole");
        self.config.holes.push(hole);
        self.commit();
        Ok(id)
    }

    pub fn update_hole(&mut self, id: &str, update: HoleUpdate) -> Result<&PartConfig, ConfigError> {
        let x = update.x.map(|v| finite("x", v)).transpose()?;
        let y = update.y.map(|v| finite("y", v)).transpose()?;
        let diameter = update.diameter.map(|v| positive("diameter", v)).transpose()?;

        let (width, height) = (self.config.width, self.config.height);
        let hole = self
            .config
            .hole_mut(id)
            .ok_or_else(|| ConfigError::UnknownHole(id.to_string()))?;
        if let Some(x) = x {
            hole.x = x;
        }
        if let Some(y) = y {
            hole.y = y;
        }
        if let Some(d) = diameter {
            hole.diameter = d;
        }
        hole.clamp_to(width, height);
        Ok(self.commit())
    }

    pub fn move_hole(&mut self, id: &str, x: f64, y: f64) -> Result<&PartConfig, ConfigError> {
        self.update_hole(
            id,
            HoleUpdate {
                x: Some(x),
                y: Some(y),
                diameter: None,
            },
        )
    }

    pub fn remove_hole(&mut self, id: &str) -> Result<Hole, ConfigError> {
        let idx = self
            .config
            .holes
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| ConfigError::UnknownHole(id.to_string()))?;
        let hole = self.config.holes.remove(idx);
        debug!(id, "remove hole");
        self.commit();
        Ok(hole)
    }

    // -- shape & dimensions ------------------------------------------------

    pub fn set_form(&mut self, form: Form) -> &PartConfig {
        let previous = self.config.form;
        if previous == form {
            return &self.config;
        }
        if previous == Form::CustomPolygon {
            self.saved_custom = Some(std::mem::take(&mut self.config.custom));
        }
        if form == Form::CustomPolygon {
            if let Some(saved) = self.saved_custom.take() {
                self.config.custom = saved;
            }
        }
        debug!(?previous, ?form, "switch form");
        self.config.form = form;
        self.commit()
    }

    pub fn set_dimension(&mut self, dim: Dimension, value: f64) -> Result<&PartConfig, ConfigError> {
        let value = positive(dim.field(), value)?;
        match dim {
            Dimension::Width => self.config.width = value,
            Dimension::Height => self.config.height = value,
            Dimension::Thickness => self.config.thickness = value,
        }
        self.reclamp_holes();
        Ok(self.commit())
    }

    /// Parse raw text from an input field and apply it.
    pub fn set_dimension_text(&mut self, dim: Dimension, raw: &str) -> Result<&PartConfig, ConfigError> {
        let value = crate::model::parse_number(dim.field(), raw)?;
        self.set_dimension(dim, value)
    }

    pub fn set_corner_radius(&mut self, radius: f64) -> Result<&PartConfig, ConfigError> {
        if !radius.is_finite() {
            return Err(ConfigError::InvalidNumber {
                field: "corner_radius",
                value: radius.to_string(),
            });
        }
        if radius < 0.0 {
            return Err(ConfigError::Negative {
                field: "corner_radius",
                value: radius,
            });
        }
        self.config.corner_radius = radius;
        Ok(self.commit())
    }

    pub fn set_material(&mut self, material: Material) -> &PartConfig {
        self.config.material = material;
        self.commit()
    }

    pub fn set_color(&mut self, color: &str) -> Result<&PartConfig, ConfigError> {
        if crate::canvas::Rgba::from_hex(color).is_none() {
            return Err(ConfigError::InvalidColor(color.to_string()));
        }
        self.config.color = color.to_string();
        Ok(self.commit())
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> &PartConfig {
        self.config.view_mode = mode;
        self.commit()
    }

    pub fn set_show_measurements(&mut self, show: bool) -> &PartConfig {
        self.config.show_measurements = show;
        self.commit()
    }

    fn reclamp_holes(&mut self) {
        let (w, h) = (self.config.width, self.config.height);
        for hole in &mut self.config.holes {
            hole.clamp_to(w, h);
        }
    }

    // -- custom shape ------------------------------------------------------

    fn custom_mut(&mut self) -> Result<&mut CustomShape, ConfigError> {
        if self.config.form != Form::CustomPolygon {
            return Err(ConfigError::NotCustomForm);
        }
        Ok(&mut self.config.custom)
    }

    pub fn add_custom_point(&mut self, point: Point) -> Result<usize, ConfigError> {
        let point = Point {
            x: finite("x", point.x)?,
            y: finite("y", point.y)?,
        };
        let index = self.custom_mut()?.add_point(point)?;
        self.commit();
        Ok(index)
    }

    pub fn remove_custom_point(&mut self, index: usize) -> Result<Point, ConfigError> {
        let point = self.custom_mut()?.remove_point(index)?;
        self.commit();
        Ok(point)
    }

    pub fn finalize_custom(&mut self) -> Result<&PartConfig, ConfigError> {
        self.custom_mut()?.finalize()?;
        Ok(self.commit())
    }

    pub fn edit_custom(&mut self) -> Result<&PartConfig, ConfigError> {
        self.custom_mut()?.edit()?;
        Ok(self.commit())
    }

    pub fn clear_custom(&mut self) -> Result<&PartConfig, ConfigError> {
        self.custom_mut()?.clear();
        Ok(self.commit())
    }
}

fn new_hole_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("hole-{}", &id[..8])
}

fn finite(field: &'static str, v: f64) -> Result<f64, ConfigError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ConfigError::InvalidNumber {
            field,
            value: v.to_string(),
        })
    }
}

fn positive(field: &'static str, v: f64) -> Result<f64, ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(ConfigError::NonPositive { field, value: v })
    }
}
