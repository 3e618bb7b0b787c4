//! Part-space (mm, y-up) ↔ canvas pixel (y-down) mapping, zoom/pan, hit testing.

use crate::geom::Vec2;
use crate::model::{Hole, PartConfig, Point, ViewMode};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_OUT_STEP: f64 = 0.9;
pub const ZOOM_IN_STEP: f64 = 1.1;
/// Space kept free on every canvas edge for labels.
pub const CANVAS_PADDING_PX: f64 = 40.0;
/// Extra grab radius around holes.
pub const HOLE_HIT_TOLERANCE_PX: f64 = 5.0;
pub const POINT_HIT_RADIUS_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Vec2,
    #[serde(skip)]
    pan_anchor: Option<Vec2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            pan_anchor: None,
        }
    }
}

impl Viewport {
    /// Scroll-to-zoom: positive delta zooms out, negative zooms in.
    pub fn wheel(&mut self, delta: f64) {
        if delta > 0.0 {
            self.zoom *= ZOOM_OUT_STEP;
        } else if delta < 0.0 {
            self.zoom *= ZOOM_IN_STEP;
        }
        self.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn begin_pan(&mut self, pointer: Vec2) {
        self.pan_anchor = Some(pointer - self.pan);
    }

    pub fn update_pan(&mut self, pointer: Vec2) -> bool {
        match self.pan_anchor {
            Some(anchor) => {
                self.pan = pointer - anchor;
                true
            }
            None => false,
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Millimetre extents shown for a view: front → (w, h), side → (t, h), top → (w, t).
pub fn display_extents(config: &PartConfig) -> (f64, f64) {
    match config.view_mode {
        ViewMode::Front => (config.width, config.height),
        ViewMode::Side => (config.thickness, config.height),
        ViewMode::Top => (config.width, config.thickness),
    }
}

/// Resolved transform for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub scale: f64,
    /// Pixel position of the part-space origin (bottom-left corner).
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Layout {
    pub fn to_pixel(&self, mm: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + mm.x * self.scale,
            self.offset_y - mm.y * self.scale,
        )
    }

    pub fn to_part(&self, px: Vec2) -> Vec2 {
        Vec2::new(
            (px.x - self.offset_x) / self.scale,
            (self.offset_y - px.y) / self.scale,
        )
    }

    pub fn mm_to_px(&self, mm: f64) -> f64 {
        mm * self.scale
    }

    /// Part-space point lies inside the displayed extents.
    pub fn contains_part_point(&self, mm: Vec2) -> bool {
        mm.x >= 0.0 && mm.x <= self.display_width && mm.y >= 0.0 && mm.y <= self.display_height
    }
}

pub fn compute_layout(
    canvas_width: f64,
    canvas_height: f64,
    config: &PartConfig,
    viewport: &Viewport,
) -> Layout {
    let (dw, dh) = display_extents(config);
    let dw = positive_or(dw, 1.0);
    let dh = positive_or(dh, 1.0);

    let avail_w = (canvas_width - 2.0 * CANVAS_PADDING_PX).max(1.0);
    let avail_h = (canvas_height - 2.0 * CANVAS_PADDING_PX).max(1.0);
    let scale = (avail_w / dw).min(avail_h / dh) * viewport.zoom;

    let left = (canvas_width - dw * scale) * 0.5 + viewport.pan.x;
    let top = (canvas_height - dh * scale) * 0.5 + viewport.pan.y;

    Layout {
        canvas_width,
        canvas_height,
        display_width: dw,
        display_height: dh,
        scale,
        offset_x: left,
        offset_y: top + dh * scale,
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        fallback
    }
}

/// First hole (insertion order) whose projected disc, grown by
/// [`HOLE_HIT_TOLERANCE_PX`], contains the pixel.
pub fn find_hole_at<'a>(layout: &Layout, holes: &'a [Hole], px: Vec2) -> Option<&'a Hole> {
    holes.iter().find(|hole| {
        let center = layout.to_pixel(hole.center());
        let reach = layout.mm_to_px(hole.radius()) + HOLE_HIT_TOLERANCE_PX;
        crate::geom::point_in_circle(px, center, reach)
    })
}

pub fn find_point_at(layout: &Layout, points: &[Point], px: Vec2) -> Option<usize> {
    points.iter().position(|p| {
        let center = layout.to_pixel(Vec2::from(*p));
        crate::geom::point_in_circle(px, center, POINT_HIT_RADIUS_PX)
    })
}
