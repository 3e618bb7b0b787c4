//! Outline + cut-out construction for every [`Form`].
//!
//! All coordinates are part-space millimetres with the origin at the bottom-left
//! corner and y pointing up.

use crate::geom::{distance_to_ring, point_in_polygon, signed_area, BBox2, Vec2};
use crate::model::{Form, PartConfig, MIN_LINE_WIDTH};
use crate::path::{rounded_polygon, Contour, FlattenTolerance};
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use tracing::{debug, warn};

/// One circular cut-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolePath {
    pub id: String,
    pub center: Vec2,
    pub radius: f64,
}

impl HolePath {
    pub fn contour(&self) -> Contour {
        Contour::circle(self.center, self.radius)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// `None` when nothing can be drawn (no form, invalid dimensions).
    pub outline: Option<Contour>,
    pub holes: Vec<HolePath>,
}

/// One connected piece of material, flattened and ready for triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRings {
    /// Counter-clockwise.
    pub outer: Vec<Vec2>,
    /// Clockwise.
    pub holes: Vec<Vec<Vec2>>,
}

const EDGE_SLACK: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Inside,
    Outside,
    Crossing,
}

impl Profile {
    /// A fillable, extrudable outline exists.
    pub fn is_closed(&self) -> bool {
        self.outline.as_ref().is_some_and(|c| c.closed)
    }

    pub fn bbox(&self) -> Option<BBox2> {
        self.outline.as_ref().map(Contour::bbox)
    }

    /// Flatten the outline minus every hole.
    ///
    /// Holes that sit fully inside the outline and touch no other hole become
    /// plain cut-outs. Overlapping or coincident holes are merged into one
    /// cut-out, and holes crossing the outline notch it. A hole wide enough to
    /// split the part yields more than one region. `None` when there is no
    /// closed outline.
    pub fn rings(&self, tol: &FlattenTolerance) -> Option<Vec<ProfileRings>> {
        let outline = self.outline.as_ref().filter(|c| c.closed)?;
        let mut outer = outline.flatten(tol);
        if outer.len() < 3 {
            return None;
        }
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }

        let mut cutters: Vec<(&HolePath, Vec<Vec2>)> = Vec::with_capacity(self.holes.len());
        let mut crossing = false;
        for hole in self.holes.iter().filter(|h| h.radius > 0.0) {
            let contour = match placement(hole, &outer) {
                Placement::Outside => continue,
                Placement::Inside => hole.contour(),
                Placement::Crossing => {
                    warn!(hole = %hole.id, "hole crosses the outline");
                    crossing = true;
                    // Widened so a hole tangent to the edge opens a notch.
                    Contour::circle(hole.center, hole.radius + EDGE_SLACK)
                }
            };
            let mut ring = contour.flatten(tol);
            if signed_area(&ring) > 0.0 {
                ring.reverse();
            }
            cutters.push((hole, ring));
        }

        let overlapping = cutters.iter().enumerate().any(|(i, (a, _))| {
            cutters[i + 1..]
                .iter()
                .any(|(b, _)| a.center.distance(b.center) <= a.radius + b.radius)
        });
        if !crossing && !overlapping {
            let holes = cutters.into_iter().map(|(_, ring)| ring).collect();
            return Some(vec![ProfileRings { outer, holes }]);
        }

        debug!(cutters = cutters.len(), crossing, overlapping, "merging hole cut-outs");
        let cut = cutters
            .iter()
            .fold(MultiPolygon::<f64>::new(Vec::new()), |acc, (_, ring)| {
                acc.union(&to_polygon(ring))
            });
        let regions = to_polygon(&outer)
            .difference(&cut)
            .into_iter()
            .filter_map(|polygon| from_polygon(&polygon))
            .collect();
        Some(regions)
    }
}

fn placement(hole: &HolePath, outer: &[Vec2]) -> Placement {
    let clearance = distance_to_ring(hole.center, outer);
    if point_in_polygon(hole.center, outer) {
        if clearance > hole.radius {
            Placement::Inside
        } else {
            Placement::Crossing
        }
    } else if clearance >= hole.radius {
        Placement::Outside
    } else {
        Placement::Crossing
    }
}

fn to_polygon(ring: &[Vec2]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(coords), Vec::new())
}

fn open_ring(line: &LineString<f64>) -> Vec<Vec2> {
    let mut ring: Vec<Vec2> = line.coords().map(|c| Vec2::new(c.x, c.y)).collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn from_polygon(polygon: &Polygon<f64>) -> Option<ProfileRings> {
    let mut outer = open_ring(polygon.exterior());
    if outer.len() < 3 || signed_area(&outer).abs() < f64::EPSILON {
        return None;
    }
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }
    let holes = polygon
        .interiors()
        .iter()
        .map(open_ring)
        .filter(|ring| ring.len() >= 3)
        .map(|mut ring| {
            if signed_area(&ring) > 0.0 {
                ring.reverse();
            }
            ring
        })
        .collect();
    Some(ProfileRings { outer, holes })
}

pub fn build_profile(config: &PartConfig) -> Profile {
    let holes = config
        .holes
        .iter()
        .filter(|h| h.diameter.is_finite() && h.diameter > 0.0 && h.center().is_finite())
        .map(|h| HolePath {
            id: h.id.clone(),
            center: h.center(),
            radius: h.radius(),
        })
        .collect();

    Profile {
        outline: build_outline(config),
        holes,
    }
}

fn build_outline(config: &PartConfig) -> Option<Contour> {
    if config.form == Form::CustomPolygon {
        return custom_outline(config);
    }
    if !config.has_valid_dimensions() {
        return None;
    }
    let radius = sanitize_radius(config.corner_radius);
    let (w, h) = (config.width, config.height);
    match config.form {
        Form::Rectangle => Some(rectangle(w, h, radius)),
        Form::Circle => Some(circle(w, h)),
        Form::Pentagon => Some(pentagon(w, h, radius)),
        Form::Line => Some(line(w, h, config.thickness)),
        Form::CustomPolygon | Form::None => None,
    }
}

fn sanitize_radius(r: f64) -> f64 {
    if r.is_finite() && r > 0.0 {
        r
    } else {
        0.0
    }
}

/// Axis-aligned box with optional quarter-circle corners. The radius is
/// clamped to half the smaller side so opposite arcs never cross.
pub fn rectangle(w: f64, h: f64, radius: f64) -> Contour {
    let r = radius.min(w.min(h) * 0.5);
    if r <= 0.0 {
        return Contour::polygon(
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(w, 0.0),
                Vec2::new(w, h),
                Vec2::new(0.0, h),
            ],
            true,
        );
    }

    let mut c = Contour::new(Vec2::new(r, 0.0));
    c.line_to(Vec2::new(w - r, 0.0));
    c.arc(Vec2::new(w - r, r), r, -FRAC_PI_2, FRAC_PI_2);
    c.line_to(Vec2::new(w, h - r));
    c.arc(Vec2::new(w - r, h - r), r, 0.0, FRAC_PI_2);
    c.line_to(Vec2::new(r, h));
    c.arc(Vec2::new(r, h - r), r, FRAC_PI_2, FRAC_PI_2);
    c.line_to(Vec2::new(0.0, r));
    c.arc(Vec2::new(r, r), r, PI, FRAC_PI_2);
    c.close();
    c
}

/// Circle sized by width only; `h` just positions the center.
pub fn circle(w: f64, h: f64) -> Contour {
    Contour::circle(Vec2::new(w * 0.5, h * 0.5), w * 0.5)
}

pub fn pentagon_vertices(w: f64, h: f64) -> Vec<Vec2> {
    let center = Vec2::new(w * 0.5, h * 0.5);
    let r = w * 0.5;
    // First vertex points up on screen; part space is y-up.
    (0..5)
        .map(|i| {
            let angle = FRAC_PI_2 + i as f64 * TAU / 5.0;
            Vec2::new(center.x + r * angle.cos(), center.y + r * angle.sin())
        })
        .collect()
}

pub fn pentagon(w: f64, h: f64, radius: f64) -> Contour {
    rounded_polygon(&pentagon_vertices(w, h), radius)
}

/// Thin vertical strip, centered horizontally.
pub fn line(w: f64, h: f64, thickness: f64) -> Contour {
    let lw = thickness.max(MIN_LINE_WIDTH);
    let x0 = (w - lw) * 0.5;
    let x1 = x0 + lw;
    Contour::polygon(
        &[
            Vec2::new(x0, 0.0),
            Vec2::new(x1, 0.0),
            Vec2::new(x1, h),
            Vec2::new(x0, h),
        ],
        true,
    )
}

fn custom_outline(config: &PartConfig) -> Option<Contour> {
    let points: Vec<Vec2> = config
        .custom
        .points
        .iter()
        .map(|p| Vec2::from(*p))
        .filter(|p| p.is_finite())
        .collect();
    match points.len() {
        0 => None,
        1 | 2 => Some(Contour::polygon(&points, false)),
        _ => Some(rounded_polygon(&points, sanitize_radius(config.corner_radius))),
    }
}
