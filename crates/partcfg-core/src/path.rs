use crate::geom::{approx_eq, BBox2, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Corners sharper than this (radians) are left unrounded.
pub const MIN_CORNER_ANGLE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Line {
        to: Vec2,
    },
    /// Quadratic curve with a single control point.
    Quad {
        ctrl: Vec2,
        to: Vec2,
    },
    /// Circular arc. Angles in radians, positive sweep is counter-clockwise (y-up).
    Arc {
        center: Vec2,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

impl Segment {
    pub fn end(&self) -> Vec2 {
        match *self {
            Segment::Line { to } | Segment::Quad { to, .. } => to,
            Segment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => polar(center, radius, start_angle + sweep),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenTolerance {
    /// Maximum angular step when sampling arcs.
    pub arc_step: f64,
    /// Number of samples per quadratic curve.
    pub quad_steps: usize,
}

impl Default for FlattenTolerance {
    fn default() -> Self {
        Self {
            arc_step: PI / 32.0,
            quad_steps: 8,
        }
    }
}

impl FlattenTolerance {
    pub fn coarse() -> Self {
        Self {
            arc_step: PI / 16.0,
            quad_steps: 4,
        }
    }
}

/// A path of connected segments starting at `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub start: Vec2,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Contour {
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            segments: Vec::new(),
            closed: false,
        }
    }

    pub fn polygon(points: &[Vec2], closed: bool) -> Self {
        let mut contour = Contour::new(points.first().copied().unwrap_or(Vec2::ZERO));
        for p in points.iter().skip(1) {
            contour.line_to(*p);
        }
        contour.closed = closed && points.len() >= 3;
        contour
    }

    pub fn circle(center: Vec2, radius: f64) -> Self {
        let mut contour = Contour::new(polar(center, radius, 0.0));
        contour.segments.push(Segment::Arc {
            center,
            radius,
            start_angle: 0.0,
            sweep: TAU,
        });
        contour.closed = true;
        contour
    }

    pub fn current(&self) -> Vec2 {
        self.segments.last().map(Segment::end).unwrap_or(self.start)
    }

    pub fn line_to(&mut self, to: Vec2) {
        self.segments.push(Segment::Line { to });
    }

    pub fn quad_to(&mut self, ctrl: Vec2, to: Vec2) {
        self.segments.push(Segment::Quad { ctrl, to });
    }

    pub fn arc(&mut self, center: Vec2, radius: f64, start_angle: f64, sweep: f64) {
        self.segments.push(Segment::Arc {
            center,
            radius,
            start_angle,
            sweep,
        });
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Sample the contour into a polyline. Closed contours do not repeat the
    /// start point at the end; consecutive duplicates are dropped.
    pub fn flatten(&self, tol: &FlattenTolerance) -> Vec<Vec2> {
        let mut out = vec![self.start];
        let mut cursor = self.start;
        for seg in &self.segments {
            match *seg {
                Segment::Line { to } => push_unique(&mut out, to),
                Segment::Quad { ctrl, to } => {
                    let steps = tol.quad_steps.max(1);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        push_unique(&mut out, quad_eval(cursor, ctrl, to, t));
                    }
                }
                Segment::Arc {
                    center,
                    radius,
                    start_angle,
                    sweep,
                } => {
                    let turns = sweep.abs() / tol.arc_step.max(1e-3);
                    let steps = ((turns - 1e-9).ceil() as usize).max(1);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        push_unique(&mut out, polar(center, radius, start_angle + sweep * t));
                    }
                }
            }
            cursor = seg.end();
        }
        if self.closed {
            while out.len() > 1 && approx_eq(out[0], out[out.len() - 1]) {
                out.pop();
            }
        }
        out
    }

    pub fn bbox(&self) -> BBox2 {
        BBox2::from_points(self.flatten(&FlattenTolerance::default()).iter())
    }
}

/// Build a closed polygon whose corners are replaced by quadratic curves.
///
/// For each vertex the tangent distance is `r / tan(θ/2)`, capped at half of
/// both adjacent edges so neighbouring corners never overlap. Corners with an
/// interior angle below [`MIN_CORNER_ANGLE`] stay sharp.
pub fn rounded_polygon(points: &[Vec2], radius: f64) -> Contour {
    let n = points.len();
    if n < 3 || !(radius > 0.0) || !radius.is_finite() {
        return Contour::polygon(points, true);
    }

    let corners: Vec<(Vec2, Vec2, Vec2)> = (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            round_corner(prev, points[i], next, radius)
        })
        .collect();

    let mut contour = Contour::new(corners[0].0);
    for (i, &(start, ctrl, end)) in corners.iter().enumerate() {
        if i > 0 {
            contour.line_to(start);
        }
        if !approx_eq(start, end) {
            contour.quad_to(ctrl, end);
        }
    }
    contour.close();
    contour
}

/// Returns `(arc_start, control, arc_end)` for one corner. A sharp corner
/// collapses to `(curr, curr, curr)`.
fn round_corner(prev: Vec2, curr: Vec2, next: Vec2, radius: f64) -> (Vec2, Vec2, Vec2) {
    let to_prev = prev - curr;
    let to_next = next - curr;
    let len_prev = to_prev.length();
    let len_next = to_next.length();
    if len_prev < 1e-12 || len_next < 1e-12 {
        return (curr, curr, curr);
    }
    let u1 = to_prev * (1.0 / len_prev);
    let u2 = to_next * (1.0 / len_next);

    let theta = u1.dot(u2).clamp(-1.0, 1.0).acos();
    if theta < MIN_CORNER_ANGLE {
        return (curr, curr, curr);
    }

    let d = (radius / (theta * 0.5).tan())
        .min(len_prev * 0.5)
        .min(len_next * 0.5);
    (curr + u1 * d, curr, curr + u2 * d)
}

pub fn polar(center: Vec2, radius: f64, angle: f64) -> Vec2 {
    Vec2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

fn quad_eval(p0: Vec2, p1: Vec2, p2: Vec2, t: f64) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

fn push_unique(out: &mut Vec<Vec2>, p: Vec2) {
    if out.last().is_some_and(|q| approx_eq(*q, p)) {
        return;
    }
    out.push(p);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharp_spike_is_not_rounded() {
        let c = round_corner(
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0001),
            5.0,
        );
        assert_eq!(c.0, c.2);
    }

    #[test]
    fn short_edges_cap_tangent_distance() {
        // Right angle, huge radius: tangent distance limited to half edge (2.0).
        let (start, _, end) = round_corner(
            Vec2::new(0.0, 4.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            100.0,
        );
        assert!((start.y - 2.0).abs() < 1e-9);
        assert!((end.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn full_circle_flattens_without_closing_duplicate() {
        let c = Contour::circle(Vec2::new(0.0, 0.0), 1.0);
        let pts = c.flatten(&FlattenTolerance::default());
        assert_eq!(pts.len(), 64);
        assert!(!approx_eq(pts[0], *pts.last().unwrap()));
    }
}
