//! Sweeps a closed [`Profile`] along +z into a triangle mesh with rounded
//! (bevelled) edges and through-holes.
//!
//! Part space is kept: x/y in millimetres from the profile, z from 0 (front
//! face) to `thickness` (back face). Every ring is offset inwards by the bevel
//! inset on the caps so the whole solid stays within the part envelope.

use crate::error::ExtrudeError;
use crate::geom::Vec2;
use crate::model::{Form, Hole, PartConfig, Point};
use crate::path::FlattenTolerance;
use crate::profile::{build_profile, Profile, ProfileRings};
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

/// Largest miter stretch applied at sharp corners.
const MAX_MITER_SCALE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeOptions {
    /// Bevel size in mm; clamped to a quarter of the thickness.
    pub bevel: f64,
    /// Number of quarter-round steps per bevelled edge. `0` gives sharp edges.
    pub bevel_segments: u32,
    pub tolerance: FlattenTolerance,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            bevel: 0.5,
            bevel_segments: 2,
            tolerance: FlattenTolerance::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb3 {
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Indexed triangle mesh. Triangles wind counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Option<Aabb3> {
        let first = *self.positions.first()?;
        let mut bounds = Aabb3 {
            min: first,
            max: first,
        };
        for p in &self.positions[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    /// Face normal of triangle `i` (not normalized to unit length if degenerate).
    pub fn triangle_normal(&self, i: usize) -> [f32; 3] {
        let [a, b, c] = self.triangles[i].map(|v| self.positions[v as usize]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > 0.0 {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            n
        }
    }

    fn push(&mut self, p: Vec2, z: f64) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push([p.x as f32, p.y as f32, z as f32]);
        index
    }
}

/// One ring of the sweep: the offset of a profile ring at a given depth.
#[derive(Debug, Clone, Copy)]
struct Layer {
    inset: f64,
    z: f64,
}

fn layers(thickness: f64, opts: &ExtrudeOptions) -> Vec<Layer> {
    let bevel = if opts.bevel.is_finite() {
        opts.bevel.clamp(0.0, thickness * 0.25)
    } else {
        0.0
    };
    if bevel <= 0.0 || opts.bevel_segments == 0 {
        return vec![
            Layer { inset: 0.0, z: 0.0 },
            Layer {
                inset: 0.0,
                z: thickness,
            },
        ];
    }

    let steps = opts.bevel_segments;
    let front: Vec<Layer> = (0..=steps)
        .map(|k| {
            let a = k as f64 / steps as f64 * FRAC_PI_2;
            Layer {
                inset: bevel * (1.0 - a.sin()),
                z: bevel * (1.0 - a.cos()),
            }
        })
        .collect();
    let back = front.iter().rev().map(|l| Layer {
        inset: l.inset,
        z: thickness - l.z,
    });
    front.iter().copied().chain(back).collect()
}

/// Offsets every vertex towards the left of the ring's direction of travel.
/// For a CCW outer ring that is inwards; for a CW hole ring it grows the hole.
fn offset_ring(ring: &[Vec2], distance: f64) -> Vec<Vec2> {
    if distance == 0.0 {
        return ring.to_vec();
    }
    let n = ring.len();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let curr = ring[i];
            let next = ring[(i + 1) % n];
            let n0 = (curr - prev).perp().normalized();
            let n1 = (next - curr).perp().normalized();
            let miter = (n0 + n1).normalized();
            let cos = miter.dot(n1);
            if cos <= 1e-6 {
                return curr + n1 * distance;
            }
            let scale = (1.0 / cos).min(MAX_MITER_SCALE);
            curr + miter * (distance * scale)
        })
        .collect()
}

/// Triangulates a polygon with holes; indices refer to the concatenation of
/// `outer` followed by every hole ring in order.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Result<Vec<[u32; 3]>, ExtrudeError> {
    let total = outer.len() + holes.iter().map(Vec::len).sum::<usize>();
    let mut coords = Vec::with_capacity(total * 2);
    let mut hole_starts = Vec::with_capacity(holes.len());
    for p in outer {
        coords.extend([p.x, p.y]);
    }
    for ring in holes {
        hole_starts.push(coords.len() / 2);
        for p in ring {
            coords.extend([p.x, p.y]);
        }
    }

    let indices =
        earcutr::earcut(&coords, &hole_starts, 2).map_err(|_| ExtrudeError::Triangulation)?;
    Ok(indices
        .chunks_exact(3)
        .map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
        .collect())
}

pub fn extrude(
    profile: &Profile,
    thickness: f64,
    opts: &ExtrudeOptions,
) -> Result<Mesh, ExtrudeError> {
    if !(thickness.is_finite() && thickness > 0.0) {
        return Err(ExtrudeError::InvalidThickness(thickness));
    }
    if profile.outline.is_none() {
        return Err(ExtrudeError::NoOutline);
    }
    let regions = profile
        .rings(&opts.tolerance)
        .ok_or(ExtrudeError::OpenOutline)?;
    if regions.is_empty() {
        return Err(ExtrudeError::NoMaterial);
    }

    let layers = layers(thickness, opts);
    let mut mesh = Mesh::default();
    for region in &regions {
        extrude_region(&mut mesh, region, &layers)?;
    }

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        regions = regions.len(),
        holes = regions.iter().map(|r| r.holes.len()).sum::<usize>(),
        "extruded profile"
    );
    Ok(mesh)
}

fn extrude_region(
    mesh: &mut Mesh,
    region: &ProfileRings,
    layers: &[Layer],
) -> Result<(), ExtrudeError> {
    let ProfileRings { outer, holes } = region;
    let rings: Vec<&[Vec2]> = std::iter::once(outer.as_slice())
        .chain(holes.iter().map(Vec::as_slice))
        .collect();

    // Side walls, one strip of quads between consecutive layers per ring.
    // `firsts[r]` holds the index of the first vertex of ring r in each layer.
    let mut firsts: Vec<Vec<u32>> = vec![Vec::with_capacity(layers.len()); rings.len()];
    for (r, ring) in rings.iter().enumerate() {
        for layer in layers {
            let offset = offset_ring(ring, layer.inset);
            let first = mesh.positions.len() as u32;
            for p in offset {
                mesh.push(p, layer.z);
            }
            firsts[r].push(first);
        }

        let n = ring.len() as u32;
        for pair in firsts[r].windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for i in 0..n {
                let j = (i + 1) % n;
                mesh.triangles.push([a + i, a + j, b + j]);
                mesh.triangles.push([a + i, b + j, b + i]);
            }
        }
    }

    // Caps reuse the outermost layers so the mesh stays closed along the rims.
    let cap_inset = layers[0].inset;
    let cap_outer = offset_ring(outer, cap_inset);
    let cap_holes: Vec<Vec<Vec2>> = holes.iter().map(|h| offset_ring(h, cap_inset)).collect();
    let cap = triangulate(&cap_outer, &cap_holes)?;

    let flat: Vec<Vec2> = cap_outer
        .iter()
        .chain(cap_holes.iter().flatten())
        .copied()
        .collect();
    // Map the concatenated cap index to (ring, vertex) in the mesh.
    let mut ring_starts = Vec::with_capacity(rings.len());
    let mut acc = 0u32;
    for ring in &rings {
        ring_starts.push(acc);
        acc += ring.len() as u32;
    }
    let resolve = |cap_index: u32, layer: usize| -> u32 {
        let r = ring_starts
            .iter()
            .rposition(|s| *s <= cap_index)
            .unwrap_or(0);
        firsts[r][layer] + (cap_index - ring_starts[r])
    };

    let last = layers.len() - 1;
    for [a, b, c] in cap {
        let area = (flat[b as usize] - flat[a as usize]).cross(flat[c as usize] - flat[a as usize]);
        if area.abs() < f64::EPSILON {
            continue;
        }
        let (a, b) = if area > 0.0 { (a, b) } else { (b, a) };
        // Back face looks along +z: counter-clockwise as seen from above.
        mesh.triangles
            .push([resolve(a, last), resolve(b, last), resolve(c, last)]);
        // Front face looks along -z: reversed.
        mesh.triangles.push([resolve(a, 0), resolve(c, 0), resolve(b, 0)]);
    }
    Ok(())
}

/// Builds the profile for `config` and extrudes it.
pub fn extrude_config(config: &PartConfig, opts: &ExtrudeOptions) -> Result<Mesh, ExtrudeError> {
    extrude(&build_profile(config), config.thickness, opts)
}

/// The subset of a [`PartConfig`] that affects the solid.
#[derive(Debug, Clone, PartialEq)]
struct GeometryKey {
    form: Form,
    width: f64,
    height: f64,
    thickness: f64,
    corner_radius: f64,
    holes: Vec<Hole>,
    points: Vec<Point>,
}

impl From<&PartConfig> for GeometryKey {
    fn from(c: &PartConfig) -> Self {
        Self {
            form: c.form,
            width: c.width,
            height: c.height,
            thickness: c.thickness,
            corner_radius: c.corner_radius,
            holes: c.holes.clone(),
            points: c.custom.points.clone(),
        }
    }
}

/// Keeps the last extruded mesh and only rebuilds when the geometry changed.
#[derive(Debug, Default)]
pub struct MeshCache {
    options: ExtrudeOptions,
    key: Option<GeometryKey>,
    result: Option<Result<Mesh, ExtrudeError>>,
    rebuilds: u64,
}

impl MeshCache {
    pub fn new(options: ExtrudeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn get(&mut self, config: &PartConfig) -> Result<&Mesh, ExtrudeError> {
        let key = GeometryKey::from(config);
        if self.key.as_ref() != Some(&key) || self.result.is_none() {
            self.result = Some(extrude_config(config, &self.options));
            self.key = Some(key);
            self.rebuilds += 1;
        }
        match &self.result {
            Some(Ok(mesh)) => Ok(mesh),
            Some(Err(err)) => Err(err.clone()),
            None => Err(ExtrudeError::NoOutline),
        }
    }

    /// Number of times the mesh was actually recomputed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bevel_layers_are_monotonic_and_clamped() {
        let layers = layers(1.0, &ExtrudeOptions::default());
        assert_eq!(layers.len(), 6);
        assert!(layers.windows(2).all(|w| w[0].z < w[1].z));
        // 0.5 mm bevel on a 1 mm sheet is clamped to 0.25 mm.
        assert!((layers[0].inset - 0.25).abs() < 1e-12);
        assert_eq!(layers[0].z, 0.0);
        assert!((layers[5].z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn offset_moves_ccw_square_inwards() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let inset = offset_ring(&square, 1.0);
        assert!((inset[0].x - 1.0).abs() < 1e-9 && (inset[0].y - 1.0).abs() < 1e-9);
        assert!((inset[2].x - 9.0).abs() < 1e-9 && (inset[2].y - 9.0).abs() < 1e-9);
    }
}
