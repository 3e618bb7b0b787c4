//! Fallback DXF writer: one closed LWPOLYLINE for the outline and one CIRCLE
//! per hole, in millimetres.

use anyhow::{Context, Result};
use dxf::entities::{Circle, Entity, EntityType, LwPolyline};
use dxf::enums::{AcadVersion, Units};
use dxf::tables::Layer;
use dxf::{Color, Drawing, LwPolylineVertex, Point};
use partcfg_core::geom::Vec2;
use partcfg_core::model::PartConfig;
use partcfg_core::path::FlattenTolerance;
use partcfg_core::profile::build_profile;
use std::path::Path;
use tracing::debug;

pub const OUTLINE_LAYER: &str = "OUTLINE";
pub const HOLES_LAYER: &str = "HOLES";

pub fn build_drawing(config: &PartConfig) -> Drawing {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2000;
    drawing.header.default_drawing_units = Units::Millimeters;

    drawing.add_layer(Layer {
        name: OUTLINE_LAYER.to_string(),
        color: Color::from_index(7),
        ..Default::default()
    });
    drawing.add_layer(Layer {
        name: HOLES_LAYER.to_string(),
        color: Color::from_index(1),
        ..Default::default()
    });

    let mut poly = LwPolyline::default();
    poly.set_is_closed(true);
    for p in outline_points(config) {
        poly.vertices.push(LwPolylineVertex {
            x: p.x,
            y: p.y,
            ..Default::default()
        });
    }
    let mut outline = Entity::new(EntityType::LwPolyline(poly));
    outline.common.layer = OUTLINE_LAYER.to_string();
    drawing.add_entity(outline);

    for hole in &config.holes {
        let circle = Circle::new(Point::new(hole.x, hole.y, 0.0), hole.radius());
        let mut entity = Entity::new(EntityType::Circle(circle));
        entity.common.layer = HOLES_LAYER.to_string();
        drawing.add_entity(entity);
    }
    drawing
}

/// The flattened profile when it is closed, otherwise the part envelope.
fn outline_points(config: &PartConfig) -> Vec<Vec2> {
    let profile = build_profile(config);
    match profile.outline.as_ref().filter(|c| c.closed) {
        Some(outline) => outline.flatten(&FlattenTolerance::default()),
        None => vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(config.width, 0.0),
            Vec2::new(config.width, config.height),
            Vec2::new(0.0, config.height),
        ],
    }
}

pub fn fallback_dxf(config: &PartConfig) -> Result<String> {
    let drawing = build_drawing(config);
    let mut buf = Vec::new();
    drawing.save(&mut buf).context("serialize DXF")?;
    debug!(bytes = buf.len(), holes = config.holes.len(), "wrote fallback DXF");
    String::from_utf8(buf).context("DXF output is not UTF-8")
}

pub fn write_dxf(config: &PartConfig, path: &Path) -> Result<()> {
    let content = fallback_dxf(config)?;
    std::fs::write(path, content).with_context(|| format!("write DXF: {path:?}"))
}

/// Entity counts of an existing DXF file, grouped the way the fallback writes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfSummary {
    pub version: String,
    pub outlines: usize,
    pub outline_vertices: usize,
    pub circles: usize,
    pub other: usize,
}

pub fn inspect_dxf(path: &Path) -> Result<DxfSummary> {
    let drawing = Drawing::load_file(path).with_context(|| format!("load DXF: {path:?}"))?;
    Ok(summarize(&drawing))
}

pub fn summarize(drawing: &Drawing) -> DxfSummary {
    let mut summary = DxfSummary {
        version: format!("{:?}", drawing.header.version),
        ..DxfSummary::default()
    };
    for ent in drawing.entities() {
        match &ent.specific {
            EntityType::LwPolyline(poly) => {
                summary.outlines += 1;
                summary.outline_vertices += poly.vertices.len();
            }
            EntityType::Circle(_) => summary.circles += 1,
            _ => summary.other += 1,
        }
    }
    summary
}
