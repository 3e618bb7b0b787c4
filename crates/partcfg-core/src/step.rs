//! Minimal ISO-10303-21 writer used when the CAD backend is unavailable.
//!
//! The output carries the product, its material and dimensions, the envelope
//! box and the flattened outline. It has no solid topology and is only meant to
//! keep downloads working offline.

use crate::canvas::format_mm;
use crate::model::PartConfig;
use crate::path::FlattenTolerance;
use crate::profile::build_profile;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Originating-system tag written into fallback files.
pub const FALLBACK_MARKER: &str = "partcfg fallback";

pub fn fallback_step(config: &PartConfig, generated_at: DateTime<Utc>) -> String {
    let material = config.material.name();
    let (w, h, t) = (config.width, config.height, config.thickness);
    let summary = format!(
        "{material} - {}x{}x{}mm - {} holes",
        format_mm(w),
        format_mm(h),
        format_mm(t),
        config.holes.len()
    );

    let mut writer = StepWriter::new();

    let app_ctx = writer.push("APPLICATION_CONTEXT('automotive design')".to_string());
    let prod_def_ctx = writer.push(format!(
        "PRODUCT_DEFINITION_CONTEXT('part definition',#{app_ctx},'design')"
    ));
    let prod_ctx = writer.push(format!("PRODUCT_CONTEXT('',#{app_ctx},'mechanical')"));
    let product = writer.push(format!(
        "PRODUCT('PlasticPart_{}','{}','Part generated by partcfg',(#{prod_ctx}))",
        escape_step_string(&material.replace(' ', "_")),
        escape_step_string(&summary)
    ));
    let formation = writer.push(format!("PRODUCT_DEFINITION_FORMATION('','',#{product})"));
    let prod_def = writer.push(format!(
        "PRODUCT_DEFINITION('design','',#{formation},#{prod_def_ctx})"
    ));
    writer.push(format!(
        "PRODUCT_RELATED_PRODUCT_CATEGORY('part',$,(#{product}))"
    ));
    for (name, value) in [
        ("material", material.to_string()),
        ("width", format_mm(w)),
        ("height", format_mm(h)),
        ("thickness", format_mm(t)),
    ] {
        writer.push(format!(
            "PROPERTY_DEFINITION('{name}','{}',#{prod_def})",
            escape_step_string(&value)
        ));
    }

    writer.comment(&format!("Material: {material}"));
    writer.comment(&format!("Width: {} mm", format_mm(w)));
    writer.comment(&format!("Height: {} mm", format_mm(h)));
    writer.comment(&format!("Thickness: {} mm", format_mm(t)));
    writer.comment(&format!("Holes: {}", config.holes.len()));

    let origin = writer.push(cartesian_point(0.0, 0.0, 0.0));
    let z_axis = writer.push("DIRECTION('',(0.,0.,1.))".to_string());
    let x_axis = writer.push("DIRECTION('',(1.,0.,0.))".to_string());
    writer.push(format!("AXIS2_PLACEMENT_3D('',#{origin},#{z_axis},#{x_axis})"));

    // Envelope box
    for z in [0.0, t] {
        for (x, y) in [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)] {
            writer.push(cartesian_point(x, y, z));
        }
    }

    let profile = build_profile(config);
    if let Some(outline) = profile.outline.as_ref().filter(|c| c.closed) {
        let mut points = outline.flatten(&FlattenTolerance::coarse());
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        let ids: Vec<u32> = points
            .iter()
            .map(|p| writer.push(cartesian_point(p.x, p.y, 0.0)))
            .collect();
        writer.push(format!("POLYLINE('outline',({}))", id_list(&ids)));
    }

    for hole in &config.holes {
        writer.comment(&format!(
            "Hole {}: center ({}, {}) diameter {} mm",
            hole.id,
            format_mm(hole.x),
            format_mm(hole.y),
            format_mm(hole.diameter)
        ));
        let center = writer.push(cartesian_point(hole.x, hole.y, 0.0));
        let placement = writer.push(format!(
            "AXIS2_PLACEMENT_3D('',#{center},#{z_axis},#{x_axis})"
        ));
        writer.push(format!(
            "CIRCLE('{}',#{placement},{})",
            escape_step_string(&hole.id),
            f64_step(hole.radius())
        ));
    }

    let timestamp = generated_at.format("%Y-%m-%dT%H:%M:%S");
    let mut out = String::new();
    let _ = writeln!(out, "ISO-10303-21;");
    let _ = writeln!(out, "HEADER;");
    let _ = writeln!(
        out,
        "FILE_DESCRIPTION(('Plastic Part - {material}','Width: {}mm, Height: {}mm, Thickness: {}mm'),'2;1');",
        format_mm(w),
        format_mm(h),
        format_mm(t)
    );
    let _ = writeln!(
        out,
        "FILE_NAME('plastic_part.step','{timestamp}',('partcfg'),(''),'{FALLBACK_MARKER}','','');"
    );
    let _ = writeln!(out, "FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));");
    let _ = writeln!(out, "ENDSEC;");
    let _ = writeln!(out, "DATA;");
    for line in writer.lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "ENDSEC;");
    let _ = writeln!(out, "END-ISO-10303-21;");
    out
}

struct StepWriter {
    next_id: u32,
    lines: Vec<String>,
}

impl StepWriter {
    fn new() -> Self {
        Self {
            next_id: 1,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, entity: String) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.lines.push(format!("#{id}={entity};"));
        id
    }

    fn comment(&mut self, text: &str) {
        self.lines.push(format!("/* {} */", text.replace("*/", "* /")));
    }
}

fn escape_step_string(s: &str) -> String {
    s.replace('\'', "''")
}

fn f64_step(v: f64) -> String {
    if !v.is_finite() {
        return "0.".to_string();
    }
    let mut s = format!("{v:.6}");
    if s == "-0.000000" {
        s = "0.000000".to_string();
    }
    s
}

fn cartesian_point(x: f64, y: f64, z: f64) -> String {
    format!(
        "CARTESIAN_POINT('',({},{},{}))",
        f64_step(x),
        f64_step(y),
        f64_step(z)
    )
}

fn id_list(ids: &[u32]) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "#{id}");
    }
    out
}
