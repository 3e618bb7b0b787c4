use partcfg_core::canvas::{DrawCmd, Frame, Rgba, Stroke, TextAnchor};
use partcfg_core::geom::Vec2;
use std::fmt::Write as _;

pub fn frame_to_svg(frame: &Frame) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(frame.width),
        h = num(frame.height)
    );
    let _ = writeln!(
        out,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        color(frame.background)
    );
    for cmd in &frame.commands {
        let _ = writeln!(out, "{}", element(cmd));
    }
    out.push_str("</svg>\n");
    out
}

fn element(cmd: &DrawCmd) -> String {
    match cmd {
        DrawCmd::Line { from, to, stroke } => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
            num(from.x),
            num(from.y),
            num(to.x),
            num(to.y),
            stroke_attrs(stroke)
        ),
        DrawCmd::Polyline {
            points,
            closed,
            stroke,
        } => {
            let tag = if *closed { "polygon" } else { "polyline" };
            format!(
                r#"<{tag} points="{}" fill="none" {}/>"#,
                point_list(points),
                stroke_attrs(stroke)
            )
        }
        DrawCmd::Polygon {
            points,
            fill,
            stroke,
        } => format!(
            r#"<polygon points="{}" fill="{}" {}/>"#,
            point_list(points),
            color(*fill),
            stroke.as_ref().map(stroke_attrs).unwrap_or_default()
        ),
        DrawCmd::Circle {
            center,
            radius,
            fill,
            stroke,
        } => format!(
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" {}/>"#,
            num(center.x),
            num(center.y),
            num(*radius),
            fill.map(color).unwrap_or_else(|| "none".to_string()),
            stroke.as_ref().map(stroke_attrs).unwrap_or_default()
        ),
        DrawCmd::Text {
            pos,
            text,
            size,
            color: c,
            anchor,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            format!(
                r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" fill="{}" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"#,
                num(pos.x),
                num(pos.y),
                num(*size),
                color(*c),
                escape(text)
            )
        }
    }
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut attrs = format!(
        r#"stroke="{}" stroke-width="{}""#,
        color(stroke.color),
        num(stroke.width)
    );
    if stroke.dashed {
        attrs.push_str(r#" stroke-dasharray="6 4""#);
    }
    attrs
}

fn point_list(points: &[Vec2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn color(c: Rgba) -> String {
    c.to_hex()
}

fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use partcfg_core::canvas::render;
    use partcfg_core::model::PartConfig;
    use partcfg_core::viewport::{compute_layout, Viewport};

    #[test]
    fn renders_default_part() {
        let config = PartConfig::default();
        let layout = compute_layout(800.0, 600.0, &config, &Viewport::default());
        let svg = frame_to_svg(&render(&config, &layout, &Default::default()));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("440 mm"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn trims_numbers() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(0.125), "0.13");
    }
}
