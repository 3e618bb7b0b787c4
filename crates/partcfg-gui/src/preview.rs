//! Orbitable flat-shaded preview of the extruded part.

use eframe::egui;
use partcfg_core::extrude::Mesh;

const LIGHT_FLOOR: f32 = 0.35;
pub const DEFAULT_SPIN: f32 = 0.4;

#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    /// Radians per second while auto-rotating; the preview keeps repainting.
    pub spin: Option<f32>,
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            yaw: -0.5,
            pitch: 0.45,
            zoom: 1.0,
            spin: Some(DEFAULT_SPIN),
        }
    }
}

impl Orbit {
    fn rotate(&self, p: [f32; 3]) -> [f32; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let x = p[0] * cy + p[2] * sy;
        let z1 = -p[0] * sy + p[2] * cy;
        let y = p[1] * cp - z1 * sp;
        let z = p[1] * sp + z1 * cp;
        [x, y, z]
    }
}

pub fn preview_ui(ui: &mut egui::Ui, orbit: &mut Orbit, mesh: &Mesh, base: egui::Color32) {
    let size = egui::vec2(ui.available_width(), ui.available_width().min(320.0));
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());

    if let Some(speed) = orbit.spin {
        if !response.dragged() {
            let dt = ui.input(|i| i.stable_dt).min(0.1);
            orbit.yaw = (orbit.yaw + speed * dt) % std::f32::consts::TAU;
            ui.ctx().request_repaint();
        }
    }
    if response.dragged() {
        let d = response.drag_delta();
        orbit.yaw += d.x * 0.01;
        orbit.pitch = (orbit.pitch + d.y * 0.01).clamp(-1.5, 1.5);
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll.abs() > 0.0 {
            orbit.zoom = (orbit.zoom * (scroll / 200.0).exp()).clamp(0.2, 8.0);
        }
    }
    if response.double_clicked() {
        *orbit = Orbit::default();
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, egui::CornerRadius::same(4), egui::Color32::from_gray(40));

    let Some(bounds) = mesh.bounds() else {
        return;
    };
    let center = bounds.center();
    let extent = bounds.size().iter().fold(0.0f32, |m, v| m.max(*v)).max(1e-3);
    let scale = rect.width().min(rect.height()) * 0.7 / extent * orbit.zoom;

    let rotated: Vec<[f32; 3]> = mesh
        .positions
        .iter()
        .map(|p| orbit.rotate([p[0] - center[0], p[1] - center[1], p[2] - center[2]]))
        .collect();

    let mut order: Vec<(usize, f32)> = mesh
        .triangles
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let depth = t.iter().map(|&v| rotated[v as usize][2]).sum::<f32>() / 3.0;
            (i, depth)
        })
        .collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1));

    let screen = |p: [f32; 3]| {
        egui::pos2(
            rect.center().x + p[0] * scale,
            rect.center().y - p[1] * scale,
        )
    };

    let mut shaded = egui::Mesh::default();
    for (i, _) in order {
        let normal = orbit.rotate(mesh.triangle_normal(i));
        let light = LIGHT_FLOOR + (1.0 - LIGHT_FLOOR) * normal[2].abs();
        let color = shade(base, light);
        let base_index = shaded.vertices.len() as u32;
        for &v in &mesh.triangles[i] {
            shaded.colored_vertex(screen(rotated[v as usize]), color);
        }
        shaded.add_triangle(base_index, base_index + 1, base_index + 2);
    }
    painter.add(egui::Shape::mesh(shaded));
}

fn shade(c: egui::Color32, light: f32) -> egui::Color32 {
    let f = |v: u8| (v as f32 * light).round().clamp(0.0, 255.0) as u8;
    egui::Color32::from_rgb(f(c.r()), f(c.g()), f(c.b()))
}
