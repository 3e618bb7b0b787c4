//! Paints a core [`Frame`] with egui and feeds raw pointer events back into the
//! [`CanvasController`].

use eframe::egui;
use partcfg_core::canvas::{
    CanvasController, CanvasEvent, DrawCmd, Frame, Modifiers, PointerButton, Rgba, Stroke,
    TextAnchor,
};
use partcfg_core::extrude::triangulate;
use partcfg_core::geom::Vec2;
use partcfg_core::ConfigStore;

const DASH: f32 = 6.0;
const GAP: f32 = 4.0;

pub fn color(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

fn stroke(s: &Stroke) -> egui::Stroke {
    egui::Stroke::new(s.width as f32, color(s.color))
}

#[derive(Debug, Clone, Copy)]
struct ToScreen {
    origin: egui::Pos2,
}

impl ToScreen {
    fn pos(&self, p: Vec2) -> egui::Pos2 {
        self.origin + egui::vec2(p.x as f32, p.y as f32)
    }

    fn points(&self, pts: &[Vec2]) -> Vec<egui::Pos2> {
        pts.iter().map(|p| self.pos(*p)).collect()
    }

    fn local(&self, pos: egui::Pos2) -> Vec2 {
        let d = pos - self.origin;
        Vec2::new(d.x as f64, d.y as f64)
    }
}

pub fn paint_frame(painter: &egui::Painter, rect: egui::Rect, frame: &Frame) {
    let tx = ToScreen { origin: rect.min };
    painter.rect_filled(rect, egui::CornerRadius::same(0), color(frame.background));

    for cmd in &frame.commands {
        match cmd {
            DrawCmd::Line { from, to, stroke: s } => {
                polyline(painter, vec![tx.pos(*from), tx.pos(*to)], s);
            }
            DrawCmd::Polyline {
                points,
                closed,
                stroke: s,
            } => {
                let mut pts = tx.points(points);
                if *closed {
                    if let Some(first) = pts.first().copied() {
                        pts.push(first);
                    }
                }
                polyline(painter, pts, s);
            }
            DrawCmd::Polygon {
                points,
                fill,
                stroke: s,
            } => {
                fill_polygon(painter, &tx, points, color(*fill));
                if let Some(s) = s {
                    let mut pts = tx.points(points);
                    if let Some(first) = pts.first().copied() {
                        pts.push(first);
                    }
                    polyline(painter, pts, s);
                }
            }
            DrawCmd::Circle {
                center,
                radius,
                fill,
                stroke: s,
            } => {
                painter.circle(
                    tx.pos(*center),
                    *radius as f32,
                    fill.map(color).unwrap_or(egui::Color32::TRANSPARENT),
                    s.as_ref().map(stroke).unwrap_or(egui::Stroke::NONE),
                );
            }
            DrawCmd::Text {
                pos,
                text,
                size,
                color: c,
                anchor,
            } => {
                let align = match anchor {
                    TextAnchor::Start => egui::Align2::LEFT_CENTER,
                    TextAnchor::Middle => egui::Align2::CENTER_CENTER,
                    TextAnchor::End => egui::Align2::RIGHT_CENTER,
                };
                painter.text(
                    tx.pos(*pos),
                    align,
                    text,
                    egui::FontId::proportional(*size as f32),
                    color(*c),
                );
            }
        }
    }
}

fn polyline(painter: &egui::Painter, pts: Vec<egui::Pos2>, s: &Stroke) {
    if pts.len() < 2 {
        return;
    }
    if s.dashed {
        painter.extend(egui::Shape::dashed_line(&pts, stroke(s), DASH, GAP));
    } else {
        painter.add(egui::Shape::line(pts, stroke(s)));
    }
}

/// Outlines may be concave (custom shapes, rounded pentagons), so they are
/// triangulated instead of drawn as a convex polygon.
fn fill_polygon(painter: &egui::Painter, tx: &ToScreen, points: &[Vec2], fill: egui::Color32) {
    if points.len() < 3 {
        return;
    }
    let Ok(triangles) = triangulate(points, &[]) else {
        return;
    };
    let mut mesh = egui::Mesh::default();
    for p in points {
        mesh.colored_vertex(tx.pos(*p), fill);
    }
    for [a, b, c] in triangles {
        mesh.add_triangle(a, b, c);
    }
    painter.add(egui::Shape::mesh(mesh));
}

fn button(b: egui::PointerButton) -> Option<PointerButton> {
    match b {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Allocates the canvas, routes this frame's pointer input and paints the
/// result. Returns the events produced, in order.
pub fn canvas_ui(
    ui: &mut egui::Ui,
    controller: &mut CanvasController,
    store: &mut ConfigStore,
) -> Vec<CanvasEvent> {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    controller.resize(rect.width() as f64, rect.height() as f64);
    let tx = ToScreen { origin: rect.min };
    let mut events = Vec::new();

    let input = ui.input(|i| i.events.clone());
    for event in input {
        match event {
            egui::Event::PointerButton {
                pos,
                button: b,
                pressed,
                modifiers,
                ..
            } => {
                let Some(b) = button(b) else { continue };
                if pressed {
                    if rect.contains(pos) {
                        let mods = Modifiers {
                            shift: modifiers.shift,
                        };
                        controller.pointer_down(store, tx.local(pos), b, mods);
                    }
                } else {
                    events.extend(controller.pointer_up(store, tx.local(pos)));
                }
            }
            egui::Event::PointerMoved(pos) => {
                events.extend(controller.pointer_move(store, tx.local(pos)));
            }
            egui::Event::PointerGone => controller.pointer_leave(),
            _ => {}
        }
    }

    if response.double_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.extend(controller.double_click(store, tx.local(pos)));
        }
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            // Scrolling up zooms in.
            controller.wheel(-scroll as f64);
        }
        let delete = ui.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if delete && !ui.ctx().wants_keyboard_input() {
            controller.delete_selected(store);
        }
    }

    let hovering_hole = controller.interaction.hovered_hole.is_some();
    if controller.is_dragging() || controller.viewport.is_panning() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
    } else if hovering_hole {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
    } else if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
    }

    let painter = ui.painter_at(rect);
    paint_frame(&painter, rect, &controller.render(store.config()));
    events
}
