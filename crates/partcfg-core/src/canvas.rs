//! 2D canvas: a display list rebuilt from scratch on every call, plus the
//! pointer routing that turns canvas gestures into store commands.

use crate::geom::{BBox2, Vec2};
use crate::model::{Form, PartConfig, ViewMode, DEFAULT_HOLE_DIAMETER};
use crate::path::FlattenTolerance;
use crate::profile::build_profile;
use crate::store::ConfigStore;
use crate::viewport::{compute_layout, find_hole_at, find_point_at, Layout, Viewport};
use serde::{Deserialize, Serialize};

/// Grid spacing in part-space millimetres.
pub const GRID_SPACING_MM: f64 = 50.0;
/// Pointer travel after which a press counts as a drag rather than a click.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;
const MAX_GRID_LINES: usize = 400;
const CROSSHAIR_OVERHANG_PX: f64 = 4.0;
const VERTEX_MARKER_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
    pub const BACKGROUND: Rgba = Rgba::rgb(0xf8, 0xfa, 0xfc);
    pub const GRID: Rgba = Rgba::rgb(0xe2, 0xe8, 0xf0);
    pub const GRID_AXIS: Rgba = Rgba::rgb(0xcb, 0xd5, 0xe1);
    pub const OUTLINE: Rgba = Rgba::rgb(0x33, 0x41, 0x55);
    pub const HOLE: Rgba = Rgba::rgb(0x47, 0x55, 0x69);
    pub const HOVER: Rgba = Rgba::rgb(0x3b, 0x82, 0xf6);
    pub const SELECTED: Rgba = Rgba::rgb(0x25, 0x63, 0xeb);
    pub const DRAGGING: Rgba = Rgba::rgb(0xf9, 0x73, 0x16);
    pub const LABEL: Rgba = Rgba::rgb(0x1e, 0x29, 0x3b);
    pub const HINT: Rgba = Rgba::rgb(0x64, 0x74, 0x8b);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            3 => {
                let expand = |v: u8| v * 17;
                Some(Self::rgb(
                    expand(channel(0, 1)?),
                    expand(channel(1, 1)?),
                    expand(channel(2, 1)?),
                ))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    pub dashed: bool,
}

impl Stroke {
    pub const fn solid(color: Rgba, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub const fn dashed(color: Rgba, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One primitive in pixel space (y-down).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCmd {
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Vec2>,
        closed: bool,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Vec2>,
        fill: Rgba,
        stroke: Option<Stroke>,
    },
    Circle {
        center: Vec2,
        radius: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f64,
        color: Rgba,
        anchor: TextAnchor,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub background: Rgba,
    pub commands: Vec<DrawCmd>,
}

impl Frame {
    fn push(&mut self, cmd: DrawCmd) {
        self.commands.push(cmd);
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.push(DrawCmd::Line { from, to, stroke });
    }

    fn text(&mut self, pos: Vec2, text: impl Into<String>, size: f64, color: Rgba, anchor: TextAnchor) {
        self.push(DrawCmd::Text {
            pos,
            text: text.into(),
            size,
            color,
            anchor,
        });
    }
}

/// Per-hole / per-vertex feedback state, owned by the UI, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub hovered_hole: Option<String>,
    pub selected_hole: Option<String>,
    pub dragging_hole: Option<String>,
    pub selected_point: Option<usize>,
}

/// Custom polygon is being drawn: clicks place vertices instead of holes.
pub fn in_custom_drawing_mode(config: &PartConfig) -> bool {
    config.form == Form::CustomPolygon && config.custom.is_drawing()
}

pub fn render(config: &PartConfig, layout: &Layout, interaction: &InteractionState) -> Frame {
    let mut frame = Frame {
        width: layout.canvas_width,
        height: layout.canvas_height,
        background: Rgba::BACKGROUND,
        commands: Vec::new(),
    };

    draw_grid(&mut frame, layout);
    match config.view_mode {
        ViewMode::Front => draw_front(&mut frame, config, layout, interaction),
        ViewMode::Side | ViewMode::Top => draw_edge_view(&mut frame, config, layout),
    }
    frame
}

fn draw_grid(frame: &mut Frame, layout: &Layout) {
    if !(layout.scale > 0.0) || !layout.scale.is_finite() {
        return;
    }
    let a = layout.to_part(Vec2::new(0.0, 0.0));
    let b = layout.to_part(Vec2::new(layout.canvas_width, layout.canvas_height));
    let visible = BBox2::from_points([a, b].iter());

    let first_x = (visible.min.x / GRID_SPACING_MM).floor() as i64;
    let last_x = (visible.max.x / GRID_SPACING_MM).ceil() as i64;
    let first_y = (visible.min.y / GRID_SPACING_MM).floor() as i64;
    let last_y = (visible.max.y / GRID_SPACING_MM).ceil() as i64;
    let count = (last_x - first_x + last_y - first_y).max(0) as usize;
    if count > MAX_GRID_LINES {
        return;
    }

    for i in first_x..=last_x {
        let x = layout.to_pixel(Vec2::new(i as f64 * GRID_SPACING_MM, 0.0)).x;
        let color = if i == 0 { Rgba::GRID_AXIS } else { Rgba::GRID };
        frame.line(
            Vec2::new(x, 0.0),
            Vec2::new(x, layout.canvas_height),
            Stroke::solid(color, 1.0),
        );
    }
    for j in first_y..=last_y {
        let y = layout.to_pixel(Vec2::new(0.0, j as f64 * GRID_SPACING_MM)).y;
        let color = if j == 0 { Rgba::GRID_AXIS } else { Rgba::GRID };
        frame.line(
            Vec2::new(0.0, y),
            Vec2::new(layout.canvas_width, y),
            Stroke::solid(color, 1.0),
        );
    }
}

fn part_fill(config: &PartConfig) -> Rgba {
    Rgba::from_hex(&config.color).unwrap_or(Rgba::WHITE)
}

fn draw_front(frame: &mut Frame, config: &PartConfig, layout: &Layout, ui: &InteractionState) {
    let profile = build_profile(config);
    let tol = FlattenTolerance::default();
    let drawing = in_custom_drawing_mode(config);

    // Outline
    if let Some(outline) = &profile.outline {
        let points: Vec<Vec2> = outline
            .flatten(&tol)
            .into_iter()
            .map(|p| layout.to_pixel(p))
            .collect();
        if outline.closed {
            frame.push(DrawCmd::Polygon {
                points,
                fill: part_fill(config),
                stroke: Some(Stroke::solid(Rgba::OUTLINE, 2.0)),
            });
        } else {
            frame.push(DrawCmd::Polyline {
                points,
                closed: false,
                stroke: Stroke::dashed(Rgba::OUTLINE, 2.0),
            });
        }
    }
    if config.form == Form::CustomPolygon && drawing {
        for (i, p) in config.custom.points.iter().enumerate() {
            let selected = ui.selected_point == Some(i);
            frame.push(DrawCmd::Circle {
                center: layout.to_pixel((*p).into()),
                radius: VERTEX_MARKER_PX,
                fill: Some(if selected { Rgba::SELECTED } else { Rgba::WHITE }),
                stroke: Some(Stroke::solid(Rgba::OUTLINE, 1.5)),
            });
        }
    }

    // Holes
    for hole in &profile.holes {
        let center = layout.to_pixel(hole.center);
        let r = layout.mm_to_px(hole.radius);
        frame.push(DrawCmd::Circle {
            center,
            radius: r,
            fill: Some(Rgba::WHITE),
            stroke: Some(Stroke::solid(Rgba::HOLE, 1.5)),
        });
        let arm = r + CROSSHAIR_OVERHANG_PX;
        let cross = Stroke::solid(Rgba::HOLE, 0.75);
        frame.line(center - Vec2::new(arm, 0.0), center + Vec2::new(arm, 0.0), cross);
        frame.line(center - Vec2::new(0.0, arm), center + Vec2::new(0.0, arm), cross);
    }

    if config.show_measurements && profile.outline.is_some() {
        draw_measurements(frame, config, layout);
        for hole in &config.holes {
            let center = layout.to_pixel(hole.center());
            let r = layout.mm_to_px(hole.radius());
            frame.text(
                center + Vec2::new(r + 6.0, -r - 2.0),
                format!("Ø{}", format_mm(hole.diameter)),
                11.0,
                Rgba::LABEL,
                TextAnchor::Start,
            );
        }
    }

    // Interaction feedback on top of everything else
    for hole in &config.holes {
        let stroke = if ui.dragging_hole.as_deref() == Some(hole.id.as_str()) {
            Stroke::solid(Rgba::DRAGGING, 3.0)
        } else if ui.selected_hole.as_deref() == Some(hole.id.as_str()) {
            Stroke::solid(Rgba::SELECTED, 2.5)
        } else if ui.hovered_hole.as_deref() == Some(hole.id.as_str()) {
            Stroke::solid(Rgba::HOVER, 2.0)
        } else {
            continue;
        };
        let center = layout.to_pixel(hole.center());
        frame.push(DrawCmd::Circle {
            center,
            radius: layout.mm_to_px(hole.radius()),
            fill: None,
            stroke: Some(stroke),
        });
        frame.text(
            center + Vec2::new(0.0, layout.mm_to_px(hole.radius()) + 14.0),
            format!("({}, {})", format_mm(hole.x), format_mm(hole.y)),
            11.0,
            stroke.color,
            TextAnchor::Middle,
        );
    }

    // Empty state
    let hint = if profile.outline.is_none() && !drawing {
        Some("Select a shape to start".to_string())
    } else if drawing {
        let n = config.custom.points.len();
        Some(if n < 3 {
            format!("Click to add points ({n}/3)")
        } else {
            "Click to add points, finish the shape when done".to_string()
        })
    } else if config.holes.is_empty() {
        Some("Click on the part to add a hole".to_string())
    } else {
        None
    };
    if let Some(hint) = hint {
        frame.text(
            Vec2::new(layout.canvas_width * 0.5, 20.0),
            hint,
            13.0,
            Rgba::HINT,
            TextAnchor::Middle,
        );
    }
}

/// Side and top projections: a plain rectangle with hidden hole edges dashed.
fn draw_edge_view(frame: &mut Frame, config: &PartConfig, layout: &Layout) {
    let (dw, dh) = (layout.display_width, layout.display_height);
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(dw, 0.0),
        Vec2::new(dw, dh),
        Vec2::new(0.0, dh),
    ];
    frame.push(DrawCmd::Polygon {
        points: corners.iter().map(|p| layout.to_pixel(*p)).collect(),
        fill: part_fill(config),
        stroke: Some(Stroke::solid(Rgba::OUTLINE, 2.0)),
    });

    let hidden = Stroke::dashed(Rgba::HOLE, 1.0);
    for hole in &config.holes {
        let r = hole.radius();
        match config.view_mode {
            ViewMode::Side => {
                for y in [hole.y - r, hole.y + r] {
                    frame.line(
                        layout.to_pixel(Vec2::new(0.0, y)),
                        layout.to_pixel(Vec2::new(dw, y)),
                        hidden,
                    );
                }
            }
            ViewMode::Top => {
                for x in [hole.x - r, hole.x + r] {
                    frame.line(
                        layout.to_pixel(Vec2::new(x, 0.0)),
                        layout.to_pixel(Vec2::new(x, dh)),
                        hidden,
                    );
                }
            }
            ViewMode::Front => {}
        }
    }

    if config.show_measurements {
        draw_measurements(frame, config, layout);
    }
}

fn draw_measurements(frame: &mut Frame, config: &PartConfig, layout: &Layout) {
    let (dw, dh) = (layout.display_width, layout.display_height);
    let (label_w, label_h) = match config.view_mode {
        ViewMode::Front if config.form == Form::Circle => (config.width, config.width),
        _ => (dw, dh),
    };
    let dim = Stroke::solid(Rgba::LABEL, 1.0);

    let bottom_left = layout.to_pixel(Vec2::new(0.0, 0.0));
    let bottom_right = layout.to_pixel(Vec2::new(dw, 0.0));
    let top_left = layout.to_pixel(Vec2::new(0.0, dh));

    // Width, below the part
    let y = bottom_left.y + 18.0;
    frame.line(Vec2::new(bottom_left.x, y), Vec2::new(bottom_right.x, y), dim);
    for x in [bottom_left.x, bottom_right.x] {
        frame.line(Vec2::new(x, y - 5.0), Vec2::new(x, y + 5.0), dim);
    }
    frame.text(
        Vec2::new((bottom_left.x + bottom_right.x) * 0.5, y + 14.0),
        format!("{} mm", format_mm(label_w)),
        12.0,
        Rgba::LABEL,
        TextAnchor::Middle,
    );

    // Height, left of the part
    let x = bottom_left.x - 18.0;
    frame.line(Vec2::new(x, top_left.y), Vec2::new(x, bottom_left.y), dim);
    for y in [top_left.y, bottom_left.y] {
        frame.line(Vec2::new(x - 5.0, y), Vec2::new(x + 5.0, y), dim);
    }
    frame.text(
        Vec2::new(x - 6.0, (top_left.y + bottom_left.y) * 0.5),
        format!("{} mm", format_mm(label_h)),
        12.0,
        Rgba::LABEL,
        TextAnchor::End,
    );
}

/// `440` → "440", `12.5` → "12.5", `1.0 / 3.0` → "0.33".
pub fn format_mm(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
}

/// Outcomes the host UI may want to react to (open an editor, show a toast).
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    HoleAdded(String),
    HoleSelected(String),
    HoleMoved(String),
    PointAdded(usize),
    PointSelected(usize),
    PointRemoved(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Pan,
    Drag,
    Press,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    at: Vec2,
    gesture: Gesture,
    moved: bool,
}

#[derive(Debug, Clone)]
struct Drag {
    hole_id: String,
    /// Pointer minus hole center, in pixels, captured at grab time.
    grab_offset: Vec2,
}

/// Owns the view state for one canvas and routes pointer input to the store.
#[derive(Debug, Clone)]
pub struct CanvasController {
    pub viewport: Viewport,
    pub interaction: InteractionState,
    width: f64,
    height: f64,
    press: Option<Press>,
    drag: Option<Drag>,
}

impl CanvasController {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport::default(),
            interaction: InteractionState::default(),
            width,
            height,
            press: None,
            drag: None,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn layout(&self, config: &PartConfig) -> Layout {
        compute_layout(self.width, self.height, config, &self.viewport)
    }

    pub fn render(&self, config: &PartConfig) -> Frame {
        render(config, &self.layout(config), &self.interaction)
    }

    pub fn wheel(&mut self, delta: f64) {
        self.viewport.wheel(delta);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(
        &mut self,
        store: &ConfigStore,
        px: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    ) {
        let pan = button == PointerButton::Middle
            || (button == PointerButton::Primary && modifiers.shift);
        if pan {
            self.viewport.begin_pan(px);
            self.press = Some(Press {
                at: px,
                gesture: Gesture::Pan,
                moved: false,
            });
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        let config = store.config();
        let mut gesture = Gesture::Press;
        if config.view_mode == ViewMode::Front && !in_custom_drawing_mode(config) {
            let layout = self.layout(config);
            if let Some(hole) = find_hole_at(&layout, &config.holes, px) {
                self.drag = Some(Drag {
                    hole_id: hole.id.clone(),
                    grab_offset: px - layout.to_pixel(hole.center()),
                });
                self.interaction.dragging_hole = Some(hole.id.clone());
                gesture = Gesture::Drag;
            }
        }
        self.press = Some(Press {
            at: px,
            gesture,
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, store: &mut ConfigStore, px: Vec2) -> Option<CanvasEvent> {
        if let Some(press) = &mut self.press {
            if press.at.distance(px) > DRAG_THRESHOLD_PX {
                press.moved = true;
            }
        }

        if self.viewport.update_pan(px) {
            return None;
        }

        if let Some(drag) = &self.drag {
            let moved = self.press.is_some_and(|p| p.moved);
            if !moved {
                return None;
            }
            let layout = self.layout(store.config());
            let mm = layout.to_part(px - drag.grab_offset);
            let id = drag.hole_id.clone();
            return match store.move_hole(&id, mm.x, mm.y) {
                Ok(_) => Some(CanvasEvent::HoleMoved(id)),
                Err(_) => None,
            };
        }

        let config = store.config();
        let layout = self.layout(config);
        self.interaction.hovered_hole = if config.view_mode == ViewMode::Front {
            find_hole_at(&layout, &config.holes, px).map(|h| h.id.clone())
        } else {
            None
        };
        None
    }

    /// Ends any gesture; a press that stayed within the drag threshold is
    /// delivered as a click.
    pub fn pointer_up(&mut self, store: &mut ConfigStore, px: Vec2) -> Option<CanvasEvent> {
        let press = self.press.take();
        self.end_gestures();
        match press {
            Some(p) if !p.moved && p.gesture != Gesture::Pan => self.click(store, px),
            _ => None,
        }
    }

    pub fn pointer_leave(&mut self) {
        self.press = None;
        self.end_gestures();
        self.interaction.hovered_hole = None;
    }

    fn end_gestures(&mut self) {
        self.viewport.end_pan();
        self.drag = None;
        self.interaction.dragging_hole = None;
    }

    pub fn click(&mut self, store: &mut ConfigStore, px: Vec2) -> Option<CanvasEvent> {
        let config = store.config();
        if config.view_mode != ViewMode::Front {
            return None;
        }
        let layout = self.layout(config);
        let mm = layout.to_part(px);

        if in_custom_drawing_mode(config) {
            if let Some(index) = find_point_at(&layout, &config.custom.points, px) {
                self.interaction.selected_point = Some(index);
                return Some(CanvasEvent::PointSelected(index));
            }
            return match store.add_custom_point(mm.into()) {
                Ok(index) => {
                    self.interaction.selected_point = None;
                    Some(CanvasEvent::PointAdded(index))
                }
                Err(_) => None,
            };
        }

        // A click on the already selected hole places another one on top of it.
        if let Some(hole) = find_hole_at(&layout, &config.holes, px) {
            if self.interaction.selected_hole.as_deref() != Some(hole.id.as_str()) {
                let id = hole.id.clone();
                self.interaction.selected_hole = Some(id.clone());
                return Some(CanvasEvent::HoleSelected(id));
            }
        }

        if config.form == Form::None || !layout.contains_part_point(mm) {
            return None;
        }
        match store.add_hole(mm.x, mm.y, DEFAULT_HOLE_DIAMETER) {
            Ok(id) => {
                self.interaction.selected_hole = Some(id.clone());
                Some(CanvasEvent::HoleAdded(id))
            }
            Err(_) => None,
        }
    }

    pub fn double_click(&mut self, store: &mut ConfigStore, px: Vec2) -> Option<CanvasEvent> {
        let config = store.config();
        if config.view_mode != ViewMode::Front || !in_custom_drawing_mode(config) {
            return None;
        }
        let layout = self.layout(config);
        let index = find_point_at(&layout, &config.custom.points, px)?;
        store.remove_custom_point(index).ok()?;
        self.interaction.selected_point = None;
        Some(CanvasEvent::PointRemoved(index))
    }

    /// Removes the selected hole, if any.
    pub fn delete_selected(&mut self, store: &mut ConfigStore) -> bool {
        let Some(id) = self.interaction.selected_hole.take() else {
            return false;
        };
        if self.interaction.hovered_hole.as_deref() == Some(id.as_str()) {
            self.interaction.hovered_hole = None;
        }
        store.remove_hole(&id).is_ok()
    }
}
