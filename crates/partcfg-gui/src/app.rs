use crate::canvas_view::{canvas_ui, color};
use crate::jobs::{JobResult, Jobs};
use crate::preview::{preview_ui, Orbit, DEFAULT_SPIN};
use anyhow::Context;
use eframe::egui;
use partcfg_client::wire::{OrderRequest, OrderResponse};
use partcfg_client::{CadOutcome, ClientError};
use partcfg_core::canvas::{CanvasController, CanvasEvent, Rgba};
use partcfg_core::drawing::DrawPhase;
use partcfg_core::extrude::{ExtrudeOptions, MeshCache};
use partcfg_core::model::MAX_HOLE_DIAMETER;
use partcfg_core::notify::{Level, Notifications};
use partcfg_core::quote::{quote, QUANTITY_RANGE};
use partcfg_core::store::{Dimension, HoleUpdate};
use partcfg_core::{ConfigStore, Form, Material, PartConfig, ViewMode};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct DimensionInputs {
    width: String,
    height: String,
    thickness: String,
    /// The field holding keyboard focus; its text is left alone by `sync`.
    editing: Option<Dimension>,
}

impl DimensionInputs {
    fn sync(&mut self, config: &PartConfig) {
        for (dim, value) in [
            (Dimension::Width, config.width),
            (Dimension::Height, config.height),
            (Dimension::Thickness, config.thickness),
        ] {
            if self.editing != Some(dim) {
                *self.field_mut(dim) = value.to_string();
            }
        }
    }

    fn field_mut(&mut self, dim: Dimension) -> &mut String {
        match dim {
            Dimension::Width => &mut self.width,
            Dimension::Height => &mut self.height,
            Dimension::Thickness => &mut self.thickness,
        }
    }
}

#[derive(Debug)]
struct OrderForm {
    quantity: u32,
    email: String,
    name: String,
    notes: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            quantity: 1,
            email: String::new(),
            name: String::new(),
            notes: String::new(),
        }
    }
}

pub struct ConfiguratorApp {
    store: ConfigStore,
    canvas: CanvasController,
    meshes: MeshCache,
    orbit: Orbit,
    dims: DimensionInputs,
    order_form: OrderForm,
    notifications: Notifications,
    jobs: Jobs,

    cad_loading: bool,
    order_loading: bool,
    last_cad: Option<CadOutcome>,
    last_order: Option<OrderResponse>,
    part_path: Option<PathBuf>,
}

impl ConfiguratorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, jobs: Jobs) -> Self {
        let mut store = ConfigStore::default();
        store.subscribe(|config| {
            debug!(form = ?config.form, holes = config.holes.len(), "part changed");
        });
        let mut dims = DimensionInputs::default();
        dims.sync(store.config());
        Self {
            store,
            canvas: CanvasController::new(800.0, 600.0),
            meshes: MeshCache::new(ExtrudeOptions::default()),
            orbit: Orbit::default(),
            dims,
            order_form: OrderForm::default(),
            notifications: Notifications::default(),
            jobs,
            cad_loading: false,
            order_loading: false,
            last_cad: None,
            last_order: None,
            part_path: None,
        }
    }

    fn report<T>(&mut self, result: Result<T, impl std::fmt::Display>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.notifications.error(e.to_string());
                None
            }
        }
    }

    fn open_part(&mut self, path: &Path) {
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))
            .and_then(|raw| {
                serde_json::from_str::<PartConfig>(&raw)
                    .with_context(|| format!("parse {}", path.display()))
            });
        match loaded {
            Ok(config) if config.has_valid_dimensions() => {
                self.store.replace(config);
                self.canvas = CanvasController::new(800.0, 600.0);
                self.part_path = Some(path.to_path_buf());
                self.notifications.success(format!("Loaded {}", path.display()));
            }
            Ok(_) => {
                self.notifications
                    .error(format!("{}: dimensions must be positive", path.display()));
            }
            Err(e) => {
                self.notifications.error(format!("{e:#}"));
            }
        }
    }

    fn pick_part(&mut self) {
        let file = rfd::FileDialog::new()
            .add_filter("Part configuration", &["json"])
            .pick_file();
        if let Some(path) = file {
            self.open_part(&path);
        }
    }

    fn save_part(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Part configuration", &["json"])
            .set_file_name("part.json");
        if let Some(dir) = self.part_path.as_deref().and_then(Path::parent) {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        let result = serde_json::to_string_pretty(self.store.config())
            .context("serialize part")
            .and_then(|json| {
                std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))
            });
        if self.report(result.map_err(|e| format!("{e:#}"))).is_some() {
            self.notifications.success(format!("Saved {}", path.display()));
            self.part_path = Some(path);
        }
    }

    fn handle_file_drop(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().find(|f| f.path.is_some()) else {
            return;
        };
        if let Some(path) = file.path {
            self.open_part(&path);
        }
    }

    fn generate(&mut self, ctx: &egui::Context) {
        if self.cad_loading {
            return;
        }
        let issues = self.store.config().validate();
        if let Some(issue) = issues.first() {
            self.notifications.error(issue.message.clone());
            return;
        }
        self.cad_loading = true;
        self.notifications.info("Generating CAD files…");
        self.jobs.generate(self.store.config().clone(), ctx.clone());
    }

    fn place_order(&mut self, ctx: &egui::Context) {
        if self.order_loading {
            return;
        }
        if let Some(issue) = self.store.config().validate().first() {
            self.notifications.error(issue.message.clone());
            return;
        }
        let notes = self.order_form.notes.trim();
        let order = OrderRequest {
            config: self.store.config().into(),
            quantity: self.order_form.quantity,
            customer_email: self.order_form.email.trim().to_string(),
            customer_name: self.order_form.name.trim().to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        };
        self.order_loading = true;
        self.jobs.order(order, ctx.clone());
    }

    fn poll_jobs(&mut self) {
        for result in self.jobs.poll() {
            match result {
                JobResult::Cad(result) => {
                    self.cad_loading = false;
                    match result {
                        Ok(outcome) => {
                            match &outcome {
                                CadOutcome::Remote(_) => {
                                    self.notifications.success("CAD files generated");
                                }
                                CadOutcome::Fallback(files) => {
                                    warn!(reason = %files.reason, "using fallback files");
                                    self.notifications.info(
                                        "CAD service unavailable: local STEP/DXF files are ready to save",
                                    );
                                }
                            }
                            self.last_cad = Some(outcome);
                        }
                        Err(ClientError::Busy) => {
                            self.notifications.info("CAD generation already running");
                        }
                        Err(e) => {
                            self.notifications.error(format!("CAD generation failed: {e}"));
                        }
                    }
                }
                JobResult::Order(result) => {
                    self.order_loading = false;
                    match result {
                        Ok(response) => {
                            info!(order = %response.order_number, "order placed");
                            self.notifications.success(format!(
                                "Order {} placed ({})",
                                response.order_number, response.status
                            ));
                            self.last_order = Some(response);
                        }
                        Err(e) => {
                            self.notifications.error(format!("Order failed: {e}"));
                        }
                    }
                }
            }
        }
    }

    fn on_canvas_event(&mut self, event: CanvasEvent) {
        match event {
            CanvasEvent::HoleAdded(id) => debug!(%id, "hole added"),
            CanvasEvent::PointAdded(i) => {
                let n = self.store.config().custom.points.len();
                if n == 3 {
                    self.notifications
                        .info("Shape is closed: finalize it to start placing holes");
                }
                debug!(index = i, points = n, "point added");
            }
            other => debug!(?other, "canvas event"),
        }
    }

    fn save_text(&mut self, name: &str, ext: &str, contents: &str) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{name}.{ext}"))
            .add_filter(ext.to_ascii_uppercase(), &[ext])
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, contents) {
            Ok(()) => {
                self.notifications.success(format!("Saved {}", path.display()));
            }
            Err(e) => {
                self.notifications
                    .error(format!("write {}: {e}", path.display()));
            }
        }
    }

    fn open_link(&mut self, url: &str) {
        let url = self.jobs.client().config().resolve(url);
        if let Err(e) = open::that(&url) {
            self.notifications.error(format!("open {url}: {e}"));
        }
    }

    // -- panels -------------------------------------------------------------

    fn shape_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Shape");
        let current = self.store.config().form;
        ui.horizontal_wrapped(|ui| {
            for form in Form::ALL {
                if ui.selectable_label(current == form, form.label()).clicked() && current != form {
                    self.store.set_form(form);
                }
            }
        });

        let mut commit = None;
        let dims = &mut self.dims;
        egui::Grid::new("dims").num_columns(2).show(ui, |ui| {
            for (label, dim) in [
                ("Width (mm)", Dimension::Width),
                ("Height (mm)", Dimension::Height),
                ("Thickness (mm)", Dimension::Thickness),
            ] {
                ui.label(label);
                let buf = dims.field_mut(dim);
                let resp = ui.add(egui::TextEdit::singleline(buf).desired_width(80.0));
                if resp.lost_focus() {
                    commit = Some((dim, buf.clone()));
                }
                if resp.has_focus() {
                    dims.editing = Some(dim);
                } else if dims.editing == Some(dim) {
                    dims.editing = None;
                }
                ui.end_row();
            }
        });
        if let Some((dim, raw)) = commit {
            if let Err(e) = self.store.set_dimension_text(dim, &raw) {
                self.notifications.error(e.to_string());
                self.dims.sync(self.store.config());
            }
        }

        let config = self.store.config();
        if config.form.uses_corner_radius() {
            let mut radius = config.corner_radius;
            let max = config.width.min(config.height) / 2.0;
            if ui
                .add(egui::Slider::new(&mut radius, 0.0..=max).text("Corner radius"))
                .changed()
            {
                let result = self.store.set_corner_radius(radius).map(|_| ());
                self.report(result);
            }
        }
    }

    fn custom_section(&mut self, ui: &mut egui::Ui) {
        let config = self.store.config();
        if config.form != Form::CustomPolygon {
            return;
        }
        ui.separator();
        ui.heading("Custom shape");
        let phase = config.custom.phase();
        let points = config.custom.points.len();
        ui.label(match phase {
            DrawPhase::Empty => "Click on the canvas to place the first point.".to_string(),
            DrawPhase::Drawing => format!("{points} point(s); at least 3 are needed."),
            DrawPhase::Drawable => format!("{points} points. Double-click a point to remove it."),
            DrawPhase::Finalized => format!("Finalized with {points} points."),
        });
        ui.horizontal(|ui| {
            let finalized = phase == DrawPhase::Finalized;
            if ui
                .add_enabled(phase == DrawPhase::Drawable, egui::Button::new("Finalize"))
                .clicked()
            {
                let result = self.store.finalize_custom().map(|_| ());
                self.report(result);
            }
            if ui.add_enabled(finalized, egui::Button::new("Edit")).clicked() {
                let result = self.store.edit_custom().map(|_| ());
                self.report(result);
            }
            if ui
                .add_enabled(phase != DrawPhase::Empty, egui::Button::new("Clear"))
                .clicked()
            {
                let result = self.store.clear_custom().map(|_| ());
                self.report(result);
            }
        });
    }

    fn appearance_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.heading("Material");
        let config = self.store.config();
        let mut material = config.material;
        egui::ComboBox::from_id_salt("material")
            .selected_text(material.name())
            .show_ui(ui, |ui| {
                for m in Material::ALL {
                    ui.selectable_value(&mut material, m, m.name());
                }
            });
        if material != config.material {
            self.store.set_material(material);
        }

        let current = Rgba::from_hex(&self.store.config().color).unwrap_or(Rgba::WHITE);
        let mut rgb = [current.r, current.g, current.b];
        ui.horizontal(|ui| {
            ui.label("Color");
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                let hex = Rgba::rgb(rgb[0], rgb[1], rgb[2]).to_hex();
                let result = self.store.set_color(&hex).map(|_| ());
                self.report(result);
            }
        });

        ui.separator();
        ui.heading("View");
        let view = self.store.config().view_mode;
        ui.horizontal(|ui| {
            for (mode, label) in [
                (ViewMode::Front, "Front"),
                (ViewMode::Side, "Side"),
                (ViewMode::Top, "Top"),
            ] {
                if ui.selectable_label(view == mode, label).clicked() && view != mode {
                    self.store.set_view_mode(mode);
                }
            }
        });
        let mut show = self.store.config().show_measurements;
        if ui.checkbox(&mut show, "Show measurements").changed() {
            self.store.set_show_measurements(show);
        }
        if ui.button("Reset zoom").clicked() {
            self.canvas.reset_view();
        }
    }

    fn holes_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.heading(format!("Holes ({})", self.store.config().holes.len()));
        let holes = self.store.config().holes.clone();
        let selected = self.canvas.interaction.selected_hole.clone();
        let mut remove = None;
        egui::ScrollArea::vertical()
            .id_salt("holes")
            .max_height(180.0)
            .show(ui, |ui| {
                for hole in &holes {
                    ui.horizontal(|ui| {
                        let is_selected = selected.as_deref() == Some(hole.id.as_str());
                        if ui.selectable_label(is_selected, "●").clicked() {
                            self.canvas.interaction.selected_hole = Some(hole.id.clone());
                        }
                        let mut update = HoleUpdate::default();
                        let (mut x, mut y, mut d) = (hole.x, hole.y, hole.diameter);
                        if ui.add(egui::DragValue::new(&mut x).prefix("x ").speed(1.0)).changed() {
                            update.x = Some(x);
                        }
                        if ui.add(egui::DragValue::new(&mut y).prefix("y ").speed(1.0)).changed() {
                            update.y = Some(y);
                        }
                        if ui
                            .add(
                                egui::DragValue::new(&mut d)
                                    .prefix("Ø ")
                                    .speed(0.5)
                                    .range(0.5..=MAX_HOLE_DIAMETER),
                            )
                            .changed()
                        {
                            update.diameter = Some(d);
                        }
                        if update != HoleUpdate::default() {
                            let result = self.store.update_hole(&hole.id, update).map(|_| ());
                            self.report(result);
                        }
                        if ui.small_button("🗑").clicked() {
                            remove = Some(hole.id.clone());
                        }
                    });
                }
            });
        if let Some(id) = remove {
            if self.canvas.interaction.selected_hole.as_deref() == Some(id.as_str()) {
                self.canvas.interaction.selected_hole = None;
            }
            let result = self.store.remove_hole(&id).map(|_| ());
            self.report(result);
        }
    }

    fn order_section(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.separator();
        ui.heading("Quote & order");
        let (min, max) = QUANTITY_RANGE;
        ui.add(
            egui::DragValue::new(&mut self.order_form.quantity)
                .range(min..=max)
                .prefix("Quantity "),
        );
        match quote(self.store.config(), self.order_form.quantity) {
            Ok(q) => {
                egui::Grid::new("quote").num_columns(2).show(ui, |ui| {
                    ui.label("Material");
                    ui.monospace(format!("{:.2}", q.material_cost));
                    ui.end_row();
                    ui.label("Holes");
                    ui.monospace(format!("{:.2}", q.hole_cost));
                    ui.end_row();
                    ui.label("Cutting");
                    ui.monospace(format!("{:.2}", q.cutting_cost));
                    ui.end_row();
                    ui.label("Unit price");
                    ui.monospace(format!("{:.2}", q.unit_price));
                    ui.end_row();
                    if q.discount > 0.0 {
                        ui.label("Discount");
                        ui.monospace(format!("{:.0}%", q.discount * 100.0));
                        ui.end_row();
                    }
                    ui.strong("Total");
                    ui.strong(format!("{:.2}", q.total));
                    ui.end_row();
                });
            }
            Err(e) => {
                ui.colored_label(egui::Color32::RED, e.to_string());
            }
        }

        ui.add(egui::TextEdit::singleline(&mut self.order_form.name).hint_text("Name"));
        ui.add(egui::TextEdit::singleline(&mut self.order_form.email).hint_text("Email"));
        ui.add(egui::TextEdit::multiline(&mut self.order_form.notes).hint_text("Notes").desired_rows(2));
        let label = if self.order_loading { "Placing order…" } else { "Place order" };
        if ui
            .add_enabled(!self.order_loading, egui::Button::new(label))
            .clicked()
        {
            self.place_order(ctx);
        }
        if let Some(order) = &self.last_order {
            ui.label(format!("Last order: {} ({})", order.order_number, order.status));
            if let Some(price) = order.price {
                ui.label(format!("Price: {price:.2}"));
            }
        }
    }

    fn preview_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("3D preview");
        let base = Rgba::from_hex(&self.store.config().color)
            .map(color)
            .unwrap_or(egui::Color32::WHITE);
        match self.meshes.get(self.store.config()) {
            Ok(mesh) => {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "{} vertices, {} triangles",
                        mesh.vertex_count(),
                        mesh.triangle_count()
                    ));
                    let mut spin = self.orbit.spin.is_some();
                    if ui.checkbox(&mut spin, "Rotate").changed() {
                        self.orbit.spin = spin.then_some(DEFAULT_SPIN);
                    }
                });
                preview_ui(ui, &mut self.orbit, mesh, base);
            }
            Err(e) => {
                ui.label(e.to_string());
            }
        }
    }

    fn output_section(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.heading("CAD files");
        let Some(outcome) = self.last_cad.clone() else {
            ui.label("No files generated yet.");
            return;
        };
        match &outcome {
            CadOutcome::Remote(response) => {
                ui.horizontal(|ui| {
                    if ui.button("Open STEP").clicked() {
                        self.open_link(&response.step_file_url);
                    }
                    if ui.button("Open DXF").clicked() {
                        self.open_link(&response.dxf_file_url);
                    }
                    if let Some(glb) = &response.glb_file_url {
                        if ui.button("Open GLB").clicked() {
                            self.open_link(glb);
                        }
                    }
                });
                if let Some(validation) = &response.validation {
                    validation_label(ui, validation.valid, &validation.message);
                }
            }
            CadOutcome::Fallback(files) => {
                ui.colored_label(
                    egui::Color32::from_rgb(0xd9, 0x77, 0x06),
                    format!("Generated locally: {}", files.reason),
                );
                ui.horizontal(|ui| {
                    if ui.button("Save STEP…").clicked() {
                        self.save_text("part", "step", &files.step);
                    }
                    if ui.button("Save DXF…").clicked() {
                        self.save_text("part", "dxf", &files.dxf);
                    }
                });
                validation_label(ui, files.validation.valid, &files.validation.message);
            }
        }
        ui.collapsing("Metadata", |ui| {
            if let Ok(json) = serde_json::to_string_pretty(outcome.metadata()) {
                ui.monospace(json);
            }
        });
    }

    fn notifications_ui(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.notifications.prune(now);
        if let Some(next) = self.notifications.next_expiry() {
            ctx.request_repaint_after(next.saturating_duration_since(now));
        }
        if self.notifications.is_empty() {
            return;
        }
        let mut dismissed = None;
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -36.0))
            .show(ctx, |ui| {
                for n in self.notifications.iter() {
                    let fill = match n.level {
                        Level::Info => egui::Color32::from_rgb(0x1e, 0x40, 0xaf),
                        Level::Success => egui::Color32::from_rgb(0x15, 0x80, 0x3d),
                        Level::Error => egui::Color32::from_rgb(0xb9, 0x1c, 0x1c),
                    };
                    egui::Frame::NONE
                        .fill(fill)
                        .corner_radius(6.0)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.colored_label(egui::Color32::WHITE, &n.message);
                                if ui.small_button("✕").clicked() {
                                    dismissed = Some(n.id);
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
            });
        if let Some(id) = dismissed {
            self.notifications.dismiss(id);
        }
    }
}

fn validation_label(ui: &mut egui::Ui, valid: bool, message: &str) {
    let c = if valid {
        egui::Color32::from_rgb(0x15, 0x80, 0x3d)
    } else {
        egui::Color32::RED
    };
    ui.colored_label(c, message);
}

impl eframe::App for ConfiguratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_file_drop(ctx);
        self.poll_jobs();
        if self.store.take_dirty() {
            self.dims.sync(self.store.config());
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open part…").clicked() {
                    self.pick_part();
                }
                if ui.button("Save part…").clicked() {
                    self.save_part();
                }
                ui.separator();
                let label = if self.cad_loading {
                    "Generating…"
                } else {
                    "Generate CAD files"
                };
                if ui
                    .add_enabled(!self.cad_loading, egui::Button::new(label))
                    .clicked()
                {
                    self.generate(ctx);
                }
                if self.cad_loading || self.order_loading {
                    ui.spinner();
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let config = self.store.config();
                ui.label(format!(
                    "{} · {} × {} × {} mm · {} · {} hole(s)",
                    config.form.label(),
                    config.width,
                    config.height,
                    config.thickness,
                    config.material,
                    config.holes.len()
                ));
                if let Some(p) = &self.part_path {
                    ui.separator();
                    ui.monospace(p.display().to_string());
                }
            });
        });

        egui::SidePanel::left("config")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.shape_section(ui);
                    self.custom_section(ui);
                    self.appearance_section(ui);
                    self.holes_section(ui);
                    self.order_section(ui, ctx);
                });
            });

        egui::SidePanel::right("output")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.preview_section(ui);
                self.output_section(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let events = canvas_ui(ui, &mut self.canvas, &mut self.store);
            for event in events {
                self.on_canvas_event(event);
            }
        });

        self.notifications_ui(ctx);
    }
}
