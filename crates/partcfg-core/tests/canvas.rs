use partcfg_core::canvas::{
    CanvasController, CanvasEvent, DrawCmd, Modifiers, PointerButton, Rgba,
};
use partcfg_core::geom::Vec2;
use partcfg_core::model::{Form, ViewMode, DEFAULT_HOLE_DIAMETER};
use partcfg_core::store::ConfigStore;

fn setup() -> (ConfigStore, CanvasController) {
    (ConfigStore::default(), CanvasController::new(800.0, 600.0))
}

fn px_of(canvas: &CanvasController, store: &ConfigStore, x: f64, y: f64) -> Vec2 {
    canvas.layout(store.config()).to_pixel(Vec2::new(x, y))
}

fn tap(canvas: &mut CanvasController, store: &mut ConfigStore, px: Vec2) -> Option<CanvasEvent> {
    canvas.pointer_down(store, px, PointerButton::Primary, Modifiers::default());
    canvas.pointer_up(store, px)
}

#[test]
fn clicking_the_part_adds_independent_holes() {
    let (mut store, mut canvas) = setup();

    let first = px_of(&canvas, &store, 100.0, 100.0);
    let event = tap(&mut canvas, &mut store, first);
    let Some(CanvasEvent::HoleAdded(first_id)) = event else {
        panic!("expected a new hole, got {event:?}");
    };

    let hole = store.config().hole(&first_id).expect("hole").clone();
    assert!((hole.x - 100.0).abs() < 1e-9);
    assert!((hole.y - 100.0).abs() < 1e-9);
    assert_eq!(hole.diameter, DEFAULT_HOLE_DIAMETER);

    let again = tap(&mut canvas, &mut store, first);
    let Some(CanvasEvent::HoleAdded(second_id)) = again else {
        panic!("expected a second hole at the same spot, got {again:?}");
    };
    assert_ne!(first_id, second_id);
    let holes = &store.config().holes;
    assert_eq!(holes.len(), 2);
    assert!(holes
        .iter()
        .all(|h| (h.x - 100.0).abs() < 1e-9 && (h.y - 100.0).abs() < 1e-9));
}

#[test]
fn new_hole_becomes_the_selection() {
    let (mut store, mut canvas) = setup();
    let existing = store.add_hole(300.0, 300.0, 20.0).unwrap();

    let px = px_of(&canvas, &store, 100.0, 100.0);
    let Some(CanvasEvent::HoleAdded(id)) = tap(&mut canvas, &mut store, px) else {
        panic!("expected a new hole");
    };
    assert_eq!(canvas.interaction.selected_hole.as_deref(), Some(id.as_str()));

    // Clicking a different hole moves the selection instead of adding.
    let other = px_of(&canvas, &store, 300.0, 300.0);
    assert_eq!(
        tap(&mut canvas, &mut store, other),
        Some(CanvasEvent::HoleSelected(existing.clone()))
    );
    assert_eq!(store.config().holes.len(), 2);
}

#[test]
fn clicking_an_existing_hole_selects_it() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(100.0, 100.0, 20.0).unwrap();

    let px = px_of(&canvas, &store, 102.0, 100.0);
    assert_eq!(
        tap(&mut canvas, &mut store, px),
        Some(CanvasEvent::HoleSelected(id.clone()))
    );
    assert_eq!(canvas.interaction.selected_hole.as_deref(), Some(id.as_str()));
    assert_eq!(store.config().holes.len(), 1);
}

#[test]
fn clicks_outside_the_part_are_ignored() {
    let (mut store, mut canvas) = setup();
    let px = px_of(&canvas, &store, -30.0, 100.0);
    assert_eq!(tap(&mut canvas, &mut store, px), None);
    assert!(store.config().holes.is_empty());
}

#[test]
fn dragging_a_hole_keeps_it_inside_the_part() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(100.0, 100.0, 8.0).unwrap();

    let start = px_of(&canvas, &store, 100.0, 100.0);
    canvas.pointer_down(&store, start, PointerButton::Primary, Modifiers::default());
    assert_eq!(canvas.interaction.dragging_hole.as_deref(), Some(id.as_str()));

    let event = canvas.pointer_move(&mut store, Vec2::new(-500.0, -500.0));
    assert_eq!(event, Some(CanvasEvent::HoleMoved(id.clone())));
    assert_eq!(canvas.pointer_up(&mut store, Vec2::new(-500.0, -500.0)), None);

    let hole = store.config().hole(&id).unwrap();
    assert_eq!(hole.x, 4.0);
    assert_eq!(hole.y, 596.0);
    assert!(hole.is_within(440.0, 600.0));
    assert!(canvas.interaction.dragging_hole.is_none());
    assert_eq!(store.config().holes.len(), 1);
}

#[test]
fn drag_preserves_grab_offset() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(200.0, 300.0, 40.0).unwrap();

    let grab = px_of(&canvas, &store, 210.0, 300.0);
    canvas.pointer_down(&store, grab, PointerButton::Primary, Modifiers::default());
    let target = px_of(&canvas, &store, 260.0, 320.0);
    canvas.pointer_move(&mut store, target);
    canvas.pointer_up(&mut store, target);

    let hole = store.config().hole(&id).unwrap();
    assert!((hole.x - 250.0).abs() < 1e-6);
    assert!((hole.y - 320.0).abs() < 1e-6);
}

#[test]
fn small_jitter_still_counts_as_click() {
    let (mut store, mut canvas) = setup();
    let px = px_of(&canvas, &store, 150.0, 150.0);
    canvas.pointer_down(&store, px, PointerButton::Primary, Modifiers::default());
    canvas.pointer_move(&mut store, px + Vec2::new(2.0, 1.0));
    let event = canvas.pointer_up(&mut store, px + Vec2::new(2.0, 1.0));
    assert!(matches!(event, Some(CanvasEvent::HoleAdded(_))));
}

#[test]
fn shift_drag_pans_without_editing() {
    let (mut store, mut canvas) = setup();
    let start = px_of(&canvas, &store, 100.0, 100.0);
    canvas.pointer_down(
        &store,
        start,
        PointerButton::Primary,
        Modifiers { shift: true },
    );
    canvas.pointer_move(&mut store, start + Vec2::new(50.0, -20.0));
    assert_eq!(canvas.pointer_up(&mut store, start + Vec2::new(50.0, -20.0)), None);

    let pan = canvas.viewport.pan;
    assert!((pan.x - 50.0).abs() < 1e-9 && (pan.y + 20.0).abs() < 1e-9);
    assert!(store.config().holes.is_empty());

    canvas.reset_view();
    assert_eq!(canvas.viewport.pan, Vec2::ZERO);
    assert_eq!(canvas.viewport.zoom, 1.0);
}

#[test]
fn hover_tracks_the_hole_under_the_pointer() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(100.0, 100.0, 20.0).unwrap();

    let over = px_of(&canvas, &store, 100.0, 100.0);
    canvas.pointer_move(&mut store, over);
    assert_eq!(canvas.interaction.hovered_hole.as_deref(), Some(id.as_str()));

    canvas.pointer_leave();
    assert!(canvas.interaction.hovered_hole.is_none());
}

#[test]
fn custom_drawing_places_and_removes_points() {
    let (mut store, mut canvas) = setup();
    store.set_form(Form::CustomPolygon);

    let corners = [(50.0, 50.0), (300.0, 50.0), (200.0, 400.0)];
    for (i, (x, y)) in corners.iter().enumerate() {
        let px = px_of(&canvas, &store, *x, *y);
        assert_eq!(tap(&mut canvas, &mut store, px), Some(CanvasEvent::PointAdded(i)));
    }
    assert!(store.config().holes.is_empty());
    assert_eq!(store.config().custom.points.len(), 3);

    let second = px_of(&canvas, &store, 300.0, 50.0);
    assert_eq!(
        tap(&mut canvas, &mut store, second),
        Some(CanvasEvent::PointSelected(1))
    );
    assert_eq!(
        canvas.double_click(&mut store, second),
        Some(CanvasEvent::PointRemoved(1))
    );
    assert_eq!(store.config().custom.points.len(), 2);

    // Once finalized, clicks place holes again.
    let third = px_of(&canvas, &store, 120.0, 300.0);
    tap(&mut canvas, &mut store, third);
    store.finalize_custom().unwrap();
    let inside = px_of(&canvas, &store, 150.0, 120.0);
    assert!(matches!(
        tap(&mut canvas, &mut store, inside),
        Some(CanvasEvent::HoleAdded(_))
    ));
}

#[test]
fn edge_views_are_read_only() {
    let (mut store, mut canvas) = setup();
    store.set_view_mode(ViewMode::Top);
    let px = px_of(&canvas, &store, 100.0, 2.0);
    assert_eq!(tap(&mut canvas, &mut store, px), None);
    assert!(store.config().holes.is_empty());
}

#[test]
fn delete_removes_selected_hole() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(100.0, 100.0, 20.0).unwrap();
    canvas.interaction.selected_hole = Some(id);
    assert!(canvas.delete_selected(&mut store));
    assert!(store.config().holes.is_empty());
    assert!(!canvas.delete_selected(&mut store));
}

#[test]
fn empty_part_shows_placement_hint() {
    let (store, canvas) = setup();
    let frame = canvas.render(store.config());
    assert!(frame.commands.iter().any(|c| matches!(
        c,
        DrawCmd::Text { text, .. } if text == "Click on the part to add a hole"
    )));
    assert!(frame
        .commands
        .iter()
        .any(|c| matches!(c, DrawCmd::Polygon { .. })));
}

#[test]
fn selected_hole_is_highlighted_after_base_geometry() {
    let (mut store, mut canvas) = setup();
    let id = store.add_hole(100.0, 100.0, 20.0).unwrap();
    canvas.interaction.selected_hole = Some(id);

    let frame = canvas.render(store.config());
    let outline = frame
        .commands
        .iter()
        .position(|c| matches!(c, DrawCmd::Polygon { .. }))
        .unwrap();
    let highlight = frame
        .commands
        .iter()
        .position(|c| {
            matches!(c, DrawCmd::Circle { stroke: Some(s), fill: None, .. } if s.color == Rgba::SELECTED)
        })
        .unwrap();
    assert!(outline < highlight);
}

#[test]
fn side_view_draws_hidden_hole_edges() {
    let (mut store, canvas) = setup();
    store.add_hole(100.0, 100.0, 20.0).unwrap();
    store.set_view_mode(ViewMode::Side);

    let frame = canvas.render(store.config());
    let dashed = frame
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCmd::Line { stroke, .. } if stroke.dashed))
        .count();
    assert_eq!(dashed, 2);
}

#[test]
fn parses_hex_colors() {
    assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::rgb(255, 128, 0)));
    assert_eq!(Rgba::from_hex("#fff"), Some(Rgba::WHITE));
    assert_eq!(Rgba::from_hex("ff8000"), None);
    assert_eq!(Rgba::from_hex("#12345g"), None);
}
