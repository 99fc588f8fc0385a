//! Composition root: mode, selection and event dispatch.
//!
//! [`CanvasController`] owns every component and routes pointer, touch,
//! wheel and key input to whichever of them the current mode calls for.
//! Handlers return the [`Action`]s the host must act on; nothing here talks
//! to the host directly except the [`ContentSink`] handed to
//! [`CanvasController::save`]. [`Engine`] binds a controller to a browser
//! canvas element.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::block::{Block, BlockContent, BlockId, BlockKind, BlockStore, CanvasBounds};
use crate::config::InputModeConfig;
use crate::consts::{DEFAULT_BLOCK_ORIGIN, ZOOM_STEP};
use crate::drag::{DragResizeController, DragState, Mutation};
use crate::error::{RenderError, SaveError};
use crate::gesture::{GestureEvent, GestureRecognizer, TouchPoint};
use crate::hit::{self, Hit, HitPart};
use crate::input::{Button, Key, Mode, Modifiers, WheelDelta};
use crate::render::{self, Scene, Surface, WebSurface};
use crate::stroke::{Brush, Stroke, StrokeRenderer};
use crate::viewport::{Point, Size, Viewport};

/// The persisted form of a canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasContent {
    pub blocks: Vec<Block>,
    pub strokes: Vec<Stroke>,
}

impl CanvasContent {
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// # Errors
    ///
    /// Fails if a generic block payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A block was added or its geometry or content changed.
    BlockChanged(Block),
    BlockDeleted { id: BlockId },
    SelectionChanged(Option<BlockId>),
    StrokeCommitted(Stroke),
    StrokesCleared,
    ViewportChanged(Viewport),
    /// A touch gesture was recognized.
    Gesture(GestureEvent),
    /// Long-press or secondary click. `target` is the block under `screen`, if any.
    ContextMenuRequested { target: Option<BlockId>, screen: Point },
    /// The host should open its editor for the block.
    EditRequested { id: BlockId },
    SaveRequested(CanvasContent),
    SetCursor(String),
    RenderNeeded,
}

/// Receiver for published actions. Every method defaults to doing nothing.
pub trait EventSink {
    fn on_block_changed(&mut self, _block: &Block) {}
    fn on_block_deleted(&mut self, _id: BlockId) {}
    fn on_selection_changed(&mut self, _selected: Option<BlockId>) {}
    fn on_save_requested(&mut self, _content: &CanvasContent) {}
    /// Every action without a dedicated method.
    fn on_action(&mut self, _action: &Action) {}
}

/// Route `actions` to `sink` in order.
pub fn publish<S: EventSink + ?Sized>(actions: &[Action], sink: &mut S) {
    for action in actions {
        match action {
            Action::BlockChanged(block) => sink.on_block_changed(block),
            Action::BlockDeleted { id } => sink.on_block_deleted(*id),
            Action::SelectionChanged(selected) => sink.on_selection_changed(*selected),
            Action::SaveRequested(content) => sink.on_save_requested(content),
            other => sink.on_action(other),
        }
    }
}

/// The persistence collaborator.
pub trait ContentSink {
    /// Store `content`.
    ///
    /// # Errors
    ///
    /// Whatever the store reports; the controller keeps its state either way.
    fn save(&mut self, content: &CanvasContent) -> Result<(), SaveError>;
}

impl<F> ContentSink for F
where
    F: FnMut(&CanvasContent) -> Result<(), SaveError>,
{
    fn save(&mut self, content: &CanvasContent) -> Result<(), SaveError> {
        self(content)
    }
}

/// Interaction engine state. Everything that doesn't need the canvas element,
/// so it can be driven and tested without a browser.
pub struct CanvasController {
    config: InputModeConfig,
    blocks: BlockStore,
    strokes: StrokeRenderer,
    viewport: Viewport,
    drag: DragResizeController,
    gestures: GestureRecognizer,
    mode: Mode,
    selected: Option<BlockId>,
    read_only: bool,
    viewport_size: Size,
    dpr: f64,
    /// Last pointer position of a pan drag in progress.
    pan_last: Option<Point>,
    /// The touch contact currently routed through the pointer handlers.
    primary_touch: Option<TouchPoint>,
    pinch_start_zoom: Option<f64>,
    cursor: String,
}

impl CanvasController {
    #[must_use]
    pub fn new(config: InputModeConfig, initial: CanvasContent) -> Self {
        let mut controller = Self {
            config,
            blocks: BlockStore::new(),
            strokes: StrokeRenderer::new(),
            viewport: Viewport::default(),
            drag: DragResizeController::new(config.drag_threshold),
            gestures: GestureRecognizer::new(config.gesture()),
            mode: Mode::Idle,
            selected: None,
            read_only: false,
            viewport_size: Size::default(),
            dpr: 1.0,
            pan_last: None,
            primary_touch: None,
            pinch_start_zoom: None,
            cursor: mode_cursor(Mode::Idle).to_string(),
        };
        controller.load(initial);
        controller
    }

    /// Replace all content. Selection and any pointer sequence in flight are dropped.
    pub fn load(&mut self, content: CanvasContent) {
        self.drag.cancel();
        self.pan_last = None;
        self.primary_touch = None;
        self.selected = None;
        self.blocks.load(content.blocks);
        self.strokes.load(content.strokes);
        for stroke in self.strokes.strokes() {
            if let Some(extent) = stroke.max_extent() {
                self.blocks.include_point(extent);
            }
        }
        tracing::debug!(blocks = self.blocks.len(), strokes = self.strokes.strokes().len(), "content loaded");
    }

    /// Switch input tuning, e.g. when the host detects touch input.
    pub fn set_input_config(&mut self, config: InputModeConfig) {
        self.config = config;
        self.drag.set_drag_threshold(config.drag_threshold);
        self.gestures = GestureRecognizer::new(config.gesture());
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &InputModeConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The currently selected block, if any.
    #[must_use]
    pub fn selection(&self) -> Option<BlockId> {
        self.selected
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn bounds(&self) -> CanvasBounds {
        self.blocks.bounds()
    }

    #[must_use]
    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Committed strokes in insertion order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        self.strokes.strokes()
    }

    #[must_use]
    pub fn brush(&self) -> &Brush {
        self.strokes.brush()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Snapshot of the persisted content.
    #[must_use]
    pub fn content(&self) -> CanvasContent {
        CanvasContent { blocks: self.blocks.all().to_vec(), strokes: self.strokes.strokes().to_vec() }
    }

    // --- Blocks ---

    /// Add an empty block of `kind` at the default spot in the visible area.
    pub fn add_block(&mut self, kind: BlockKind) -> Vec<Action> {
        if self.refuse_mutation("add_block") {
            return Vec::new();
        }
        let origin = self.viewport.to_canvas(Point::new(DEFAULT_BLOCK_ORIGIN, DEFAULT_BLOCK_ORIGIN));
        let block = self.blocks.add(kind, origin);
        tracing::debug!(id = %block.id, kind = kind.as_str(), z = block.z_index, "block added");
        vec![Action::BlockChanged(block), Action::RenderNeeded]
    }

    pub fn move_block(&mut self, id: &BlockId, x: f64, y: f64) -> Vec<Action> {
        if self.refuse_mutation("move_block") || !self.blocks.move_to(id, x, y) {
            return Vec::new();
        }
        self.block_changed(id)
    }

    pub fn resize_block(&mut self, id: &BlockId, width: f64, height: f64) -> Vec<Action> {
        if self.refuse_mutation("resize_block") || !self.blocks.resize(id, width, height) {
            return Vec::new();
        }
        self.block_changed(id)
    }

    /// Replace a block's payload. Content of another kind is refused.
    pub fn update_block(&mut self, id: &BlockId, content: BlockContent) -> Vec<Action> {
        if self.refuse_mutation("update_block") || !self.blocks.update(id, content) {
            return Vec::new();
        }
        self.block_changed(id)
    }

    /// Remove a block, clearing the selection if it pointed at it.
    pub fn delete_block(&mut self, id: &BlockId) -> Vec<Action> {
        if self.refuse_mutation("delete_block") {
            return Vec::new();
        }
        let Some(block) = self.blocks.remove(id) else {
            return Vec::new();
        };
        tracing::debug!(id = %block.id, kind = block.kind().as_str(), "block deleted");
        if self.drag.active_block() == Some(block.id) {
            self.drag.cancel();
        }
        let mut actions = vec![Action::BlockDeleted { id: block.id }];
        if self.selected == Some(block.id) {
            self.selected = None;
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Selection ---

    pub fn select(&mut self, id: &BlockId) -> Vec<Action> {
        if self.read_only || self.blocks.get(id).is_none() {
            return Vec::new();
        }
        self.set_selection(Some(*id))
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        self.set_selection(None)
    }

    // --- Modes ---

    /// Switch interaction mode. Any pointer sequence in flight ends first.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if self.mode == mode {
            return Vec::new();
        }
        if mode == Mode::Drawing && self.refuse_mutation("start_drawing") {
            return Vec::new();
        }
        let mut actions = self.cancel_manipulation();
        if mode == Mode::Drawing {
            actions.extend(self.set_selection(None));
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "mode changed");
        self.mode = mode;
        actions.extend(self.set_cursor(mode_cursor(mode)));
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn start_drawing(&mut self) -> Vec<Action> {
        self.set_mode(Mode::Drawing)
    }

    pub fn stop_drawing(&mut self) -> Vec<Action> {
        self.leave_mode(Mode::Drawing)
    }

    pub fn start_panning(&mut self) -> Vec<Action> {
        self.set_mode(Mode::Panning)
    }

    pub fn stop_panning(&mut self) -> Vec<Action> {
        self.leave_mode(Mode::Panning)
    }

    fn leave_mode(&mut self, mode: Mode) -> Vec<Action> {
        if self.mode == mode { self.set_mode(Mode::Idle) } else { Vec::new() }
    }

    /// Enable or disable read-only viewing. Entering it ends drawing and drops the selection.
    pub fn set_read_only(&mut self, read_only: bool) -> Vec<Action> {
        if self.read_only == read_only {
            return Vec::new();
        }
        self.read_only = read_only;
        tracing::debug!(read_only, "read-only changed");
        if !read_only {
            return Vec::new();
        }
        self.drag.cancel();
        if self.strokes.discard_draft() {
            tracing::debug!("live stroke discarded");
        }
        let mut actions = self.set_selection(None);
        if self.mode == Mode::Drawing {
            self.mode = Mode::Idle;
            actions.extend(self.set_cursor(mode_cursor(Mode::Idle)));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Viewport ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_by(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_by(-ZOOM_STEP)
    }

    pub fn zoom_by(&mut self, delta: f64) -> Vec<Action> {
        let before = self.viewport;
        self.viewport.zoom_by(delta);
        self.viewport_changed(before)
    }

    /// Fit the canvas extent into `host` (the visible area in CSS pixels). Clears the selection.
    pub fn fit_to_screen(&mut self, host: Size) -> Vec<Action> {
        let before = self.viewport;
        let bounds = self.blocks.bounds();
        self.viewport.fit_to_screen(host, Size::new(bounds.width, bounds.height));
        let mut actions = self.set_selection(None);
        actions.extend(self.viewport_changed(before));
        actions
    }

    /// Back to zoom 1 with no pan. Clears the selection.
    pub fn reset_view(&mut self) -> Vec<Action> {
        let before = self.viewport;
        self.viewport.reset();
        let mut actions = self.set_selection(None);
        actions.extend(self.viewport_changed(before));
        actions
    }

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_size = Size::new(width_css, height_css);
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        vec![Action::RenderNeeded]
    }

    // --- Ink ---

    /// Brush for strokes started from now on.
    pub fn set_brush(&mut self, brush: Brush) {
        self.strokes.set_brush(brush);
    }

    pub fn clear_strokes(&mut self) -> Vec<Action> {
        if self.refuse_mutation("clear_strokes") {
            return Vec::new();
        }
        tracing::debug!(count = self.strokes.strokes().len(), "strokes cleared");
        self.strokes.clear();
        vec![Action::StrokesCleared, Action::RenderNeeded]
    }

    // --- Persistence ---

    /// Hand the current content to `sink`. On failure the content stays as it is,
    /// so the save can be retried.
    ///
    /// # Errors
    ///
    /// Returns whatever `sink` reports.
    pub fn save<S: ContentSink + ?Sized>(&self, sink: &mut S) -> Result<(), SaveError> {
        let content = self.content();
        match sink.save(&content) {
            Ok(()) => {
                tracing::debug!(blocks = content.blocks.len(), strokes = content.strokes.len(), "content saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                Err(e)
            }
        }
    }

    /// Ask the host to persist the current content on its own schedule.
    #[must_use]
    pub fn request_save(&self) -> Vec<Action> {
        vec![Action::SaveRequested(self.content())]
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, pressure: Option<f64>) -> Vec<Action> {
        match (self.mode, button) {
            (Mode::Panning, _) | (_, Button::Middle) => {
                self.pan_last = Some(screen);
                self.set_cursor("grabbing")
            }
            (Mode::Drawing, Button::Secondary) => Vec::new(),
            (_, Button::Secondary) => vec![self.context_menu(screen)],
            (Mode::Drawing, Button::Primary) => {
                if self.refuse_mutation("draw") || !self.strokes.begin(screen, pressure, &self.viewport) {
                    return Vec::new();
                }
                vec![Action::RenderNeeded]
            }
            (Mode::Idle, Button::Primary) => self.press_idle(screen),
        }
    }

    pub fn on_pointer_move(&mut self, screen: Point, pressure: Option<f64>) -> Vec<Action> {
        if let Some(last) = self.pan_last {
            self.pan_last = Some(screen);
            let before = self.viewport;
            self.viewport.pan_by(screen.x - last.x, screen.y - last.y);
            return self.viewport_changed(before);
        }
        if self.strokes.is_drawing() {
            self.strokes.extend(screen, pressure, &self.viewport);
            return vec![Action::RenderNeeded];
        }
        if !self.drag.is_idle() {
            return match self.drag.update(screen, &self.viewport) {
                Some(mutation) => self.apply_mutation(mutation),
                None => Vec::new(),
            };
        }
        if self.mode == Mode::Idle && !self.read_only {
            return self.hover(screen);
        }
        Vec::new()
    }

    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        if self.pan_last.take().is_some() {
            return self.set_cursor(mode_cursor(self.mode));
        }
        if self.strokes.is_drawing() {
            return self.commit_stroke();
        }
        if self.drag.is_idle() {
            return Vec::new();
        }
        let actions = match self.drag.update(screen, &self.viewport) {
            Some(mutation) => self.apply_mutation(mutation),
            None => Vec::new(),
        };
        match self.drag.end() {
            DragState::Resizing { id, current, .. } => {
                tracing::debug!(%id, width = current.width, height = current.height, "resize finished");
            }
            DragState::Dragging { id, moved: true, .. } => tracing::debug!(%id, "drag finished"),
            DragState::Dragging { .. } | DragState::Idle => {}
        }
        actions
    }

    /// The platform interrupted the pointer sequence.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        let mut actions = self.cancel_manipulation();
        actions.extend(self.set_cursor(mode_cursor(self.mode)));
        actions
    }

    pub fn on_double_click(&mut self, screen: Point) -> Vec<Action> {
        self.edit_request(screen).into_iter().collect()
    }

    pub fn on_wheel(&mut self, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let before = self.viewport;
        if modifiers.command() {
            self.viewport.zoom_by(-delta.dy * self.config.wheel_zoom_sensitivity);
        } else {
            self.viewport.pan_by(-delta.dx, -delta.dy);
        }
        self.viewport_changed(before)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        match key.0.as_str() {
            "Delete" | "Backspace" => match self.selected {
                Some(id) => self.delete_block(&id),
                None => Vec::new(),
            },
            "Escape" => {
                let mut actions = self.set_selection(None);
                actions.extend(self.set_mode(Mode::Idle));
                actions
            }
            _ => Vec::new(),
        }
    }

    // --- Touch input ---

    /// Contacts went down. `touches` lists every contact now on the surface.
    ///
    /// A single contact is routed as a primary press. A second contact cancels
    /// whatever the first one was doing and starts a pinch.
    pub fn on_touch_start(&mut self, touches: &[TouchPoint], now_ms: f64) -> Vec<Action> {
        let suppressed = self.is_manipulating();
        let events = self.gestures.touch_start(touches, now_ms);
        let mut actions = Vec::new();
        match touches {
            [only] if self.primary_touch.is_none() && !self.gestures.is_pinching() => {
                self.primary_touch = Some(*only);
                actions.extend(self.on_pointer_down(only.point(), Button::Primary, None));
            }
            [_, _, ..] => {
                if self.primary_touch.is_some() {
                    tracing::debug!("second contact cancels single-contact operation");
                }
                actions.extend(self.cancel_manipulation());
            }
            _ => {}
        }
        actions.extend(self.handle_gestures(events, suppressed));
        actions
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint], now_ms: f64) -> Vec<Action> {
        let suppressed = self.is_manipulating();
        let events = self.gestures.touch_move(touches, now_ms);
        let mut actions = Vec::new();
        if let Some(primary) = self.primary_touch {
            if let Some(t) = touches.iter().find(|t| t.id == primary.id) {
                self.primary_touch = Some(*t);
                actions.extend(self.on_pointer_move(t.point(), None));
            }
        }
        actions.extend(self.handle_gestures(events, suppressed));
        actions
    }

    /// Contacts lifted. `remaining` lists the contacts still on the surface.
    pub fn on_touch_end(&mut self, remaining: &[TouchPoint], now_ms: f64) -> Vec<Action> {
        let suppressed = self.is_manipulating();
        let events = self.gestures.touch_end(remaining, now_ms);
        let mut actions = Vec::new();
        if let Some(primary) = self.primary_touch {
            if !remaining.iter().any(|t| t.id == primary.id) {
                self.primary_touch = None;
                actions.extend(self.on_pointer_up(primary.point()));
            }
        }
        actions.extend(self.handle_gestures(events, suppressed));
        actions
    }

    pub fn on_touch_cancel(&mut self) -> Vec<Action> {
        let events = self.gestures.touch_cancel();
        let mut actions = self.cancel_manipulation();
        actions.extend(self.handle_gestures(events, false));
        actions
    }

    /// Advance gesture timers. Hosts call this from an animation frame or timer.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let suppressed = self.is_manipulating();
        let events = self.gestures.tick(now_ms);
        self.handle_gestures(events, suppressed)
    }

    // --- Render ---

    /// Draw a full frame.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<(), RenderError> {
        let scene = Scene {
            blocks: &self.blocks,
            strokes: &self.strokes,
            viewport: &self.viewport,
            selected: self.selected,
            size: self.viewport_size,
            dpr: self.dpr,
            // Handles are drawn at half their hit area.
            handle_size: self.config.hitbox_size / 2.0,
        };
        render::draw(surface, &scene)
    }

    /// Draw only the newest piece of the live stroke over the previous frame.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn render_draft_tail<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<(), RenderError> {
        self.strokes.render_draft_tail(surface, &self.viewport)
    }

    // --- Internals ---

    fn refuse_mutation(&self, op: &'static str) -> bool {
        if self.read_only {
            tracing::debug!(op, "refused in read-only mode");
        }
        self.read_only
    }

    fn is_manipulating(&self) -> bool {
        self.drag.is_manipulating() || self.strokes.is_drawing()
    }

    fn block_changed(&self, id: &BlockId) -> Vec<Action> {
        match self.blocks.get(id) {
            Some(block) => vec![Action::BlockChanged(block.clone()), Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    fn set_selection(&mut self, selected: Option<BlockId>) -> Vec<Action> {
        if self.selected == selected {
            return Vec::new();
        }
        self.selected = selected;
        vec![Action::SelectionChanged(selected), Action::RenderNeeded]
    }

    fn set_cursor(&mut self, cursor: &str) -> Vec<Action> {
        if self.cursor == cursor {
            return Vec::new();
        }
        self.cursor = cursor.to_string();
        vec![Action::SetCursor(self.cursor.clone())]
    }

    fn viewport_changed(&self, before: Viewport) -> Vec<Action> {
        if self.viewport == before {
            return Vec::new();
        }
        vec![Action::ViewportChanged(self.viewport), Action::RenderNeeded]
    }

    fn hit_at(&self, screen: Point) -> Option<Hit> {
        let canvas_pt = self.viewport.to_canvas(screen);
        hit::hit_test(canvas_pt, &self.blocks, &self.viewport, self.selected, self.config.hitbox_size)
    }

    /// The block whose body is under `screen`, ignoring handles.
    fn block_at(&self, screen: Point) -> Option<BlockId> {
        let canvas_pt = self.viewport.to_canvas(screen);
        hit::hit_test(canvas_pt, &self.blocks, &self.viewport, None, self.config.hitbox_size).map(|h| h.block_id)
    }

    fn press_idle(&mut self, screen: Point) -> Vec<Action> {
        if self.read_only {
            return Vec::new();
        }
        match self.hit_at(screen) {
            Some(Hit { block_id, part: HitPart::ResizeHandle(handle) }) => {
                let Some(block) = self.blocks.get(&block_id) else {
                    return Vec::new();
                };
                if !self.drag.begin_resize(block, handle, screen, self.selected) {
                    return Vec::new();
                }
                tracing::debug!(id = %block_id, ?handle, "resize started");
                self.set_cursor(handle.cursor())
            }
            Some(Hit { block_id, part: HitPart::Body }) => {
                let actions = self.set_selection(Some(block_id));
                if let Some(block) = self.blocks.get(&block_id) {
                    self.drag.begin_drag(block, screen);
                }
                actions
            }
            None => self.set_selection(None),
        }
    }

    fn hover(&mut self, screen: Point) -> Vec<Action> {
        let cursor = match self.hit_at(screen) {
            Some(Hit { part: HitPart::ResizeHandle(handle), .. }) => handle.cursor(),
            Some(Hit { part: HitPart::Body, .. }) => "move",
            None => mode_cursor(Mode::Idle),
        };
        self.set_cursor(cursor)
    }

    fn apply_mutation(&mut self, mutation: Mutation) -> Vec<Action> {
        let (id, applied) = match mutation {
            Mutation::Move { id, x, y } => (id, self.blocks.move_to(&id, x, y)),
            Mutation::Resize { id, rect } => (id, self.blocks.set_rect(&id, rect)),
        };
        if applied { self.block_changed(&id) } else { Vec::new() }
    }

    /// End the pointer sequence in flight without completing it. Drag and resize
    /// updates already applied stay; a live stroke follows the usual commit rule.
    fn cancel_manipulation(&mut self) -> Vec<Action> {
        self.drag.cancel();
        self.pan_last = None;
        self.primary_touch = None;
        self.commit_stroke()
    }

    fn commit_stroke(&mut self) -> Vec<Action> {
        if !self.strokes.is_drawing() {
            return Vec::new();
        }
        match self.strokes.finish() {
            Some(stroke) => {
                if let Some(extent) = stroke.max_extent() {
                    self.blocks.include_point(extent);
                }
                vec![Action::StrokeCommitted(stroke), Action::RenderNeeded]
            }
            None => vec![Action::RenderNeeded],
        }
    }

    fn context_menu(&self, screen: Point) -> Action {
        Action::ContextMenuRequested { target: self.block_at(screen), screen }
    }

    fn edit_request(&self, screen: Point) -> Option<Action> {
        if self.read_only || self.mode == Mode::Drawing {
            return None;
        }
        self.block_at(screen).map(|id| Action::EditRequested { id })
    }

    /// Publish recognized gestures and apply the auxiliary actions they drive.
    /// While a manipulation is under way only pinch events pass.
    fn handle_gestures(&mut self, events: Vec<GestureEvent>, suppressed: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        for event in events {
            let pinch = matches!(
                event,
                GestureEvent::PinchStart { .. } | GestureEvent::PinchChange { .. } | GestureEvent::PinchEnd { .. }
            );
            if suppressed && !pinch {
                tracing::trace!(?event, "gesture suppressed during manipulation");
                continue;
            }
            actions.push(Action::Gesture(event));
            match event {
                GestureEvent::DoubleTap { at } => actions.extend(self.edit_request(at)),
                GestureEvent::LongPress { at } => {
                    if matches!(self.drag.state(), DragState::Dragging { moved: false, .. }) {
                        self.drag.cancel();
                    }
                    if self.mode != Mode::Drawing {
                        actions.push(self.context_menu(at));
                    }
                }
                GestureEvent::PinchStart { .. } => self.pinch_start_zoom = Some(self.viewport.zoom),
                GestureEvent::PinchChange { scale, .. } => {
                    if let Some(start) = self.pinch_start_zoom {
                        let before = self.viewport;
                        self.viewport.set_zoom(start * scale);
                        actions.extend(self.viewport_changed(before));
                    }
                }
                GestureEvent::PinchEnd { .. } => self.pinch_start_zoom = None,
                GestureEvent::Tap { .. } | GestureEvent::Swipe { .. } => {}
            }
        }
        actions
    }
}

fn mode_cursor(mode: Mode) -> &'static str {
    match mode {
        Mode::Idle => "default",
        Mode::Drawing => "crosshair",
        Mode::Panning => "grab",
    }
}

/// The full canvas engine. Wraps [`CanvasController`] and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: CanvasController,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: InputModeConfig, initial: CanvasContent) -> Self {
        Self { canvas, core: CanvasController::new(config, initial) }
    }

    /// Size the backing store for `dpr` and update the controller's viewport.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let actions = self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width(device_pixels(width_css, dpr));
        self.canvas.set_height(device_pixels(height_css, dpr));
        actions
    }

    /// Fit the canvas extent into the host window.
    ///
    /// # Errors
    ///
    /// Fails when there is no window or its size cannot be read.
    pub fn fit_to_window(&mut self) -> Result<Vec<Action>, RenderError> {
        let window = web_sys::window().ok_or(RenderError::WindowUnavailable)?;
        let width = window.inner_width()?.as_f64().ok_or(RenderError::WindowUnavailable)?;
        let height = window.inner_height()?.as_f64().ok_or(RenderError::WindowUnavailable)?;
        Ok(self.core.fit_to_screen(Size::new(width, height)))
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Fails when the 2D context cannot be obtained or a drawing call fails.
    pub fn render(&self) -> Result<(), RenderError> {
        let ctx = self.context()?;
        self.core.render(&mut WebSurface::new(&ctx))
    }

    /// Draw the newest piece of the live stroke over the current canvas contents.
    ///
    /// # Errors
    ///
    /// Fails when the 2D context cannot be obtained or a drawing call fails.
    pub fn render_draft_tail(&self) -> Result<(), RenderError> {
        let ctx = self.context()?;
        self.core.render_draft_tail(&mut WebSurface::new(&ctx))
    }

    /// Current content as JSON, for hosts that persist the wire form directly.
    ///
    /// # Errors
    ///
    /// Fails if the content cannot be serialized.
    pub fn content_json(&self) -> Result<String, SaveError> {
        self.core.content().to_json().map_err(SaveError::from)
    }

    fn context(&self) -> Result<CanvasRenderingContext2d, RenderError> {
        self.canvas
            .get_context("2d")?
            .ok_or(RenderError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::ContextUnavailable)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_pixels(css: f64, dpr: f64) -> u32 {
    (css * dpr).round().max(0.0) as u32
}
