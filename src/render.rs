//! Rendering: draws the full canvas scene to a 2D surface.
//!
//! [`Surface`] is the subset of the HTML canvas 2D API the engine needs. The
//! browser implementation, [`WebSurface`], is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`]; everything else draws through the
//! trait so scene output can be inspected without a browser.
//!
//! Layers, bottom to top: background grid, blocks in z-order, committed
//! strokes, the live stroke, selection outline and handles. Rendering reads
//! state and never mutates it.

#[cfg(test)]
#[path = "render_test.rs"]
pub(crate) mod render_test;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::block::{Block, BlockContent, BlockId, BlockStore, Rect};
use crate::consts::{GRID_MIN_SCREEN_SPACING, GRID_SPACING};
use crate::drag::ResizeHandle;
use crate::error::RenderError;
use crate::stroke::StrokeRenderer;
use crate::viewport::{Size, Viewport};

const GRID_COLOR: &str = "rgba(31, 26, 23, 0.06)";
const BLOCK_FILL: &str = "#FFFFFF";
const BLOCK_BORDER: &str = "#D0CCC7";
const IMAGE_FILL: &str = "#F1EFEC";
const TEXT_COLOR: &str = "#1F1A17";
const PLACEHOLDER_COLOR: &str = "#8A847E";
const SELECTION_COLOR: &str = "#1E88E5";

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;
/// Inset of text from the block edge, in canvas units.
const TEXT_PADDING: f64 = 8.0;
const TEXT_LINE_HEIGHT: f64 = 18.0;
const FONT: &str = "14px sans-serif";

/// The drawing operations the scene renderer relies on.
///
/// Mirrors the HTML canvas 2D context; calls that can fail there return `Result`.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    /// # Errors
    /// Fails when the underlying context rejects the call.
    #[allow(clippy::many_single_char_names)]
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), RenderError>;
    /// # Errors
    /// Fails when the underlying context rejects the call.
    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError>;
    /// # Errors
    /// Fails when the underlying context rejects the call.
    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError>;
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    /// # Errors
    /// Fails when the underlying context rejects the call.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;
    fn set_stroke_style(&mut self, color: &str);
    fn set_fill_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: &str);
    fn set_line_join(&mut self, join: &str);
    fn set_global_alpha(&mut self, alpha: f64);
    /// # Errors
    /// Fails when the underlying context rejects the call.
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), RenderError>;
    fn set_font(&mut self, font: &str);
}

/// [`Surface`] backed by a browser canvas 2D context.
pub struct WebSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl<'a> WebSurface<'a> {
    #[must_use]
    pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Surface for WebSurface<'_> {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    #[allow(clippy::many_single_char_names)]
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), RenderError> {
        self.ctx.set_transform(a, b, c, d, e, f).map_err(RenderError::from)
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.translate(x, y).map_err(RenderError::from)
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.scale(x, y).map_err(RenderError::from)
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.clear_rect(x, y, w, h);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ctx.quadratic_curve_to(cpx, cpy, x, y);
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.stroke_rect(x, y, w, h);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.fill_text(text, x, y).map_err(RenderError::from)
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_line_cap(&mut self, cap: &str) {
        self.ctx.set_line_cap(cap);
    }

    fn set_line_join(&mut self, join: &str) {
        self.ctx.set_line_join(join);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), RenderError> {
        let dash: js_sys::Array = segments.iter().map(|v| JsValue::from_f64(*v)).collect();
        self.ctx.set_line_dash(&dash).map_err(RenderError::from)
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }
}

/// Read-only view of everything a frame needs.
pub struct Scene<'a> {
    pub blocks: &'a BlockStore,
    pub strokes: &'a StrokeRenderer,
    pub viewport: &'a Viewport,
    pub selected: Option<BlockId>,
    /// Host viewport size in CSS pixels.
    pub size: Size,
    /// Device pixel ratio.
    pub dpr: f64,
    /// Resize handle half-size in screen pixels.
    pub handle_size: f64,
}

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) -> Result<(), RenderError> {
    let vp = scene.viewport;

    // Layer 1: clear.
    surface.set_transform(scene.dpr, 0.0, 0.0, scene.dpr, 0.0, 0.0)?;
    surface.clear_rect(0.0, 0.0, scene.size.width, scene.size.height);

    // Layer 2: grid.
    draw_grid(surface, vp, scene.size)?;

    // Layer 3: blocks in z-order (bottom first).
    surface.save();
    surface.translate(vp.pan_x, vp.pan_y)?;
    surface.scale(vp.zoom, vp.zoom)?;
    for block in scene.blocks.sorted_by_z() {
        draw_block(surface, block)?;
    }
    surface.restore();

    // Layer 4: ink. Strokes apply their own pan/zoom mapping.
    scene.strokes.render_committed(surface, vp)?;
    scene.strokes.render_draft(surface, vp)?;

    // Layer 5: selection UI.
    if let Some(block) = scene.selected.and_then(|id| scene.blocks.get(&id)) {
        surface.save();
        surface.translate(vp.pan_x, vp.pan_y)?;
        surface.scale(vp.zoom, vp.zoom)?;
        draw_selection(surface, &block.rect, vp.zoom, scene.handle_size)?;
        surface.restore();
    }

    Ok(())
}

/// Grid lines every [`GRID_SPACING`] canvas units across the visible area, drawn in screen space.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw_grid<S: Surface + ?Sized>(surface: &mut S, vp: &Viewport, size: Size) -> Result<(), RenderError> {
    let step = GRID_SPACING * vp.zoom;
    if step < GRID_MIN_SCREEN_SPACING || size.width <= 0.0 || size.height <= 0.0 {
        return Ok(());
    }
    surface.save();
    surface.set_stroke_style(GRID_COLOR);
    surface.set_line_width(1.0);
    surface.begin_path();

    let mut x = vp.pan_x.rem_euclid(step);
    while x <= size.width {
        surface.move_to(x, 0.0);
        surface.line_to(x, size.height);
        x += step;
    }
    let mut y = vp.pan_y.rem_euclid(step);
    while y <= size.height {
        surface.move_to(0.0, y);
        surface.line_to(size.width, y);
        y += step;
    }

    surface.stroke();
    surface.restore();
    Ok(())
}

// =============================================================
// Blocks
// =============================================================

fn draw_block<S: Surface + ?Sized>(surface: &mut S, block: &Block) -> Result<(), RenderError> {
    let r = &block.rect;
    match &block.content {
        BlockContent::Text { text } => draw_text_block(surface, r, text),
        BlockContent::Image { src } => draw_image_block(surface, r, src),
        BlockContent::Table { rows, cols } => {
            draw_table_block(surface, r, *rows, *cols);
            Ok(())
        }
        BlockContent::Generic { data } => {
            let label = data.get("title").and_then(serde_json::Value::as_str).unwrap_or("Block");
            draw_frame(surface, r, BLOCK_FILL);
            draw_label(surface, r, label)
        }
    }
}

fn draw_frame<S: Surface + ?Sized>(surface: &mut S, r: &Rect, fill: &str) {
    surface.set_fill_style(fill);
    surface.fill_rect(r.x, r.y, r.width, r.height);
    surface.set_stroke_style(BLOCK_BORDER);
    surface.set_line_width(1.0);
    surface.stroke_rect(r.x, r.y, r.width, r.height);
}

fn draw_label<S: Surface + ?Sized>(surface: &mut S, r: &Rect, label: &str) -> Result<(), RenderError> {
    surface.set_fill_style(PLACEHOLDER_COLOR);
    surface.set_font(FONT);
    surface.fill_text(label, r.x + TEXT_PADDING, r.y + TEXT_PADDING + TEXT_LINE_HEIGHT)
}

fn draw_text_block<S: Surface + ?Sized>(surface: &mut S, r: &Rect, text: &str) -> Result<(), RenderError> {
    draw_frame(surface, r, BLOCK_FILL);
    surface.set_fill_style(TEXT_COLOR);
    surface.set_font(FONT);
    let mut baseline = r.y + TEXT_PADDING + TEXT_LINE_HEIGHT;
    for line in text.lines() {
        if baseline > r.bottom() - TEXT_PADDING {
            break;
        }
        surface.fill_text(line, r.x + TEXT_PADDING, baseline)?;
        baseline += TEXT_LINE_HEIGHT;
    }
    Ok(())
}

/// Image pixels are composited by the host; the engine draws the frame and the reference.
fn draw_image_block<S: Surface + ?Sized>(surface: &mut S, r: &Rect, src: &str) -> Result<(), RenderError> {
    draw_frame(surface, r, IMAGE_FILL);
    surface.set_stroke_style(BLOCK_BORDER);
    surface.begin_path();
    surface.move_to(r.x, r.y);
    surface.line_to(r.right(), r.bottom());
    surface.move_to(r.right(), r.y);
    surface.line_to(r.x, r.bottom());
    surface.stroke();
    draw_label(surface, r, if src.is_empty() { "Image" } else { src })
}

fn draw_table_block<S: Surface + ?Sized>(surface: &mut S, r: &Rect, rows: u32, cols: u32) {
    draw_frame(surface, r, BLOCK_FILL);
    if rows == 0 || cols == 0 {
        return;
    }
    surface.set_stroke_style(BLOCK_BORDER);
    surface.begin_path();
    let row_h = r.height / f64::from(rows);
    for i in 1..rows {
        let y = r.y + row_h * f64::from(i);
        surface.move_to(r.x, y);
        surface.line_to(r.right(), y);
    }
    let col_w = r.width / f64::from(cols);
    for j in 1..cols {
        let x = r.x + col_w * f64::from(j);
        surface.move_to(x, r.y);
        surface.line_to(x, r.bottom());
    }
    surface.stroke();
}

// =============================================================
// Selection
// =============================================================

/// Dashed outline plus the four corner handles. Expects a canvas-space transform;
/// screen-pixel sizes are divided by `zoom`.
fn draw_selection<S: Surface + ?Sized>(surface: &mut S, r: &Rect, zoom: f64, handle_size: f64) -> Result<(), RenderError> {
    let px = 1.0 / zoom;
    surface.set_stroke_style(SELECTION_COLOR);
    surface.set_line_width(px);
    surface.set_line_dash(&[SELECTION_DASH_PX * px, SELECTION_DASH_PX * px])?;
    surface.stroke_rect(r.x, r.y, r.width, r.height);
    surface.set_line_dash(&[])?;

    let half = handle_size * px;
    surface.set_fill_style(BLOCK_FILL);
    for handle in ResizeHandle::ALL {
        let c = handle.position(r);
        surface.fill_rect(c.x - half, c.y - half, half * 2.0, half * 2.0);
        surface.stroke_rect(c.x - half, c.y - half, half * 2.0, half * 2.0);
    }
    Ok(())
}
