//! Freehand ink: capture, smoothing and rendering.
//!
//! Capture converts every screen sample into canvas space before storing it,
//! so strokes are independent of the viewport they were drawn under. The
//! live stroke sits in a draft slot of its own; on finish it is moved into the
//! committed collection whole (or dropped when it has fewer than two points).
//! Committed strokes are never edited afterwards.
//!
//! Rendering walks the points with quadratic curves: each sample acts as the
//! control point of a curve running between the midpoints of its neighbouring
//! segments, which rounds off the corners of the raw polyline. Each curve is
//! stroked separately so its width can follow the pen pressure.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{BRUSH_MAX_WIDTH, BRUSH_MIN_WIDTH, DEFAULT_PRESSURE};
use crate::error::RenderError;
use crate::render::Surface;
use crate::viewport::{Point, Viewport};

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// One captured sample in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Normalized pen pressure in `[0, 1]`.
    pub pressure: f64,
}

impl StrokePoint {
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A freehand ink path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<StrokePoint>,
    pub color: String,
    /// Base line width in canvas units, scaled per point by pressure.
    pub width: f64,
    pub opacity: f64,
}

impl Stroke {
    /// Largest x and largest y over all points.
    #[must_use]
    pub fn max_extent(&self) -> Option<Point> {
        let first = self.points.first()?;
        let init = Point::new(first.x, first.y);
        Some(self.points.iter().fold(init, |acc, p| Point::new(acc.x.max(p.x), acc.y.max(p.y))))
    }
}

/// Settings applied to strokes started from now on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: "#1F1A17".into(), width: 2.0, opacity: 1.0 }
    }
}

impl Brush {
    /// Clamp width and opacity into their valid ranges.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.width = if self.width.is_finite() { self.width.clamp(BRUSH_MIN_WIDTH, BRUSH_MAX_WIDTH) } else { 2.0 };
        self.opacity = if self.opacity.is_finite() { self.opacity.clamp(0.0, 1.0) } else { 1.0 };
        self
    }
}

/// One drawable piece of a smoothed stroke, in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    /// Quadratic control point; `None` for the straight run into the final sample.
    pub control: Option<Point>,
    pub to: Point,
    pub pressure: f64,
}

/// Break `points` into smoothed segments. Fewer than two points yields nothing.
#[must_use]
pub fn smooth_segments(points: &[StrokePoint]) -> Vec<Segment> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut segments = Vec::with_capacity(points.len());
    let mut cursor = points[0].point();
    for pair in points.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let mid = prev.point().midpoint(cur.point());
        segments.push(Segment { from: cursor, control: Some(prev.point()), to: mid, pressure: cur.pressure });
        cursor = mid;
    }
    if let Some(last) = points.last() {
        segments.push(Segment { from: cursor, control: None, to: last.point(), pressure: last.pressure });
    }
    segments
}

/// Draw `segments` of `stroke` under `viewport`: the surface is translated by
/// the pan, and coordinates and widths are scaled by the zoom.
fn draw_segments<S: Surface + ?Sized>(
    surface: &mut S,
    stroke: &Stroke,
    segments: &[Segment],
    viewport: &Viewport,
) -> Result<(), RenderError> {
    if segments.is_empty() {
        return Ok(());
    }
    let z = viewport.zoom;
    surface.save();
    surface.translate(viewport.pan_x, viewport.pan_y)?;
    surface.set_stroke_style(&stroke.color);
    surface.set_global_alpha(stroke.opacity);
    surface.set_line_cap("round");
    surface.set_line_join("round");
    for seg in segments {
        surface.begin_path();
        surface.set_line_width(stroke.width * seg.pressure * z);
        surface.move_to(seg.from.x * z, seg.from.y * z);
        match seg.control {
            Some(c) => surface.quadratic_curve_to(c.x * z, c.y * z, seg.to.x * z, seg.to.y * z),
            None => surface.line_to(seg.to.x * z, seg.to.y * z),
        }
        surface.stroke();
    }
    surface.restore();
    Ok(())
}

/// Draw a whole stroke. Strokes with fewer than two points draw nothing.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_stroke<S: Surface + ?Sized>(surface: &mut S, stroke: &Stroke, viewport: &Viewport) -> Result<(), RenderError> {
    draw_segments(surface, stroke, &smooth_segments(&stroke.points), viewport)
}

/// Stroke capture and the committed stroke collection.
pub struct StrokeRenderer {
    brush: Brush,
    draft: Option<Stroke>,
    strokes: Vec<Stroke>,
}

impl StrokeRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self { brush: Brush::default(), draft: None, strokes: Vec::new() }
    }

    #[must_use]
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Replace the brush. The live stroke, if any, keeps the settings it started with.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush.clamped();
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.draft.is_some()
    }

    /// The stroke being captured, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&Stroke> {
        self.draft.as_ref()
    }

    /// Committed strokes in insertion order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Replace the committed strokes. Degenerate strokes are dropped, and a
    /// stroke reusing an earlier id replaces it in place.
    pub fn load(&mut self, strokes: Vec<Stroke>) {
        self.draft = None;
        self.strokes.clear();
        for stroke in strokes.into_iter().filter(|s| s.points.len() >= 2) {
            if let Some(existing) = self.strokes.iter_mut().find(|s| s.id == stroke.id) {
                tracing::debug!(id = %stroke.id, "duplicate stroke id replaced on load");
                *existing = stroke;
            } else {
                self.strokes.push(stroke);
            }
        }
    }

    /// Remove every committed stroke and any live one.
    pub fn clear(&mut self) {
        self.draft = None;
        self.strokes.clear();
    }

    /// Start a stroke seeded with the sample at `screen`. Ignored while already drawing.
    pub fn begin(&mut self, screen: Point, pressure: Option<f64>, viewport: &Viewport) -> bool {
        if self.draft.is_some() {
            return false;
        }
        self.draft = Some(Stroke {
            id: Uuid::new_v4(),
            points: vec![sample(screen, pressure, viewport)],
            color: self.brush.color.clone(),
            width: self.brush.width,
            opacity: self.brush.opacity,
        });
        true
    }

    /// Append a sample to the live stroke. Ignored when not drawing.
    pub fn extend(&mut self, screen: Point, pressure: Option<f64>, viewport: &Viewport) -> bool {
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        draft.points.push(sample(screen, pressure, viewport));
        true
    }

    /// End the live stroke. With two or more points it is committed and returned;
    /// otherwise it is discarded.
    pub fn finish(&mut self) -> Option<Stroke> {
        let draft = self.draft.take()?;
        if draft.points.len() < 2 {
            tracing::trace!(id = %draft.id, "single-point stroke discarded");
            return None;
        }
        tracing::debug!(id = %draft.id, points = draft.points.len(), "stroke committed");
        self.strokes.push(draft.clone());
        Some(draft)
    }

    /// Drop the live stroke without committing it. Returns whether there was one.
    pub fn discard_draft(&mut self) -> bool {
        self.draft.take().is_some()
    }

    /// Redraw every committed stroke in insertion order.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn render_committed<S: Surface + ?Sized>(&self, surface: &mut S, viewport: &Viewport) -> Result<(), RenderError> {
        for stroke in &self.strokes {
            draw_stroke(surface, stroke, viewport)?;
        }
        Ok(())
    }

    /// Draw the whole live stroke.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn render_draft<S: Surface + ?Sized>(&self, surface: &mut S, viewport: &Viewport) -> Result<(), RenderError> {
        match &self.draft {
            Some(draft) => draw_stroke(surface, draft, viewport),
            None => Ok(()),
        }
    }

    /// Draw only the curve added by the most recent sample of the live stroke,
    /// on top of what is already on the surface.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn render_draft_tail<S: Surface + ?Sized>(&self, surface: &mut S, viewport: &Viewport) -> Result<(), RenderError> {
        let Some(draft) = &self.draft else {
            return Ok(());
        };
        let segments = smooth_segments(&draft.points);
        // The last entry is the straight run to the live sample, which moves every frame.
        let tail = segments.len().saturating_sub(2);
        let curve = segments.get(tail..segments.len().saturating_sub(1)).unwrap_or_default();
        draw_segments(surface, draft, curve, viewport)
    }
}

impl Default for StrokeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn sample(screen: Point, pressure: Option<f64>, viewport: &Viewport) -> StrokePoint {
    let p = viewport.to_canvas(screen);
    let pressure = match pressure {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => DEFAULT_PRESSURE,
    };
    StrokePoint { x: p.x, y: p.y, pressure }
}
