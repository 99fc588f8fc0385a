#![allow(clippy::float_cmp)]

use super::*;
use crate::render::render_test::{Op, RecordingSurface};

fn sp(x: f64, y: f64, pressure: f64) -> StrokePoint {
    StrokePoint { x, y, pressure }
}

fn stroke_of(points: Vec<StrokePoint>) -> Stroke {
    Stroke { id: Uuid::new_v4(), points, color: "#000".into(), width: 4.0, opacity: 0.5 }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// Capture
// =============================================================

#[test]
fn samples_are_stored_in_canvas_space() {
    let vp = Viewport { pan_x: 100.0, pan_y: 50.0, zoom: 2.0 };
    let mut r = StrokeRenderer::new();
    assert!(r.begin(pt(120.0, 70.0), Some(0.25), &vp));
    let draft = r.draft().unwrap();
    assert_eq!(draft.points, vec![sp(10.0, 10.0, 0.25)]);
}

#[test]
fn missing_pressure_defaults_to_full() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.begin(pt(0.0, 0.0), None, &vp);
    r.extend(pt(1.0, 1.0), Some(f64::NAN), &vp);
    r.extend(pt(2.0, 2.0), Some(7.0), &vp);
    let pressures: Vec<f64> = r.draft().unwrap().points.iter().map(|p| p.pressure).collect();
    assert_eq!(pressures, vec![1.0, 1.0, 1.0]);
}

#[test]
fn stroke_keeps_brush_it_started_with() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.set_brush(Brush { color: "#f00".into(), width: 6.0, opacity: 0.8 });
    r.begin(pt(0.0, 0.0), None, &vp);
    r.set_brush(Brush { color: "#00f".into(), width: 1.0, opacity: 1.0 });
    r.extend(pt(5.0, 5.0), None, &vp);
    let stroke = r.finish().unwrap();
    assert_eq!(stroke.color, "#f00");
    assert_eq!(stroke.width, 6.0);
    assert_eq!(stroke.opacity, 0.8);
}

#[test]
fn begin_while_drawing_is_ignored() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    assert!(r.begin(pt(0.0, 0.0), None, &vp));
    assert!(!r.begin(pt(50.0, 50.0), None, &vp));
    assert_eq!(r.draft().unwrap().points.len(), 1);
}

#[test]
fn extend_without_draft_is_ignored() {
    let mut r = StrokeRenderer::new();
    assert!(!r.extend(pt(1.0, 1.0), None, &Viewport::default()));
    assert!(!r.is_drawing());
}

// =============================================================
// Commit
// =============================================================

#[test]
fn single_point_stroke_is_discarded() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.begin(pt(0.0, 0.0), None, &vp);
    assert_eq!(r.finish(), None);
    assert!(r.strokes().is_empty());
    assert!(!r.is_drawing());
}

#[test]
fn two_point_stroke_is_committed() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.begin(pt(0.0, 0.0), None, &vp);
    r.extend(pt(10.0, 0.0), None, &vp);
    let stroke = r.finish().unwrap();
    assert_eq!(r.strokes(), std::slice::from_ref(&stroke));
    assert!(r.draft().is_none());
}

#[test]
fn committed_strokes_keep_insertion_order() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    let mut ids = Vec::new();
    for i in 0..3 {
        let x = f64::from(i) * 10.0;
        r.begin(pt(x, 0.0), None, &vp);
        r.extend(pt(x, 5.0), None, &vp);
        ids.push(r.finish().unwrap().id);
    }
    let stored: Vec<StrokeId> = r.strokes().iter().map(|s| s.id).collect();
    assert_eq!(stored, ids);
}

#[test]
fn load_drops_degenerate_strokes() {
    let mut r = StrokeRenderer::new();
    let good = stroke_of(vec![sp(0.0, 0.0, 1.0), sp(1.0, 1.0, 1.0)]);
    r.load(vec![stroke_of(vec![sp(0.0, 0.0, 1.0)]), good.clone(), stroke_of(Vec::new())]);
    assert_eq!(r.strokes(), &[good]);
}

#[test]
fn load_dedups_stroke_ids() {
    let mut r = StrokeRenderer::new();
    let first = stroke_of(vec![sp(0.0, 0.0, 1.0), sp(1.0, 1.0, 1.0)]);
    let other = stroke_of(vec![sp(5.0, 5.0, 1.0), sp(6.0, 6.0, 1.0)]);
    let mut again = stroke_of(vec![sp(9.0, 9.0, 1.0), sp(8.0, 8.0, 1.0)]);
    again.id = first.id;
    r.load(vec![first, other.clone(), again.clone()]);
    assert_eq!(r.strokes(), &[again, other]);
}

#[test]
fn clear_drops_everything() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.load(vec![stroke_of(vec![sp(0.0, 0.0, 1.0), sp(1.0, 1.0, 1.0)])]);
    r.begin(pt(0.0, 0.0), None, &vp);
    r.clear();
    assert!(r.strokes().is_empty());
    assert!(!r.is_drawing());
}

#[test]
fn max_extent_takes_largest_coordinates() {
    let s = stroke_of(vec![sp(5.0, 900.0, 1.0), sp(2400.0, 10.0, 1.0), sp(-30.0, 40.0, 1.0)]);
    assert_eq!(s.max_extent(), Some(pt(2400.0, 900.0)));
    assert_eq!(stroke_of(Vec::new()).max_extent(), None);
}

#[test]
fn brush_is_clamped() {
    let b = Brush { color: "#123".into(), width: 500.0, opacity: -1.0 }.clamped();
    assert_eq!(b.width, BRUSH_MAX_WIDTH);
    assert_eq!(b.opacity, 0.0);
    let thin = Brush { width: 0.0, ..Brush::default() }.clamped();
    assert_eq!(thin.width, BRUSH_MIN_WIDTH);
    let bad = Brush { width: f64::INFINITY, opacity: f64::NAN, ..Brush::default() }.clamped();
    assert_eq!((bad.width, bad.opacity), (2.0, 1.0));
}

// =============================================================
// Smoothing
// =============================================================

#[test]
fn fewer_than_two_points_have_no_segments() {
    assert!(smooth_segments(&[]).is_empty());
    assert!(smooth_segments(&[sp(1.0, 1.0, 1.0)]).is_empty());
}

#[test]
fn curves_pass_through_midpoints() {
    let points = [sp(0.0, 0.0, 1.0), sp(10.0, 0.0, 0.5), sp(10.0, 10.0, 0.25)];
    let segs = smooth_segments(&points);
    assert_eq!(segs.len(), 3);

    assert_eq!(segs[0].from, pt(0.0, 0.0));
    assert_eq!(segs[0].control, Some(pt(0.0, 0.0)));
    assert_eq!(segs[0].to, pt(5.0, 0.0));
    assert_eq!(segs[0].pressure, 0.5);

    assert_eq!(segs[1].from, pt(5.0, 0.0));
    assert_eq!(segs[1].control, Some(pt(10.0, 0.0)));
    assert_eq!(segs[1].to, pt(10.0, 5.0));

    assert_eq!(segs[2].control, None);
    assert_eq!(segs[2].to, pt(10.0, 10.0));
    assert_eq!(segs[2].pressure, 0.25);
}

#[test]
fn segments_are_contiguous() {
    let points: Vec<StrokePoint> = (0..8).map(|i| sp(f64::from(i * i), f64::from(i) * 3.0, 1.0)).collect();
    let segs = smooth_segments(&points);
    for pair in segs.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
    assert_eq!(segs.first().unwrap().from, points[0].point());
    assert_eq!(segs.last().unwrap().to, points[7].point());
}

// =============================================================
// Rendering
// =============================================================

#[test]
fn draw_applies_pan_and_zoom() {
    let vp = Viewport { pan_x: 10.0, pan_y: 20.0, zoom: 2.0 };
    let s = stroke_of(vec![sp(0.0, 0.0, 0.5), sp(10.0, 0.0, 0.5)]);
    let mut surface = RecordingSurface::default();
    draw_stroke(&mut surface, &s, &vp).unwrap();

    assert_eq!(surface.ops[0], Op::Save);
    assert_eq!(surface.ops[1], Op::Translate(10.0, 20.0));
    assert!(surface.ops.contains(&Op::StrokeStyle("#000".into())));
    assert!(surface.ops.contains(&Op::GlobalAlpha(0.5)));
    assert!(surface.ops.contains(&Op::LineCap("round".into())));
    // Width 4 at pressure 0.5 and zoom 2.
    assert!(surface.ops.contains(&Op::LineWidth(4.0)));
    assert!(surface.ops.contains(&Op::QuadTo(0.0, 0.0, 10.0, 0.0)));
    assert!(surface.ops.contains(&Op::LineTo(20.0, 0.0)));
    assert_eq!(surface.ops.last(), Some(&Op::Restore));
}

#[test]
fn degenerate_stroke_draws_nothing() {
    let mut surface = RecordingSurface::default();
    draw_stroke(&mut surface, &stroke_of(vec![sp(0.0, 0.0, 1.0)]), &Viewport::default()).unwrap();
    assert!(surface.ops.is_empty());
}

#[test]
fn draft_tail_draws_only_latest_curve() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.begin(pt(0.0, 0.0), None, &vp);
    r.extend(pt(10.0, 0.0), None, &vp);
    r.extend(pt(10.0, 10.0), None, &vp);

    let mut surface = RecordingSurface::default();
    r.render_draft_tail(&mut surface, &vp).unwrap();
    let quads: Vec<&Op> = surface.ops.iter().filter(|op| matches!(op, Op::QuadTo(..))).collect();
    assert_eq!(quads, vec![&Op::QuadTo(10.0, 0.0, 10.0, 5.0)]);
    assert_eq!(surface.count(|op| matches!(op, Op::LineTo(..))), 0);
}

#[test]
fn draft_tail_with_single_sample_draws_nothing() {
    let vp = Viewport::default();
    let mut r = StrokeRenderer::new();
    r.begin(pt(0.0, 0.0), None, &vp);
    let mut surface = RecordingSurface::default();
    r.render_draft_tail(&mut surface, &vp).unwrap();
    assert!(surface.ops.is_empty());
}

#[test]
fn committed_render_covers_every_stroke() {
    let mut r = StrokeRenderer::new();
    r.load(vec![
        stroke_of(vec![sp(0.0, 0.0, 1.0), sp(1.0, 1.0, 1.0)]),
        stroke_of(vec![sp(5.0, 5.0, 1.0), sp(6.0, 6.0, 1.0)]),
    ]);
    let mut surface = RecordingSurface::default();
    r.render_committed(&mut surface, &Viewport::default()).unwrap();
    assert_eq!(surface.count(|op| *op == Op::Save), 2);
}
