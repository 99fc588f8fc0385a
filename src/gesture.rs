//! Touch gesture recognition: tap, double-tap, long-press, swipe and pinch.
//!
//! The recognizer tracks one primary contact through
//! `Idle → Touching → (released | long-pressed) → Idle`, and independently a
//! two-contact pinch driven purely by the distance between the two contacts.
//! It never claims input: the controller still routes the same touches to
//! drag/resize/draw handling and decides whether the classified gestures
//! matter.
//!
//! Time is supplied by the caller in milliseconds. Recognition that depends on
//! time passing without input (long-press expiry, releasing a single tap once
//! the double-tap window has closed) happens in [`GestureRecognizer::tick`]
//! as well as on the next touch event.
//!
//! A single tap is reported only after the double-tap window closes, so a
//! double-tap consumes both taps.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use serde::{Deserialize, Serialize};

use crate::viewport::Point;

/// Recognition thresholds. Distances are screen pixels, times milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub min_swipe_distance: f64,
    pub max_swipe_time_ms: f64,
    pub long_press_delay_ms: f64,
    pub double_tap_delay_ms: f64,
    pub double_tap_slop: f64,
    /// Movement that cancels tap and long-press classification.
    pub drag_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_swipe_distance: 50.0,
            max_swipe_time_ms: 300.0,
            long_press_delay_ms: 500.0,
            double_tap_delay_ms: 300.0,
            double_tap_slop: 30.0,
            drag_threshold: 10.0,
        }
    }
}

/// One active touch contact in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Platform contact identifier, stable for the life of the contact.
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    #[must_use]
    pub fn new(id: i64, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Bucket a screen-space displacement (y grows downward) into a direction.
    ///
    /// Exact diagonals resolve to the horizontal direction.
    #[must_use]
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        let angle = dy.atan2(dx).to_degrees();
        if (-45.0..=45.0).contains(&angle) {
            Self::Right
        } else if angle >= 135.0 || angle <= -135.0 {
            Self::Left
        } else if angle > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// A classified gesture. Positions are screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Tap { at: Point },
    DoubleTap { at: Point },
    LongPress { at: Point },
    Swipe { direction: SwipeDirection, from: Point, distance: f64 },
    PinchStart { center: Point },
    PinchChange { scale: f64, center: Point },
    PinchEnd { scale: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Contact {
    Idle,
    Touching {
        id: i64,
        start: Point,
        start_ms: f64,
        last: Point,
        /// Movement passed the drag threshold; long-press and tap are off the table.
        moved: bool,
    },
    /// Classified already (long-press) or overtaken by a pinch; ignored until all contacts lift.
    Consumed,
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    at: Point,
    released_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    a: i64,
    b: i64,
    start_distance: f64,
    scale: f64,
}

pub struct GestureRecognizer {
    config: GestureConfig,
    contact: Contact,
    pending_tap: Option<PendingTap>,
    pinch: Option<Pinch>,
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self { config, contact: Contact::Idle, pending_tap: None, pinch: None }
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether two contacts are currently being tracked as a pinch.
    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Current pinch scale relative to the start of the pinch.
    #[must_use]
    pub fn pinch_scale(&self) -> Option<f64> {
        self.pinch.map(|p| p.scale)
    }

    /// A contact went down. `touches` lists every contact now on the surface.
    pub fn touch_start(&mut self, touches: &[TouchPoint], now_ms: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        self.flush_expired_tap(now_ms, &mut events);

        if touches.len() >= 2 {
            if self.pinch.is_none() {
                let (a, b) = (touches[0], touches[1]);
                let start_distance = a.point().distance(b.point());
                self.pinch = Some(Pinch { a: a.id, b: b.id, start_distance, scale: 1.0 });
                self.contact = Contact::Consumed;
                tracing::trace!(start_distance, "pinch start");
                events.push(GestureEvent::PinchStart { center: a.point().midpoint(b.point()) });
            }
            return events;
        }

        if let (Contact::Idle, Some(t)) = (self.contact, touches.first()) {
            self.contact =
                Contact::Touching { id: t.id, start: t.point(), start_ms: now_ms, last: t.point(), moved: false };
        }
        events
    }

    /// Contacts moved. `touches` lists every contact now on the surface.
    pub fn touch_move(&mut self, touches: &[TouchPoint], now_ms: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        self.flush_expired_tap(now_ms, &mut events);

        if let Some(pinch) = self.pinch.as_mut() {
            let a = touches.iter().find(|t| t.id == pinch.a);
            let b = touches.iter().find(|t| t.id == pinch.b);
            if let (Some(a), Some(b)) = (a, b) {
                if pinch.start_distance > 0.0 {
                    pinch.scale = a.point().distance(b.point()) / pinch.start_distance;
                }
                events.push(GestureEvent::PinchChange { scale: pinch.scale, center: a.point().midpoint(b.point()) });
            }
            return events;
        }

        let drag_threshold = self.config.drag_threshold;
        if let Contact::Touching { id, start, last, moved, .. } = &mut self.contact {
            if let Some(t) = touches.iter().find(|t| t.id == *id) {
                *last = t.point();
                // Movement is checked before the timer so a drag always wins over a long-press.
                if start.distance(*last) > drag_threshold {
                    *moved = true;
                }
            }
        }
        self.fire_long_press_if_due(now_ms, &mut events);
        events
    }

    /// Contacts lifted. `remaining` lists the contacts still on the surface.
    pub fn touch_end(&mut self, remaining: &[TouchPoint], now_ms: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        self.flush_expired_tap(now_ms, &mut events);

        if let Some(pinch) = self.pinch {
            let a_left = remaining.iter().any(|t| t.id == pinch.a);
            let b_left = remaining.iter().any(|t| t.id == pinch.b);
            if !(a_left && b_left) {
                self.pinch = None;
                tracing::trace!(scale = pinch.scale, "pinch end");
                events.push(GestureEvent::PinchEnd { scale: pinch.scale });
            }
        }

        let contact = self.contact;
        match contact {
            Contact::Touching { id, .. } if !remaining.iter().any(|t| t.id == id) => {
                self.fire_long_press_if_due(now_ms, &mut events);
                if let Contact::Touching { start, start_ms, last, moved, .. } = self.contact {
                    events.extend(self.classify_release(start, start_ms, last, moved, now_ms));
                }
                self.contact = Contact::Idle;
            }
            Contact::Consumed if remaining.is_empty() => self.contact = Contact::Idle,
            _ => {}
        }
        if remaining.is_empty() {
            self.contact = Contact::Idle;
        }
        events
    }

    /// The platform cancelled the touch sequence. Nothing in flight is classified.
    pub fn touch_cancel(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if let Some(pinch) = self.pinch.take() {
            events.push(GestureEvent::PinchEnd { scale: pinch.scale });
        }
        self.contact = Contact::Idle;
        self.pending_tap = None;
        events
    }

    /// Advance time with no input: fires due long-presses and releases single taps
    /// whose double-tap window has closed.
    pub fn tick(&mut self, now_ms: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        self.flush_expired_tap(now_ms, &mut events);
        self.fire_long_press_if_due(now_ms, &mut events);
        events
    }

    fn fire_long_press_if_due(&mut self, now_ms: f64, events: &mut Vec<GestureEvent>) {
        if let Contact::Touching { start, start_ms, moved: false, .. } = self.contact {
            if now_ms - start_ms >= self.config.long_press_delay_ms {
                tracing::trace!("long press");
                self.contact = Contact::Consumed;
                events.push(GestureEvent::LongPress { at: start });
            }
        }
    }

    fn flush_expired_tap(&mut self, now_ms: f64, events: &mut Vec<GestureEvent>) {
        if let Some(tap) = self.pending_tap {
            if now_ms - tap.released_ms > self.config.double_tap_delay_ms {
                self.pending_tap = None;
                events.push(GestureEvent::Tap { at: tap.at });
            }
        }
    }

    /// Classify a released primary contact. A plain tap is parked in
    /// `pending_tap`; the returned event is a swipe, a double-tap, or an
    /// earlier tap displaced by this one.
    fn classify_release(
        &mut self,
        start: Point,
        start_ms: f64,
        last: Point,
        moved: bool,
        now_ms: f64,
    ) -> Option<GestureEvent> {
        let (dx, dy) = (last.x - start.x, last.y - start.y);
        let distance = dx.hypot(dy);
        let elapsed = now_ms - start_ms;

        if distance >= self.config.min_swipe_distance {
            if elapsed > self.config.max_swipe_time_ms {
                return None;
            }
            let direction = SwipeDirection::from_delta(dx, dy);
            tracing::trace!(?direction, distance, elapsed, "swipe");
            return Some(GestureEvent::Swipe { direction, from: start, distance });
        }
        if moved {
            return None;
        }

        let parked = PendingTap { at: start, released_ms: now_ms };
        match self.pending_tap.replace(parked) {
            Some(prev) if prev.at.distance(start) <= self.config.double_tap_slop => {
                self.pending_tap = None;
                tracing::trace!("double tap");
                Some(GestureEvent::DoubleTap { at: start })
            }
            Some(prev) => Some(GestureEvent::Tap { at: prev.at }),
            None => None,
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
