//! Drag and resize: turning a pointer sequence into block geometry updates.
//!
//! Both gestures measure the cumulative pointer displacement from the press,
//! converted to canvas units, and apply it to the geometry captured at the
//! start of the gesture. Nothing here touches the block store; the controller
//! applies the returned [`Mutation`]s.
//!
//! Resizing from a west or north handle moves the block's origin. When the
//! minimum size clamp engages on an axis, the origin on that axis is pinned so
//! the opposite edge stays where it was instead of sliding.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId, Rect};
use crate::consts::MIN_BLOCK_SIZE;
use crate::viewport::{Point, Viewport};

/// One of the four corner handles of the selected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl ResizeHandle {
    pub const ALL: [Self; 4] = [Self::Nw, Self::Ne, Self::Sw, Self::Se];

    /// Canvas-space position of this handle on `rect`.
    #[must_use]
    pub fn position(self, rect: &Rect) -> Point {
        match self {
            Self::Nw => Point::new(rect.x, rect.y),
            Self::Ne => Point::new(rect.right(), rect.y),
            Self::Sw => Point::new(rect.x, rect.bottom()),
            Self::Se => Point::new(rect.right(), rect.bottom()),
        }
    }

    /// CSS cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Nw | Self::Se => "nwse-resize",
            Self::Ne | Self::Sw => "nesw-resize",
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }
}

/// Compute the rectangle produced by dragging `handle` of `orig` by `(dx, dy)` canvas units.
///
/// Width and height never drop below `min_size`.
#[must_use]
pub fn resize_rect(orig: Rect, handle: ResizeHandle, dx: f64, dy: f64, min_size: f64) -> Rect {
    let (width, x) = if handle.moves_left_edge() {
        let width = (orig.width - dx).max(min_size);
        (width, orig.right() - width)
    } else {
        ((orig.width + dx).max(min_size), orig.x)
    };
    let (height, y) = if handle.moves_top_edge() {
        let height = (orig.height - dy).max(min_size);
        (height, orig.bottom() - height)
    } else {
        ((orig.height + dy).max(min_size), orig.y)
    };
    Rect { x, y, width, height }
}

/// A geometry change for the controller to apply to the block store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    Move { id: BlockId, x: f64, y: f64 },
    Resize { id: BlockId, rect: Rect },
}

/// The drag/resize state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        id: BlockId,
        start_screen: Point,
        /// Block origin at the press.
        orig: Point,
        /// The pointer has left the drag threshold; position updates are live.
        moved: bool,
    },
    Resizing {
        id: BlockId,
        handle: ResizeHandle,
        start_screen: Point,
        /// Block geometry at the press.
        orig: Rect,
        /// Geometry last reported, used to suppress no-op updates.
        current: Rect,
    },
}

pub struct DragResizeController {
    state: DragState,
    drag_threshold: f64,
    min_size: f64,
}

impl DragResizeController {
    /// `drag_threshold` is in screen pixels.
    #[must_use]
    pub fn new(drag_threshold: f64) -> Self {
        Self { state: DragState::Idle, drag_threshold, min_size: MIN_BLOCK_SIZE }
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// Whether a manipulation is visibly under way: a drag past its threshold, or any resize.
    #[must_use]
    pub fn is_manipulating(&self) -> bool {
        match self.state {
            DragState::Idle => false,
            DragState::Dragging { moved, .. } => moved,
            DragState::Resizing { .. } => true,
        }
    }

    /// Id of the block under drag or resize.
    #[must_use]
    pub fn active_block(&self) -> Option<BlockId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { id, .. } | DragState::Resizing { id, .. } => Some(id),
        }
    }

    /// Start dragging `block` from screen point `screen`. Ignored unless idle.
    pub fn begin_drag(&mut self, block: &Block, screen: Point) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = DragState::Dragging {
            id: block.id,
            start_screen: screen,
            orig: Point::new(block.rect.x, block.rect.y),
            moved: false,
        };
        true
    }

    /// Start resizing `block` by `handle`. Refused unless idle and `block` is the selected block.
    pub fn begin_resize(
        &mut self,
        block: &Block,
        handle: ResizeHandle,
        screen: Point,
        selected: Option<BlockId>,
    ) -> bool {
        if !self.is_idle() || selected != Some(block.id) {
            return false;
        }
        self.state = DragState::Resizing {
            id: block.id,
            handle,
            start_screen: screen,
            orig: block.rect,
            current: block.rect,
        };
        true
    }

    /// Feed the current pointer position. Returns the geometry change, if any.
    pub fn update(&mut self, screen: Point, viewport: &Viewport) -> Option<Mutation> {
        let drag_threshold = self.drag_threshold;
        let min_size = self.min_size;
        match &mut self.state {
            DragState::Idle => None,
            DragState::Dragging { id, start_screen, orig, moved } => {
                if !*moved {
                    if start_screen.distance(screen) <= drag_threshold {
                        return None;
                    }
                    *moved = true;
                }
                let dx = viewport.screen_dist_to_canvas(screen.x - start_screen.x);
                let dy = viewport.screen_dist_to_canvas(screen.y - start_screen.y);
                Some(Mutation::Move { id: *id, x: orig.x + dx, y: orig.y + dy })
            }
            DragState::Resizing { id, handle, start_screen, orig, current } => {
                let dx = viewport.screen_dist_to_canvas(screen.x - start_screen.x);
                let dy = viewport.screen_dist_to_canvas(screen.y - start_screen.y);
                let next = resize_rect(*orig, *handle, dx, dy, min_size);
                if next == *current {
                    return None;
                }
                *current = next;
                Some(Mutation::Resize { id: *id, rect: next })
            }
        }
    }

    /// Finish the gesture. Returns the state that was active.
    pub fn end(&mut self) -> DragState {
        std::mem::take(&mut self.state)
    }

    /// Abandon the gesture. Updates already applied stay applied.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            tracing::debug!(block = ?self.active_block(), "drag/resize cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Change the drag threshold (e.g. when switching between mouse and touch).
    pub fn set_drag_threshold(&mut self, threshold: f64) {
        self.drag_threshold = threshold;
    }
}
