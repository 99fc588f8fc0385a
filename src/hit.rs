#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::block::{BlockId, BlockStore};
use crate::drag::ResizeHandle;
use crate::viewport::{Point, Viewport};

/// Which part of a block was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeHandle),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub block_id: BlockId,
    pub part: HitPart,
}

/// Test which block (if any) is under `canvas_pt`, checking the selected block's handles first.
///
/// `hitbox_size` is the half-size of a handle's hit square in screen pixels, so
/// handles stay equally easy to grab at every zoom. Bodies are tested topmost first.
#[must_use]
pub fn hit_test(
    canvas_pt: Point,
    blocks: &BlockStore,
    viewport: &Viewport,
    selected: Option<BlockId>,
    hitbox_size: f64,
) -> Option<Hit> {
    if let Some(block) = selected.and_then(|id| blocks.get(&id)) {
        let reach = viewport.screen_dist_to_canvas(hitbox_size);
        for handle in ResizeHandle::ALL {
            let c = handle.position(&block.rect);
            if (canvas_pt.x - c.x).abs() <= reach && (canvas_pt.y - c.y).abs() <= reach {
                return Some(Hit { block_id: block.id, part: HitPart::ResizeHandle(handle) });
            }
        }
    }

    blocks
        .sorted_by_z()
        .into_iter()
        .rev()
        .find(|b| b.rect.contains(canvas_pt))
        .map(|b| Hit { block_id: b.id, part: HitPart::Body })
}
