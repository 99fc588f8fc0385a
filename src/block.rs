//! Content blocks and the ordered store that owns them.
//!
//! A [`Block`] is a positioned, typed container on the canvas. Its payload is
//! a [`BlockContent`] tagged union, so the block kind is fixed by the variant
//! and can never drift from the content. [`BlockStore`] keeps blocks in
//! insertion order and grows the logical [`CanvasBounds`] after every mutation
//! that can push content outward.

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    CANVAS_MARGIN, DEFAULT_TABLE_DIMENSIONS, INITIAL_CANVAS_HEIGHT, INITIAL_CANVAS_WIDTH,
    MIN_BLOCK_SIZE, OTHER_BLOCK_SIZE, TABLE_BLOCK_SIZE, TEXT_BLOCK_SIZE,
};
use crate::viewport::Point;

/// Unique identifier for a block.
pub type BlockId = Uuid;

/// The kind of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
    Table,
    Generic,
}

impl BlockKind {
    /// Size given to a newly added block of this kind.
    #[must_use]
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::Text => TEXT_BLOCK_SIZE,
            Self::Table => TABLE_BLOCK_SIZE,
            Self::Image | Self::Generic => OTHER_BLOCK_SIZE,
        }
    }

    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Table => "table",
            Self::Generic => "generic",
        }
    }
}

/// Kind-specific block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockContent {
    /// Free text.
    Text { text: String },
    /// Reference to an image (URL or host-resolved key).
    Image { src: String },
    /// Table dimensions; cell data lives with the host.
    Table { rows: u32, cols: u32 },
    /// Opaque host-defined payload.
    Generic { data: serde_json::Value },
}

impl BlockContent {
    /// Empty payload for a freshly added block of `kind`.
    #[must_use]
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Text => Self::Text { text: String::new() },
            BlockKind::Image => Self::Image { src: String::new() },
            BlockKind::Table => {
                let (rows, cols) = DEFAULT_TABLE_DIMENSIONS;
                Self::Table { rows, cols }
            }
            BlockKind::Generic => Self::Generic { data: serde_json::Value::Null },
        }
    }

    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Image { .. } => BlockKind::Image,
            Self::Table { .. } => BlockKind::Table,
            Self::Generic { .. } => BlockKind::Generic,
        }
    }
}

/// Axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// A positioned piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique identifier, fixed at creation.
    pub id: BlockId,
    /// Position and size in canvas space.
    #[serde(flatten)]
    pub rect: Rect,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    /// Kind-tagged payload.
    pub content: BlockContent,
}

impl Block {
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }
}

/// Logical canvas extent. Grows to fit content, never shrinks on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self { width: INITIAL_CANVAS_WIDTH, height: INITIAL_CANVAS_HEIGHT }
    }
}

impl CanvasBounds {
    /// Grow so that `(x, y)` plus the margin fits. Returns whether anything changed.
    pub fn include(&mut self, x: f64, y: f64) -> bool {
        let mut grew = false;
        if x.is_finite() && x + CANVAS_MARGIN > self.width {
            self.width = x + CANVAS_MARGIN;
            grew = true;
        }
        if y.is_finite() && y + CANVAS_MARGIN > self.height {
            self.height = y + CANVAS_MARGIN;
            grew = true;
        }
        grew
    }

    /// Grow to fit the far corner of `rect`.
    pub fn include_rect(&mut self, rect: &Rect) -> bool {
        self.include(rect.right(), rect.bottom())
    }
}

/// Ordered store of blocks.
///
/// Mutations addressed to an unknown id are silent no-ops that return `false`.
pub struct BlockStore {
    blocks: Vec<Block>,
    bounds: CanvasBounds,
}

impl BlockStore {
    /// Create an empty store with the initial canvas extent.
    #[must_use]
    pub fn new() -> Self {
        Self { blocks: Vec::new(), bounds: CanvasBounds::default() }
    }

    /// Add a block of `kind` with its top-left corner at `origin` (canvas space),
    /// the kind's default size and `z_index` equal to the current block count.
    pub fn add(&mut self, kind: BlockKind, origin: Point) -> Block {
        let (width, height) = kind.default_size();
        #[allow(clippy::cast_possible_wrap)]
        let z_index = self.blocks.len() as i64;
        let block = Block {
            id: Uuid::new_v4(),
            rect: Rect::new(origin.x, origin.y, width, height),
            z_index,
            content: BlockContent::empty(kind),
        };
        self.bounds.include_rect(&block.rect);
        self.blocks.push(block.clone());
        block
    }

    /// Insert an existing block, replacing any block with the same id in place.
    ///
    /// Sizes below the minimum are raised to it.
    pub fn insert(&mut self, mut block: Block) {
        block.rect.width = block.rect.width.max(MIN_BLOCK_SIZE);
        block.rect.height = block.rect.height.max(MIN_BLOCK_SIZE);
        self.bounds.include_rect(&block.rect);
        if let Some(existing) = self.blocks.iter_mut().find(|b| b.id == block.id) {
            *existing = block;
        } else {
            self.blocks.push(block);
        }
    }

    /// Replace all blocks with `blocks`. Bounds keep whatever they have grown to.
    pub fn load(&mut self, blocks: Vec<Block>) {
        self.blocks.clear();
        for block in blocks {
            self.insert(block);
        }
    }

    /// Move a block's top-left corner to `(x, y)`.
    pub fn move_to(&mut self, id: &BlockId, x: f64, y: f64) -> bool {
        let Some(block) = self.get_mut(id) else {
            return false;
        };
        block.rect.x = x;
        block.rect.y = y;
        let rect = block.rect;
        self.bounds.include_rect(&rect);
        true
    }

    /// Resize a block, raising each dimension to at least the minimum size.
    pub fn resize(&mut self, id: &BlockId, width: f64, height: f64) -> bool {
        let Some(block) = self.get_mut(id) else {
            return false;
        };
        block.rect.width = width.max(MIN_BLOCK_SIZE);
        block.rect.height = height.max(MIN_BLOCK_SIZE);
        let rect = block.rect;
        self.bounds.include_rect(&rect);
        true
    }

    /// Replace position and size together.
    pub fn set_rect(&mut self, id: &BlockId, rect: Rect) -> bool {
        self.move_to(id, rect.x, rect.y) && self.resize(id, rect.width, rect.height)
    }

    /// Replace a block's payload. Content of a different kind is refused.
    pub fn update(&mut self, id: &BlockId, content: BlockContent) -> bool {
        let Some(block) = self.get_mut(id) else {
            return false;
        };
        if block.kind() != content.kind() {
            tracing::debug!(%id, from = block.kind().as_str(), to = content.kind().as_str(), "block kind change refused");
            return false;
        }
        block.content = content;
        true
    }

    /// Remove a block, returning it if it was present. Bounds do not shrink.
    pub fn remove(&mut self, id: &BlockId) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| &b.id == id)?;
        Some(self.blocks.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| &b.id == id)
    }

    /// All blocks in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks sorted by `z_index` for draw order; ties keep insertion order.
    #[must_use]
    pub fn sorted_by_z(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.z_index);
        blocks
    }

    /// Grow the canvas bounds to include a canvas-space point.
    pub fn include_point(&mut self, p: Point) -> bool {
        self.bounds.include(p.x, p.y)
    }

    #[must_use]
    pub fn bounds(&self) -> CanvasBounds {
        self.bounds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}
