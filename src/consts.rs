//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// Zoom increment used by the zoom-in / zoom-out controls.
pub const ZOOM_STEP: f64 = 0.1;

// ── Blocks ──────────────────────────────────────────────────────

/// Minimum block width and height in canvas units.
pub const MIN_BLOCK_SIZE: f64 = 100.0;

/// Screen position at which newly added blocks appear, at any pan and zoom.
pub const DEFAULT_BLOCK_ORIGIN: f64 = 100.0;

/// Default text block size.
pub const TEXT_BLOCK_SIZE: (f64, f64) = (300.0, 150.0);

/// Default table block size.
pub const TABLE_BLOCK_SIZE: (f64, f64) = (400.0, 200.0);

/// Default size for image and generic blocks.
pub const OTHER_BLOCK_SIZE: (f64, f64) = (200.0, 150.0);

/// Rows and columns of a freshly added table block.
pub const DEFAULT_TABLE_DIMENSIONS: (u32, u32) = (3, 3);

// ── Canvas extent ───────────────────────────────────────────────

/// Initial logical canvas width.
pub const INITIAL_CANVAS_WIDTH: f64 = 2000.0;

/// Initial logical canvas height.
pub const INITIAL_CANVAS_HEIGHT: f64 = 2000.0;

/// Space kept beyond the farthest block edge or stroke point.
pub const CANVAS_MARGIN: f64 = 500.0;

// ── Grid ────────────────────────────────────────────────────────

/// Grid line spacing in canvas units.
pub const GRID_SPACING: f64 = 20.0;

/// The grid is skipped when its on-screen spacing drops below this many pixels.
pub const GRID_MIN_SCREEN_SPACING: f64 = 4.0;

// ── Brush ───────────────────────────────────────────────────────

/// Thinnest brush, in canvas units.
pub const BRUSH_MIN_WIDTH: f64 = 0.5;

/// Thickest brush, in canvas units.
pub const BRUSH_MAX_WIDTH: f64 = 50.0;

/// Pressure assigned to samples from devices that do not report it.
pub const DEFAULT_PRESSURE: f64 = 1.0;
