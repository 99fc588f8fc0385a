//! Interaction engine for an infinite, zoomable freeform canvas.
//!
//! The canvas holds positioned content blocks (text, image, table, generic)
//! plus freehand ink strokes. This crate owns the full interaction lifecycle:
//! translating raw mouse and touch input into block and stroke mutations,
//! recognizing touch gestures, maintaining the pan/zoom viewport, and drawing
//! the scene to a 2D surface. Persistence is the host's concern: the engine is
//! seeded with a [`engine::CanvasContent`] snapshot and hands mutated content
//! back through [`engine::Action`]s and the [`engine::ContentSink`] callback.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Composition root [`engine::CanvasController`] and the browser-bound [`engine::Engine`] |
//! | [`block`] | Content blocks and the ordered [`block::BlockStore`] |
//! | [`stroke`] | Ink capture, smoothing and rendering |
//! | [`drag`] | Drag and four-handle resize state machine |
//! | [`gesture`] | Tap, double-tap, long-press, swipe and pinch recognition |
//! | [`viewport`] | Pan/zoom transform and coordinate conversions |
//! | [`hit`] | Hit-testing blocks and resize handles |
//! | [`input`] | Input event vocabulary and interaction modes |
//! | [`config`] | Mouse/touch input tuning ([`config::InputModeConfig`]) |
//! | [`render`] | The [`render::Surface`] drawing seam and scene rendering |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod block;
pub mod config;
pub mod consts;
pub mod drag;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod hit;
pub mod input;
pub mod render;
pub mod stroke;
pub mod viewport;
