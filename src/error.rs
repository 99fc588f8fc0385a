//! Error types surfaced by the canvas engine.
//!
//! Most malformed input is absorbed rather than reported (missing block ids,
//! degenerate strokes, out-of-range zoom). The errors here cover the three
//! boundaries where something outside the engine can fail: the persistence
//! collaborator, the drawing surface, and host-supplied configuration.

/// Failure reported by, or while preparing content for, the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save rejected: {0}")]
    Rejected(String),
    #[error("content serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of a drawing-surface call.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("canvas call failed: {0}")]
    Js(String),
    #[error("2d rendering context unavailable")]
    ContextUnavailable,
    #[error("host window unavailable")]
    WindowUnavailable,
}

impl From<wasm_bindgen::JsValue> for RenderError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

/// Invalid input-mode configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
