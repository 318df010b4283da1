//! Error types for glyphbench

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for glyphbench
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Shaping failed: {0}")]
    ShapingFailed(#[from] ShapingError),

    #[error("Rendering failed: {0}")]
    RenderingFailed(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data")]
    InvalidData,

    #[error("System font not found: {0}")]
    SystemFontNotFound(String),
}

/// Shaping errors
#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("Invalid font data for shaping")]
    InvalidFont,

    #[error("Shaping buffer unavailable")]
    BufferUnavailable,

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid font data")]
    InvalidFont,

    #[error("Glyph not found: {0}")]
    GlyphNotFound(u32),

    #[error("Outline extraction failed")]
    OutlineExtractionFailed,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
