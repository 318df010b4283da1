//! Benchmark configuration
//!
//! Defaults reproduce the demo: one 38-character line at 18px, drawn 1000
//! times onto a 300x100 surface, with the low-level font scaled to 512 units.

use crate::error::{BenchError, Result};

/// The line every benchmark draws unless told otherwise
pub const SAMPLE_TEXT: &str = "This is a sample line of text to draw.";

/// Family looked up when no font file is given
pub const DEFAULT_FAMILY: &str = "Arial";

/// Everything a benchmark session needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub iterations: u32,
    pub text: String,
    /// Text size in pixels
    pub font_size: f32,
    /// Units per em the low-level shaping font is scaled to
    pub buffer_scale: u16,
    pub surface_width: u32,
    pub surface_height: u32,
    /// Clear the surface before every iteration
    pub clear: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            text: SAMPLE_TEXT.to_string(),
            font_size: 18.0,
            buffer_scale: 512,
            surface_width: 300,
            surface_height: 100,
            clear: false,
        }
    }
}

impl BenchConfig {
    /// Reject values no backend can work with
    ///
    /// Zero iterations is allowed and measures nothing but the timer.
    pub fn validate(&self) -> Result<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(BenchError::Config(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if self.buffer_scale == 0 {
            return Err(BenchError::Config("buffer scale must be non-zero".into()));
        }
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(BenchError::Config(format!(
                "surface must not be empty, got {}x{}",
                self.surface_width, self.surface_height
            )));
        }
        Ok(())
    }
}
