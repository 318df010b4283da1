//! Glyphbench Core: three ways to put one line of text on a canvas
//!
//! This crate holds everything the benchmarks share: the data that flows from a
//! shaper to a canvas, the traits backends implement, and the timing harness
//! that drives them.
//!
//! ## The Three Paths
//!
//! 1. **Direct** - hand the string to the canvas and let it lay the glyphs out
//! 2. **Shaper** - shape through a high-level wrapper, copy glyphs and points
//!    into a positioned [`GlyphRun`], draw the run
//! 3. **Buffer** - drive a reusable low-level shaping buffer, convert design
//!    units to pixels with a running cursor, draw the run (or each glyph)
//!
//! ## Running One
//!
//! ```rust,no_run
//! use glyphbench_core::{bench::Benchmark, BenchConfig};
//! # use glyphbench_core::traits::*;
//! # fn parts() -> (std::sync::Arc<dyn FontRef>, Box<dyn Canvas>) { unimplemented!() }
//! let (font, mut canvas) = parts();
//! let bench = Benchmark::new(BenchConfig::default(), font)?;
//! let report = bench.run_direct(canvas.as_mut())?;
//! println!("{report}");
//! # Ok::<(), glyphbench_core::BenchError>(())
//! ```

pub mod bench;
pub mod config;
pub mod error;
pub mod run;
pub mod traits;
pub mod units;

pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use run::{CursorMode, GlyphRun, RawGlyph};
pub use traits::{BufferShaper, Canvas, FontRef, Shaper};
pub use units::UnitScale;

/// The data structures that flow between shapers and canvases
pub mod types {
    /// Unique identifier for a glyph within a font
    pub type GlyphId = u32;

    /// Which way the text flows
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        LeftToRight,
        RightToLeft,
        TopToBottom,
        BottomToTop,
    }

    /// A glyph that knows exactly where it belongs
    #[derive(Debug, Clone, PartialEq)]
    pub struct PositionedGlyph {
        pub id: GlyphId,
        pub x: f32,
        pub y: f32,
        pub advance: f32,
        pub cluster: u32,
    }

    /// What emerges after shaping: glyphs positioned in pixels
    #[derive(Debug, Clone, PartialEq)]
    pub struct ShapingResult {
        pub glyphs: Vec<PositionedGlyph>,
        pub advance_width: f32,
        pub advance_height: f32,
        pub direction: Direction,
    }

    impl ShapingResult {
        /// A result with no glyphs
        pub fn empty(size: f32, direction: Direction) -> Self {
            Self {
                glyphs: Vec::new(),
                advance_width: 0.0,
                advance_height: size,
                direction,
            }
        }
    }

    /// A point on the canvas, y grows downwards
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Point {
        pub x: f32,
        pub y: f32,
    }

    impl Point {
        pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

        pub const fn new(x: f32, y: f32) -> Self {
            Self { x, y }
        }
    }
}

/// How shaping should behave
#[derive(Debug, Clone)]
pub struct ShapingParams {
    pub size: f32,
    pub direction: types::Direction,
    pub language: Option<String>,
    pub script: Option<String>,
    pub features: Vec<(String, u32)>,
}

impl Default for ShapingParams {
    fn default() -> Self {
        Self {
            size: 16.0,
            direction: types::Direction::LeftToRight,
            language: None,
            script: None,
            features: Vec::new(),
        }
    }
}

/// Simple RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::rgba(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::rgba(255, 255, 255, 255)
    }

    pub const fn blue() -> Self {
        Self::rgba(0, 0, 255, 255)
    }
}

/// How glyphs get filled
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Text size in pixels
    pub size: f32,
    /// Horizontal text scale, 1.0 leaves glyphs untouched
    pub scale_x: f32,
    pub antialias: bool,
}

impl Paint {
    pub fn with_size(size: f32) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::black(),
            size: 18.0,
            scale_x: 1.0,
            antialias: true,
        }
    }
}
