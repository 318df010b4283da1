//! Glyph runs: what a canvas draws in a single call
//!
//! A run pairs glyph ids with positions. It comes in two layouts: fully
//! positioned, with an `(x, y)` for every glyph, and horizontal, with an `x`
//! per glyph sharing one baseline `y`. Either way there is exactly one
//! position slot per glyph slot.

use crate::{
    types::{GlyphId, Point, ShapingResult},
    units::UnitScale,
};

/// Where each glyph of a run sits
#[derive(Debug, Clone, PartialEq)]
pub enum RunPositions {
    Positioned(Vec<Point>),
    Horizontal { xs: Vec<f32>, y: f32 },
}

/// Glyph ids plus one position per glyph
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    glyphs: Vec<GlyphId>,
    positions: RunPositions,
}

impl GlyphRun {
    /// A zeroed run with `len` glyph and point slots
    pub fn positioned(len: usize) -> Self {
        Self {
            glyphs: vec![0; len],
            positions: RunPositions::Positioned(vec![Point::ZERO; len]),
        }
    }

    /// A zeroed run with `len` glyph and x slots on baseline `y`
    pub fn horizontal(len: usize, y: f32) -> Self {
        Self {
            glyphs: vec![0; len],
            positions: RunPositions::Horizontal {
                xs: vec![0.0; len],
                y,
            },
        }
    }

    /// Copy glyph ids and positions out of a shaping result unchanged
    pub fn from_shaping(shaped: &ShapingResult) -> Self {
        let mut run = Self::positioned(shaped.glyphs.len());
        for (i, glyph) in shaped.glyphs.iter().enumerate() {
            run.set(i, glyph.id, Point::new(glyph.x, glyph.y));
        }
        run
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[GlyphId] {
        &self.glyphs
    }

    pub fn positions(&self) -> &RunPositions {
        &self.positions
    }

    /// Number of position slots, always equal to [`Self::len`]
    pub fn position_count(&self) -> usize {
        match &self.positions {
            RunPositions::Positioned(points) => points.len(),
            RunPositions::Horizontal { xs, .. } => xs.len(),
        }
    }

    /// Position of glyph `index`
    ///
    /// Panics if `index` is out of bounds.
    pub fn point(&self, index: usize) -> Point {
        match &self.positions {
            RunPositions::Positioned(points) => points[index],
            RunPositions::Horizontal { xs, y } => Point::new(xs[index], *y),
        }
    }

    /// Fill slot `index`. A horizontal run keeps its shared baseline and only
    /// takes `at.x`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, glyph: GlyphId, at: Point) {
        self.glyphs[index] = glyph;
        match &mut self.positions {
            RunPositions::Positioned(points) => points[index] = at,
            RunPositions::Horizontal { xs, .. } => xs[index] = at.x,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphId, Point)> + '_ {
        self.glyphs
            .iter()
            .enumerate()
            .map(move |(i, &glyph)| (glyph, self.point(i)))
    }
}

/// One glyph straight out of a shaping buffer, in design units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawGlyph {
    pub id: GlyphId,
    pub cluster: u32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Which cursor axes [`assemble_raw`] tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// x only, building a horizontal run on baseline 0
    Horizontal,
    /// x and y, building a positioned run
    Both,
}

/// Walk raw shaping output with a cursor starting at zero
///
/// Each glyph lands at `cursor + offset`, then the cursor moves by the glyph's
/// advance. Design units are converted through `scale`. Font y grows upwards
/// and canvas y grows downwards, so vertical offsets and advances flip sign.
pub fn assemble_raw(glyphs: &[RawGlyph], scale: UnitScale, mode: CursorMode) -> GlyphRun {
    let mut run = match mode {
        CursorMode::Horizontal => GlyphRun::horizontal(glyphs.len(), 0.0),
        CursorMode::Both => GlyphRun::positioned(glyphs.len()),
    };

    let mut x = 0.0f32;
    let mut y = 0.0f32;

    for (i, glyph) in glyphs.iter().enumerate() {
        let at = match mode {
            CursorMode::Horizontal => Point::new(x + scale.to_device_x(glyph.x_offset), 0.0),
            CursorMode::Both => Point::new(
                x + scale.to_device_x(glyph.x_offset),
                y - scale.to_device(glyph.y_offset),
            ),
        };
        run.set(i, glyph.id, at);

        x += scale.to_device_x(glyph.x_advance);
        if mode == CursorMode::Both {
            y -= scale.to_device(glyph.y_advance);
        }
    }

    run
}
