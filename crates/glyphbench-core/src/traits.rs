//! The contracts between fonts, shapers and canvases
//!
//! - [`FontRef`] - Your window into font data and metrics
//! - [`Shaper`] - High-level shaping: text in, pixel positions out
//! - [`BufferShaper`] - Low-level shaping: a reusable buffer, design units out
//! - [`Canvas`] - Where text, runs and single glyphs get drawn

use crate::{
    error::Result,
    run::{GlyphRun, RawGlyph},
    types::{GlyphId, Point, ShapingResult},
    Color, Paint, ShapingParams,
};
use std::sync::Arc;

/// Your key to unlocking font secrets
///
/// ```ignore
/// struct MyFont {
///     data: Vec<u8>,
/// }
///
/// impl FontRef for MyFont {
///     fn data(&self) -> &[u8] {
///         &self.data
///     }
///
///     fn units_per_em(&self) -> u16 {
///         2048
///     }
///
///     fn glyph_id(&self, ch: char) -> Option<GlyphId> {
///         Some(42)
///     }
///
///     fn advance_width(&self, glyph_id: GlyphId) -> f32 {
///         1139.0
///     }
/// }
/// ```
pub trait FontRef: Send + Sync {
    /// Raw font bytes as they live in the file
    fn data(&self) -> &[u8];

    /// Face inside a collection, 0 for single fonts
    fn face_index(&self) -> u32 {
        0
    }

    /// The font's internal coordinate system scale
    fn units_per_em(&self) -> u16;

    /// Find the glyph that represents this character
    fn glyph_id(&self, ch: char) -> Option<GlyphId>;

    /// How wide this glyph stands in font units
    fn advance_width(&self, glyph_id: GlyphId) -> f32;

    /// How many glyphs this font contains
    fn glyph_count(&self) -> Option<u32> {
        None
    }
}

/// Where characters learn their positions
///
/// The high-level path: the shaper owns every detail of the engine and hands
/// back glyphs already positioned in pixels.
pub trait Shaper: Send + Sync {
    /// Identify yourself in logs and reports
    fn name(&self) -> &'static str;

    /// Transform characters into positioned glyphs
    fn shape(
        &self,
        text: &str,
        font: Arc<dyn FontRef>,
        params: &ShapingParams,
    ) -> Result<ShapingResult>;
}

/// A shaping engine driven through one reusable buffer
///
/// Every call clears the buffer, refills it with `text` and shapes it. The
/// returned glyphs borrow the shaper's storage and stay valid until the next
/// call. Positions are in the shaper's own units, see [`Self::units_per_em`].
pub trait BufferShaper {
    /// The scale the engine's font was set to
    fn units_per_em(&self) -> u16;

    fn shape_raw(&mut self, text: &str) -> Result<&[RawGlyph]>;
}

/// An offscreen drawing surface
pub trait Canvas {
    /// Reset every pixel to `color`
    fn clear(&mut self, color: Color);

    /// Draw `text` without a shaping engine, with the baseline starting at `origin`
    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: &dyn FontRef,
        paint: &Paint,
    ) -> Result<()>;

    /// Draw a run with every glyph position offset by `origin`
    fn draw_glyph_run(
        &mut self,
        run: &GlyphRun,
        origin: Point,
        font: &dyn FontRef,
        paint: &Paint,
    ) -> Result<()>;

    /// Draw one glyph at `at`
    fn draw_glyph(
        &mut self,
        glyph: GlyphId,
        at: Point,
        font: &dyn FontRef,
        paint: &Paint,
    ) -> Result<()> {
        let mut run = GlyphRun::positioned(1);
        run.set(0, glyph, at);
        self.draw_glyph_run(&run, Point::ZERO, font, paint)
    }
}
