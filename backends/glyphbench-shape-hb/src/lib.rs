//! HarfBuzz shaping for glyphbench
//!
//! Two ways into the same engine:
//!
//! - [`HarfBuzzShaper`] wraps everything: it builds a face and font for each
//!   call and returns glyphs positioned in pixels.
//! - [`HbBufferShaper`] keeps one font, scaled to a custom unit grid, and one
//!   buffer that is cleared and refilled on every call. Positions come back in
//!   that grid for the caller to convert.

use std::str::FromStr;
use std::sync::Arc;

use harfbuzz_rs::{
    Direction as HbDirection, Face, Feature, Font as HbFont, GlyphBuffer, Owned, Tag,
    UnicodeBuffer,
};

use glyphbench_core::{
    error::{Result, ShapingError},
    run::RawGlyph,
    traits::{BufferShaper, FontRef, Shaper},
    types::{Direction, PositionedGlyph, ShapingResult},
    ShapingParams,
};

/// HarfBuzz works in 26.6 fixed point when the scale is `size * 64`
const SUBPIXELS: f32 = 64.0;

fn to_hb_direction(dir: Direction) -> HbDirection {
    match dir {
        Direction::LeftToRight => HbDirection::Ltr,
        Direction::RightToLeft => HbDirection::Rtl,
        Direction::TopToBottom => HbDirection::Ttb,
        Direction::BottomToTop => HbDirection::Btt,
    }
}

fn to_tag(name: &str) -> Option<Tag> {
    if name.len() != 4 {
        return None;
    }
    let mut chars = name.chars();
    Some(Tag::new(
        chars.next()?,
        chars.next()?,
        chars.next()?,
        chars.next()?,
    ))
}

/// HarfBuzz shaping backend
pub struct HarfBuzzShaper;

impl HarfBuzzShaper {
    pub fn new() -> Self {
        Self
    }

    /// Lay glyphs out from cmap and advances alone, for fonts without data
    fn shape_without_engine(
        text: &str,
        font: &dyn FontRef,
        params: &ShapingParams,
    ) -> ShapingResult {
        let scale = params.size / font.units_per_em().max(1) as f32;
        let mut glyphs = Vec::new();
        let mut x = 0.0;

        for (cluster, ch) in text.char_indices() {
            if let Some(id) = font.glyph_id(ch) {
                let advance = font.advance_width(id) * scale;
                glyphs.push(PositionedGlyph {
                    id,
                    x,
                    y: 0.0,
                    advance,
                    cluster: cluster as u32,
                });
                x += advance;
            }
        }

        ShapingResult {
            glyphs,
            advance_width: x,
            advance_height: params.size,
            direction: params.direction,
        }
    }
}

impl Default for HarfBuzzShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Shaper for HarfBuzzShaper {
    fn name(&self) -> &'static str {
        "HarfBuzz"
    }

    fn shape(
        &self,
        text: &str,
        font: Arc<dyn FontRef>,
        params: &ShapingParams,
    ) -> Result<ShapingResult> {
        if text.is_empty() {
            return Ok(ShapingResult::empty(params.size, params.direction));
        }

        let font_data = font.data();
        if font_data.is_empty() {
            log::warn!("HarfBuzz: font has no data, laying out from cmap");
            return Ok(Self::shape_without_engine(text, font.as_ref(), params));
        }

        let face = Face::from_bytes(font_data, font.face_index());
        let mut hb_font = HbFont::new(face);
        let scale = (params.size * SUBPIXELS) as i32;
        hb_font.set_scale(scale, scale);

        let mut buffer = UnicodeBuffer::new()
            .add_str(text)
            .set_direction(to_hb_direction(params.direction));

        if let Some(ref lang) = params.language {
            if let Ok(language) = harfbuzz_rs::Language::from_str(lang) {
                buffer = buffer.set_language(language);
            }
        }

        if let Some(tag) = params.script.as_deref().and_then(to_tag) {
            buffer = buffer.set_script(tag);
        }

        let features: Vec<Feature> = params
            .features
            .iter()
            .filter_map(|(name, value)| Some(Feature::new(to_tag(name)?, *value, 0..text.len())))
            .collect();

        let output = harfbuzz_rs::shape(&hb_font, buffer, &features);

        let mut glyphs = Vec::with_capacity(text.len());
        let mut x = 0.0;

        for (info, pos) in output
            .get_glyph_infos()
            .iter()
            .zip(output.get_glyph_positions())
        {
            glyphs.push(PositionedGlyph {
                id: info.codepoint,
                x: x + pos.x_offset as f32 / SUBPIXELS,
                // canvas y grows downwards
                y: -(pos.y_offset as f32) / SUBPIXELS,
                advance: pos.x_advance as f32 / SUBPIXELS,
                cluster: info.cluster,
            });
            x += pos.x_advance as f32 / SUBPIXELS;
        }

        Ok(ShapingResult {
            glyphs,
            advance_width: x,
            advance_height: params.size,
            direction: params.direction,
        })
    }
}

/// One HarfBuzz font and one buffer, reused for every call
///
/// The font is scaled to `scale` units per em, so glyph positions come out on
/// that grid no matter what the font's own units per em are.
pub struct HbBufferShaper<'a> {
    font: Owned<HbFont<'a>>,
    buffer: Option<UnicodeBuffer>,
    glyphs: Vec<RawGlyph>,
    scale: u16,
}

impl<'a> HbBufferShaper<'a> {
    pub fn new(font: &'a dyn FontRef, scale: u16) -> Result<Self> {
        if font.data().is_empty() || scale == 0 {
            return Err(ShapingError::InvalidFont.into());
        }

        let face = Face::from_bytes(font.data(), font.face_index());
        if face.glyph_count() == 0 {
            return Err(ShapingError::InvalidFont.into());
        }

        let mut hb_font = HbFont::new(face);
        hb_font.set_scale(scale as i32, scale as i32);
        log::debug!("HarfBuzz: buffer shaper scaled to {} units", scale);

        Ok(Self {
            font: hb_font,
            buffer: Some(UnicodeBuffer::new()),
            glyphs: Vec::new(),
            scale,
        })
    }

    fn collect(&mut self, output: &GlyphBuffer) {
        self.glyphs.clear();
        self.glyphs.extend(
            output
                .get_glyph_infos()
                .iter()
                .zip(output.get_glyph_positions())
                .map(|(info, pos)| RawGlyph {
                    id: info.codepoint,
                    cluster: info.cluster,
                    x_advance: pos.x_advance,
                    y_advance: pos.y_advance,
                    x_offset: pos.x_offset,
                    y_offset: pos.y_offset,
                }),
        );
    }
}

impl BufferShaper for HbBufferShaper<'_> {
    fn units_per_em(&self) -> u16 {
        self.scale
    }

    fn shape_raw(&mut self, text: &str) -> Result<&[RawGlyph]> {
        // harfbuzz_rs can't hand out glyph slices for an empty buffer
        if text.is_empty() {
            self.glyphs.clear();
            return Ok(&self.glyphs);
        }

        let buffer = self
            .buffer
            .take()
            .ok_or(ShapingError::BufferUnavailable)?
            .add_str(text)
            .guess_segment_properties();

        let output = harfbuzz_rs::shape(&self.font, buffer, &[]);
        self.collect(&output);
        // clearing hands the allocation back as an empty input buffer
        self.buffer = Some(output.clear());

        Ok(&self.glyphs)
    }
}
