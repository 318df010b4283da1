//! Skia surface - an offscreen tiny-skia pixmap that glyphbench draws into
//!
//! Glyph outlines come from skrifa, get traced into a kurbo path, and are
//! filled by tiny-skia with anti-aliasing. Outlines are cached per font, glyph
//! and size, so after the first iteration a benchmark only pays for filling.

use std::collections::HashMap;
use std::path::Path;

use kurbo::{BezPath, PathEl};
use skrifa::MetadataProvider;
use tiny_skia::{FillRule, PathBuilder, Pixmap, PixmapPaint, Transform};

use glyphbench_core::{
    error::{RenderError, Result},
    run::GlyphRun,
    traits::{Canvas, FontRef},
    types::{GlyphId, Point},
    Color, Paint,
};

/// Which outline a cached path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OutlineKey {
    font: usize,
    face: u32,
    glyph: GlyphId,
    size_bits: u32,
}

impl OutlineKey {
    fn new(font: &dyn FontRef, glyph: GlyphId, size: f32) -> Self {
        Self {
            font: font.data().as_ptr() as usize,
            face: font.face_index(),
            glyph,
            size_bits: size.to_bits(),
        }
    }
}

/// An offscreen RGBA surface
///
/// Contents persist between draws until [`Canvas::clear`] resets them.
pub struct SkiaSurface {
    pixmap: Pixmap,
    /// `None` marks glyphs with no outline, such as the space
    outlines: HashMap<OutlineKey, Option<tiny_skia::Path>>,
}

impl SkiaSurface {
    /// A transparent surface of `width` x `height` pixels
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap =
            Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap,
            outlines: HashMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA bytes, row by row
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color at `(x, y)`, `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        // Pixmap::pixel only checks the flat index, so x past the edge wraps
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Number of distinct outlines traced so far
    pub fn cached_outlines(&self) -> usize {
        self.outlines.len()
    }

    /// Composite the surface over `background` into a fresh pixmap of the same size
    pub fn present(&self, background: Color) -> Result<Pixmap> {
        let (width, height) = (self.width(), self.height());
        let mut frame =
            Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;
        frame.fill(to_skia_color(background));
        frame.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(frame)
    }

    /// Write [`Self::present`] over `background` as PNG
    pub fn save_png(&self, path: impl AsRef<Path>, background: Color) -> Result<()> {
        let frame = self.present(background)?;
        frame
            .save_png(path.as_ref())
            .map_err(|e| RenderError::EncodingFailed(e.to_string()))?;
        log::info!("Skia: wrote {}", path.as_ref().display());
        Ok(())
    }

    fn fill_glyph(
        &mut self,
        font: &dyn FontRef,
        glyph: GlyphId,
        at: Point,
        paint: &Paint,
        skia_paint: &tiny_skia::Paint<'_>,
    ) -> Result<()> {
        let key = OutlineKey::new(font, glyph, paint.size);
        if !self.outlines.contains_key(&key) {
            let path = trace_outline(font, glyph, paint.size)?;
            self.outlines.insert(key, path);
        }

        let Some(Some(path)) = self.outlines.get(&key) else {
            return Ok(());
        };

        // Fonts are y-up, the pixmap is y-down
        let transform = Transform::from_row(paint.scale_x, 0.0, 0.0, -1.0, at.x, at.y);
        self.pixmap
            .fill_path(path, skia_paint, FillRule::Winding, transform, None);
        Ok(())
    }
}

impl Canvas for SkiaSurface {
    fn clear(&mut self, color: Color) {
        self.pixmap.fill(to_skia_color(color));
    }

    /// Map chars through cmap and step by advances; no shaping, no kerning
    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: &dyn FontRef,
        paint: &Paint,
    ) -> Result<()> {
        let skia_paint = to_skia_paint(paint);
        let scale = paint.size / font.units_per_em().max(1) as f32 * paint.scale_x;
        let mut x = origin.x;

        for ch in text.chars() {
            let glyph = font.glyph_id(ch).unwrap_or(0);
            self.fill_glyph(font, glyph, Point::new(x, origin.y), paint, &skia_paint)?;
            x += font.advance_width(glyph) * scale;
        }

        Ok(())
    }

    fn draw_glyph_run(
        &mut self,
        run: &GlyphRun,
        origin: Point,
        font: &dyn FontRef,
        paint: &Paint,
    ) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }

        let skia_paint = to_skia_paint(paint);
        for (glyph, at) in run.iter() {
            let at = Point::new(origin.x + at.x, origin.y + at.y);
            self.fill_glyph(font, glyph, at, paint, &skia_paint)?;
        }

        Ok(())
    }
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_skia_paint(paint: &Paint) -> tiny_skia::Paint<'static> {
    let mut skia_paint = tiny_skia::Paint::default();
    skia_paint.set_color_rgba8(paint.color.r, paint.color.g, paint.color.b, paint.color.a);
    skia_paint.anti_alias = paint.antialias;
    skia_paint
}

/// Trace a glyph outline at `size` pixels per em, `None` when it has no contours
fn trace_outline(font: &dyn FontRef, glyph: GlyphId, size: f32) -> Result<Option<tiny_skia::Path>> {
    let font_ref = skrifa::FontRef::from_index(font.data(), font.face_index())
        .map_err(|_| RenderError::InvalidFont)?;

    let outline = font_ref
        .outline_glyphs()
        .get(skrifa::GlyphId::new(glyph))
        .ok_or(RenderError::GlyphNotFound(glyph))?;

    let mut path = BezPath::new();
    let settings = skrifa::outline::DrawSettings::unhinted(
        skrifa::instance::Size::new(size),
        skrifa::instance::LocationRef::default(),
    );
    outline
        .draw(settings, &mut PathPen { path: &mut path })
        .map_err(|_| RenderError::OutlineExtractionFailed)?;

    let mut builder = PathBuilder::new();
    for element in path.elements() {
        match *element {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(ctrl, end) => {
                builder.quad_to(ctrl.x as f32, ctrl.y as f32, end.x as f32, end.y as f32)
            },
            PathEl::CurveTo(c1, c2, end) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                end.x as f32,
                end.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }

    let traced = builder.finish();
    if traced.is_none() {
        log::debug!("Skia: glyph {} has no outline", glyph);
    }
    Ok(traced)
}

/// Bridge between skrifa's outline commands and kurbo's path format
struct PathPen<'a> {
    path: &'a mut BezPath,
}

impl skrifa::outline::OutlinePen for PathPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path
            .quad_to((cx0 as f64, cy0 as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphbench_core::BenchError;

    struct StubFont;

    impl FontRef for StubFont {
        fn data(&self) -> &[u8] {
            &[]
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, _ch: char) -> Option<GlyphId> {
            Some(1)
        }

        fn advance_width(&self, _glyph_id: GlyphId) -> f32 {
            500.0
        }
    }

    #[test]
    fn test_zero_size_surface_is_rejected() {
        assert!(matches!(
            SkiaSurface::new(0, 100),
            Err(BenchError::RenderingFailed(RenderError::InvalidDimensions {
                width: 0,
                height: 100
            }))
        ));
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = SkiaSurface::new(300, 100).unwrap();
        assert_eq!((surface.width(), surface.height()), (300, 100));
        assert!(surface.data().iter().all(|&b| b == 0));
        assert_eq!(surface.pixel(300, 0), None);
    }

    #[test]
    fn test_pixel_does_not_wrap_rows() {
        let mut surface = SkiaSurface::new(4, 2).unwrap();
        surface.clear(Color::white());
        assert_eq!(surface.pixel(3, 1), Some(Color::white()));
        assert_eq!(surface.pixel(4, 0), None);
        assert_eq!(surface.pixel(5, 1), None);
        assert_eq!(surface.pixel(0, 2), None);
    }

    #[test]
    fn test_clear_fills_every_pixel() {
        let mut surface = SkiaSurface::new(8, 4).unwrap();
        surface.clear(Color::white());
        assert!(surface.data().iter().all(|&b| b == 255));
        assert_eq!(surface.pixel(7, 3), Some(Color::white()));
    }

    #[test]
    fn test_empty_run_is_a_no_op() {
        let mut surface = SkiaSurface::new(8, 4).unwrap();
        surface
            .draw_glyph_run(
                &GlyphRun::positioned(0),
                Point::ZERO,
                &StubFont,
                &Paint::default(),
            )
            .unwrap();
        assert!(surface.data().iter().all(|&b| b == 0));
        assert_eq!(surface.cached_outlines(), 0);
    }

    #[test]
    fn test_run_with_unparseable_font_fails() {
        let mut surface = SkiaSurface::new(8, 4).unwrap();
        let mut run = GlyphRun::positioned(1);
        run.set(0, 1, Point::ZERO);
        let result = surface.draw_glyph_run(&run, Point::ZERO, &StubFont, &Paint::default());
        assert!(matches!(
            result,
            Err(BenchError::RenderingFailed(RenderError::InvalidFont))
        ));
    }

    #[test]
    fn test_present_composites_over_background() {
        let mut surface = SkiaSurface::new(4, 4).unwrap();
        let frame = surface.present(Color::blue()).unwrap();
        let px = frame.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0, 0, 255, 255));

        surface.clear(Color::white());
        let frame = surface.present(Color::blue()).unwrap();
        let px = frame.pixel(2, 2).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (255, 255, 255));
    }
}
