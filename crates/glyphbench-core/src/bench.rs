//! The timing harness and the three ways of drawing the sample line
//!
//! [`run_loop`] is the whole harness: start a timer, repeat a step, stop the
//! timer. [`Benchmark`] plugs each drawing procedure into it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    config::BenchConfig,
    error::{BenchError, Result},
    run::{assemble_raw, CursorMode, GlyphRun},
    traits::{BufferShaper, Canvas, FontRef, Shaper},
    types::Point,
    units::UnitScale,
    Color, Paint, ShapingParams,
};

/// Which drawing procedure a benchmark times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenchmarkKind {
    /// Plain text draw, no shaping engine
    Direct,
    /// High-level shaping wrapper, positioned run
    Shaper,
    /// Reusable shaping buffer, one horizontal run
    Buffer,
    /// Reusable shaping buffer, x/y cursor, one draw per glyph
    BufferPerGlyph,
}

impl BenchmarkKind {
    pub const fn all() -> [BenchmarkKind; 4] {
        [
            BenchmarkKind::Direct,
            BenchmarkKind::Shaper,
            BenchmarkKind::Buffer,
            BenchmarkKind::BufferPerGlyph,
        ]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            BenchmarkKind::Direct => "direct",
            BenchmarkKind::Shaper => "shaper",
            BenchmarkKind::Buffer => "buffer",
            BenchmarkKind::BufferPerGlyph => "buffer-per-glyph",
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BenchmarkKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        BenchmarkKind::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BenchError::Config(format!("unknown benchmark: {}", s)))
    }
}

/// Outcome of one timed benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub kind: BenchmarkKind,
    pub iterations: u32,
    pub cleared: bool,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Mean time per iteration, zero when nothing ran
    pub fn ns_per_iteration(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.elapsed.as_nanos() as f64 / self.iterations as f64
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Elapsed time for {} iterations: {}ms",
            self.iterations,
            self.elapsed_ms()
        )
    }
}

/// Run `step` `iterations` times against `canvas` and time the lot
///
/// With `clear` set the canvas is reset to that color before every step,
/// otherwise whatever earlier steps drew stays. The first failing step ends
/// the loop and its error is returned.
pub fn run_loop<F>(
    iterations: u32,
    clear: Option<Color>,
    canvas: &mut dyn Canvas,
    mut step: F,
) -> Result<Duration>
where
    F: FnMut(&mut dyn Canvas) -> Result<()>,
{
    let start = Instant::now();

    for _ in 0..iterations {
        if let Some(color) = clear {
            canvas.clear(color);
        }
        step(&mut *canvas)?;
    }

    Ok(start.elapsed())
}

/// A font, a paint and a config, ready to be timed on any canvas
pub struct Benchmark {
    config: BenchConfig,
    font: Arc<dyn FontRef>,
    paint: Paint,
    background: Color,
}

impl Benchmark {
    pub fn new(config: BenchConfig, font: Arc<dyn FontRef>) -> Result<Self> {
        config.validate()?;
        let paint = Paint::with_size(config.font_size);
        Ok(Self {
            config,
            font,
            paint,
            background: Color::white(),
        })
    }

    /// Use a different paint, the text size stays the configured one
    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = Paint {
            size: self.config.font_size,
            ..paint
        };
        self
    }

    /// Color the surface is cleared to between iterations
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Every procedure draws with its baseline starting here
    pub fn origin(&self) -> Point {
        Point::new(0.0, self.config.font_size)
    }

    fn clear_color(&self) -> Option<Color> {
        self.config.clear.then_some(self.background)
    }

    fn report(&self, kind: BenchmarkKind, elapsed: Duration) -> BenchReport {
        log::debug!(
            "{}: {} iterations in {:?} (clear={})",
            kind,
            self.config.iterations,
            elapsed,
            self.config.clear
        );
        BenchReport {
            kind,
            iterations: self.config.iterations,
            cleared: self.config.clear,
            elapsed,
        }
    }

    /// Run `kind` with whichever collaborators it needs
    pub fn run(
        &self,
        kind: BenchmarkKind,
        canvas: &mut dyn Canvas,
        shaper: &dyn Shaper,
        buffer: &mut dyn BufferShaper,
    ) -> Result<BenchReport> {
        match kind {
            BenchmarkKind::Direct => self.run_direct(canvas),
            BenchmarkKind::Shaper => self.run_shaper(canvas, shaper),
            BenchmarkKind::Buffer => self.run_buffer(canvas, buffer, CursorMode::Horizontal),
            BenchmarkKind::BufferPerGlyph => self.run_buffer(canvas, buffer, CursorMode::Both),
        }
    }

    /// One plain text draw per iteration
    pub fn run_direct(&self, canvas: &mut dyn Canvas) -> Result<BenchReport> {
        let font = self.font.as_ref();
        let text = self.config.text.as_str();
        let origin = self.origin();

        let elapsed = run_loop(
            self.config.iterations,
            self.clear_color(),
            canvas,
            |canvas| canvas.draw_text(text, origin, font, &self.paint),
        )?;

        Ok(self.report(BenchmarkKind::Direct, elapsed))
    }

    /// Shape, copy into a positioned run, draw the run
    pub fn run_shaper(&self, canvas: &mut dyn Canvas, shaper: &dyn Shaper) -> Result<BenchReport> {
        let params = ShapingParams {
            size: self.config.font_size,
            ..Default::default()
        };
        let text = self.config.text.as_str();
        let origin = self.origin();

        let elapsed = run_loop(
            self.config.iterations,
            self.clear_color(),
            canvas,
            |canvas| {
                let shaped = shaper.shape(text, Arc::clone(&self.font), &params)?;
                let run = GlyphRun::from_shaping(&shaped);
                canvas.draw_glyph_run(&run, origin, self.font.as_ref(), &self.paint)
            },
        )?;

        Ok(self.report(BenchmarkKind::Shaper, elapsed))
    }

    /// Refill the shaping buffer and walk its output with a cursor
    ///
    /// `CursorMode::Horizontal` draws the whole line as one horizontal run;
    /// `CursorMode::Both` tracks y as well and draws glyph by glyph.
    pub fn run_buffer(
        &self,
        canvas: &mut dyn Canvas,
        shaper: &mut dyn BufferShaper,
        mode: CursorMode,
    ) -> Result<BenchReport> {
        let scale = UnitScale::new(self.config.font_size, shaper.units_per_em())?
            .with_scale_x(self.paint.scale_x);
        let text = self.config.text.as_str();
        let origin = self.origin();
        let font = self.font.as_ref();

        let elapsed = run_loop(
            self.config.iterations,
            self.clear_color(),
            canvas,
            |canvas| {
                let glyphs = shaper.shape_raw(text)?;
                let run = assemble_raw(glyphs, scale, mode);
                match mode {
                    CursorMode::Horizontal => {
                        canvas.draw_glyph_run(&run, origin, font, &self.paint)
                    },
                    CursorMode::Both => {
                        for (glyph, at) in run.iter() {
                            let at = Point::new(origin.x + at.x, origin.y + at.y);
                            canvas.draw_glyph(glyph, at, font, &self.paint)?;
                        }
                        Ok(())
                    },
                }
            },
        )?;

        let kind = match mode {
            CursorMode::Horizontal => BenchmarkKind::Buffer,
            CursorMode::Both => BenchmarkKind::BufferPerGlyph,
        };
        Ok(self.report(kind, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ShapingError,
        run::RawGlyph,
        types::{Direction, GlyphId, PositionedGlyph, ShapingResult},
    };
    use std::cell::Cell;

    struct MockFont;

    impl FontRef for MockFont {
        fn data(&self) -> &[u8] {
            &[]
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, ch: char) -> Option<GlyphId> {
            Some(ch as u32)
        }

        fn advance_width(&self, _glyph_id: GlyphId) -> f32 {
            500.0
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Text(String, Point),
        Run(GlyphRun, Point),
    }

    /// Keeps every draw since the last clear, like pixels would
    #[derive(Default)]
    struct RecordingCanvas {
        clears: usize,
        draws: usize,
        contents: Vec<Op>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self, _color: Color) {
            self.clears += 1;
            self.contents.clear();
        }

        fn draw_text(
            &mut self,
            text: &str,
            origin: Point,
            _font: &dyn FontRef,
            _paint: &Paint,
        ) -> Result<()> {
            self.draws += 1;
            self.contents.push(Op::Text(text.to_string(), origin));
            Ok(())
        }

        fn draw_glyph_run(
            &mut self,
            run: &GlyphRun,
            origin: Point,
            _font: &dyn FontRef,
            _paint: &Paint,
        ) -> Result<()> {
            self.draws += 1;
            self.contents.push(Op::Run(run.clone(), origin));
            Ok(())
        }
    }

    /// One glyph per char, 10px apart
    struct MockShaper;

    impl Shaper for MockShaper {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn shape(
            &self,
            text: &str,
            _font: Arc<dyn FontRef>,
            params: &ShapingParams,
        ) -> Result<ShapingResult> {
            let glyphs: Vec<PositionedGlyph> = text
                .chars()
                .enumerate()
                .map(|(i, ch)| PositionedGlyph {
                    id: ch as u32,
                    x: i as f32 * 10.0,
                    y: 0.0,
                    advance: 10.0,
                    cluster: i as u32,
                })
                .collect();
            Ok(ShapingResult {
                advance_width: glyphs.len() as f32 * 10.0,
                glyphs,
                advance_height: params.size,
                direction: Direction::LeftToRight,
            })
        }
    }

    /// One glyph per char, half an em apart, counting how often it shaped
    struct MockBuffer {
        glyphs: Vec<RawGlyph>,
        calls: usize,
    }

    impl MockBuffer {
        fn new() -> Self {
            Self {
                glyphs: Vec::new(),
                calls: 0,
            }
        }
    }

    impl BufferShaper for MockBuffer {
        fn units_per_em(&self) -> u16 {
            512
        }

        fn shape_raw(&mut self, text: &str) -> Result<&[RawGlyph]> {
            self.calls += 1;
            self.glyphs.clear();
            self.glyphs.extend(text.chars().map(|ch| RawGlyph {
                id: ch as u32,
                x_advance: 256,
                ..Default::default()
            }));
            Ok(&self.glyphs)
        }
    }

    struct FailingShaper;

    impl Shaper for FailingShaper {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn shape(
            &self,
            _text: &str,
            _font: Arc<dyn FontRef>,
            _params: &ShapingParams,
        ) -> Result<ShapingResult> {
            Err(ShapingError::InvalidFont.into())
        }
    }

    fn bench(iterations: u32, clear: bool, text: &str) -> Benchmark {
        let config = BenchConfig {
            iterations,
            clear,
            text: text.to_string(),
            ..Default::default()
        };
        Benchmark::new(config, Arc::new(MockFont)).unwrap()
    }

    #[test]
    fn test_run_loop_invokes_step_exactly_n_times() {
        for n in [0u32, 1, 7, 1000] {
            let calls = Cell::new(0u32);
            let mut canvas = RecordingCanvas::default();
            run_loop(n, None, &mut canvas, |_| {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap();
            assert_eq!(calls.get(), n);
            assert_eq!(canvas.clears, 0);
        }
    }

    #[test]
    fn test_run_loop_clears_before_every_step() {
        let mut canvas = RecordingCanvas::default();
        run_loop(5, Some(Color::white()), &mut canvas, |canvas| {
            canvas.draw_text("x", Point::ZERO, &MockFont, &Paint::default())
        })
        .unwrap();
        assert_eq!(canvas.clears, 5);
        assert_eq!(canvas.draws, 5);
        assert_eq!(canvas.contents.len(), 1);
    }

    #[test]
    fn test_run_loop_stops_at_first_error() {
        let calls = Cell::new(0u32);
        let mut canvas = RecordingCanvas::default();
        let result = run_loop(10, None, &mut canvas, |_| {
            calls.set(calls.get() + 1);
            if calls.get() == 3 {
                Err(ShapingError::BufferUnavailable.into())
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(BenchError::ShapingFailed(_))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_direct_draws_text_at_baseline() {
        let bench = bench(4, false, "Hello");
        let mut canvas = RecordingCanvas::default();

        let report = bench.run_direct(&mut canvas).unwrap();

        assert_eq!(report.kind, BenchmarkKind::Direct);
        assert_eq!(report.iterations, 4);
        assert_eq!(canvas.draws, 4);
        assert_eq!(
            canvas.contents[0],
            Op::Text("Hello".to_string(), Point::new(0.0, 18.0))
        );
    }

    #[test]
    fn test_contents_persist_without_clear() {
        let bench = bench(6, false, "Hi");
        let mut canvas = RecordingCanvas::default();
        bench.run_direct(&mut canvas).unwrap();
        assert_eq!(canvas.clears, 0);
        assert_eq!(canvas.contents.len(), 6);
    }

    #[test]
    fn test_contents_reset_with_clear() {
        let bench = bench(6, true, "Hi");
        let mut canvas = RecordingCanvas::default();
        bench.run_direct(&mut canvas).unwrap();
        assert_eq!(canvas.clears, 6);
        assert_eq!(canvas.contents.len(), 1);
    }

    #[test]
    fn test_shaper_copies_result_into_run() {
        let bench = bench(2, true, "abc");
        let mut canvas = RecordingCanvas::default();

        bench.run_shaper(&mut canvas, &MockShaper).unwrap();

        let Op::Run(run, origin) = &canvas.contents[0] else {
            panic!("expected a glyph run");
        };
        assert_eq!(*origin, bench.origin());
        assert_eq!(run.glyphs(), &['a' as u32, 'b' as u32, 'c' as u32]);
        assert_eq!(run.point(2), Point::new(20.0, 0.0));
    }

    #[test]
    fn test_shaper_with_empty_text_draws_empty_run() {
        let bench = bench(3, false, "");
        let mut canvas = RecordingCanvas::default();
        bench.run_shaper(&mut canvas, &MockShaper).unwrap();
        assert_eq!(canvas.draws, 3);
        assert!(canvas
            .contents
            .iter()
            .all(|op| matches!(op, Op::Run(run, _) if run.is_empty())));
    }

    #[test]
    fn test_shaper_error_propagates() {
        let bench = bench(10, false, "abc");
        let mut canvas = RecordingCanvas::default();
        let result = bench.run_shaper(&mut canvas, &FailingShaper);
        assert!(result.is_err());
        assert_eq!(canvas.draws, 0);
    }

    #[test]
    fn test_buffer_reuses_shaper_and_draws_one_run() {
        let bench = bench(5, false, "abcd");
        let mut canvas = RecordingCanvas::default();
        let mut buffer = MockBuffer::new();

        let report = bench
            .run_buffer(&mut canvas, &mut buffer, CursorMode::Horizontal)
            .unwrap();

        assert_eq!(report.kind, BenchmarkKind::Buffer);
        assert_eq!(buffer.calls, 5);
        assert_eq!(canvas.draws, 5);
        let Op::Run(run, _) = &canvas.contents[0] else {
            panic!("expected a glyph run");
        };
        assert_eq!(run.len(), 4);
        // 256 / 512 * 18
        assert_eq!(run.point(1).x, 9.0);
        assert_eq!(run.point(3).x, 27.0);
    }

    #[test]
    fn test_buffer_per_glyph_draws_each_glyph() {
        let bench = bench(3, true, "abcd");
        let mut canvas = RecordingCanvas::default();
        let mut buffer = MockBuffer::new();

        let report = bench
            .run_buffer(&mut canvas, &mut buffer, CursorMode::Both)
            .unwrap();

        assert_eq!(report.kind, BenchmarkKind::BufferPerGlyph);
        assert_eq!(canvas.draws, 12);
        assert_eq!(canvas.contents.len(), 4);
        let Op::Run(last, origin) = &canvas.contents[3] else {
            panic!("expected a glyph run");
        };
        assert_eq!(*origin, Point::ZERO);
        assert_eq!(last.glyphs(), &['d' as u32]);
        assert_eq!(last.point(0), Point::new(27.0, 18.0));
    }

    #[test]
    fn test_repeated_runs_draw_identical_content() {
        let bench = bench(2, true, "glyphs");
        let mut buffer = MockBuffer::new();

        let mut first = RecordingCanvas::default();
        bench.run(BenchmarkKind::Buffer, &mut first, &MockShaper, &mut buffer).unwrap();
        let mut second = RecordingCanvas::default();
        bench.run(BenchmarkKind::Buffer, &mut second, &MockShaper, &mut buffer).unwrap();
        assert_eq!(first.contents, second.contents);

        let mut first = RecordingCanvas::default();
        bench.run(BenchmarkKind::Shaper, &mut first, &MockShaper, &mut buffer).unwrap();
        let mut second = RecordingCanvas::default();
        bench.run(BenchmarkKind::Shaper, &mut second, &MockShaper, &mut buffer).unwrap();
        assert_eq!(first.contents, second.contents);
    }

    #[test]
    fn test_report_label() {
        let report = BenchReport {
            kind: BenchmarkKind::Direct,
            iterations: 1000,
            cleared: false,
            elapsed: Duration::from_micros(42_700),
        };
        assert_eq!(
            report.to_string(),
            "Elapsed time for 1000 iterations: 42ms"
        );
        assert_eq!(report.ns_per_iteration(), 42_700.0);
    }

    #[test]
    fn test_kind_parsing() {
        for kind in BenchmarkKind::all() {
            assert_eq!(kind.name().parse::<BenchmarkKind>().unwrap(), kind);
        }
        assert_eq!(
            "Buffer-Per-Glyph".parse::<BenchmarkKind>().unwrap(),
            BenchmarkKind::BufferPerGlyph
        );
        assert!("fast".parse::<BenchmarkKind>().is_err());
    }

    #[test]
    fn test_paint_keeps_configured_size() {
        let bench = bench(1, false, "x").with_paint(Paint {
            color: Color::blue(),
            size: 99.0,
            ..Default::default()
        });
        assert_eq!(bench.paint().size, 18.0);
        assert_eq!(bench.paint().color, Color::blue());
    }
}
