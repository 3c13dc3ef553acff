//! The per-pixel, per-channel render loop.

use std::time::Instant;

use pixform_core::{Channel, EvalContext, Formula};
use rayon::prelude::*;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::raster::{PixelLayout, SourceImage};
use crate::sampler::ImageSampler;

/// A compiled formula and the channel it produces.
pub type ChannelFormula = (Channel, Formula);

/// Geometry of one pass: output pixel (px, py) maps to formula
/// coordinates (px * step_x, py * step_y) inside a `width` x `height` frame.
#[derive(Debug, Clone, Copy)]
struct Frame {
    width: f64,
    height: f64,
    center_x: f64,
    center_y: f64,
    step_x: f64,
    step_y: f64,
    /// Output bytes written per formula.
    replicate: usize,
}

impl Frame {
    fn new(width: u32, height: u32, step_x: f64, step_y: f64, replicate: usize) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
            center_x: f64::from(width / 2),
            center_y: f64::from(height / 2),
            step_x,
            step_y,
            replicate,
        }
    }
}

/// Runs channel formulas over images.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    report_errors: bool,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            report_errors: true,
        }
    }

    /// Whether compile failures are logged, once per failing channel. They
    /// are returned either way.
    pub fn report_errors(mut self, report: bool) -> Self {
        self.report_errors = report;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Compile (and optionally fold) the formulas for `channels`.
    pub fn compile(&self, channels: &[Channel]) -> Result<Vec<ChannelFormula>, RenderError> {
        channels
            .iter()
            .map(|&channel| {
                let text = self.config.formula(channel);
                let mut formula = Formula::new(text, false).map_err(|source| {
                    if self.report_errors {
                        tracing::warn!(%channel, formula = text, "Failed to compile formula: {source}");
                    }
                    RenderError::Compile { channel, source }
                })?;
                if self.config.optimize {
                    let stats = formula.optimize();
                    tracing::debug!(
                        %channel,
                        folded = stats.folded,
                        "{} -> {} nodes",
                        stats.nodes_before,
                        stats.nodes_after
                    );
                }
                Ok((channel, formula))
            })
            .collect()
    }

    /// Render every channel of `source` into a new image of the same layout.
    pub fn render(&self, source: &SourceImage) -> Result<SourceImage, RenderError> {
        let start = Instant::now();
        tracing::info!(
            "Rendering {}x{} {} image",
            source.width,
            source.height,
            source.layout
        );

        let formulas = self.compile(source.layout.channels())?;
        let sampler = ImageSampler::new(source);
        let frame = Frame::new(source.width, source.height, 1.0, 1.0, 1);
        let mut output = SourceImage::blank(source.width, source.height, source.layout);
        self.fill(&mut output, &formulas, &sampler, &frame);

        tracing::info!("Rendered in {:.1?}", start.elapsed());
        Ok(output)
    }

    /// Render a downsized RGB preview of `source`.
    ///
    /// Formulas see full-size coordinates: `w` and `h` are the source size
    /// and `x`, `y` advance by the scale factor per preview pixel. Gray
    /// sources use the gray formula on all three output channels.
    pub fn render_preview(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<SourceImage, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyPreview { width, height });
        }
        let mut output = SourceImage::blank(width, height, PixelLayout::Rgb);
        if source.is_empty() {
            return Ok(output);
        }

        let channels: &[Channel] = if source.layout.is_gray() {
            &[Channel::Gray]
        } else {
            &[Channel::Red, Channel::Green, Channel::Blue]
        };
        let formulas = self.compile(channels)?;

        let preview = source.resized(width, height)?;
        let step_x = f64::from(source.width) / f64::from(width);
        let step_y = f64::from(source.height) / f64::from(height);
        let sampler = ImageSampler::with_aspect(&preview, step_x, step_y);
        let frame = Frame::new(source.width, source.height, step_x, step_y, 3 / formulas.len());
        self.fill(&mut output, &formulas, &sampler, &frame);

        tracing::debug!("Rendered {width}x{height} preview");
        Ok(output)
    }

    fn fill(
        &self,
        output: &mut SourceImage,
        formulas: &[ChannelFormula],
        sampler: &ImageSampler<'_>,
        frame: &Frame,
    ) {
        let stride = output.stride();
        if stride == 0 {
            return;
        }
        if self.config.parallel {
            output
                .data
                .par_chunks_mut(stride)
                .enumerate()
                .for_each(|(py, row)| self.render_row(row, py, formulas, sampler, frame));
        } else {
            output
                .data
                .chunks_mut(stride)
                .enumerate()
                .for_each(|(py, row)| self.render_row(row, py, formulas, sampler, frame));
        }
    }

    /// Each row draws `rand()` from its own stream, so parallel and
    /// sequential renders agree.
    fn render_row(
        &self,
        row: &mut [u8],
        py: usize,
        formulas: &[ChannelFormula],
        sampler: &ImageSampler<'_>,
        frame: &Frame,
    ) {
        let mut ctx = EvalContext::with_source(sampler)
            .with_seed(self.config.seed)
            .with_stream(py as u64);
        ctx.set_width(frame.width);
        ctx.set_height(frame.height);

        let y = py as f64 * frame.step_y;
        let bytes_per_pixel = formulas.len() * frame.replicate;
        for (px, pixel) in row.chunks_exact_mut(bytes_per_pixel).enumerate() {
            let x = px as f64 * frame.step_x;
            ctx.set_x(x);
            ctx.set_y(y);
            ctx.set_polar_from_cartesian(x - frame.center_x, -(y - frame.center_y));

            for ((channel, formula), out) in formulas
                .iter()
                .zip(pixel.chunks_exact_mut(frame.replicate))
            {
                ctx.set_channel(*channel);
                out.fill(to_byte(formula.evaluate(&mut ctx)));
            }
        }
    }
}

/// Clamp into `[0, 255]` and truncate. NaN becomes 0.
fn to_byte(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::Level;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn config(red: &str) -> RenderConfig {
        RenderConfig {
            red: red.to_string(),
            seed: 0,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_to_byte_clamps_and_truncates() {
        assert_eq!(to_byte(-3.0), 0);
        assert_eq!(to_byte(300.0), 255);
        assert_eq!(to_byte(12.9), 12);
        assert_eq!(to_byte(f64::NAN), 0);
        assert_eq!(to_byte(f64::INFINITY), 255);
    }

    #[test]
    fn test_frame_uses_integer_centre() {
        let frame = Frame::new(5, 3, 1.0, 1.0, 1);
        assert_eq!(frame.center_x, 2.0);
        assert_eq!(frame.center_y, 1.0);
    }

    #[test]
    fn test_compile_reports_channel() {
        let renderer = Renderer::new(config("red(x,y")).report_errors(false);
        assert!(renderer.compile(&[Channel::Red]).is_ok());

        let renderer = Renderer::new(config("bogus(1)")).report_errors(false);
        let err = renderer.compile(&[Channel::Green, Channel::Red]).unwrap_err();
        assert!(matches!(err, RenderError::Compile { channel: Channel::Red, .. }));
        assert!(err.to_string().starts_with("red formula:"));
    }

    #[test]
    fn test_compile_folds_when_enabled() {
        let renderer = Renderer::new(config("2*64"));
        let formulas = renderer.compile(&[Channel::Red]).expect("compile");
        assert!(formulas[0].1.is_constant());

        let mut unfolded = config("2*64");
        unfolded.optimize = false;
        let formulas = Renderer::new(unfolded).compile(&[Channel::Red]).expect("compile");
        assert!(!formulas[0].1.is_constant());
    }

    #[test]
    fn test_empty_preview_size_is_rejected() {
        let source = SourceImage::blank(4, 4, PixelLayout::Rgb);
        let err = Renderer::new(RenderConfig::default())
            .render_preview(&source, 0, 2)
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyPreview { width: 0, height: 2 }));
    }

    /// Counts events at warning level or above.
    struct CountWarnings(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for CountWarnings {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn warnings_while(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(CountWarnings(count.clone()));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_compile_failure_is_logged_once() {
        let renderer = Renderer::new(config("1+"));
        let logged = warnings_while(|| {
            assert!(renderer.compile(&[Channel::Red]).is_err());
        });
        assert_eq!(logged, 1);
    }

    #[test]
    fn test_quiet_compile_failure_is_not_logged() {
        let renderer = Renderer::new(config("1+")).report_errors(false);
        let logged = warnings_while(|| {
            assert!(renderer.compile(&[Channel::Red]).is_err());
        });
        assert_eq!(logged, 0);
    }
}
