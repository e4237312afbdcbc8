use heapless::Vec;

use crate::band_allocator::BandAllocator;
use crate::bar_encoder::encode;
use crate::config::{GraphConfig, Layout, LayoutPolicy, MAX_BARS};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ConfigError, FrameError};
use crate::scale_tracker::ScaleTracker;
use crate::types::{BandRange, Frame, RowMask};

/// Largest finite magnitude in `bins[range]`, 0 for an empty or missing range.
pub fn band_max(bins: &[f32], range: core::ops::Range<usize>) -> f32 {
    let end = range.end.min(bins.len());
    let start = range.start.min(end);
    bins[start..end]
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0, f32::max)
}

/// Bars may rise instantly but fall by at most one row per frame.
pub fn limit_decay(previous: f32, candidate: f32) -> f32 {
    if candidate < previous {
        candidate.max(previous - 1.0)
    } else {
        candidate
    }
}

/// Turns one magnitude spectrum per call into one display frame.
///
/// Owns all state that survives between frames: the scale history and the
/// previous height of every bar. All of it is sized at construction.
pub struct FrameCompositor<S: DiagnosticSink = ()> {
    layout: Layout,
    allocator: BandAllocator,
    tracker: ScaleTracker,
    heights: Vec<f32, MAX_BARS>,
    sink: S,
}

impl FrameCompositor<()> {
    pub fn new(config: &GraphConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, ())
    }
}

impl<S: DiagnosticSink> FrameCompositor<S> {
    pub fn with_sink(config: &GraphConfig, mut sink: S) -> Result<Self, ConfigError> {
        let layout = config.check_layout()?;

        let allocator = match BandAllocator::new(
            layout.num_bars,
            layout.num_bands,
            layout.band_skip,
            layout.linear_fraction,
        ) {
            Ok(allocator) => allocator,
            Err(error @ ConfigError::InsufficientBands { .. })
                if config.layout_policy == LayoutPolicy::Degrade =>
            {
                sink.record(&Diagnostic::DegradedLayout { error });
                BandAllocator::degraded(
                    layout.num_bars,
                    layout.num_bands,
                    layout.band_skip,
                    layout.linear_fraction,
                )?
            }
            Err(error) => return Err(error),
        };

        let tracker = ScaleTracker::new(layout.history_size, layout.group_size, layout.min_scale)?;

        let mut heights = Vec::new();
        heights
            .resize(layout.num_bars, 0.0)
            .map_err(|_| ConfigError::TooManyBars {
                bars: layout.num_bars,
                max: MAX_BARS,
            })?;

        sink.record(&Diagnostic::Layout {
            layout: &layout,
            split_bar: allocator.scale().split_bar(),
            base: allocator.scale().base(),
            ranges: allocator.band_ranges(),
        });

        Ok(Self {
            layout,
            allocator,
            tracker,
            heights,
            sink,
        })
    }

    /// Composes one frame into a freshly allocated [`Frame`].
    pub fn compose(&mut self, spectrum: &[f32]) -> Frame {
        let mut frame = Frame::new();
        // frame_width <= MAX_COLUMNS is checked by the layout
        if frame.resize(self.layout.frame_width, 0).is_ok() {
            self.compose_columns(spectrum, &mut frame);
        }
        frame
    }

    /// Composes one frame into `out` and returns the number of columns written.
    ///
    /// Columns past the frame width are left untouched. A buffer that is too
    /// small is rejected before any state changes.
    pub fn compose_into(
        &mut self,
        spectrum: &[f32],
        out: &mut [RowMask],
    ) -> Result<usize, FrameError> {
        let width = self.layout.frame_width;
        if out.len() < width {
            return Err(FrameError::BufferTooSmall {
                needed: width,
                got: out.len(),
            });
        }
        self.compose_columns(spectrum, &mut out[..width]);
        Ok(width)
    }

    fn compose_columns(&mut self, spectrum: &[f32], out: &mut [RowMask]) {
        let layout = self.layout;

        // Step 1: derive the scale from the loudest usable band of this frame
        let frame_max = band_max(spectrum, layout.band_skip..layout.num_bands);
        let divisor = self.tracker.update(frame_max);
        // num_lines + 1 distinct heights fit on num_lines rows
        let ceiling = layout.num_lines as f32 + 1.0;
        let scale = ceiling / divisor;
        self.sink.record(&Diagnostic::Scale {
            frame_max,
            divisor,
            scale,
        });

        // Step 2: one bar at a time, bar_width columns then the gap
        for (bar, range) in self.allocator.band_ranges().iter().enumerate() {
            let peak = band_max(spectrum, range.as_range());
            // the tracker caps huge maxima, so the peak may exceed the divisor
            let height = limit_decay(self.heights[bar], (peak * scale).min(ceiling));
            self.heights[bar] = height;

            let mask = encode(height, layout.num_lines);
            self.sink.record(&Diagnostic::Bar {
                bar,
                range: *range,
                peak,
                height,
                mask,
            });

            let first = layout.column_of(bar);
            out[first..first + layout.bar_width].fill(mask);
            if bar + 1 < layout.num_bars {
                let gap = first + layout.bar_width;
                out[gap..gap + layout.skip_columns].fill(0);
            }
        }

        self.sink.record(&Diagnostic::Frame {
            columns: out,
            rows: layout.num_lines,
        });
    }

    /// Forgets the scale history and drops every bar to zero.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.heights.iter_mut().for_each(|height| *height = 0.0);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn ranges(&self) -> &[BandRange] {
        self.allocator.band_ranges()
    }

    /// Normalized bar heights of the last frame.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn is_degraded(&self) -> bool {
        self.allocator.is_degraded()
    }

    pub fn tracker(&self) -> &ScaleTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
