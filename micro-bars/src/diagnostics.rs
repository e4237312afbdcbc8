//! Optional tracing of the pipeline.
//!
//! The compositor reports what it does through a [`DiagnosticSink`]. The unit
//! type `()` discards everything, which is what production firmware uses.

#[cfg(feature = "logging")]
use defmt::{debug, info, trace, warn};
#[cfg(feature = "logging")]
use defmt_rtt as _;

use crate::config::Layout;
use crate::error::ConfigError;
use crate::types::{BandRange, RowMask};

/// Something worth reporting while configuring or composing a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagnostic<'a> {
    /// Emitted once the band table is built.
    Layout {
        layout: &'a Layout,
        split_bar: usize,
        base: f32,
        ranges: &'a [BandRange],
    },
    /// The allocation was infeasible and the degraded table is in use.
    DegradedLayout { error: ConfigError },
    Scale {
        frame_max: f32,
        divisor: f32,
        scale: f32,
    },
    Bar {
        bar: usize,
        range: BandRange,
        peak: f32,
        height: f32,
        mask: RowMask,
    },
    Frame { columns: &'a [RowMask], rows: u8 },
}

pub trait DiagnosticSink {
    fn record(&mut self, event: &Diagnostic<'_>);
}

impl DiagnosticSink for () {
    fn record(&mut self, _event: &Diagnostic<'_>) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn record(&mut self, event: &Diagnostic<'_>) {
        (**self).record(event)
    }
}

/// Forwards events to `defmt` over RTT.
#[cfg(feature = "logging")]
pub struct DefmtSink;

#[cfg(feature = "logging")]
impl DiagnosticSink for DefmtSink {
    fn record(&mut self, event: &Diagnostic<'_>) {
        match *event {
            Diagnostic::Layout {
                layout,
                split_bar,
                base,
                ranges,
            } => {
                info!(
                    "Layout: {} bars x {} rows, {} columns, split at bar {}, base {}",
                    layout.num_bars, layout.num_lines, layout.frame_width, split_bar, base
                );
                for (bar, range) in ranges.iter().enumerate() {
                    debug!("Bar {} : Band from {} to {}", bar, range.start, range.end);
                }
            }
            Diagnostic::DegradedLayout { error } => {
                warn!("Degraded layout, trailing bars stay dark: {}", error);
            }
            Diagnostic::Scale {
                frame_max,
                divisor,
                scale,
            } => trace!(
                "Frame max: {}, divisor: {}, scale: {}",
                frame_max,
                divisor,
                scale
            ),
            Diagnostic::Bar {
                bar,
                range,
                peak,
                height,
                mask,
            } => trace!(
                "Bar {} : Band from {} to {}: {} -> {} ({=u32:b})",
                bar,
                range.start,
                range.end,
                peak,
                height,
                mask
            ),
            Diagnostic::Frame { columns, .. } => debug!("Frame: {:x}", columns),
        }
    }
}

/// Prints events to stdout, the frame as ASCII art.
#[cfg(feature = "std")]
pub struct StdoutSink {
    /// Also print one line per bar and frame.
    pub trace_bars: bool,
}

#[cfg(feature = "std")]
impl StdoutSink {
    pub fn new() -> Self {
        Self { trace_bars: false }
    }
}

#[cfg(feature = "std")]
impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl DiagnosticSink for StdoutSink {
    fn record(&mut self, event: &Diagnostic<'_>) {
        match *event {
            Diagnostic::Layout {
                layout,
                split_bar,
                base,
                ranges,
            } => {
                std::println!(
                    "Layout: {} bars x {} rows, {} columns, split at bar {}, base {:.3}",
                    layout.num_bars,
                    layout.num_lines,
                    layout.frame_width,
                    split_bar,
                    base
                );
                for (bar, range) in ranges.iter().enumerate() {
                    std::println!("Bar {} : Band from {} to {}", bar, range.start, range.end);
                }
            }
            Diagnostic::DegradedLayout { error } => {
                std::println!("Warning: degraded layout, trailing bars stay dark: {}", error);
            }
            Diagnostic::Scale {
                frame_max,
                divisor,
                scale,
            } => {
                if self.trace_bars {
                    std::println!(
                        "Frame max: {:.2}, divisor: {:.2}, scale: {:.5}",
                        frame_max,
                        divisor,
                        scale
                    );
                }
            }
            Diagnostic::Bar {
                bar,
                range,
                peak,
                height,
                ..
            } => {
                if self.trace_bars {
                    std::println!(
                        "Bar {} : Band from {} to {}: {:.2} -> {:.2}",
                        bar,
                        range.start,
                        range.end,
                        peak,
                        height
                    );
                }
            }
            Diagnostic::Frame { columns, rows } => {
                let mut text = std::string::String::new();
                if crate::render::write_frame(&mut text, columns, rows).is_ok() {
                    std::print!("{}", text);
                }
            }
        }
    }
}
