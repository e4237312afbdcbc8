#![no_std]
//! Spectrum to LED bar-graph pipeline.
//!
//! Takes one magnitude spectrum per frame and produces one row bitmask per
//! display column. Bars are allocated to bands on a linear-then-logarithmic
//! scale, heights are normalized against a smoothed running maximum and bars
//! fall at most one row per frame.

#[cfg(feature = "std")]
extern crate std;

pub mod band_allocator;
pub mod bar_encoder;
pub mod compositor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod render;
pub mod scale_tracker;
pub mod types;

pub use band_allocator::{band_range_for, band_start, BandAllocator, LogScale};
pub use bar_encoder::{encode, full_mask, lit_rows};
pub use compositor::FrameCompositor;
pub use config::{GraphConfig, Layout, LayoutPolicy};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use error::{ConfigError, FrameError};
pub use scale_tracker::ScaleTracker;
pub use types::{BandRange, Frame, RowMask};
