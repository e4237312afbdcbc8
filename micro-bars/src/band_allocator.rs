use core::ops::Range;

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{MAX_BANDS, MAX_BARS};
use crate::error::ConfigError;
use crate::types::{BandRange, BandRanges};

/// Smallest base for which every exponential bar still gets a band of its own.
///
/// With `b^(k+1) - b^k >= 1` for all `k >= 1` we need `b * (b - 1) >= 1`,
/// the golden ratio.
pub const MIN_LOG_BASE: f32 = 1.618_034;

/// Last bar of the linear region.
pub fn split_bar_for(num_bars: usize, linear_fraction: f32) -> usize {
    let split = (linear_fraction.clamp(0.0, 1.0) * num_bars as f32).floor();
    (split as usize).min(num_bars)
}

/// Start of `bar` relative to the first usable band, clamped to `usable`.
///
/// Integer bases are raised exactly, `powf` is only an approximation.
pub fn band_start(bar: usize, split_bar: usize, base: f32, usable: usize) -> usize {
    if bar <= split_bar {
        return bar.min(usable);
    }
    let exponent = bar - split_bar;
    let step = if base >= 1.0 && base == base.floor() {
        (base as usize)
            .checked_pow(exponent as u32)
            .unwrap_or(usize::MAX)
    } else {
        // saturating float to int cast
        base.powf(exponent as f32).floor() as usize
    };
    split_bar.saturating_add(step).min(usable)
}

/// `span^(1/n)`, exact when `span` is a perfect `n`th power.
fn nth_root(span: usize, n: usize) -> f32 {
    let approx = (span as f32).powf(1.0 / n as f32);
    let nearest = approx.round() as usize;
    if nearest.checked_pow(n as u32) == Some(span) {
        nearest as f32
    } else {
        approx
    }
}

/// Linear-then-exponential mapping from bars to band offsets.
///
/// Offsets are relative to the first usable band. Bars up to and including
/// `split_bar` start at their own index; bar `split_bar + k` starts at
/// `split_bar + floor(base^k)`. `base` is chosen once so that the end of the
/// last bar lands on `usable`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    num_bars: usize,
    usable: usize,
    split_bar: usize,
    base: f32,
}

impl LogScale {
    pub fn derive(
        num_bars: usize,
        usable: usize,
        linear_fraction: f32,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&linear_fraction) {
            return Err(ConfigError::InvalidLinearFraction);
        }
        let split_bar = split_bar_for(num_bars, linear_fraction);
        let insufficient = ConfigError::InsufficientBands {
            bars: num_bars,
            bands: usable,
        };

        let base = match num_bars - split_bar {
            // All bars linear, the last one takes whatever is left
            0 if num_bars <= usable => 1.0,
            0 => return Err(insufficient),
            _ if split_bar >= usable => return Err(insufficient),
            1 => (usable - split_bar) as f32,
            exp_bars => {
                let base = nth_root(usable - split_bar, exp_bars);
                if base < MIN_LOG_BASE {
                    return Err(insufficient);
                }
                base
            }
        };

        Ok(Self {
            num_bars,
            usable,
            split_bar,
            base,
        })
    }

    /// Fallback when [`derive`](Self::derive) fails: the smallest valid base,
    /// with every start clamped to `usable`. Trailing bars end up empty.
    pub fn degraded(num_bars: usize, usable: usize, linear_fraction: f32) -> Self {
        Self {
            num_bars,
            usable,
            split_bar: split_bar_for(num_bars, linear_fraction),
            base: MIN_LOG_BASE,
        }
    }

    pub fn split_bar(&self) -> usize {
        self.split_bar
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    pub fn num_bars(&self) -> usize {
        self.num_bars
    }

    pub fn usable(&self) -> usize {
        self.usable
    }

    pub fn start(&self, bar: usize) -> usize {
        band_start(bar, self.split_bar, self.base, self.usable)
    }

    /// Relative range of `bar`. The last bar always ends at `usable`.
    pub fn range(&self, bar: usize) -> Range<usize> {
        if bar >= self.num_bars {
            return self.usable..self.usable;
        }
        let start = self.start(bar);
        let end = if bar + 1 == self.num_bars {
            self.usable
        } else {
            self.start(bar + 1)
        };
        start..end.max(start)
    }
}

/// Band range of a single bar, derived from scratch.
///
/// Convenience for one-off lookups; [`BandAllocator`] derives the base once
/// and keeps the whole table.
pub fn band_range_for(
    bar_index: usize,
    num_bars: usize,
    num_bands: usize,
    band_skip: usize,
    linear_fraction: f32,
) -> Result<BandRange, ConfigError> {
    let usable = check_sizes(num_bars, num_bands, band_skip)?;
    let scale = LogScale::derive(num_bars, usable, linear_fraction)?;
    let range = scale.range(bar_index);
    Ok(BandRange::new(
        (range.start + band_skip) as u16,
        (range.end + band_skip) as u16,
    ))
}

fn check_sizes(num_bars: usize, num_bands: usize, band_skip: usize) -> Result<usize, ConfigError> {
    if num_bars == 0 {
        return Err(ConfigError::NoBars);
    }
    if num_bars > MAX_BARS {
        return Err(ConfigError::TooManyBars {
            bars: num_bars,
            max: MAX_BARS,
        });
    }
    if num_bands > MAX_BANDS {
        return Err(ConfigError::TooManyBands {
            bands: num_bands,
            max: MAX_BANDS,
        });
    }
    if band_skip >= num_bands {
        return Err(ConfigError::BandSkipTooLarge {
            skip: band_skip,
            bands: num_bands,
        });
    }
    Ok(num_bands - band_skip)
}

/// Precomputed band ranges, one per bar, in absolute spectrum indices.
pub struct BandAllocator {
    scale: LogScale,
    band_skip: usize,
    active_band_ranges: BandRanges,
    degraded: bool,
}

impl BandAllocator {
    pub fn new(
        num_bars: usize,
        num_bands: usize,
        band_skip: usize,
        linear_fraction: f32,
    ) -> Result<Self, ConfigError> {
        let usable = check_sizes(num_bars, num_bands, band_skip)?;
        let scale = LogScale::derive(num_bars, usable, linear_fraction)?;
        Ok(Self::build(scale, band_skip, false))
    }

    /// Like [`new`](Self::new) but never fails on an infeasible base.
    pub fn degraded(
        num_bars: usize,
        num_bands: usize,
        band_skip: usize,
        linear_fraction: f32,
    ) -> Result<Self, ConfigError> {
        let usable = check_sizes(num_bars, num_bands, band_skip)?;
        let scale = LogScale::degraded(num_bars, usable, linear_fraction);
        Ok(Self::build(scale, band_skip, true))
    }

    fn build(scale: LogScale, band_skip: usize, degraded: bool) -> Self {
        let mut active_band_ranges = BandRanges::new();
        let mut previous_start = 0;

        for bar in 0..scale.num_bars() {
            let range = scale.range(bar);
            // starts never move backwards, end of bar i == start of bar i + 1
            let start = range.start.max(previous_start);
            let end = range.end.max(start);
            // capacity checked in check_sizes
            let _ = active_band_ranges.push(BandRange::new(
                (start + band_skip) as u16,
                (end + band_skip) as u16,
            ));
            previous_start = start;
        }

        Self {
            scale,
            band_skip,
            active_band_ranges,
            degraded,
        }
    }

    pub fn band_ranges(&self) -> &[BandRange] {
        &self.active_band_ranges
    }

    pub fn range_for(&self, bar: usize) -> Option<BandRange> {
        self.active_band_ranges.get(bar).copied()
    }

    pub fn scale(&self) -> &LogScale {
        &self.scale
    }

    pub fn band_skip(&self) -> usize {
        self.band_skip
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
