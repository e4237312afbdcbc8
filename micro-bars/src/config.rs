use crate::band_allocator::LogScale;
use crate::error::ConfigError;
use crate::types::RowMask;

// --- Capacity Limits ---
pub const MAX_BARS: usize = 64;
pub const MAX_COLUMNS: usize = 256;
pub const MAX_HISTORY: usize = 32;
pub const MAX_ROWS: u8 = RowMask::BITS as u8;
pub const MAX_BANDS: usize = 2048; // Band indices are stored as u16

// --- Display Config ---
pub const DEFAULT_DISPLAY_WIDTH: u16 = 32;
pub const DEFAULT_DISPLAY_HEIGHT: u8 = 8;
pub const DEFAULT_NUM_BARS: usize = 8;
pub const DEFAULT_NUM_LINES: u8 = 8;
pub const DEFAULT_BAR_WIDTH: u16 = 3;
pub const DEFAULT_SKIP_COLUMNS: u16 = 1;

// --- Spectrum Config ---
pub const DEFAULT_NUM_BANDS: usize = 64; // 128 samples per frame
pub const DEFAULT_BAND_SKIP: usize = 1; // DC bin carries no useful level
pub const DEFAULT_LINEAR_FRACTION: f32 = 0.8;

// --- Scale Tracking Config ---
pub const DEFAULT_HISTORY_SIZE: usize = 4;
pub const DEFAULT_GROUP_SIZE: u32 = 8;
pub const DEFAULT_MIN_SCALE: f32 = 500.0;

/// What to do when the bars cannot each be given a distinct band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Refuse the configuration.
    Strict,
    /// Keep going with trailing bars mapped to empty ranges.
    Degrade,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LayoutPolicy::Degrade
        } else {
            LayoutPolicy::Strict
        }
    }
}

/// User facing configuration. Validate it into a [`Layout`] before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    /// Columns physically available on the display.
    pub display_width: u16,
    /// Rows physically available on the display.
    pub display_height: u8,
    pub num_bars: usize,
    /// Rows used by the graph.
    pub num_lines: u8,
    pub bar_width: u16,
    /// Blank columns between two bars.
    pub skip_columns: u16,
    /// Length of the magnitude spectrum, half the sample count.
    pub num_bands: usize,
    /// Low frequency bands left out of every bar.
    pub band_skip: usize,
    /// Share of the bars mapped 1:1 onto bands.
    pub linear_fraction: f32,
    pub history_size: usize,
    /// Frames merged into one history slot.
    pub group_size: u32,
    /// Floor applied to the per-frame maximum before scaling.
    pub min_scale: f32,
    pub layout_policy: LayoutPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            num_bars: DEFAULT_NUM_BARS,
            num_lines: DEFAULT_NUM_LINES,
            bar_width: DEFAULT_BAR_WIDTH,
            skip_columns: DEFAULT_SKIP_COLUMNS,
            num_bands: DEFAULT_NUM_BANDS,
            band_skip: DEFAULT_BAND_SKIP,
            linear_fraction: DEFAULT_LINEAR_FRACTION,
            history_size: DEFAULT_HISTORY_SIZE,
            group_size: DEFAULT_GROUP_SIZE,
            min_scale: DEFAULT_MIN_SCALE,
            layout_policy: LayoutPolicy::default(),
        }
    }
}

/// A configuration that passed validation. Everything downstream reads this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub num_bars: usize,
    pub num_lines: u8,
    pub bar_width: usize,
    pub skip_columns: usize,
    pub num_bands: usize,
    pub band_skip: usize,
    pub linear_fraction: f32,
    pub frame_width: usize,
    pub history_size: usize,
    pub group_size: u32,
    pub min_scale: f32,
}

impl Layout {
    pub fn usable_bands(&self) -> usize {
        self.num_bands - self.band_skip
    }

    /// First output column of `bar`.
    pub fn column_of(&self, bar: usize) -> usize {
        bar * (self.bar_width + self.skip_columns)
    }
}

impl GraphConfig {
    /// Default configuration with the display geometry replaced.
    pub fn configure(
        num_bars: usize,
        num_lines: u8,
        bar_width: u16,
        skip_columns: u16,
        band_skip: usize,
        linear_fraction: f32,
    ) -> Self {
        Self {
            num_bars,
            num_lines,
            bar_width,
            skip_columns,
            band_skip,
            linear_fraction,
            ..Self::default()
        }
    }

    /// `num_bars * (bar_width + skip_columns) - skip_columns`, no trailing gap.
    pub fn frame_width(&self) -> usize {
        let step = self.bar_width as usize + self.skip_columns as usize;
        (self.num_bars * step).saturating_sub(self.skip_columns as usize)
    }

    /// Checks everything except whether the band allocation is feasible.
    pub fn check_layout(&self) -> Result<Layout, ConfigError> {
        if self.num_bars == 0 {
            return Err(ConfigError::NoBars);
        }
        if self.num_bars > MAX_BARS {
            return Err(ConfigError::TooManyBars {
                bars: self.num_bars,
                max: MAX_BARS,
            });
        }
        if self.bar_width == 0 {
            return Err(ConfigError::ZeroBarWidth);
        }
        if self.num_lines == 0 {
            return Err(ConfigError::NoRows);
        }
        let max_rows = self.display_height.min(MAX_ROWS);
        if self.num_lines > max_rows {
            return Err(ConfigError::TooManyRows {
                rows: self.num_lines,
                max: max_rows,
            });
        }
        let frame_width = self.frame_width();
        let available = (self.display_width as usize).min(MAX_COLUMNS);
        if frame_width > available {
            return Err(ConfigError::TooWide {
                needed: frame_width,
                available,
            });
        }
        if self.num_bands > MAX_BANDS {
            return Err(ConfigError::TooManyBands {
                bands: self.num_bands,
                max: MAX_BANDS,
            });
        }
        if self.band_skip >= self.num_bands {
            return Err(ConfigError::BandSkipTooLarge {
                skip: self.band_skip,
                bands: self.num_bands,
            });
        }
        if !(0.0..=1.0).contains(&self.linear_fraction) {
            return Err(ConfigError::InvalidLinearFraction);
        }
        if self.history_size == 0 || self.history_size > MAX_HISTORY {
            return Err(ConfigError::InvalidHistory {
                size: self.history_size,
                max: MAX_HISTORY,
            });
        }
        if self.group_size == 0 {
            return Err(ConfigError::InvalidGroupSize);
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ConfigError::InvalidMinScale);
        }

        Ok(Layout {
            num_bars: self.num_bars,
            num_lines: self.num_lines,
            bar_width: self.bar_width as usize,
            skip_columns: self.skip_columns as usize,
            num_bands: self.num_bands,
            band_skip: self.band_skip,
            linear_fraction: self.linear_fraction,
            frame_width,
            history_size: self.history_size,
            group_size: self.group_size,
            min_scale: self.min_scale,
        })
    }

    /// Full validation, including the logarithmic base derivation.
    ///
    /// Under [`LayoutPolicy::Degrade`] an infeasible base is accepted, as
    /// the compositor falls back to the degraded allocation.
    pub fn validate(&self) -> Result<Layout, ConfigError> {
        let layout = self.check_layout()?;
        match LogScale::derive(
            layout.num_bars,
            layout.usable_bands(),
            layout.linear_fraction,
        ) {
            Ok(_) => Ok(layout),
            Err(ConfigError::InsufficientBands { .. })
                if self.layout_policy == LayoutPolicy::Degrade =>
            {
                Ok(layout)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let layout = GraphConfig::default().validate().unwrap();
        assert_eq!(layout.num_bars, 8);
        assert_eq!(layout.frame_width, 8 * 4 - 1);
        assert_eq!(layout.usable_bands(), 63);
        assert_eq!(layout.column_of(2), 8);
    }

    #[test]
    fn test_frame_width_has_no_trailing_gap() {
        let config = GraphConfig::configure(4, 8, 2, 3, 1, 0.8);
        assert_eq!(config.frame_width(), 4 * 5 - 3);
        let config = GraphConfig::configure(1, 8, 2, 3, 1, 0.8);
        assert_eq!(config.frame_width(), 2);
    }

    #[test]
    fn test_bars_must_fit_display_width() {
        let mut config = GraphConfig::configure(16, 8, 3, 1, 1, 0.8);
        config.num_bands = 512;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooWide {
                needed: 63,
                available: 32
            })
        );
        config.display_width = 64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rows_limited_by_display_and_mask() {
        let config = GraphConfig::configure(8, 9, 3, 1, 1, 0.8);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyRows { rows: 9, max: 8 })
        );

        let mut config = GraphConfig::configure(8, 33, 3, 1, 1, 0.8);
        config.display_height = 64;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyRows { rows: 33, max: 32 })
        );
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert_eq!(
            GraphConfig::configure(0, 8, 3, 1, 1, 0.8).validate(),
            Err(ConfigError::NoBars)
        );
        assert_eq!(
            GraphConfig::configure(8, 0, 3, 1, 1, 0.8).validate(),
            Err(ConfigError::NoRows)
        );
        assert_eq!(
            GraphConfig::configure(8, 8, 0, 1, 1, 0.8).validate(),
            Err(ConfigError::ZeroBarWidth)
        );
        assert_eq!(
            GraphConfig::configure(8, 8, 3, 1, 64, 0.8).validate(),
            Err(ConfigError::BandSkipTooLarge { skip: 64, bands: 64 })
        );
        assert_eq!(
            GraphConfig::configure(8, 8, 3, 1, 1, 1.5).validate(),
            Err(ConfigError::InvalidLinearFraction)
        );
        assert_eq!(
            GraphConfig::configure(8, 8, 3, 1, 1, f32::NAN).validate(),
            Err(ConfigError::InvalidLinearFraction)
        );

        let mut config = GraphConfig::default();
        config.history_size = MAX_HISTORY + 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHistory {
                size: MAX_HISTORY + 1,
                max: MAX_HISTORY
            })
        );

        let mut config = GraphConfig::default();
        config.group_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGroupSize));

        let mut config = GraphConfig::default();
        config.min_scale = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinScale));
    }

    #[test]
    fn test_too_many_bars_for_bands() {
        let mut config = GraphConfig::configure(30, 8, 1, 0, 2, 0.5);
        config.num_bands = 32;
        config.layout_policy = LayoutPolicy::Strict;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InsufficientBands { bars: 30, bands: 30 })
        );
        // the structural checks alone still pass
        assert!(config.check_layout().is_ok());
    }

    #[test]
    fn test_degrade_policy_accepts_too_few_bands() {
        let mut config = GraphConfig::configure(30, 8, 1, 0, 2, 0.5);
        config.num_bands = 32;
        config.layout_policy = LayoutPolicy::Degrade;
        let layout = config.validate().unwrap();
        assert_eq!(layout.num_bars, 30);

        // structural errors stay fatal
        config.num_lines = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoRows));
    }
}
