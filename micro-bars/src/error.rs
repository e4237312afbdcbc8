use thiserror::Error;

/// Layout problems detected when a [`GraphConfig`](crate::GraphConfig) is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum ConfigError {
    #[error("at least one bar is required")]
    NoBars,
    #[error("{bars} bars exceed the capacity of {max}")]
    TooManyBars { bars: usize, max: usize },
    #[error("bar width must be at least one column")]
    ZeroBarWidth,
    #[error("frame needs {needed} columns but only {available} are available")]
    TooWide { needed: usize, available: usize },
    #[error("at least one row is required")]
    NoRows,
    #[error("{rows} rows exceed the limit of {max}")]
    TooManyRows { rows: u8, max: u8 },
    #[error("{bands} spectrum bands exceed the capacity of {max}")]
    TooManyBands { bands: usize, max: usize },
    #[error("skipping {skip} of {bands} bands leaves nothing to display")]
    BandSkipTooLarge { skip: usize, bands: usize },
    #[error("linear fraction must lie in [0, 1]")]
    InvalidLinearFraction,
    #[error("history size {size} outside 1..={max}")]
    InvalidHistory { size: usize, max: usize },
    #[error("group size must be at least one frame")]
    InvalidGroupSize,
    #[error("minimum scale must be positive and finite")]
    InvalidMinScale,
    #[error("{bars} bars cannot each get a distinct band out of {bands}")]
    InsufficientBands { bars: usize, bands: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum FrameError {
    #[error("output buffer holds {got} columns, frame needs {needed}")]
    BufferTooSmall { needed: usize, got: usize },
}
