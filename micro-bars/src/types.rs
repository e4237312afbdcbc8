use core::ops::Range;

use heapless::Vec;

use crate::config::{MAX_BARS, MAX_COLUMNS};

/// One bit per display row. Bit 0 is the bottom row.
pub type RowMask = u32;

/// Half-open range `[start, end)` of spectrum bins summarized by one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct BandRange {
    pub start: u16,
    pub end: u16,
}

impl BandRange {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

// One composed frame, one mask per display column
pub type Frame = Vec<RowMask, MAX_COLUMNS>;

pub type BandRanges = Vec<BandRange, MAX_BARS>;
