#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::MAX_ROWS;
use crate::types::RowMask;

/// Mask with the low `rows` bits set.
pub const fn full_mask(rows: u8) -> RowMask {
    if rows as u32 >= RowMask::BITS {
        RowMask::MAX
    } else {
        (1 << rows) - 1
    }
}

/// Encodes a normalized bar height as a solid run of rows from the bottom.
///
/// Heights at or above `num_rows` saturate, negative and NaN heights light
/// nothing.
pub fn encode(height: f32, num_rows: u8) -> RowMask {
    let num_rows = num_rows.min(MAX_ROWS);
    if !(height > 0.0) {
        return 0;
    }
    if height >= num_rows as f32 {
        return full_mask(num_rows);
    }
    full_mask(height.floor() as u8)
}

pub fn lit_rows(mask: RowMask) -> u32 {
    mask.count_ones()
}
