use core::fmt::{self, Write};

use embedded_graphics::{draw_target::DrawTarget, geometry::Point, pixelcolor::BinaryColor, Pixel};

use crate::config::MAX_ROWS;
use crate::types::RowMask;

pub trait Renderer {
    fn draw<D: DrawTarget<Color = BinaryColor>>(
        &self,
        target: &mut D,
        columns: &[RowMask],
    ) -> Result<(), D::Error>;
}

/// Lights one pixel per set bit, row 0 at the bottom of the matrix.
pub struct LedMatrixRenderer {
    rows: u8,
    origin: Point,
}

impl LedMatrixRenderer {
    pub fn new(rows: u8) -> Self {
        Self {
            rows: rows.min(MAX_ROWS),
            origin: Point::zero(),
        }
    }

    /// Top-left corner of the graph on the target.
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }
}

impl Renderer for LedMatrixRenderer {
    fn draw<D>(&self, fb: &mut D, columns: &[RowMask]) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let rows = self.rows;
        let origin = self.origin;
        let pixels = columns.iter().enumerate().flat_map(move |(x, &mask)| {
            (0..rows)
                .filter(move |&row| mask & (1 << row) != 0)
                .map(move |row| {
                    let y = (rows - 1 - row) as i32;
                    Pixel(origin + Point::new(x as i32, y), BinaryColor::On)
                })
        });
        fb.draw_iter(pixels)
    }
}

/// Draws `columns` at the top-left corner of `target`.
pub fn draw_frame<D>(target: &mut D, columns: &[RowMask], rows: u8) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    LedMatrixRenderer::new(rows).draw(target, columns)
}

/// Writes a frame as text: the column masks in hex, then the graph with `#`
/// for lit rows, top row first, then a ruler.
pub fn write_frame<W: Write>(w: &mut W, columns: &[RowMask], rows: u8) -> fmt::Result {
    let rows = rows.min(MAX_ROWS);
    for (i, mask) in columns.iter().enumerate() {
        if i > 0 {
            w.write_char(' ')?;
        }
        write!(w, "{:02X}", mask)?;
    }
    w.write_char('\n')?;

    for row in (0..rows).rev() {
        for &mask in columns {
            w.write_char(if mask & (1 << row) != 0 { '#' } else { ' ' })?;
        }
        w.write_char('\n')?;
    }
    for _ in columns {
        w.write_char('-')?;
    }
    w.write_char('\n')
}
