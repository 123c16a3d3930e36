/// Empty braille pattern (U+2800)
pub const BLANK: char = '\u{2800}';

/// Braille canvas: each terminal cell holds a 2×4 dot grid.
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Row-major dot bits, one byte per cell
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// `width` × `height` in terminal cells; dot resolution is twice/four times that
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dot bit for a position inside a cell:
    /// ```text
    /// 0x01 0x08
    /// 0x02 0x10
    /// 0x04 0x20
    /// 0x40 0x80
    /// ```
    #[inline(always)]
    fn dot_bit(dx: usize, dy: usize) -> u8 {
        const BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];
        BITS[dy][dx]
    }

    /// Set a dot; coordinates off the canvas (including negative ones) are ignored
    pub fn set(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= Self::dot_bit(x % 2, y % 4);
    }

    /// Glyph for cell (col, row), `None` if nothing was drawn there
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(BLANK as u32 + bits as u32),
        }
    }

    /// One row as a string, blank cells included
    pub fn row_string(&self, row: usize) -> String {
        (0..self.width)
            .map(|col| self.glyph(col, row).unwrap_or(BLANK))
            .collect()
    }
}
