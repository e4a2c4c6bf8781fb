use serde::{Deserialize, Serialize};

/// One decoded 8×8 pattern tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// 2-bit color index per pixel, row-major.
    pix: Vec<u8>,
    /// Row has no transparent pixel.
    opaque: [bool; 8],
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            pix: vec![0; 64],
            opaque: [false; 8],
        }
    }
}

/// Source window and placement for drawing one sprite tile.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpriteBlit {
    /// Inclusive-exclusive tile-local rows to draw.
    pub(crate) src_y: (i32, i32),
    /// Screen position of the tile's top-left pixel.
    pub(crate) dx: i32,
    pub(crate) dy: i32,
    /// Sprite palette offset (select × 4).
    pub(crate) palette_offset: u8,
    pub(crate) flip_h: bool,
    pub(crate) flip_v: bool,
    /// Sprite slot, lower slots win overlaps.
    pub(crate) priority: u16,
}

impl Tile {
    /// Decodes row `y` from its two bit-planes.
    pub fn set_scanline(&mut self, y: usize, low: u8, high: u8) {
        let row = &mut self.pix[y * 8..y * 8 + 8];
        for (x, px) in row.iter_mut().enumerate() {
            let bit = 7 - x;
            *px = ((low >> bit) & 1) | (((high >> bit) & 1) << 1);
        }
        self.opaque[y] = row.iter().all(|&p| p != 0);
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.pix.len() == 64 && self.pix.iter().all(|&p| p < 4)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pix[(y << 3) + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.pix[y * 8..y * 8 + 8]
    }

    #[inline]
    pub fn row_opaque(&self, y: usize) -> bool {
        self.opaque[y]
    }

    /// Draws the tile as a sprite into `frame`.
    ///
    /// A pixel is written when it is not transparent and no lower sprite slot
    /// already claimed it; the slot number is then stored in the low byte of
    /// `mask` while the background bit is kept.
    pub(crate) fn render(&self, blit: SpriteBlit, frame: &mut [u32], mask: &mut [u16], palette: &[u32; 16]) {
        if blit.dx < -7 || blit.dx >= 256 || blit.dy < -7 || blit.dy >= 240 {
            return;
        }
        for ty in blit.src_y.0.max(0)..blit.src_y.1.min(8) {
            let sy = blit.dy + ty;
            if !(0..240).contains(&sy) {
                continue;
            }
            let row = (if blit.flip_v { 7 - ty } else { ty }) as usize;
            for tx in 0..8 {
                let sx = blit.dx + tx;
                if !(0..256).contains(&sx) {
                    continue;
                }
                let col = (if blit.flip_h { 7 - tx } else { tx }) as usize;
                let px = self.pix[row * 8 + col];
                if px == 0 {
                    continue;
                }
                let idx = (sy as usize) * 256 + sx as usize;
                if blit.priority <= (mask[idx] & 0xFF) {
                    frame[idx] = palette[usize::from(px + blit.palette_offset) & 0xF];
                    mask[idx] = (mask[idx] & 0xF00) | blit.priority;
                }
            }
        }
    }
}
