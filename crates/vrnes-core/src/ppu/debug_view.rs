//! Inspection renderers for debugger front ends.

use super::Ppu;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH, cartridge::Mirroring};

/// Width of the pattern table view (two 128-pixel tables side by side).
pub const PATTERN_VIEW_WIDTH: usize = 256;
/// Height of the pattern table view.
pub const PATTERN_VIEW_HEIGHT: usize = 128;

fn put(out: &mut [u32], x: usize, y: usize, color: u32) {
    if let Some(slot) = out.get_mut(y * SCREEN_WIDTH + x) {
        *slot = color;
    }
}

impl Ppu {
    /// Draws both pattern tables, 16×16 tiles each, with the sprite
    /// palette into a 256×128 buffer.
    pub fn render_pattern_tables(&self, out: &mut [u32]) {
        for (index, tile) in self.tiles.iter().enumerate() {
            let within = index % 256;
            let ox = (index / 256) * 128 + (within % 16) * 8;
            let oy = (within / 16) * 8;
            for y in 0..8 {
                for x in 0..8 {
                    let color = self.sprite_palette[usize::from(tile.pixel(x, y))];
                    put(out, ox + x, oy + y, color);
                }
            }
        }
    }

    /// Draws the four logical name tables at half scale into a 256×240
    /// buffer. Mirrored layouts render the unique tables once and copy them.
    pub fn render_name_tables(&self, out: &mut [u32]) {
        let base_tile = self.regs.control.background_tile_base();
        let (columns, rows) = match self.mirroring {
            Some(Mirroring::Horizontal) => (1, 2),
            Some(Mirroring::Vertical) => (2, 1),
            _ => (2, 2),
        };
        let half_w = SCREEN_WIDTH / 2;
        let half_h = SCREEN_HEIGHT / 2;

        for nty in 0..rows {
            for ntx in 0..columns {
                let table = &self.name_tables[self.mirror.quadrant(nty * 2 + ntx)];
                let (ox, oy) = (ntx * half_w, nty * half_h);
                for ty in 0..30 {
                    for tx in 0..32 {
                        let tile = &self.tiles[base_tile + usize::from(table.get_tile_index(tx, ty))];
                        let offset = table.palette_offset(tx, ty);
                        for y in 0..4 {
                            for x in 0..4 {
                                let px = tile.pixel(x * 2, y * 2);
                                let color = if px == 0 {
                                    self.image_palette[0]
                                } else {
                                    self.image_palette[usize::from(px + offset)]
                                };
                                put(out, ox + tx * 4 + x, oy + ty * 4 + y, color);
                            }
                        }
                    }
                }
            }
        }

        if out.len() < SCREEN_WIDTH * SCREEN_HEIGHT {
            return;
        }
        if columns == 1 {
            for y in 0..SCREEN_HEIGHT {
                let line = y * SCREEN_WIDTH;
                out.copy_within(line..line + half_w, line + half_w);
            }
        }
        if rows == 1 {
            out.copy_within(0..half_h * SCREEN_WIDTH, half_h * SCREEN_WIDTH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_pattern_table_starts_at_column_128() {
        let mut ppu = Ppu::default();
        let mut bytes = [0u8; 16];
        bytes[0] = 0x80;
        ppu.load_pattern_bank(0x1000, &bytes);
        ppu.sprite_palette[1] = 0xFFFFFF;

        let mut out = vec![0u32; PATTERN_VIEW_WIDTH * PATTERN_VIEW_HEIGHT];
        ppu.render_pattern_tables(&mut out);
        assert_eq!(out[128], 0xFFFFFF);
        assert_eq!(out[129], ppu.sprite_palette[0]);
    }

    #[test]
    fn vertical_layout_repeats_the_top_half() {
        let mut ppu = Ppu::default();
        ppu.set_mirroring(Mirroring::Vertical);
        ppu.load_pattern_bank(16, &[0xFF; 8]);
        ppu.name_tables[1].write_tile_index(0, 1);
        ppu.image_palette[1] = 0x123456;

        let mut out = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
        ppu.render_name_tables(&mut out);
        assert_eq!(out[128], 0x123456);
        assert_eq!(out[120 * SCREEN_WIDTH + 128], 0x123456);
        assert_eq!(out[0], ppu.image_palette[0]);
    }
}
