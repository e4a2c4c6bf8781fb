use super::{Ppu, buffer::BG_OPAQUE};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

const TILES_PER_ROW: usize = 32;

impl Ppu {
    /// Fetches one background row into the background buffer and advances
    /// the vertical scroll counters.
    ///
    /// Coarse X and the horizontal name table bit are reloaded from the
    /// latched registers before the fetch and restored after it. Tile and
    /// attribute fetches are reused from the previous row until coarse Y
    /// moves.
    pub(super) fn render_background_row(&mut self, row: i32) {
        let latched = self.regs.vram.t;
        self.regs.vram.v.copy_horizontal(latched);

        if (0..SCREEN_HEIGHT as i32).contains(&row) {
            let base_tile = self.regs.control.background_tile_base();
            let fine_x = i32::from(self.regs.vram.x);
            let fine_y = usize::from(self.regs.vram.v.fine_y());
            let line_start = row as usize * SCREEN_WIDTH;

            for slot in 0..TILES_PER_ROW {
                let (tile_index, palette_offset) = if self.valid_tile_data {
                    (usize::from(self.row_tiles[slot]), self.row_attribs[slot])
                } else {
                    let v = self.regs.vram.v;
                    let table = &self.name_tables[self.mirror.quadrant(usize::from(v.nametable()))];
                    let (cx, cy) = (usize::from(v.coarse_x()), usize::from(v.coarse_y()));
                    let index = base_tile + usize::from(table.get_tile_index(cx, cy));
                    let offset = table.palette_offset(cx, cy);
                    self.row_tiles[slot] = index as u16;
                    self.row_attribs[slot] = offset;
                    (index, offset)
                };

                let x = (slot as i32) * 8 - fine_x;
                if x > -8 {
                    let tile = &self.tiles[tile_index];
                    let opaque = tile.row_opaque(fine_y);
                    let skip = (-x).max(0) as usize;
                    for (sx, &px) in tile.row(fine_y).iter().enumerate().skip(skip) {
                        if opaque || px != 0 {
                            let idx = line_start + (x + sx as i32) as usize;
                            self.buffers.background[idx] = self.image_palette[usize::from(px + palette_offset)];
                            self.buffers.mask[idx] |= BG_OPAQUE;
                        }
                    }
                }

                let v = &mut self.regs.vram.v;
                if v.coarse_x() == 31 {
                    v.set_coarse_x(0);
                    v.toggle_nametable_h();
                } else {
                    v.set_coarse_x(v.coarse_x() + 1);
                }
            }
            self.valid_tile_data = true;
            self.regs.vram.v.copy_horizontal(latched);
        }

        if self.regs.vram.v.increment_fine_y() {
            self.valid_tile_data = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;

    fn solid_tile(ppu: &mut Ppu, index: usize, low: u8, high: u8) {
        let mut bytes = [0u8; 16];
        bytes[..8].fill(low);
        bytes[8..].fill(high);
        ppu.load_pattern_bank((index * 16) as u16, &bytes);
    }

    #[test]
    fn fine_x_shifts_the_row_left() {
        let mut ppu = Ppu::default();
        solid_tile(&mut ppu, 1, 0xFF, 0);
        ppu.name_tables[0].write_tile_index(1, 1);
        ppu.image_palette[1] = 0xABCDEF;
        ppu.regs.vram.x = 3;

        ppu.render_background_row(0);
        let mask = &ppu.buffers.mask;
        assert_eq!(mask[4] & BG_OPAQUE, 0);
        assert_ne!(mask[5] & BG_OPAQUE, 0);
        assert_ne!(mask[12] & BG_OPAQUE, 0);
        assert_eq!(mask[13] & BG_OPAQUE, 0);
        assert_eq!(ppu.buffers.background[5], 0xABCDEF);
    }

    #[test]
    fn coarse_x_wraps_into_the_neighbor_table() {
        let mut ppu = Ppu::default();
        ppu.set_mirroring(Mirroring::Vertical);
        solid_tile(&mut ppu, 2, 0, 0xFF);
        // Physical table 1 holds the right-hand screen.
        ppu.name_tables[1].write_tile_index(0, 2);
        ppu.regs.vram.t.set_coarse_x(31);

        ppu.render_background_row(0);
        assert_ne!(ppu.buffers.mask[8] & BG_OPAQUE, 0);
        assert_eq!(ppu.buffers.mask[0] & BG_OPAQUE, 0);
        assert_eq!(ppu.regs.vram.v.coarse_x(), 31);
        assert!(!ppu.regs.vram.v.nametable_h());
    }

    #[test]
    fn tile_cache_survives_until_coarse_y_moves() {
        let mut ppu = Ppu::default();
        for row in 0..7 {
            ppu.render_background_row(row);
            assert!(ppu.valid_tile_data, "row {row}");
        }
        ppu.render_background_row(7);
        assert!(!ppu.valid_tile_data);
        assert_eq!(ppu.regs.vram.v.coarse_y(), 1);
        assert_eq!(ppu.regs.vram.v.fine_y(), 0);
    }

    #[test]
    fn rows_past_the_frame_only_move_the_counters() {
        let mut ppu = Ppu::default();
        ppu.render_background_row(240);
        assert_eq!(ppu.regs.vram.v.fine_y(), 1);
        assert!(!ppu.valid_tile_data);
    }
}
