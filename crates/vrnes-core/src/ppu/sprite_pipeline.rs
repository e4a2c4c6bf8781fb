use super::{Ppu, Sprite, buffer::BG_OPAQUE, tile::SpriteBlit};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH, memory::ppu::SPRITE_COUNT};

impl Ppu {
    #[inline]
    fn sprite_height(&self) -> i32 {
        if self.regs.control.use_8x16_sprites() { 16 } else { 8 }
    }

    /// First tile of the 8×16 pair: even index from the table picked by bit 0.
    #[inline]
    fn tall_sprite_base(sprite: &Sprite) -> usize {
        (usize::from(sprite.tile) & 0xFE) + (usize::from(sprite.tile) & 1) * 256
    }

    /// Draws every sprite of one priority class that overlaps rows
    /// `start..start + count`. Slot order is kept so lower slots win.
    pub(super) fn render_sprites(&mut self, start: i32, count: i32, behind_background: bool) {
        let height = self.sprite_height();
        let end = start + count;
        let sprite_base = self.regs.control.sprite_tile_base();

        for slot in 0..SPRITE_COUNT {
            let sprite = *self.sprites.get(slot);
            let top = sprite.y + 1;
            if sprite.behind_background != behind_background || top + height <= start || top >= end {
                continue;
            }

            let blit = SpriteBlit {
                src_y: (start - top, end - top),
                dx: sprite.x,
                dy: top,
                palette_offset: sprite.palette_offset,
                flip_h: sprite.flip_h,
                flip_v: sprite.flip_v,
                priority: slot as u16,
            };

            if height == 16 {
                let base = Self::tall_sprite_base(&sprite);
                let (upper, lower) = if sprite.flip_v { (base + 1, base) } else { (base, base + 1) };
                let lower_top = top + 8;
                self.draw_sprite_tile(upper, blit);
                self.draw_sprite_tile(
                    lower,
                    SpriteBlit {
                        src_y: (start - lower_top, end - lower_top),
                        dy: lower_top,
                        ..blit
                    },
                );
            } else {
                self.draw_sprite_tile(sprite_base + usize::from(sprite.tile), blit);
            }
        }
    }

    fn draw_sprite_tile(&mut self, index: usize, blit: SpriteBlit) {
        self.tiles[index].render(blit, &mut self.buffers.pixels, &mut self.buffers.mask, &self.sprite_palette);
    }

    /// Loose overlap test used before the exact sprite-0 check.
    pub(super) fn sprite0_covers(&self, row: i32) -> bool {
        let sprite = self.sprites.get(0);
        let top = sprite.y + 1;
        (-7..256).contains(&sprite.x) && top <= row && top + self.sprite_height() >= row
    }

    /// Looks for the first sprite-0 pixel on `row` that lands on opaque
    /// background and records its position.
    ///
    /// The previous position is cleared first, so a miss leaves no hit
    /// pending for this frame.
    pub(super) fn check_sprite0(&mut self, row: i32) -> bool {
        self.spr0_hit_x = -1;
        self.spr0_hit_y = -1;

        let sprite = *self.sprites.get(0);
        let height = self.sprite_height();
        let top = sprite.y + 1;
        if !(top..top + height).contains(&row)
            || !(-7..SCREEN_WIDTH as i32).contains(&sprite.x)
            || !(0..SCREEN_HEIGHT as i32).contains(&row)
        {
            return false;
        }

        let offset = row - top;
        let src_row = (if sprite.flip_v { height - 1 - offset } else { offset }) as usize;
        let tile_index = if height == 16 {
            Self::tall_sprite_base(&sprite) + src_row / 8
        } else {
            self.regs.control.sprite_tile_base() + usize::from(sprite.tile)
        };
        let pixels = self.tiles[tile_index].row(src_row % 8);
        let line_start = row as usize * SCREEN_WIDTH;

        for i in 0..8 {
            let x = sprite.x + i;
            if !(0..SCREEN_WIDTH as i32).contains(&x) {
                continue;
            }
            let col = (if sprite.flip_h { 7 - i } else { i }) as usize;
            if pixels[col] != 0 && self.buffers.mask[line_start + x as usize] & BG_OPAQUE != 0 {
                self.spr0_hit_x = x;
                self.spr0_hit_y = row;
                return true;
            }
        }
        false
    }
}
