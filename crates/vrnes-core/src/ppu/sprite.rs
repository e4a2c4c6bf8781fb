use bitflags::bitflags;

use crate::memory::ppu::SPRITE_COUNT;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    /// - `V`: Vertical flip
    /// - `H`: Horizontal flip
    /// - `P`: Priority (behind background when set)
    /// - `p`: Sprite palette select (0..=3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SpriteAttributes: u8 {
        const PALETTE = 0b0000_0011;
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;
        const FLIP_HORIZONTAL = 0b0100_0000;
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

/// Decoded sprite memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sprite {
    pub x: i32,
    /// Raw Y byte; the sprite is drawn one row lower.
    pub y: i32,
    pub tile: u8,
    /// Palette select × 4.
    pub palette_offset: u8,
    pub flip_h: bool,
    pub flip_v: bool,
    pub behind_background: bool,
}

/// Structured view of sprite memory, updated on every byte written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteTable {
    sprites: [Sprite; SPRITE_COUNT],
}

impl Default for SpriteTable {
    fn default() -> Self {
        Self {
            sprites: [Sprite::default(); SPRITE_COUNT],
        }
    }
}

impl SpriteTable {
    /// Decodes one byte of sprite memory into its entry.
    pub fn write(&mut self, addr: u8, value: u8) {
        let sprite = &mut self.sprites[usize::from(addr >> 2)];
        match addr & 3 {
            0 => sprite.y = i32::from(value),
            1 => sprite.tile = value,
            2 => {
                let attrs = SpriteAttributes::from_bits_retain(value);
                sprite.flip_v = attrs.contains(SpriteAttributes::FLIP_VERTICAL);
                sprite.flip_h = attrs.contains(SpriteAttributes::FLIP_HORIZONTAL);
                sprite.behind_background = attrs.contains(SpriteAttributes::PRIORITY_BEHIND_BACKGROUND);
                sprite.palette_offset = (attrs & SpriteAttributes::PALETTE).bits() << 2;
            }
            _ => sprite.x = i32::from(value),
        }
    }

    /// Re-decodes every entry from raw sprite memory.
    pub fn rebuild(&mut self, memory: &[u8]) {
        for (addr, &value) in memory.iter().enumerate().take(SPRITE_COUNT * 4) {
            self.write(addr as u8, value);
        }
    }

    pub fn get(&self, slot: usize) -> &Sprite {
        &self.sprites[slot]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_byte_decodes_all_flags() {
        let mut table = SpriteTable::default();
        table.write(4 * 3 + 2, 0b1110_0010);
        let sprite = table.get(3);
        assert!(sprite.flip_v && sprite.flip_h && sprite.behind_background);
        assert_eq!(sprite.palette_offset, 8);

        table.write(4 * 3 + 3, 200);
        table.write(4 * 3, 17);
        assert_eq!((table.get(3).x, table.get(3).y), (200, 17));
    }
}
