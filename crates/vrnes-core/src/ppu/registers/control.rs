use bitflags::bitflags;

bitflags! {
    /// Control register 1, written through `$2000`.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N - H B S V t t
    /// ```
    /// `t t` picks the name table whose address is copied into the scroll
    /// registers; the remaining bits gate the render and address logic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Control: u8 {
        const NAME_TABLE_SELECT = 0b0000_0011;
        /// `$2007` steps by a full row of tiles.
        const VERTICAL_WRITE = 0b0000_0100;
        /// 8x8 sprites read their tiles from `$1000`.
        const SPRITE_PATTERN_HIGH = 0b0000_1000;
        /// Background tiles come from `$1000`.
        const BACKGROUND_PATTERN_HIGH = 0b0001_0000;
        const TALL_SPRITES = 0b0010_0000;
        /// Unused by this core; kept so the byte round-trips.
        const EXT_PINS = 0b0100_0000;
        const NMI_ON_VBLANK = 0b1000_0000;
    }
}

impl Control {
    pub(crate) fn nametable_index(self) -> u8 {
        (self & Control::NAME_TABLE_SELECT).bits()
    }

    pub(crate) fn vram_increment(self) -> u16 {
        match self.contains(Control::VERTICAL_WRITE) {
            true => 32,
            false => 1,
        }
    }

    /// Tile index offset applied to background pattern fetches.
    pub(crate) fn background_tile_base(self) -> usize {
        usize::from(self.contains(Control::BACKGROUND_PATTERN_HIGH)) * 256
    }

    /// Tile index offset for 8x8 sprites. Tall sprites pick their table
    /// from bit 0 of the tile number instead.
    pub(crate) fn sprite_tile_base(self) -> usize {
        usize::from(self.contains(Control::SPRITE_PATTERN_HIGH)) * 256
    }

    pub(crate) fn use_8x16_sprites(self) -> bool {
        self.contains(Control::TALL_SPRITES)
    }

    pub(crate) fn nmi_enabled(self) -> bool {
        self.contains(Control::NMI_ON_VBLANK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_bases_follow_bits_three_and_four() {
        let control = Control::from_bits_retain(0b0001_0000);
        assert_eq!(control.background_tile_base(), 256);
        assert_eq!(control.sprite_tile_base(), 0);
        assert_eq!(Control::from_bits_retain(0x08).sprite_tile_base(), 256);
    }

    #[test]
    fn name_table_bits_and_increment() {
        let control = Control::from_bits_retain(0x86);
        assert_eq!(control.nametable_index(), 2);
        assert_eq!(control.vram_increment(), 32);
        assert!(control.nmi_enabled());
        assert!(!control.use_8x16_sprites());
    }
}
