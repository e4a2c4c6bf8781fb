use bitflags::bitflags;

bitflags! {
    /// PPU control register 2 (`$2001`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// B G R S B s b g
    /// ```
    /// - `g`: monochrome display
    /// - `b`: show background in leftmost 8 pixels
    /// - `s`: show sprites in leftmost 8 pixels
    /// - `B`: background enable
    /// - `S`: sprite enable
    /// - `R/G/B`: color emphasis bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Mask: u8 {
        const MONOCHROME = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        const SHOW_BACKGROUND = 0b0000_1000;
        const SHOW_SPRITES = 0b0001_0000;
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl Mask {
    /// Returns `true` when either background or sprite rendering is enabled.
    pub(crate) fn rendering_enabled(self) -> bool {
        self.intersects(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }

    pub(crate) fn background_visible(self) -> bool {
        self.contains(Mask::SHOW_BACKGROUND)
    }

    pub(crate) fn sprites_visible(self) -> bool {
        self.contains(Mask::SHOW_SPRITES)
    }

    pub(crate) fn monochrome(self) -> bool {
        self.contains(Mask::MONOCHROME)
    }

    /// Emphasis bits as a 3-bit value: red bit 0, green bit 1, blue bit 2.
    pub(crate) fn emphasis(self) -> u8 {
        self.bits() >> 5
    }

    /// Either layer is hidden in the leftmost 8 columns.
    pub(crate) fn clips_left_column(self) -> bool {
        !self.contains(Mask::SHOW_BACKGROUND_LEFT | Mask::SHOW_SPRITES_LEFT)
    }
}
