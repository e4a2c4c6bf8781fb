use bitflags::bitflags;

bitflags! {
    /// Status register, read through `$2002`. Only the top bits are driven
    /// and the low five read as zero.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Status: u8 {
        const IGNORE_VRAM_WRITES = 0b0001_0000;
        const SPRITE_LIMIT = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Cleared by the read that observes it.
        const VERTICAL_BLANK = 0b1000_0000;
    }
}
