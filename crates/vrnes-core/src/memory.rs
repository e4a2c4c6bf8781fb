//! Shared definitions for the NES memory map.
//!
//! Address constants live here so the PPU, the mappers and the console agree on
//! one layout.

/// CPU memory map details.
pub mod cpu {
    /// Size of the flat CPU address space backing store.
    pub const ADDRESS_SPACE_SIZE: usize = 0x1_0000;

    /// Size of the CPU internal RAM block (2 KiB mirrored through `$1FFF`).
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    /// Mask applied to mirror CPU RAM accesses within `$0000-$1FFF`.
    pub const INTERNAL_RAM_MASK: u16 = (INTERNAL_RAM_SIZE as u16) - 1;
    /// Last mirrored internal RAM address visible to the CPU (`$1FFF`).
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;

    /// First CPU address mapped to the PPU register mirror.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    /// Last CPU address mirrored to the PPU register set.
    pub const PPU_REGISTER_END: u16 = 0x3FFF;

    /// Sprite DMA register (`$4014`).
    pub const SPRITE_DMA: u16 = 0x4014;
    /// End of the APU / controller / test-mode I/O window.
    pub const IO_END: u16 = 0x401F;

    /// First address handled by the cartridge.
    pub const CARTRIDGE_SPACE_BASE: u16 = 0x4020;
    /// PRG RAM window start address (`$6000`).
    pub const PRG_RAM_START: u16 = 0x6000;
    /// PRG RAM window end address (inclusive).
    pub const PRG_RAM_END: u16 = 0x7FFF;
    /// PRG RAM window size.
    pub const PRG_RAM_SIZE: usize = 0x2000;
    /// PRG ROM window start address (`$8000`).
    pub const PRG_ROM_START: u16 = 0x8000;
    /// Second 16 KiB PRG window (`$C000`).
    pub const PRG_ROM_UPPER: u16 = 0xC000;

    /// CPU cycles the sprite DMA steals from the CPU.
    pub const SPRITE_DMA_HALT_CYCLES: u32 = 513;
}

/// PPU address space layout.
pub mod ppu {
    /// Size of the PPU backing store (`$0000-$7FFF`, upper half mirrors).
    pub const VRAM_SIZE: usize = 0x8000;
    /// Mask applied to internal VRAM addresses.
    pub const VRAM_ADDR_MASK: u16 = 0x7FFF;

    /// Total size of both pattern tables ($0000-$1FFF = 8 KiB).
    pub const CHR_SIZE: usize = 0x2000;
    /// Size of a single pattern table (4 KiB).
    pub const PATTERN_TABLE_SIZE: usize = 0x1000;
    /// Bytes per decoded tile.
    pub const TILE_BYTES: usize = 16;
    /// Number of tiles in both pattern tables.
    pub const TILE_COUNT: usize = CHR_SIZE / TILE_BYTES;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Offset of the attribute table inside a nametable.
    pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;
    /// First address of the `$3000-$3EFF` nametable mirror.
    pub const NAMETABLE_MIRROR_BASE: u16 = 0x3000;
    /// Length of the `$3000-$3EFF` nametable mirror.
    pub const NAMETABLE_MIRROR_LEN: u16 = 0x0F00;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Sprite half of palette RAM (`$3F10`).
    pub const SPRITE_PALETTE_BASE: u16 = 0x3F10;
    /// Palette RAM byte count (32 bytes mirrored every 32 bytes).
    pub const PALETTE_RAM_SIZE: u16 = 0x20;

    /// Upper half of the address space mirrors `$0000-$3FFF`.
    pub const UPPER_MIRROR_BASE: u16 = 0x4000;

    /// Sprite memory byte count.
    pub const SPRITE_RAM_SIZE: usize = 0x100;
    /// Number of sprite slots.
    pub const SPRITE_COUNT: usize = 64;

    /// CPU-visible PPU register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000`: control register 1.
        Control = 0x2000,
        /// `$2001`: control register 2 (mask).
        Mask = 0x2001,
        /// `$2002`: status register.
        Status = 0x2002,
        /// `$2003`: sprite memory address.
        SpriteAddr = 0x2003,
        /// `$2004`: sprite memory data.
        SpriteData = 0x2004,
        /// `$2005`: scroll.
        Scroll = 0x2005,
        /// `$2006`: VRAM address.
        Addr = 0x2006,
        /// `$2007`: VRAM data.
        Data = 0x2007,
        /// `$4014`: sprite DMA.
        SpriteDma = 0x4014,
    }

    impl Register {
        /// Decodes a CPU address into a PPU register, following the
        /// eight-byte mirror of `$2000-$3FFF`.
        pub fn from_cpu_addr(addr: u16) -> Option<Self> {
            if addr == Self::SpriteDma as u16 {
                return Some(Self::SpriteDma);
            }
            if !(0x2000..=0x3FFF).contains(&addr) {
                return None;
            }
            Some(match addr & 0x0007 {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::SpriteAddr,
                4 => Self::SpriteData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ppu::Register;

    #[test]
    fn register_decode_follows_mirrors() {
        assert_eq!(Register::from_cpu_addr(0x2002), Some(Register::Status));
        assert_eq!(Register::from_cpu_addr(0x3FFE), Some(Register::Addr));
        assert_eq!(Register::from_cpu_addr(0x4014), Some(Register::SpriteDma));
        assert_eq!(Register::from_cpu_addr(0x4015), None);
        assert_eq!(Register::from_cpu_addr(0x1FFF), None);
    }
}
