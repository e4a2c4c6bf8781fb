use serde::{Deserialize, Serialize};

use crate::{cartridge::Mirroring, memory::ppu as ppu_mem};

/// Address translation for the 15-bit PPU address space.
///
/// Every address resolves to the backing byte it aliases. The table also
/// records which physical [`super::NameTable`] each of the four logical
/// name table quadrants uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MirrorTable {
    map: Vec<u16>,
    quadrants: [u8; 4],
}

impl Default for MirrorTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl MirrorTable {
    pub fn identity() -> Self {
        Self {
            map: (0..ppu_mem::VRAM_SIZE as u16).collect(),
            quadrants: [0, 1, 2, 3],
        }
    }

    /// Builds the table for a name table layout.
    pub fn build(mode: Mirroring) -> Self {
        let mut table = Self::identity();
        let nt = |n: u16| ppu_mem::NAMETABLE_BASE + n * ppu_mem::NAMETABLE_SIZE;
        let size = ppu_mem::NAMETABLE_SIZE;

        match mode {
            Mirroring::Horizontal => {
                table.quadrants = [0, 0, 1, 1];
                table.define_region(nt(1), nt(0), size);
                table.define_region(nt(3), nt(2), size);
            }
            Mirroring::Vertical => {
                table.quadrants = [0, 1, 0, 1];
                table.define_region(nt(2), nt(0), size);
                table.define_region(nt(3), nt(1), size);
            }
            Mirroring::SingleScreenLower => {
                table.quadrants = [0; 4];
                for n in 1..4 {
                    table.define_region(nt(n), nt(0), size);
                }
            }
            Mirroring::SingleScreenUpper => {
                table.quadrants = [1; 4];
                for n in [0, 2, 3] {
                    table.define_region(nt(n), nt(1), size);
                }
            }
            Mirroring::FourScreen => {}
        }

        // $3000-$3EFF follows whatever $2000-$2EFF resolved to.
        for i in 0..ppu_mem::NAMETABLE_MIRROR_LEN {
            let target = table.resolve(ppu_mem::NAMETABLE_BASE + i);
            table.map[usize::from(ppu_mem::NAMETABLE_MIRROR_BASE + i)] = target;
        }
        let palette_end = ppu_mem::UPPER_MIRROR_BASE;
        for addr in (ppu_mem::PALETTE_BASE + ppu_mem::PALETTE_RAM_SIZE)..palette_end {
            table.map[usize::from(addr)] =
                ppu_mem::PALETTE_BASE + (addr & (ppu_mem::PALETTE_RAM_SIZE - 1));
        }
        for addr in 0..ppu_mem::UPPER_MIRROR_BASE {
            table.map[usize::from(addr + ppu_mem::UPPER_MIRROR_BASE)] = table.map[usize::from(addr)];
        }
        table
    }

    fn define_region(&mut self, from: u16, to: u16, size: u16) {
        for i in 0..size {
            self.map[usize::from(from + i)] = to + i;
        }
    }

    /// Backing address for `addr`; bits above the 15-bit space are dropped.
    #[inline]
    pub fn resolve(&self, addr: u16) -> u16 {
        self.map[usize::from(addr & ppu_mem::VRAM_ADDR_MASK)]
    }

    /// Every address of the 15-bit space has an entry and every quadrant
    /// points at one of the four physical tables.
    pub(crate) fn is_complete(&self) -> bool {
        self.map.len() == ppu_mem::VRAM_SIZE
            && self.map.iter().all(|&a| usize::from(a) < ppu_mem::VRAM_SIZE)
            && self.quadrants.iter().all(|&q| q < 4)
    }

    /// Physical name table used by logical quadrant `n` (0..3).
    #[inline]
    pub fn quadrant(&self, n: usize) -> usize {
        usize::from(self.quadrants[n & 3])
    }
}
