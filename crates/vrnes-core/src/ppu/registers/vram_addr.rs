use std::fmt;

/// One packed field of the scroll address: `(mask, shift)`.
type Field = (u16, u16);

//  14 13 12 | 11 10 | 9 8 7 6 5 | 4 3 2 1 0
//  fine Y   | table | coarse Y  | coarse X
const COARSE_X: Field = (0x001F, 0);
const COARSE_Y: Field = (0x03E0, 5);
const NAME_TABLE: Field = (0x0C00, 10);
const FINE_Y: Field = (0x7000, 12);

const TABLE_H: u16 = 0x0400;
const TABLE_V: u16 = 0x0800;
const ADDR_BITS: u16 = 0x7FFF;

/// Packed 15-bit scroll position.
///
/// The same value doubles as the VRAM address used by `$2007`, so the five
/// fields and the address can never drift apart.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct VramAddr(pub(crate) u16);

impl VramAddr {
    #[inline]
    fn get(self, (mask, shift): Field) -> u8 {
        ((self.0 & mask) >> shift) as u8
    }

    #[inline]
    fn put(&mut self, (mask, shift): Field, value: u8) {
        self.0 = (self.0 & !mask) | ((u16::from(value) << shift) & mask);
    }

    /// Tile column within the name table (0..31).
    #[inline]
    pub fn coarse_x(self) -> u8 {
        self.get(COARSE_X)
    }

    #[inline]
    pub fn set_coarse_x(&mut self, value: u8) {
        self.put(COARSE_X, value);
    }

    /// Tile row; 30 and 31 address the attribute area.
    #[inline]
    pub fn coarse_y(self) -> u8 {
        self.get(COARSE_Y)
    }

    #[inline]
    pub fn set_coarse_y(&mut self, value: u8) {
        self.put(COARSE_Y, value);
    }

    /// Name table quadrant (0..3), vertical bit high, horizontal bit low.
    #[inline]
    pub fn nametable(self) -> u8 {
        self.get(NAME_TABLE)
    }

    #[inline]
    pub fn set_nametable(&mut self, value: u8) {
        self.put(NAME_TABLE, value);
    }

    #[inline]
    pub fn nametable_h(self) -> bool {
        self.0 & TABLE_H != 0
    }

    #[inline]
    pub fn toggle_nametable_h(&mut self) {
        self.0 ^= TABLE_H;
    }

    /// Pixel row inside the current tile (0..7).
    #[inline]
    pub fn fine_y(self) -> u8 {
        self.get(FINE_Y)
    }

    #[inline]
    pub fn set_fine_y(&mut self, value: u8) {
        self.put(FINE_Y, value);
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn set_raw(&mut self, value: u16) {
        self.0 = value & ADDR_BITS;
    }

    /// Moves past a `$2007` access.
    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & ADDR_BITS;
    }

    /// Reloads the horizontal scroll (coarse X and table H) from `latch`.
    #[inline]
    pub fn copy_horizontal(&mut self, latch: VramAddr) {
        let bits = COARSE_X.0 | TABLE_H;
        self.0 = (self.0 & !bits) | (latch.0 & bits);
    }

    /// Steps to the next pixel row. Row 29 rolls onto the other vertical
    /// name table, rows 30 and 31 roll to 0 in place. Returns `true` when
    /// the tile row changed.
    pub fn increment_fine_y(&mut self) -> bool {
        let fine = self.fine_y();
        if fine != 7 {
            self.set_fine_y(fine + 1);
            return false;
        }
        self.set_fine_y(0);
        let row = self.coarse_y();
        if row == 29 {
            self.0 ^= TABLE_V;
        }
        self.set_coarse_y(if row >= 29 { 0 } else { row + 1 });
        true
    }
}

impl fmt::Debug for VramAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VramAddr({:#06X}: table {} tile {},{} fine {})",
            self.0,
            self.nametable(),
            self.coarse_x(),
            self.coarse_y(),
            self.fine_y(),
        )
    }
}

impl From<u16> for VramAddr {
    #[inline]
    fn from(value: u16) -> Self {
        VramAddr(value & ADDR_BITS)
    }
}

impl From<VramAddr> for u16 {
    #[inline]
    fn from(addr: VramAddr) -> Self {
        addr.0
    }
}
