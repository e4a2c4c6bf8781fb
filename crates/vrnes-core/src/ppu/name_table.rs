use serde::{Deserialize, Serialize};

/// Tiles per name table row and column of the backing grid.
pub const NAME_TABLE_DIM: usize = 32;

/// One name table: tile indices plus the attribute field of every tile.
///
/// Attribute bytes are fanned out on write, so each tile cell stores its own
/// 2-bit palette select instead of sharing a byte with its neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameTable {
    width: usize,
    height: usize,
    tiles: Vec<u8>,
    attributes: Vec<u8>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new(NAME_TABLE_DIM, NAME_TABLE_DIM)
    }
}

impl NameTable {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![0; width * height],
            attributes: vec![0; width * height],
        }
    }

    /// Storage matches the declared grid size and every attribute is a
    /// 2-bit field.
    pub(crate) fn is_consistent(&self) -> bool {
        let cells = self.width * self.height;
        self.tiles.len() == cells
            && self.attributes.len() == cells
            && self.attributes.iter().all(|&a| a < 4)
    }

    #[inline]
    fn cell(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    pub fn get_tile_index(&self, x: usize, y: usize) -> u8 {
        self.cell(x, y).map_or(0, |i| self.tiles[i])
    }

    /// The 2-bit attribute field covering tile `(x, y)`.
    pub fn get_attribute(&self, x: usize, y: usize) -> u8 {
        self.cell(x, y).map_or(0, |i| self.attributes[i])
    }

    /// Palette offset (attribute × 4) used by the background renderer.
    #[inline]
    pub fn palette_offset(&self, x: usize, y: usize) -> u8 {
        self.get_attribute(x, y) << 2
    }

    pub fn write_tile_index(&mut self, index: usize, value: u8) {
        if let Some(slot) = self.tiles.get_mut(index) {
            *slot = value;
        }
    }

    /// Fans one attribute byte out to its 4×4 tile block.
    ///
    /// Field `n` (bits `2n..2n+1`) covers quadrant `(n % 2, n / 2)` of the
    /// block, each quadrant being 2×2 tiles.
    pub fn write_attribute(&mut self, index: usize, value: u8) {
        let base_x = (index % 8) * 4;
        let base_y = (index / 8) * 4;
        for quad_y in 0..2 {
            for quad_x in 0..2 {
                let field = (value >> (2 * (quad_y * 2 + quad_x))) & 0b11;
                for y in 0..2 {
                    for x in 0..2 {
                        let tx = base_x + quad_x * 2 + x;
                        let ty = base_y + quad_y * 2 + y;
                        if let Some(i) = self.cell(tx, ty) {
                            self.attributes[i] = field;
                        }
                    }
                }
            }
        }
    }
}
