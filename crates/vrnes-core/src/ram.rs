use core::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    state::{StateReader, StateWriter},
};

/// Fixed-size byte store backing one address space.
///
/// Storage is always heap allocated; the CPU space alone is 64 KiB.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ram<const N: usize>(Box<[u8]>);

pub mod cpu {
    use crate::memory::cpu as cpu_mem;

    /// Flat CPU address space shared with the mapper bank windows.
    pub type AddressSpace = super::Ram<{ cpu_mem::ADDRESS_SPACE_SIZE }>;
}

pub mod ppu {
    use crate::memory::ppu as ppu_mem;

    /// Pattern, name table and palette memory.
    pub type Vram = super::Ram<{ ppu_mem::VRAM_SIZE }>;
    /// Sprite attribute memory.
    pub type SpriteRam = super::Ram<{ ppu_mem::SPRITE_RAM_SIZE }>;
}

#[derive(Serialize, Deserialize)]
struct RamState {
    bytes: Vec<u8>,
}

impl<const N: usize> Ram<N> {
    pub fn new() -> Self {
        Self(vec![0; N].into_boxed_slice())
    }

    /// Reads a byte. Addresses past the end read as zero.
    pub fn load(&self, addr: usize) -> u8 {
        self.0.get(addr).copied().unwrap_or(0)
    }

    /// Writes a byte. Addresses past the end are dropped.
    pub fn write(&mut self, addr: usize, value: u8) {
        if let Some(slot) = self.0.get_mut(addr) {
            *slot = value;
        }
    }

    /// Copies `data` starting at `addr`, truncated to the store size.
    pub fn write_slice(&mut self, addr: usize, data: &[u8]) {
        if addr >= N {
            return;
        }
        let len = data.len().min(N - addr);
        self.0[addr..addr + len].copy_from_slice(&data[..len]);
    }

    /// Clears the store to zero.
    pub fn reset(&mut self) {
        self.0.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        out.put(&RamState {
            bytes: self.0.to_vec(),
        })
    }

    /// Decodes a saved store without applying it.
    pub fn decode_state(input: &mut StateReader<'_>) -> Result<Self, Error> {
        let RamState { bytes } = input.take()?;
        let mut ram = Self::new();
        ram.write_slice(0, &bytes);
        Ok(ram)
    }

    pub fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        *self = Self::decode_state(input)?;
        Ok(())
    }
}

impl<const N: usize> Default for Ram<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for Ram<N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const N: usize> DerefMut for Ram<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_access_is_ignored() {
        let mut ram = Ram::<4>::new();
        ram.write(9, 0xAA);
        assert_eq!(ram.load(9), 0);
        ram.write_slice(2, &[1, 2, 3, 4]);
        assert_eq!(ram.as_slice(), &[0, 0, 1, 2]);
    }

    #[test]
    fn state_round_trip_restores_bytes() {
        let mut ram = Ram::<8>::new();
        ram.write_slice(0, &[9, 8, 7]);
        let mut out = StateWriter::new();
        ram.state_save(&mut out).unwrap();
        let bytes = out.finish();

        let mut restored = Ram::<8>::new();
        restored
            .state_load(&mut StateReader::new(&bytes).unwrap())
            .unwrap();
        assert_eq!(restored, ram);
    }
}
