use serde::{Deserialize, Serialize};

use crate::{Error, memory::cpu::PRG_RAM_SIZE};

/// PRG-ROM bank granularity (16 KiB).
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR-ROM bank granularity (4 KiB).
pub const CHR_BANK_SIZE: usize = 4 * 1024;

/// Name table layout selected by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mirroring {
    /// `$2000`/`$2400` share a table, as do `$2800`/`$2C00`.
    Horizontal,
    /// `$2000`/`$2800` share a table, as do `$2400`/`$2C00`.
    Vertical,
    /// Every quadrant shows the first table.
    SingleScreenLower,
    /// Every quadrant shows the second table.
    SingleScreenUpper,
    /// Cartridge supplies its own four tables.
    FourScreen,
}

/// A parsed cartridge image.
///
/// Parsing the file format happens elsewhere; this type only carries the
/// sections the mappers copy from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    mapper_id: u16,
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mirroring: Mirroring,
    battery_ram: Option<Vec<u8>>,
}

impl Rom {
    pub fn new(mapper_id: u16, prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        Self {
            mapper_id,
            prg_rom,
            chr_rom,
            mirroring,
            battery_ram: None,
        }
    }

    /// Marks the board as battery backed, seeding `$6000-$7FFF` from `image`
    /// (zero-padded or truncated to 8 KiB).
    pub fn with_battery_ram(mut self, image: &[u8]) -> Self {
        let mut ram = vec![0; PRG_RAM_SIZE];
        let len = image.len().min(PRG_RAM_SIZE);
        ram[..len].copy_from_slice(&image[..len]);
        self.battery_ram = Some(ram);
        self
    }

    pub fn mapper_id(&self) -> u16 {
        self.mapper_id
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.battery_ram.as_deref()
    }

    pub fn has_battery_ram(&self) -> bool {
        self.battery_ram.is_some()
    }

    /// CHR-ROM present; boards without it use pattern memory as RAM.
    pub fn has_chr_rom(&self) -> bool {
        !self.chr_rom.is_empty()
    }

    /// Number of 16 KiB PRG banks.
    pub fn rom_bank_count(&self) -> usize {
        self.prg_rom.len() / PRG_BANK_SIZE
    }

    /// Number of 4 KiB CHR banks.
    pub fn vrom_bank_count(&self) -> usize {
        self.chr_rom.len() / CHR_BANK_SIZE
    }

    /// 16 KiB PRG bank `index`, wrapped modulo the bank count.
    pub fn rom_bank(&self, index: usize) -> &[u8] {
        let start = (index % self.rom_bank_count().max(1)) * PRG_BANK_SIZE;
        self.prg_rom.get(start..start + PRG_BANK_SIZE).unwrap_or(&[])
    }

    /// 4 KiB CHR bank `index`, wrapped modulo the bank count.
    pub fn vrom_bank(&self, index: usize) -> &[u8] {
        let start = (index % self.vrom_bank_count().max(1)) * CHR_BANK_SIZE;
        self.chr_rom.get(start..start + CHR_BANK_SIZE).unwrap_or(&[])
    }

    /// Checks the bank layout every board relies on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.prg_rom.is_empty() {
            return Err(Error::InvalidRom("no PRG-ROM"));
        }
        if self.prg_rom.len() % PRG_BANK_SIZE != 0 {
            return Err(Error::InvalidRom("PRG-ROM is not a whole number of 16 KiB banks"));
        }
        if self.chr_rom.len() % CHR_BANK_SIZE != 0 {
            return Err(Error::InvalidRom("CHR-ROM is not a whole number of 4 KiB banks"));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
