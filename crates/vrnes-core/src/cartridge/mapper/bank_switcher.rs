use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    bus::MapperHost,
    cartridge::{CHR_BANK_SIZE, Mirroring, Rom},
    memory::cpu::{PRG_RAM_END, PRG_RAM_START, PRG_ROM_START, PRG_ROM_UPPER},
    state::{StateReader, StateWriter},
};

/// Bank copy routines and board state shared by every mapper.
///
/// Switching a bank copies the selected ROM slice into the CPU address space
/// or into PPU pattern memory, so reads never go through the board.
#[derive(Clone, Default)]
pub struct BankSwitcher {
    rom: Option<Arc<Rom>>,
    game_genie: bool,
    /// Battery backed copy of `$6000-$7FFF`.
    save_ram: Option<Vec<u8>>,
    /// Last layout the board selected.
    mirroring: Option<Mirroring>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SwitcherState {
    game_genie: bool,
    save_ram: Option<Vec<u8>>,
    mirroring: Option<Mirroring>,
}

impl fmt::Debug for BankSwitcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankSwitcher")
            .field("mapper_id", &self.rom.as_ref().map(|rom| rom.mapper_id()))
            .field("game_genie", &self.game_genie)
            .field("battery", &self.save_ram.is_some())
            .field("mirroring", &self.mirroring)
            .finish_non_exhaustive()
    }
}

impl BankSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, rom: Arc<Rom>) {
        self.save_ram = rom.battery_ram().map(<[u8]>::to_vec);
        self.mirroring = None;
        self.rom = Some(rom);
    }

    pub fn rom(&self) -> Option<&Rom> {
        self.rom.as_deref()
    }

    pub fn game_genie(&self) -> bool {
        self.game_genie
    }

    pub(crate) fn set_game_genie(&mut self, enabled: bool) {
        self.game_genie = enabled;
    }

    pub fn save_ram(&self) -> Option<&[u8]> {
        self.save_ram.as_deref()
    }

    /// Layout most recently selected by the board, if any.
    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    /// Records a board-selected layout and applies it to the PPU.
    pub fn set_mirroring(&mut self, mode: Mirroring, host: &mut MapperHost<'_>) {
        self.mirroring = Some(mode);
        host.ppu.set_mirroring(mode);
    }

    /// Maps 16 KiB PRG bank `bank` at `addr`.
    pub fn load_rom_bank(&self, bank: usize, addr: u16, host: &mut MapperHost<'_>) {
        let Some(rom) = &self.rom else { return };
        host.cpu_mem.write_slice(usize::from(addr), rom.rom_bank(bank));
    }

    /// Maps 8 KiB PRG bank `bank` at `addr`.
    pub fn load_8k_rom_bank(&self, bank: usize, addr: u16, host: &mut MapperHost<'_>) {
        let Some(rom) = &self.rom else { return };
        let bank = bank % (rom.rom_bank_count() * 2).max(1);
        let offset = (bank % 2) * 0x2000;
        let data = &rom.rom_bank(bank / 2)[offset..offset + 0x2000];
        host.cpu_mem.write_slice(usize::from(addr), data);
    }

    /// Maps 4 KiB CHR bank `bank` at pattern address `addr`.
    pub fn load_vrom_bank(&self, bank: usize, addr: u16, host: &mut MapperHost<'_>) {
        self.load_chr_slice(bank, 1, addr, host);
    }

    /// Maps 2 KiB CHR bank `bank` at pattern address `addr`.
    pub fn load_2k_vrom_bank(&self, bank: usize, addr: u16, host: &mut MapperHost<'_>) {
        self.load_chr_slice(bank, 2, addr, host);
    }

    /// Maps 1 KiB CHR bank `bank` at pattern address `addr`.
    pub fn load_1k_vrom_bank(&self, bank: usize, addr: u16, host: &mut MapperHost<'_>) {
        self.load_chr_slice(bank, 4, addr, host);
    }

    /// `parts` slices per 4 KiB bank; boards without CHR-ROM keep their
    /// pattern RAM.
    fn load_chr_slice(&self, bank: usize, parts: usize, addr: u16, host: &mut MapperHost<'_>) {
        let Some(rom) = self.rom.as_ref().filter(|rom| rom.has_chr_rom()) else {
            return;
        };
        let bank = bank % (rom.vrom_bank_count() * parts);
        let len = CHR_BANK_SIZE / parts;
        let offset = (bank % parts) * len;
        let data = &rom.vrom_bank(bank / parts)[offset..offset + len];
        host.ppu.load_pattern_bank(addr, data);
    }

    /// Power-on PRG layout: banks 0 and 1, or a single bank in both windows.
    pub fn load_prg_rom(&self, host: &mut MapperHost<'_>) {
        let Some(rom) = &self.rom else { return };
        let upper = if rom.rom_bank_count() > 1 { 1 } else { 0 };
        self.load_rom_bank(0, PRG_ROM_START, host);
        self.load_rom_bank(upper, PRG_ROM_UPPER, host);
    }

    /// Power-on CHR layout: the first 8 KiB of CHR-ROM.
    pub fn load_chr_rom(&self, host: &mut MapperHost<'_>) {
        self.load_vrom_bank(0, 0x0000, host);
        self.load_vrom_bank(1, 0x1000, host);
    }

    /// Stores a CPU write below `$8000`, mirroring PRG-RAM writes into the
    /// battery image.
    pub fn write_low(&mut self, addr: u16, value: u8, host: &mut MapperHost<'_>) {
        if addr >= PRG_ROM_START {
            return;
        }
        host.cpu_mem.write(usize::from(addr), value);
        if let (PRG_RAM_START..=PRG_RAM_END, Some(ram)) = (addr, self.save_ram.as_mut())
            && let Some(slot) = ram.get_mut(usize::from(addr - PRG_RAM_START))
        {
            *slot = value;
        }
    }

    /// Copies the battery image into `$6000-$7FFF`.
    pub fn load_battery_ram(&self, host: &mut MapperHost<'_>) {
        if let Some(ram) = &self.save_ram {
            host.cpu_mem.write_slice(usize::from(PRG_RAM_START), ram);
        }
    }

    pub(crate) fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        out.put(&SwitcherState {
            game_genie: self.game_genie,
            save_ram: self.save_ram.clone(),
            mirroring: self.mirroring,
        })
    }

    pub(crate) fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        let state: SwitcherState = input.take()?;
        if self.save_ram.is_some() != state.save_ram.is_some() {
            return Err(Error::CorruptState("battery RAM presence"));
        }
        self.game_genie = state.game_genie;
        self.save_ram = state.save_ram;
        self.mirroring = state.mirroring;
        Ok(())
    }
}
