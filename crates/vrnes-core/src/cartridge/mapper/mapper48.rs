//! Mapper 48 – Taito TC0690.
//!
//! Register map (only the listed addresses decode):
//! - `$8000`/`$8001`: 8 KiB PRG banks at `$8000`/`$A000`.
//! - `$8002`/`$8003`: 2 KiB CHR banks at PPU `$0000`/`$0800`.
//! - `$A000-$A003`: 1 KiB CHR banks at PPU `$1000-$1C00`.
//! - `$C000`: IRQ counter reload.
//! - `$C001`/`$C002`/`$E001`/`$E002`: IRQ enable (non-zero) or disable.
//! - `$E000`: bit 6 selects horizontal (set) or vertical mirroring.
//!
//! `$C000-$FFFF` is fixed to the last two 8 KiB banks. The IRQ counter is
//! clocked once per visible scanline while it is enabled and rendering is on,
//! and fires once when it counts down to zero.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    bus::MapperHost,
    cartridge::{BankSwitcher, Mapper, Mirroring, ScanlineClock},
    memory::cpu::PRG_ROM_START,
    state::{StateReader, StateWriter},
};

#[derive(Debug, Clone, Default)]
pub struct Mapper48 {
    switcher: BankSwitcher,
    irq_counter: u8,
    irq_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct IrqState {
    irq_counter: u8,
    irq_enabled: bool,
}

impl Mapper48 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn irq_counter(&self) -> u8 {
        self.irq_counter
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled
    }
}

impl Mapper for Mapper48 {
    fn mapper_id(&self) -> u16 {
        48
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Taito TC0690")
    }

    fn switcher(&self) -> &BankSwitcher {
        &self.switcher
    }

    fn switcher_mut(&mut self) -> &mut BankSwitcher {
        &mut self.switcher
    }

    fn map_power_on_banks(&mut self, host: &mut MapperHost<'_>) {
        let banks = self
            .switcher
            .rom()
            .map_or(0, |rom| rom.rom_bank_count() * 2);
        let last = banks.saturating_sub(1);
        self.switcher.load_8k_rom_bank(0, 0x8000, host);
        self.switcher.load_8k_rom_bank(1, 0xA000, host);
        self.switcher.load_8k_rom_bank(last.saturating_sub(1), 0xC000, host);
        self.switcher.load_8k_rom_bank(last, 0xE000, host);
        self.switcher.load_chr_rom(host);
    }

    fn write(&mut self, addr: u16, value: u8, host: &mut MapperHost<'_>) {
        if addr < PRG_ROM_START {
            self.switcher.write_low(addr, value, host);
            return;
        }
        let bank = usize::from(value);
        match addr {
            0x8000 => self.switcher.load_8k_rom_bank(bank, 0x8000, host),
            0x8001 => self.switcher.load_8k_rom_bank(bank, 0xA000, host),
            0x8002 => self.switcher.load_2k_vrom_bank(bank, 0x0000, host),
            0x8003 => self.switcher.load_2k_vrom_bank(bank, 0x0800, host),
            0xA000..=0xA003 => {
                let slot = addr - 0xA000;
                self.switcher.load_1k_vrom_bank(bank, 0x1000 + slot * 0x400, host);
            }
            0xC000 => self.irq_counter = value,
            0xC001 | 0xC002 | 0xE001 | 0xE002 => self.irq_enabled = value != 0,
            0xE000 => {
                let mode = if value & 0x40 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
                self.switcher.set_mirroring(mode, host);
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.irq_counter = 0;
        self.irq_enabled = false;
    }

    fn clock_irq_counter(&mut self, clock: ScanlineClock) -> bool {
        if !self.irq_enabled || !clock.rendering || !(0..240).contains(&clock.row) {
            return false;
        }
        if self.irq_counter == 0 {
            return false;
        }
        self.irq_counter -= 1;
        if self.irq_counter == 0 {
            self.irq_enabled = false;
            return true;
        }
        false
    }

    fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        self.switcher.state_save(out)?;
        out.put(&IrqState {
            irq_counter: self.irq_counter,
            irq_enabled: self.irq_enabled,
        })
    }

    fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        self.switcher.state_load(input)?;
        let IrqState {
            irq_counter,
            irq_enabled,
        } = input.take()?;
        self.irq_counter = irq_counter;
        self.irq_enabled = irq_enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cartridge::mapper::test_support::{HostRig, numbered_rom};

    fn loaded(rig: &mut HostRig) -> Mapper48 {
        let mut mapper = Mapper48::new();
        mapper
            .load_rom(Arc::new(numbered_rom(48, 4, 4)), &mut rig.host())
            .unwrap();
        mapper
    }

    fn visible(row: i32) -> ScanlineClock {
        ScanlineClock {
            row,
            rendering: true,
        }
    }

    #[test]
    fn power_on_fixes_the_last_two_banks() {
        let mut rig = HostRig::default();
        loaded(&mut rig);
        assert_eq!(rig.cpu_mem.load(0x8000), 0);
        assert_eq!(rig.cpu_mem.load(0xA000), 1);
        assert_eq!(rig.cpu_mem.load(0xC000), 6);
        assert_eq!(rig.cpu_mem.load(0xE000), 7);
    }

    #[test]
    fn bank_registers_decode() {
        let mut rig = HostRig::default();
        let mut mapper = loaded(&mut rig);
        mapper.write(0x8001, 5, &mut rig.host());
        mapper.write(0x8003, 3, &mut rig.host());
        mapper.write(0xA002, 13, &mut rig.host());
        assert_eq!(rig.cpu_mem.load(0xA000), 5);
        assert_eq!(rig.ppu.vram().load(0x0800), 6);
        assert_eq!(rig.ppu.vram().load(0x0C00), 7);
        assert_eq!(rig.ppu.vram().load(0x1800), 13);
    }

    #[test]
    fn mirroring_follows_bit_six() {
        let mut rig = HostRig::default();
        let mut mapper = loaded(&mut rig);
        mapper.write(0xE000, 0x40, &mut rig.host());
        assert_eq!(rig.ppu.mirroring(), Some(Mirroring::Horizontal));
        mapper.write(0xE000, 0x00, &mut rig.host());
        assert_eq!(rig.ppu.mirroring(), Some(Mirroring::Vertical));
        assert_eq!(mapper.switcher().mirroring(), Some(Mirroring::Vertical));
    }

    #[test]
    fn irq_fires_once_when_the_counter_runs_out() {
        let mut rig = HostRig::default();
        let mut mapper = loaded(&mut rig);
        mapper.write(0xC000, 5, &mut rig.host());
        mapper.write(0xC001, 1, &mut rig.host());

        let fired: Vec<bool> = (0..6).map(|row| mapper.clock_irq_counter(visible(row))).collect();
        assert_eq!(fired, [false, false, false, false, true, false]);
        assert!(!mapper.irq_enabled());
    }

    #[test]
    fn irq_counter_ignores_blank_lines() {
        let mut mapper = Mapper48::new();
        mapper.irq_counter = 2;
        mapper.irq_enabled = true;
        assert!(!mapper.clock_irq_counter(visible(-1)));
        assert!(!mapper.clock_irq_counter(ScanlineClock {
            row: 3,
            rendering: false
        }));
        assert_eq!(mapper.irq_counter(), 2);

        mapper.reset();
        assert_eq!(mapper.irq_counter(), 0);
        assert!(!mapper.irq_enabled());
    }

    #[test]
    fn counter_holds_while_the_irq_is_disabled() {
        let mut rig = HostRig::default();
        let mut mapper = loaded(&mut rig);
        mapper.write(0xC000, 5, &mut rig.host());
        for row in 0..3 {
            assert!(!mapper.clock_irq_counter(visible(row)));
        }
        assert_eq!(mapper.irq_counter(), 5);

        mapper.write(0xE001, 1, &mut rig.host());
        let fired: Vec<bool> = (3..8).map(|row| mapper.clock_irq_counter(visible(row))).collect();
        assert_eq!(fired, [false, false, false, false, true]);

        // Disabled again after firing, so a reload waits for the next enable.
        mapper.write(0xC000, 2, &mut rig.host());
        assert!(!mapper.clock_irq_counter(visible(8)));
        assert_eq!(mapper.irq_counter(), 2);
    }

    #[test]
    fn irq_registers_survive_a_snapshot() {
        let mut rig = HostRig::default();
        let mut mapper = loaded(&mut rig);
        mapper.write(0xC000, 9, &mut rig.host());
        mapper.write(0xE002, 1, &mut rig.host());
        let mut out = StateWriter::new();
        mapper.state_save(&mut out).unwrap();
        let bytes = out.finish();

        let mut restored = loaded(&mut rig);
        restored
            .state_load(&mut StateReader::new(&bytes).unwrap())
            .unwrap();
        assert_eq!(restored.irq_counter(), 9);
        assert!(restored.irq_enabled());
    }
}
