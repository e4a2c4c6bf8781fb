//! Mapper 71 – Camerica / Codemasters.
//!
//! - CPU `$8000-$BFFF`: switchable 16 KiB PRG-ROM bank.
//! - CPU `$C000-$FFFF`: fixed to the last 16 KiB bank.
//! - CPU `$9000-$9FFF` writes: bit 4 selects single-screen upper (set) or
//!   lower mirroring (Fire Hawk board).
//! - CPU `$C000-$FFFF` writes: select the `$8000` bank.
//!
//! Other writes to `$8000-$BFFF` are ignored.

use std::borrow::Cow;

use crate::{
    Error,
    bus::MapperHost,
    cartridge::{BankSwitcher, Mapper, Mirroring},
    memory::cpu::{PRG_ROM_START, PRG_ROM_UPPER},
    state::{StateReader, StateWriter},
};

#[derive(Debug, Clone, Default)]
pub struct Mapper71 {
    switcher: BankSwitcher,
    /// Bank mapped at `$8000` by the last select, `None` after reset.
    cur_bank: Option<u8>,
}

impl Mapper71 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_bank(&self) -> Option<u8> {
        self.cur_bank
    }
}

impl Mapper for Mapper71 {
    fn mapper_id(&self) -> u16 {
        71
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Camerica / Codemasters")
    }

    fn switcher(&self) -> &BankSwitcher {
        &self.switcher
    }

    fn switcher_mut(&mut self) -> &mut BankSwitcher {
        &mut self.switcher
    }

    fn map_power_on_banks(&mut self, host: &mut MapperHost<'_>) {
        let last = self
            .switcher
            .rom()
            .map_or(0, |rom| rom.rom_bank_count().saturating_sub(1));
        self.switcher.load_rom_bank(0, PRG_ROM_START, host);
        self.switcher.load_rom_bank(last, PRG_ROM_UPPER, host);
        self.switcher.load_chr_rom(host);
    }

    fn write(&mut self, addr: u16, value: u8, host: &mut MapperHost<'_>) {
        match addr {
            ..PRG_ROM_START => self.switcher.write_low(addr, value, host),
            0x9000..=0x9FFF => {
                let mode = if value & 0x10 != 0 {
                    Mirroring::SingleScreenUpper
                } else {
                    Mirroring::SingleScreenLower
                };
                self.switcher.set_mirroring(mode, host);
            }
            PRG_ROM_UPPER.. => {
                if self.cur_bank != Some(value) {
                    self.switcher.load_rom_bank(usize::from(value), PRG_ROM_START, host);
                    self.cur_bank = Some(value);
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.cur_bank = None;
    }

    fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        self.switcher.state_save(out)?;
        out.put(&self.cur_bank)
    }

    fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        self.switcher.state_load(input)?;
        self.cur_bank = input.take()?;
        Ok(())
    }
}
