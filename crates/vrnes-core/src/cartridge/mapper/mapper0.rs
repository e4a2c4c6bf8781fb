//! Mapper 0 – NROM.
//!
//! - CPU `$8000-$BFFF`: first 16 KiB PRG-ROM bank.
//! - CPU `$C000-$FFFF`: second bank, or a mirror of the first on NROM-128.
//! - PPU `$0000-$1FFF`: 8 KiB CHR-ROM, or CHR-RAM when the image has none.
//! - No registers; writes to `$8000-$FFFF` are ignored.

use std::borrow::Cow;

use crate::cartridge::{BankSwitcher, Mapper};

#[derive(Debug, Clone, Default)]
pub struct Mapper0 {
    switcher: BankSwitcher,
}

impl Mapper0 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mapper for Mapper0 {
    fn mapper_id(&self) -> u16 {
        0
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("NROM")
    }

    fn switcher(&self) -> &BankSwitcher {
        &self.switcher
    }

    fn switcher_mut(&mut self) -> &mut BankSwitcher {
        &mut self.switcher
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        bus::Interrupt,
        cartridge::mapper::test_support::{HostRig, numbered_rom},
    };

    #[test]
    fn power_on_maps_both_prg_banks_and_chr() {
        let mut rig = HostRig::default();
        let mut mapper = Mapper0::new();
        mapper.init(&mut rig.host());
        mapper
            .load_rom(Arc::new(numbered_rom(0, 2, 2)), &mut rig.host())
            .unwrap();

        assert_eq!(rig.cpu_mem.load(0x8000), 0);
        assert_eq!(rig.cpu_mem.load(0xC000), 2);
        assert_eq!(rig.cpu_mem.load(0xFFFF), 3);
        assert_eq!(rig.ppu.vram().load(0x1C00), 7);
        assert_eq!(rig.cpu.interrupts, vec![Interrupt::Reset]);
    }

    #[test]
    fn rom_writes_do_not_touch_prg() {
        let mut rig = HostRig::default();
        let mut mapper = Mapper0::new();
        mapper
            .load_rom(Arc::new(numbered_rom(0, 2, 0)), &mut rig.host())
            .unwrap();
        mapper.write(0x8000, 0xFF, &mut rig.host());
        mapper.write(0x6000, 0x12, &mut rig.host());
        assert_eq!(mapper.read(0x8000, &rig.cpu_mem), 0);
        assert_eq!(mapper.read(0x6000, &rig.cpu_mem), 0x12);
    }
}
