use std::{borrow::Cow, fmt::Debug, sync::Arc};

use dyn_clone::DynClone;

use crate::{
    Error,
    bus::{Interrupt, MapperHost},
    cartridge::Rom,
    ram::cpu::AddressSpace,
    state::{StateReader, StateWriter},
};

mod bank_switcher;
mod mapper0;
mod mapper48;
mod mapper71;

pub use bank_switcher::BankSwitcher;
pub use mapper0::Mapper0;
pub use mapper48::Mapper48;
pub use mapper71::Mapper71;

/// Per-scanline clock delivered to the board's IRQ counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanlineClock {
    /// Visible row being scanned, `-1` on the pre-render line.
    pub row: i32,
    /// Background or sprite rendering is enabled.
    pub rendering: bool,
}

/// Cartridge board contract.
///
/// PRG windows are materialized in the CPU address space and CHR windows in
/// PPU pattern memory, so most boards only override [`Mapper::write`] and,
/// where they have one, the IRQ counter. The shared copy routines live in
/// [`BankSwitcher`].
pub trait Mapper: DynClone + Debug {
    fn mapper_id(&self) -> u16;

    fn name(&self) -> Cow<'static, str>;

    fn switcher(&self) -> &BankSwitcher;

    fn switcher_mut(&mut self) -> &mut BankSwitcher;

    /// Called once after construction.
    fn init(&mut self, host: &mut MapperHost<'_>) {
        let _ = host;
        self.reset();
    }

    /// Maps a fresh image and pulses reset. An invalid image leaves the
    /// board untouched.
    fn load_rom(&mut self, rom: Arc<Rom>, host: &mut MapperHost<'_>) -> Result<(), Error> {
        if let Err(err) = rom.validate() {
            tracing::warn!(mapper = self.mapper_id(), %err, "refusing ROM image");
            return Err(err);
        }
        self.switcher_mut().attach(rom);
        self.map_power_on_banks(host);
        self.load_battery_ram(host);
        host.cpu.request_interrupt(Interrupt::Reset);
        tracing::debug!(mapper = self.mapper_id(), name = %self.name(), "ROM mapped");
        Ok(())
    }

    /// Initial PRG and CHR layout.
    fn map_power_on_banks(&mut self, host: &mut MapperHost<'_>) {
        self.switcher().load_prg_rom(host);
        self.switcher().load_chr_rom(host);
    }

    /// CPU write into cartridge space.
    fn write(&mut self, addr: u16, value: u8, host: &mut MapperHost<'_>) {
        self.switcher_mut().write_low(addr, value, host);
    }

    /// CPU read from cartridge space.
    fn read(&self, addr: u16, cpu_mem: &AddressSpace) -> u8 {
        cpu_mem.load(usize::from(addr))
    }

    fn reset(&mut self) {}

    /// Returns `true` when the board raises its IRQ on this scanline.
    fn clock_irq_counter(&mut self, clock: ScanlineClock) -> bool {
        let _ = clock;
        false
    }

    fn set_game_genie_state(&mut self, enabled: bool) {
        self.switcher_mut().set_game_genie(enabled);
    }

    /// PPU pattern memory access, for boards that snoop the address bus.
    fn latch_access(&mut self, addr: u16) {
        let _ = addr;
    }

    fn load_battery_ram(&self, host: &mut MapperHost<'_>) {
        self.switcher().load_battery_ram(host);
    }

    /// Battery backed PRG-RAM image, if the board has one.
    fn save_ram(&self) -> Option<&[u8]> {
        self.switcher().save_ram()
    }

    fn state_save(&self, out: &mut StateWriter) -> Result<(), Error> {
        self.switcher().state_save(out)
    }

    fn state_load(&mut self, input: &mut StateReader<'_>) -> Result<(), Error> {
        self.switcher_mut().state_load(input)
    }
}

dyn_clone::clone_trait_object!(Mapper);

/// Builds the board for an iNES mapper number.
pub fn create_mapper(id: u16) -> Result<Box<dyn Mapper>, Error> {
    let mapper: Box<dyn Mapper> = match id {
        0 => Box::new(Mapper0::new()),
        48 => Box::new(Mapper48::new()),
        71 => Box::new(Mapper71::new()),
        other => return Err(Error::UnsupportedMapper(other)),
    };
    Ok(mapper)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        bus::{MapperHost, mock::RecordingCpu},
        cartridge::{CHR_BANK_SIZE, Mirroring, PRG_BANK_SIZE, Rom},
        ppu::Ppu,
        ram::cpu::AddressSpace,
    };

    /// ROM whose every byte holds the number of the 1 KiB (CHR) or 8 KiB
    /// (PRG) bank it belongs to.
    pub(crate) fn numbered_rom(mapper_id: u16, prg_16k: usize, chr_4k: usize) -> Rom {
        let prg = (0..prg_16k * PRG_BANK_SIZE).map(|i| (i / 0x2000) as u8).collect();
        let chr = (0..chr_4k * CHR_BANK_SIZE).map(|i| (i / 0x400) as u8).collect();
        Rom::new(mapper_id, prg, chr, Mirroring::Horizontal)
    }

    #[derive(Default)]
    pub(crate) struct HostRig {
        pub(crate) cpu_mem: AddressSpace,
        pub(crate) ppu: Ppu,
        pub(crate) cpu: RecordingCpu,
    }

    impl HostRig {
        pub(crate) fn host(&mut self) -> MapperHost<'_> {
            MapperHost {
                cpu_mem: &mut self.cpu_mem,
                ppu: &mut self.ppu,
                cpu: &mut self.cpu,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::*, *};

    #[test]
    fn registry_knows_supported_boards() {
        for id in [0, 48, 71] {
            assert_eq!(create_mapper(id).unwrap().mapper_id(), id);
        }
        assert!(matches!(create_mapper(4).unwrap_err(), Error::UnsupportedMapper(4)));
    }

    #[test]
    fn invalid_rom_leaves_the_board_empty() {
        let mut rig = HostRig::default();
        let mut mapper = create_mapper(0).unwrap();
        let rom = Rom::new(0, vec![0; 100], Vec::new(), crate::Mirroring::Vertical);
        assert!(mapper.load_rom(Arc::new(rom), &mut rig.host()).is_err());
        assert!(mapper.switcher().rom().is_none());
        assert!(rig.cpu.interrupts.is_empty());
    }

    #[test]
    fn boxed_boards_clone_independently() {
        let mut rig = HostRig::default();
        let mut mapper = create_mapper(71).unwrap();
        mapper.load_rom(Arc::new(numbered_rom(71, 4, 0)), &mut rig.host()).unwrap();
        let copy = dyn_clone::clone_box(&*mapper);
        mapper.set_game_genie_state(true);
        assert!(mapper.switcher().game_genie());
        assert!(!copy.switcher().game_genie());
    }
}
