//! Reference owner wiring the PPU and a mapper behind a CPU-side bus.
//!
//! The console owns every component. Calls that cross components build a
//! [`PpuBus`] or [`MapperHost`] from disjoint field borrows for the duration
//! of the call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    bus::{CpuPort, MapperHost, PpuBus, VideoSink},
    cartridge::{Mapper, Mirroring, Rom, create_mapper},
    config::{Region, RenderOptions},
    memory::cpu::{
        CARTRIDGE_SPACE_BASE, INTERNAL_RAM_MASK, INTERNAL_RAM_MIRROR_END, IO_END, PPU_REGISTER_BASE,
        PPU_REGISTER_END, PRG_ROM_START, SPRITE_DMA,
    },
    ppu::Ppu,
    ram::{
        cpu::AddressSpace,
        ppu::{SpriteRam, Vram},
    },
    state::{StateReader, StateWriter},
};

/// PPU cycles per CPU cycle.
const PPU_CYCLES_PER_CPU_CYCLE: u32 = 3;
/// Power-on fill of internal RAM.
const RAM_FLUSH_VALUE: u8 = 0xFF;

#[derive(Debug, Serialize, Deserialize)]
struct ConsoleHeader {
    mapper_id: Option<u16>,
}

/// A PPU, a cartridge and the flat CPU address space they share.
#[derive(Debug)]
pub struct Console<C: CpuPort, V: VideoSink> {
    cpu: C,
    video: V,
    cpu_mem: AddressSpace,
    ppu: Ppu,
    mapper: Option<Box<dyn Mapper>>,
    rom: Option<Arc<Rom>>,
}

impl<C: CpuPort, V: VideoSink> Console<C, V> {
    pub fn new(cpu: C, video: V, region: Region, options: RenderOptions) -> Self {
        let mut console = Self {
            cpu,
            video,
            cpu_mem: AddressSpace::new(),
            ppu: Ppu::new(region, options),
            mapper: None,
            rom: None,
        };
        console.clear_cpu_memory();
        console
    }

    /// Inserts a cartridge. Invalid images and unknown boards are refused
    /// and leave the console untouched.
    pub fn load_rom(&mut self, rom: Rom) -> bool {
        match self.insert_rom(rom) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "ROM rejected");
                false
            }
        }
    }

    fn insert_rom(&mut self, rom: Rom) -> Result<(), Error> {
        rom.validate()?;
        let mut mapper = create_mapper(rom.mapper_id())?;
        let rom = Arc::new(rom);

        self.mapper = None;
        self.power_cycle();
        let mut host = MapperHost {
            cpu_mem: &mut self.cpu_mem,
            ppu: &mut self.ppu,
            cpu: &mut self.cpu,
        };
        mapper.init(&mut host);
        mapper.load_rom(Arc::clone(&rom), &mut host)?;

        tracing::info!(
            mapper = mapper.mapper_id(),
            name = %mapper.name(),
            prg_banks = rom.rom_bank_count(),
            chr_banks = rom.vrom_bank_count(),
            "cartridge inserted"
        );
        self.mapper = Some(mapper);
        self.rom = Some(rom);
        self.sync_mirroring();
        Ok(())
    }

    /// Clears memories and the PPU, then maps the inserted cartridge again.
    pub fn reset(&mut self) {
        self.power_cycle();
        if let Some(mapper) = self.mapper.as_deref_mut() {
            let mut host = MapperHost {
                cpu_mem: &mut self.cpu_mem,
                ppu: &mut self.ppu,
                cpu: &mut self.cpu,
            };
            mapper.reset();
            mapper.map_power_on_banks(&mut host);
            mapper.load_battery_ram(&mut host);
        }
        self.sync_mirroring();
    }

    fn power_cycle(&mut self) {
        self.cpu_mem.reset();
        self.clear_cpu_memory();
        self.ppu.reset();
    }

    fn clear_cpu_memory(&mut self) {
        let ram = &mut self.cpu_mem[..=usize::from(INTERNAL_RAM_MIRROR_END)];
        ram.fill(RAM_FLUSH_VALUE);
        for mirror in ram.chunks_mut(usize::from(INTERNAL_RAM_MASK) + 1) {
            mirror[0x008] = 0xF7;
            mirror[0x009] = 0xEF;
            mirror[0x00A] = 0xDF;
            mirror[0x00F] = 0xBF;
        }
    }

    /// Board-selected mirroring, falling back to the ROM hint.
    fn sync_mirroring(&mut self) {
        let mode = self
            .mapper
            .as_ref()
            .and_then(|mapper| mapper.switcher().mirroring())
            .or_else(|| self.rom.as_ref().map(|rom| rom.mirroring()));
        if let Some(mode) = mode {
            self.ppu.set_mirroring(mode);
        }
    }

    fn ppu_bus(&mut self) -> (&mut Ppu, PpuBus<'_>) {
        let bus = PpuBus {
            cpu: &mut self.cpu,
            cpu_mem: &self.cpu_mem,
            mapper: self.mapper.as_deref_mut(),
            video: &mut self.video,
        };
        (&mut self.ppu, bus)
    }

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0..=INTERNAL_RAM_MIRROR_END => self.cpu_mem.load(usize::from(addr & INTERNAL_RAM_MASK)),
            PPU_REGISTER_BASE..=PPU_REGISTER_END => {
                let (ppu, mut bus) = self.ppu_bus();
                ppu.read(addr, &mut bus)
            }
            ..=IO_END => self.cpu_mem.load(usize::from(addr)),
            _ => match &self.mapper {
                Some(mapper) => mapper.read(addr, &self.cpu_mem),
                None => self.cpu_mem.load(usize::from(addr)),
            },
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0..=INTERNAL_RAM_MIRROR_END => {
                self.cpu_mem.write(usize::from(addr & INTERNAL_RAM_MASK), value);
            }
            PPU_REGISTER_BASE..=PPU_REGISTER_END | SPRITE_DMA => {
                let (ppu, mut bus) = self.ppu_bus();
                ppu.write(addr, value, &mut bus);
            }
            ..=IO_END => self.cpu_mem.write(usize::from(addr), value),
            CARTRIDGE_SPACE_BASE.. => match self.mapper.as_deref_mut() {
                Some(mapper) => {
                    let mut host = MapperHost {
                        cpu_mem: &mut self.cpu_mem,
                        ppu: &mut self.ppu,
                        cpu: &mut self.cpu,
                    };
                    mapper.write(addr, value, &mut host);
                    self.sync_mirroring();
                }
                None if addr < PRG_ROM_START => self.cpu_mem.write(usize::from(addr), value),
                None => {}
            },
        }
    }

    /// Runs the PPU for `cpu_cycles` CPU cycles.
    pub fn step(&mut self, cpu_cycles: u32) {
        let (ppu, mut bus) = self.ppu_bus();
        ppu.step_cycles(cpu_cycles.saturating_mul(PPU_CYCLES_PER_CPU_CYCLE), &mut bus);
    }

    pub fn set_game_genie_state(&mut self, enabled: bool) {
        if let Some(mapper) = self.mapper.as_deref_mut() {
            mapper.set_game_genie_state(enabled);
        }
    }

    /// Serializes CPU memory, VRAM, sprite memory, the board and the PPU.
    pub fn state_save(&self) -> Result<Vec<u8>, Error> {
        let mut out = StateWriter::new();
        out.put(&ConsoleHeader {
            mapper_id: self.mapper.as_ref().map(|mapper| mapper.mapper_id()),
        })?;
        self.cpu_mem.state_save(&mut out)?;
        self.ppu.vram().state_save(&mut out)?;
        self.ppu.sprite_ram().state_save(&mut out)?;
        if let Some(mapper) = &self.mapper {
            mapper.state_save(&mut out)?;
        }
        self.ppu.state_save(&mut out)?;
        Ok(out.finish())
    }

    /// Restores a snapshot. Every record is decoded and checked before
    /// anything is applied, so a rejected snapshot changes nothing.
    pub fn restore_state(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut input = StateReader::new(bytes)?;
        let header: ConsoleHeader = input.take()?;
        if header.mapper_id != self.mapper.as_ref().map(|mapper| mapper.mapper_id()) {
            return Err(Error::CorruptState("snapshot belongs to another board"));
        }
        let cpu_mem = AddressSpace::decode_state(&mut input)?;
        let vram = Vram::decode_state(&mut input)?;
        let sprite_ram = SpriteRam::decode_state(&mut input)?;
        let mut mapper = self.mapper.clone();
        if let Some(mapper) = mapper.as_deref_mut() {
            mapper.state_load(&mut input)?;
        }
        let ppu_state = Ppu::decode_state(&mut input)?;

        self.cpu_mem = cpu_mem;
        self.mapper = mapper;
        self.ppu.restore_memory(vram, sprite_ram);
        self.ppu.apply_state(ppu_state);
        Ok(())
    }

    pub fn state_load(&mut self, bytes: &[u8]) -> bool {
        match self.restore_state(bytes) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "snapshot rejected");
                false
            }
        }
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    /// PPU handle for palette and debug-view configuration.
    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn cpu_memory(&self) -> &AddressSpace {
        &self.cpu_mem
    }

    pub fn mapper(&self) -> Option<&dyn Mapper> {
        self.mapper.as_deref()
    }

    pub fn rom(&self) -> Option<&Rom> {
        self.rom.as_deref()
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.ppu.mirroring()
    }

    /// Battery backed PRG-RAM of the inserted cartridge.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.mapper.as_ref().and_then(|mapper| mapper.save_ram())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Interrupt,
        bus::mock::{FrameCounter, RecordingCpu},
        cartridge::{PRG_BANK_SIZE, mapper::test_support::numbered_rom},
    };

    type TestConsole = Console<RecordingCpu, FrameCounter>;

    fn console() -> TestConsole {
        Console::new(
            RecordingCpu::default(),
            FrameCounter::default(),
            Region::Ntsc,
            RenderOptions::default(),
        )
    }

    fn with_rom(rom: Rom) -> TestConsole {
        let mut console = console();
        assert!(console.load_rom(rom));
        console
    }

    #[test]
    fn loading_maps_banks_and_pulses_reset() {
        let console = with_rom(numbered_rom(0, 2, 2));
        assert_eq!(console.cpu_memory().load(0xC000), 2);
        assert_eq!(console.ppu().vram().load(0x1000), 4);
        assert_eq!(console.mirroring(), Some(Mirroring::Horizontal));
        assert_eq!(console.cpu().interrupts, vec![Interrupt::Reset]);
    }

    #[test]
    fn rejected_roms_keep_the_current_cartridge() {
        let mut console = with_rom(numbered_rom(0, 2, 0));
        let broken = Rom::new(0, vec![0; PRG_BANK_SIZE + 1], Vec::new(), Mirroring::Vertical);
        assert!(!console.load_rom(broken));
        assert!(!console.load_rom(numbered_rom(4, 2, 0)));
        assert_eq!(console.mapper().map(|m| m.mapper_id()), Some(0));
        assert_eq!(console.cpu_memory().load(0xC000), 2);
    }

    #[test]
    fn internal_ram_is_mirrored() {
        let mut console = console();
        assert_eq!(console.cpu_read(0x0008), 0xF7);
        assert_eq!(console.cpu_read(0x0000), RAM_FLUSH_VALUE);
        console.cpu_write(0x1803, 0x5A);
        assert_eq!(console.cpu_read(0x0003), 0x5A);
    }

    #[test]
    fn ppu_ports_are_mirrored_through_3fff() {
        let mut console = console();
        console.cpu_write(0x3FFE, 0x21);
        console.cpu_write(0x2006, 0x00);
        console.cpu_write(0x2007, 0x77);
        console.cpu_write(0x2006, 0x21);
        console.cpu_write(0x200E, 0x00);
        console.cpu_read(0x2007);
        assert_eq!(console.cpu_read(0x3FF7), 0x77);
    }

    #[test]
    fn sprite_dma_reads_cpu_memory() {
        let mut console = console();
        for i in 0..=0xFF {
            console.cpu_write(0x0300 + i, i as u8);
        }
        console.cpu_write(0x4014, 0x03);
        assert_eq!(console.ppu().sprite_ram().load(0x42), 0x42);
        assert!(console.cpu().halted > 0);
    }

    #[test]
    fn cpu_cycles_drive_three_ppu_cycles() {
        let mut console = console();
        console.step(341);
        assert_eq!(console.ppu().scanline(), 3);
        assert_eq!(console.ppu().cycle(), 0);
    }

    #[test]
    fn board_mirroring_is_applied_after_writes() {
        let mut console = with_rom(numbered_rom(71, 4, 0));
        console.cpu_write(0x9000, 0x10);
        assert_eq!(console.mirroring(), Some(Mirroring::SingleScreenUpper));

        console.reset();
        assert_eq!(console.mirroring(), Some(Mirroring::SingleScreenUpper));
        assert_eq!(console.cpu_memory().load(0xC000), 6);
    }

    #[test]
    fn battery_ram_tracks_prg_ram_writes() {
        let rom = numbered_rom(0, 1, 0).with_battery_ram(&[1, 2, 3]);
        let mut console = with_rom(rom);
        assert_eq!(console.cpu_read(0x6001), 2);
        console.cpu_write(0x6002, 9);
        assert_eq!(console.battery_ram().map(|ram| ram[2]), Some(9));
    }

    #[test]
    fn snapshot_for_another_board_is_refused() {
        let nrom = with_rom(numbered_rom(0, 2, 0));
        let bytes = nrom.state_save().unwrap();
        let mut camerica = with_rom(numbered_rom(71, 2, 0));
        let err = camerica.restore_state(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptState(_)));
    }
}
