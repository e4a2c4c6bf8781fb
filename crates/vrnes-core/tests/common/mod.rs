#![allow(dead_code)]

use anyhow::{Result, bail, ensure};
use rand::{Rng, SeedableRng, rngs::StdRng};
use vrnes_core::{
    Console, CpuPort, Interrupt, Mirroring, Region, RenderOptions, Rom, VideoSink,
    cartridge::{CHR_BANK_SIZE, PRG_BANK_SIZE},
};

/// PPU cycles in one NTSC frame.
pub const FRAME_PPU_CYCLES: u32 = 262 * 341;
/// CPU cycles comfortably covering one frame, including the NMI delay.
pub const FRAME_CPU_CYCLES: u32 = 30_000;

#[derive(Debug, Default)]
pub struct TestCpu {
    pub interrupts: Vec<Interrupt>,
    pub halted: u32,
}

impl TestCpu {
    pub fn count(&self, kind: Interrupt) -> usize {
        self.interrupts.iter().filter(|&&i| i == kind).count()
    }
}

impl CpuPort for TestCpu {
    fn request_interrupt(&mut self, kind: Interrupt) {
        self.interrupts.push(kind);
    }

    fn halt_cycles(&mut self, cycles: u32) {
        self.halted += cycles;
    }
}

#[derive(Debug, Default)]
pub struct TestVideo {
    pub frames: usize,
    pub last: Vec<u32>,
}

impl VideoSink for TestVideo {
    fn image_ready(&mut self, frame: &[u32], _skip_frame: bool) {
        self.frames += 1;
        self.last = frame.to_vec();
    }
}

pub type TestConsole = Console<TestCpu, TestVideo>;

pub fn new_console(options: RenderOptions) -> TestConsole {
    Console::new(TestCpu::default(), TestVideo::default(), Region::Ntsc, options)
}

/// Console with `rom` inserted.
pub fn console_with(rom: Rom) -> Result<TestConsole> {
    let mut console = new_console(RenderOptions::default());
    if !console.load_rom(rom) {
        bail!("ROM was rejected");
    }
    Ok(console)
}

/// ROM whose PRG bytes hold their 8 KiB bank number and CHR bytes their
/// 1 KiB bank number.
pub fn numbered_rom(mapper_id: u16, prg_16k: usize, chr_4k: usize) -> Rom {
    let prg = (0..prg_16k * PRG_BANK_SIZE).map(|i| (i / 0x2000) as u8).collect();
    let chr = (0..chr_4k * CHR_BANK_SIZE).map(|i| (i / 0x400) as u8).collect();
    Rom::new(mapper_id, prg, chr, Mirroring::Horizontal)
}

/// NROM image with the given 8 KiB of pattern data.
pub fn nrom_with_chr(chr: Vec<u8>, mirroring: Mirroring) -> Rom {
    Rom::new(0, vec![0; 2 * PRG_BANK_SIZE], chr, mirroring)
}

/// Pattern data with tile `index` of the first table filled with color 3.
pub fn solid_tile_chr(index: usize) -> Vec<u8> {
    let mut chr = vec![0; 2 * CHR_BANK_SIZE];
    chr[index * 16..index * 16 + 16].fill(0xFF);
    chr
}

pub fn random_chr(seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..2 * CHR_BANK_SIZE).map(|_| rng.random()).collect()
}

pub fn set_vram_address(console: &mut TestConsole, addr: u16) {
    console.cpu_write(0x2006, (addr >> 8) as u8);
    console.cpu_write(0x2006, addr as u8);
}

pub fn write_vram(console: &mut TestConsole, addr: u16, bytes: &[u8]) {
    set_vram_address(console, addr);
    for &byte in bytes {
        console.cpu_write(0x2007, byte);
    }
}

/// Steps one CPU cycle at a time until the PPU sits on `scanline`.
pub fn run_to_scanline(console: &mut TestConsole, scanline: i32) -> Result<()> {
    for _ in 0..2 * FRAME_PPU_CYCLES {
        if console.ppu().scanline() == scanline {
            return Ok(());
        }
        console.step(1);
    }
    bail!("scanline {scanline} never reached")
}

/// Fills name table 0, palettes and sprite memory with seeded noise and
/// turns rendering and NMI on.
pub fn busy_scene(console: &mut TestConsole, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let names: Vec<u8> = (0..0x400).map(|_| rng.random()).collect();
    write_vram(console, 0x2000, &names);
    let palette: Vec<u8> = (0..32).map(|_| rng.random_range(0..0x40)).collect();
    write_vram(console, 0x3F00, &palette);

    console.cpu_write(0x2003, 0);
    for _ in 0..256 {
        console.cpu_write(0x2004, rng.random());
    }
    console.cpu_write(0x2005, rng.random());
    console.cpu_write(0x2005, rng.random_range(0..240));
    console.cpu_write(0x2000, 0x80);
    console.cpu_write(0x2001, 0x1E);
    ensure!(console.ppu().scanline() == 0, "scene setup must not step the PPU");
    Ok(())
}
