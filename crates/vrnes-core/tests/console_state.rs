mod common;

use anyhow::{Context, Result, ensure};
use common::{
    FRAME_CPU_CYCLES, TestConsole, busy_scene, console_with, new_console, nrom_with_chr,
    numbered_rom, random_chr, run_to_scanline,
};
use ctor::ctor;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use vrnes_core::{Error, Interrupt, Mirroring, RenderOptions, Rom, cartridge::PRG_BANK_SIZE};

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn scene_rom() -> Rom {
    nrom_with_chr(random_chr(11), Mirroring::Vertical)
}

/// Register and counter state visible through the public API.
fn observable(console: &TestConsole) -> impl PartialEq + std::fmt::Debug + use<> {
    let ppu = console.ppu();
    (
        (ppu.scanline(), ppu.cycle(), ppu.status()),
        (ppu.vram_address(), ppu.tmp_address(), ppu.fine_x(), ppu.write_toggle()),
        (ppu.sprite_addr(), ppu.sprite0_hit(), ppu.mirroring()),
        ppu.image_palette().to_vec(),
    )
}

#[test]
fn snapshot_round_trips_mid_frame() -> Result<()> {
    for scanline in [120, 245, 261] {
        let mut original = console_with(scene_rom())?;
        busy_scene(&mut original, 5)?;
        run_to_scanline(&mut original, scanline)?;
        let bytes = original.state_save().context("saving snapshot")?;

        let mut restored = console_with(scene_rom())?;
        restored
            .restore_state(&bytes)
            .with_context(|| format!("restoring at scanline {scanline}"))?;
        ensure!(observable(&restored) == observable(&original), "scanline {scanline}");
        ensure!(restored.cpu_memory() == original.cpu_memory());
        ensure!(restored.ppu().vram() == original.ppu().vram());
        ensure!(restored.ppu().sprites() == original.ppu().sprites());

        original.step(2 * FRAME_CPU_CYCLES);
        restored.step(2 * FRAME_CPU_CYCLES);
        ensure!(observable(&restored) == observable(&original));
        ensure!(
            restored.video().last == original.video().last,
            "frames diverge after restoring at scanline {scanline}"
        );
    }
    Ok(())
}

#[test]
fn unknown_snapshot_version_is_refused() -> Result<()> {
    let mut console = console_with(scene_rom())?;
    busy_scene(&mut console, 9)?;
    let mut bytes = console.state_save()?;
    bytes[0] = 2;

    console.step(1000);
    let before = observable(&console);
    let err = console.restore_state(&bytes).unwrap_err();
    ensure!(matches!(err, Error::UnsupportedStateVersion(2)), "{err}");
    ensure!(!console.state_load(&bytes));
    ensure!(observable(&console) == before);
    Ok(())
}

#[test]
fn truncated_snapshot_changes_nothing() -> Result<()> {
    let mut console = console_with(scene_rom())?;
    busy_scene(&mut console, 3)?;
    let mut bytes = console.state_save()?;
    bytes.truncate(bytes.len() - 64);

    console.cpu_write(0x0010, 0x99);
    let before = observable(&console);
    ensure!(!console.state_load(&bytes));
    ensure!(observable(&console) == before);
    ensure!(console.cpu_read(0x0010) == 0x99);
    Ok(())
}

#[test]
fn invalid_rom_is_refused() -> Result<()> {
    let mut console = new_console(RenderOptions::default());
    let rom = Rom::new(0, vec![0; PRG_BANK_SIZE / 2], Vec::new(), Mirroring::Vertical);
    ensure!(!rom.is_valid());
    ensure!(!console.load_rom(rom));
    ensure!(console.rom().is_none());
    ensure!(console.mapper().is_none());
    ensure!(console.cpu().interrupts.is_empty());
    Ok(())
}

#[test]
fn taito_irq_fires_on_the_fifth_rendered_line() -> Result<()> {
    let mut console = console_with(numbered_rom(48, 4, 4))?;
    console.cpu_write(0xC000, 5);
    console.cpu_write(0xC001, 1);
    console.cpu_write(0x2001, 0x18);

    run_to_scanline(&mut console, 25)?;
    ensure!(console.cpu().count(Interrupt::Irq) == 0);
    run_to_scanline(&mut console, 26)?;
    ensure!(console.cpu().count(Interrupt::Irq) == 1);

    console.step(FRAME_CPU_CYCLES);
    ensure!(console.cpu().count(Interrupt::Irq) == 1);
    Ok(())
}

#[test]
fn taito_mirroring_and_banks_through_the_bus() -> Result<()> {
    let mut console = console_with(numbered_rom(48, 4, 4))?;
    ensure!(console.cpu_read(0xE000) == 7);
    console.cpu_write(0x8000, 3);
    ensure!(console.cpu_read(0x8000) == 3);
    console.cpu_write(0xE000, 0x40);
    ensure!(console.mirroring() == Some(Mirroring::Horizontal));
    console.cpu_write(0xE000, 0);
    ensure!(console.mirroring() == Some(Mirroring::Vertical));
    Ok(())
}

#[test]
fn camerica_bank_select_and_reset() -> Result<()> {
    let mut console = console_with(numbered_rom(71, 4, 0))?;
    ensure!(console.cpu_read(0xC000) == 6);
    console.cpu_write(0xC000, 2);
    ensure!(console.cpu_read(0x8000) == 4);
    console.cpu_write(0x9000, 0x10);
    ensure!(console.mirroring() == Some(Mirroring::SingleScreenUpper));

    console.reset();
    ensure!(console.cpu_read(0x8000) == 0);
    console.cpu_write(0xC000, 2);
    ensure!(console.cpu_read(0x8000) == 4);
    Ok(())
}

#[test]
fn battery_ram_is_restored_on_load() -> Result<()> {
    let rom = numbered_rom(0, 1, 0).with_battery_ram(&[0xAB; 16]);
    let mut console = console_with(rom)?;
    ensure!(console.cpu_read(0x600F) == 0xAB);
    console.cpu_write(0x6000, 0x01);
    let bytes = console.state_save()?;

    console.cpu_write(0x6000, 0x02);
    ensure!(console.state_load(&bytes));
    ensure!(console.cpu_read(0x6000) == 0x01);
    ensure!(console.battery_ram().map(|ram| ram[0]) == Some(0x01));
    Ok(())
}
