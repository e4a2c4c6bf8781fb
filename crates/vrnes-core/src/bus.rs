//! Capabilities the core borrows from its owner while it runs.
//!
//! Nothing in the core keeps a pointer to the console. Each call that needs
//! to reach outside its own state receives a short-lived bundle of borrowed
//! capabilities: [`PpuBus`] for the PPU, [`MapperHost`] for mappers.

use std::fmt::Debug;

use crate::{cartridge::Mapper, ppu::Ppu, ram};

#[cfg(test)]
pub(crate) mod mock;

/// Interrupt lines the core can raise on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// Vertical blank NMI.
    Nmi,
    /// Cartridge IRQ.
    Irq,
    /// Reset line, pulsed after a mapper has mapped a fresh ROM.
    Reset,
}

/// CPU-side sink for interrupt requests and DMA stalls.
///
/// Requests are delivered synchronously from inside a step; latching and
/// servicing them at the next instruction boundary is the CPU's business.
pub trait CpuPort: Debug {
    fn request_interrupt(&mut self, kind: Interrupt);

    /// Stall the CPU for `cycles` CPU cycles.
    fn halt_cycles(&mut self, cycles: u32);
}

/// Presentation layer receiving finished frames.
pub trait VideoSink: Debug {
    /// A complete 256×240 `0x00RRGGBB` frame is ready.
    fn image_ready(&mut self, frame: &[u32], skip_frame: bool);

    /// Output is scaled before display.
    fn scaling_enabled(&self) -> bool {
        false
    }

    /// Scaling is done by hardware; software scalers need dirty rows instead.
    fn hw_scaling(&self) -> bool {
        true
    }
}

/// Borrowed capabilities for one PPU call.
pub struct PpuBus<'a> {
    pub cpu: &'a mut dyn CpuPort,
    /// CPU address space, read by sprite DMA.
    pub cpu_mem: &'a ram::cpu::AddressSpace,
    pub mapper: Option<&'a mut (dyn Mapper + 'static)>,
    pub video: &'a mut dyn VideoSink,
}

/// Borrowed capabilities for one mapper call.
///
/// Bank switches copy ROM data into `cpu_mem` (PRG windows) and into the
/// PPU pattern memory (CHR windows); mirroring changes go straight to `ppu`.
pub struct MapperHost<'a> {
    pub cpu_mem: &'a mut ram::cpu::AddressSpace,
    pub ppu: &'a mut Ppu,
    pub cpu: &'a mut dyn CpuPort,
}
