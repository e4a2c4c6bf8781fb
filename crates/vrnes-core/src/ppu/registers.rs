//! CPU-visible PPU register state and the internal scroll latches.

mod control;
mod mask;
mod status;
mod vram_addr;
mod vram_registers;

pub(crate) use control::Control;
pub(crate) use mask::Mask;
pub(crate) use status::Status;
pub use vram_addr::VramAddr;
pub(crate) use vram_registers::VramRegisters;

/// Aggregates the state of all CPU visible PPU registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct Registers {
    /// Control register 1 (`$2000`).
    pub(crate) control: Control,
    /// Control register 2 (`$2001`).
    pub(crate) mask: Mask,
    /// Status register (`$2002`).
    pub(crate) status: Status,
    /// Sprite memory pointer driven by `$2003`/`$2004`.
    pub(crate) sprite_addr: u8,
    /// Scroll counters/registers.
    pub(crate) vram: VramRegisters,
    /// Delayed `$2007` read buffer.
    pub(crate) read_buffer: u8,
}

impl Registers {
    /// Updates control, also syncing the nametable bits into the latched registers.
    pub(crate) fn write_control(&mut self, value: u8) {
        self.control = Control::from_bits_retain(value);
        self.vram.t.set_nametable(self.control.nametable_index());
    }

    /// Reads `$2002`: returns the flags, clears vblank and the write toggle.
    pub(crate) fn read_status(&mut self) -> u8 {
        let value = self.status.bits();
        self.status.remove(Status::VERTICAL_BLANK);
        self.vram.reset_latch();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_read_resets_scroll_latch() {
        let mut regs = Registers::default();
        regs.status.insert(Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT);
        regs.vram.write_scroll(0x10);
        assert!(regs.vram.w);

        assert_eq!(regs.read_status(), 0xC0);
        assert!(!regs.vram.w);
        assert_eq!(regs.status, Status::SPRITE_ZERO_HIT);
    }

    #[test]
    fn address_writes_fill_high_then_low_half() {
        let mut regs = Registers::default();
        assert!(!regs.vram.write_addr(0x7F));
        assert!(regs.vram.write_addr(0x34));
        assert_eq!(regs.vram.v.raw(), 0x3F34);
        assert_eq!(regs.vram.t.raw(), 0x3F34);
    }

    #[test]
    fn control_write_sets_latched_nametable() {
        let mut regs = Registers::default();
        regs.write_control(0x83);
        assert_eq!(regs.vram.t.nametable(), 3);
        assert!(regs.control.nmi_enabled());
    }
}
