use super::VramAddr;

/// Scroll counters, latched scroll registers and the shared write toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct VramRegisters {
    /// Counters used while scanning; also the `$2007` address.
    pub(crate) v: VramAddr,
    /// Latched registers loaded by `$2000/$2005/$2006`.
    pub(crate) t: VramAddr,
    /// Fine X scroll (0..7).
    pub(crate) x: u8,
    /// Set once the first half of a `$2005/$2006` pair has been written.
    pub(crate) w: bool,
}

impl VramRegisters {
    /// `$2005`: horizontal scroll first, vertical scroll second.
    pub(crate) fn write_scroll(&mut self, value: u8) {
        let (coarse, fine) = (value >> 3, value & 7);
        let second = self.w;
        self.w = !second;
        match second {
            false => {
                self.t.set_coarse_x(coarse);
                self.x = fine;
            }
            true => {
                self.t.set_coarse_y(coarse);
                self.t.set_fine_y(fine);
            }
        }
    }

    /// `$2006`: high six bits first, low byte second. The second half also
    /// copies the latch into the counters and returns `true`.
    pub(crate) fn write_addr(&mut self, value: u8) -> bool {
        let complete = self.w;
        self.w = !complete;
        let latch = self.t.raw();
        if complete {
            self.t.set_raw((latch & 0x7F00) | u16::from(value));
            self.v = self.t;
        } else {
            self.t.set_raw((u16::from(value & 0x3F) << 8) | (latch & 0x00FF));
        }
        complete
    }

    pub(crate) fn reset_latch(&mut self) {
        self.w = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_pair_fills_x_then_y() {
        let mut regs = VramRegisters::default();
        regs.write_scroll(0b0101_0011);
        assert!(regs.w);
        assert_eq!((regs.t.coarse_x(), regs.x), (0b01010, 0b011));

        regs.write_scroll(0b1110_1101);
        assert!(!regs.w);
        assert_eq!((regs.t.coarse_y(), regs.t.fine_y()), (0b11101, 0b101));
        assert_eq!(regs.v, VramAddr::default());
    }

    #[test]
    fn address_write_after_one_scroll_write_is_the_second_half() {
        let mut regs = VramRegisters::default();
        regs.write_scroll(0x08);
        assert!(regs.write_addr(0x34));
        assert!(!regs.w);
        assert_eq!(regs.v.raw(), 0x0034);

        assert!(!regs.write_addr(0x21));
        assert!(regs.write_addr(0x08));
        assert_eq!(regs.v.raw(), 0x2108);
    }
}
