use crate::bus::{CpuPort, Interrupt, VideoSink};

/// Records every request the core makes on the CPU.
#[derive(Debug, Default)]
pub(crate) struct RecordingCpu {
    pub(crate) interrupts: Vec<Interrupt>,
    pub(crate) halted: u32,
}

impl CpuPort for RecordingCpu {
    fn request_interrupt(&mut self, kind: Interrupt) {
        self.interrupts.push(kind);
    }

    fn halt_cycles(&mut self, cycles: u32) {
        self.halted += cycles;
    }
}

/// Counts frames and keeps the last one.
#[derive(Debug, Default)]
pub(crate) struct FrameCounter {
    pub(crate) frames: usize,
    pub(crate) last: Vec<u32>,
    pub(crate) software_scaling: bool,
}

impl VideoSink for FrameCounter {
    fn image_ready(&mut self, frame: &[u32], _skip_frame: bool) {
        self.frames += 1;
        self.last.clear();
        self.last.extend_from_slice(frame);
    }

    fn scaling_enabled(&self) -> bool {
        self.software_scaling
    }

    fn hw_scaling(&self) -> bool {
        !self.software_scaling
    }
}
