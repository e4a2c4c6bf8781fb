//! Picture processing unit and cartridge mapper core for an NES emulator.
//!
//! The crate exposes three layers:
//!
//! - [`ppu::Ppu`]: register ports, the scanline/cycle state machine and the
//!   partial-frame renderer.
//! - [`cartridge`]: the [`cartridge::Mapper`] contract, the shared
//!   [`cartridge::BankSwitcher`] and the supported boards.
//! - [`console::Console`]: a thin owner that wires the two together behind a
//!   CPU-side bus. The CPU interpreter itself is not part of this crate and is
//!   reached through [`bus::CpuPort`].

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod ram;
pub mod state;

pub use bus::{CpuPort, Interrupt, VideoSink};
pub use cartridge::{Mapper, Mirroring, Rom};
pub use config::{Region, RenderOptions};
pub use console::Console;
pub use error::Error;
pub use ppu::Ppu;

/// Visible frame width in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// Visible frame height in pixels.
pub const SCREEN_HEIGHT: usize = 240;
