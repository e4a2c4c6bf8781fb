//! Cartridge images and the boards that bank-switch them.

pub mod mapper;
mod rom;

pub use mapper::{BankSwitcher, Mapper, ScanlineClock, create_mapper};
pub use rom::{CHR_BANK_SIZE, Mirroring, PRG_BANK_SIZE, Rom};
