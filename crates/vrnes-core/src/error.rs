use thiserror::Error;

/// Errors reported by the loaders of this crate.
///
/// None of these are fatal: the entry points that receive them keep their
/// previous state (or fall back to a built-in default) and report a status.
#[derive(Debug, Error)]
pub enum Error {
    /// Palette file could not be read.
    #[error("failed to read palette: {0}")]
    PaletteIo(#[from] std::io::Error),
    /// A text palette line is not a `#RRGGBB` color.
    #[error("malformed palette entry on line {line}")]
    MalformedPalette { line: usize },
    /// Palette source held fewer than 64 colors.
    #[error("palette holds {actual} colors, expected 64")]
    PaletteTooShort { actual: usize },
    /// Snapshot was written by an unknown format revision.
    #[error("unsupported state version {0}")]
    UnsupportedStateVersion(u8),
    /// Snapshot payload could not be decoded.
    #[error("corrupt state payload: {0}")]
    StateDecode(#[from] postcard::Error),
    /// Snapshot decoded but does not describe a valid machine state.
    #[error("corrupt state: {0}")]
    CorruptState(&'static str),
    /// Snapshot was empty.
    #[error("empty state payload")]
    EmptyState,
    /// ROM image does not satisfy the bank layout a mapper needs.
    #[error("invalid ROM image: {0}")]
    InvalidRom(&'static str),
    /// No board implementation exists for this mapper number.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),
}
