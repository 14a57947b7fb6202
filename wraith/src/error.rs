//! The error types surfaced by the emulator. Only cartridge loading, battery RAM loading, and
//! configuration parsing can fail. The running machine never fails; the one exception is the
//! CPU locking up on an illegal opcode, which is reported through [`LockedUp`].

use thiserror::Error;

/// Errors that prevent a cartridge image from being turned into a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("cartridge image is {len} bytes, too short to contain a header")]
    Truncated { len: usize },
    #[error("header checksum mismatch: header says 0x{expected:0>2X}, computed 0x{found:0>2X}")]
    HeaderChecksum { expected: u8, found: u8 },
    #[error("unsupported cartridge type: 0x{0:0>2X}")]
    UnsupportedCartridge(u8),
    #[error("unknown ROM size code: 0x{0:0>2X}")]
    UnknownRomSize(u8),
    #[error("unknown RAM size code: 0x{0:0>2X}")]
    UnknownRamSize(u8),
}

/// Errors returned when restoring battery-backed cartridge RAM.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatteryError {
    #[error("cartridge has no battery-backed RAM")]
    NoBattery,
    #[error("battery RAM is {expected} bytes, but {found} bytes were provided")]
    SizeMismatch { expected: usize, found: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The CPU fetched one of the opcodes that have no instruction behind them. Real hardware stops
/// responding at this point, and so does the emulator until it is reset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[error("CPU locked up on illegal opcode 0x{opcode:0>2X} at 0x{address:0>4X}")]
pub struct LockedUp {
    pub opcode: u8,
    pub address: u16,
}
