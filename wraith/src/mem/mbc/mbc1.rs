use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::info;
use tracing::trace;

use super::{ram_enable_write, ram_offset, rom_offset};

#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC1 {
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) rom: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) ram: Vec<u8>,
    /// The lower five bits of the ROM bank number. Written via 0x2000-0x3FFF. A write of zero is
    /// stored as one.
    bank_index_one: u8,
    /// A two-bit register written via 0x4000-0x5FFF. Used as the upper bits of the ROM bank or
    /// as the RAM bank, depending on the banking mode.
    bank_index_two: u8,
    /// Determines if RAM can be read from and written to. The actual hardware uses an 8-bit
    /// register, so RAM is enabled when the lower nibble is `0xA`.
    ///
    /// Initially set to `false`, any writes to the memory addresses 0x0000 through 0x1FFF write to
    /// this register.
    ram_enabled: bool,
    /// Determines how `bank_index_two` is used. Written via 0x6000-0x7FFF.
    banking_mode: BankingMode,
}

impl Display for MBC1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC1 {{")?;
        writeln!(f, "  MODE:  {}", self.banking_mode)?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  BANK1: 0b{:0>8b}", self.bank_index_one)?;
        writeln!(f, "  BANK2: 0b{:0>8b}", self.bank_index_two)?;
        writeln!(f, "  rom_bank: 0x{:0>2X}", self.rom_bank())?;
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum BankingMode {
    Simple = 0,
    Advanced = 1,
}

impl BankingMode {
    fn from_byte(value: u8) -> Self {
        if (value & 0x1) == 0 {
            Self::Simple
        } else {
            Self::Advanced
        }
    }
}

impl MBC1 {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        Self {
            rom,
            ram: vec![0; ram_size],
            bank_index_one: 1,
            bank_index_two: 0,
            ram_enabled: false,
            banking_mode: BankingMode::Simple,
        }
    }

    pub(super) fn reset(&mut self) {
        self.bank_index_one = 1;
        self.bank_index_two = 0;
        self.ram_enabled = false;
        self.banking_mode = BankingMode::Simple;
    }

    /// The bank mapped into 0x0000-0x3FFF. Only advanced mode can change it.
    #[inline]
    pub fn first_rom_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => (self.bank_index_two as usize) << 5,
        }
    }

    #[inline]
    pub fn rom_bank(&self) -> usize {
        ((self.bank_index_two as usize) << 5) | self.bank_index_one as usize
    }

    /// NOTE: This does *not* take RAM enablement into consideration.
    #[inline]
    pub fn ram_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => self.bank_index_two as usize,
        }
    }

    #[inline]
    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x3FFF => self.rom[rom_offset(&self.rom, self.first_rom_bank(), index)],
            0x4000..=0x7FFF => self.rom[rom_offset(&self.rom, self.rom_bank(), index)],
            0xA000..=0xBFFF if self.ram_enabled => ram_offset(&self.ram, self.ram_bank(), index)
                .map(|i| self.ram[i])
                .unwrap_or(0xFF),
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..=0x1FFF => self.ram_enabled = ram_enable_write(value),
            0x2000..=0x3FFF => {
                // Only the bottom five bits are wired. A zero in those bits is read as a one,
                // so banks 0x20, 0x40, and 0x60 are never reachable here.
                self.bank_index_one = match value & 0x1F {
                    0 => 1,
                    n => n,
                };
                trace!("MBC1 switched to ROM bank 0x{:0>2X}", self.rom_bank());
            }
            0x4000..=0x5FFF => self.bank_index_two = value & 0b11,
            0x6000..=0x7FFF => {
                let mode = BankingMode::from_byte(value);
                if mode != self.banking_mode {
                    info!("MBC1 banking mode changed to {mode}");
                }
                self.banking_mode = mode;
            }
            0xA000..=0xBFFF if self.ram_enabled => {
                if let Some(i) = ram_offset(&self.ram, self.ram_bank(), index) {
                    self.ram[i] = value;
                }
            }
            _ => {}
        }
    }
}
