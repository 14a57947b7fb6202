use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;

use super::ram_offset;

/// A cartridge without a bank controller: 32 KiB of ROM and up to one bank of RAM that is always
/// accessible.
#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direct {
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) rom: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) ram: Vec<u8>,
}

impl Direct {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        Self {
            rom,
            ram: vec![0; ram_size],
        }
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x7FFF => self.rom.get(index as usize).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => ram_offset(&self.ram, 0, index)
                .map(|i| self.ram[i])
                .unwrap_or(0xFF),
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        if let 0xA000..=0xBFFF = index {
            if let Some(i) = ram_offset(&self.ram, 0, index) {
                self.ram[i] = value;
            }
        }
    }
}
