use serde::{Deserialize, Serialize};

use crate::error::CartridgeError;

/// This struct represents a DMG ROM header. Per the Pan Docs, the header of the ROM occupies the
/// region between `0x100` and `0x14F`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x143`. Titles shorter than 16 characters are
    /// zero-padded; the padding is stripped here.
    pub title: String,
    /// The new licensee code stored at bytes `0x144` and `0x145`.
    pub new_licensee: [u8; 2],
    /// The unsigned byte at `0x146`. `0x03` indicates SGB support.
    pub sgb: u8,
    /// The unsigned byte at `0x147`. Selects the memory bank controller.
    pub cartridge_type: u8,
    /// The unsigned byte at `0x148`. The ROM is `32 KiB << rom_size` long.
    pub rom_size: u8,
    /// The unsigned byte at `0x149`.
    pub ram_size: u8,
    /// The unsigned byte at `0x14A`. Here false (or `0x0`) is "Japan-only" and true (or `0x1`)
    /// is "overseas".
    pub destination: bool,
    /// The unsigned byte at `0x14B`. `0x33` means the new licensee code is used instead.
    pub old_licensee: u8,
    /// The unsigned byte at `0x14C`.
    pub mask_rom_version: u8,
    /// The unsigned byte at `0x14D`. On start, the header is checksummed. The check spans
    /// `0x134..=0x14C`, and the cartridge is refused if the result does not match this value.
    pub header_checksum: u8,
    /// The unsigned integer at bytes `0x14E` and `0x14F`. This is a checksum of the entire ROM
    /// sans these two bytes. Hardware never checks it, so neither do we.
    pub global_checksum: u16,
}

/// The bank controller family named by the cartridge type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartridgeKind {
    RomOnly,
    MBC1,
    MBC2,
    MBC3,
    MBC5,
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;
    pub const LENGTH: usize = Self::END_ADDR - Self::START_ADDR + 1;

    /// Pulls the header out of a ROM image. No validation beyond the length of the image is
    /// done here; see [`CartridgeHeader::validate`].
    pub fn extract_from_rom(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() <= Self::END_ADDR {
            return Err(CartridgeError::Truncated { len: rom.len() });
        }
        let title = rom[0x134..=0x143]
            .iter()
            .take_while(|b| **b != 0)
            .map(|&b| b as char)
            .collect();
        Ok(Self {
            title,
            new_licensee: [rom[0x144], rom[0x145]],
            sgb: rom[0x146],
            cartridge_type: rom[0x147],
            rom_size: rom[0x148],
            ram_size: rom[0x149],
            destination: rom[0x14A] != 0x0,
            old_licensee: rom[0x14B],
            mask_rom_version: rom[0x14C],
            header_checksum: rom[0x14D],
            global_checksum: u16::from_be_bytes([rom[0x14E], rom[0x14F]]),
        })
    }

    /// Checks everything that the emulator relies upon: the header checksum, the cartridge type,
    /// and the ROM and RAM size codes.
    pub fn validate(&self, rom: &[u8]) -> Result<(), CartridgeError> {
        let found = header_checksum(&rom[0x134..=0x14C]);
        if found != self.header_checksum {
            return Err(CartridgeError::HeaderChecksum {
                expected: self.header_checksum,
                found,
            });
        }
        self.kind()?;
        self.rom_bank_count()?;
        self.ram_len()?;
        Ok(())
    }

    pub fn kind(&self) -> Result<CartridgeKind, CartridgeError> {
        match self.cartridge_type {
            0x00 | 0x08 | 0x09 => Ok(CartridgeKind::RomOnly),
            0x01..=0x03 => Ok(CartridgeKind::MBC1),
            0x05 | 0x06 => Ok(CartridgeKind::MBC2),
            0x0F..=0x13 => Ok(CartridgeKind::MBC3),
            0x19..=0x1E => Ok(CartridgeKind::MBC5),
            n => Err(CartridgeError::UnsupportedCartridge(n)),
        }
    }

    /// The number of 16 KiB ROM banks.
    pub fn rom_bank_count(&self) -> Result<usize, CartridgeError> {
        match self.rom_size {
            n @ 0x00..=0x08 => Ok(2 << n),
            n => Err(CartridgeError::UnknownRomSize(n)),
        }
    }

    /// The number of bytes of cartridge RAM, as given by the RAM size code.
    pub fn ram_len(&self) -> Result<usize, CartridgeError> {
        match self.ram_size {
            0x00 => Ok(0),
            0x01 => Ok(2 * 1024),
            0x02 => Ok(8 * 1024),
            0x03 => Ok(32 * 1024),
            0x04 => Ok(128 * 1024),
            0x05 => Ok(64 * 1024),
            n => Err(CartridgeError::UnknownRamSize(n)),
        }
    }

    /// Whether or not the cartridge's RAM (or clock) keeps its contents while powered off.
    pub fn has_battery(&self) -> bool {
        matches!(
            self.cartridge_type,
            0x03 | 0x06 | 0x09 | 0x0D | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E
        )
    }

    pub fn has_rtc(&self) -> bool {
        matches!(self.cartridge_type, 0x0F | 0x10)
    }
}

/// Computes the header checksum over `0x134..=0x14C`.
pub fn header_checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1))
}

/// Builds a minimal, valid cartridge image. The program is placed at the entry point (0x100) and
/// the header is filled in around it, so programs must keep to 4 bytes or jump over the header.
#[cfg(test)]
pub(crate) fn test_rom(cart_type: u8, rom_size: u8, ram_size: u8, program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0; (32 * 1024) << rom_size];
    rom[0x100..0x100 + program.len()].copy_from_slice(program);
    rom[0x134..0x13C].copy_from_slice(b"WRAITH\0\0");
    rom[0x147] = cart_type;
    rom[0x148] = rom_size;
    rom[0x149] = ram_size;
    rom[0x14D] = header_checksum(&rom[0x134..=0x14C]);
    rom
}
