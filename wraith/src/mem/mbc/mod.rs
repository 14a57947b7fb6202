use std::fmt::Debug;

mod direct;
mod mbc1;
mod mbc2;
mod mbc3;
mod mbc5;

pub use direct::*;
pub use mbc1::*;
pub use mbc2::*;
pub use mbc3::*;
pub use mbc5::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::error::CartridgeError;
use crate::rom::{CartridgeHeader, CartridgeKind};

/// The size of a ROM banks, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM banks, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// RAM is enabled by writing a value with this lower nibble into the RAM enable register.
pub(crate) const RAM_ENABLE_PATTERN: u8 = 0x0A;

pub(crate) fn ram_enable_write(value: u8) -> bool {
    value & 0x0F == RAM_ENABLE_PATTERN
}

#[derive(Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryBankController {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF. An additional 8 KiB of RAM could be connected. This 8 KiB starts at
    /// 0xA000 and extends to 0xBFFF.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/nombc.html).
    Direct(Direct),
    /// This memory controller is the first MBC chip. It supports up to 2 MiB of ROM and 32 KiB
    /// of RAM, though not both at once. The two-bit secondary bank register is shared between
    /// the upper ROM bank bits and the RAM bank, depending on the banking mode.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC1.html).
    MBC1(MBC1),
    /// Up to 256 KiB of ROM and a built-in 512 half-byte RAM.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC2.html).
    MBC2(MBC2),
    /// Up to 2 MiB of ROM, 32 KiB of RAM, and (optionally) a real time clock.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC3.html).
    MBC3(MBC3),
    /// Up to 8 MiB of ROM and 128 KiB of RAM. Unlike its predecessors, bank 0 can be mapped into
    /// the switchable region.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC5.html).
    MBC5(MBC5),
}

impl MemoryBankController {
    /// Parses and validates the cartridge header and builds the matching controller. The ROM
    /// image is padded (with 0xFF) or cut to the size that the header declares.
    pub fn new(mut cart: Vec<u8>) -> Result<(Self, CartridgeHeader), CartridgeError> {
        let header = CartridgeHeader::extract_from_rom(&cart)?;
        header.validate(&cart)?;
        let kind = header.kind()?;
        let rom_banks = header.rom_bank_count()?;
        let rom_size = rom_banks * ROM_BANK_SIZE;
        if rom_size > cart.len() {
            warn!(
                "Cartridge declares {rom_size} bytes of ROM but the image is {} bytes; padding",
                cart.len()
            );
            cart.resize(rom_size, 0xFF);
        } else if rom_size < cart.len() {
            warn!(
                "Cartridge declares {rom_size} bytes of ROM but the image is {} bytes; truncating",
                cart.len()
            );
            cart.truncate(rom_size);
        }
        let ram_size = header.ram_len()?;
        info!(
            "Loading {:?} cartridge \"{}\" (type 0x{:0>2X}) with {rom_banks} ROM banks and {ram_size} bytes of RAM",
            kind, header.title, header.cartridge_type
        );
        let mbc = match kind {
            CartridgeKind::RomOnly => Self::Direct(Direct::new(cart, ram_size)),
            CartridgeKind::MBC1 => Self::MBC1(MBC1::new(cart, ram_size)),
            CartridgeKind::MBC2 => Self::MBC2(MBC2::new(cart)),
            CartridgeKind::MBC3 => Self::MBC3(MBC3::new(cart, ram_size, header.has_rtc())),
            CartridgeKind::MBC5 => Self::MBC5(MBC5::new(cart, ram_size)),
        };
        Ok((mbc, header))
    }

    pub(crate) fn read_byte(&self, index: u16) -> u8 {
        match self {
            MemoryBankController::Direct(controller) => controller.read_byte(index),
            MemoryBankController::MBC1(controller) => controller.read_byte(index),
            MemoryBankController::MBC2(controller) => controller.read_byte(index),
            MemoryBankController::MBC3(controller) => controller.read_byte(index),
            MemoryBankController::MBC5(controller) => controller.read_byte(index),
        }
    }

    pub(crate) fn write_byte(&mut self, index: u16, value: u8) {
        match self {
            MemoryBankController::Direct(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC1(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC2(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC3(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC5(controller) => controller.write_byte(index, value),
        }
    }

    /// Advances any clocked hardware on the cartridge.
    pub(crate) fn tick(&mut self, cycles: u32) {
        if let MemoryBankController::MBC3(controller) = self {
            controller.tick(cycles)
        }
    }

    /// Puts all of the banking registers back into their power-on state. The contents of RAM are
    /// kept.
    pub(crate) fn reset(&mut self) {
        match self {
            MemoryBankController::Direct(_) => {}
            MemoryBankController::MBC1(controller) => controller.reset(),
            MemoryBankController::MBC2(controller) => controller.reset(),
            MemoryBankController::MBC3(controller) => controller.reset(),
            MemoryBankController::MBC5(controller) => controller.reset(),
        }
    }

    /// The entirety of the cartridge's RAM, regardless of banking or enablement.
    pub fn ram(&self) -> &[u8] {
        match self {
            MemoryBankController::Direct(controller) => &controller.ram,
            MemoryBankController::MBC1(controller) => &controller.ram,
            MemoryBankController::MBC2(controller) => &controller.ram,
            MemoryBankController::MBC3(controller) => &controller.ram,
            MemoryBankController::MBC5(controller) => &controller.ram,
        }
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        match self {
            MemoryBankController::Direct(controller) => &mut controller.ram,
            MemoryBankController::MBC1(controller) => &mut controller.ram,
            MemoryBankController::MBC2(controller) => &mut controller.ram,
            MemoryBankController::MBC3(controller) => &mut controller.ram,
            MemoryBankController::MBC5(controller) => &mut controller.ram,
        }
    }

    /// The number of the bank currently mapped into 0x4000-0x7FFF.
    pub fn rom_bank(&self) -> usize {
        match self {
            MemoryBankController::Direct(_) => 1,
            MemoryBankController::MBC1(controller) => controller.rom_bank(),
            MemoryBankController::MBC2(controller) => controller.rom_bank(),
            MemoryBankController::MBC3(controller) => controller.rom_bank(),
            MemoryBankController::MBC5(controller) => controller.rom_bank(),
        }
    }

    #[cfg(test)]
    pub(crate) fn rom_mut(&mut self) -> &mut Vec<u8> {
        match self {
            MemoryBankController::Direct(controller) => &mut controller.rom,
            MemoryBankController::MBC1(controller) => &mut controller.rom,
            MemoryBankController::MBC2(controller) => &mut controller.rom,
            MemoryBankController::MBC3(controller) => &mut controller.rom,
            MemoryBankController::MBC5(controller) => &mut controller.rom,
        }
    }
}

impl Debug for MemoryBankController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryBankController::Direct(controller) => write!(
                f,
                "Direct {{ rom_size: {}, ram_size: {} }}",
                controller.rom.len(),
                controller.ram.len()
            ),
            MemoryBankController::MBC1(controller) => write!(f, "{controller}"),
            MemoryBankController::MBC2(controller) => write!(f, "{controller}"),
            MemoryBankController::MBC3(controller) => write!(f, "{controller}"),
            MemoryBankController::MBC5(controller) => write!(f, "{controller}"),
        }
    }
}

/// Maps an address in the switchable ROM region (0x4000-0x7FFF) or the fixed region
/// (0x0000-0x3FFF) into the flat ROM image given a bank. The bank is reduced modulo the number of
/// banks the cartridge actually has.
#[inline]
pub(crate) fn rom_offset(rom: &[u8], bank: usize, index: u16) -> usize {
    let banks = (rom.len() / ROM_BANK_SIZE).max(1);
    (bank % banks) * ROM_BANK_SIZE + (index as usize & (ROM_BANK_SIZE - 1))
}

/// The RAM counterpart to [`rom_offset`]. Returns `None` if there is no RAM at all. Carts with
/// less than a full bank of RAM (the 2 KiB variety) mirror it through the whole region.
#[inline]
pub(crate) fn ram_offset(ram: &[u8], bank: usize, index: u16) -> Option<usize> {
    if ram.is_empty() {
        return None;
    }
    let offset = index as usize - 0xA000;
    if ram.len() < RAM_BANK_SIZE {
        return Some(offset % ram.len());
    }
    let banks = ram.len() / RAM_BANK_SIZE;
    Some((bank % banks) * RAM_BANK_SIZE + offset)
}
