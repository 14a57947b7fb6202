//! Wraith is a cycle-counted emulator core for the original (DMG) Game Boy. Everything needed to
//! take a cartridge image and run it lives here: the CPU, the memory bus and bank controllers,
//! the PPU, and the timer. The crate is free of any platform specifics. It does no file IO and
//! draws nothing; a frontend feeds it a ROM and button presses and reads back finished frames.
//!
//! The whole machine is a single [`Gameboy`] value that is stepped forward one instruction at a
//! time. It can be serialized between any two steps to take a snapshot.
//!
//! # Notes
//! The SM83 CPU is little endian.

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod config;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod lookup;
pub mod mem;
pub mod ppu;
pub mod rom;
pub(crate) mod utils;

pub use config::Config;
pub use cpu::Cpu;
pub use error::{BatteryError, CartridgeError, ConfigError, LockedUp};
pub use instruction::InterruptOp;
pub use mem::vram::PpuMode;
pub use ppu::Framebuffer;
pub use rom::CartridgeHeader;

use mem::{MemoryBankController, MemoryLike, MemoryMap};
use ppu::Ppu;

/// The number of cycles the machine runs per second.
pub const CLOCK_SPEED: u32 = 4_194_304;

/// This is the core emulation primative. It contains the entire state machine of the emulated
/// handheld and is agnostic to usecase and how it is rendered (if at all). Notably, the `Gameboy`
/// does not provide a `run` or analogous method. It must be stepped forward.
///
/// This allows managing tick rate, processing IO, and more to be done externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gameboy {
    cpu: Cpu,
    mem: MemoryMap,
    ppu: Ppu,
    header: CartridgeHeader,
    config: Config,
}

/// A button on the handheld.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonInput {
    Joypad(JoypadInput),
    Ssab(SsabInput),
}

/// The d-pad. The discriminants are the button's bit in the joypad register.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, strum::EnumIter, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum JoypadInput {
    Right = 0x1,
    Left = 0x2,
    Up = 0x4,
    Down = 0x8,
}

/// The Start, Select, A, and B buttons. The discriminants are the button's bit in the joypad
/// register.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, strum::EnumIter, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum SsabInput {
    A = 0x1,
    B = 0x2,
    Select = 0x4,
    Start = 0x8,
}

impl From<JoypadInput> for ButtonInput {
    fn from(value: JoypadInput) -> Self {
        Self::Joypad(value)
    }
}

impl From<SsabInput> for ButtonInput {
    fn from(value: SsabInput) -> Self {
        Self::Ssab(value)
    }
}

impl Gameboy {
    /// Takes the data stored on a game cartridge and builds a machine around it, in the state
    /// that the boot ROM leaves it.
    pub fn new(cart: impl Into<Vec<u8>>) -> Result<Self, CartridgeError> {
        Self::with_config(cart, Config::default())
    }

    pub fn with_config(cart: impl Into<Vec<u8>>, config: Config) -> Result<Self, CartridgeError> {
        let (mbc, header) = MemoryBankController::new(cart.into())?;
        info!("Starting session for \"{}\"", header.title);
        Ok(Self {
            cpu: Cpu::new(),
            mem: MemoryMap::new(mbc, &config),
            ppu: Ppu::new(),
            header,
            config,
        })
    }

    /// Runs a single instruction (or interrupt dispatch) and then lets every other device catch
    /// up. Returns the number of cycles that passed.
    pub fn step(&mut self) -> Result<u8, LockedUp> {
        let cycles = self.cpu.step(&mut self.mem)?;
        self.mem.tick(cycles);
        self.ppu.tick(cycles, &mut self.mem);
        Ok(cycles)
    }

    /// Steps until the PPU finishes the current frame. If the LCD is off, no frame will ever
    /// finish, so this returns once a frame's worth of cycles has passed instead.
    pub fn next_frame(&mut self) -> Result<(), LockedUp> {
        let frame = self.ppu.frame_count();
        let mut cycles = 0;
        while self.ppu.frame_count() == frame {
            cycles += self.step()? as u32;
            if cycles >= ppu::DOTS_PER_FRAME && !self.mem.io.lcd_enabled() {
                break;
            }
        }
        Ok(())
    }

    /// The last completed frame.
    pub fn frame(&self) -> &Framebuffer {
        self.ppu.frame()
    }

    pub fn frame_count(&self) -> u64 {
        self.ppu.frame_count()
    }

    pub fn press(&mut self, button: impl Into<ButtonInput>) {
        self.mem.register_button_input(button.into());
    }

    pub fn release(&mut self, button: impl Into<ButtonInput>) {
        self.mem.register_button_release(button.into());
    }

    /// The cartridge RAM, if the cartridge keeps it alive with a battery.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.header
            .has_battery()
            .then(|| self.mem.mbc().ram())
            .filter(|ram| !ram.is_empty())
    }

    /// Restores battery-backed cartridge RAM, e.g. from a save file.
    pub fn load_battery_ram(&mut self, data: &[u8]) -> Result<(), BatteryError> {
        let ram = self.mem.mbc_mut().ram_mut();
        if !self.header.has_battery() || ram.is_empty() {
            return Err(BatteryError::NoBattery);
        }
        if ram.len() != data.len() {
            return Err(BatteryError::SizeMismatch {
                expected: ram.len(),
                found: data.len(),
            });
        }
        ram.copy_from_slice(data);
        Ok(())
    }

    /// Puts the machine back into its post-boot state. The cartridge RAM is kept, much like
    /// pressing the power switch on a cartridge with a battery.
    pub fn reset(&mut self) {
        info!("Resetting session");
        self.cpu = Cpu::new();
        self.mem.reset(&self.config);
        self.ppu = Ppu::new();
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads a byte as the CPU would see it right now.
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.mem.read_byte(addr)
    }

    /// Every byte that has been sent over the link port.
    pub fn serial_output(&self) -> &[u8] {
        self.mem.serial_output()
    }

    pub fn is_locked(&self) -> Option<LockedUp> {
        self.cpu.is_locked()
    }
}
