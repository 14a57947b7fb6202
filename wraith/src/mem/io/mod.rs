use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;
use tracing::warn;

use crate::config::Config;
use crate::instruction::InterruptOp;
use crate::utils::check_bit_const;
use crate::ButtonInput;

pub mod timers;

use timers::TimerRegisters;

/// Used to write a new byte into an existing byte where one or more of the bits are read-only.
/// The `mask` should have writable bits set and read-only bits unset. E.g. if the bottom nibble is
/// read-only, the mask should be 0xF0.
pub fn selective_write(existing: &mut u8, mask: u8, new: u8) {
    let masked_existing = *existing & (!mask);
    let masked_new = new & mask;
    *existing = masked_existing | masked_new;
}

/// The number of cycles it takes to shift out one byte using the internal clock (8 bits at
/// 8192 Hz).
const SERIAL_TRANSFER_CYCLES: u16 = 4096;

#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoRegisters {
    /// ADDR FF00
    /// Only bits 4 and 5 are stored here. They select the d-pad and the action buttons,
    /// respectively, and are active low.
    joypad_select: u8,
    /// The currently held d-pad buttons. A set bit means the button is pressed.
    dpad_pressed: u8,
    /// The currently held start, select, A, and B buttons. A set bit means the button is
    /// pressed.
    ssab_pressed: u8,
    /// ADDR FF01, FF02
    serial: SerialPort,
    /// ADDR FF04, FF05, FF06, FF07
    pub tac: TimerRegisters,
    /// ADDR FF0F
    pub interrupt_flags: u8,
    /// ADDR FF10-FF3F
    audio: AudioRegisters,
    /// ADDR FF40
    pub lcd_control: u8,
    /// ADDR FF41
    /// Bits 0-2 are owned by the PPU. Bits 3-6 are the interrupt sources selected by the program.
    pub lcd_status: u8,
    /// ADDR FF42 & FF43
    pub(crate) bg_position: (u8, u8),
    /// ADDR FF44 (set by the PPU)
    pub(crate) lcd_y: u8,
    /// ADDR FF45
    pub(crate) lcd_cmp: u8,
    /// ADDR FF46
    /// The last value written to start an OAM DMA.
    pub(crate) dma: u8,
    /// ADDR FF47
    pub(crate) monochrome_bg_palette: u8,
    /// ADDR FF48 & FF49
    pub(crate) monochrome_obj_palettes: [u8; 2],
    /// ADDR FF4A & FF4B
    pub(crate) window_position: [u8; 2],
}

/// The link port. There is never a device on the other end, so transfers started with the
/// internal clock shift in all ones.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
struct SerialPort {
    /// ADDR FF01
    data: u8,
    /// ADDR FF02
    control: u8,
    /// The cycles left in the transfer that is currently in progress.
    remaining: u16,
    /// Everything that has been sent over the port.
    output: Vec<u8>,
    capture: bool,
    limit: usize,
}

impl SerialPort {
    fn new(config: &Config) -> Self {
        Self {
            data: 0x00,
            control: 0x7E,
            remaining: 0,
            output: Vec::new(),
            capture: config.capture_serial,
            limit: config.serial_limit,
        }
    }

    fn write_control(&mut self, value: u8) {
        self.control = 0b0111_1110 | value;
        // A transfer is only driven by us if the internal clock is selected.
        if value & 0b1000_0001 == 0b1000_0001 {
            if self.capture && self.output.len() < self.limit {
                self.output.push(self.data);
            }
            self.remaining = SERIAL_TRANSFER_CYCLES;
        }
    }

    /// Returns `true` when a transfer completes.
    fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.data = 0xFF;
            self.control &= 0b0111_1111;
            true
        } else {
            false
        }
    }
}

/// The sound registers. Sound is not synthesized, but the registers are still readable. Each
/// register has bits that always read as 1 (write-only or unused bits); these are listed in
/// `READ_MASKS`.
#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
struct AudioRegisters {
    /// FF10-FF3F. The wave pattern RAM is FF30-FF3F.
    #[serde_as(as = "serde_with::Bytes")]
    regs: [u8; 0x30],
}

impl AudioRegisters {
    const NR52: usize = 0x16;

    #[rustfmt::skip]
    const READ_MASKS: [u8; 0x30] = [
        // NR10-NR14, unused
        0x80, 0x3F, 0x00, 0xFF, 0xBF, 0xFF,
        // NR21-NR24, unused
        0x3F, 0x00, 0xFF, 0xBF,
        // NR30-NR34, unused
        0x7F, 0xFF, 0x9F, 0xFF, 0xBF, 0xFF,
        // NR41-NR44
        0xFF, 0x00, 0x00, 0xBF,
        // NR50-NR52
        0x00, 0x00, 0x70,
        // FF27-FF2F are unused
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        // Wave RAM
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn new() -> Self {
        let mut regs = [0; 0x30];
        #[rustfmt::skip]
        let boot = [
            (0x00, 0x80), (0x01, 0xBF), (0x02, 0xF3), (0x04, 0xBF),
            (0x06, 0x3F), (0x09, 0xBF),
            (0x0A, 0x7F), (0x0B, 0xFF), (0x0C, 0x9F), (0x0E, 0xBF),
            (0x10, 0xFF), (0x13, 0xBF),
            (0x14, 0x77), (0x15, 0xF3), (Self::NR52, 0x81),
        ];
        boot.into_iter().for_each(|(i, v)| regs[i] = v);
        Self { regs }
    }

    fn read_byte(&self, index: u16) -> u8 {
        let i = (index - 0xFF10) as usize;
        self.regs[i] | Self::READ_MASKS[i]
    }

    fn write_byte(&mut self, index: u16, value: u8) {
        let i = (index - 0xFF10) as usize;
        match i {
            // Only the power bit is writable. With no synthesis, every channel reads as off.
            // Powering off clears every register besides the wave RAM.
            Self::NR52 => {
                if !check_bit_const::<7>(value) {
                    self.regs[..Self::NR52].fill(0);
                }
                self.regs[i] = value & 0b1000_0000;
            }
            // While powered off, only the wave RAM can be written.
            0x00..=0x15 if !check_bit_const::<7>(self.regs[Self::NR52]) => {}
            _ => self.regs[i] = value,
        }
    }
}

impl IoRegisters {
    /// The registers as the boot ROM leaves them.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            joypad_select: 0,
            dpad_pressed: 0,
            ssab_pressed: 0,
            serial: SerialPort::new(config),
            tac: TimerRegisters::new(),
            interrupt_flags: 0x01,
            audio: AudioRegisters::new(),
            lcd_control: 0x91,
            lcd_status: 0x05,
            bg_position: (0, 0),
            lcd_y: 0,
            lcd_cmp: 0,
            dma: 0xFF,
            monochrome_bg_palette: 0xFC,
            monochrome_obj_palettes: [0xFF; 2],
            window_position: [0, 0],
        }
    }

    /// Advances the timers and the serial port by one cycle.
    pub(super) fn tick(&mut self) {
        if self.tac.tick() {
            self.request_interrupt(InterruptOp::Timer);
        }
        if self.serial.tick() {
            self.request_interrupt(InterruptOp::Serial);
        }
    }

    pub fn request_interrupt(&mut self, op: InterruptOp) {
        self.interrupt_flags |= op.mask();
    }

    pub(crate) fn clear_interrupt_req(&mut self, op: InterruptOp) {
        self.interrupt_flags &= !op.mask();
    }

    pub(crate) fn lcd_enabled(&self) -> bool {
        check_bit_const::<7>(self.lcd_control)
    }

    pub(crate) fn serial_output(&self) -> &[u8] {
        &self.serial.output
    }

    /// Whether or not any button is held. Used to wake the CPU from STOP.
    pub(crate) fn any_button_pressed(&self) -> bool {
        self.dpad_pressed != 0 || self.ssab_pressed != 0
    }

    /// The lower nibble of the joypad register. Lines are active low and a line is pulled low if
    /// any button in a selected group is held.
    fn joypad_lines(&self) -> u8 {
        let mut pressed = 0;
        if !check_bit_const::<4>(self.joypad_select) {
            pressed |= self.dpad_pressed;
        }
        if !check_bit_const::<5>(self.joypad_select) {
            pressed |= self.ssab_pressed;
        }
        0x0F & !pressed
    }

    pub fn register_button_input(&mut self, input: ButtonInput) {
        let before = self.joypad_lines();
        match input {
            ButtonInput::Joypad(button) => self.dpad_pressed |= button as u8,
            ButtonInput::Ssab(button) => self.ssab_pressed |= button as u8,
        }
        // The interrupt fires on a high-to-low transition of any of the input lines.
        if before & !self.joypad_lines() != 0 {
            self.request_interrupt(InterruptOp::Joypad);
        }
    }

    pub fn register_button_release(&mut self, input: ButtonInput) {
        match input {
            ButtonInput::Joypad(button) => self.dpad_pressed &= !(button as u8),
            ButtonInput::Ssab(button) => self.ssab_pressed &= !(button as u8),
        }
    }

    /// Updates the LYC == LY bit in the LCD Stat register. Returns whether the two match.
    pub(crate) fn check_y_cmp(&mut self) -> bool {
        let digest = self.lcd_cmp == self.lcd_y;
        if digest {
            self.lcd_status |= 0b100;
        } else {
            self.lcd_status &= 0b1111_1011;
        }
        digest
    }

    pub(crate) fn read_byte(&self, index: u16) -> u8 {
        match index {
            0xFF00 => 0b1100_0000 | self.joypad_select | self.joypad_lines(),
            0xFF01 => self.serial.data,
            0xFF02 => self.serial.control,
            0xFF04..=0xFF07 => self.tac.read_byte(index),
            0xFF0F => 0xE0 | self.interrupt_flags,
            0xFF10..=0xFF3F => self.audio.read_byte(index),
            0xFF40 => self.lcd_control,
            0xFF41 => 0b1000_0000 | self.lcd_status,
            0xFF42 => self.bg_position.0,
            0xFF43 => self.bg_position.1,
            0xFF44 => self.lcd_y,
            0xFF45 => self.lcd_cmp,
            0xFF46 => self.dma,
            0xFF47 => self.monochrome_bg_palette,
            0xFF48 => self.monochrome_obj_palettes[0],
            0xFF49 => self.monochrome_obj_palettes[1],
            0xFF4A => self.window_position[0],
            0xFF4B => self.window_position[1],
            // FF03, FF08-FF0E, FF4C-FF7F (including the boot ROM lock and the color registers).
            _ => 0xFF,
        }
    }

    pub(crate) fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0xFF00 => {
                let before = self.joypad_lines();
                selective_write(&mut self.joypad_select, 0b0011_0000, value);
                // Selecting a group with a held button pulls its line low.
                if before & !self.joypad_lines() != 0 {
                    self.request_interrupt(InterruptOp::Joypad);
                }
            }
            0xFF01 => self.serial.data = value,
            0xFF02 => self.serial.write_control(value),
            0xFF04..=0xFF07 => self.tac.write_byte(index, value),
            // Top three bits are ignored because there are only 5 types of interrupts
            0xFF0F => self.interrupt_flags = 0x1F & value,
            0xFF10..=0xFF3F => self.audio.write_byte(index, value),
            0xFF40 => {
                match (self.lcd_enabled(), check_bit_const::<7>(value)) {
                    (true, false) => debug!("Disabling LCD"),
                    (false, true) => debug!("Enabling LCD"),
                    _ => {}
                }
                self.lcd_control = value;
            }
            // Only bits 3-6 can be written to.
            0xFF41 => selective_write(&mut self.lcd_status, 0b0111_1000, value),
            0xFF42 => self.bg_position.0 = value,
            0xFF43 => self.bg_position.1 = value,
            0xFF44 => warn!("Ignoring write of 0x{value:0>2X} to LY"),
            0xFF45 => self.lcd_cmp = value,
            0xFF46 => self.dma = value,
            0xFF47 => self.monochrome_bg_palette = value,
            0xFF48 => self.monochrome_obj_palettes[0] = value,
            0xFF49 => self.monochrome_obj_palettes[1] = value,
            0xFF4A => self.window_position[0] = value,
            0xFF4B => self.window_position[1] = value,
            // The boot ROM is never mapped, so locking it does nothing.
            0xFF50 => {}
            idx => warn!("Ignoring write of 0x{value:0>2X} to unused IO register 0x{idx:0>4X}"),
        }
    }
}
