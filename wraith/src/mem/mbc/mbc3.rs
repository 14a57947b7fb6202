use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::trace;

use super::{ram_enable_write, ram_offset, rom_offset};

/// The clock runs off the same crystal as the rest of the system.
pub const CYCLES_PER_SECOND: u32 = crate::CLOCK_SPEED;

#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC3 {
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) rom: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) ram: Vec<u8>,
    /// Seven bits wide. A write of zero is stored as one.
    rom_bank: u8,
    /// Written via 0x4000-0x5FFF. 0x00-0x03 map a RAM bank, 0x08-0x0C map a clock register.
    ram_select: u8,
    /// Gates both RAM and the clock registers.
    ram_enabled: bool,
    rtc: Option<RealTimeClock>,
}

/// The MBC3 real time clock. The live registers count up as the emulated machine runs; the
/// program reads a snapshot of them taken by the latch sequence.
#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealTimeClock {
    seconds: u8,
    minutes: u8,
    hours: u8,
    /// Nine bits of day counter.
    days: u16,
    halted: bool,
    /// Set when the day counter overflows. Stays set until cleared by a write.
    day_carry: bool,
    /// Cycles since the last whole second.
    sub_second: u32,
    /// The values that the program sees: S, M, H, DL, DH.
    latched: [u8; 5],
    /// Latching happens on a 0x00 write followed by a 0x01 write.
    latch_armed: bool,
}

impl Display for MBC3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC3 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROMB:  0x{:0>2X}", self.rom_bank)?;
        writeln!(f, "  RAMB:  0x{:0>2X}", self.ram_select)?;
        if let Some(rtc) = &self.rtc {
            writeln!(
                f,
                "  RTC:   {}d {:0>2}:{:0>2}:{:0>2}",
                rtc.days, rtc.hours, rtc.minutes, rtc.seconds
            )?;
        }
        write!(f, "}}")
    }
}

impl MBC3 {
    pub fn new(rom: Vec<u8>, ram_size: usize, has_rtc: bool) -> Self {
        Self {
            rom,
            ram: vec![0; ram_size],
            rom_bank: 1,
            ram_select: 0,
            ram_enabled: false,
            rtc: has_rtc.then(RealTimeClock::default),
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_select = 0;
        self.ram_enabled = false;
        if let Some(rtc) = &mut self.rtc {
            rtc.latch_armed = false;
        }
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize
    }

    pub fn rtc(&self) -> Option<&RealTimeClock> {
        self.rtc.as_ref()
    }

    pub(super) fn tick(&mut self, cycles: u32) {
        if let Some(rtc) = &mut self.rtc {
            rtc.tick(cycles);
        }
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x3FFF => self.rom[rom_offset(&self.rom, 0, index)],
            0x4000..=0x7FFF => self.rom[rom_offset(&self.rom, self.rom_bank(), index)],
            0xA000..=0xBFFF if self.ram_enabled => match (self.ram_select, &self.rtc) {
                (0x00..=0x03, _) => ram_offset(&self.ram, self.ram_select as usize, index)
                    .map(|i| self.ram[i])
                    .unwrap_or(0xFF),
                (n @ 0x08..=0x0C, Some(rtc)) => rtc.latched[(n - 0x08) as usize],
                _ => 0xFF,
            },
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..=0x1FFF => self.ram_enabled = ram_enable_write(value),
            0x2000..=0x3FFF => {
                self.rom_bank = match value & 0x7F {
                    0 => 1,
                    n => n,
                };
                trace!("MBC3 switched to ROM bank 0x{:0>2X}", self.rom_bank);
            }
            0x4000..=0x5FFF => self.ram_select = value & 0x0F,
            0x6000..=0x7FFF => {
                if let Some(rtc) = &mut self.rtc {
                    rtc.write_latch(value)
                }
            }
            0xA000..=0xBFFF if self.ram_enabled => match (self.ram_select, &mut self.rtc) {
                (0x00..=0x03, _) => {
                    if let Some(i) = ram_offset(&self.ram, self.ram_select as usize, index) {
                        self.ram[i] = value;
                    }
                }
                (n @ 0x08..=0x0C, Some(rtc)) => rtc.write_register(n, value),
                _ => {}
            },
            _ => {}
        }
    }
}

impl RealTimeClock {
    fn tick(&mut self, cycles: u32) {
        if self.halted {
            return;
        }
        self.sub_second += cycles;
        while self.sub_second >= CYCLES_PER_SECOND {
            self.sub_second -= CYCLES_PER_SECOND;
            self.advance_second();
        }
    }

    /// Out-of-range values written by the program count up to the register's bit width and wrap
    /// to zero without carrying into the next register.
    fn advance_second(&mut self) {
        self.seconds = (self.seconds + 1) & 0x3F;
        if self.seconds != 60 {
            return;
        }
        self.seconds = 0;
        self.minutes = (self.minutes + 1) & 0x3F;
        if self.minutes != 60 {
            return;
        }
        self.minutes = 0;
        self.hours = (self.hours + 1) & 0x1F;
        if self.hours != 24 {
            return;
        }
        self.hours = 0;
        self.days += 1;
        if self.days == 512 {
            self.days = 0;
            self.day_carry = true;
        }
    }

    fn write_latch(&mut self, value: u8) {
        match value {
            0x00 => self.latch_armed = true,
            0x01 if self.latch_armed => {
                self.latch_armed = false;
                self.latched = [
                    self.seconds,
                    self.minutes,
                    self.hours,
                    self.days as u8,
                    self.day_high(),
                ];
            }
            _ => self.latch_armed = false,
        }
    }

    fn day_high(&self) -> u8 {
        ((self.days >> 8) as u8 & 0x01)
            | ((self.halted as u8) << 6)
            | ((self.day_carry as u8) << 7)
    }

    fn write_register(&mut self, register: u8, value: u8) {
        match register {
            0x08 => {
                self.seconds = value & 0x3F;
                self.sub_second = 0;
            }
            0x09 => self.minutes = value & 0x3F,
            0x0A => self.hours = value & 0x1F,
            0x0B => self.days = (self.days & 0x100) | value as u16,
            0x0C => {
                self.days = (self.days & 0xFF) | (((value & 0x01) as u16) << 8);
                self.halted = value & 0x40 != 0;
                self.day_carry = value & 0x80 != 0;
            }
            _ => return,
        }
        // Writes land in the live registers, but programs commonly read them back without
        // latching again.
        self.latched[(register - 0x08) as usize] = match register {
            0x08 => self.seconds,
            0x09 => self.minutes,
            0x0A => self.hours,
            0x0B => self.days as u8,
            _ => self.day_high(),
        };
    }
}

#[cfg(test)]
mod test {
    use super::{CYCLES_PER_SECOND, MBC3};
    use crate::mem::mbc::ROM_BANK_SIZE;

    fn mbc(banks: usize) -> MBC3 {
        let mut rom = vec![0; banks * ROM_BANK_SIZE];
        (0..banks).for_each(|b| rom[b * ROM_BANK_SIZE] = b as u8);
        MBC3::new(rom, 0x8000, true)
    }

    fn latch(mbc: &mut MBC3) {
        mbc.write_byte(0x6000, 0x00);
        mbc.write_byte(0x6000, 0x01);
    }

    #[test]
    fn seven_bit_rom_bank() {
        let mut mbc = mbc(128);
        mbc.write_byte(0x2000, 0x7F);
        assert_eq!(mbc.read_byte(0x4000), 0x7F);
        mbc.write_byte(0x2000, 0x00);
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        mbc.write_byte(0x2000, 0x80);
        assert_eq!(mbc.rom_bank(), 1);
    }

    #[test]
    fn ram_banks_and_enable() {
        let mut mbc = mbc(4);
        mbc.write_byte(0x0000, 0x0A);
        for bank in 0..4u8 {
            mbc.write_byte(0x4000, bank);
            mbc.write_byte(0xA000, bank + 0x10);
        }
        for bank in 0..4u8 {
            mbc.write_byte(0x4000, bank);
            assert_eq!(mbc.read_byte(0xA000), bank + 0x10);
        }
        mbc.write_byte(0x0000, 0x00);
        assert_eq!(mbc.read_byte(0xA000), 0xFF);
    }

    #[test]
    fn clock_counts_emulated_time() {
        let mut mbc = mbc(4);
        mbc.write_byte(0x0000, 0x0A);
        mbc.tick(CYCLES_PER_SECOND * 61);
        // The program sees nothing until the clock is latched
        mbc.write_byte(0x4000, 0x08);
        assert_eq!(mbc.read_byte(0xA000), 0);
        latch(&mut mbc);
        assert_eq!(mbc.read_byte(0xA000), 1);
        mbc.write_byte(0x4000, 0x09);
        assert_eq!(mbc.read_byte(0xA000), 1);
        // Latched values are frozen
        mbc.tick(CYCLES_PER_SECOND);
        mbc.write_byte(0x4000, 0x08);
        assert_eq!(mbc.read_byte(0xA000), 1);
        // Writing 0x01 without the preceding 0x00 does not latch
        mbc.write_byte(0x6000, 0x01);
        assert_eq!(mbc.read_byte(0xA000), 1);
        latch(&mut mbc);
        assert_eq!(mbc.read_byte(0xA000), 2);
    }

    #[test]
    fn halt_and_day_carry() {
        let mut mbc = mbc(4);
        mbc.write_byte(0x0000, 0x0A);
        // Halt the clock and park it right before the day counter overflows
        mbc.write_byte(0x4000, 0x0C);
        mbc.write_byte(0xA000, 0x41);
        mbc.write_byte(0x4000, 0x0B);
        mbc.write_byte(0xA000, 0xFF);
        mbc.write_byte(0x4000, 0x0A);
        mbc.write_byte(0xA000, 23);
        mbc.write_byte(0x4000, 0x09);
        mbc.write_byte(0xA000, 59);
        mbc.write_byte(0x4000, 0x08);
        mbc.write_byte(0xA000, 59);
        mbc.tick(CYCLES_PER_SECOND * 10);
        latch(&mut mbc);
        assert_eq!(mbc.read_byte(0xA000), 59);
        // Resume
        mbc.write_byte(0x4000, 0x0C);
        mbc.write_byte(0xA000, 0x01);
        mbc.tick(CYCLES_PER_SECOND);
        latch(&mut mbc);
        assert_eq!(mbc.read_byte(0xA000), 0x80);
        mbc.write_byte(0x4000, 0x0B);
        assert_eq!(mbc.read_byte(0xA000), 0);
    }
}
