use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::utils::check_bit;
use crate::utils::check_bit_const;

/// The number of cycles that TIMA reads as zero after overflowing, before it is reloaded.
const RELOAD_DELAY: u8 = 4;

/// The divider, timer counter, timer modulo, and timer control registers.
///
/// The divider is modelled as the 16-bit counter it is in hardware; FF04 exposes its upper
/// byte. The timer counter is not clocked on its own. Instead, one bit of the divider (picked by
/// TAC) is ANDed with the enable bit, and the counter increments on every falling edge of that
/// signal. This is also why resetting the divider or rewriting TAC can increment the counter.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRegisters {
    /// ADDR FF04 (upper byte)
    divider: u16,
    /// ADDR FF05
    /// The counter that is updated at the frequency specified by the TAC. Overflows trigger
    /// reloads from the timer modulo and then an interrupt is requested.
    timer_counter: TimerCounter,
    /// ADDR FF06
    /// When the timer counter overflows, it is reloaded with the value in this register.
    timer_modulo: u8,
    /// ADDR FF07
    /// Only the bottom three bits are used.
    timer_control: u8,
}

/// When the timer counter overflows, it does not immediately load the timer modulo value. That
/// happens four cycles later. The first variant models this wait, holding the cycles left.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
enum TimerCounter {
    Loading(u8),
    Ready(u8),
}

impl Display for TimerRegisters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Timers {{")?;
        writeln!(f, "  DIV: 0x{:0>2X}", self.divider >> 8)?;
        writeln!(f, "  DIV counter: 0x{:0>4X}", self.divider)?;
        match self.timer_counter {
            TimerCounter::Loading(count) => writeln!(f, "  TIMA: Loading({count})")?,
            TimerCounter::Ready(count) => writeln!(f, "  TIMA: 0x{count:0>2X}")?,
        }
        writeln!(f, "  TMA: 0x{:0>2X}", self.timer_modulo)?;
        writeln!(f, "  TAC: 0b{:0>3b}", self.timer_control)?;
        write!(f, "}}")
    }
}

impl Default for TimerRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerRegisters {
    /// The timers as the boot ROM leaves them.
    pub(crate) fn new() -> Self {
        Self {
            divider: 0xABCC,
            timer_counter: TimerCounter::Ready(0),
            timer_modulo: 0,
            timer_control: 0,
        }
    }

    /// The divider bit that clocks TIMA for each of the four TAC frequencies.
    fn tap_bit(&self) -> u8 {
        match self.timer_control & 0b11 {
            0b00 => 9,
            0b01 => 3,
            0b10 => 5,
            _ => 7,
        }
    }

    /// The input of the falling edge detector.
    fn signal(&self) -> bool {
        check_bit_const::<2>(self.timer_control) && check_bit((self.divider >> self.tap_bit()) as u8, 0)
    }

    /// Advances the timers by one cycle. Returns `true` if an interrupt should be requested.
    pub(super) fn tick(&mut self) -> bool {
        let digest = match &mut self.timer_counter {
            TimerCounter::Loading(remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    self.timer_counter = TimerCounter::Ready(self.timer_modulo);
                    true
                } else {
                    false
                }
            }
            TimerCounter::Ready(_) => false,
        };
        let before = self.signal();
        self.divider = self.divider.wrapping_add(1);
        if before && !self.signal() {
            self.inc_timer_counter();
        }
        digest
    }

    fn inc_timer_counter(&mut self) {
        let TimerCounter::Ready(value) = &mut self.timer_counter else {
            // The counter is already waiting on a reload
            return;
        };
        match value.checked_add(1) {
            Some(val) => *value = val,
            // `None` indicates there was an overflow. The counter reads zero until the reload.
            None => self.timer_counter = TimerCounter::Loading(RELOAD_DELAY),
        }
    }

    /// Resets the divider. Writing to the divider (or executing STOP) does this.
    pub(crate) fn reset_divider(&mut self) {
        let before = self.signal();
        self.divider = 0;
        if before {
            self.inc_timer_counter();
        }
    }

    /// The whole internal counter. DIV is its upper byte.
    fn divider(&self) -> u16 {
        self.divider
    }

    pub(super) fn read_byte(&self, index: u16) -> u8 {
        match index {
            0xFF04 => (self.divider() >> 8) as u8,
            0xFF05 => match self.timer_counter {
                TimerCounter::Loading(_) => 0,
                TimerCounter::Ready(value) => value,
            },
            0xFF06 => self.timer_modulo,
            0xFF07 => 0b1111_1000 | self.timer_control,
            _ => 0xFF,
        }
    }

    pub(super) fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0xFF04 => self.reset_divider(),
            // Writing during the reload delay cancels the reload (and the interrupt).
            0xFF05 => self.timer_counter = TimerCounter::Ready(value),
            0xFF06 => self.timer_modulo = value,
            0xFF07 => {
                let before = self.signal();
                self.timer_control = value & 0b111;
                if before && !self.signal() {
                    self.inc_timer_counter();
                }
            }
            _ => {}
        }
    }
}
