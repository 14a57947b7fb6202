use serde::Deserialize;
use serde::Serialize;

use crate::utils::check_bit;

/// The five interrupt sources. The discriminant of each is the address of its handler. They are
/// listed in priority order.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display("{_variant}")]
#[repr(u16)]
pub enum InterruptOp {
    #[display("VBlank")]
    VBlank = 0x0040,
    #[display("LCD")]
    LCD = 0x0048,
    #[display("Timer")]
    Timer = 0x0050,
    #[display("Serial")]
    Serial = 0x0058,
    #[display("Joypad")]
    Joypad = 0x0060,
}

impl InterruptOp {
    /// Dispatching an interrupt takes five M-cycles.
    pub const CYCLES: u8 = 20;

    /// The bit that this interrupt uses in the IE and IF registers.
    pub const fn mask(self) -> u8 {
        match self {
            InterruptOp::VBlank => 0x01,
            InterruptOp::LCD => 0x02,
            InterruptOp::Timer => 0x04,
            InterruptOp::Serial => 0x08,
            InterruptOp::Joypad => 0x10,
        }
    }

    pub const fn vector(self) -> u16 {
        self as u16
    }

    /// Picks the highest priority interrupt out of a set of pending bits (`IE & IF`).
    pub fn from_pending(pending: u8) -> Option<Self> {
        [
            InterruptOp::VBlank,
            InterruptOp::LCD,
            InterruptOp::Timer,
            InterruptOp::Serial,
            InterruptOp::Joypad,
        ]
        .into_iter()
        .enumerate()
        .find_map(|(bit, op)| check_bit(pending, bit as u8).then_some(op))
    }
}
