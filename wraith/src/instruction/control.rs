#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ControlOp {
    #[display("HALT")]
    Halt,
    #[display("NOOP")]
    Noop,
    /// STOP is followed by a (normally zero) byte that is skipped.
    #[display("STOP")]
    Stop,
}

impl ControlOp {
    /// Returns the number of cycles it will take to complete this instruction.
    pub const fn cycles(&self) -> u8 {
        match self {
            ControlOp::Noop => 4,
            ControlOp::Stop => 4,
            ControlOp::Halt => 4,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            ControlOp::Noop => 1,
            ControlOp::Stop => 2,
            ControlOp::Halt => 1,
        }
    }
}
