use strum::{Display, EnumIter};

/// Machine addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Mode {
    /// Also covers the accumulator forms (`asl`, `asl a`).
    #[strum(to_string = "implied")]
    Implied,
    #[strum(to_string = "immediate")]
    Immediate,
    #[strum(to_string = "zero page")]
    ZeroPage,
    #[strum(to_string = "zero page,X")]
    ZeroPageX,
    #[strum(to_string = "zero page,Y")]
    ZeroPageY,
    #[strum(to_string = "absolute")]
    Absolute,
    #[strum(to_string = "absolute,X")]
    AbsoluteX,
    #[strum(to_string = "absolute,Y")]
    AbsoluteY,
    #[strum(to_string = "(indirect,X)")]
    IndexedIndirect,
    #[strum(to_string = "(indirect),Y")]
    IndirectIndexed,
    #[strum(to_string = "indirect")]
    Indirect,
    #[strum(to_string = "relative")]
    Relative,
}

impl Mode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(&self) -> u8 {
        use Mode::*;
        match self {
            Implied => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY => 1,
            IndexedIndirect | IndirectIndexed | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }

    /// Total encoded length, opcode included.
    pub fn len(&self) -> u8 {
        1 + self.operand_len()
    }

    /// Absolute counterpart of a zero page mode.
    pub fn widen(&self) -> Option<Mode> {
        match self {
            Mode::ZeroPage => Some(Mode::Absolute),
            Mode::ZeroPageX => Some(Mode::AbsoluteX),
            Mode::ZeroPageY => Some(Mode::AbsoluteY),
            _ => None,
        }
    }

    /// Zero page counterpart of an absolute mode.
    pub fn narrow(&self) -> Option<Mode> {
        match self {
            Mode::Absolute => Some(Mode::ZeroPage),
            Mode::AbsoluteX => Some(Mode::ZeroPageX),
            Mode::AbsoluteY => Some(Mode::ZeroPageY),
            _ => None,
        }
    }
}
