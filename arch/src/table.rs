use bimap::BiMap;
use strum::IntoEnumIterator;

use crate::{mnemonic::Mnemonic, mode::Mode};

/// Read-only opcode lookup handed to the assembler.
pub trait OpcodeTable {
    fn opcode(&self, mnemonic: Mnemonic, mode: Mode) -> Option<u8>;

    fn decode(&self, opcode: u8) -> Option<(Mnemonic, Mode)>;

    /// A mnemonic is known when at least one mode encodes it.
    fn knows(&self, mnemonic: Mnemonic) -> bool {
        Mode::iter().any(|mode| self.opcode(mnemonic, mode).is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpcodeMap(BiMap<(Mnemonic, Mode), u8>);

impl OpcodeMap {
    pub fn new() -> Self {
        OpcodeMap(BiMap::new())
    }

    /// Returns the opcode previously bound to this mnemonic and mode.
    pub fn insert(&mut self, mnemonic: Mnemonic, mode: Mode, opcode: u8) -> Option<u8> {
        let prev = self.0.get_by_left(&(mnemonic, mode)).copied();
        self.0.insert((mnemonic, mode), opcode);
        prev
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Mnemonic, Mode, u8)> for OpcodeMap {
    fn from_iter<I: IntoIterator<Item = (Mnemonic, Mode, u8)>>(iter: I) -> Self {
        let mut map = OpcodeMap::new();
        for (mnemonic, mode, opcode) in iter {
            map.insert(mnemonic, mode, opcode);
        }
        map
    }
}

impl OpcodeTable for OpcodeMap {
    fn opcode(&self, mnemonic: Mnemonic, mode: Mode) -> Option<u8> {
        self.0.get_by_left(&(mnemonic, mode)).copied()
    }

    fn decode(&self, opcode: u8) -> Option<(Mnemonic, Mode)> {
        self.0.get_by_right(&opcode).copied()
    }
}

impl<T: OpcodeTable + ?Sized> OpcodeTable for &T {
    fn opcode(&self, mnemonic: Mnemonic, mode: Mode) -> Option<u8> {
        (**self).opcode(mnemonic, mode)
    }

    fn decode(&self, opcode: u8) -> Option<(Mnemonic, Mode)> {
        (**self).decode(opcode)
    }
}

// table! { LDA { Immediate => 0xA9, ... } ... }
macro_rules! table {
    ($($mnemonic:ident { $($mode:ident => $opcode:expr),* $(,)? })*) => {
        &[$($((Mnemonic::$mnemonic, Mode::$mode, $opcode),)*)*]
    };
}

/// Documented NMOS 6502 instruction set.
pub const NMOS6502: &[(Mnemonic, Mode, u8)] = table! {
    ADC { Immediate => 0x69, ZeroPage => 0x65, ZeroPageX => 0x75, Absolute => 0x6D,
          AbsoluteX => 0x7D, AbsoluteY => 0x79, IndexedIndirect => 0x61, IndirectIndexed => 0x71 }
    AND { Immediate => 0x29, ZeroPage => 0x25, ZeroPageX => 0x35, Absolute => 0x2D,
          AbsoluteX => 0x3D, AbsoluteY => 0x39, IndexedIndirect => 0x21, IndirectIndexed => 0x31 }
    ASL { Implied => 0x0A, ZeroPage => 0x06, ZeroPageX => 0x16, Absolute => 0x0E, AbsoluteX => 0x1E }
    BCC { Relative => 0x90 }
    BCS { Relative => 0xB0 }
    BEQ { Relative => 0xF0 }
    BIT { ZeroPage => 0x24, Absolute => 0x2C }
    BMI { Relative => 0x30 }
    BNE { Relative => 0xD0 }
    BPL { Relative => 0x10 }
    BRK { Implied => 0x00 }
    BVC { Relative => 0x50 }
    BVS { Relative => 0x70 }
    CLC { Implied => 0x18 }
    CLD { Implied => 0xD8 }
    CLI { Implied => 0x58 }
    CLV { Implied => 0xB8 }
    CMP { Immediate => 0xC9, ZeroPage => 0xC5, ZeroPageX => 0xD5, Absolute => 0xCD,
          AbsoluteX => 0xDD, AbsoluteY => 0xD9, IndexedIndirect => 0xC1, IndirectIndexed => 0xD1 }
    CPX { Immediate => 0xE0, ZeroPage => 0xE4, Absolute => 0xEC }
    CPY { Immediate => 0xC0, ZeroPage => 0xC4, Absolute => 0xCC }
    DEC { ZeroPage => 0xC6, ZeroPageX => 0xD6, Absolute => 0xCE, AbsoluteX => 0xDE }
    DEX { Implied => 0xCA }
    DEY { Implied => 0x88 }
    EOR { Immediate => 0x49, ZeroPage => 0x45, ZeroPageX => 0x55, Absolute => 0x4D,
          AbsoluteX => 0x5D, AbsoluteY => 0x59, IndexedIndirect => 0x41, IndirectIndexed => 0x51 }
    INC { ZeroPage => 0xE6, ZeroPageX => 0xF6, Absolute => 0xEE, AbsoluteX => 0xFE }
    INX { Implied => 0xE8 }
    INY { Implied => 0xC8 }
    JMP { Absolute => 0x4C, Indirect => 0x6C }
    JSR { Absolute => 0x20 }
    LDA { Immediate => 0xA9, ZeroPage => 0xA5, ZeroPageX => 0xB5, Absolute => 0xAD,
          AbsoluteX => 0xBD, AbsoluteY => 0xB9, IndexedIndirect => 0xA1, IndirectIndexed => 0xB1 }
    LDX { Immediate => 0xA2, ZeroPage => 0xA6, ZeroPageY => 0xB6, Absolute => 0xAE, AbsoluteY => 0xBE }
    LDY { Immediate => 0xA0, ZeroPage => 0xA4, ZeroPageX => 0xB4, Absolute => 0xAC, AbsoluteX => 0xBC }
    LSR { Implied => 0x4A, ZeroPage => 0x46, ZeroPageX => 0x56, Absolute => 0x4E, AbsoluteX => 0x5E }
    NOP { Implied => 0xEA }
    ORA { Immediate => 0x09, ZeroPage => 0x05, ZeroPageX => 0x15, Absolute => 0x0D,
          AbsoluteX => 0x1D, AbsoluteY => 0x19, IndexedIndirect => 0x01, IndirectIndexed => 0x11 }
    PHA { Implied => 0x48 }
    PHP { Implied => 0x08 }
    PLA { Implied => 0x68 }
    PLP { Implied => 0x28 }
    ROL { Implied => 0x2A, ZeroPage => 0x26, ZeroPageX => 0x36, Absolute => 0x2E, AbsoluteX => 0x3E }
    ROR { Implied => 0x6A, ZeroPage => 0x66, ZeroPageX => 0x76, Absolute => 0x6E, AbsoluteX => 0x7E }
    RTI { Implied => 0x40 }
    RTS { Implied => 0x60 }
    SBC { Immediate => 0xE9, ZeroPage => 0xE5, ZeroPageX => 0xF5, Absolute => 0xED,
          AbsoluteX => 0xFD, AbsoluteY => 0xF9, IndexedIndirect => 0xE1, IndirectIndexed => 0xF1 }
    SEC { Implied => 0x38 }
    SED { Implied => 0xF8 }
    SEI { Implied => 0x78 }
    STA { ZeroPage => 0x85, ZeroPageX => 0x95, Absolute => 0x8D, AbsoluteX => 0x9D,
          AbsoluteY => 0x99, IndexedIndirect => 0x81, IndirectIndexed => 0x91 }
    STX { ZeroPage => 0x86, ZeroPageY => 0x96, Absolute => 0x8E }
    STY { ZeroPage => 0x84, ZeroPageX => 0x94, Absolute => 0x8C }
    TAX { Implied => 0xAA }
    TAY { Implied => 0xA8 }
    TSX { Implied => 0xBA }
    TXA { Implied => 0x8A }
    TXS { Implied => 0x9A }
    TYA { Implied => 0x98 }
};

impl OpcodeMap {
    pub fn nmos6502() -> Self {
        NMOS6502.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nmos_table_is_complete() {
        let table = OpcodeMap::nmos6502();
        // No opcode byte is bound twice.
        assert_eq!(table.len(), NMOS6502.len());
        assert_eq!(table.len(), 151);
        for mnemonic in Mnemonic::iter() {
            assert!(table.knows(mnemonic), "{mnemonic}");
        }
    }

    #[test]
    fn lookup_both_ways() {
        let table = OpcodeMap::nmos6502();
        assert_eq!(table.opcode(Mnemonic::LDA, Mode::Immediate), Some(0xA9));
        assert_eq!(table.opcode(Mnemonic::JMP, Mode::Indirect), Some(0x6C));
        assert_eq!(table.opcode(Mnemonic::STA, Mode::Immediate), None);
        assert_eq!(table.decode(0xEA), Some((Mnemonic::NOP, Mode::Implied)));
        assert_eq!(table.decode(0x02), None);
    }

    #[test]
    fn branches_are_relative_only() {
        let table = OpcodeMap::nmos6502();
        for mnemonic in Mnemonic::iter().filter(Mnemonic::is_branch) {
            for mode in Mode::iter() {
                let found = table.opcode(mnemonic, mode).is_some();
                assert_eq!(found, mode == Mode::Relative, "{mnemonic} {mode}");
            }
        }
    }

    #[test]
    fn custom_table() {
        let table: OpcodeMap = [(Mnemonic::NOP, Mode::Implied, 0xEA)].into_iter().collect();
        assert!(table.knows(Mnemonic::NOP));
        assert!(!table.knows(Mnemonic::LDA));
    }
}
