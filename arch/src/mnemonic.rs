use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display, EnumIter)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Mnemonic {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PLA,
    PLP,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    /// Conditional branches, encoded with a signed 8-bit displacement.
    pub fn is_branch(&self) -> bool {
        use Mnemonic::*;
        matches!(self, BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS)
    }
}

#[test]
fn test() {
    assert_eq!(Mnemonic::parse("lda"), Some(Mnemonic::LDA));
    assert_eq!(Mnemonic::parse("LdA"), Some(Mnemonic::LDA));
    assert_eq!(Mnemonic::parse("hoge"), None);
    assert_eq!(Mnemonic::JMP.to_string(), "jmp");
    assert!(Mnemonic::BNE.is_branch());
    assert!(!Mnemonic::JMP.is_branch());
}
