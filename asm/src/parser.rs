use arch::{Mnemonic, Mode, OpcodeTable};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    config::Config,
    error::Error,
    operand::{self, Operand},
    symbol::SymbolTable,
    util::{is_identifier, is_numeric, parse_hex, strip_comment, Number},
};

// ----------------------------------------------------------------------------
// Kinds

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Pseudo {
    /// Set the load address
    ORG,
    /// Bind the label to a value
    EQU,
    /// Define bytes
    DFB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Code(Mode),
    Pseudo(Pseudo),
    /// Blank, comment-only or label-only line
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Machine(Mnemonic),
    Pseudo(Pseudo),
}

impl Op {
    /// Case-insensitive. A mnemonic the table has no encoding for is unknown.
    pub fn parse(s: &str, table: &dyn OpcodeTable) -> Option<Op> {
        if let Ok(pseudo) = s.parse::<Pseudo>() {
            return Some(Op::Pseudo(pseudo));
        }
        Mnemonic::parse(s)
            .filter(|m| table.knows(*m))
            .map(Op::Machine)
    }
}

/// What a line is parsed against.
pub struct Scope<'a> {
    pub table: &'a dyn OpcodeTable,
    pub symbols: &'a SymbolTable,
    pub config: &'a Config,
    /// Label references are only required to resolve from pass 2 on.
    pub pass: u8,
}

// ----------------------------------------------------------------------------
// Instruction

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// 1-based source line
    pub line: usize,
    /// Source text with the comment stripped
    pub text: String,
    pub label: Option<String>,
    /// Lowercase; empty when the line carries no instruction
    pub mnemonic: String,
    pub kind: Kind,
    pub opcode: u8,
    pub length: u8,
    pub op_low: u8,
    pub op_high: u8,
    /// `dfb` payload
    pub data: Vec<u8>,
    pub is_comment: bool,
}

impl Instruction {
    pub fn comment(line: usize, text: &str) -> Self {
        Instruction {
            line,
            text: text.to_string(),
            label: None,
            mnemonic: String::new(),
            kind: Kind::Comment,
            opcode: 0,
            length: 0,
            op_low: 0,
            op_high: 0,
            data: Vec::new(),
            is_comment: true,
        }
    }

    /// Operand bytes read back as one 16-bit value.
    pub fn word(&self) -> u16 {
        u16::from_be_bytes([self.op_high, self.op_low])
    }

    /// Bytes this line occupies in the image.
    pub fn size(&self) -> usize {
        match self.kind {
            Kind::Code(_) => self.length as usize,
            Kind::Pseudo(Pseudo::DFB) => self.data.len(),
            Kind::Pseudo(_) | Kind::Comment => 0,
        }
    }

    /// Stand-in for a line that failed to parse. A well-formed leading label
    /// is kept so the symbol still gets bound.
    pub fn failed(line: usize, raw: &str, scope: &Scope) -> Self {
        let text = strip_comment(raw).trim();
        let mut inst = Instruction::comment(line, text);
        let fields: Vec<&str> = text.split_whitespace().collect();
        if !fields.is_empty() {
            inst.label = split_label(&fields, scope).ok().and_then(|(label, _)| label);
        }
        inst
    }

    pub fn parse(line: usize, raw: &str, scope: &Scope) -> Result<Instruction, Error> {
        let text = strip_comment(raw).trim();
        let mut inst = Instruction::comment(line, text);

        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.is_empty() {
            return Ok(inst);
        }
        if fields.len() > 3 {
            return Err(Error::TooManyFields(fields.len()));
        }

        let (label, rest) = split_label(&fields, scope)?;
        inst.label = label;

        // Label alone
        let Some((name, operands)) = rest.split_first() else {
            return Ok(inst);
        };
        if operands.len() > 1 {
            return Err(Error::TooManyFields(fields.len()));
        }
        let operand = operands.first().copied();

        match Op::parse(name, scope.table) {
            Some(Op::Machine(mnemonic)) => inst.machine(mnemonic, operand, scope)?,
            Some(Op::Pseudo(pseudo)) => inst.pseudo(pseudo, operand)?,
            None => return Err(Error::UnknownMnemonic(name.to_string())),
        }
        Ok(inst)
    }

    fn machine(
        &mut self,
        mnemonic: Mnemonic,
        operand: Option<&str>,
        scope: &Scope,
    ) -> Result<(), Error> {
        let operand = operand::analyze(mnemonic, operand, scope)?;
        let (mode, opcode) = select(scope.table, mnemonic, &operand)?;

        self.mnemonic = mnemonic.to_string();
        self.kind = Kind::Code(mode);
        self.opcode = opcode;
        self.length = mode.len();
        [self.op_high, self.op_low] = operand.value.to_be_bytes();
        self.is_comment = false;
        Ok(())
    }

    fn pseudo(&mut self, pseudo: Pseudo, operand: Option<&str>) -> Result<(), Error> {
        let name: &'static str = pseudo.into();
        self.mnemonic = name.to_string();
        self.kind = Kind::Pseudo(pseudo);

        let operand = operand.ok_or(Error::Pseudo(name, "missing operand"))?;
        match pseudo {
            Pseudo::ORG | Pseudo::EQU => {
                if pseudo == Pseudo::EQU && self.label.is_none() {
                    return Err(Error::Pseudo(name, "needs a label to bind"));
                }
                if !is_numeric(operand) {
                    return Err(Error::Pseudo(name, "operand must be a hex value"));
                }
                [self.op_high, self.op_low] = parse_hex(operand)?.value().to_be_bytes();
            }
            Pseudo::DFB => {
                self.data = operand
                    .split(',')
                    .map(|item| match parse_hex(item)? {
                        Number::Byte(b) => Ok(b),
                        Number::Word(_) => Err(Error::AddressLength(
                            item.to_string(),
                            "does not fit a byte".to_string(),
                        )),
                    })
                    .collect::<Result<_, _>>()?;
            }
        }
        Ok(())
    }
}

/// `NAME:` is always a label. A bare identifier is one only when an
/// instruction follows it.
fn split_label<'f>(
    fields: &'f [&'f str],
    scope: &Scope,
) -> Result<(Option<String>, &'f [&'f str]), Error> {
    let first = fields[0];
    let name = match first.strip_suffix(':') {
        Some(name) => {
            if !is_identifier(name) {
                return Err(Error::InvalidLabel(first.to_string()));
            }
            name
        }
        None => {
            if Op::parse(first, scope.table).is_some() {
                return Ok((None, fields));
            }
            match fields.get(1) {
                Some(next) if is_identifier(first) => {
                    if Op::parse(next, scope.table).is_none() {
                        // `START LDAX #$01`: the second word is the typo
                        let culprit = if is_identifier(next) { *next } else { first };
                        return Err(Error::UnknownMnemonic(culprit.to_string()));
                    }
                }
                _ => return Err(Error::UnknownMnemonic(first.to_string())),
            }
            first
        }
    };

    if name.len() > scope.config.max_label_len {
        return Err(Error::LabelTooLong(
            name.to_string(),
            scope.config.max_label_len,
        ));
    }
    Ok((Some(name.to_string()), &fields[1..]))
}

/// Falls back to the absolute form when the table has no zero page one, and
/// to zero page when a label fits a byte and there is no absolute form
/// (`stx ZP,y`).
fn select(table: &dyn OpcodeTable, mnemonic: Mnemonic, operand: &Operand) -> Result<(Mode, u8), Error> {
    let mode = operand.mode;
    if let Some(opcode) = table.opcode(mnemonic, mode) {
        return Ok((mode, opcode));
    }
    let narrow = mode
        .narrow()
        .filter(|_| operand.symbol.is_some() && operand.value <= 0xFF);
    mode.widen()
        .or(narrow)
        .and_then(|other| table.opcode(mnemonic, other).map(|opcode| (other, opcode)))
        .ok_or(Error::InvalidAddressing(mnemonic, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::OpcodeMap;

    fn parse_with(src: &str, symbols: &SymbolTable, pass: u8) -> Result<Instruction, Error> {
        let table = OpcodeMap::nmos6502();
        let config = Config::default();
        let scope = Scope {
            table: &table,
            symbols,
            config: &config,
            pass,
        };
        Instruction::parse(1, src, &scope)
    }

    fn parse(src: &str) -> Result<Instruction, Error> {
        parse_with(src, &SymbolTable::new(), 1)
    }

    #[test]
    fn blank_and_comment_lines() {
        for src in ["", "   ", "; note", "* banner", "   ; indented"] {
            let inst = parse(src).unwrap();
            assert!(inst.is_comment, "{src:?}");
            assert_eq!(inst.kind, Kind::Comment);
            assert_eq!(inst.size(), 0);
        }
    }

    #[test]
    fn label_then_instruction() {
        let inst = parse("START: LDA #$05 ; go").unwrap();
        assert_eq!(inst.label.as_deref(), Some("START"));
        assert_eq!(inst.mnemonic, "lda");
        assert_eq!(inst.kind, Kind::Code(Mode::Immediate));
        assert_eq!((inst.opcode, inst.length, inst.op_low), (0xA9, 2, 0x05));
        assert_eq!(inst.text, "START: LDA #$05");

        let bare = parse("LOOP nop").unwrap();
        assert_eq!(bare.label.as_deref(), Some("LOOP"));
        assert_eq!(bare.opcode, 0xEA);
    }

    #[test]
    fn label_alone() {
        let inst = parse("DONE:").unwrap();
        assert_eq!(inst.label.as_deref(), Some("DONE"));
        assert_eq!(inst.kind, Kind::Comment);
    }

    #[test]
    fn field_limits() {
        assert!(matches!(parse("A: lda #$01 x"), Err(Error::TooManyFields(4))));
        assert!(matches!(parse("lda #$01 x"), Err(Error::TooManyFields(3))));
    }

    #[test]
    fn unknown_mnemonics() {
        assert!(matches!(parse("FOO"), Err(Error::UnknownMnemonic(m)) if m == "FOO"));
        assert!(matches!(parse("L: FOO $10"), Err(Error::UnknownMnemonic(m)) if m == "FOO"));
        assert!(matches!(parse("1x: nop"), Err(Error::InvalidLabel(_))));
        assert!(matches!(parse("START LDAX #$01"), Err(Error::UnknownMnemonic(m)) if m == "LDAX"));
        assert!(matches!(parse("LDAX $10"), Err(Error::UnknownMnemonic(m)) if m == "LDAX"));
    }

    #[test]
    fn label_cap() {
        assert!(matches!(parse("TOOLONG: nop"), Err(Error::LabelTooLong(_, 6))));
        assert!(parse("SIXSIX: nop").is_ok());
    }

    #[test]
    fn pseudo_ops() {
        let org = parse("  ORG $8000").unwrap();
        assert_eq!(org.kind, Kind::Pseudo(Pseudo::ORG));
        assert!(org.is_comment);
        assert_eq!(org.word(), 0x8000);
        assert_eq!(org.size(), 0);

        let equ = parse("PORT EQU $D012").unwrap();
        assert_eq!(equ.label.as_deref(), Some("PORT"));
        assert_eq!(equ.word(), 0xD012);

        let dfb = parse("TAB: dfb $01,$02,$ff").unwrap();
        assert_eq!(dfb.data, vec![0x01, 0x02, 0xFF]);
        assert_eq!(dfb.size(), 3);

        assert!(matches!(parse("equ $10"), Err(Error::Pseudo("equ", _))));
        assert!(matches!(parse("org"), Err(Error::Pseudo("org", _))));
        assert!(matches!(parse("org START"), Err(Error::Pseudo("org", _))));
        assert!(matches!(parse("dfb $0102"), Err(Error::AddressLength(..))));
    }

    #[test]
    fn zero_page_widens_when_missing() {
        let inst = parse("lda $10,y").unwrap();
        assert_eq!(inst.kind, Kind::Code(Mode::AbsoluteY));
        assert_eq!((inst.opcode, inst.length), (0xB9, 3));
        assert_eq!(inst.word(), 0x0010);

        let jmp = parse("jmp $12").unwrap();
        assert_eq!(jmp.kind, Kind::Code(Mode::Absolute));
    }

    #[test]
    fn invalid_combination() {
        assert!(matches!(
            parse("sta #$01"),
            Err(Error::InvalidAddressing(Mnemonic::STA, Mode::Immediate))
        ));
        assert!(matches!(
            parse("lda"),
            Err(Error::InvalidAddressing(Mnemonic::LDA, Mode::Implied))
        ));
    }

    #[test]
    fn accumulator_forms() {
        assert_eq!(parse("asl").unwrap().opcode, 0x0A);
        assert_eq!(parse("ROR A").unwrap().opcode, 0x6A);
    }

    #[test]
    fn label_narrows_without_absolute_form() {
        let mut symbols = SymbolTable::new();
        for (name, address) in [("ZP", 0x0040), ("FAR", 0x1234)] {
            symbols
                .insert(crate::symbol::Symbol {
                    name: name.to_string(),
                    address,
                    line: 1,
                })
                .unwrap();
        }

        let stx = parse_with("stx ZP,y", &symbols, 2).unwrap();
        assert_eq!(stx.kind, Kind::Code(Mode::ZeroPageY));
        assert_eq!((stx.opcode, stx.op_low), (0x96, 0x40));
        assert_eq!(parse("stx ZP,y").unwrap().length, 2);

        assert!(matches!(
            parse_with("stx FAR,y", &symbols, 2),
            Err(Error::InvalidAddressing(Mnemonic::STX, Mode::AbsoluteY))
        ));
        // Absolute form still wins when it exists.
        let lda = parse_with("lda ZP,x", &symbols, 2).unwrap();
        assert_eq!(lda.kind, Kind::Code(Mode::AbsoluteX));
    }

    #[test]
    fn failed_line_keeps_label() {
        let table = OpcodeMap::nmos6502();
        let config = Config::default();
        let symbols = SymbolTable::new();
        let scope = Scope {
            table: &table,
            symbols: &symbols,
            config: &config,
            pass: 1,
        };

        let inst = Instruction::failed(4, "L: lda $1 ; bad", &scope);
        assert_eq!(inst.label.as_deref(), Some("L"));
        assert_eq!((inst.line, inst.text.as_str()), (4, "L: lda $1"));
        assert_eq!(inst.size(), 0);
        assert_eq!(Instruction::failed(1, "TOOLONG: nop", &scope).label, None);
        assert_eq!(Instruction::failed(1, "FOO", &scope).label, None);
    }

    #[test]
    fn references_resolve_on_pass_two() {
        let mut symbols = SymbolTable::new();
        symbols
            .insert(crate::symbol::Symbol {
                name: "LOOP".to_string(),
                address: 0x8002,
                line: 3,
            })
            .unwrap();

        let deferred = parse("jmp LOOP").unwrap();
        assert_eq!(deferred.kind, Kind::Code(Mode::Absolute));
        assert_eq!(deferred.word(), 0);

        let resolved = parse_with("jmp LOOP", &symbols, 2).unwrap();
        assert_eq!((resolved.op_low, resolved.op_high), (0x02, 0x80));

        let missing = parse_with("jmp NOWHERE", &symbols, 2);
        assert!(matches!(missing, Err(Error::UndefinedSymbol(s)) if s == "NOWHERE"));
    }
}
