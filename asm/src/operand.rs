use arch::{Mnemonic, Mode};

use crate::{
    error::Error,
    parser::Scope,
    util::{is_identifier, is_numeric, parse_hex, Number},
};

/// Addressing mode and value an operand field resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub mode: Mode,
    pub value: u16,
    /// Label the value came from
    pub symbol: Option<String>,
}

impl Operand {
    fn implied() -> Self {
        Operand {
            mode: Mode::Implied,
            value: 0,
            symbol: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Number(Number),
    /// Deferred references carry 0 until pass 2.
    Symbol(String, u16),
}

impl Target {
    fn value(&self) -> u16 {
        match self {
            Target::Number(n) => n.value(),
            Target::Symbol(_, address) => *address,
        }
    }

    fn is_byte(&self) -> bool {
        matches!(self, Target::Number(Number::Byte(_)))
    }
}

/// Work out the addressing mode of `operand`.
///
/// Checked in order:
///  1. `(...)` forms: `($zz,X)`, `($zz),Y`, `($hhhh)`
///  2. `,X` / `,Y` suffixes, zero page or absolute by width
///  3. `#` immediate
///  4. branch targets, always relative
///  5. bare values, zero page or absolute by width
///
/// Labels are accepted wherever a value is and count as words unless the
/// mode has a one-byte operand.
pub fn analyze(mnemonic: Mnemonic, operand: Option<&str>, scope: &Scope) -> Result<Operand, Error> {
    let Some(text) = operand else {
        return Ok(Operand::implied());
    };
    if text.eq_ignore_ascii_case("a") && scope.table.opcode(mnemonic, Mode::Implied).is_some() {
        return Ok(Operand::implied());
    }
    let lower = text.to_ascii_lowercase();

    if let Some(inner) = text.strip_prefix('(') {
        if inner.starts_with('#') {
            return Err(Error::MalformedOperand(
                text.to_string(),
                "immediate value inside parentheses",
            ));
        }
        let (inner, mode) = if lower.ends_with(",x)") {
            (&inner[..inner.len() - 3], Mode::IndexedIndirect)
        } else if lower.ends_with("),y") {
            (&inner[..inner.len() - 3], Mode::IndirectIndexed)
        } else if let Some(inner) = inner.strip_suffix(')') {
            (inner, Mode::Indirect)
        } else {
            return Err(Error::MalformedOperand(
                text.to_string(),
                "unbalanced parentheses",
            ));
        };
        let target = resolve(inner, text, scope)?;
        return fit(text, mode, target);
    }

    if lower.ends_with(",x") || lower.ends_with(",y") {
        let target = resolve(&text[..text.len() - 2], text, scope)?;
        let mode = match (lower.ends_with(",x"), target.is_byte()) {
            (true, true) => Mode::ZeroPageX,
            (true, false) => Mode::AbsoluteX,
            (false, true) => Mode::ZeroPageY,
            (false, false) => Mode::AbsoluteY,
        };
        return fit(text, mode, target);
    }

    if let Some(value) = text.strip_prefix('#') {
        let target = resolve(value, text, scope)?;
        return fit(text, Mode::Immediate, target);
    }

    let target = resolve(text, text, scope)?;
    let mode = if mnemonic.is_branch() {
        Mode::Relative
    } else if target.is_byte() {
        Mode::ZeroPage
    } else {
        Mode::Absolute
    };
    fit(text, mode, target)
}

fn resolve(s: &str, operand: &str, scope: &Scope) -> Result<Target, Error> {
    if is_numeric(s) {
        return Ok(Target::Number(parse_hex(s)?));
    }
    if !is_identifier(s) {
        return Err(Error::MalformedOperand(
            operand.to_string(),
            "expected a hex value or a label",
        ));
    }
    match scope.symbols.address(s) {
        Some(address) => Ok(Target::Symbol(s.to_string(), address)),
        None if scope.pass < 2 => Ok(Target::Symbol(s.to_string(), 0)),
        None => Err(Error::UndefinedSymbol(s.to_string())),
    }
}

/// Check the value's width against the operand width of `mode`.
fn fit(operand: &str, mode: Mode, target: Target) -> Result<Operand, Error> {
    let fits = match (&target, mode.operand_len()) {
        _ if mode == Mode::Relative => true,
        (Target::Number(Number::Byte(_)), 1) | (Target::Number(Number::Word(_)), 2) => true,
        (Target::Symbol(_, address), 1) => *address <= 0xFF,
        (Target::Symbol(..), 2) => true,
        _ => false,
    };
    if !fits {
        return Err(Error::AddressLength(
            operand.to_string(),
            format!("does not fit {} ({} byte operand)", mode, mode.operand_len()),
        ));
    }

    let value = target.value();
    let symbol = match target {
        Target::Symbol(name, _) => Some(name),
        Target::Number(_) => None,
    };
    Ok(Operand { mode, value, symbol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        symbol::{Symbol, SymbolTable},
    };
    use arch::OpcodeMap;

    fn run(mnemonic: Mnemonic, operand: &str, symbols: &SymbolTable, pass: u8) -> Result<Operand, Error> {
        let table = OpcodeMap::nmos6502();
        let config = Config::default();
        let scope = Scope {
            table: &table,
            symbols,
            config: &config,
            pass,
        };
        analyze(mnemonic, Some(operand), &scope)
    }

    fn mode_of(mnemonic: Mnemonic, operand: &str) -> Mode {
        run(mnemonic, operand, &SymbolTable::new(), 1).unwrap().mode
    }

    fn symbols() -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, address) in [("ZP", 0x0040), ("FAR", 0x1234)] {
            table
                .insert(Symbol {
                    name: name.to_string(),
                    address,
                    line: 1,
                })
                .unwrap();
        }
        table
    }

    #[test]
    fn modes() {
        use Mnemonic::*;
        assert_eq!(mode_of(LDA, "#$05"), Mode::Immediate);
        assert_eq!(mode_of(LDA, "$05"), Mode::ZeroPage);
        assert_eq!(mode_of(LDA, "$0005"), Mode::Absolute);
        assert_eq!(mode_of(LDA, "$05,X"), Mode::ZeroPageX);
        assert_eq!(mode_of(LDX, "$05,y"), Mode::ZeroPageY);
        assert_eq!(mode_of(LDA, "$1234,X"), Mode::AbsoluteX);
        assert_eq!(mode_of(LDA, "$1234,Y"), Mode::AbsoluteY);
        assert_eq!(mode_of(LDA, "($20,X)"), Mode::IndexedIndirect);
        assert_eq!(mode_of(LDA, "($20),y"), Mode::IndirectIndexed);
        assert_eq!(mode_of(JMP, "($1234)"), Mode::Indirect);
        assert_eq!(mode_of(BNE, "$10"), Mode::Relative);
        assert_eq!(mode_of(BNE, "LOOP"), Mode::Relative);
        assert_eq!(mode_of(JMP, "LOOP"), Mode::Absolute);
        assert_eq!(mode_of(ASL, "a"), Mode::Implied);
    }

    #[test]
    fn dollar_is_optional_before_a_digit() {
        let op = run(Mnemonic::LDA, "8000", &SymbolTable::new(), 1).unwrap();
        assert_eq!((op.mode, op.value), (Mode::Absolute, 0x8000));
    }

    #[test]
    fn width_mismatch() {
        let none = SymbolTable::new();
        for (mnemonic, operand) in [
            (Mnemonic::LDA, "#$1234"),
            (Mnemonic::LDA, "($1234,X)"),
            (Mnemonic::JMP, "($12)"),
            (Mnemonic::LDA, "$1"),
            (Mnemonic::LDA, "#$123"),
        ] {
            let err = run(mnemonic, operand, &none, 1).unwrap_err();
            assert!(matches!(err, Error::AddressLength(..)), "{operand}: {err}");
        }
    }

    #[test]
    fn malformed() {
        let none = SymbolTable::new();
        for operand in ["($12", "(#$12,X)", "@@", "#"] {
            let err = run(Mnemonic::LDA, operand, &none, 1).unwrap_err();
            assert!(
                matches!(err, Error::MalformedOperand(..) | Error::Conversion(_)),
                "{operand}: {err}"
            );
        }
        let err = run(Mnemonic::LDA, "$GG", &none, 1).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn label_operands() {
        let table = symbols();
        let op = run(Mnemonic::LDA, "#ZP", &table, 2).unwrap();
        assert_eq!((op.mode, op.value), (Mode::Immediate, 0x40));
        assert_eq!(op.symbol.as_deref(), Some("ZP"));

        // Labels never shrink to zero page.
        let op = run(Mnemonic::LDA, "ZP,X", &table, 2).unwrap();
        assert_eq!((op.mode, op.value), (Mode::AbsoluteX, 0x40));

        let err = run(Mnemonic::LDA, "(FAR),Y", &table, 2).unwrap_err();
        assert!(matches!(err, Error::AddressLength(..)));

        // Pass 1 defers, pass 2 insists.
        assert!(run(Mnemonic::LDA, "#NOPE", &table, 1).is_ok());
        let err = run(Mnemonic::LDA, "#NOPE", &table, 2).unwrap_err();
        assert!(matches!(err, Error::UndefinedSymbol(ref s) if s == "NOPE"));
    }
}
