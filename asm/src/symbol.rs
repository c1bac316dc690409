use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    error::{Diagnostic, Diagnostics, Error},
    parser::{Instruction, Kind, Pseudo},
    pass::{Reporter, Stage},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub address: u16,
    /// Line that defined it
    pub line: usize,
}

/// Labels in definition order. Filled by pass 1, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: Symbol) -> Result<(), Error> {
        if let Some(prev) = self.symbols.get(&symbol.name) {
            return Err(Error::DuplicateSymbol(symbol.name, prev.line));
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn address(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).map(|sym| sym.address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn sorted(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.symbols.values().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Walk pass 1 output from `origin`, binding every label to the running
/// address. `equ` binds its operand instead.
pub fn collect(
    instructions: &[Instruction],
    origin: u16,
    reporter: &mut Reporter,
) -> Result<SymbolTable, Diagnostics> {
    let mut table = SymbolTable::new();
    let mut pc = origin as u32;

    for inst in instructions {
        let fail = |error| Diagnostic::new(Stage::Symbols, inst.line, &inst.text, error);

        if let Some(name) = &inst.label {
            let address = match inst.kind {
                Kind::Pseudo(Pseudo::EQU) => Ok(inst.word()),
                _ => u16::try_from(pc).map_err(|_| Error::AddressSpace(pc)),
            };
            let bound = address.and_then(|address| {
                table.insert(Symbol {
                    name: name.clone(),
                    address,
                    line: inst.line,
                })
            });
            if let Err(error) = bound {
                reporter.report(fail(error))?;
            }
        }

        let size = inst.size() as u32;
        if size > 0 && pc + size > 0x1_0000 {
            reporter.report(fail(Error::AddressSpace(pc + size - 1)))?;
            break;
        }
        pc += size;
    }

    Ok(table)
}
