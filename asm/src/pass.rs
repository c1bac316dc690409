use std::mem;

use arch::OpcodeTable;
use color_print::cprintln;
use indexmap::IndexSet;
use strum::Display;

use crate::{
    codegen::{self, Emitted},
    config::Config,
    error::{Diagnostic, Diagnostics, Error},
    parser::{Instruction, Kind, Pseudo, Scope},
    symbol::{self, SymbolTable},
    util::strip_comment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(to_string = "pass 1")]
    Pass1,
    #[strum(to_string = "origin")]
    Origin,
    #[strum(to_string = "symbols")]
    Symbols,
    #[strum(to_string = "pass 2")]
    Pass2,
    #[strum(to_string = "code generation")]
    CodeGen,
}

/// Decides whether an error halts the run.
///
/// A line is reported at most once: pass 2 sees the same text pass 1
/// already rejected.
#[derive(Debug)]
pub struct Reporter {
    continue_on_error: bool,
    diagnostics: Vec<Diagnostic>,
    failed: IndexSet<usize>,
}

impl Reporter {
    pub fn new(continue_on_error: bool) -> Self {
        Reporter {
            continue_on_error,
            diagnostics: Vec::new(),
            failed: IndexSet::new(),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) -> Result<(), Diagnostics> {
        if self.failed.insert(diagnostic.line) {
            self.diagnostics.push(diagnostic);
        }
        if self.continue_on_error {
            Ok(())
        } else {
            Err(self.take())
        }
    }

    pub fn finish(mut self) -> Result<(), Diagnostics> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(self.take())
        }
    }

    fn take(&mut self) -> Diagnostics {
        Diagnostics(mem::take(&mut self.diagnostics))
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub origin: u16,
    /// Raw source lines, comments included
    pub source: Vec<String>,
    /// Pass 2 output, one per source line
    pub instructions: Vec<Instruction>,
    /// Bytes per instruction, aligned with `instructions`
    pub objects: Vec<Emitted>,
    pub symbols: SymbolTable,
}

impl Assembly {
    /// The flat image, starting at `origin`.
    pub fn binary(&self) -> Vec<u8> {
        self.objects
            .iter()
            .flat_map(|obj| obj.bytes.iter().copied())
            .collect()
    }
}

pub struct Assembler<T: OpcodeTable> {
    table: T,
    config: Config,
}

impl<T: OpcodeTable> Assembler<T> {
    pub fn new(table: T, config: Config) -> Self {
        Assembler { table, config }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn assemble(&self, source: &str) -> Result<Assembly, Diagnostics> {
        let lines: Vec<&str> = source.lines().collect();
        let mut reporter = Reporter::new(self.config.continue_on_error);

        self.progress(1, "Pass 1: classify lines");
        let first = self.pass(&lines, Stage::Pass1, &SymbolTable::new(), &[], &mut reporter)?;

        self.progress(2, "Resolve origin & symbols");
        let origin = resolve_origin(&first, &mut reporter)?;
        let symbols = symbol::collect(&first, origin, &mut reporter)?;
        if self.config.verbose {
            cprintln!("   origin <yellow>${:04X}</>, {} symbol(s)", origin, symbols.len());
        }

        self.progress(3, "Pass 2: resolve operands");
        let second = self.pass(&lines, Stage::Pass2, &symbols, &first, &mut reporter)?;

        self.progress(4, "Generate code");
        let objects = codegen::generate(&second, origin, &mut reporter)?;
        reporter.finish()?;

        Ok(Assembly {
            origin,
            source: lines.iter().map(|line| line.to_string()).collect(),
            instructions: second,
            objects,
            symbols,
        })
    }

    /// One classification sweep. In collect mode a failing line takes the
    /// shape `previous` gave it, or becomes a comment keeping its label, so
    /// the addresses and symbols of the rest stay put.
    fn pass(
        &self,
        lines: &[&str],
        stage: Stage,
        symbols: &SymbolTable,
        previous: &[Instruction],
        reporter: &mut Reporter,
    ) -> Result<Vec<Instruction>, Diagnostics> {
        let scope = Scope {
            table: &self.table,
            symbols,
            config: &self.config,
            pass: if stage == Stage::Pass1 { 1 } else { 2 },
        };

        let mut instructions = Vec::with_capacity(lines.len());
        for (idx, raw) in lines.iter().enumerate() {
            let line = idx + 1;
            let inst = match Instruction::parse(line, raw, &scope) {
                Ok(inst) => inst,
                Err(error) => {
                    let text = strip_comment(raw).trim();
                    reporter.report(Diagnostic::new(stage, line, text, error))?;
                    match previous.get(idx) {
                        Some(inst) => inst.clone(),
                        None => Instruction::failed(line, raw, &scope),
                    }
                }
            };
            instructions.push(inst);
        }
        Ok(instructions)
    }

    fn progress(&self, step: usize, message: &str) {
        if self.config.verbose {
            cprintln!("<green,bold>{}.</> {}", step, message);
        }
    }
}

/// The first `org` wins; it must come before any byte is emitted.
fn resolve_origin(instructions: &[Instruction], reporter: &mut Reporter) -> Result<u16, Diagnostics> {
    let mut origin = None;
    let mut emitted = false;

    for inst in instructions {
        if inst.kind != Kind::Pseudo(Pseudo::ORG) {
            emitted |= inst.size() > 0;
            continue;
        }
        let reason = if origin.is_some() {
            Some("origin is already set")
        } else if emitted {
            Some("must come before any code")
        } else {
            None
        };
        match reason {
            Some(reason) => reporter.report(Diagnostic::new(
                Stage::Origin,
                inst.line,
                &inst.text,
                Error::Pseudo("org", reason),
            ))?,
            None => origin = Some(inst.word()),
        }
    }

    Ok(origin.unwrap_or(0))
}
