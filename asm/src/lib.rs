pub mod codegen;
pub mod config;
pub mod error;
pub mod listing;
pub mod operand;
pub mod parser;
pub mod pass;
pub mod symbol;
pub mod util;

pub use config::Config;
pub use error::{Diagnostic, Diagnostics, Error};
pub use pass::{Assembler, Assembly, Stage};

/// Assemble `source` against the NMOS 6502 set with default settings.
pub fn assemble(source: &str) -> Result<Assembly, Diagnostics> {
    Assembler::new(arch::OpcodeMap::nmos6502(), Config::default()).assemble(source)
}
