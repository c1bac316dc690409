use arch::{Mnemonic, Mode};
use color_print::ceprintln;
use thiserror::Error;

use crate::pass::Stage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown mnemonic: `{0}`")]
    UnknownMnemonic(String),

    #[error("Ill-formed operand `{0}`: {1}")]
    MalformedOperand(String, &'static str),

    #[error("Cannot convert `{0}` from hex")]
    Conversion(String),

    #[error("Address length: `{0}` {1}")]
    AddressLength(String, String),

    #[error("Invalid label: `{0}`")]
    InvalidLabel(String),

    #[error("Label `{0}` exceeds {1} chars")]
    LabelTooLong(String, usize),

    #[error("Re-defined symbol: `{0}` (first defined on line {1})")]
    DuplicateSymbol(String, usize),

    #[error("Undefined symbol: `{0}`")]
    UndefinedSymbol(String),

    #[error("Relative offset out of range: ${0:04X} is {1} bytes away, branches reach -128..=127")]
    RelativeOutOfRange(u16, i32),

    #[error("Address space overflow: ${0:X} is beyond $FFFF")]
    AddressSpace(u32),

    #[error("Malformed `{0}` pseudo-op: {1}")]
    Pseudo(&'static str, &'static str),

    #[error("Too many elements in line: found {0}")]
    TooManyFields(usize),

    #[error("Invalid mnemonic/operand combination: `{0}` has no {1} form")]
    InvalidAddressing(Mnemonic, Mode),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Failed to serialize symbols")]
    Serialize(#[source] serde_yaml::Error),
}

/// An error pinned to the source line that caused it.
#[derive(Error, Debug)]
#[error("line {line}: {error}")]
pub struct Diagnostic {
    pub stage: Stage,
    /// 1-based
    pub line: usize,
    /// Comment-stripped line text
    pub text: String,
    #[source]
    pub error: Error,
}

impl Diagnostic {
    pub fn new(stage: Stage, line: usize, text: &str, error: Error) -> Self {
        Diagnostic {
            stage,
            line,
            text: text.to_string(),
            error,
        }
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print(&self, file: &str) {
        ceprintln!("<red,bold>error</>: {}", self.error);
        ceprintln!("     <blue>--></> <underline>{}:{}</> ({})", file, self.line, self.stage);
        ceprintln!("      <blue>|</>");
        ceprintln!(" <blue>{:>4} |</> {}", self.line, self.text);
        ceprintln!("      <blue>|</>");
    }
}

/// Every diagnostic collected before the run halted.
#[derive(Error, Debug)]
#[error("{} error(s) while assembling", .0.len())]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn first(&self) -> Option<&Diagnostic> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
