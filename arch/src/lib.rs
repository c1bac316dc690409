pub mod mnemonic;
pub mod mode;
pub mod table;

pub use mnemonic::Mnemonic;
pub use mode::Mode;
pub use table::{OpcodeMap, OpcodeTable, NMOS6502};
