use arch::{Mnemonic, Mode};

use crate::{
    error::{Diagnostic, Diagnostics, Error},
    parser::{Instruction, Kind},
    pass::{Reporter, Stage},
};

/// Bytes one source line contributes to the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub address: u16,
    pub bytes: Vec<u8>,
}

/// Lay the resolved instructions out from `origin`.
pub fn generate(
    instructions: &[Instruction],
    origin: u16,
    reporter: &mut Reporter,
) -> Result<Vec<Emitted>, Diagnostics> {
    let mut objects = Vec::with_capacity(instructions.len());
    let mut pc = origin as u32;

    for inst in instructions {
        let size = inst.size() as u32;
        let address = pc as u16;

        if size > 0 && pc + size > 0x1_0000 {
            let error = Error::AddressSpace(pc + size - 1);
            reporter.report(Diagnostic::new(Stage::CodeGen, inst.line, &inst.text, error))?;
            break;
        }

        let bytes = match encode(inst, address) {
            Ok(bytes) => bytes,
            Err(error) => {
                reporter.report(Diagnostic::new(Stage::CodeGen, inst.line, &inst.text, error))?;
                Vec::new()
            }
        };
        objects.push(Emitted { address, bytes });
        pc += size;
    }

    Ok(objects)
}

/// Encode one instruction placed at `pc`. Operands go out low byte first.
pub fn encode(inst: &Instruction, pc: u16) -> Result<Vec<u8>, Error> {
    // Only `dfb` carries data among the non-code lines.
    if inst.is_comment {
        return Ok(inst.data.clone());
    }
    let Kind::Code(mode) = inst.kind else {
        return Ok(Vec::new());
    };

    // $00 is BRK; anything else encoding to it never got an opcode.
    if inst.opcode == 0 && !(mode == Mode::Implied && inst.mnemonic == "brk") {
        let mnemonic = Mnemonic::parse(&inst.mnemonic)
            .ok_or_else(|| Error::UnknownMnemonic(inst.mnemonic.clone()))?;
        return Err(Error::InvalidAddressing(mnemonic, mode));
    }

    let bytes = match mode {
        Mode::Relative => {
            let offset = relative_offset(pc, inst.word())?;
            vec![inst.opcode, offset as u8]
        }
        _ => match inst.length {
            1 => vec![inst.opcode],
            2 => vec![inst.opcode, inst.op_low],
            _ => vec![inst.opcode, inst.op_low, inst.op_high],
        },
    };
    Ok(bytes)
}

/// Displacement from the byte after a 2-byte branch at `pc` to `target`.
pub fn relative_offset(pc: u16, target: u16) -> Result<i8, Error> {
    let offset = target as i32 - (pc as i32 + 2);
    i8::try_from(offset).map_err(|_| Error::RelativeOutOfRange(target, offset))
}
