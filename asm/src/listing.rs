use arch::{Mode, OpcodeTable};
use color_print::cformat;

use crate::{
    parser::{Instruction, Kind, Pseudo},
    pass::Assembly,
};

const RULE: &str =
    "+------+------+----------+----------+-----------------+-------------------------------";
const SYMBOLS_PER_ROW: usize = 3;

struct Row<'a> {
    line: Option<usize>,
    address: Option<u16>,
    label: &'a str,
    bytes: &'a [u8],
    disasm: String,
    source: &'a str,
}

impl Row<'_> {
    fn object(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn line(&self) -> String {
        self.line.map(|n| n.to_string()).unwrap_or_default()
    }

    fn address(&self) -> String {
        self.address.map(|a| format!("{:04X}", a)).unwrap_or_default()
    }

    fn format(&self) -> String {
        format!(
            "| {:>4} | {:>4} | {:<8} | {:<8} | {:<15} | {}",
            self.line(),
            self.address(),
            self.label,
            self.object(),
            self.disasm,
            self.source
        )
    }

    fn cformat(&self) -> String {
        cformat!(
            "| {:>4} | <green>{:>4}</> | <yellow>{:<8}</> | <b>{:<8}</> | <r>{:<15}</> | {}",
            self.line(),
            self.address(),
            self.label,
            self.object(),
            self.disasm,
            self.source
        )
    }
}

/// One row per source line. `dfb` data spills onto extra rows, three bytes
/// each.
fn rows<'a>(assembly: &'a Assembly, table: &dyn OpcodeTable) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    for ((inst, obj), source) in assembly
        .instructions
        .iter()
        .zip(&assembly.objects)
        .zip(&assembly.source)
    {
        let mut chunks = obj.bytes.chunks(3);
        let head = chunks.next().unwrap_or(&[]);
        rows.push(Row {
            line: Some(inst.line),
            address: (inst.size() > 0 || inst.label.is_some()).then_some(obj.address),
            label: inst.label.as_deref().unwrap_or_default(),
            bytes: head,
            disasm: describe(inst, obj.address, head, table),
            source: source.as_str(),
        });
        for (idx, chunk) in chunks.enumerate() {
            rows.push(Row {
                line: None,
                address: Some(obj.address.wrapping_add(3 * (idx as u16 + 1))),
                label: "",
                bytes: chunk,
                disasm: String::new(),
                source: "",
            });
        }
    }
    rows
}

fn describe(inst: &Instruction, address: u16, bytes: &[u8], table: &dyn OpcodeTable) -> String {
    match inst.kind {
        Kind::Code(_) => disassemble(table, address, bytes).unwrap_or_default(),
        Kind::Pseudo(Pseudo::DFB) => "dfb".to_string(),
        Kind::Pseudo(pseudo) => format!("{} ${:04X}", pseudo, inst.word()),
        Kind::Comment => String::new(),
    }
}

/// Decode the encoding back into source form, e.g. `lda ($20),Y`.
pub fn disassemble(table: &dyn OpcodeTable, address: u16, bytes: &[u8]) -> Option<String> {
    let (&opcode, operand) = bytes.split_first()?;
    let (mnemonic, mode) = table.decode(opcode)?;
    if operand.len() != mode.operand_len() as usize {
        return None;
    }

    let low = operand.first().copied().unwrap_or(0);
    let word = u16::from_le_bytes([low, operand.get(1).copied().unwrap_or(0)]);
    let operand = match mode {
        Mode::Implied => String::new(),
        Mode::Immediate => format!(" #${:02X}", low),
        Mode::ZeroPage => format!(" ${:02X}", low),
        Mode::ZeroPageX => format!(" ${:02X},X", low),
        Mode::ZeroPageY => format!(" ${:02X},Y", low),
        Mode::Absolute => format!(" ${:04X}", word),
        Mode::AbsoluteX => format!(" ${:04X},X", word),
        Mode::AbsoluteY => format!(" ${:04X},Y", word),
        Mode::IndexedIndirect => format!(" (${:02X},X)", low),
        Mode::IndirectIndexed => format!(" (${:02X}),Y", low),
        Mode::Indirect => format!(" (${:04X})", word),
        Mode::Relative => {
            let target = address.wrapping_add(2).wrapping_add(low as i8 as u16);
            format!(" ${:04X}", target)
        }
    };
    Some(format!("{}{}", mnemonic, operand))
}

fn symbol_lines(assembly: &Assembly) -> Vec<String> {
    assembly
        .symbols
        .sorted()
        .chunks(SYMBOLS_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|sym| format!("{:<8} ${:04X}", sym.name, sym.address))
                .collect::<Vec<_>>()
                .join("    ")
        })
        .collect()
}

/// Plain-text listing, as written to the `.lst` file.
pub fn render(assembly: &Assembly, table: &dyn OpcodeTable) -> String {
    let mut out = Vec::new();
    out.push(RULE.to_string());
    out.push(format!(
        "| {:>4} | {:>4} | {:<8} | {:<8} | {:<15} | {}",
        "line", "addr", "label", "object", "disassembly", "source"
    ));
    out.push(RULE.to_string());
    out.extend(rows(assembly, table).iter().map(Row::format));
    out.push(RULE.to_string());

    out.push(format!(
        "origin ${:04X}, {} byte(s), {} symbol(s)",
        assembly.origin,
        assembly.binary().len(),
        assembly.symbols.len()
    ));
    if !assembly.symbols.is_empty() {
        out.push(String::new());
        out.extend(symbol_lines(assembly));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Coloured listing on stdout.
pub fn print(assembly: &Assembly, table: &dyn OpcodeTable) {
    println!("{}", RULE);
    for row in rows(assembly, table) {
        println!("{}", row.cformat());
    }
    println!("{}", RULE);
    for line in symbol_lines(assembly) {
        println!("{}", cformat!("<yellow>{}</>", line));
    }
}
