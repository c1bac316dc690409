use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use arch::{OpcodeMap, OpcodeTable};
use clap::Parser;
use color_print::{ceprintln, cprintln};
use hasm65::{listing, Assembler, Assembly, Config, Error};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Source file
    input: PathBuf,

    /// Output binary [default: <input>.bin]
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Also write a listing next to the binary (.lst)
    #[clap(short, long)]
    listing: bool,

    /// Also write the symbol table next to the binary (.sym.yaml)
    #[clap(short, long)]
    symbols: bool,

    /// Keep going after an error and report every failing line
    #[clap(short = 'k', long)]
    continue_on_error: bool,

    /// Longest accepted label
    #[clap(long, default_value_t = 6)]
    max_label: usize,

    /// Only print errors
    #[clap(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let path = args.input.display().to_string();
    if !args.quiet {
        println!("6502 Assembler");
        println!("  < {}", path);
    }

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => return fail(Error::FileOpen(path, e)),
    };

    let config = Config {
        max_label_len: args.max_label,
        continue_on_error: args.continue_on_error,
        verbose: !args.quiet,
    };
    let assembler = Assembler::new(OpcodeMap::nmos6502(), config);

    let assembly = match assembler.assemble(&source) {
        Ok(assembly) => assembly,
        Err(diags) => {
            for diag in diags.iter() {
                diag.print(&path);
            }
            ceprintln!("<red,bold>error</>: {}, nothing written", diags);
            return ExitCode::FAILURE;
        }
    };

    if !args.quiet {
        listing::print(&assembly, assembler.table());
    }
    match write_outputs(&args, &assembly, assembler.table()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn write_outputs(args: &Args, assembly: &Assembly, table: &dyn OpcodeTable) -> Result<(), Error> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("bin"));

    if !args.quiet {
        cprintln!("<green,bold>5.</> Write output");
    }
    let binary = assembly.binary();
    write(&output, &binary)?;
    if !args.quiet {
        cprintln!("  > {} (<green>{} byte(s)</>)", output.display(), binary.len());
    }

    if args.listing {
        let path = output.with_extension("lst");
        write(&path, listing::render(assembly, table).as_bytes())?;
        if !args.quiet {
            println!("  > {}", path.display());
        }
    }

    if args.symbols {
        let path = output.with_extension("sym.yaml");
        let yaml = serde_yaml::to_string(&assembly.symbols.sorted()).map_err(Error::Serialize)?;
        write(&path, yaml.as_bytes())?;
        if !args.quiet {
            println!("  > {}", path.display());
        }
    }

    Ok(())
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    fs::write(path, bytes).map_err(|e| Error::FileWrite(path.display().to_string(), e))
}

fn fail(error: Error) -> ExitCode {
    ceprintln!("<red,bold>error</>: {}", error);
    if let Some(source) = std::error::Error::source(&error) {
        ceprintln!("       {}", source);
    }
    ExitCode::FAILURE
}
