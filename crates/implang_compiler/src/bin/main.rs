// The compiler driver: compiles a source file to the machine's text
// format. `-v` dumps the intermediate representation, the memory map and
// the resolved program to stderr; `--semantic-only` stops after semantic
// analysis.

use implang::codegen::ops::write_program;
use implang::{CompileError, codegen, ir, memory, parser, semantic};
use mimalloc::MiMalloc;
use std::env;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const EXIT_USAGE: u8 = 1;

fn print_usage() {
    eprintln!("usage: compile <input> [-v] [--semantic-only] <output>");
    eprintln!("Available options are:");
    eprintln!("  -v               dump IR, memory map and code to stderr");
    eprintln!("  --semantic-only  stop after semantic analysis");
}

#[derive(Default)]
struct Options {
    input: Option<String>,
    output: Option<String>,
    verbose: bool,
    semantic_only: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();
    let mut positional = Vec::new();

    for arg in &args[1..] {
        match arg.as_str() {
            "-v" => opts.verbose = true,
            "--semantic-only" => opts.semantic_only = true,
            other if other.starts_with('-') => {
                return Err(format!("unrecognized option '{other}'"));
            }
            other => positional.push(other.to_string()),
        }
    }

    match positional.len() {
        2 => {
            let mut it = positional.into_iter();
            opts.input = it.next();
            opts.output = it.next();
            Ok(opts)
        }
        1 if opts.semantic_only => {
            opts.input = positional.into_iter().next();
            Ok(opts)
        }
        0 | 1 => Err("missing input or output file".to_string()),
        _ => Err("too many arguments".to_string()),
    }
}

fn main() -> ExitCode {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let input = opts.input.clone().expect("validated by parse_args");
    let source = match fs::read_to_string(&input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading '{input}': {err}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let code = match run(&source, &opts) {
        Ok(Some(code)) => code,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let output = opts.output.as_deref().expect("validated by parse_args");
    if let Err(err) = write_output(&code, output) {
        eprintln!("error writing '{output}': {err}");
        return ExitCode::from(EXIT_USAGE);
    }
    ExitCode::SUCCESS
}

/// The compilation pipeline; `Ok(None)` means analysis-only runs.
fn run(source: &str, opts: &Options) -> Result<Option<Vec<implang::VmOp>>, CompileError> {
    let program = parser::parse(source)?;
    let table = semantic::analyze(&program)?;
    if opts.semantic_only {
        println!("semantic analysis completed successfully");
        return Ok(None);
    }

    let ir = ir::build(&program, &table)?;
    let map = memory::MemoryMap::build(&ir.variables);
    if opts.verbose {
        dump_ir(&ir);
        eprintln!("{map}");
    }

    let code = codegen::generate(&ir, &map)?;
    if opts.verbose {
        dump_code(&code);
    }
    Ok(Some(code))
}

fn write_output(code: &[implang::VmOp], path: &str) -> std::io::Result<()> {
    let file = fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    write_program(code, &mut out)?;
    out.flush()
}

fn dump_ir(ir: &ir::IrProgram) {
    eprintln!("intermediate representation:");
    for instruction in &ir.code {
        let comment = instruction.comment();
        if comment.is_empty() {
            eprintln!("  {instruction}");
        } else {
            eprintln!("  {instruction:<40} # {comment}");
        }
    }
    eprintln!();
}

fn dump_code(code: &[implang::VmOp]) {
    eprintln!("resolved program:");
    for (line, op) in code.iter().enumerate() {
        eprintln!("  {line:>5}: {op}");
    }
    eprintln!();
}
