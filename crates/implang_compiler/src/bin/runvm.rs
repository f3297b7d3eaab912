// Reference-machine runner: loads a compiled program and executes it with
// stdin as the input stream and stdout as the output stream.

use implang::codegen::ops::parse_program;
use implang::vm;
use mimalloc::MiMalloc;
use std::env;
use std::fs;
use std::io::{self, BufRead};
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_FUEL: u64 = 1_000_000_000;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: runvm <program>");
        return ExitCode::from(1);
    };

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error reading '{path}': {err}");
            return ExitCode::from(1);
        }
    };
    let program = match parse_program(&text) {
        Ok(program) => program,
        Err(message) => {
            eprintln!("error in '{path}': {message}");
            return ExitCode::from(1);
        }
    };

    let input = match read_input() {
        Ok(input) => input,
        Err(message) => {
            eprintln!("error reading input: {message}");
            return ExitCode::from(1);
        }
    };

    match vm::run(&program, &input, DEFAULT_FUEL) {
        Ok(output) => {
            for value in output {
                println!("{value}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("machine error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Whitespace-separated integers from stdin until end of input.
fn read_input() -> Result<Vec<i64>, String> {
    let mut input = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        for word in line.split_whitespace() {
            let value = word
                .parse()
                .map_err(|_| format!("'{word}' is not an integer"))?;
            input.push(value);
        }
    }
    Ok(input)
}
