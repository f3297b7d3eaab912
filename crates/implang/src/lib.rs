// A whole-program compiler for a small imperative language targeting a
// single-accumulator virtual machine.
//
// Pipeline: lexer/parser -> semantic analysis (symbol table, costly-op
// set) -> IR builder (+ synthesized arithmetic) -> memory mapper -> code
// generator -> label resolution. Each phase reads the previous phase's
// output once; a fatal error in any phase aborts without output.

#[cfg(test)]
mod test;

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod semantic;
pub mod symbols;
pub mod vm;

pub use codegen::VmOp;
pub use error::{CompileError, CompileResult};

/// Compile source text all the way to a resolved instruction sequence.
pub fn compile(source: &str) -> CompileResult<Vec<VmOp>> {
    let program = parser::parse(source)?;
    let table = semantic::analyze(&program)?;
    let ir = ir::build(&program, &table)?;
    let map = memory::MemoryMap::build(&ir.variables);
    codegen::generate(&ir, &map)
}

/// Compile to the machine's text format, one instruction per line.
pub fn compile_to_string(source: &str) -> CompileResult<String> {
    let ops = compile(source)?;
    let mut out = Vec::new();
    codegen::ops::write_program(&ops, &mut out)
        .expect("writing to a Vec cannot fail");
    Ok(String::from_utf8(out).expect("emitted program is ASCII"))
}
