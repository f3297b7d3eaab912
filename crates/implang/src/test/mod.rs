// Test module organization
pub mod test_arithmetic;
pub mod test_arrays;
pub mod test_control_flow;
pub mod test_memory;
pub mod test_procedures;
pub mod test_semantic;

use crate::vm;

/// Compile a program and execute it on the reference machine.
pub(crate) fn compile_and_run(source: &str, input: &[i64]) -> Vec<i64> {
    let program = crate::compile(source).expect("program should compile");
    vm::run(&program, input, 5_000_000).expect("program should halt")
}

/// Floor division: quotient toward negative infinity.
pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
}

/// Remainder matching floor division; takes the divisor's sign.
pub(crate) fn floor_mod(a: i64, b: i64) -> i64 {
    a - b * floor_div(a, b)
}
