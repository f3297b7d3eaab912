// Synthesized multiplication, division and modulo: sign handling, the
// division-by-zero contract, and the constant folds.

use super::{compile_and_run, floor_div, floor_mod};
use crate::vm;

const MUL_PROGRAM: &str =
    "PROGRAM IS a, b, c BEGIN READ a; READ b; c := a * b; WRITE c; END";
const DIV_PROGRAM: &str =
    "PROGRAM IS a, b, c BEGIN READ a; READ b; c := a / b; WRITE c; END";
const MOD_PROGRAM: &str =
    "PROGRAM IS a, b, c BEGIN READ a; READ b; c := a % b; WRITE c; END";

fn samples() -> Vec<i64> {
    vec![
        0, 1, -1, 2, -2, 3, -3, 5, -5, 7, -7, 12, -12, 100, -100, 1023, -1023,
        4096, 65535, -65536, 2147483647, -2147483648,
    ]
}

#[test]
fn test_multiplication_signed_grid() {
    let program = crate::compile(MUL_PROGRAM).expect("program should compile");
    for &a in &samples() {
        for &b in &samples() {
            let out = vm::run(&program, &[a, b], 5_000_000).expect("program should halt");
            assert_eq!(out, vec![a.wrapping_mul(b)], "{a} * {b}");
        }
    }
}

#[test]
fn test_division_signed_grid() {
    let program = crate::compile(DIV_PROGRAM).expect("program should compile");
    for &a in &samples() {
        for &b in &samples() {
            let expected = if b == 0 { 0 } else { floor_div(a, b) };
            let out = vm::run(&program, &[a, b], 5_000_000).expect("program should halt");
            assert_eq!(out, vec![expected], "{a} / {b}");
        }
    }
}

#[test]
fn test_modulo_signed_grid() {
    let program = crate::compile(MOD_PROGRAM).expect("program should compile");
    for &a in &samples() {
        for &b in &samples() {
            let expected = if b == 0 { 0 } else { floor_mod(a, b) };
            let out = vm::run(&program, &[a, b], 5_000_000).expect("program should halt");
            assert_eq!(out, vec![expected], "{a} % {b}");
        }
    }
}

#[test]
fn test_multiply_negative_literal() {
    let out = compile_and_run(
        "PROGRAM IS a BEGIN a := 7 * -3; WRITE a; END",
        &[],
    );
    assert_eq!(out, vec![-21]);
}

#[test]
fn test_floor_division_negative_divisor() {
    // 7 / -2 floors to -4, and the remainder takes the divisor's sign
    let out = compile_and_run(
        r#"PROGRAM IS a, b, q, r BEGIN
            READ a;
            READ b;
            q := a / b;
            r := a % b;
            WRITE q;
            WRITE r;
        END"#,
        &[7, -2],
    );
    assert_eq!(out, vec![-4, -1]);
}

#[test]
fn test_division_by_zero_yields_zero() {
    let out = compile_and_run(
        r#"PROGRAM IS a, q, r BEGIN
            READ a;
            q := a / 0;
            r := a % 0;
            WRITE q;
            WRITE r;
        END"#,
        &[9],
    );
    assert_eq!(out, vec![0, 0]);
}

#[test]
fn test_division_by_zero_variable_divisor() {
    let out = compile_and_run(
        r#"PROGRAM IS a, b, q, r BEGIN
            READ a;
            READ b;
            q := a / b;
            r := a % b;
            WRITE q;
            WRITE r;
        END"#,
        &[9, 0],
    );
    assert_eq!(out, vec![0, 0]);
}

#[test]
fn test_constant_folds() {
    let out = compile_and_run(
        r#"PROGRAM IS a, x BEGIN
            READ a;
            x := a * 0;
            WRITE x;
            x := a * 1;
            WRITE x;
            x := a / 1;
            WRITE x;
        END"#,
        &[-37],
    );
    assert_eq!(out, vec![0, -37, -37]);
}

#[test]
fn test_modulo_by_one() {
    let out = compile_and_run(
        "PROGRAM IS a, r BEGIN READ a; r := a % 1; WRITE r; END",
        &[17],
    );
    assert_eq!(out, vec![0]);
}

#[test]
fn test_large_products() {
    let out = compile_and_run(
        r#"PROGRAM IS a, b, c BEGIN
            READ a;
            READ b;
            c := a * b;
            WRITE c;
        END"#,
        &[2147483647, 2147483647],
    );
    assert_eq!(out, vec![2147483647i64 * 2147483647]);
}

#[test]
fn test_chained_costly_operations() {
    // each call restages the clobbered ABI cells
    let out = compile_and_run(
        r#"PROGRAM IS a, b, c, d BEGIN
            READ a;
            READ b;
            c := a * b;
            d := c / b;
            c := c % a;
            WRITE d;
            WRITE c;
        END"#,
        &[12, 7],
    );
    assert_eq!(out, vec![12, 0]);
}
