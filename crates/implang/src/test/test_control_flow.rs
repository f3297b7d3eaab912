// Conditionals and loops, including the comparison operators the machine
// cannot test directly.

use super::compile_and_run;

fn compare_program(op: &str) -> String {
    format!(
        r#"PROGRAM IS a, b BEGIN
            READ a;
            READ b;
            IF a {op} b THEN
                WRITE 1;
            ELSE
                WRITE 0;
            ENDIF
        END"#
    )
}

#[test]
fn test_all_comparison_operators() {
    let cases: &[(&str, fn(i64, i64) -> bool)] = &[
        ("=", |a, b| a == b),
        ("!=", |a, b| a != b),
        ("<", |a, b| a < b),
        (">", |a, b| a > b),
        ("<=", |a, b| a <= b),
        (">=", |a, b| a >= b),
    ];
    for (op, holds) in cases {
        let program = crate::compile(&compare_program(op)).expect("program should compile");
        for &(a, b) in &[(1, 2), (2, 1), (5, 5), (-3, 3), (-3, -3), (0, 0), (-7, -9)] {
            let out = crate::vm::run(&program, &[a, b], 100_000).expect("program should halt");
            let expected = if holds(a, b) { 1 } else { 0 };
            assert_eq!(out, vec![expected], "{a} {op} {b}");
        }
    }
}

#[test]
fn test_if_without_else() {
    let out = compile_and_run(
        r#"PROGRAM IS a BEGIN
            READ a;
            IF a > 0 THEN
                WRITE a;
            ENDIF
            WRITE 0;
        END"#,
        &[5],
    );
    assert_eq!(out, vec![5, 0]);

    let out = compile_and_run(
        r#"PROGRAM IS a BEGIN
            READ a;
            IF a > 0 THEN
                WRITE a;
            ENDIF
            WRITE 0;
        END"#,
        &[-5],
    );
    assert_eq!(out, vec![0]);
}

#[test]
fn test_nested_if() {
    let out = compile_and_run(
        r#"PROGRAM IS a, b BEGIN
            READ a;
            READ b;
            IF a >= 0 THEN
                IF b >= 0 THEN
                    WRITE 1;
                ELSE
                    WRITE 2;
                ENDIF
            ELSE
                WRITE 3;
            ENDIF
        END"#,
        &[1, -1],
    );
    assert_eq!(out, vec![2]);
}

#[test]
fn test_while_countdown() {
    let out = compile_and_run(
        r#"PROGRAM IS n, s BEGIN
            READ n;
            s := 0;
            WHILE n > 0 DO
                s := s + n;
                n := n - 1;
            ENDWHILE
            WRITE s;
        END"#,
        &[10],
    );
    assert_eq!(out, vec![55]);
}

#[test]
fn test_while_false_upfront() {
    let out = compile_and_run(
        r#"PROGRAM IS n BEGIN
            n := 0;
            WHILE n != 0 DO
                n := n - 1;
            ENDWHILE
            WRITE n;
        END"#,
        &[],
    );
    assert_eq!(out, vec![0]);
}

#[test]
fn test_repeat_runs_body_at_least_once() {
    let out = compile_and_run(
        r#"PROGRAM IS n BEGIN
            n := 10;
            REPEAT
                n := n - 1;
            UNTIL n >= 0;
            WRITE n;
        END"#,
        &[],
    );
    assert_eq!(out, vec![9]);
}

#[test]
fn test_repeat_loops_until_condition() {
    let out = compile_and_run(
        r#"PROGRAM IS n, s BEGIN
            n := 0;
            s := 0;
            REPEAT
                n := n + 1;
                s := s + n;
            UNTIL n = 5;
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![15]);
}

#[test]
fn test_for_upward_sum() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM 1 TO 5 DO
                s := s + i;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![15]);
}

#[test]
fn test_for_downward_sum() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM 5 DOWNTO 1 DO
                s := s + i;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![15]);
}

#[test]
fn test_for_empty_range_skips_body() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM 5 TO 1 DO
                s := s + 1;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![0]);
}

#[test]
fn test_for_bound_captured_before_loop() {
    // rewriting the bound variable inside the body must not extend the loop
    let out = compile_and_run(
        r#"PROGRAM IS s, n BEGIN
            n := 5;
            s := 0;
            FOR i FROM 1 TO n DO
                s := s + i;
                n := 100;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![15]);
}

#[test]
fn test_sequential_loops_reuse_iterator_name() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM 1 TO 3 DO
                s := s + i;
            ENDFOR
            FOR i FROM 1 TO 3 DO
                s := s + i;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![12]);
}

#[test]
fn test_nested_for_loops() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM 1 TO 3 DO
                FOR j FROM 1 TO 4 DO
                    s := s + 1;
                ENDFOR
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![12]);
}

#[test]
fn test_gcd_by_subtraction() {
    let out = compile_and_run(
        r#"PROGRAM IS a, b BEGIN
            READ a;
            READ b;
            WHILE a != b DO
                IF a > b THEN
                    a := a - b;
                ELSE
                    b := b - a;
                ENDIF
            ENDWHILE
            WRITE a;
        END"#,
        &[48, 36],
    );
    assert_eq!(out, vec![12]);
}

#[test]
fn test_negative_range_for() {
    let out = compile_and_run(
        r#"PROGRAM IS s BEGIN
            s := 0;
            FOR i FROM -3 TO 3 DO
                s := s + i;
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![0]);
}
