// Array addressing: declared bounds, literal and variable indices,
// reads, writes, and isolation between elements.

use super::compile_and_run;

#[test]
fn test_store_and_load_literal_index() {
    let out = compile_and_run(
        r#"PROGRAM IS a[1:5], x BEGIN
            a[3] := 42;
            x := a[3];
            WRITE x;
        END"#,
        &[],
    );
    assert_eq!(out, vec![42]);
}

#[test]
fn test_nonzero_lower_bound() {
    let out = compile_and_run(
        r#"PROGRAM IS a[10:12] BEGIN
            a[10] := 1;
            a[11] := 2;
            a[12] := 3;
            WRITE a[10];
            WRITE a[11];
            WRITE a[12];
        END"#,
        &[],
    );
    assert_eq!(out, vec![1, 2, 3]);
}

#[test]
fn test_negative_lower_bound() {
    let out = compile_and_run(
        r#"PROGRAM IS a[-2:2], s BEGIN
            a[-2] := 5;
            a[0] := 7;
            a[2] := 9;
            s := a[-2] + a[0];
            s := s + a[2];
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![21]);
}

#[test]
fn test_variable_index() {
    let out = compile_and_run(
        r#"PROGRAM IS a[0:9], i, x BEGIN
            READ i;
            READ x;
            a[i] := x;
            WRITE a[i];
        END"#,
        &[7, 123],
    );
    assert_eq!(out, vec![123]);
}

#[test]
fn test_writes_do_not_perturb_neighbours() {
    let out = compile_and_run(
        r#"PROGRAM IS a[1:3] BEGIN
            a[1] := 10;
            a[2] := 20;
            a[3] := 30;
            a[2] := 99;
            WRITE a[1];
            WRITE a[2];
            WRITE a[3];
        END"#,
        &[],
    );
    assert_eq!(out, vec![10, 99, 30]);
}

#[test]
fn test_read_into_element() {
    let out = compile_and_run(
        r#"PROGRAM IS a[1:2] BEGIN
            READ a[1];
            READ a[2];
            WRITE a[2];
            WRITE a[1];
        END"#,
        &[11, 22],
    );
    assert_eq!(out, vec![22, 11]);
}

#[test]
fn test_element_in_expression() {
    let out = compile_and_run(
        r#"PROGRAM IS a[0:4], x BEGIN
            a[0] := 6;
            a[1] := 7;
            x := a[0] * a[1];
            WRITE x;
        END"#,
        &[],
    );
    assert_eq!(out, vec![42]);
}

#[test]
fn test_element_to_element_copy() {
    let out = compile_and_run(
        r#"PROGRAM IS a[0:3], b[0:3] BEGIN
            a[1] := 17;
            b[2] := a[1];
            WRITE b[2];
        END"#,
        &[],
    );
    assert_eq!(out, vec![17]);
}

#[test]
fn test_element_in_condition() {
    let out = compile_and_run(
        r#"PROGRAM IS a[0:1] BEGIN
            a[0] := 3;
            a[1] := 4;
            IF a[0] < a[1] THEN
                WRITE 1;
            ELSE
                WRITE 0;
            ENDIF
        END"#,
        &[],
    );
    assert_eq!(out, vec![1]);
}

#[test]
fn test_fill_and_sum_with_for() {
    let out = compile_and_run(
        r#"PROGRAM IS a[1:10], s BEGIN
            FOR i FROM 1 TO 10 DO
                a[i] := i;
            ENDFOR
            s := 0;
            FOR i FROM 1 TO 10 DO
                s := s + a[i];
            ENDFOR
            WRITE s;
        END"#,
        &[],
    );
    assert_eq!(out, vec![55]);
}

#[test]
fn test_two_arrays_are_independent() {
    let out = compile_and_run(
        r#"PROGRAM IS a[0:2], b[0:2] BEGIN
            FOR i FROM 0 TO 2 DO
                a[i] := 1;
                b[i] := 2;
            ENDFOR
            WRITE a[1];
            WRITE b[1];
        END"#,
        &[],
    );
    assert_eq!(out, vec![1, 2]);
}

#[test]
fn test_single_element_array() {
    let out = compile_and_run(
        r#"PROGRAM IS a[5:5] BEGIN
            a[5] := -8;
            WRITE a[5];
        END"#,
        &[],
    );
    assert_eq!(out, vec![-8]);
}
