// Procedure linkage: by-reference parameters, array parameters, stored
// return addresses across repeated and chained calls.

use super::compile_and_run;

#[test]
fn test_swap_scalars() {
    let out = compile_and_run(
        r#"PROCEDURE swap(a, b) IS c BEGIN
            c := a;
            a := b;
            b := c;
        END
        PROGRAM IS x, y BEGIN
            x := 1;
            y := 2;
            swap(x, y);
            WRITE x;
            WRITE y;
        END"#,
        &[],
    );
    assert_eq!(out, vec![2, 1]);
}

#[test]
fn test_writes_through_parameter_reach_caller() {
    let out = compile_and_run(
        r#"PROCEDURE answer(x) IS BEGIN
            x := 42;
        END
        PROGRAM IS a BEGIN
            a := 0;
            answer(a);
            WRITE a;
        END"#,
        &[],
    );
    assert_eq!(out, vec![42]);
}

#[test]
fn test_repeated_calls_reuse_return_cell() {
    let out = compile_and_run(
        r#"PROCEDURE inc(x) IS BEGIN
            x := x + 1;
        END
        PROGRAM IS a BEGIN
            a := 0;
            inc(a);
            inc(a);
            inc(a);
            WRITE a;
        END"#,
        &[],
    );
    assert_eq!(out, vec![3]);
}

#[test]
fn test_call_in_loop() {
    let out = compile_and_run(
        r#"PROCEDURE double(x) IS BEGIN
            x := x + x;
        END
        PROGRAM IS a BEGIN
            a := 1;
            FOR i FROM 1 TO 10 DO
                double(a);
            ENDFOR
            WRITE a;
        END"#,
        &[],
    );
    assert_eq!(out, vec![1024]);
}

#[test]
fn test_procedure_calling_earlier_procedure() {
    let out = compile_and_run(
        r#"PROCEDURE inc(x) IS BEGIN
            x := x + 1;
        END
        PROCEDURE inctwice(x) IS BEGIN
            inc(x);
            inc(x);
        END
        PROGRAM IS a BEGIN
            a := 40;
            inctwice(a);
            WRITE a;
        END"#,
        &[],
    );
    assert_eq!(out, vec![42]);
}

#[test]
fn test_parameter_forwarding_through_two_levels() {
    // the middle procedure passes its own (pointer) parameter on
    let out = compile_and_run(
        r#"PROCEDURE set(x) IS BEGIN
            x := 7;
        END
        PROCEDURE relay(y) IS BEGIN
            set(y);
        END
        PROGRAM IS a BEGIN
            a := 0;
            relay(a);
            WRITE a;
        END"#,
        &[],
    );
    assert_eq!(out, vec![7]);
}

#[test]
fn test_array_parameter() {
    let out = compile_and_run(
        r#"PROCEDURE sum(T t, n, s) IS i BEGIN
            s := 0;
            FOR i FROM 1 TO n DO
                s := s + t[i];
            ENDFOR
        END
        PROGRAM IS a[1:4], n, total BEGIN
            a[1] := 10;
            a[2] := 20;
            a[3] := 30;
            a[4] := 40;
            n := 4;
            sum(a, n, total);
            WRITE total;
        END"#,
        &[],
    );
    assert_eq!(out, vec![100]);
}

#[test]
fn test_array_parameter_writes_reach_caller() {
    let out = compile_and_run(
        r#"PROCEDURE fill(T t, n, v) IS i BEGIN
            FOR i FROM 1 TO n DO
                t[i] := v;
            ENDFOR
        END
        PROGRAM IS a[1:3], n, v BEGIN
            n := 3;
            v := 9;
            fill(a, n, v);
            WRITE a[1];
            WRITE a[2];
            WRITE a[3];
        END"#,
        &[],
    );
    assert_eq!(out, vec![9, 9, 9]);
}

#[test]
fn test_array_parameter_with_nonzero_base() {
    // the zero-address convention makes caller and callee indexing agree
    // even for a shifted lower bound
    let out = compile_and_run(
        r#"PROCEDURE get(T t, i, out) IS BEGIN
            out := t[i];
        END
        PROGRAM IS a[-5:-3], i, x BEGIN
            a[-4] := 77;
            i := -4;
            get(a, i, x);
            WRITE x;
        END"#,
        &[],
    );
    assert_eq!(out, vec![77]);
}

#[test]
fn test_array_parameter_forwarding() {
    let out = compile_and_run(
        r#"PROCEDURE store(T t, i, v) IS BEGIN
            t[i] := v;
        END
        PROCEDURE relay(T u, i, v) IS BEGIN
            store(u, i, v);
        END
        PROGRAM IS a[0:9], i, v BEGIN
            i := 4;
            v := 55;
            relay(a, i, v);
            WRITE a[4];
        END"#,
        &[],
    );
    assert_eq!(out, vec![55]);
}

#[test]
fn test_procedure_with_costly_op() {
    let out = compile_and_run(
        r#"PROCEDURE square(x, out) IS BEGIN
            out := x * x;
        END
        PROGRAM IS a, b BEGIN
            READ a;
            square(a, b);
            WRITE b;
        END"#,
        &[-12],
    );
    assert_eq!(out, vec![144]);
}

#[test]
fn test_local_state_does_not_leak_between_procedures() {
    let out = compile_and_run(
        r#"PROCEDURE first(x) IS c BEGIN
            c := 5;
            x := c;
        END
        PROCEDURE second(x) IS c BEGIN
            x := c;
        END
        PROGRAM IS a, b BEGIN
            first(a);
            second(b);
            WRITE a;
            WRITE b;
        END"#,
        &[],
    );
    // the two locals named c are distinct cells; second's starts at zero
    assert_eq!(out, vec![5, 0]);
}
