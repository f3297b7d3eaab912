// Semantic rejection paths. Each case asserts the offending message so a
// rule cannot silently stop firing.

use crate::CompileError;
use crate::parser;
use crate::semantic;

fn semantic_errors(source: &str) -> Vec<String> {
    let program = parser::parse(source).expect("program should parse");
    match semantic::analyze(&program) {
        Ok(_) => Vec::new(),
        Err(CompileError::Semantic(errors)) => {
            errors.into_iter().map(|e| e.message).collect()
        }
        Err(other) => panic!("unexpected error kind: {other}"),
    }
}

fn assert_error_containing(source: &str, needle: &str) {
    let errors = semantic_errors(source);
    assert!(
        errors.iter().any(|e| e.contains(needle)),
        "expected an error containing {needle:?}, got {errors:?}"
    );
}

#[test]
fn test_undeclared_variable() {
    assert_error_containing(
        "PROGRAM IS a BEGIN b := 1; END",
        "undeclared variable 'b'",
    );
}

#[test]
fn test_redeclaration() {
    assert_error_containing(
        "PROGRAM IS a, a BEGIN a := 1; END",
        "redeclaration of 'a'",
    );
}

#[test]
fn test_array_used_without_index() {
    assert_error_containing(
        "PROGRAM IS a[1:5] BEGIN a := 1; END",
        "array 'a' used without an index",
    );
}

#[test]
fn test_scalar_used_with_index() {
    assert_error_containing(
        "PROGRAM IS a BEGIN a[1] := 1; END",
        "'a' is not an array",
    );
}

#[test]
fn test_invalid_array_bounds() {
    assert_error_containing(
        "PROGRAM IS a[5:1] BEGIN WRITE 0; END",
        "invalid array bounds [5:1]",
    );
}

#[test]
fn test_constant_index_out_of_bounds() {
    assert_error_containing(
        "PROGRAM IS a[1:5] BEGIN a[6] := 1; END",
        "index 6 outside the bounds [1:5]",
    );
}

#[test]
fn test_array_as_index() {
    assert_error_containing(
        "PROGRAM IS a[1:5], b[1:5] BEGIN a[b] := 1; END",
        "array 'b' cannot be an index",
    );
}

#[test]
fn test_unknown_procedure() {
    assert_error_containing(
        "PROGRAM IS a BEGIN missing(a); END",
        "unknown procedure 'missing'",
    );
}

#[test]
fn test_arity_mismatch() {
    assert_error_containing(
        r#"PROCEDURE p(x, y) IS BEGIN x := y; END
        PROGRAM IS a BEGIN p(a); END"#,
        "expects 2 argument(s), got 1",
    );
}

#[test]
fn test_scalar_argument_for_array_parameter() {
    assert_error_containing(
        r#"PROCEDURE p(T t) IS BEGIN t[0] := 1; END
        PROGRAM IS a BEGIN p(a); END"#,
        "must be an array",
    );
}

#[test]
fn test_array_argument_for_scalar_parameter() {
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN x := 1; END
        PROGRAM IS a[1:5] BEGIN p(a); END"#,
        "must be a scalar",
    );
}

#[test]
fn test_direct_recursion_rejected() {
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN p(x); END
        PROGRAM IS a BEGIN p(a); END"#,
        "called before its definition",
    );
}

#[test]
fn test_forward_call_rejected() {
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN q(x); END
        PROCEDURE q(x) IS BEGIN x := 1; END
        PROGRAM IS a BEGIN p(a); END"#,
        "unknown procedure 'q'",
    );
}

#[test]
fn test_duplicate_procedure() {
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN x := 1; END
        PROCEDURE p(x) IS BEGIN x := 2; END
        PROGRAM IS a BEGIN p(a); END"#,
        "procedure 'p' already defined",
    );
}

#[test]
fn test_duplicate_parameter() {
    assert_error_containing(
        r#"PROCEDURE p(x, x) IS BEGIN x := 1; END
        PROGRAM IS a BEGIN p(a); END"#,
        "duplicate parameter 'x'",
    );
}

#[test]
fn test_iterator_assignment_rejected() {
    assert_error_containing(
        r#"PROGRAM IS s BEGIN
            FOR i FROM 1 TO 5 DO
                i := 0;
            ENDFOR
        END"#,
        "cannot modify loop iterator 'i'",
    );
}

#[test]
fn test_iterator_read_rejected() {
    assert_error_containing(
        r#"PROGRAM IS s BEGIN
            FOR i FROM 1 TO 5 DO
                READ i;
            ENDFOR
        END"#,
        "cannot modify loop iterator 'i'",
    );
}

#[test]
fn test_iterator_shadowing_declared_variable() {
    assert_error_containing(
        r#"PROGRAM IS i BEGIN
            FOR i FROM 1 TO 5 DO
                WRITE i;
            ENDFOR
        END"#,
        "shadows a declared variable",
    );
}

#[test]
fn test_nested_loops_cannot_share_iterator() {
    assert_error_containing(
        r#"PROGRAM IS s BEGIN
            FOR i FROM 1 TO 5 DO
                FOR i FROM 1 TO 5 DO
                    s := 0;
                ENDFOR
            ENDFOR
        END"#,
        "already used by an enclosing loop",
    );
}

#[test]
fn test_iterator_cannot_be_passed_by_reference() {
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN x := 0; END
        PROGRAM IS s BEGIN
            FOR i FROM 1 TO 5 DO
                p(i);
            ENDFOR
        END"#,
        "cannot be passed by reference",
    );
}

#[test]
fn test_procedure_scope_isolation() {
    // a procedure body cannot see main's declarations
    assert_error_containing(
        r#"PROCEDURE p(x) IS BEGIN x := g; END
        PROGRAM IS g BEGIN g := 1; p(g); END"#,
        "undeclared variable 'g'",
    );
}

#[test]
fn test_all_errors_collected() {
    let errors = semantic_errors(
        r#"PROGRAM IS a BEGIN
            b := 1;
            c := 2;
        END"#,
    );
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_valid_program_passes() {
    let program = parser::parse(
        r#"PROCEDURE p(T t, n) IS i BEGIN
            FOR i FROM 1 TO n DO
                t[i] := i;
            ENDFOR
        END
        PROGRAM IS a[1:5], n BEGIN
            n := 5;
            p(a, n);
            WRITE a[3];
        END"#,
    )
    .expect("program should parse");
    let table = semantic::analyze(&program).expect("program should analyze");
    assert!(table.has_procedure("p"));
    assert!(table.lookup(None, "a").is_some_and(|s| s.is_array));
    assert!(table.lookup(None, "n").is_some());
}
