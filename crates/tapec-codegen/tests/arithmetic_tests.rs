//! Integration tests for arithmetic codegen.
//!
//! Tests validate:
//! - Assignment and output of single bytes
//! - Non-destructive addition and multiplication
//! - Simultaneous division/modulo
//! - Decimal printing of 0..=99
//!
//! Every test compiles a program, executes it on the reference
//! interpreter, and asserts on the bytes written (and, where the
//! layout matters, the tape left behind).

use tapec_codegen::Transcompiler;
use tapec_eval::{Machine, Run};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Finalize the program and run it (panics on any error).
fn run(compiler: &mut Transcompiler, input: &[u8]) -> Run {
    let text = compiler.code().unwrap_or_else(|e| panic!("codegen failed: {e}"));
    Machine::new()
        .execute(&text, input)
        .unwrap_or_else(|e| panic!("execution failed: {e}"))
}

// ══════════════════════════════════════════════════════════════════════════════
// Assignment and output
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_assigns_and_prints_one_variable() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 97).unwrap();
    c.print_variable("a").unwrap();

    assert_eq!(run(&mut c, &[]).output, b"a");
}

#[test]
fn test_assigns_and_prints_two_variables() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.declare_variable("b").unwrap();
    c.assign_value("a", 97).unwrap();
    c.assign_value("b", 98).unwrap();
    c.print_variable("b").unwrap();
    c.print_variable("a").unwrap();

    assert_eq!(run(&mut c, &[]).output, b"ba");
}

#[test]
fn test_negative_assignment_wraps() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", -1).unwrap();
    c.print_variable("a").unwrap();

    assert_eq!(run(&mut c, &[]).output, vec![255]);
}

#[test]
fn test_increment_and_decrement() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 10).unwrap();
    c.increment("a", 7).unwrap();
    c.decrement("a", 2).unwrap();
    c.print_variable("a").unwrap();

    assert_eq!(run(&mut c, &[]).output, vec![15]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Addition
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_adds_two_variables() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 10).unwrap();
    c.declare_variable("b").unwrap();
    c.assign_value("b", 15).unwrap();

    c.add("b", "a").unwrap();

    c.print_variable("b").unwrap();
    c.print_variable("a").unwrap();

    // The source of the addition is left unchanged.
    assert_eq!(run(&mut c, &[]).output, vec![25, 10]);
}

#[test]
fn test_sums_three_inputs() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.declare_variable("b").unwrap();
    c.declare_variable("c").unwrap();

    c.write_input("a").unwrap();
    c.write_input("b").unwrap();
    c.write_input("c").unwrap();

    c.declare_variable("sum").unwrap();
    c.add("sum", "a").unwrap();
    c.add("sum", "b").unwrap();
    c.add("sum", "c").unwrap();

    c.print_variable("sum").unwrap();

    assert_eq!(run(&mut c, &[10, 20, 30]).output, vec![60]);
}

#[test]
fn test_add_wraps_modulo_256() {
    for (a, b, expected) in [(200u8, 100u8, 44u8), (255, 255, 254), (128, 128, 0)] {
        let mut c = Transcompiler::new();
        c.declare_variable("a").unwrap();
        c.assign_value("a", a as i16).unwrap();
        c.declare_variable("b").unwrap();
        c.assign_value("b", b as i16).unwrap();

        c.add("b", "a").unwrap();

        c.print_variable("b").unwrap();
        c.print_variable("a").unwrap();

        assert_eq!(run(&mut c, &[]).output, vec![expected, a], "{a} + {b}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Multiplication
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_multiplies_two_variables() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 8).unwrap();
    c.declare_variable("b").unwrap();
    c.assign_value("b", 6).unwrap();

    c.multiply("b", "a").unwrap();

    c.print_variable("b").unwrap();
    c.print_variable("a").unwrap();

    assert_eq!(run(&mut c, &[]).output, vec![48, 8]);
}

#[test]
fn test_multiplies_without_residue() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 2).unwrap();
    c.declare_variable("b").unwrap();
    c.assign_value("b", 3).unwrap();

    c.multiply("b", "a").unwrap();

    c.print_variable("a").unwrap();
    c.print_variable("b").unwrap();

    let result = run(&mut c, &[]);
    assert_eq!(result.output, vec![2, 6]);
    // All temporaries drained: only the two variables remain on the tape.
    assert_eq!(result.tape, vec![2, 6]);
}

#[test]
fn test_multiply_by_zero() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.assign_value("a", 0).unwrap();
    c.declare_variable("b").unwrap();
    c.assign_value("b", 7).unwrap();

    c.multiply("b", "a").unwrap();

    c.print_variable("b").unwrap();

    assert_eq!(run(&mut c, &[]).output, vec![0]);
}

#[test]
fn test_multiply_wraps_modulo_256() {
    for (a, b, expected) in [(100u8, 3u8, 44u8), (128, 2, 0), (17, 16, 16)] {
        let mut c = Transcompiler::new();
        c.declare_variable("a").unwrap();
        c.assign_value("a", a as i16).unwrap();
        c.declare_variable("b").unwrap();
        c.assign_value("b", b as i16).unwrap();

        c.multiply("b", "a").unwrap();

        c.print_variable("b").unwrap();
        c.print_variable("a").unwrap();

        assert_eq!(run(&mut c, &[]).output, vec![expected, a], "{a} * {b}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Division / modulo
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_divmod() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.declare_variable("b").unwrap();
    c.declare_variable("mod").unwrap();
    c.declare_variable("div").unwrap();

    c.assign_value("a", 24).unwrap();
    c.assign_value("b", 10).unwrap();

    c.divmod("div", "mod", "a", "b").unwrap();

    c.print_variable("div").unwrap();
    c.print_variable("mod").unwrap();
    c.print_variable("a").unwrap();
    c.print_variable("b").unwrap();

    // Operands are left unchanged.
    assert_eq!(run(&mut c, &[]).output, vec![2, 4, 24, 10]);
}

#[test]
fn test_divmod_by_one_is_identity() {
    let mut c = Transcompiler::new();
    c.declare_variable("a").unwrap();
    c.declare_variable("b").unwrap();
    c.declare_variable("mod").unwrap();
    c.declare_variable("div").unwrap();

    c.assign_value("a", 7).unwrap();
    c.assign_value("b", 1).unwrap();

    c.divmod("div", "mod", "a", "b").unwrap();

    c.print_variable("div").unwrap();
    c.print_variable("mod").unwrap();

    // The divisor copy exhausts on the very first turn here; the
    // program must still terminate cleanly with div = a, mod = 0.
    let result = run(&mut c, &[]);
    assert_eq!(result.output, vec![7, 0]);
    assert_eq!(result.tape, vec![7, 1, 0, 7]);
}

#[test]
fn test_divmod_samples() {
    let samples = [
        (0u8, 1u8),
        (1, 1),
        (7, 1),
        (255, 1),
        (0, 3),
        (1, 3),
        (9, 3),
        (10, 3),
        (99, 10),
        (7, 7),
        (5, 9),
        (255, 255),
    ];
    for (dividend, divisor) in samples {
        let mut c = Transcompiler::new();
        c.declare_variable("a").unwrap();
        c.declare_variable("b").unwrap();
        c.declare_variable("mod").unwrap();
        c.declare_variable("div").unwrap();

        c.assign_value("a", dividend as i16).unwrap();
        c.assign_value("b", divisor as i16).unwrap();
        c.divmod("div", "mod", "a", "b").unwrap();
        c.print_variable("div").unwrap();
        c.print_variable("mod").unwrap();

        assert_eq!(
            run(&mut c, &[]).output,
            vec![dividend / divisor, dividend % divisor],
            "divmod {dividend} / {divisor}"
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Decimal printing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_prints_every_number_below_one_hundred() {
    let mut c = Transcompiler::new();
    c.declare_variable("n").unwrap();
    c.write_input("n").unwrap();
    c.print_number("n").unwrap();

    let text = c.code().unwrap();
    for i in 0..100u8 {
        let result = Machine::new().execute(&text, &[i]).unwrap();
        assert_eq!(result.output, i.to_string().into_bytes(), "printing {i}");
    }
}

#[test]
fn test_print_number_leaves_no_residue() {
    let mut c = Transcompiler::new();
    c.declare_variable("n").unwrap();
    c.write_input("n").unwrap();
    c.print_number("n").unwrap();

    // Only n itself survives on the tape.
    assert_eq!(run(&mut c, &[23]).tape, vec![23]);
}
