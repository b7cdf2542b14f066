//! Branching: label declaration, unconditional and conditional jumps, and
//! per-function label scoping.

use std::collections::HashSet;

use vm_hack::hack::Instruction;
use vm_hack::test_harness::*;

#[test]
fn countdown_loop_terminates_with_sum() {
    // sum = 5 + 4 + 3 + 2 + 1, accumulated in temp 0 with temp 1 counting
    // down; if-goto loops while the counter is non-zero.
    let machine = run_snippet(
        "push constant 0\npop temp 0\n\
         push constant 5\npop temp 1\n\
         label LOOP\n\
         push temp 0\npush temp 1\nadd\npop temp 0\n\
         push temp 1\npush constant 1\nsub\npop temp 1\n\
         push temp 1\nif-goto LOOP\n\
         push temp 0\n",
    );
    assert_eq!(machine.stack_top(), 15);
}

#[test]
fn if_goto_consumes_the_condition() {
    let machine = run_snippet("push constant 0\nif-goto NEVER\nlabel NEVER\n");
    assert_eq!(machine.sp(), 256);
}

#[test]
fn goto_skips_over_straight_line_code() {
    let machine = run_snippet(
        "goto END\npush constant 1\npush constant 2\npush constant 3\nlabel END\n",
    );
    assert_eq!(machine.sp(), 256);
}

#[test]
fn labels_are_qualified_by_enclosing_function() {
    let program = translate_snippet(
        "function Test.a 0\nlabel L\ngoto L\n\
         function Test.b 0\nlabel L\ngoto L\n",
    );
    assert_eq!(label_declarations(&program, "Test.a$L"), 1);
    assert_eq!(label_declarations(&program, "Test.b$L"), 1);

    let symbols = referenced_symbols(&program);
    assert!(symbols.contains(&"Test.a$L".to_string()));
    assert!(symbols.contains(&"Test.b$L".to_string()));
}

#[test]
fn generated_comparison_labels_dodge_user_symbols() {
    // Function and label names shaped like the generated comparison pair
    // must not alias it: generated labels live under `$$`, which no user
    // identifier or qualified label can produce.
    let program = translate_snippet(
        "function CMP_TRUE_0 0\n\
         push constant 1\npush constant 2\nlt\n\
         label CMP.TRUE.0\n\
         push constant 0\nif-goto CMP.TRUE.0\n\
         return\n",
    );
    let mut seen = HashSet::new();
    for instruction in program.instructions() {
        if let Instruction::Label(name) = instruction {
            assert!(seen.insert(name.clone()), "label `{name}` declared twice");
        }
    }
}

#[test]
fn goto_in_one_function_never_targets_another_functions_label() {
    // `goto L` in Test.a resolves to Test.a$L even though Test.b declares
    // an identically named label.
    let program = translate_snippet(
        "function Test.a 0\nlabel L\ngoto L\n\
         function Test.b 0\nlabel L\nreturn\n",
    );
    let symbols = referenced_symbols(&program);
    assert!(!symbols.contains(&"Test.b$L".to_string()));
}
