//! Runtime behavior of the arithmetic, logical, and comparison templates,
//! verified by executing the generated code on the simulated machine.

use vm_hack::test_harness::*;

#[test]
fn add_leaves_sum_on_stack() {
    let machine = run_snippet("push constant 2\npush constant 3\nadd\n");
    assert_eq!(machine.stack_top(), 5);
    // Binary ops shrink the stack by one net value.
    assert_eq!(machine.sp(), 257);
}

#[test]
fn sub_subtracts_top_from_second() {
    let machine = run_snippet("push constant 10\npush constant 4\nsub\n");
    assert_eq!(machine.stack_top(), 6);
}

#[test]
fn bitwise_and_or() {
    let machine = run_snippet("push constant 12\npush constant 10\nand\n");
    assert_eq!(machine.stack_top(), 8);
    let machine = run_snippet("push constant 12\npush constant 10\nor\n");
    assert_eq!(machine.stack_top(), 14);
}

#[test]
fn unary_ops_rewrite_in_place() {
    let machine = run_snippet("push constant 7\nneg\n");
    assert_eq!(machine.stack_top(), -7);
    assert_eq!(machine.sp(), 257);

    let machine = run_snippet("push constant 0\nnot\n");
    assert_eq!(machine.stack_top(), TRUE);
}

#[test]
fn lt_pushes_canonical_booleans() {
    let machine = run_snippet("push constant 3\npush constant 5\nlt\n");
    assert_eq!(machine.stack_top(), TRUE);

    let machine = run_snippet("push constant 5\npush constant 3\nlt\n");
    assert_eq!(machine.stack_top(), FALSE);
}

#[test]
fn eq_and_gt() {
    let machine = run_snippet("push constant 9\npush constant 9\neq\n");
    assert_eq!(machine.stack_top(), TRUE);

    let machine = run_snippet("push constant 9\npush constant 8\neq\n");
    assert_eq!(machine.stack_top(), FALSE);

    let machine = run_snippet("push constant 9\npush constant 8\ngt\n");
    assert_eq!(machine.stack_top(), TRUE);
}

#[test]
fn consecutive_comparisons_do_not_interfere() {
    let machine = run_snippet(
        "push constant 1\npush constant 2\nlt\n\
         push constant 2\npush constant 1\nlt\n\
         push constant 3\npush constant 3\neq\n",
    );
    // Three independent booleans on the stack: true, false, true.
    assert_eq!(machine.sp(), 259);
    assert_eq!(machine.ram(256), TRUE);
    assert_eq!(machine.ram(257), FALSE);
    assert_eq!(machine.ram(258), TRUE);
}

#[test]
fn pop_then_push_round_trips_through_local() {
    let program = translate_snippet("push constant 42\npop local 0\npush local 0\n");
    let mut machine = Machine::new();
    machine.set_ram(0, 256);
    machine.set_ram(1, 300); // LCL
    machine.run(&program, 10_000);
    assert_eq!(machine.stack_top(), 42);
    assert_eq!(machine.ram(300), 42);
}

#[test]
fn pop_push_round_trips_through_temp_and_pointer() {
    let machine = run_snippet("push constant 8\npop temp 3\npush temp 3\n");
    assert_eq!(machine.stack_top(), 8);
    assert_eq!(machine.ram(8), 8); // temp base 5 + 3

    let machine = run_snippet("push constant 2048\npop pointer 1\npush pointer 1\n");
    assert_eq!(machine.stack_top(), 2048);
    assert_eq!(machine.ram(4), 2048); // THAT
}

#[test]
fn pointer_relative_pop_uses_the_index() {
    let program = translate_snippet("push constant 5\npush constant 6\npop that 2\npop this 1\n");
    let mut machine = Machine::new();
    machine.set_ram(0, 256);
    machine.set_ram(3, 3000); // THIS
    machine.set_ram(4, 3700); // THAT
    machine.run(&program, 10_000);
    assert_eq!(machine.ram(3702), 6);
    assert_eq!(machine.ram(3001), 5);
    assert_eq!(machine.sp(), 256);
}
