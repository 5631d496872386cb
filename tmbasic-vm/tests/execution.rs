use std::io;
use std::rc::Rc;

use tmbasic_vm::prelude::*;

fn program_of(asm: Asm) -> Rc<Program> {
    Rc::new(Program {
        procedures: vec![Procedure::new(asm.finish().expect("assemble"))],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    })
}

fn interpreter_for(program: Rc<Program>) -> Interpreter {
    Interpreter::new(program, Box::new(io::empty()), Box::new(io::sink()))
}

fn run_to_end(asm: Asm) -> Interpreter {
    let mut vm = interpreter_for(program_of(asm));
    vm.init(0).expect("init");
    assert_eq!(vm.run(10_000).expect("run"), false);
    vm
}

#[test]
fn smoke() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(42).exit();
    let vm = run_to_end(asm);
    assert!(vm.get_error().is_none());
    assert_eq!(vm.value_stack_index(), 1);
    assert_eq!(vm.value_at(0), Some(&Value::from(42i64)));
}

#[test]
fn branch_if_false_takes_the_false_edge() {
    let mut asm = Asm::new();
    let on_false = asm.label();
    let end = asm.label();
    asm.push_immediate_int64(0);
    asm.branch_if_false(on_false);
    asm.push_immediate_int64(1);
    asm.jump(end);
    asm.bind(on_false);
    asm.push_immediate_int64(2);
    asm.bind(end);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_stack_index(), 1);
    assert_eq!(vm.value_at(0), Some(&Value::from(2i64)));
}

#[test]
fn branch_if_true_pops_exactly_one_value() {
    let mut asm = Asm::new();
    let taken = asm.label();
    asm.push_immediate_int64(7);
    asm.push_immediate_int64(1);
    asm.branch_if_true(taken);
    asm.push_immediate_int64(999);
    asm.bind(taken);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_stack_index(), 1);
    assert_eq!(vm.value_at(0), Some(&Value::from(7i64)));
}

#[test]
fn record_set_builds_a_sibling() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(7);
    asm.record_new(1, 0);
    asm.duplicate_object();
    asm.push_immediate_int64(9);
    asm.record_set_value(0);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.object_stack_index(), 2);
    let original = vm.object_at(0).unwrap().as_record().unwrap().clone();
    let updated = vm.object_at(1).unwrap().as_record().unwrap().clone();
    assert_eq!(original.value(0), Some(&Value::from(7i64)));
    assert_eq!(updated.value(0), Some(&Value::from(9i64)));
}

#[test]
fn record_get_reads_back_the_field() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(7);
    asm.record_new(1, 0);
    asm.record_get_value(0);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.object_stack_index(), 0);
    assert_eq!(vm.value_at(0), Some(&Value::from(7i64)));
}

#[test]
fn record_new_slots_follow_push_order() {
    // last-pushed value lands in the highest slot
    let mut asm = Asm::new();
    asm.push_immediate_int64(10);
    asm.push_immediate_int64(20);
    asm.record_new(2, 0);
    asm.exit();
    let vm = run_to_end(asm);
    let record = vm.object_at(0).unwrap().as_record().unwrap().clone();
    assert_eq!(record.value(0), Some(&Value::from(10i64)));
    assert_eq!(record.value(1), Some(&Value::from(20i64)));
}

#[test]
fn dotted_update_rebuilds_the_path() {
    use tmbasic_asm::suffix::Suffix;

    // outer = Record { inner = Record { a = 1 } }
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.record_new(1, 0);
    asm.record_new(0, 1);
    asm.duplicate_object();
    asm.push_immediate_int64(5);
    asm.dotted_set_value(&[Suffix::RecordObjectField(0), Suffix::RecordValueField(0)]);
    asm.exit();
    let vm = run_to_end(asm);

    assert_eq!(vm.object_stack_index(), 2);
    assert_eq!(vm.value_stack_index(), 0);
    let original = vm.object_at(0).unwrap().as_record().unwrap().clone();
    let updated = vm.object_at(1).unwrap().as_record().unwrap().clone();
    let inner_of = |record: &Record| {
        record
            .object(0)
            .unwrap()
            .as_record()
            .unwrap()
            .value(0)
            .cloned()
            .unwrap()
    };
    assert_eq!(inner_of(&original), Value::from(1i64));
    assert_eq!(inner_of(&updated), Value::from(5i64));
}

#[test]
fn empty_composite_constructors_are_legal() {
    let mut asm = Asm::new();
    asm.value_list_new(0);
    asm.object_list_new(0);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_stack_index(), 0);
    assert_eq!(vm.object_stack_index(), 2);
    assert!(vm.object_at(0).unwrap().as_value_list().unwrap().is_empty());
    assert!(vm.object_at(1).unwrap().as_object_list().unwrap().is_empty());
}

#[test]
fn value_list_new_preserves_source_order() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.push_immediate_int64(2);
    asm.push_immediate_int64(3);
    asm.value_list_new(3);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_stack_index(), 0);
    let list = vm.object_at(0).unwrap().as_value_list().unwrap().clone();
    let items: Vec<i64> = list.iter().map(Value::as_i64).collect();
    assert_eq!(items, vec![1, 2, 3]);
}

#[test]
fn utf8_immediate_round_trips() {
    let text = "héllo 😀";
    let mut asm = Asm::new();
    asm.push_immediate_utf8(text);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.object_stack_index(), 1);
    assert_eq!(
        vm.object_at(0).unwrap().as_string().unwrap().as_str(),
        text
    );
}

#[test]
fn dec128_immediate_pushes_the_decimal() {
    let value: Value = "12.34".parse().unwrap();
    let mut asm = Asm::new();
    asm.push_immediate_dec128(DecimalTriple::try_from(&value).unwrap());
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_at(0), Some(&value));
}

#[test]
fn swap_and_duplicate_and_pop() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.push_immediate_int64(2);
    asm.swap_values(); // [2, 1]
    asm.duplicate_value(); // [2, 1, 1]
    asm.pop_value(); // [2, 1]
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_stack_index(), 2);
    assert_eq!(vm.value_at(0), Some(&Value::from(2i64)));
    assert_eq!(vm.value_at(1), Some(&Value::from(1i64)));
}

#[test]
fn calls_copy_arguments_and_returns_restore_the_stack() {
    // proc 1: f(x) = x, via a local slot
    let mut callee = Asm::new();
    callee.init_locals(1, 0);
    callee.push_argument_value(0);
    callee.set_local_value(0);
    callee.push_local_value(0);
    callee.ret_value();

    let mut caller = Asm::new();
    caller.push_immediate_int64(5);
    caller.call_v(1, 1, 0);
    caller.exit();

    let program = Rc::new(Program {
        procedures: vec![
            Procedure::new(caller.finish().unwrap()),
            Procedure::new(callee.finish().unwrap()),
        ],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert_eq!(vm.run(10_000).unwrap(), false);
    assert!(vm.get_error().is_none());
    assert_eq!(vm.value_stack_index(), 1);
    assert_eq!(vm.value_at(0), Some(&Value::from(5i64)));
}

#[test]
fn set_argument_writes_through_to_the_callers_operand_slot() {
    // callee overwrites its argument, then returns it
    let mut callee = Asm::new();
    callee.push_immediate_int64(9);
    callee.set_argument_value(0);
    callee.push_argument_value(0);
    callee.ret_value();

    let mut caller = Asm::new();
    caller.push_immediate_int64(5);
    caller.call_v(1, 1, 0);
    caller.exit();

    let program = Rc::new(Program {
        procedures: vec![
            Procedure::new(caller.finish().unwrap()),
            Procedure::new(callee.finish().unwrap()),
        ],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert_eq!(vm.run(10_000).unwrap(), false);
    assert_eq!(vm.value_at(0), Some(&Value::from(9i64)));
}

#[test]
fn returning_through_the_entry_frame_finishes_the_run() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.ret();
    let vm = run_to_end(asm);
    // the entry frame owns no operands, so the stack drains
    assert_eq!(vm.value_stack_index(), 0);
}

#[test]
fn cycle_budget_suspends_and_resumes() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(7);
    asm.set_global_value(0);
    asm.push_global_value(0);
    asm.exit();
    let program = Rc::new(Program {
        procedures: vec![Procedure::new(asm.finish().unwrap())],
        global_value_count: 1,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert_eq!(vm.run(2).unwrap(), true); // budget exhausted mid-procedure
    assert_eq!(vm.value_stack_index(), 0); // global holds the 7 now
    assert_eq!(vm.run(10_000).unwrap(), false);
    assert_eq!(vm.value_at(0), Some(&Value::from(7i64)));
}

#[test]
fn global_objects_round_trip() {
    let mut asm = Asm::new();
    asm.push_immediate_utf8("kept");
    asm.set_global_object(0);
    asm.push_global_object(0);
    asm.exit();
    let program = Rc::new(Program {
        procedures: vec![Procedure::new(asm.finish().unwrap())],
        global_value_count: 0,
        global_object_count: 1,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert_eq!(vm.run(10_000).unwrap(), false);
    assert_eq!(
        vm.object_at(0).unwrap().as_string().unwrap().as_str(),
        "kept"
    );
}

#[test]
fn locals_clear_drops_the_reference() {
    let mut asm = Asm::new();
    asm.init_locals(0, 1);
    asm.push_immediate_utf8("x");
    asm.set_local_object(0);
    asm.clear_local_object(0);
    asm.exit();
    let vm = run_to_end(asm);
    // the local slot is inside the frame, above nothing; it is now empty
    assert_eq!(vm.object_stack_index(), 1);
    assert!(vm.object_at(0).is_none());
}

#[test]
fn error_plane_opcodes() {
    let mut asm = Asm::new();
    let handler = asm.label();
    let end = asm.label();
    asm.push_immediate_int64(12);
    asm.push_immediate_utf8("oops");
    asm.set_error();
    asm.branch_if_error(handler);
    asm.push_immediate_int64(111);
    asm.jump(end);
    asm.bind(handler);
    asm.clear_error();
    asm.push_immediate_int64(222);
    asm.bind(end);
    asm.exit();
    let vm = run_to_end(asm);
    assert_eq!(vm.value_at(0), Some(&Value::from(222i64)));
    assert!(vm.get_error().is_none());
}

#[test]
fn bubble_error_revives_the_cleared_register() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(12);
    asm.push_immediate_utf8("oops");
    asm.set_error();
    asm.clear_error();
    asm.bubble_error();
    asm.exit();
    let vm = run_to_end(asm);
    let error = vm.get_error().expect("live error");
    assert_eq!(error.code, Value::from(12i64));
    assert_eq!(error.message, "oops");
}

#[test]
fn return_if_error_unwinds_the_caller_too() {
    // callee raises, caller propagates through the entry frame
    let mut callee = Asm::new();
    callee.push_immediate_int64(55);
    callee.push_immediate_utf8("broken");
    callee.set_error();
    callee.return_if_error();
    callee.push_immediate_int64(1); // unreachable
    callee.ret();

    let mut caller = Asm::new();
    caller.call(1, 0, 0);
    caller.return_if_error();
    caller.push_immediate_int64(42);
    caller.exit();

    let program = Rc::new(Program {
        procedures: vec![
            Procedure::new(caller.finish().unwrap()),
            Procedure::new(callee.finish().unwrap()),
        ],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert_eq!(vm.run(10_000).unwrap(), false);
    let error = vm.get_error().expect("live error");
    assert_eq!(error.code, Value::from(55i64));
    assert_eq!(error.message, "broken");
    assert_eq!(vm.value_stack_index(), 0); // 42 never pushed
}

#[test]
fn unknown_opcode_is_a_fault() {
    let program = Rc::new(Program {
        procedures: vec![Procedure::new(vec![0xee])],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = interpreter_for(program);
    vm.init(0).unwrap();
    assert!(matches!(
        vm.run(10),
        Err(Fault::UnknownOpcode {
            opcode: 0xee,
            offset: 0
        })
    ));
}

#[test]
fn popping_an_empty_stack_is_a_fault() {
    let mut asm = Asm::new();
    asm.pop_value();
    let mut vm = interpreter_for(program_of(asm));
    vm.init(0).unwrap();
    assert!(matches!(vm.run(10), Err(Fault::ValueStackUnderflow)));
}

#[test]
fn run_before_init_is_a_fault() {
    let mut asm = Asm::new();
    asm.exit();
    let mut vm = interpreter_for(program_of(asm));
    assert!(matches!(vm.run(10), Err(Fault::NotInitialized)));
}

#[test]
fn serialized_programs_execute_identically() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(42).exit();
    let original = Program {
        procedures: vec![Procedure::new(asm.finish().unwrap())],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    };
    let reloaded = Program::from_bytes(&original.to_bytes()).expect("container");
    assert_eq!(reloaded, original);

    let mut vm = interpreter_for(Rc::new(reloaded));
    vm.init(0).unwrap();
    assert_eq!(vm.run(100).unwrap(), false);
    assert_eq!(vm.value_at(0), Some(&Value::from(42i64)));
}
