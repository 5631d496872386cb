use std::io;
use std::rc::Rc;

use quickcheck_macros::quickcheck;
use tmbasic_vm::prelude::*;

fn run_program(asm: Asm) -> Interpreter {
    let program = Rc::new(Program {
        procedures: vec![Procedure::new(asm.finish().expect("assemble"))],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = Interpreter::new(program, Box::new(io::empty()), Box::new(io::sink()));
    vm.init(0).expect("init");
    assert!(!vm.run(1_000_000).expect("run"));
    vm
}

fn value_list(items: &[i64]) -> ValueList {
    items.iter().map(|n| Value::from(*n)).collect()
}

#[quickcheck]
fn value_list_replace_is_functional(items: Vec<i64>, index: usize, replacement: i64) -> bool {
    let original = value_list(&items);
    match original.with(false, index, Value::from(replacement)) {
        Some(updated) => {
            index < items.len()
                && original == value_list(&items)
                && updated.get(index) == Some(&Value::from(replacement))
                && (0..items.len())
                    .filter(|i| *i != index)
                    .all(|i| updated.get(i) == original.get(i))
        }
        None => index >= items.len(),
    }
}

#[quickcheck]
fn value_list_insert_grows_by_one(items: Vec<i64>, index: usize, inserted: i64) -> bool {
    let original = value_list(&items);
    match original.with(true, index, Value::from(inserted)) {
        Some(updated) => {
            index <= items.len()
                && updated.len() == items.len() + 1
                && updated.get(index) == Some(&Value::from(inserted))
                && original == value_list(&items)
        }
        None => index > items.len(),
    }
}

#[quickcheck]
fn value_list_delete_shrinks_by_one(items: Vec<i64>, index: usize) -> bool {
    let original = value_list(&items);
    match original.without(index) {
        Some(updated) => {
            index < items.len()
                && updated.len() == items.len() - 1
                && original == value_list(&items)
        }
        None => index >= items.len(),
    }
}

#[quickcheck]
fn value_list_concat_is_append(left: Vec<i64>, right: Vec<i64>) -> bool {
    let joined = value_list(&left).concat(&value_list(&right));
    let mut expected = left.clone();
    expected.extend_from_slice(&right);
    joined == value_list(&expected)
}

#[quickcheck]
fn map_put_then_get(entries: Vec<(i64, i64)>, key: i64, value: i64) -> bool {
    let base: ValueToValueMap = entries
        .iter()
        .map(|(k, v)| (Value::from(*k), Value::from(*v)))
        .collect();
    let updated = base.with(Value::from(key), Value::from(value));
    // the written key reads back; every other key is untouched
    updated.get(&Value::from(key)) == Some(&Value::from(value))
        && entries
            .iter()
            .filter(|(k, _)| *k != key)
            .all(|(k, _)| updated.get(&Value::from(*k)) == base.get(&Value::from(*k)))
}

#[quickcheck]
fn map_put_is_idempotent_on_length(key: i64, value: i64) -> bool {
    let once = ValueToValueMap::new().with(Value::from(key), Value::from(value));
    let twice = once.with(Value::from(key), Value::from(value));
    once.len() == 1 && twice.len() == 1 && once == twice
}

#[quickcheck]
fn map_remove_only_unbinds_its_key(entries: Vec<(i64, i64)>, key: i64) -> bool {
    let base: ValueToValueMap = entries
        .iter()
        .map(|(k, v)| (Value::from(*k), Value::from(*v)))
        .collect();
    let removed = base.without(&Value::from(key));
    !removed.contains_key(&Value::from(key))
        && entries
            .iter()
            .filter(|(k, _)| *k != key)
            .all(|(k, _)| removed.get(&Value::from(*k)) == base.get(&Value::from(*k)))
}

#[quickcheck]
fn record_set_then_get(fields: Vec<i64>, index: usize, replacement: i64) -> bool {
    let record = Record::new(fields.iter().map(|n| Value::from(*n)), []);
    match record.with_value(index, Value::from(replacement)) {
        Some(updated) => {
            updated.value(index) == Some(&Value::from(replacement))
                && (0..fields.len())
                    .filter(|i| *i != index)
                    .all(|i| updated.value(i) == record.value(i))
        }
        None => index >= fields.len(),
    }
}

#[quickcheck]
fn pushed_integers_read_back(values: Vec<i32>) -> bool {
    if values.len() > 64 {
        return true; // keep the programs small
    }
    let mut asm = Asm::new();
    for value in &values {
        asm.push_immediate_int64(i64::from(*value));
    }
    asm.exit();
    let vm = run_program(asm);
    vm.value_stack_index() == values.len()
        && values
            .iter()
            .enumerate()
            .all(|(i, value)| vm.value_at(i) == Some(&Value::from(i64::from(*value))))
}

#[quickcheck]
fn utf8_immediates_round_trip(text: String) -> bool {
    let mut asm = Asm::new();
    asm.push_immediate_utf8(&text);
    asm.pop_object();
    asm.push_immediate_utf8(&text);
    asm.exit();
    let vm = run_program(asm);
    vm.object_stack_index() == 1
        && vm.value_stack_index() == 0
        && vm.object_at(0).unwrap().as_string().unwrap().as_str() == text
}

#[quickcheck]
fn decimal_triples_round_trip(unscaled: i64, exp: i8) -> bool {
    let triple = DecimalTriple::normal(i128::from(unscaled), i64::from(exp));
    let mut asm = Asm::new();
    asm.push_immediate_dec128(triple);
    asm.exit();
    let vm = run_program(asm);
    vm.value_at(0) == Some(&triple.to_value().unwrap())
}

#[quickcheck]
fn value_list_new_matches_pushed_items(values: Vec<i16>) -> bool {
    if values.len() > 64 {
        return true;
    }
    let mut asm = Asm::new();
    for value in &values {
        asm.push_immediate_int64(i64::from(*value));
    }
    asm.value_list_new(values.len() as u16);
    asm.exit();
    let vm = run_program(asm);
    let list = vm.object_at(0).unwrap().as_value_list().unwrap().clone();
    vm.value_stack_index() == 0
        && vm.object_stack_index() == 1
        && list.len() == values.len()
        && values
            .iter()
            .enumerate()
            .all(|(i, value)| list.get(i) == Some(&Value::from(i64::from(*value))))
}

#[quickcheck]
fn call_and_return_restore_the_stack_indices(depth_values: u8) -> bool {
    // push a few values, call a procedure that returns immediately, and
    // check the indices come back unchanged
    let count = usize::from(depth_values % 8);
    let mut callee = Asm::new();
    callee.ret();
    let mut caller = Asm::new();
    for i in 0..count {
        caller.push_immediate_int64(i as i64);
    }
    caller.call(1, 0, 0);
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
    let mut vm = Interpreter::new(program, Box::new(io::empty()), Box::new(io::sink()));
    vm.init(0).unwrap();
    assert!(!vm.run(1_000).unwrap());
    vm.value_stack_index() == count && vm.object_stack_index() == 0
}
