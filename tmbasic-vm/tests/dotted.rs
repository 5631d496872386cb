//! Structural-update instruction scenarios. There is no map-literal opcode,
//! so map targets are planted on the stack through a registered
//! object-returning system call.

use std::io;
use std::rc::Rc;

use tmbasic_asm::suffix::Suffix;
use tmbasic_vm::prelude::*;

fn interpreter_with(asm: Asm, planted: Option<Rc<Object>>) -> Interpreter {
    let program = Rc::new(Program {
        procedures: vec![Procedure::new(asm.finish().expect("assemble"))],
        global_value_count: 0,
        global_object_count: 0,
        startup_procedure_index: 0,
    });
    let mut vm = Interpreter::new(program, Box::new(io::empty()), Box::new(io::sink()));
    if let Some(object) = planted {
        // hijack a niladic object-returning entry to plant the target
        vm.register_system_call(
            SystemCall::ObjectOptionalNewMissing,
            Box::new(move |_input| Ok(SystemCallOutput::object(object.clone()))),
        );
    }
    vm
}

fn run(mut vm: Interpreter) -> Interpreter {
    vm.init(0).expect("init");
    assert!(!vm.run(100_000).expect("run"));
    assert!(vm.get_error().is_none());
    vm
}

fn v(n: i64) -> Value {
    Value::from(n)
}

fn record_with_value(n: i64) -> Rc<Object> {
    Rc::new(Object::Record(Record::new([v(n)], [])))
}

#[test]
fn replaces_a_value_list_element() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(10);
    asm.push_immediate_int64(20);
    asm.push_immediate_int64(30);
    asm.value_list_new(3);
    asm.duplicate_object();
    asm.push_immediate_int64(99); // source
    asm.push_immediate_int64(1); // key
    asm.dotted_set_value(&[Suffix::ValueKeyValueElement]);
    asm.exit();
    let vm = run(interpreter_with(asm, None));

    assert_eq!(vm.value_stack_index(), 0);
    assert_eq!(vm.object_stack_index(), 2);
    let original = vm.object_at(0).unwrap().as_value_list().unwrap().clone();
    let updated = vm.object_at(1).unwrap().as_value_list().unwrap().clone();
    assert_eq!(original.get(1), Some(&v(20)));
    assert_eq!(updated.get(1), Some(&v(99)));
    assert_eq!(updated.get(0), Some(&v(10)));
    assert_eq!(updated.get(2), Some(&v(30)));
}

#[test]
fn puts_into_a_value_to_value_map() {
    let map = Rc::new(Object::ValueToValueMap(
        ValueToValueMap::new().with(v(1), v(100)),
    ));
    let mut asm = Asm::new();
    asm.system_call(SystemCall::ObjectOptionalNewMissing); // the planted map
    asm.push_immediate_int64(7); // source
    asm.push_immediate_int64(2); // key
    asm.dotted_set_value(&[Suffix::ValueKeyValueElement]);
    asm.exit();
    let vm = run(interpreter_with(asm, Some(map)));

    let updated = vm
        .object_at(0)
        .unwrap()
        .as_value_to_value_map()
        .unwrap()
        .clone();
    assert_eq!(updated.len(), 2);
    assert_eq!(updated.get(&v(1)), Some(&v(100)));
    assert_eq!(updated.get(&v(2)), Some(&v(7)));
}

#[test]
fn descends_through_an_object_list_into_a_record() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.record_new(1, 0);
    asm.object_list_new(1);
    asm.duplicate_object();
    asm.push_immediate_int64(5); // source
    asm.push_immediate_int64(0); // key: element index
    asm.dotted_set_value(&[Suffix::ValueKeyObjectElement, Suffix::RecordValueField(0)]);
    asm.exit();
    let vm = run(interpreter_with(asm, None));

    let field_of = |index: usize| {
        vm.object_at(index)
            .unwrap()
            .as_object_list()
            .unwrap()
            .get(0)
            .unwrap()
            .as_record()
            .unwrap()
            .value(0)
            .cloned()
            .unwrap()
    };
    assert_eq!(field_of(0), v(1));
    assert_eq!(field_of(1), v(5));
}

#[test]
fn assigns_an_object_source_into_a_list_element() {
    let mut asm = Asm::new();
    asm.push_immediate_utf8("new"); // source object, below the target
    asm.push_immediate_utf8("old");
    asm.object_list_new(1);
    asm.push_immediate_int64(0); // key
    asm.dotted_set_object(&[Suffix::ValueKeyObjectElement]);
    asm.exit();
    let vm = run(interpreter_with(asm, None));

    assert_eq!(vm.object_stack_index(), 1);
    assert_eq!(vm.value_stack_index(), 0);
    let list = vm.object_at(0).unwrap().as_object_list().unwrap().clone();
    assert_eq!(list.get(0).unwrap().as_string().unwrap().as_str(), "new");
}

#[test]
fn descends_through_a_value_to_object_map() {
    let map = Rc::new(Object::ValueToObjectMap(
        ValueToObjectMap::new().with(v(3), record_with_value(1)),
    ));
    let mut asm = Asm::new();
    asm.system_call(SystemCall::ObjectOptionalNewMissing);
    asm.push_immediate_int64(5); // source
    asm.push_immediate_int64(3); // key
    asm.dotted_set_value(&[Suffix::ValueKeyObjectElement, Suffix::RecordValueField(0)]);
    asm.exit();
    let vm = run(interpreter_with(asm, Some(map)));

    let updated = vm
        .object_at(0)
        .unwrap()
        .as_value_to_object_map()
        .unwrap()
        .clone();
    let record = updated.get(&v(3)).unwrap().as_record().unwrap().clone();
    assert_eq!(record.value(0), Some(&v(5)));
}

#[test]
fn puts_into_an_object_keyed_value_map() {
    let map = Rc::new(Object::ObjectToValueMap(ObjectToValueMap::new()));
    let mut asm = Asm::new();
    asm.system_call(SystemCall::ObjectOptionalNewMissing);
    asm.push_immediate_utf8("k"); // object key, above the target
    asm.push_immediate_int64(7); // source value
    asm.dotted_set_value(&[Suffix::ObjectKeyValueElement]);
    asm.exit();
    let vm = run(interpreter_with(asm, Some(map)));

    assert_eq!(vm.object_stack_index(), 1);
    let updated = vm
        .object_at(0)
        .unwrap()
        .as_object_to_value_map()
        .unwrap()
        .clone();
    assert_eq!(updated.get(&ObjectKey(Object::string("k"))), Some(&v(7)));
}

#[test]
fn descends_through_an_object_keyed_object_map() {
    let map = Rc::new(Object::ObjectToObjectMap(
        ObjectToObjectMap::new().with(ObjectKey(Object::string("k")), record_with_value(1)),
    ));
    let mut asm = Asm::new();
    asm.system_call(SystemCall::ObjectOptionalNewMissing);
    asm.push_immediate_utf8("k"); // object key
    asm.push_immediate_int64(9); // source value
    asm.dotted_set_value(&[Suffix::ObjectKeyObjectElement, Suffix::RecordValueField(0)]);
    asm.exit();
    let vm = run(interpreter_with(asm, Some(map)));

    let updated = vm
        .object_at(0)
        .unwrap()
        .as_object_to_object_map()
        .unwrap()
        .clone();
    let record = updated
        .get(&ObjectKey(Object::string("k")))
        .unwrap()
        .as_record()
        .unwrap()
        .clone();
    assert_eq!(record.value(0), Some(&v(9)));
}

#[test]
fn trailing_suffixes_after_a_terminal_are_a_fault() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.record_new(1, 0);
    asm.push_immediate_int64(5);
    asm.dotted_set_value(&[Suffix::RecordValueField(0), Suffix::RecordValueField(0)]);
    asm.exit();
    let mut vm = interpreter_with(asm, None);
    vm.init(0).unwrap();
    assert!(matches!(vm.run(100), Err(Fault::TrailingSuffixes)));
}

#[test]
fn kind_confusion_is_a_fault() {
    let mut asm = Asm::new();
    asm.push_immediate_utf8("not a record");
    asm.push_immediate_int64(5);
    asm.dotted_set_value(&[Suffix::RecordValueField(0)]);
    asm.exit();
    let mut vm = interpreter_with(asm, None);
    vm.init(0).unwrap();
    assert!(matches!(vm.run(100), Err(Fault::TypeMismatch { .. })));
}

#[test]
fn assigning_a_value_where_an_object_lives_is_a_fault() {
    let mut asm = Asm::new();
    asm.push_immediate_utf8("inner");
    asm.record_new(0, 1);
    asm.push_immediate_int64(5);
    asm.dotted_set_value(&[Suffix::RecordObjectField(0)]);
    asm.exit();
    let mut vm = interpreter_with(asm, None);
    vm.init(0).unwrap();
    assert!(matches!(vm.run(100), Err(Fault::SourceKindMismatch { .. })));
}

#[test]
fn missing_descent_key_is_a_fault() {
    let map = Rc::new(Object::ValueToObjectMap(ValueToObjectMap::new()));
    let mut asm = Asm::new();
    asm.system_call(SystemCall::ObjectOptionalNewMissing);
    asm.push_immediate_int64(5);
    asm.push_immediate_int64(3);
    asm.dotted_set_value(&[Suffix::ValueKeyObjectElement, Suffix::RecordValueField(0)]);
    asm.exit();
    let mut vm = interpreter_with(asm, Some(map));
    vm.init(0).unwrap();
    assert!(matches!(vm.run(100), Err(Fault::MissingMapKey)));
}

#[test]
fn list_index_out_of_range_is_a_fault() {
    let mut asm = Asm::new();
    asm.push_immediate_int64(1);
    asm.value_list_new(1);
    asm.push_immediate_int64(5);
    asm.push_immediate_int64(2); // only index 0 exists
    asm.dotted_set_value(&[Suffix::ValueKeyValueElement]);
    asm.exit();
    let mut vm = interpreter_with(asm, None);
    vm.init(0).unwrap();
    assert!(matches!(
        vm.run(100),
        Err(Fault::ListIndexOutOfRange { index: 2, len: 1 })
    ));
}
