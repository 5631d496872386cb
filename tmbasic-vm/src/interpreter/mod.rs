//! The fetch/decode/dispatch loop.
//!
//! Execution state is a pair of fixed-capacity stacks (scalars and object
//! references), a call stack, global slots, and the error register. `run`
//! mirrors the hot state into locals, executes up to a cycle budget, and
//! flushes the mirror back so the host can interleave its own work and
//! re-enter.

use std::io::{BufRead, Write};
use std::rc::Rc;

use tmbasic_asm::{bytes, Opcode, Procedure, Program, SystemCall};
use tmbasic_types::{DecimalTriple, TripleClass, Value};

use crate::call::CallFrame;
use crate::consts::{OBJECT_STACK_SIZE, VALUE_STACK_SIZE};
use crate::error::{ErrorState, Fault, RuntimeError};
use crate::object::{Object, ObjectList, Record, ValueList};
use crate::syscall::{SystemCallHandler, SystemCallInput, SystemCallTable};

mod dotted;

fn push_value(stack: &mut [Value], vsi: &mut usize, value: Value) -> Result<(), Fault> {
    let slot = stack.get_mut(*vsi).ok_or(Fault::ValueStackOverflow)?;
    *slot = value;
    *vsi += 1;
    Ok(())
}

fn pop_value(stack: &mut [Value], vsi: &mut usize) -> Result<Value, Fault> {
    *vsi = vsi.checked_sub(1).ok_or(Fault::ValueStackUnderflow)?;
    Ok(std::mem::take(&mut stack[*vsi]))
}

fn push_object(
    stack: &mut [Option<Rc<Object>>],
    osi: &mut usize,
    object: Rc<Object>,
) -> Result<(), Fault> {
    let slot = stack.get_mut(*osi).ok_or(Fault::ObjectStackOverflow)?;
    *slot = Some(object);
    *osi += 1;
    Ok(())
}

fn pop_object(stack: &mut [Option<Rc<Object>>], osi: &mut usize) -> Result<Rc<Object>, Fault> {
    *osi = osi.checked_sub(1).ok_or(Fault::ObjectStackUnderflow)?;
    stack[*osi]
        .take()
        .ok_or(Fault::EmptyObjectSlot { index: *osi })
}

fn value_from_top(stack: &[Value], vsi: usize, depth: usize) -> Result<&Value, Fault> {
    let index = vsi
        .checked_sub(depth + 1)
        .ok_or(Fault::ValueStackUnderflow)?;
    stack.get(index).ok_or(Fault::ValueStackUnderflow)
}

fn object_from_top(
    stack: &[Option<Rc<Object>>],
    osi: usize,
    depth: usize,
) -> Result<&Rc<Object>, Fault> {
    let index = osi
        .checked_sub(depth + 1)
        .ok_or(Fault::ObjectStackUnderflow)?;
    stack
        .get(index)
        .ok_or(Fault::ObjectStackUnderflow)?
        .as_ref()
        .ok_or(Fault::EmptyObjectSlot { index })
}

/// The TMBASIC virtual machine.
///
/// Construct over a shared [`Program`], point it at an entry procedure with
/// [`init`](Self::init), then pump [`run`](Self::run) until it reports
/// completion. After a run ends, [`get_error`](Self::get_error) exposes any
/// live BASIC-level error.
pub struct Interpreter {
    program: Rc<Program>,
    console_in: Box<dyn BufRead>,
    console_out: Box<dyn Write>,
    syscalls: SystemCallTable,
    call_stack: Vec<CallFrame>,
    value_stack: Box<[Value]>,
    object_stack: Box<[Option<Rc<Object>>]>,
    global_values: Vec<Value>,
    global_objects: Vec<Option<Rc<Object>>>,
    error: ErrorState,
    // snapshot of the hot state, updated when run() returns
    procedure: Option<usize>,
    pc: usize,
    vsi: usize,
    osi: usize,
}

impl Interpreter {
    /// A machine over `program`, wired to the given console streams.
    pub fn new(
        program: Rc<Program>,
        console_in: Box<dyn BufRead>,
        console_out: Box<dyn Write>,
    ) -> Self {
        Self {
            program,
            console_in,
            console_out,
            syscalls: SystemCallTable::new(),
            call_stack: Vec::new(),
            value_stack: vec![Value::default(); VALUE_STACK_SIZE].into_boxed_slice(),
            object_stack: vec![None; OBJECT_STACK_SIZE].into_boxed_slice(),
            global_values: Vec::new(),
            global_objects: Vec::new(),
            error: ErrorState::default(),
            procedure: None,
            pc: 0,
            vsi: 0,
            osi: 0,
        }
    }

    /// Reset the stacks, frames and global slots, and point execution at
    /// the given procedure.
    pub fn init(&mut self, procedure_index: usize) -> Result<(), Fault> {
        if self.program.procedure(procedure_index).is_none() {
            return Err(Fault::IndexOutOfRange {
                what: "procedure",
                index: procedure_index,
                limit: self.program.procedures.len(),
            });
        }
        self.call_stack.clear();
        self.call_stack.push(CallFrame::entry());
        for slot in self.value_stack.iter_mut() {
            *slot = Value::default();
        }
        for slot in self.object_stack.iter_mut() {
            *slot = None;
        }
        self.global_values =
            vec![Value::default(); self.program.global_value_count as usize];
        self.global_objects = vec![None; self.program.global_object_count as usize];
        self.procedure = Some(procedure_index);
        self.pc = 0;
        self.vsi = 0;
        self.osi = 0;
        Ok(())
    }

    /// The live error register contents, if any.
    pub fn get_error(&self) -> Option<RuntimeError> {
        self.error.get()
    }

    /// Replace a system-call handler; test doubles hook in here.
    pub fn register_system_call(&mut self, call: SystemCall, handler: SystemCallHandler) {
        self.syscalls.register(call, handler);
    }

    /// First unused value-stack slot.
    pub fn value_stack_index(&self) -> usize {
        self.vsi
    }

    /// First unused object-stack slot.
    pub fn object_stack_index(&self) -> usize {
        self.osi
    }

    /// A value-stack slot, for inspection.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.value_stack.get(index)
    }

    /// An object-stack slot, for inspection; `None` for empty slots too.
    pub fn object_at(&self, index: usize) -> Option<&Rc<Object>> {
        self.object_stack.get(index)?.as_ref()
    }

    fn store_state(&mut self, procedure: usize, pc: usize, vsi: usize, osi: usize) {
        self.procedure = Some(procedure);
        self.pc = pc;
        self.vsi = vsi;
        self.osi = osi;
    }

    fn unwind_frame(&mut self, vsi: &mut usize, osi: &mut usize) -> Result<CallFrame, Fault> {
        let frame = self.call_stack.pop().ok_or(Fault::CallStackUnderflow)?;
        while *vsi > frame.value_args_start() {
            *vsi -= 1;
            self.value_stack[*vsi] = Value::default();
        }
        while *osi > frame.object_args_start() {
            *osi -= 1;
            self.object_stack[*osi] = None;
        }
        Ok(frame)
    }

    fn current_frame(&self) -> Result<CallFrame, Fault> {
        self.call_stack
            .last()
            .copied()
            .ok_or(Fault::CallStackUnderflow)
    }

    /// Execute up to `max_cycles` opcodes. Returns `Ok(true)` when the
    /// budget ran out and the machine is resumable, `Ok(false)` when the
    /// program finished (by `Exit` or by returning through the entry
    /// frame). Faults abort the run.
    pub fn run(&mut self, max_cycles: usize) -> Result<bool, Fault> {
        let program = Rc::clone(&self.program);
        let mut proc_index = self.procedure.ok_or(Fault::NotInitialized)?;
        let mut procedure: &Procedure =
            program
                .procedure(proc_index)
                .ok_or(Fault::IndexOutOfRange {
                    what: "procedure",
                    index: proc_index,
                    limit: program.procedures.len(),
                })?;
        let mut pc = self.pc;
        let mut vsi = self.vsi;
        let mut osi = self.osi;

        macro_rules! fetch_procedure {
            ($index:expr) => {
                program.procedure($index).ok_or(Fault::IndexOutOfRange {
                    what: "procedure",
                    index: $index,
                    limit: program.procedures.len(),
                })?
            };
        }

        for _ in 0..max_cycles {
            let ins: &[u8] = &procedure.instructions;
            let opcode_offset = pc;
            let opcode_byte = bytes::read_u8(ins, &mut pc)?;
            let opcode = Opcode::try_from(opcode_byte).map_err(|opcode| Fault::UnknownOpcode {
                opcode,
                offset: opcode_offset,
            })?;
            tracing::trace!(procedure = proc_index, pc = opcode_offset, %opcode, "execute");

            // Tear down the current frame; yields true when the entry frame
            // was crossed and the run is over.
            macro_rules! do_return {
                () => {{
                    let frame = self.unwind_frame(&mut vsi, &mut osi)?;
                    match frame.procedure() {
                        Some(caller) => {
                            proc_index = caller;
                            procedure = fetch_procedure!(caller);
                            pc = frame.return_pc();
                            false
                        }
                        None => true,
                    }
                }};
            }

            match opcode {
                Opcode::Exit => {
                    self.store_state(proc_index, pc, vsi, osi);
                    return Ok(false);
                }

                Opcode::PushImmediateInt64 => {
                    let imm = bytes::read_i64(ins, &mut pc)?;
                    push_value(&mut self.value_stack, &mut vsi, Value::from(imm))?;
                }

                Opcode::PushImmediateDec128 => {
                    let class = TripleClass::try_from(bytes::read_u8(ins, &mut pc)?)?;
                    let sign = bytes::read_u8(ins, &mut pc)?;
                    let hi = bytes::read_u64(ins, &mut pc)?;
                    let lo = bytes::read_u64(ins, &mut pc)?;
                    let exp = bytes::read_i64(ins, &mut pc)?;
                    let triple = DecimalTriple {
                        class,
                        sign,
                        hi,
                        lo,
                        exp,
                    };
                    push_value(&mut self.value_stack, &mut vsi, triple.to_value()?)?;
                }

                Opcode::PushImmediateUtf8 => {
                    let len = bytes::read_u32(ins, &mut pc)? as usize;
                    let raw = bytes::read_bytes(ins, &mut pc, len)?;
                    let text = std::str::from_utf8(raw).map_err(|_| Fault::InvalidUtf8)?;
                    push_object(&mut self.object_stack, &mut osi, Object::string(text))?;
                }

                Opcode::PopValue => {
                    pop_value(&mut self.value_stack, &mut vsi)?;
                }

                Opcode::PopObject => {
                    pop_object(&mut self.object_stack, &mut osi)?;
                }

                Opcode::DuplicateValue => {
                    let value = value_from_top(&self.value_stack, vsi, 0)?.clone();
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::DuplicateObject => {
                    let object = object_from_top(&self.object_stack, osi, 0)?.clone();
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::SwapValues => {
                    let top = vsi.checked_sub(1).ok_or(Fault::ValueStackUnderflow)?;
                    let under = vsi.checked_sub(2).ok_or(Fault::ValueStackUnderflow)?;
                    self.value_stack.swap(top, under);
                }

                Opcode::SwapObjects => {
                    let top = osi.checked_sub(1).ok_or(Fault::ObjectStackUnderflow)?;
                    let under = osi.checked_sub(2).ok_or(Fault::ObjectStackUnderflow)?;
                    self.object_stack.swap(top, under);
                }

                Opcode::InitLocals => {
                    let num_values = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let num_objects = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    debug_assert_eq!(frame.value_locals_start(), vsi);
                    debug_assert_eq!(frame.object_locals_start(), osi);
                    if vsi + num_values > self.value_stack.len() {
                        return Err(Fault::ValueStackOverflow);
                    }
                    if osi + num_objects > self.object_stack.len() {
                        return Err(Fault::ObjectStackOverflow);
                    }
                    for slot in &mut self.value_stack[vsi..vsi + num_values] {
                        *slot = Value::default();
                    }
                    for slot in &mut self.object_stack[osi..osi + num_objects] {
                        *slot = None;
                    }
                    vsi += num_values;
                    osi += num_objects;
                }

                Opcode::PushArgumentValue => {
                    let index = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    let slot = frame.value_args_start() + index;
                    let value = self
                        .value_stack
                        .get(slot)
                        .cloned()
                        .ok_or(Fault::IndexOutOfRange {
                            what: "value argument slot",
                            index: slot,
                            limit: self.value_stack.len(),
                        })?;
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::PushArgumentObject => {
                    let index = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    let slot = frame.object_args_start() + index;
                    let object = object_from_top(&self.object_stack, slot + 1, 0)?.clone();
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::SetArgumentValue => {
                    let index = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let value = pop_value(&mut self.value_stack, &mut vsi)?;
                    let frame = self.current_frame()?;
                    let slot = frame.value_args_start() + index;
                    *self
                        .value_stack
                        .get_mut(slot)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "value argument slot",
                            index: slot,
                            limit: VALUE_STACK_SIZE,
                        })? = value;
                }

                Opcode::SetArgumentObject => {
                    let index = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let object = pop_object(&mut self.object_stack, &mut osi)?;
                    let frame = self.current_frame()?;
                    let slot = frame.object_args_start() + index;
                    *self
                        .object_stack
                        .get_mut(slot)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "object argument slot",
                            index: slot,
                            limit: OBJECT_STACK_SIZE,
                        })? = Some(object);
                }

                Opcode::PushGlobalValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let value = self
                        .global_values
                        .get(index)
                        .cloned()
                        .ok_or(Fault::IndexOutOfRange {
                            what: "global value",
                            index,
                            limit: self.global_values.len(),
                        })?;
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::PushGlobalObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let object = self
                        .global_objects
                        .get(index)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "global object",
                            index,
                            limit: self.global_objects.len(),
                        })?
                        .clone()
                        .ok_or(Fault::EmptyObjectSlot { index })?;
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::SetGlobalValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let value = pop_value(&mut self.value_stack, &mut vsi)?;
                    *self
                        .global_values
                        .get_mut(index)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "global value",
                            index,
                            limit: self.program.global_value_count as usize,
                        })? = value;
                }

                Opcode::SetGlobalObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let object = pop_object(&mut self.object_stack, &mut osi)?;
                    *self
                        .global_objects
                        .get_mut(index)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "global object",
                            index,
                            limit: self.program.global_object_count as usize,
                        })? = Some(object);
                }

                Opcode::PushLocalValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    let slot = frame.value_locals_start() + index;
                    let value = self
                        .value_stack
                        .get(slot)
                        .cloned()
                        .ok_or(Fault::IndexOutOfRange {
                            what: "value local slot",
                            index: slot,
                            limit: VALUE_STACK_SIZE,
                        })?;
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::PushLocalObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    let slot = frame.object_locals_start() + index;
                    let object = object_from_top(&self.object_stack, slot + 1, 0)?.clone();
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::SetLocalValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let value = pop_value(&mut self.value_stack, &mut vsi)?;
                    let frame = self.current_frame()?;
                    let slot = frame.value_locals_start() + index;
                    *self
                        .value_stack
                        .get_mut(slot)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "value local slot",
                            index: slot,
                            limit: VALUE_STACK_SIZE,
                        })? = value;
                }

                Opcode::SetLocalObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let object = pop_object(&mut self.object_stack, &mut osi)?;
                    let frame = self.current_frame()?;
                    let slot = frame.object_locals_start() + index;
                    *self
                        .object_stack
                        .get_mut(slot)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "object local slot",
                            index: slot,
                            limit: OBJECT_STACK_SIZE,
                        })? = Some(object);
                }

                Opcode::ClearLocalObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let frame = self.current_frame()?;
                    let slot = frame.object_locals_start() + index;
                    *self
                        .object_stack
                        .get_mut(slot)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "object local slot",
                            index: slot,
                            limit: OBJECT_STACK_SIZE,
                        })? = None;
                }

                Opcode::Jump => {
                    let target = bytes::read_u32(ins, &mut pc)?;
                    pc = target as usize;
                }

                Opcode::BranchIfTrue => {
                    let target = bytes::read_u32(ins, &mut pc)?;
                    let condition = pop_value(&mut self.value_stack, &mut vsi)?;
                    if condition.as_bool() {
                        pc = target as usize;
                    }
                }

                Opcode::BranchIfFalse => {
                    let target = bytes::read_u32(ins, &mut pc)?;
                    let condition = pop_value(&mut self.value_stack, &mut vsi)?;
                    if !condition.as_bool() {
                        pc = target as usize;
                    }
                }

                Opcode::Call | Opcode::CallV | Opcode::CallO => {
                    let callee = bytes::read_u32(ins, &mut pc)? as usize;
                    let num_value_args = bytes::read_u8(ins, &mut pc)?;
                    let num_object_args = bytes::read_u8(ins, &mut pc)?;
                    let frame = CallFrame::push(
                        proc_index,
                        pc,
                        num_value_args,
                        num_object_args,
                        vsi,
                        osi,
                        opcode == Opcode::CallV,
                        opcode == Opcode::CallO,
                    )?;
                    procedure = fetch_procedure!(callee);
                    self.call_stack.push(frame);
                    proc_index = callee;
                    pc = 0;
                }

                Opcode::SystemCall
                | Opcode::SystemCallV
                | Opcode::SystemCallO
                | Opcode::SystemCallVO => {
                    let id = bytes::read_u16(ins, &mut pc)?;
                    let num_value_args = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let num_object_args = usize::from(bytes::read_u8(ins, &mut pc)?);
                    let returns_value =
                        matches!(opcode, Opcode::SystemCallV | Opcode::SystemCallVO);
                    let returns_object =
                        matches!(opcode, Opcode::SystemCallO | Opcode::SystemCallVO);
                    let call =
                        SystemCall::try_from(id).map_err(|id| Fault::UnknownSystemCall { id })?;
                    tracing::trace!(%call, "system call");
                    let result = {
                        let mut input = SystemCallInput {
                            value_stack: &self.value_stack,
                            object_stack: &self.object_stack,
                            vsi,
                            osi,
                            num_value_args,
                            num_object_args,
                            console_in: &mut *self.console_in,
                            console_out: &mut *self.console_out,
                        };
                        (self.syscalls.handler(call))(&mut input)
                    };
                    for _ in 0..num_value_args {
                        pop_value(&mut self.value_stack, &mut vsi)?;
                    }
                    for _ in 0..num_object_args {
                        pop_object(&mut self.object_stack, &mut osi)?;
                    }
                    match result {
                        Ok(output) => {
                            if returns_value {
                                let value = output
                                    .value
                                    .ok_or(Fault::MissingSystemCallReturn { call })?;
                                push_value(&mut self.value_stack, &mut vsi, value)?;
                            }
                            if returns_object {
                                let object = output
                                    .object
                                    .ok_or(Fault::MissingSystemCallReturn { call })?;
                                push_object(&mut self.object_stack, &mut osi, object)?;
                            }
                        }
                        Err(error) => self.error.set(error),
                    }
                }

                Opcode::Return => {
                    if do_return!() {
                        self.store_state(proc_index, pc, vsi, osi);
                        return Ok(false);
                    }
                }

                Opcode::ReturnValue => {
                    let value = value_from_top(&self.value_stack, vsi, 0)?.clone();
                    if do_return!() {
                        self.store_state(proc_index, pc, vsi, osi);
                        return Ok(false);
                    }
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::ReturnObject => {
                    let object = object_from_top(&self.object_stack, osi, 0)?.clone();
                    if do_return!() {
                        self.store_state(proc_index, pc, vsi, osi);
                        return Ok(false);
                    }
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::SetError => {
                    let message = pop_object(&mut self.object_stack, &mut osi)?;
                    let message = message.as_string()?.as_str().to_owned();
                    let code = pop_value(&mut self.value_stack, &mut vsi)?;
                    self.error.set(RuntimeError::new(code, message));
                }

                Opcode::ClearError => {
                    self.error.clear();
                }

                Opcode::BubbleError => {
                    self.error.raise();
                }

                Opcode::ReturnIfError => {
                    if self.error.is_live() && do_return!() {
                        self.store_state(proc_index, pc, vsi, osi);
                        return Ok(false);
                    }
                }

                Opcode::BranchIfError => {
                    let target = bytes::read_u32(ins, &mut pc)?;
                    if self.error.is_live() {
                        pc = target as usize;
                    }
                }

                Opcode::RecordNew => {
                    let num_values = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let num_objects = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let mut values = Vec::with_capacity(num_values);
                    for _ in 0..num_values {
                        values.push(pop_value(&mut self.value_stack, &mut vsi)?);
                    }
                    values.reverse();
                    let mut objects = Vec::with_capacity(num_objects);
                    for _ in 0..num_objects {
                        objects.push(pop_object(&mut self.object_stack, &mut osi)?);
                    }
                    objects.reverse();
                    push_object(
                        &mut self.object_stack,
                        &mut osi,
                        Rc::new(Object::Record(Record::new(values, objects))),
                    )?;
                }

                Opcode::RecordGetValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let value = {
                        let record = object_from_top(&self.object_stack, osi, 0)?.as_record()?;
                        record
                            .value(index)
                            .cloned()
                            .ok_or(Fault::IndexOutOfRange {
                                what: "record value field",
                                index,
                                limit: record.num_values(),
                            })?
                    };
                    pop_object(&mut self.object_stack, &mut osi)?;
                    push_value(&mut self.value_stack, &mut vsi, value)?;
                }

                Opcode::RecordGetObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let object = {
                        let record = object_from_top(&self.object_stack, osi, 0)?.as_record()?;
                        record
                            .object(index)
                            .cloned()
                            .ok_or(Fault::IndexOutOfRange {
                                what: "record object field",
                                index,
                                limit: record.num_objects(),
                            })?
                    };
                    pop_object(&mut self.object_stack, &mut osi)?;
                    push_object(&mut self.object_stack, &mut osi, object)?;
                }

                Opcode::RecordSetValue => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let record = {
                        let record = object_from_top(&self.object_stack, osi, 0)?.as_record()?;
                        let value = value_from_top(&self.value_stack, vsi, 0)?.clone();
                        record
                            .with_value(index, value)
                            .ok_or(Fault::IndexOutOfRange {
                                what: "record value field",
                                index,
                                limit: record.num_values(),
                            })?
                    };
                    pop_object(&mut self.object_stack, &mut osi)?;
                    pop_value(&mut self.value_stack, &mut vsi)?;
                    push_object(
                        &mut self.object_stack,
                        &mut osi,
                        Rc::new(Object::Record(record)),
                    )?;
                }

                Opcode::RecordSetObject => {
                    let index = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let record = {
                        let record = object_from_top(&self.object_stack, osi, 1)?.as_record()?;
                        let object = object_from_top(&self.object_stack, osi, 0)?.clone();
                        record
                            .with_object(index, object)
                            .ok_or(Fault::IndexOutOfRange {
                                what: "record object field",
                                index,
                                limit: record.num_objects(),
                            })?
                    };
                    pop_object(&mut self.object_stack, &mut osi)?;
                    pop_object(&mut self.object_stack, &mut osi)?;
                    push_object(
                        &mut self.object_stack,
                        &mut osi,
                        Rc::new(Object::Record(record)),
                    )?;
                }

                Opcode::ValueListNew => {
                    let count = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let start = vsi.checked_sub(count).ok_or(Fault::ValueStackUnderflow)?;
                    let list: ValueList = self.value_stack[start..vsi].iter().cloned().collect();
                    for _ in 0..count {
                        pop_value(&mut self.value_stack, &mut vsi)?;
                    }
                    push_object(
                        &mut self.object_stack,
                        &mut osi,
                        Rc::new(Object::ValueList(list)),
                    )?;
                }

                Opcode::ObjectListNew => {
                    let count = usize::from(bytes::read_u16(ins, &mut pc)?);
                    let start = osi.checked_sub(count).ok_or(Fault::ObjectStackUnderflow)?;
                    let mut elements = Vec::with_capacity(count);
                    for index in start..osi {
                        elements.push(
                            self.object_stack[index]
                                .clone()
                                .ok_or(Fault::EmptyObjectSlot { index })?,
                        );
                    }
                    let list: ObjectList = elements.into_iter().collect();
                    for _ in 0..count {
                        pop_object(&mut self.object_stack, &mut osi)?;
                    }
                    push_object(
                        &mut self.object_stack,
                        &mut osi,
                        Rc::new(Object::ObjectList(list)),
                    )?;
                }

                Opcode::DottedExpressionSetValue | Opcode::DottedExpressionSetObject => {
                    dotted::execute(
                        ins,
                        &mut pc,
                        &mut self.value_stack,
                        &mut self.object_stack,
                        &mut vsi,
                        &mut osi,
                        opcode == Opcode::DottedExpressionSetValue,
                    )?;
                }
            }
        }

        self.store_state(proc_index, pc, vsi, osi);
        Ok(true)
    }
}
