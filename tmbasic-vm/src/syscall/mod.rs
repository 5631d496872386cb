//! System-call dispatch: the bridge between bytecode and host-provided
//! operations.
//!
//! The interpreter hands each handler a read-only view of both stacks plus
//! the console streams, pops the declared operands, and pushes whatever the
//! registry entry declares on success. A failing handler loads the error
//! register instead; from BASIC's point of view that is indistinguishable
//! from `SetError`.

use std::io::{BufRead, Write};
use std::rc::Rc;

use strum::IntoEnumIterator;
use tmbasic_asm::SystemCall;
use tmbasic_types::Value;

use crate::error::RuntimeError;
use crate::object::{Object, ObjectList, Str};

mod console;
mod datetime;
mod lists;
mod numbers;
mod optionals;
mod strings;

/// Read-only view of the machine handed to a handler.
///
/// Operands sit on top of the stacks in declaration order: value argument
/// `i` of `n` is at `vsi - n + i`, and likewise for objects. The full
/// stacks are visible so variadic handlers can format without copying.
pub struct SystemCallInput<'a> {
    /// The whole value stack.
    pub value_stack: &'a [Value],
    /// The whole object stack.
    pub object_stack: &'a [Option<Rc<Object>>],
    /// First unused value slot.
    pub vsi: usize,
    /// First unused object slot.
    pub osi: usize,
    /// Declared value operand count.
    pub num_value_args: usize,
    /// Declared object operand count.
    pub num_object_args: usize,
    /// Console input.
    pub console_in: &'a mut dyn BufRead,
    /// Console output.
    pub console_out: &'a mut dyn Write,
}

impl SystemCallInput<'_> {
    /// Value operand `index`, 0-based in declaration order.
    pub fn value_arg(&self, index: usize) -> Result<&Value, RuntimeError> {
        if index >= self.num_value_args {
            return Err(RuntimeError::internal(format!(
                "system call read value operand {index} of {}",
                self.num_value_args
            )));
        }
        self.vsi
            .checked_sub(self.num_value_args - index)
            .and_then(|slot| self.value_stack.get(slot))
            .ok_or_else(|| RuntimeError::internal("system call operands missing from stack"))
    }

    /// Object operand `index`, 0-based in declaration order.
    pub fn object_arg(&self, index: usize) -> Result<&Rc<Object>, RuntimeError> {
        if index >= self.num_object_args {
            return Err(RuntimeError::internal(format!(
                "system call read object operand {index} of {}",
                self.num_object_args
            )));
        }
        self.osi
            .checked_sub(self.num_object_args - index)
            .and_then(|slot| self.object_stack.get(slot))
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| RuntimeError::internal("system call operands missing from stack"))
    }
}

/// What a successful handler produced.
#[derive(Debug, Clone, Default)]
pub struct SystemCallOutput {
    /// The returned value, when the entry declares one.
    pub value: Option<Value>,
    /// The returned object, when the entry declares one.
    pub object: Option<Rc<Object>>,
}

impl SystemCallOutput {
    /// No return.
    pub fn none() -> Self {
        Self::default()
    }

    /// A value return.
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            object: None,
        }
    }

    /// An object return.
    pub fn object(object: Rc<Object>) -> Self {
        Self {
            value: None,
            object: Some(object),
        }
    }
}

/// Outcome of a handler: a return payload, or a BASIC-visible error.
pub type SystemCallResult = Result<SystemCallOutput, RuntimeError>;

/// A host-side operation.
pub type SystemCallHandler = Box<dyn Fn(&mut SystemCallInput<'_>) -> SystemCallResult>;

/// The dispatch table, populated with the built-in handlers and overridable
/// per entry for test doubles.
pub struct SystemCallTable {
    handlers: Vec<SystemCallHandler>,
}

impl Default for SystemCallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCallTable {
    /// A table holding every built-in handler.
    pub fn new() -> Self {
        Self {
            handlers: SystemCall::iter().map(builtin).collect(),
        }
    }

    /// Replace the handler for one entry.
    pub fn register(&mut self, call: SystemCall, handler: SystemCallHandler) {
        self.handlers[call.id() as usize] = handler;
    }

    pub(crate) fn handler(&self, call: SystemCall) -> &SystemCallHandler {
        &self.handlers[call.id() as usize]
    }
}

fn builtin(call: SystemCall) -> SystemCallHandler {
    use SystemCall::*;
    match call {
        Add => Box::new(numbers::add),
        AvailableLocales => Box::new(strings::available_locales),
        AvailableTimeZones => Box::new(datetime::available_time_zones),
        Characters1 => Box::new(strings::characters1),
        Characters2 => Box::new(strings::characters2),
        Chr => Box::new(strings::chr),
        DateFromParts => Box::new(datetime::date_from_parts),
        DateTimeFromParts => Box::new(datetime::date_time_from_parts),
        DateTimeOffsetFromParts => Box::new(datetime::date_time_offset_from_parts),
        Days => Box::new(|input| datetime::span(input, datetime::MS_PER_DAY)),
        FlushConsoleOutput => Box::new(console::flush_console_output),
        HasValueO => Box::new(optionals::has_value_o),
        HasValueV => Box::new(optionals::has_value_v),
        Hours => Box::new(|input| datetime::span(input, datetime::MS_PER_HOUR)),
        Len => Box::new(strings::len),
        Milliseconds => Box::new(|input| datetime::span(input, 1)),
        Minutes => Box::new(|input| datetime::span(input, datetime::MS_PER_MINUTE)),
        NumberToString => Box::new(strings::number_to_string),
        ObjectListGet => Box::new(lists::object_list_get),
        ObjectListLength => Box::new(lists::object_list_length),
        ObjectOptionalNewMissing => Box::new(optionals::object_optional_new_missing),
        ObjectOptionalNewPresent => Box::new(optionals::object_optional_new_present),
        PrintString => Box::new(console::print_string),
        Seconds => Box::new(|input| datetime::span(input, datetime::MS_PER_SECOND)),
        TimeZoneFromName => Box::new(datetime::time_zone_from_name),
        TotalDays => Box::new(|input| datetime::total(input, datetime::MS_PER_DAY)),
        TotalHours => Box::new(|input| datetime::total(input, datetime::MS_PER_HOUR)),
        TotalMilliseconds => Box::new(|input| datetime::total(input, 1)),
        TotalMinutes => Box::new(|input| datetime::total(input, datetime::MS_PER_MINUTE)),
        TotalSeconds => Box::new(|input| datetime::total(input, datetime::MS_PER_SECOND)),
        UtcOffset => Box::new(datetime::utc_offset),
        ValueO => Box::new(optionals::value_o),
        ValueOptionalNewMissing => Box::new(optionals::value_optional_new_missing),
        ValueOptionalNewPresent => Box::new(optionals::value_optional_new_present),
        ValueV => Box::new(optionals::value_v),
    }
}

/// Narrow an object operand, converting kind confusion into a caught error.
fn expect_string(object: &Rc<Object>) -> Result<&Str, RuntimeError> {
    object
        .as_string()
        .map_err(|fault| RuntimeError::internal(fault.to_string()))
}

fn expect_object_list(object: &Rc<Object>) -> Result<&ObjectList, RuntimeError> {
    object
        .as_object_list()
        .map_err(|fault| RuntimeError::internal(fault.to_string()))
}

/// An object list of freshly-allocated strings.
fn string_list(items: impl IntoIterator<Item = String>) -> Rc<Object> {
    Rc::new(Object::ObjectList(
        items
            .into_iter()
            .map(Object::string)
            .collect::<ObjectList>(),
    ))
}
