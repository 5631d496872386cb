use std::rc::Rc;

use tmbasic_types::Value;

use crate::error::RuntimeError;
use crate::object::{Object, ObjectOptional, ValueOptional};

use super::{SystemCallInput, SystemCallOutput, SystemCallResult};

fn expect_value_optional(object: &Rc<Object>) -> Result<&ValueOptional, RuntimeError> {
    object
        .as_value_optional()
        .map_err(|fault| RuntimeError::internal(fault.to_string()))
}

fn expect_object_optional(object: &Rc<Object>) -> Result<&ObjectOptional, RuntimeError> {
    object
        .as_object_optional()
        .map_err(|fault| RuntimeError::internal(fault.to_string()))
}

/// `ValueOptionalNewMissing() as Optional Value`
pub(super) fn value_optional_new_missing(_input: &mut SystemCallInput<'_>) -> SystemCallResult {
    Ok(SystemCallOutput::object(Rc::new(Object::ValueOptional(
        ValueOptional::missing(),
    ))))
}

/// `ValueOptionalNewPresent(input as Value) as Optional Value`
pub(super) fn value_optional_new_present(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let payload = input.value_arg(0)?.clone();
    Ok(SystemCallOutput::object(Rc::new(Object::ValueOptional(
        ValueOptional::present(payload),
    ))))
}

/// `ObjectOptionalNewMissing() as Optional Object`
pub(super) fn object_optional_new_missing(_input: &mut SystemCallInput<'_>) -> SystemCallResult {
    Ok(SystemCallOutput::object(Rc::new(Object::ObjectOptional(
        ObjectOptional::missing(),
    ))))
}

/// `ObjectOptionalNewPresent(input as Object) as Optional Object`
pub(super) fn object_optional_new_present(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let payload = input.object_arg(0)?.clone();
    Ok(SystemCallOutput::object(Rc::new(Object::ObjectOptional(
        ObjectOptional::present(payload),
    ))))
}

/// `HasValue(input as Optional Value) as Boolean`
pub(super) fn has_value_v(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let optional = input.object_arg(0)?.clone();
    let present = expect_value_optional(&optional)?.has_value();
    Ok(SystemCallOutput::value(Value::from_bool(present)))
}

/// `HasValue(input as Optional Object) as Boolean`
pub(super) fn has_value_o(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let optional = input.object_arg(0)?.clone();
    let present = expect_object_optional(&optional)?.has_value();
    Ok(SystemCallOutput::value(Value::from_bool(present)))
}

/// `Value(input as Optional Value) as Number`
pub(super) fn value_v(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let optional = input.object_arg(0)?.clone();
    let payload = expect_value_optional(&optional)?
        .value()
        .cloned()
        .ok_or_else(|| RuntimeError::internal("The optional does not have a value."))?;
    Ok(SystemCallOutput::value(payload))
}

/// `Value(input as Optional Object) as Object`
pub(super) fn value_o(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let optional = input.object_arg(0)?.clone();
    let payload = expect_object_optional(&optional)?
        .value()
        .cloned()
        .ok_or_else(|| RuntimeError::internal("The optional does not have a value."))?;
    Ok(SystemCallOutput::object(payload))
}
