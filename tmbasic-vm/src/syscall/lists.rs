use tmbasic_types::Value;

use crate::error::RuntimeError;

use super::{expect_object_list, SystemCallInput, SystemCallOutput, SystemCallResult};

/// `ObjectListGet(input as List of Object, index as Number) as Object`
pub(super) fn object_list_get(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let list = input.object_arg(0)?.clone();
    let list = expect_object_list(&list)?;
    let index = input.value_arg(0)?.as_i64();
    let element = usize::try_from(index)
        .ok()
        .and_then(|index| list.get(index))
        .ok_or_else(|| {
            RuntimeError::internal(format!(
                "List index {index} is out of range; the list has {} elements.",
                list.len()
            ))
        })?;
    Ok(SystemCallOutput::object(element.clone()))
}

/// `ObjectListLength(input as List of Object) as Number`
pub(super) fn object_list_length(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let list = input.object_arg(0)?.clone();
    let list = expect_object_list(&list)?;
    Ok(SystemCallOutput::value(Value::from(list.len() as u64)))
}
