use super::{SystemCallInput, SystemCallOutput, SystemCallResult};

/// `Add(lhs as Number, rhs as Number) as Number`
pub(super) fn add(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let sum = input.value_arg(0)? + input.value_arg(1)?;
    Ok(SystemCallOutput::value(sum))
}
