use tmbasic_asm::ErrorCode;

use crate::error::RuntimeError;

use super::{expect_string, SystemCallInput, SystemCallOutput, SystemCallResult};

fn io_failure(err: std::io::Error) -> RuntimeError {
    RuntimeError::with_code(ErrorCode::IoFailure, err.to_string())
}

/// `PrintString(input as String)`
pub(super) fn print_string(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let text = input.object_arg(0)?.clone();
    let text = expect_string(&text)?;
    input
        .console_out
        .write_all(text.as_str().as_bytes())
        .map_err(io_failure)?;
    Ok(SystemCallOutput::none())
}

/// `FlushConsoleOutput()`
pub(super) fn flush_console_output(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    input.console_out.flush().map_err(io_failure)?;
    Ok(SystemCallOutput::none())
}
