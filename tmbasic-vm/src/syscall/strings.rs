use tmbasic_asm::ErrorCode;
use tmbasic_types::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::RuntimeError;
use crate::object::Object;

use super::{expect_string, string_list, SystemCallInput, SystemCallOutput, SystemCallResult};

/// Locales the grapheme segmenter is correct for. Character breaking here
/// is locale-independent (UAX #29 extended grapheme clusters).
const SUPPORTED_LOCALES: [&str; 2] = ["en-US", "root"];

/// `Chr(input as Number) as String`
pub(super) fn chr(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let code_point = input.value_arg(0)?.as_i64();
    if code_point <= 0 {
        return Ok(SystemCallOutput::object(Object::string("")));
    }
    let ch = u32::try_from(code_point)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            RuntimeError::internal(format!("{code_point} is not a valid code point."))
        })?;
    Ok(SystemCallOutput::object(Object::string(String::from(ch))))
}

/// `Len(input as String) as Number`
pub(super) fn len(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let text = input.object_arg(0)?.clone();
    let text = expect_string(&text)?;
    Ok(SystemCallOutput::value(Value::from(
        text.len_utf16() as u64
    )))
}

/// `NumberToString(input as Number) as String`
pub(super) fn number_to_string(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let text = input.value_arg(0)?.to_display_string();
    Ok(SystemCallOutput::object(Object::string(text)))
}

fn characters_of(text: &str) -> SystemCallOutput {
    SystemCallOutput::object(string_list(
        text.graphemes(true).map(str::to_owned),
    ))
}

/// `Characters(input as String) as List of String`
pub(super) fn characters1(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let text = input.object_arg(0)?.clone();
    Ok(characters_of(expect_string(&text)?.as_str()))
}

/// `Characters(input as String, locale as String) as List of String`
pub(super) fn characters2(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let locale = input.object_arg(1)?.clone();
    let locale = expect_string(&locale)?;
    if !SUPPORTED_LOCALES.contains(&locale.as_str()) {
        return Err(RuntimeError::with_code(
            ErrorCode::InvalidLocaleName,
            format!("The locale name \"{}\" is invalid.", locale.as_str()),
        ));
    }
    let text = input.object_arg(0)?.clone();
    Ok(characters_of(expect_string(&text)?.as_str()))
}

/// `AvailableLocales() as List of String`
pub(super) fn available_locales(_input: &mut SystemCallInput<'_>) -> SystemCallResult {
    Ok(SystemCallOutput::object(string_list(
        SUPPORTED_LOCALES.iter().map(|name| (*name).to_owned()),
    )))
}
