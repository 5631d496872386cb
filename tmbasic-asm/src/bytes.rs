//! Bounds-checked little-endian reads and writes over instruction streams.
//!
//! Operands are tightly packed with no alignment; every multi-byte immediate
//! is little-endian regardless of host. Readers take a cursor, advance it
//! past what they consume, and fail with [`BytecodeError`] instead of
//! panicking when the stream is truncated.

/// A malformed instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BytecodeError {
    /// The stream ended in the middle of an instruction.
    #[error("bytecode truncated at offset {offset}: wanted {wanted} more bytes, had {available}")]
    UnexpectedEnd {
        /// Cursor position when the read was attempted.
        offset: usize,
        /// Bytes the read needed.
        wanted: usize,
        /// Bytes remaining in the stream.
        available: usize,
    },
}

fn take<'a>(buf: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], BytecodeError> {
    let start = *cursor;
    let end = start.checked_add(len).filter(|end| *end <= buf.len()).ok_or(
        BytecodeError::UnexpectedEnd {
            offset: start,
            wanted: len,
            available: buf.len().saturating_sub(start),
        },
    )?;
    *cursor = end;
    Ok(&buf[start..end])
}

/// Read one byte.
pub fn read_u8(buf: &[u8], cursor: &mut usize) -> Result<u8, BytecodeError> {
    Ok(take(buf, cursor, 1)?[0])
}

/// Read a little-endian `u16`.
pub fn read_u16(buf: &[u8], cursor: &mut usize) -> Result<u16, BytecodeError> {
    let bytes = take(buf, cursor, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read a little-endian `u32`.
pub fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32, BytecodeError> {
    let bytes = take(buf, cursor, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a little-endian `u64`.
pub fn read_u64(buf: &[u8], cursor: &mut usize) -> Result<u64, BytecodeError> {
    let bytes = take(buf, cursor, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(raw))
}

/// Read a little-endian `i64`.
pub fn read_i64(buf: &[u8], cursor: &mut usize) -> Result<i64, BytecodeError> {
    Ok(read_u64(buf, cursor)? as i64)
}

/// Read `len` raw bytes.
pub fn read_bytes<'a>(
    buf: &'a [u8],
    cursor: &mut usize,
    len: usize,
) -> Result<&'a [u8], BytecodeError> {
    take(buf, cursor, len)
}

/// Append one byte.
pub fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

/// Append a little-endian `u16`.
pub fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian `u32`.
pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian `u64`.
pub fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian `i64`.
pub fn write_i64(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_le_bytes());
}
