use core::fmt;

/// One-byte opcodes of the interpreter.
///
/// Immediate operands follow the opcode byte, tightly packed and
/// little-endian; widths are fixed per opcode and listed here. The stack
/// effect `(Δv, Δo)` gives the change to the value and object stack indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Opcode {
    /// Terminate the run. `()` (0, 0).
    Exit = 0x00,
    /// Push an integer immediate. `(i64)` (+1, 0).
    PushImmediateInt64 = 0x01,
    /// Push a decimal immediate. `(u8 class, u8 sign, u64 hi, u64 lo, i64 exp)` (+1, 0).
    PushImmediateDec128 = 0x02,
    /// Push a string immediate. `(u32 len, byte[len] utf8)` (0, +1).
    PushImmediateUtf8 = 0x03,
    /// Discard the top value. `()` (−1, 0).
    PopValue = 0x04,
    /// Discard the top object. `()` (0, −1).
    PopObject = 0x05,
    /// Push a copy of the top value. `()` (+1, 0).
    DuplicateValue = 0x06,
    /// Push another reference to the top object. `()` (0, +1).
    DuplicateObject = 0x07,
    /// Exchange the top two values. `()` (0, 0).
    SwapValues = 0x08,
    /// Exchange the top two objects. `()` (0, 0).
    SwapObjects = 0x09,
    /// Open the local region above the arguments: the new value slots are
    /// zero, the new object slots empty. `(u16 n_vals, u16 n_objs)` (+n_vals, +n_objs).
    InitLocals = 0x0a,
    /// Push a copy of an argument value. `(u8 idx)` (+1, 0).
    PushArgumentValue = 0x0b,
    /// Push another reference to an argument object. `(u8 idx)` (0, +1).
    PushArgumentObject = 0x0c,
    /// Pop the top value into an argument slot. `(u8 idx)` (−1, 0).
    SetArgumentValue = 0x0d,
    /// Pop the top object into an argument slot. `(u8 idx)` (0, −1).
    SetArgumentObject = 0x0e,
    /// Push a copy of a global value. `(u16 idx)` (+1, 0).
    PushGlobalValue = 0x0f,
    /// Push another reference to a global object. `(u16 idx)` (0, +1).
    PushGlobalObject = 0x10,
    /// Pop the top value into a global slot. `(u16 idx)` (−1, 0).
    SetGlobalValue = 0x11,
    /// Pop the top object into a global slot. `(u16 idx)` (0, −1).
    SetGlobalObject = 0x12,
    /// Push a copy of a local value. `(u16 idx)` (+1, 0).
    PushLocalValue = 0x13,
    /// Push another reference to a local object. `(u16 idx)` (0, +1).
    PushLocalObject = 0x14,
    /// Pop the top value into a local slot. `(u16 idx)` (−1, 0).
    SetLocalValue = 0x15,
    /// Pop the top object into a local slot. `(u16 idx)` (0, −1).
    SetLocalObject = 0x16,
    /// Drop the reference held in a local object slot without touching the
    /// stack top. `(u16 idx)` (0, 0).
    ClearLocalObject = 0x17,
    /// Unconditional jump to an absolute instruction offset. `(u32 target)` (0, 0).
    Jump = 0x18,
    /// Pop the condition; jump when it is true. `(u32 target)` (−1, 0).
    BranchIfTrue = 0x19,
    /// Pop the condition; jump when it is false. `(u32 target)` (−1, 0).
    BranchIfFalse = 0x1a,
    /// Call a procedure that returns nothing. `(u32 proc, u8 n_vals, u8 n_objs)`.
    Call = 0x1b,
    /// Call a procedure that returns a value. `(u32 proc, u8 n_vals, u8 n_objs)`.
    CallV = 0x1c,
    /// Call a procedure that returns an object. `(u32 proc, u8 n_vals, u8 n_objs)`.
    CallO = 0x1d,
    /// Invoke a host operation that returns nothing. `(u16 id, u8 n_vals, u8 n_objs)`.
    SystemCall = 0x1e,
    /// Invoke a host operation that returns a value. `(u16 id, u8 n_vals, u8 n_objs)`.
    SystemCallV = 0x1f,
    /// Invoke a host operation that returns an object. `(u16 id, u8 n_vals, u8 n_objs)`.
    SystemCallO = 0x20,
    /// Invoke a host operation that returns both. `(u16 id, u8 n_vals, u8 n_objs)`.
    SystemCallVO = 0x21,
    /// Tear down the frame: both stacks shrink to the caller's argument
    /// base, control returns to the caller. `()`.
    Return = 0x22,
    /// `Return`, then push the captured top value into the caller. `()`.
    ReturnValue = 0x23,
    /// `Return`, then push the captured top object into the caller. `()`.
    ReturnObject = 0x24,
    /// Pop a message object and a code value, load the error register. `()` (−1, −1).
    SetError = 0x25,
    /// Clear the error register. `()` (0, 0).
    ClearError = 0x26,
    /// Re-raise the error currently held in the register. `()` (0, 0).
    BubbleError = 0x27,
    /// `Return` when the error register is live; fall through otherwise. `()`.
    ReturnIfError = 0x28,
    /// Jump when the error register is live; the register is not cleared.
    /// `(u32 target)` (0, 0).
    BranchIfError = 0x29,
    /// Pop field initializers and build a record; the last-pushed value and
    /// object land in the highest slots. `(u16 n_vals, u16 n_objs)` (−n_vals, −n_objs+1).
    RecordNew = 0x2a,
    /// Pop a record, push one of its value fields. `(u16 idx)` (+1, −1).
    RecordGetValue = 0x2b,
    /// Pop a record, push one of its object fields. `(u16 idx)` (0, 0).
    RecordGetObject = 0x2c,
    /// Pop a record and a value, push a new record with the field replaced.
    /// `(u16 idx)` (−1, 0).
    RecordSetValue = 0x2d,
    /// Pop a record (lower) and an object (upper), push a new record with
    /// the field replaced. `(u16 idx)` (0, −1).
    RecordSetObject = 0x2e,
    /// Pop `n` values and build a list; the deepest becomes index 0.
    /// `(u16 n)` (−n, +1).
    ValueListNew = 0x2f,
    /// Pop `n` objects and build a list; the deepest becomes index 0.
    /// `(u16 n)` (0, −n+1).
    ObjectListNew = 0x30,
    /// Rebuild a nested composite with a value replaced at the end of a
    /// dotted path. See the [`suffix`](crate::suffix) catalog for the
    /// operand layout.
    DottedExpressionSetValue = 0x31,
    /// Rebuild a nested composite with an object replaced at the end of a
    /// dotted path.
    DottedExpressionSetObject = 0x32,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    /// Decode an opcode byte. The offending byte comes back on failure;
    /// unknown opcodes are fatal to the run.
    fn try_from(byte: u8) -> Result<Self, u8> {
        use Opcode::*;
        Ok(match byte {
            0x00 => Exit,
            0x01 => PushImmediateInt64,
            0x02 => PushImmediateDec128,
            0x03 => PushImmediateUtf8,
            0x04 => PopValue,
            0x05 => PopObject,
            0x06 => DuplicateValue,
            0x07 => DuplicateObject,
            0x08 => SwapValues,
            0x09 => SwapObjects,
            0x0a => InitLocals,
            0x0b => PushArgumentValue,
            0x0c => PushArgumentObject,
            0x0d => SetArgumentValue,
            0x0e => SetArgumentObject,
            0x0f => PushGlobalValue,
            0x10 => PushGlobalObject,
            0x11 => SetGlobalValue,
            0x12 => SetGlobalObject,
            0x13 => PushLocalValue,
            0x14 => PushLocalObject,
            0x15 => SetLocalValue,
            0x16 => SetLocalObject,
            0x17 => ClearLocalObject,
            0x18 => Jump,
            0x19 => BranchIfTrue,
            0x1a => BranchIfFalse,
            0x1b => Call,
            0x1c => CallV,
            0x1d => CallO,
            0x1e => SystemCall,
            0x1f => SystemCallV,
            0x20 => SystemCallO,
            0x21 => SystemCallVO,
            0x22 => Return,
            0x23 => ReturnValue,
            0x24 => ReturnObject,
            0x25 => SetError,
            0x26 => ClearError,
            0x27 => BubbleError,
            0x28 => ReturnIfError,
            0x29 => BranchIfError,
            0x2a => RecordNew,
            0x2b => RecordGetValue,
            0x2c => RecordGetObject,
            0x2d => RecordSetValue,
            0x2e => RecordSetObject,
            0x2f => ValueListNew,
            0x30 => ObjectListNew,
            0x31 => DottedExpressionSetValue,
            0x32 => DottedExpressionSetObject,
            _ => return Err(byte),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn opcode_byte_round_trip() {
        for opcode in Opcode::iter() {
            let byte = opcode as u8;
            assert_eq!(Opcode::try_from(byte), Ok(opcode));
        }
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        let last = Opcode::iter().last().unwrap() as u8;
        for byte in (last + 1)..=u8::MAX {
            assert_eq!(Opcode::try_from(byte), Err(byte));
        }
    }
}
