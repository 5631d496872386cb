use tmbasic_types::DecimalTriple;

use crate::bytes;
use crate::suffix::Suffix;
use crate::{Opcode, SystemCall};

/// Instruction-stream assembler.
///
/// Instructions are variable length, so branch targets are absolute byte
/// offsets that are rarely known up front; [`Label`]s patch them in once
/// bound. Typical use:
///
/// ```
/// use tmbasic_asm::Asm;
///
/// let mut asm = Asm::new();
/// let done = asm.label();
/// asm.push_immediate_int64(0);
/// asm.branch_if_false(done);
/// asm.push_immediate_int64(1);
/// asm.bind(done);
/// asm.exit();
/// let bytecode = asm.finish().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Asm {
    buf: Vec<u8>,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
}

/// A branch target handed out by [`Asm::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Assembly cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AsmError {
    /// A branch references a label that was never bound.
    #[error("label {0} referenced but never bound")]
    UnboundLabel(usize),
}

impl Asm {
    /// An empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte offset; the address the next instruction will get.
    pub fn offset(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Allocate an unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind a label to the current offset.
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.offset());
    }

    /// Resolve fixups and return the finished stream.
    pub fn finish(self) -> Result<Vec<u8>, AsmError> {
        let mut buf = self.buf;
        for (at, label) in self.fixups {
            let target = self.labels[label.0].ok_or(AsmError::UnboundLabel(label.0))?;
            buf[at..at + 4].copy_from_slice(&target.to_le_bytes());
        }
        Ok(buf)
    }

    fn op(&mut self, opcode: Opcode) -> &mut Self {
        bytes::write_u8(&mut self.buf, opcode as u8);
        self
    }

    fn target(&mut self, label: Label) -> &mut Self {
        self.fixups.push((self.buf.len(), label));
        bytes::write_u32(&mut self.buf, u32::MAX);
        self
    }

    /// `Exit`.
    pub fn exit(&mut self) -> &mut Self {
        self.op(Opcode::Exit)
    }

    /// `PushImmediateInt64 imm`.
    pub fn push_immediate_int64(&mut self, imm: i64) -> &mut Self {
        self.op(Opcode::PushImmediateInt64);
        bytes::write_i64(&mut self.buf, imm);
        self
    }

    /// `PushImmediateDec128 triple`.
    pub fn push_immediate_dec128(&mut self, triple: DecimalTriple) -> &mut Self {
        self.op(Opcode::PushImmediateDec128);
        bytes::write_u8(&mut self.buf, triple.class as u8);
        bytes::write_u8(&mut self.buf, triple.sign);
        bytes::write_u64(&mut self.buf, triple.hi);
        bytes::write_u64(&mut self.buf, triple.lo);
        bytes::write_i64(&mut self.buf, triple.exp);
        self
    }

    /// `PushImmediateUtf8 len bytes`.
    pub fn push_immediate_utf8(&mut self, text: &str) -> &mut Self {
        self.op(Opcode::PushImmediateUtf8);
        bytes::write_u32(&mut self.buf, text.len() as u32);
        self.buf.extend_from_slice(text.as_bytes());
        self
    }

    /// `PopValue`.
    pub fn pop_value(&mut self) -> &mut Self {
        self.op(Opcode::PopValue)
    }

    /// `PopObject`.
    pub fn pop_object(&mut self) -> &mut Self {
        self.op(Opcode::PopObject)
    }

    /// `DuplicateValue`.
    pub fn duplicate_value(&mut self) -> &mut Self {
        self.op(Opcode::DuplicateValue)
    }

    /// `DuplicateObject`.
    pub fn duplicate_object(&mut self) -> &mut Self {
        self.op(Opcode::DuplicateObject)
    }

    /// `SwapValues`.
    pub fn swap_values(&mut self) -> &mut Self {
        self.op(Opcode::SwapValues)
    }

    /// `SwapObjects`.
    pub fn swap_objects(&mut self) -> &mut Self {
        self.op(Opcode::SwapObjects)
    }

    /// `InitLocals n_vals n_objs`.
    pub fn init_locals(&mut self, num_values: u16, num_objects: u16) -> &mut Self {
        self.op(Opcode::InitLocals);
        bytes::write_u16(&mut self.buf, num_values);
        bytes::write_u16(&mut self.buf, num_objects);
        self
    }

    fn u8_operand(&mut self, opcode: Opcode, operand: u8) -> &mut Self {
        self.op(opcode);
        bytes::write_u8(&mut self.buf, operand);
        self
    }

    fn u16_operand(&mut self, opcode: Opcode, operand: u16) -> &mut Self {
        self.op(opcode);
        bytes::write_u16(&mut self.buf, operand);
        self
    }

    /// `PushArgumentValue idx`.
    pub fn push_argument_value(&mut self, index: u8) -> &mut Self {
        self.u8_operand(Opcode::PushArgumentValue, index)
    }

    /// `PushArgumentObject idx`.
    pub fn push_argument_object(&mut self, index: u8) -> &mut Self {
        self.u8_operand(Opcode::PushArgumentObject, index)
    }

    /// `SetArgumentValue idx`.
    pub fn set_argument_value(&mut self, index: u8) -> &mut Self {
        self.u8_operand(Opcode::SetArgumentValue, index)
    }

    /// `SetArgumentObject idx`.
    pub fn set_argument_object(&mut self, index: u8) -> &mut Self {
        self.u8_operand(Opcode::SetArgumentObject, index)
    }

    /// `PushGlobalValue idx`.
    pub fn push_global_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::PushGlobalValue, index)
    }

    /// `PushGlobalObject idx`.
    pub fn push_global_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::PushGlobalObject, index)
    }

    /// `SetGlobalValue idx`.
    pub fn set_global_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::SetGlobalValue, index)
    }

    /// `SetGlobalObject idx`.
    pub fn set_global_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::SetGlobalObject, index)
    }

    /// `PushLocalValue idx`.
    pub fn push_local_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::PushLocalValue, index)
    }

    /// `PushLocalObject idx`.
    pub fn push_local_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::PushLocalObject, index)
    }

    /// `SetLocalValue idx`.
    pub fn set_local_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::SetLocalValue, index)
    }

    /// `SetLocalObject idx`.
    pub fn set_local_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::SetLocalObject, index)
    }

    /// `ClearLocalObject idx`.
    pub fn clear_local_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::ClearLocalObject, index)
    }

    /// `Jump target`.
    pub fn jump(&mut self, label: Label) -> &mut Self {
        self.op(Opcode::Jump).target(label)
    }

    /// `BranchIfTrue target`.
    pub fn branch_if_true(&mut self, label: Label) -> &mut Self {
        self.op(Opcode::BranchIfTrue).target(label)
    }

    /// `BranchIfFalse target`.
    pub fn branch_if_false(&mut self, label: Label) -> &mut Self {
        self.op(Opcode::BranchIfFalse).target(label)
    }

    /// `BranchIfError target`.
    pub fn branch_if_error(&mut self, label: Label) -> &mut Self {
        self.op(Opcode::BranchIfError).target(label)
    }

    fn call_operands(&mut self, procedure: u32, num_values: u8, num_objects: u8) -> &mut Self {
        bytes::write_u32(&mut self.buf, procedure);
        bytes::write_u8(&mut self.buf, num_values);
        bytes::write_u8(&mut self.buf, num_objects);
        self
    }

    /// `Call proc n_vals n_objs`.
    pub fn call(&mut self, procedure: u32, num_values: u8, num_objects: u8) -> &mut Self {
        self.op(Opcode::Call);
        self.call_operands(procedure, num_values, num_objects)
    }

    /// `CallV proc n_vals n_objs`.
    pub fn call_v(&mut self, procedure: u32, num_values: u8, num_objects: u8) -> &mut Self {
        self.op(Opcode::CallV);
        self.call_operands(procedure, num_values, num_objects)
    }

    /// `CallO proc n_vals n_objs`.
    pub fn call_o(&mut self, procedure: u32, num_values: u8, num_objects: u8) -> &mut Self {
        self.op(Opcode::CallO);
        self.call_operands(procedure, num_values, num_objects)
    }

    fn syscall_operands(&mut self, call: SystemCall) -> &mut Self {
        let shape = call.shape();
        bytes::write_u16(&mut self.buf, call.id());
        bytes::write_u8(&mut self.buf, shape.num_value_args);
        bytes::write_u8(&mut self.buf, shape.num_object_args);
        self
    }

    /// The `SystemCall*` variant matching the registry entry's declared
    /// return shape, with its declared operand counts.
    pub fn system_call(&mut self, call: SystemCall) -> &mut Self {
        let shape = call.shape();
        let opcode = match (shape.returns_value, shape.returns_object) {
            (false, false) => Opcode::SystemCall,
            (true, false) => Opcode::SystemCallV,
            (false, true) => Opcode::SystemCallO,
            (true, true) => Opcode::SystemCallVO,
        };
        self.op(opcode);
        self.syscall_operands(call)
    }

    /// `Return`.
    pub fn ret(&mut self) -> &mut Self {
        self.op(Opcode::Return)
    }

    /// `ReturnValue`.
    pub fn ret_value(&mut self) -> &mut Self {
        self.op(Opcode::ReturnValue)
    }

    /// `ReturnObject`.
    pub fn ret_object(&mut self) -> &mut Self {
        self.op(Opcode::ReturnObject)
    }

    /// `SetError`.
    pub fn set_error(&mut self) -> &mut Self {
        self.op(Opcode::SetError)
    }

    /// `ClearError`.
    pub fn clear_error(&mut self) -> &mut Self {
        self.op(Opcode::ClearError)
    }

    /// `BubbleError`.
    pub fn bubble_error(&mut self) -> &mut Self {
        self.op(Opcode::BubbleError)
    }

    /// `ReturnIfError`.
    pub fn return_if_error(&mut self) -> &mut Self {
        self.op(Opcode::ReturnIfError)
    }

    /// `RecordNew n_vals n_objs`.
    pub fn record_new(&mut self, num_values: u16, num_objects: u16) -> &mut Self {
        self.op(Opcode::RecordNew);
        bytes::write_u16(&mut self.buf, num_values);
        bytes::write_u16(&mut self.buf, num_objects);
        self
    }

    /// `RecordGetValue idx`.
    pub fn record_get_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::RecordGetValue, index)
    }

    /// `RecordGetObject idx`.
    pub fn record_get_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::RecordGetObject, index)
    }

    /// `RecordSetValue idx`.
    pub fn record_set_value(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::RecordSetValue, index)
    }

    /// `RecordSetObject idx`.
    pub fn record_set_object(&mut self, index: u16) -> &mut Self {
        self.u16_operand(Opcode::RecordSetObject, index)
    }

    /// `ValueListNew n`.
    pub fn value_list_new(&mut self, count: u16) -> &mut Self {
        self.u16_operand(Opcode::ValueListNew, count)
    }

    /// `ObjectListNew n`.
    pub fn object_list_new(&mut self, count: u16) -> &mut Self {
        self.u16_operand(Opcode::ObjectListNew, count)
    }

    fn dotted(&mut self, opcode: Opcode, suffixes: &[Suffix]) -> &mut Self {
        let num_key_values = suffixes.iter().filter(|s| s.consumes_value_key()).count();
        let num_key_objects = suffixes.iter().filter(|s| s.consumes_object_key()).count();
        self.op(opcode);
        bytes::write_u8(&mut self.buf, suffixes.len() as u8);
        bytes::write_u8(&mut self.buf, num_key_values as u8);
        bytes::write_u8(&mut self.buf, num_key_objects as u8);
        for suffix in suffixes {
            bytes::write_u8(&mut self.buf, suffix.tag());
            match suffix {
                Suffix::RecordValueField(index) | Suffix::RecordObjectField(index) => {
                    bytes::write_u16(&mut self.buf, *index);
                }
                _ => {}
            }
        }
        self
    }

    /// `DottedExpressionSetValue` over the given path.
    pub fn dotted_set_value(&mut self, suffixes: &[Suffix]) -> &mut Self {
        self.dotted(Opcode::DottedExpressionSetValue, suffixes)
    }

    /// `DottedExpressionSetObject` over the given path.
    pub fn dotted_set_object(&mut self, suffixes: &[Suffix]) -> &mut Self {
        self.dotted(Opcode::DottedExpressionSetObject, suffixes)
    }
}
