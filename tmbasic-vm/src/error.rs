//! Runtime interpreter error implementation.
//!
//! Failures split two ways. A [`Fault`] is unrecoverable: the bytecode or
//! the runtime itself is broken, and `run` aborts with `Err`. A
//! [`RuntimeError`] is the BASIC-visible kind: it loads the error register
//! and execution continues until an error-aware opcode reacts.

use tmbasic_asm::{BytecodeError, ErrorCode, SystemCall};
use tmbasic_types::{TripleError, Value};

/// Unrecoverable execution failure. Corrupt bytecode, stack discipline
/// violations and composite type confusion land here; a well-formed program
/// never produces one.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// `run` was called before `init`.
    #[error("interpreter not initialized")]
    NotInitialized,
    /// An instruction stream ended mid-instruction.
    #[error("bytecode corrupt: {0}")]
    Bytecode(#[from] BytecodeError),
    /// The opcode byte is not in the catalog.
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode {
        /// The offending byte.
        opcode: u8,
        /// Offset of the byte in the procedure.
        offset: usize,
    },
    /// The system-call id is not in the registry.
    #[error("unknown system call id {id}")]
    UnknownSystemCall {
        /// The offending id.
        id: u16,
    },
    /// A decimal immediate did not decode.
    #[error("bad decimal immediate: {0}")]
    InvalidDecimal(#[from] TripleError),
    /// A string immediate held invalid UTF-8.
    #[error("invalid utf-8 in string immediate")]
    InvalidUtf8,
    /// The value stack is out of capacity.
    #[error("value stack overflow")]
    ValueStackOverflow,
    /// A pop or read reached below the bottom of the value stack.
    #[error("value stack underflow")]
    ValueStackUnderflow,
    /// The object stack is out of capacity.
    #[error("object stack overflow")]
    ObjectStackOverflow,
    /// A pop or read reached below the bottom of the object stack.
    #[error("object stack underflow")]
    ObjectStackUnderflow,
    /// An object slot that should hold a reference is empty.
    #[error("empty object slot at index {index}")]
    EmptyObjectSlot {
        /// Slot index.
        index: usize,
    },
    /// A return was executed with no frame to return from.
    #[error("call stack underflow")]
    CallStackUnderflow,
    /// A slot index operand is out of range.
    #[error("{what} index {index} out of range ({limit} available)")]
    IndexOutOfRange {
        /// What was being indexed.
        what: &'static str,
        /// The offending index.
        index: usize,
        /// How many slots exist.
        limit: usize,
    },
    /// A list element index is out of range.
    #[error("list index {index} out of range ({len} elements)")]
    ListIndexOutOfRange {
        /// The offending index.
        index: i64,
        /// The list length.
        len: usize,
    },
    /// An operand object has the wrong kind.
    #[error("expected {expected}, found {actual}")]
    TypeMismatch {
        /// Kind the instruction requires.
        expected: &'static str,
        /// Kind actually found.
        actual: &'static str,
    },
    /// A dotted expression carries no suffixes.
    #[error("dotted expression with no suffixes")]
    EmptySuffixList,
    /// A dotted expression continues past a terminal element.
    #[error("dotted expression continues past a terminal element")]
    TrailingSuffixes,
    /// The dotted expression source does not match the terminal slot.
    #[error("dotted expression assigns a {actual} where a {expected} is required")]
    SourceKindMismatch {
        /// What the terminal slot stores.
        expected: &'static str,
        /// What the instruction is assigning.
        actual: &'static str,
    },
    /// A suffix tag byte is not in the catalog.
    #[error("unknown dotted expression suffix tag {tag:#04x}")]
    UnknownSuffixTag {
        /// The offending tag.
        tag: u8,
    },
    /// A dotted expression descends through a map key that is not present.
    #[error("dotted expression key not present in map")]
    MissingMapKey,
    /// A handler succeeded without producing its declared return.
    #[error("system call {call} did not produce its declared return")]
    MissingSystemCallReturn {
        /// The registry entry.
        call: SystemCall,
    },
}

/// A BASIC-visible error: the payload of the error register.
///
/// The code travels as a scalar so user programs can raise and compare
/// arbitrary numbers; the catalog in [`ErrorCode`] covers the runtime's own
/// codes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("error {code}: {message}")]
pub struct RuntimeError {
    /// Numeric error code.
    pub code: Value,
    /// Human-readable message.
    pub message: String,
}

impl RuntimeError {
    /// An error with an arbitrary code.
    pub fn new(code: impl Into<Value>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// An error with a cataloged code.
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code.code(), message)
    }

    /// A catch-all internal error, code −1.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Internal, message)
    }
}

/// The VM-scoped error register.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorState {
    live: bool,
    code: Value,
    message: String,
}

impl ErrorState {
    /// Load the register and mark it live.
    pub(crate) fn set(&mut self, error: RuntimeError) {
        self.live = true;
        self.code = error.code;
        self.message = error.message;
    }

    /// Clear the live flag. The code and message linger; `BubbleError`
    /// relies on that.
    pub(crate) fn clear(&mut self) {
        self.live = false;
    }

    /// Re-mark the lingering error live.
    pub(crate) fn raise(&mut self) {
        self.live = true;
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live
    }

    /// The register contents, when live.
    pub(crate) fn get(&self) -> Option<RuntimeError> {
        self.live.then(|| RuntimeError {
            code: self.code.clone(),
            message: self.message.clone(),
        })
    }
}
