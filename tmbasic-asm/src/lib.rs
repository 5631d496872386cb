//! Bytecode contract of the TMBASIC virtual machine.
//!
//! The compiler back-end emits, and the interpreter consumes, the types in
//! this crate: the opcode catalog, the packed little-endian operand
//! encoding, the system-call registry, the BASIC-visible error-code catalog,
//! and the [`Program`] container.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

mod asm;
pub mod bytes;
mod error_code;
mod opcode;
mod program;
pub mod suffix;
mod syscall;

pub use asm::{Asm, AsmError, Label};
pub use bytes::BytecodeError;
pub use error_code::ErrorCode;
pub use opcode::Opcode;
pub use program::{Procedure, Program, ProgramError};
pub use syscall::SystemCall;
