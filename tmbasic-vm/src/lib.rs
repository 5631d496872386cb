//! TMBASIC bytecode interpreter.
//!
//! A stack machine over the bytecode contract in [`tmbasic_asm`]: two
//! parallel fixed-capacity stacks (scalars and object references), call
//! frames, a persistent object model for composites, an error register, and
//! a system-call bus to host-provided operations. Execution is cooperative:
//! [`interpreter::Interpreter::run`] takes a cycle budget and can be
//! re-entered until the program finishes.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod call;
pub mod consts;
pub mod error;
pub mod interpreter;
pub mod object;
pub mod syscall;

#[doc(no_inline)]
pub use tmbasic_asm;
#[doc(no_inline)]
pub use tmbasic_types;

pub mod prelude {
    //! Everything needed to load and run a program.
    #[doc(no_inline)]
    pub use tmbasic_asm::{Asm, ErrorCode, Opcode, Procedure, Program, SystemCall};
    #[doc(no_inline)]
    pub use tmbasic_types::{DecimalTriple, Value};

    pub use crate::call::CallFrame;
    pub use crate::error::{Fault, RuntimeError};
    pub use crate::interpreter::Interpreter;
    pub use crate::object::{
        Object, ObjectKey, ObjectKind, ObjectList, ObjectOptional, ObjectToObjectMap,
        ObjectToValueMap, Record, Str, ValueList, ValueOptional, ValueToObjectMap,
        ValueToValueMap,
    };
    pub use crate::syscall::{
        SystemCallHandler, SystemCallInput, SystemCallOutput, SystemCallResult, SystemCallTable,
    };
}
