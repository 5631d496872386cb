use crate::bytes::{self, BytecodeError};

/// A compiled BASIC subroutine or function: a frozen instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Procedure {
    /// Packed opcode/operand bytes.
    pub instructions: Vec<u8>,
}

impl Procedure {
    /// A procedure over the given instruction stream.
    pub fn new(instructions: Vec<u8>) -> Self {
        Self { instructions }
    }
}

impl From<Vec<u8>> for Procedure {
    fn from(instructions: Vec<u8>) -> Self {
        Self { instructions }
    }
}

/// A loaded program: procedures, declared global slot counts, and the
/// procedure execution starts in. Immutable once constructed; interpreters
/// share it by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Compiled procedures, indexed by the `Call*` operand.
    pub procedures: Vec<Procedure>,
    /// Number of global value slots the program uses.
    pub global_value_count: u32,
    /// Number of global object slots the program uses.
    pub global_object_count: u32,
    /// Index of the startup procedure.
    pub startup_procedure_index: u32,
}

/// A malformed program container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// The container bytes are truncated.
    #[error("program container corrupt: {0}")]
    Corrupt(#[from] BytecodeError),
    /// The startup index does not name a procedure.
    #[error("startup procedure index {index} out of range ({count} procedures)")]
    StartupOutOfRange {
        /// The declared startup index.
        index: u32,
        /// How many procedures the container holds.
        count: u32,
    },
    /// Bytes remain after the last declared field.
    #[error("{0} trailing bytes after program container")]
    TrailingBytes(usize),
}

impl Program {
    /// A procedure by index.
    pub fn procedure(&self, index: usize) -> Option<&Procedure> {
        self.procedures.get(index)
    }

    /// Serialize to the packed container form: procedure count, each
    /// procedure as a length-prefixed byte vector, the two global slot
    /// counts, and the startup index. Little-endian throughout, no padding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        bytes::write_u32(&mut buf, self.procedures.len() as u32);
        for procedure in &self.procedures {
            bytes::write_u32(&mut buf, procedure.instructions.len() as u32);
            buf.extend_from_slice(&procedure.instructions);
        }
        bytes::write_u32(&mut buf, self.global_value_count);
        bytes::write_u32(&mut buf, self.global_object_count);
        bytes::write_u32(&mut buf, self.startup_procedure_index);
        buf
    }

    /// Deserialize a packed container.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProgramError> {
        let mut cursor = 0;
        let count = bytes::read_u32(buf, &mut cursor)?;
        let mut procedures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = bytes::read_u32(buf, &mut cursor)? as usize;
            let instructions = bytes::read_bytes(buf, &mut cursor, len)?.to_vec();
            procedures.push(Procedure::new(instructions));
        }
        let global_value_count = bytes::read_u32(buf, &mut cursor)?;
        let global_object_count = bytes::read_u32(buf, &mut cursor)?;
        let startup_procedure_index = bytes::read_u32(buf, &mut cursor)?;
        if cursor != buf.len() {
            return Err(ProgramError::TrailingBytes(buf.len() - cursor));
        }
        if startup_procedure_index >= count {
            return Err(ProgramError::StartupOutOfRange {
                index: startup_procedure_index,
                count,
            });
        }
        Ok(Self {
            procedures,
            global_value_count,
            global_object_count,
            startup_procedure_index,
        })
    }
}
