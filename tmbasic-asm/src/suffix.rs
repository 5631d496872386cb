//! Suffix descriptors of the dotted-expression assignment operands.
//!
//! A `DottedExpressionSet*` instruction carries, after the opcode byte:
//! `u8 num_suffixes`, `u8 num_key_values`, `u8 num_key_objects`, then one
//! descriptor per suffix. Each descriptor is a single tag byte; record-field
//! tags are followed by a `u16` field index, while element tags consume one
//! key from the value or object stack instead.

/// Record value field; `u16` field index follows. Terminal only.
pub const RECORD_VALUE_FIELD: u8 = 0x01;
/// Record object field; `u16` field index follows.
pub const RECORD_OBJECT_FIELD: u8 = 0x02;
/// Value index/key selecting a value element; consumes one value key.
/// Terminal only.
pub const VALUE_KEY_VALUE_ELEMENT: u8 = 0x03;
/// Value index/key selecting an object element; consumes one value key.
pub const VALUE_KEY_OBJECT_ELEMENT: u8 = 0x04;
/// Object key selecting a value element; consumes one object key. Terminal
/// only.
pub const OBJECT_KEY_VALUE_ELEMENT: u8 = 0x05;
/// Object key selecting an object element; consumes one object key.
pub const OBJECT_KEY_OBJECT_ELEMENT: u8 = 0x06;

/// A dotted-path step, as the assembler sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    /// Assign into a record value field.
    RecordValueField(u16),
    /// Descend into, or assign into, a record object field.
    RecordObjectField(u16),
    /// Assign into a value-list element or value-to-value map entry; the
    /// index or key is taken from the value stack.
    ValueKeyValueElement,
    /// Descend into, or assign into, an object-list element or
    /// value-to-object map entry.
    ValueKeyObjectElement,
    /// Assign into an object-to-value map entry; the key is taken from the
    /// object stack.
    ObjectKeyValueElement,
    /// Descend into, or assign into, an object-to-object map entry.
    ObjectKeyObjectElement,
}

impl Suffix {
    /// Tag byte of this step.
    pub fn tag(self) -> u8 {
        match self {
            Self::RecordValueField(_) => RECORD_VALUE_FIELD,
            Self::RecordObjectField(_) => RECORD_OBJECT_FIELD,
            Self::ValueKeyValueElement => VALUE_KEY_VALUE_ELEMENT,
            Self::ValueKeyObjectElement => VALUE_KEY_OBJECT_ELEMENT,
            Self::ObjectKeyValueElement => OBJECT_KEY_VALUE_ELEMENT,
            Self::ObjectKeyObjectElement => OBJECT_KEY_OBJECT_ELEMENT,
        }
    }

    /// Whether this step consumes a key from the value stack.
    pub fn consumes_value_key(self) -> bool {
        matches!(
            self,
            Self::ValueKeyValueElement | Self::ValueKeyObjectElement
        )
    }

    /// Whether this step consumes a key from the object stack.
    pub fn consumes_object_key(self) -> bool {
        matches!(
            self,
            Self::ObjectKeyValueElement | Self::ObjectKeyObjectElement
        )
    }
}
