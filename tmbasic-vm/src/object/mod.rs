//! The runtime object model.
//!
//! Everything that is not a scalar lives on the object stack behind an
//! [`Rc`]: strings, records, the two list shapes, the four map shapes,
//! optionals, and procedure handles. Objects are immutable after
//! construction; every "set" builds a new object that shares substructure
//! with the old one, so graphs are acyclic and plain reference counting
//! reclaims them deterministically.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tmbasic_asm::Procedure;

use crate::error::Fault;

mod list;
mod map;
mod optional;
mod record;
mod string;

pub use list::{ObjectList, ValueList};
pub use map::{ObjectKey, ObjectToObjectMap, ObjectToValueMap, ValueToObjectMap, ValueToValueMap};
pub use optional::{ObjectOptional, ValueOptional};
pub use record::Record;
pub use string::Str;

/// Discriminant of an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A string.
    String,
    /// A record.
    Record,
    /// A list of scalars.
    ValueList,
    /// A list of objects.
    ObjectList,
    /// A map from scalars to scalars.
    ValueToValueMap,
    /// A map from scalars to objects.
    ValueToObjectMap,
    /// A map from objects to scalars.
    ObjectToValueMap,
    /// A map from objects to objects.
    ObjectToObjectMap,
    /// A scalar that may be missing.
    ValueOptional,
    /// An object that may be missing.
    ObjectOptional,
    /// A procedure handle.
    Procedure,
}

impl ObjectKind {
    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Record => "record",
            Self::ValueList => "value list",
            Self::ObjectList => "object list",
            Self::ValueToValueMap => "value-to-value map",
            Self::ValueToObjectMap => "value-to-object map",
            Self::ObjectToValueMap => "object-to-value map",
            Self::ObjectToObjectMap => "object-to-object map",
            Self::ValueOptional => "value optional",
            Self::ObjectOptional => "object optional",
            Self::Procedure => "procedure",
        }
    }
}

/// A shared handle to a frozen bytecode body. Identity, not contents,
/// defines equality.
#[derive(Debug, Clone)]
pub struct ProcedureHandle(pub Rc<Procedure>);

impl PartialEq for ProcedureHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ProcedureHandle {}

impl Hash for ProcedureHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

/// Any non-scalar runtime datum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    /// A string.
    String(Str),
    /// A record.
    Record(Record),
    /// A list of scalars.
    ValueList(ValueList),
    /// A list of objects.
    ObjectList(ObjectList),
    /// A map from scalars to scalars.
    ValueToValueMap(ValueToValueMap),
    /// A map from scalars to objects.
    ValueToObjectMap(ValueToObjectMap),
    /// A map from objects to scalars.
    ObjectToValueMap(ObjectToValueMap),
    /// A map from objects to objects.
    ObjectToObjectMap(ObjectToObjectMap),
    /// A scalar that may be missing.
    ValueOptional(ValueOptional),
    /// An object that may be missing.
    ObjectOptional(ObjectOptional),
    /// A procedure handle.
    Procedure(ProcedureHandle),
}

macro_rules! kind_accessor {
    ($(#[$doc:meta])* $fn:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $fn(&self) -> Result<&$ty, Fault> {
            match self {
                Self::$variant(inner) => Ok(inner),
                other => Err(Fault::TypeMismatch {
                    expected: ObjectKind::$variant.name(),
                    actual: other.kind().name(),
                }),
            }
        }
    };
}

impl Object {
    /// This object's kind.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::String(_) => ObjectKind::String,
            Self::Record(_) => ObjectKind::Record,
            Self::ValueList(_) => ObjectKind::ValueList,
            Self::ObjectList(_) => ObjectKind::ObjectList,
            Self::ValueToValueMap(_) => ObjectKind::ValueToValueMap,
            Self::ValueToObjectMap(_) => ObjectKind::ValueToObjectMap,
            Self::ObjectToValueMap(_) => ObjectKind::ObjectToValueMap,
            Self::ObjectToObjectMap(_) => ObjectKind::ObjectToObjectMap,
            Self::ValueOptional(_) => ObjectKind::ValueOptional,
            Self::ObjectOptional(_) => ObjectKind::ObjectOptional,
            Self::Procedure(_) => ObjectKind::Procedure,
        }
    }

    /// A shared string object.
    pub fn string(text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::String(Str::new(text)))
    }

    kind_accessor!(
        /// This object as a string.
        as_string,
        String,
        Str
    );
    kind_accessor!(
        /// This object as a record.
        as_record,
        Record,
        Record
    );
    kind_accessor!(
        /// This object as a value list.
        as_value_list,
        ValueList,
        ValueList
    );
    kind_accessor!(
        /// This object as an object list.
        as_object_list,
        ObjectList,
        ObjectList
    );
    kind_accessor!(
        /// This object as a value-to-value map.
        as_value_to_value_map,
        ValueToValueMap,
        ValueToValueMap
    );
    kind_accessor!(
        /// This object as a value-to-object map.
        as_value_to_object_map,
        ValueToObjectMap,
        ValueToObjectMap
    );
    kind_accessor!(
        /// This object as an object-to-value map.
        as_object_to_value_map,
        ObjectToValueMap,
        ObjectToValueMap
    );
    kind_accessor!(
        /// This object as an object-to-object map.
        as_object_to_object_map,
        ObjectToObjectMap,
        ObjectToObjectMap
    );
    kind_accessor!(
        /// This object as a value optional.
        as_value_optional,
        ValueOptional,
        ValueOptional
    );
    kind_accessor!(
        /// This object as an object optional.
        as_object_optional,
        ObjectOptional,
        ObjectOptional
    );
}
