use std::rc::Rc;

use tmbasic_types::Value;

use super::Object;

/// A scalar that may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValueOptional {
    value: Option<Value>,
}

impl ValueOptional {
    /// The missing optional.
    pub fn missing() -> Self {
        Self::default()
    }

    /// An optional carrying a payload.
    pub fn present(value: Value) -> Self {
        Self { value: Some(value) }
    }

    /// Whether a payload is present.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The payload.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// An object that may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectOptional {
    value: Option<Rc<Object>>,
}

impl ObjectOptional {
    /// The missing optional.
    pub fn missing() -> Self {
        Self::default()
    }

    /// An optional carrying a payload.
    pub fn present(value: Rc<Object>) -> Self {
        Self { value: Some(value) }
    }

    /// Whether a payload is present.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The payload.
    pub fn value(&self) -> Option<&Rc<Object>> {
        self.value.as_ref()
    }
}
