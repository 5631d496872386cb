//! VM parameters.

/// Capacity of the value stack, in slots.
pub const VALUE_STACK_SIZE: usize = 10_000;

/// Capacity of the object stack, in slots.
pub const OBJECT_STACK_SIZE: usize = 10_000;
