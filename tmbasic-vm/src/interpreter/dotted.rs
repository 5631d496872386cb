//! Structural update for nested assignment targets.
//!
//! `a.b[k].c = x` compiles to a single `DottedExpressionSet*` instruction.
//! The engine walks the suffix descriptors, descending through immutable
//! composites, and rebuilds every container on the path with the matching
//! `with` constructor; the rebuilt outermost container replaces the target
//! base on the object stack.

use std::rc::Rc;

use tmbasic_asm::{bytes, suffix};
use tmbasic_types::Value;

use crate::error::Fault;
use crate::object::{Object, ObjectKey};

/// Execute one `DottedExpressionSetValue`/`DottedExpressionSetObject`.
///
/// On entry the cursor sits just past the opcode byte. Stack layout, top
/// rightmost:
///
/// ```text
/// values:  [ source_value?, key_v0, …, key_v{m-1} ]
/// objects: [ source_object?, target_base, key_o0, …, key_o{k-1} ]
/// ```
///
/// On success the keys and the source are consumed and the rebuilt base
/// stands where the old one (or, for object sources, the source) was.
#[allow(clippy::too_many_arguments)]
pub(super) fn execute(
    ins: &[u8],
    pc: &mut usize,
    value_stack: &mut [Value],
    object_stack: &mut [Option<Rc<Object>>],
    vsi: &mut usize,
    osi: &mut usize,
    is_assigning_value: bool,
) -> Result<(), Fault> {
    let num_suffixes = usize::from(bytes::read_u8(ins, pc)?);
    let num_key_values = usize::from(bytes::read_u8(ins, pc)?);
    let num_key_objects = usize::from(bytes::read_u8(ins, pc)?);
    if num_suffixes == 0 {
        return Err(Fault::EmptySuffixList);
    }

    let start_key_value_index = vsi
        .checked_sub(num_key_values)
        .ok_or(Fault::ValueStackUnderflow)?;
    let target_base_index = osi
        .checked_sub(num_key_objects + 1)
        .ok_or(Fault::ObjectStackUnderflow)?;
    let start_key_object_index = target_base_index + 1;

    let base = object_stack[target_base_index]
        .clone()
        .ok_or(Fault::EmptyObjectSlot {
            index: target_base_index,
        })?;
    let (source_value, source_object) = if is_assigning_value {
        let index = start_key_value_index
            .checked_sub(1)
            .ok_or(Fault::ValueStackUnderflow)?;
        (value_stack[index].clone(), None)
    } else {
        let index = target_base_index
            .checked_sub(1)
            .ok_or(Fault::ObjectStackUnderflow)?;
        let source = object_stack[index]
            .clone()
            .ok_or(Fault::EmptyObjectSlot { index })?;
        (Value::default(), Some(source))
    };

    let updated = Recursion {
        ins,
        value_stack: &*value_stack,
        object_stack: &*object_stack,
        is_assigning_value,
        source_value,
        source_object,
    }
    .recurse(
        pc,
        &base,
        num_suffixes,
        start_key_value_index,
        start_key_object_index,
    )?;

    // Consume the keys and the source; the rebuilt base takes the slot the
    // consumed region exposes.
    let final_vsi = if is_assigning_value {
        start_key_value_index - 1
    } else {
        start_key_value_index
    };
    while *vsi > final_vsi {
        *vsi -= 1;
        value_stack[*vsi] = Value::default();
    }
    let final_base_index = if is_assigning_value {
        target_base_index
    } else {
        target_base_index - 1
    };
    while *osi > final_base_index {
        *osi -= 1;
        object_stack[*osi] = None;
    }
    object_stack[final_base_index] = Some(updated);
    *osi = final_base_index + 1;
    Ok(())
}

struct Recursion<'a> {
    ins: &'a [u8],
    value_stack: &'a [Value],
    object_stack: &'a [Option<Rc<Object>>],
    is_assigning_value: bool,
    source_value: Value,
    source_object: Option<Rc<Object>>,
}

impl Recursion<'_> {
    fn value_source(&self) -> Result<Value, Fault> {
        if self.is_assigning_value {
            Ok(self.source_value.clone())
        } else {
            Err(Fault::SourceKindMismatch {
                expected: "value",
                actual: "object",
            })
        }
    }

    fn object_source(&self) -> Result<Rc<Object>, Fault> {
        self.source_object
            .clone()
            .ok_or(Fault::SourceKindMismatch {
                expected: "object",
                actual: "value",
            })
    }

    fn value_key(&self, index: usize) -> Result<Value, Fault> {
        self.value_stack
            .get(index)
            .cloned()
            .ok_or(Fault::ValueStackUnderflow)
    }

    fn object_key(&self, index: usize) -> Result<Rc<Object>, Fault> {
        self.object_stack
            .get(index)
            .ok_or(Fault::ObjectStackUnderflow)?
            .clone()
            .ok_or(Fault::EmptyObjectSlot { index })
    }

    fn list_index(&self, key: &Value, len: usize) -> Result<usize, Fault> {
        let raw = key.as_i64();
        usize::try_from(raw)
            .ok()
            .filter(|index| *index < len)
            .ok_or(Fault::ListIndexOutOfRange { index: raw, len })
    }

    /// Process one suffix descriptor and everything below it, returning the
    /// rebuilt form of `base`.
    fn recurse(
        &self,
        pc: &mut usize,
        base: &Rc<Object>,
        remaining: usize,
        next_key_value: usize,
        next_key_object: usize,
    ) -> Result<Rc<Object>, Fault> {
        let tag = bytes::read_u8(self.ins, pc)?;
        match tag {
            suffix::RECORD_VALUE_FIELD => {
                // Terminal by nature: a value field has nothing to recurse
                // into.
                let index = usize::from(bytes::read_u16(self.ins, pc)?);
                let record = base.as_record()?;
                if remaining != 1 {
                    return Err(Fault::TrailingSuffixes);
                }
                let updated = record
                    .with_value(index, self.value_source()?)
                    .ok_or(Fault::IndexOutOfRange {
                        what: "record value field",
                        index,
                        limit: record.num_values(),
                    })?;
                Ok(Rc::new(Object::Record(updated)))
            }

            suffix::RECORD_OBJECT_FIELD => {
                let index = usize::from(bytes::read_u16(self.ins, pc)?);
                let record = base.as_record()?;
                let field = if remaining == 1 {
                    self.object_source()?
                } else {
                    let inner = record
                        .object(index)
                        .ok_or(Fault::IndexOutOfRange {
                            what: "record object field",
                            index,
                            limit: record.num_objects(),
                        })?
                        .clone();
                    self.recurse(pc, &inner, remaining - 1, next_key_value, next_key_object)?
                };
                let updated = record
                    .with_object(index, field)
                    .ok_or(Fault::IndexOutOfRange {
                        what: "record object field",
                        index,
                        limit: record.num_objects(),
                    })?;
                Ok(Rc::new(Object::Record(updated)))
            }

            suffix::VALUE_KEY_VALUE_ELEMENT => {
                if remaining != 1 {
                    return Err(Fault::TrailingSuffixes);
                }
                let key = self.value_key(next_key_value)?;
                match &**base {
                    Object::ValueList(list) => {
                        let index = self.list_index(&key, list.len())?;
                        let updated = list
                            .with(false, index, self.value_source()?)
                            .ok_or(Fault::ListIndexOutOfRange {
                                index: index as i64,
                                len: list.len(),
                            })?;
                        Ok(Rc::new(Object::ValueList(updated)))
                    }
                    Object::ValueToValueMap(map) => Ok(Rc::new(Object::ValueToValueMap(
                        map.with(key, self.value_source()?),
                    ))),
                    other => Err(Fault::TypeMismatch {
                        expected: "value list or value-to-value map",
                        actual: other.kind().name(),
                    }),
                }
            }

            suffix::VALUE_KEY_OBJECT_ELEMENT => {
                let key = self.value_key(next_key_value)?;
                match &**base {
                    Object::ObjectList(list) => {
                        let index = self.list_index(&key, list.len())?;
                        let element = if remaining == 1 {
                            self.object_source()?
                        } else {
                            let inner = list
                                .get(index)
                                .ok_or(Fault::ListIndexOutOfRange {
                                    index: index as i64,
                                    len: list.len(),
                                })?
                                .clone();
                            self.recurse(
                                pc,
                                &inner,
                                remaining - 1,
                                next_key_value + 1,
                                next_key_object,
                            )?
                        };
                        let updated =
                            list.with(false, index, element)
                                .ok_or(Fault::ListIndexOutOfRange {
                                    index: index as i64,
                                    len: list.len(),
                                })?;
                        Ok(Rc::new(Object::ObjectList(updated)))
                    }
                    Object::ValueToObjectMap(map) => {
                        let element = if remaining == 1 {
                            self.object_source()?
                        } else {
                            let inner = map.get(&key).ok_or(Fault::MissingMapKey)?.clone();
                            self.recurse(
                                pc,
                                &inner,
                                remaining - 1,
                                next_key_value + 1,
                                next_key_object,
                            )?
                        };
                        Ok(Rc::new(Object::ValueToObjectMap(map.with(key, element))))
                    }
                    other => Err(Fault::TypeMismatch {
                        expected: "object list or value-to-object map",
                        actual: other.kind().name(),
                    }),
                }
            }

            suffix::OBJECT_KEY_VALUE_ELEMENT => {
                // Terminal by nature, like record value fields.
                if remaining != 1 {
                    return Err(Fault::TrailingSuffixes);
                }
                let key = ObjectKey(self.object_key(next_key_object)?);
                let map = base.as_object_to_value_map()?;
                Ok(Rc::new(Object::ObjectToValueMap(
                    map.with(key, self.value_source()?),
                )))
            }

            suffix::OBJECT_KEY_OBJECT_ELEMENT => {
                let key = ObjectKey(self.object_key(next_key_object)?);
                let map = base.as_object_to_object_map()?;
                let element = if remaining == 1 {
                    self.object_source()?
                } else {
                    let inner = map.get(&key).ok_or(Fault::MissingMapKey)?.clone();
                    self.recurse(
                        pc,
                        &inner,
                        remaining - 1,
                        next_key_value,
                        next_key_object + 1,
                    )?
                };
                Ok(Rc::new(Object::ObjectToObjectMap(map.with(key, element))))
            }

            tag => Err(Fault::UnknownSuffixTag { tag }),
        }
    }
}
