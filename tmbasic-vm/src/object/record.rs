use std::rc::Rc;

use tmbasic_types::Value;

use super::Object;

/// A record: two parallel fixed-length field vectors, one of values and one
/// of objects, indexed by compile-time slot numbers.
///
/// Records are immutable; the `with_*` constructors build a sibling sharing
/// every other field with the original.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record {
    values: im::Vector<Value>,
    objects: im::Vector<Rc<Object>>,
}

impl Record {
    /// A record over the given field contents.
    pub fn new(
        values: impl IntoIterator<Item = Value>,
        objects: impl IntoIterator<Item = Rc<Object>>,
    ) -> Self {
        Self {
            values: values.into_iter().collect(),
            objects: objects.into_iter().collect(),
        }
    }

    /// Number of value fields.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Number of object fields.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// A value field.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// An object field.
    pub fn object(&self, index: usize) -> Option<&Rc<Object>> {
        self.objects.get(index)
    }

    /// A sibling with one value field replaced; `None` when the slot does
    /// not exist.
    pub fn with_value(&self, index: usize, value: Value) -> Option<Self> {
        if index >= self.values.len() {
            return None;
        }
        Some(Self {
            values: self.values.update(index, value),
            objects: self.objects.clone(),
        })
    }

    /// A sibling with one object field replaced; `None` when the slot does
    /// not exist.
    pub fn with_object(&self, index: usize, object: Rc<Object>) -> Option<Self> {
        if index >= self.objects.len() {
            return None;
        }
        Some(Self {
            values: self.values.clone(),
            objects: self.objects.update(index, object),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_value_leaves_the_original_alone() {
        let record = Record::new([Value::from(7i64), Value::from(8i64)], []);
        let sibling = record.with_value(0, Value::from(9i64)).unwrap();
        assert_eq!(record.value(0), Some(&Value::from(7i64)));
        assert_eq!(sibling.value(0), Some(&Value::from(9i64)));
        assert_eq!(sibling.value(1), Some(&Value::from(8i64)));
    }

    #[test]
    fn out_of_range_slots_are_refused() {
        let record = Record::new([Value::from(1i64)], []);
        assert!(record.with_value(1, Value::default()).is_none());
        assert!(record.with_object(0, Object::string("x")).is_none());
        assert!(record.value(3).is_none());
    }

    #[test]
    fn object_fields_replace_by_slot() {
        let record = Record::new([], [Object::string("a"), Object::string("b")]);
        let sibling = record.with_object(1, Object::string("c")).unwrap();
        assert_eq!(*sibling.object(0).unwrap(), Object::string("a"));
        assert_eq!(*sibling.object(1).unwrap(), Object::string("c"));
        assert_eq!(*record.object(1).unwrap(), Object::string("b"));
    }
}
