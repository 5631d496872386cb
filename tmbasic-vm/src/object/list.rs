use std::rc::Rc;

use tmbasic_types::Value;

use super::Object;

macro_rules! list_impl {
    ($(#[$doc:meta])* $name:ident, $item:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            items: im::Vector<$item>,
        }

        impl $name {
            /// An empty list.
            pub fn new() -> Self {
                Self::default()
            }

            /// Number of elements.
            pub fn len(&self) -> usize {
                self.items.len()
            }

            /// Whether the list has no elements.
            pub fn is_empty(&self) -> bool {
                self.items.is_empty()
            }

            /// An element by 0-based index.
            pub fn get(&self, index: usize) -> Option<&$item> {
                self.items.get(index)
            }

            /// A sibling with one element changed. With `insert` false the
            /// element at `index` is replaced (`0 ≤ index < len`); with
            /// `insert` true the item is inserted there (`0 ≤ index ≤ len`).
            /// `None` when the index is out of range.
            pub fn with(&self, insert: bool, index: usize, item: $item) -> Option<Self> {
                if insert {
                    if index > self.items.len() {
                        return None;
                    }
                    let mut items = self.items.clone();
                    items.insert(index, item);
                    Some(Self { items })
                } else {
                    if index >= self.items.len() {
                        return None;
                    }
                    Some(Self {
                        items: self.items.update(index, item),
                    })
                }
            }

            /// A sibling with the element at `index` removed; `None` when
            /// the index is out of range.
            pub fn without(&self, index: usize) -> Option<Self> {
                if index >= self.items.len() {
                    return None;
                }
                let mut items = self.items.clone();
                items.remove(index);
                Some(Self { items })
            }

            /// The elements of `self` followed by the elements of `other`.
            pub fn concat(&self, other: &Self) -> Self {
                let mut items = self.items.clone();
                items.append(other.items.clone());
                Self { items }
            }

            /// Iterate the elements in index order.
            pub fn iter(&self) -> impl Iterator<Item = &$item> {
                self.items.iter()
            }
        }

        impl FromIterator<$item> for $name {
            fn from_iter<I: IntoIterator<Item = $item>>(iter: I) -> Self {
                Self {
                    items: iter.into_iter().collect(),
                }
            }
        }
    };
}

list_impl!(
    /// A persistent ordered sequence of scalars.
    ValueList,
    Value
);

list_impl!(
    /// A persistent ordered sequence of objects.
    ObjectList,
    Rc<Object>
);

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[i64]) -> ValueList {
        items.iter().map(|n| Value::from(*n)).collect()
    }

    #[test]
    fn replace_keeps_the_original() {
        let original = list(&[1, 2, 3]);
        let updated = original.with(false, 1, Value::from(9i64)).unwrap();
        assert_eq!(original, list(&[1, 2, 3]));
        assert_eq!(updated, list(&[1, 9, 3]));
    }

    #[test]
    fn replace_requires_an_existing_slot() {
        assert!(list(&[1]).with(false, 1, Value::default()).is_none());
        assert!(ValueList::new().with(false, 0, Value::default()).is_none());
    }

    #[test]
    fn insert_accepts_the_end_position() {
        let original = list(&[1, 2]);
        assert_eq!(
            original.with(true, 2, Value::from(3i64)).unwrap(),
            list(&[1, 2, 3])
        );
        assert_eq!(
            original.with(true, 0, Value::from(0i64)).unwrap(),
            list(&[0, 1, 2])
        );
        assert!(original.with(true, 3, Value::default()).is_none());
    }

    #[test]
    fn without_removes_one_element() {
        let original = list(&[1, 2, 3]);
        assert_eq!(original.without(1).unwrap(), list(&[1, 3]));
        assert!(original.without(3).is_none());
    }

    #[test]
    fn concat_preserves_order() {
        assert_eq!(list(&[1, 2]).concat(&list(&[3])), list(&[1, 2, 3]));
        assert_eq!(ValueList::new().concat(&list(&[])), ValueList::new());
    }

    #[test]
    fn object_lists_share_references() {
        let a = Object::string("a");
        let objects: ObjectList = [a.clone(), Object::string("b")].into_iter().collect();
        assert_eq!(objects.len(), 2);
        assert!(Rc::ptr_eq(objects.get(0).unwrap(), &a));
    }
}
