use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tmbasic_types::Value;

use super::Object;

/// An object used as a map key. Hashing and equality follow the object's
/// contents; the object graph is acyclic, so both terminate.
#[derive(Debug, Clone)]
pub struct ObjectKey(pub Rc<Object>);

impl PartialEq for ObjectKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for ObjectKey {}

impl Hash for ObjectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

macro_rules! map_impl {
    ($(#[$doc:meta])* $name:ident, $key:ty, $val:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            entries: im::HashMap<$key, $val>,
        }

        impl $name {
            /// An empty map.
            pub fn new() -> Self {
                Self::default()
            }

            /// Number of entries.
            pub fn len(&self) -> usize {
                self.entries.len()
            }

            /// Whether the map has no entries.
            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            /// The value stored under a key.
            pub fn get(&self, key: &$key) -> Option<&$val> {
                self.entries.get(key)
            }

            /// Whether a key is present.
            pub fn contains_key(&self, key: &$key) -> bool {
                self.entries.contains_key(key)
            }

            /// A sibling with `key` bound to `value`, replacing any
            /// previous binding.
            pub fn with(&self, key: $key, value: $val) -> Self {
                Self {
                    entries: self.entries.update(key, value),
                }
            }

            /// A sibling with `key` unbound; unchanged if absent.
            pub fn without(&self, key: &$key) -> Self {
                Self {
                    entries: self.entries.without(key),
                }
            }

            /// Iterate the entries. The order is unspecified but stable for
            /// a given set of keys.
            pub fn iter(&self) -> impl Iterator<Item = (&$key, &$val)> {
                self.entries.iter()
            }
        }

        impl FromIterator<($key, $val)> for $name {
            fn from_iter<I: IntoIterator<Item = ($key, $val)>>(iter: I) -> Self {
                Self {
                    entries: iter.into_iter().collect(),
                }
            }
        }

        impl Hash for $name {
            // Entry order is structure-dependent; combine per-entry hashes
            // commutatively so equal maps hash equally.
            fn hash<H: Hasher>(&self, state: &mut H) {
                let mut combined: u64 = 0;
                for entry in self.entries.iter() {
                    let mut entry_hasher = DefaultHasher::new();
                    entry.hash(&mut entry_hasher);
                    combined ^= entry_hasher.finish();
                }
                state.write_usize(self.entries.len());
                state.write_u64(combined);
            }
        }
    };
}

map_impl!(
    /// A persistent map from scalar keys to scalar values.
    ValueToValueMap,
    Value,
    Value
);

map_impl!(
    /// A persistent map from scalar keys to objects.
    ValueToObjectMap,
    Value,
    Rc<Object>
);

map_impl!(
    /// A persistent map from object keys to scalar values.
    ObjectToValueMap,
    ObjectKey,
    Value
);

map_impl!(
    /// A persistent map from object keys to objects.
    ObjectToObjectMap,
    ObjectKey,
    Rc<Object>
);
