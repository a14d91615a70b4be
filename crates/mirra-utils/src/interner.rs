use std::{fmt, ops::Index};

use ecow::EcoString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Key of a string interned by a [`StrInterner`].
///
/// Keys are only meaningful for the interner that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StrKey(u32);

impl StrKey {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'s{}", self.0)
    }
}

/// Stores every distinct string exactly once and hands out stable keys.
///
/// Strings are kept as [`EcoString`] so resolving a key can hand out a cheap
/// clone that outlives any borrow of the interner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrInterner {
    values: IndexSet<EcoString>,
}

impl StrInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: IndexSet::with_capacity(capacity),
        }
    }

    /// Interns a string, returning its key.
    ///
    /// If the string is already interned, returns its existing key.
    pub fn intern(&mut self, value: impl AsRef<str>) -> StrKey {
        let value = value.as_ref();
        if let Some(idx) = self.values.get_index_of(value) {
            return StrKey(idx as u32);
        }
        let (idx, _) = self.values.insert_full(EcoString::from(value));
        StrKey(idx as u32)
    }

    /// Gets the string behind `key`, or `None` if the key is foreign.
    pub fn get(&self, key: StrKey) -> Option<&EcoString> {
        self.values.get_index(key.as_usize())
    }

    /// Looks up the key of an already interned string.
    pub fn lookup(&self, value: &str) -> Option<StrKey> {
        self.values.get_index_of(value).map(|idx| StrKey(idx as u32))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(EcoString::as_str)
    }
}

impl Index<StrKey> for StrInterner {
    type Output = str;

    fn index(&self, key: StrKey) -> &Self::Output {
        self.values[key.as_usize()].as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_interning() {
        let mut interner = StrInterner::new();

        let hello = interner.intern(String::from("hello"));
        let world = interner.intern("world");
        let again = interner.intern("hello");

        assert_eq!(hello, again);
        assert_ne!(hello, world);

        assert_eq!(&interner[hello], "hello");
        assert_eq!(&interner[world], "world");

        assert_eq!(interner.lookup("hello"), Some(hello));
        assert_eq!(interner.lookup("missing"), None);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn foreign_keys_resolve_to_none() {
        let mut small = StrInterner::new();
        let mut large = StrInterner::new();
        small.intern("a");
        large.intern("a");
        let key = large.intern("b");

        assert!(small.get(key).is_none());
        assert_eq!(large.get(key).map(EcoString::as_str), Some("b"));
    }

    #[test]
    fn many_values_keep_insertion_order() {
        let mut interner = StrInterner::with_capacity(8);
        let keys: Vec<_> = (0..50).map(|i| interner.intern(i.to_string())).collect();

        assert_eq!(interner.len(), 50);
        for (i, key) in keys.into_iter().enumerate() {
            assert_eq!(interner[key], i.to_string());
        }
        assert_eq!(interner.iter().next(), Some("0"));
    }
}
