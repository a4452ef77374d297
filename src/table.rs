// Copyright (c) 2017-2021 Fabian Schuiki

//! Dense tables keyed by opaque ids.
//!
//! Backends hand out node references that are plain indices into a table they
//! own. The key types are distinct newtypes, so a reference into one table
//! cannot be used to index another by accident.

use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// An opaque key to uniquely identify a table entry.
pub trait TableKey: Copy {
    /// Create a new table key from an index.
    fn new(index: usize) -> Self;
    /// Return the index wrapped within this table key.
    fn index(self) -> usize;
}

/// Generate a new opaque table key struct.
#[macro_export]
macro_rules! impl_table_key {
    ($($(#[$m:meta])* struct $name:ident($ity:ty) as $display_prefix:expr;)*) => {
        $(
            $(#[$m])*
            #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name($ity);

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}{}", $display_prefix, self.0)
                }
            }

            impl std::fmt::Debug for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self)
                }
            }

            impl $crate::table::TableKey for $name {
                fn new(index: usize) -> Self {
                    $name(index as $ity)
                }

                fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

/// An append-only table that stores its entries densely.
///
/// Entries are never removed, which keeps every key handed out valid for the
/// lifetime of the table.
#[derive(Clone, Debug)]
pub struct Table<I, V> {
    storage: Vec<V>,
    unused: PhantomData<I>,
}

impl<I, V> Table<I, V> {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            unused: PhantomData,
        }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl<I, V> Default for Table<I, V> {
    fn default() -> Table<I, V> {
        Table::new()
    }
}

impl<I: TableKey, V> Table<I, V> {
    /// Add a new entry to the table.
    ///
    /// Returns the key under which the entry can be accessed again.
    pub fn add(&mut self, value: V) -> I {
        let index = self.storage.len();
        self.storage.push(value);
        I::new(index)
    }

    /// Get an entry from the table, if the key is in range.
    pub fn get(&self, key: I) -> Option<&V> {
        self.storage.get(key.index())
    }

    /// Return an iterator over the keys in insertion order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = I> + 'a {
        (0..self.storage.len()).map(I::new)
    }

    /// Return an iterator over the values in insertion order.
    pub fn values<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a {
        self.storage.iter()
    }
}

impl<I: TableKey, V> Index<I> for Table<I, V> {
    type Output = V;

    fn index(&self, idx: I) -> &V {
        &self.storage[idx.index()]
    }
}

impl<I: TableKey, V> IndexMut<I> for Table<I, V> {
    fn index_mut(&mut self, idx: I) -> &mut V {
        &mut self.storage[idx.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl_table_key! {
        struct Key(u32) as "k";
    }

    #[test]
    fn keys_follow_insertion_order() {
        let mut table = Table::<Key, &str>::new();
        let a = table.add("a");
        let b = table.add("b");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(table[b], "b");
        assert_eq!(format!("{}", b), "k1");
        assert_eq!(table.keys().collect::<Vec<_>>(), vec![a, b]);
        assert!(table.get(Key::new(2)).is_none());
    }
}
