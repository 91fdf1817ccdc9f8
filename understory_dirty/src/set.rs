// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty set: accumulated dirty keys plus coarse flags.

use alloc::vec::Vec;
use core::hash::Hash;

use bitflags::bitflags;
use hashbrown::HashSet;

bitflags! {
    /// Coarse dirty state that is not tied to a single key.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Some variable changed; dependents still need to be located.
        const VARIABLES = 1 << 0;
        /// Every inherited value must be refreshed from the parent.
        const INHERITED = 1 << 1;
        /// The matched definition must be refreshed.
        const DEFINITION = 1 << 2;
    }
}

/// Accumulated dirty keys with generation tracking.
///
/// The generation counter increments on every mutation and can be used to
/// detect whether anything was marked since a previous observation.
///
/// # Example
///
/// ```
/// use understory_dirty::{DirtyFlags, DirtySet};
///
/// let mut dirty = DirtySet::<u32>::new();
/// assert!(dirty.mark(1));
/// assert!(!dirty.mark(1));
/// dirty.set_flags(DirtyFlags::INHERITED);
///
/// assert!(dirty.is_dirty(&1));
/// assert!(dirty.flags().contains(DirtyFlags::INHERITED));
///
/// let keys: Vec<_> = dirty.drain().collect();
/// assert_eq!(keys, [1]);
/// assert!(!dirty.is_dirty(&1));
/// // Draining keys leaves the flags alone.
/// assert!(!dirty.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct DirtySet<K>
where
    K: Eq + Hash,
{
    keys: HashSet<K>,
    flags: DirtyFlags,
    generation: u64,
}

impl<K> Default for DirtySet<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DirtySet<K>
where
    K: Eq + Hash,
{
    /// Creates an empty dirty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
            flags: DirtyFlags::empty(),
            generation: 0,
        }
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Marks a key dirty. Returns `true` if it was not already dirty.
    pub fn mark(&mut self, key: K) -> bool {
        self.bump();
        self.keys.insert(key)
    }

    /// Marks every key in `keys` dirty.
    pub fn mark_all(&mut self, keys: impl IntoIterator<Item = K>) {
        self.bump();
        self.keys.extend(keys);
    }

    /// Returns `true` if `key` is dirty.
    #[must_use]
    pub fn is_dirty(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Sets coarse flags.
    pub fn set_flags(&mut self, flags: DirtyFlags) {
        self.bump();
        self.flags |= flags;
    }

    /// Clears coarse flags, returning which of them were set.
    pub fn take_flags(&mut self, flags: DirtyFlags) -> DirtyFlags {
        let taken = self.flags & flags;
        if !taken.is_empty() {
            self.bump();
            self.flags.remove(taken);
        }
        taken
    }

    /// Current coarse flags.
    #[must_use]
    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    /// Returns `true` if no key is dirty and no flag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.flags.is_empty()
    }

    /// Number of dirty keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Iterates over dirty keys in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.keys.iter()
    }

    /// Removes and returns the dirty keys that satisfy `pred`.
    pub fn take_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> Vec<K> {
        let taken: Vec<K> = self.keys.extract_if(|k| pred(k)).collect();
        if !taken.is_empty() {
            self.bump();
        }
        taken
    }

    /// Removes and yields every dirty key. Flags are kept.
    pub fn drain(&mut self) -> impl Iterator<Item = K> + '_ {
        self.bump();
        self.keys.drain()
    }

    /// Clears keys and flags.
    pub fn clear(&mut self) {
        self.bump();
        self.keys.clear();
        self.flags = DirtyFlags::empty();
    }

    /// Removes a single key.
    pub fn remove_key(&mut self, key: &K) -> bool {
        self.bump();
        self.keys.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_tracks_mutation() {
        let mut dirty = DirtySet::<u32>::new();
        let g0 = dirty.generation();
        dirty.mark(1);
        assert!(dirty.generation() > g0);
        let g1 = dirty.generation();
        assert!(dirty.is_dirty(&1));
        assert_eq!(dirty.generation(), g1);
    }

    #[test]
    fn take_where_partitions() {
        let mut dirty = DirtySet::<u32>::new();
        dirty.mark_all([1, 2, 3, 4]);
        let mut even = dirty.take_where(|k| k % 2 == 0);
        even.sort_unstable();
        assert_eq!(even, [2, 4]);
        assert_eq!(dirty.len(), 2);
        assert!(dirty.is_dirty(&1));
        assert!(!dirty.is_dirty(&2));
    }

    #[test]
    fn flags_are_independent_of_keys() {
        let mut dirty = DirtySet::<u32>::new();
        dirty.set_flags(DirtyFlags::VARIABLES | DirtyFlags::DEFINITION);
        assert!(!dirty.is_empty());
        assert_eq!(dirty.take_flags(DirtyFlags::VARIABLES), DirtyFlags::VARIABLES);
        assert_eq!(dirty.take_flags(DirtyFlags::VARIABLES), DirtyFlags::empty());
        assert_eq!(dirty.flags(), DirtyFlags::DEFINITION);
        dirty.clear();
        assert!(dirty.is_empty());
    }
}
