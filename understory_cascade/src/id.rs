// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers for properties, shorthands and style keys.

use alloc::string::String;
use core::fmt;

use smallvec::SmallVec;

/// Compact identifier of a registered longhand property.
///
/// Ids are assigned by a [`PropertyRegistry`](crate::PropertyRegistry) in
/// registration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates an id from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Index into registry tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compact identifier of a registered shorthand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShorthandId(u16);

impl ShorthandId {
    /// Creates an id from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Index into registry tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Anything that is resolved, tracked for dependencies and marked dirty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKey {
    /// A longhand property.
    Property(PropertyId),
    /// A shorthand declared with a variable term.
    Shorthand(ShorthandId),
    /// A custom variable, by name including its leading `--`.
    Variable(String),
}

impl From<PropertyId> for StyleKey {
    fn from(id: PropertyId) -> Self {
        Self::Property(id)
    }
}

impl From<ShorthandId> for StyleKey {
    fn from(id: ShorthandId) -> Self {
        Self::Shorthand(id)
    }
}

/// A set of [`PropertyId`]s stored as a bit set.
///
/// ```rust
/// use understory_cascade::{PropertyId, PropertyIdSet};
///
/// let mut set = PropertyIdSet::new();
/// assert!(set.insert(PropertyId::new(3)));
/// assert!(set.insert(PropertyId::new(70)));
/// assert!(!set.insert(PropertyId::new(3)));
/// assert_eq!(set.iter().collect::<Vec<_>>(), [PropertyId::new(3), PropertyId::new(70)]);
/// ```
#[derive(Clone, Default)]
pub struct PropertyIdSet {
    words: SmallVec<[u64; 2]>,
}

impl PropertyIdSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id`; returns `true` if it was not present.
    pub fn insert(&mut self, id: PropertyId) -> bool {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & (1 << bit) != 0;
        self.words[word] |= 1 << bit;
        !was_set
    }

    /// Removes `id`; returns `true` if it was present.
    pub fn remove(&mut self, id: PropertyId) -> bool {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        match self.words.get_mut(word) {
            Some(w) if *w & (1 << bit) != 0 => {
                *w &= !(1 << bit);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of ids in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates over ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut bits = word;
            core::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "ids were inserted from u16 values"
                )]
                let id = PropertyId::new((i * 64 + bit) as u16);
                Some(id)
            })
        })
    }

    /// Adds every id of `other`.
    pub fn union_with(&mut self, other: &Self) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }
}

impl PartialEq for PropertyIdSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for PropertyIdSet {}

impl Extend<PropertyId> for PropertyIdSet {
    fn extend<T: IntoIterator<Item = PropertyId>>(&mut self, iter: T) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl FromIterator<PropertyId> for PropertyIdSet {
    fn from_iter<T: IntoIterator<Item = PropertyId>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl fmt::Debug for PropertyIdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(PropertyId::index)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let mut a: PropertyIdSet = [1, 2, 64].into_iter().map(PropertyId::new).collect();
        assert_eq!(a.len(), 3);
        assert!(a.contains(PropertyId::new(64)));
        assert!(!a.contains(PropertyId::new(200)));
        assert!(a.remove(PropertyId::new(2)));
        assert!(!a.remove(PropertyId::new(2)));

        let b: PropertyIdSet = [5].into_iter().map(PropertyId::new).collect();
        a.union_with(&b);
        let ids: alloc::vec::Vec<usize> = a.iter().map(PropertyId::index).collect();
        assert_eq!(ids, [1, 5, 64]);
    }

    #[test]
    fn empty_after_removal() {
        let mut set = PropertyIdSet::new();
        set.insert(PropertyId::new(9));
        set.remove(PropertyId::new(9));
        assert!(set.is_empty());
    }
}
