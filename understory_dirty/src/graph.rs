// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional dependency graph.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

/// "A depends on B" edges, indexed both ways.
///
/// `DependencyGraph` answers "what does A depend on?" and "what depends on
/// A?" without scanning. Keys may be owned values (for example a name or a
/// tagged enum); they are cloned into both indices.
///
/// Cycles are permitted. Edges are recorded exactly as observed by the
/// caller, and traversal ([`transitive_dependents`](Self::transitive_dependents))
/// visits each key at most once, so a cycle terminates.
///
/// # Example
///
/// ```
/// use understory_dirty::DependencyGraph;
///
/// let mut graph = DependencyGraph::<&str>::new();
///
/// // `b` was computed from `a`, `c` from `b`.
/// graph.replace_dependencies("b", ["a"]);
/// graph.replace_dependencies("c", ["b"]);
///
/// assert!(graph.dependents(&"a").any(|k| *k == "b"));
/// let transitive = graph.transitive_dependents(&"a");
/// assert_eq!(transitive.len(), 2);
///
/// // Recomputing `c` without `b` drops the old edge.
/// graph.replace_dependencies("c", []);
/// assert_eq!(graph.transitive_dependents(&"a"), ["b"]);
/// ```
#[derive(Clone, Debug)]
pub struct DependencyGraph<K>
where
    K: Clone + Eq + Hash,
{
    /// forward[key] -> keys that `key` depends on.
    forward: HashMap<K, Vec<K>>,
    /// reverse[key] -> keys that depend on `key`.
    reverse: HashMap<K, Vec<K>>,
}

impl<K> Default for DependencyGraph<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DependencyGraph<K>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Returns `true` if the graph holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Replaces all direct dependencies of `from`.
    ///
    /// Duplicate keys in `to` are ignored. Returns `true` if the dependency
    /// set changed.
    pub fn replace_dependencies(&mut self, from: K, to: impl IntoIterator<Item = K>) -> bool {
        let mut new_set: Vec<K> = Vec::new();
        for k in to {
            if !new_set.contains(&k) {
                new_set.push(k);
            }
        }

        let old = self.forward.get(&from).map_or(&[][..], Vec::as_slice);
        let unchanged = old.len() == new_set.len() && old.iter().all(|dep| new_set.contains(dep));
        if unchanged {
            return false;
        }

        let old = self.forward.remove(&from).unwrap_or_default();
        for dep in &old {
            if !new_set.contains(dep) {
                self.unlink_reverse(dep, &from);
            }
        }
        for dep in &new_set {
            if !old.contains(dep) {
                self.reverse.entry(dep.clone()).or_default().push(from.clone());
            }
        }
        if !new_set.is_empty() {
            self.forward.insert(from, new_set);
        }
        true
    }

    fn unlink_reverse(&mut self, dep: &K, from: &K) {
        if let Some(dependents) = self.reverse.get_mut(dep) {
            dependents.retain(|k| k != from);
            if dependents.is_empty() {
                self.reverse.remove(dep);
            }
        }
    }

    /// Removes a key entirely, both as a dependent and as a dependency.
    pub fn remove_key(&mut self, key: &K) {
        if let Some(deps) = self.forward.remove(key) {
            for dep in &deps {
                self.unlink_reverse(dep, key);
            }
        }
        if let Some(dependents) = self.reverse.remove(key) {
            for dependent in &dependents {
                if let Some(deps) = self.forward.get_mut(dependent) {
                    deps.retain(|k| k != key);
                    if deps.is_empty() {
                        self.forward.remove(dependent);
                    }
                }
            }
        }
    }

    /// Removes every edge.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// Direct dependencies of `key`.
    pub fn dependencies(&self, key: &K) -> impl Iterator<Item = &K> + '_ {
        self.forward.get(key).into_iter().flatten()
    }

    /// Direct dependents of `key`.
    pub fn dependents(&self, key: &K) -> impl Iterator<Item = &K> + '_ {
        self.reverse.get(key).into_iter().flatten()
    }

    /// Returns `true` if anything depends on `key`.
    #[must_use]
    pub fn has_dependents(&self, key: &K) -> bool {
        self.reverse.contains_key(key)
    }

    /// All keys reachable through dependent edges from `key`, in DFS order.
    ///
    /// Each key is visited once. `key` itself is only included when a
    /// cycle leads back to it.
    #[must_use]
    pub fn transitive_dependents(&self, key: &K) -> Vec<K> {
        let mut out = Vec::new();
        self.for_each_transitive_dependent(key, |k| out.push(k.clone()));
        out
    }

    /// Calls `f` on every transitive dependent of `key`, each once.
    pub fn for_each_transitive_dependent(&self, key: &K, mut f: impl FnMut(&K)) {
        let mut visited: HashSet<&K> = HashSet::new();
        let mut stack: Vec<&K> = self.dependents(key).collect();
        while let Some(next) = stack.pop() {
            if visited.insert(next) {
                f(next);
                stack.extend(self.dependents(next));
            }
        }
    }
}
