// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Dirty: generic dirty-tracking and invalidation primitives.
//!
//! This crate provides the two building blocks an incremental cascade needs
//! to re-resolve only what changed:
//!
//! - **Dependency graphs** ([`DependencyGraph`]): "A was computed from B"
//!   edges, indexed in both directions. Edges of a key are replaced
//!   wholesale whenever that key is recomputed, so the graph always mirrors
//!   what was actually consulted. Cycles are tolerated.
//! - **Dirty sets** ([`DirtySet`]): accumulated dirty keys plus coarse
//!   [`DirtyFlags`], with a generation counter for stale-computation
//!   detection.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_dirty::{DependencyGraph, DirtySet};
//!
//! let mut graph = DependencyGraph::<&str>::new();
//! let mut dirty = DirtySet::<&str>::new();
//!
//! // `--b` was resolved through `--a`; `color` through `--b`.
//! graph.replace_dependencies("--b", ["--a"]);
//! graph.replace_dependencies("color", ["--b"]);
//!
//! // Editing `--a` marks it and everything computed from it.
//! dirty.mark("--a");
//! graph.for_each_transitive_dependent(&"--a", |k| {
//!     dirty.mark(*k);
//! });
//!
//! assert!(dirty.is_dirty(&"--b"));
//! assert!(dirty.is_dirty(&"color"));
//! assert_eq!(dirty.len(), 3);
//! ```
//!
//! Keys may be owned values such as strings or tagged enums; both types only
//! require `Eq + Hash` (plus `Clone` for the graph).
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod graph;
mod set;

pub use graph::DependencyGraph;
pub use set::{DirtyFlags, DirtySet};
