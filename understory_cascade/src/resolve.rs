// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Substitution of `var()` references.
//!
//! A reference on a node is looked up in the node's own declarations
//! (inline, then rule snapshot) and otherwise in the resolved values of its
//! ancestors. Variables that reference each other, directly or through
//! fallbacks, form a cycle; every member of a cycle fails to resolve no
//! matter which one is asked for first.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;
use log::warn;
use understory_dirty::DependencyGraph;
use understory_value::{TermAtom, VariableTerm};

use crate::{PropertyDictionary, StyleDiagnostic, StyleKey};

/// Outcome of substituting a term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Every reference was replaced.
    Resolved(String),
    /// A reference led into a cycle; holds the cycle members.
    Cycle(Vec<String>),
    /// A reference could not be resolved; holds the variable name.
    Unresolved(String),
}

impl Resolution {
    /// The substituted text, if resolution succeeded.
    #[must_use]
    pub(crate) fn ok(self) -> Option<String> {
        match self {
            Self::Resolved(text) => Some(text),
            Self::Cycle(_) | Self::Unresolved(_) => None,
        }
    }
}

enum Lookup {
    Value(String),
    Failed(Resolution),
    Missing,
}

/// Resolves references for one node during one compute pass.
///
/// `inherited` answers for names the node does not declare: `Some(Some(_))`
/// for an ancestor's resolved value, `Some(None)` for an ancestor whose
/// declaration failed, `None` when no ancestor declares the name.
pub(crate) struct VariableResolver<'a, A> {
    locals: BTreeMap<&'a str, &'a VariableTerm>,
    cycles: Vec<Vec<&'a str>>,
    cache: &'a mut HashMap<String, Option<String>>,
    graph: &'a mut DependencyGraph<StyleKey>,
    diagnostics: &'a mut Vec<StyleDiagnostic>,
    inherited: A,
}

impl<'a, A> VariableResolver<'a, A>
where
    A: Fn(&str) -> Option<Option<String>>,
{
    pub(crate) fn new(
        inline: &'a PropertyDictionary,
        snapshot: &'a PropertyDictionary,
        cache: &'a mut HashMap<String, Option<String>>,
        graph: &'a mut DependencyGraph<StyleKey>,
        diagnostics: &'a mut Vec<StyleDiagnostic>,
        inherited: A,
    ) -> Self {
        let mut locals: BTreeMap<&'a str, &'a VariableTerm> = snapshot.variables().collect();
        locals.extend(inline.variables());
        let cycles = find_cycles(&locals);
        Self {
            locals,
            cycles,
            cache,
            graph,
            diagnostics,
            inherited,
        }
    }

    /// Returns `true` if the node itself declares `name`.
    pub(crate) fn is_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    fn cycle_of(&self, name: &str) -> Option<&[&'a str]> {
        self.cycles
            .iter()
            .find(|members| members.iter().any(|m| *m == name))
            .map(Vec::as_slice)
    }

    /// Raises one diagnostic for every cycle that contains one of `names`.
    pub(crate) fn report_cycles<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        let mut reported = BTreeSet::new();
        for name in names {
            let Some(idx) = self.cycles.iter().position(|m| m.iter().any(|n| *n == name)) else {
                continue;
            };
            if !reported.insert(idx) {
                continue;
            }
            let cycle: Vec<String> = self.cycles[idx].iter().map(|n| n.to_string()).collect();
            self.report(StyleDiagnostic::CyclicVariable { cycle });
        }
    }

    /// Resolves a variable the node declares, using and filling the cache.
    pub(crate) fn resolve_variable(&mut self, name: &str) -> Option<String> {
        let mut path = Vec::new();
        self.resolve_local(name, &mut path)
    }

    /// Substitutes `term` on behalf of `referrer`, returning the consulted
    /// variables through `consulted`.
    pub(crate) fn substitute(
        &mut self,
        term: &VariableTerm,
        referrer: &str,
        consulted: &mut Vec<StyleKey>,
    ) -> Resolution {
        let mut path = Vec::new();
        self.substitute_inner(term, referrer, &mut path, consulted)
    }

    /// Logs and records a diagnostic.
    pub(crate) fn report(&mut self, diagnostic: StyleDiagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Replaces the recorded dependencies of `key`.
    pub(crate) fn record(&mut self, key: StyleKey, consulted: Vec<StyleKey>) {
        self.graph.replace_dependencies(key, consulted);
    }

    fn resolve_local(&mut self, name: &str, path: &mut Vec<String>) -> Option<String> {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }
        let term = *self.locals.get(name)?;
        let key = StyleKey::Variable(name.to_string());
        let result = if self.cycle_of(name).is_some() {
            let deps: Vec<StyleKey> = term
                .references()
                .map(|r| StyleKey::Variable(r.to_string()))
                .collect();
            self.graph.replace_dependencies(key, deps);
            None
        } else {
            path.push(name.to_string());
            let mut consulted = Vec::new();
            let resolution = self.substitute_inner(term, name, path, &mut consulted);
            path.pop();
            self.graph.replace_dependencies(key, consulted);
            resolution.ok()
        };
        self.cache.insert(name.to_string(), result.clone());
        result
    }

    fn lookup(&mut self, name: &str, path: &mut Vec<String>) -> Lookup {
        if path.iter().any(|p| p == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Lookup::Failed(Resolution::Cycle(cycle));
        }
        if self.is_local(name) {
            if let Some(members) = self.cycle_of(name) {
                let cycle = members.iter().map(|n| n.to_string()).collect();
                // Still fills the cache and records edges for the member.
                self.resolve_local(name, path);
                return Lookup::Failed(Resolution::Cycle(cycle));
            }
            return match self.resolve_local(name, path) {
                Some(text) => Lookup::Value(text),
                None => Lookup::Failed(Resolution::Unresolved(name.to_string())),
            };
        }
        match (self.inherited)(name) {
            Some(Some(text)) => Lookup::Value(text),
            Some(None) => Lookup::Failed(Resolution::Unresolved(name.to_string())),
            None => Lookup::Missing,
        }
    }

    fn substitute_inner(
        &mut self,
        term: &VariableTerm,
        referrer: &str,
        path: &mut Vec<String>,
        consulted: &mut Vec<StyleKey>,
    ) -> Resolution {
        let mut out = String::new();
        for atom in term.atoms() {
            let (name, fallback) = match atom {
                TermAtom::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                TermAtom::Reference { name, fallback } => (name, fallback),
            };
            consulted.push(StyleKey::Variable(name.clone()));
            let (failure, missing) = match self.lookup(name, path) {
                Lookup::Value(text) => {
                    out.push_str(&text);
                    continue;
                }
                Lookup::Failed(failure) => (failure, false),
                Lookup::Missing => (Resolution::Unresolved(name.clone()), true),
            };
            match fallback {
                Some(fallback) => match self.substitute_inner(fallback, referrer, path, consulted) {
                    Resolution::Resolved(text) => out.push_str(&text),
                    failed => return failed,
                },
                None => {
                    if missing {
                        self.report(StyleDiagnostic::UnresolvedVariable {
                            referrer: referrer.to_string(),
                            name: name.clone(),
                        });
                    }
                    return failure;
                }
            }
        }
        Resolution::Resolved(out.trim().to_string())
    }
}

/// Groups of local variables that reach themselves, each sorted by name.
fn find_cycles<'a>(locals: &BTreeMap<&'a str, &'a VariableTerm>) -> Vec<Vec<&'a str>> {
    let reach: BTreeMap<&'a str, BTreeSet<&'a str>> = locals
        .keys()
        .map(|&name| (name, reachable(locals, name)))
        .collect();
    let mut cycles = Vec::new();
    let mut seen = BTreeSet::new();
    for (&name, targets) in &reach {
        if seen.contains(name) || !targets.contains(name) {
            continue;
        }
        let members: Vec<&'a str> = targets
            .iter()
            .copied()
            .filter(|m| reach.get(m).is_some_and(|r| r.contains(name)))
            .collect();
        seen.extend(members.iter().copied());
        cycles.push(members);
    }
    cycles
}

fn reachable<'a>(locals: &BTreeMap<&'a str, &'a VariableTerm>, start: &'a str) -> BTreeSet<&'a str> {
    let mut out = BTreeSet::new();
    let mut stack = alloc::vec![start];
    while let Some(name) = stack.pop() {
        let Some(&term) = locals.get(name) else {
            continue;
        };
        for next in term.references() {
            if let Some((&next, _)) = locals.get_key_value(next) {
                if out.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    out
}
