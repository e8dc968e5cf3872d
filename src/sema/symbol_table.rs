// src/sema/symbol_table.rs

use indexmap::IndexMap;

use crate::frontend::ast::Symbol;
use crate::sema::defs::DefnRef;

/// Maps a name to the insertion-ordered list of definitions sharing it (the
/// overload set). Iteration yields names in first-insertion order, which the
/// diagnostic passes rely on for stable "earlier definition" reporting.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: IndexMap<Symbol, Vec<DefnRef>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: Symbol, defn: DefnRef) {
        self.entries.entry(name).or_default().push(defn);
    }

    /// The overload set for a name, in declaration order.
    pub fn get(&self, name: Symbol) -> &[DefnRef] {
        self.entries.get(&name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.entries.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &[DefnRef])> {
        self.entries.iter().map(|(name, defns)| (*name, defns.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
