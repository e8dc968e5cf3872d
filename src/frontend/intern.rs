// src/frontend/intern.rs

use rustc_hash::FxHashMap;

use crate::frontend::ast::Symbol;

/// Append-only string pool backing [`Symbol`]s.
///
/// Symbols are dense indices into the pool, so every downstream name
/// comparison (overload grouping, dispatch-slot matching) is an integer
/// compare. Nothing is ever removed; resolved strings stay valid for the
/// whole compilation.
#[derive(Debug, Default)]
pub struct Interner {
    ids: FxHashMap<Box<str>, Symbol>,
    pool: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        match self.ids.get(text) {
            Some(&sym) => sym,
            None => {
                let sym = Symbol(self.pool.len() as u32);
                let owned: Box<str> = text.into();
                self.pool.push(owned.clone());
                self.ids.insert(owned, sym);
                sym
            }
        }
    }

    /// Derive a dotted member-path name from an existing symbol. Property
    /// accessors dispatch under such names (`area.get`, `area.set`), so a
    /// re-declared accessor in a derived type lands on the same symbol as
    /// the slot it overrides.
    pub fn member_path(&mut self, base: Symbol, member: &str) -> Symbol {
        let path = format!("{}.{member}", self.resolve(base));
        self.intern(&path)
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.pool[sym.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_pools_once() {
        let mut interner = Interner::new();
        let first = interner.intern("Shape");
        let again = interner.intern("Shape");
        let other = interner.intern("Circle");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(interner.resolve(first), "Shape");
    }

    #[test]
    fn member_path_derives_accessor_names() {
        let mut interner = Interner::new();
        let area = interner.intern("area");
        let getter = interner.member_path(area, "get");

        assert_eq!(interner.resolve(getter), "area.get");
        assert_eq!(getter, interner.intern("area.get"));
        assert_ne!(getter, interner.member_path(area, "set"));
    }
}
