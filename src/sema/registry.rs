// src/sema/registry.rs
//! Central registry for all language entities.
//!
//! The registry is a per-compilation arena: definition records live in
//! vectors, ids are stable handles, and every inter-type link in the
//! semantic graph goes through an id. Cyclic type graphs (mutual bases,
//! mutually-typed fields) therefore never create ownership cycles;
//! structural recursion during analysis is broken by the pass registry's
//! `running` bit.

use rustc_hash::FxHashSet;

use crate::frontend::ast::Symbol;
use crate::identity::{FieldDefId, FunctionDefId, PropertyDefId, TypeDefId};
use crate::sema::defs::{
    DefnKind, DefnRef, FieldDefn, FunctionDefn, PropertyDefn, TypeDefn,
};
use crate::sema::symbol_table::SymbolTable;

/// The compilation's single module: the top-level name scope plus the
/// append-only set of symbols the module must emit or import.
#[derive(Debug, Default)]
pub struct Module {
    pub scope: SymbolTable,
    exports: FxHashSet<DefnRef>,
}

impl Module {
    pub fn add_symbol(&mut self, defn: DefnRef) {
        self.exports.insert(defn);
    }

    pub fn exports(&self) -> &FxHashSet<DefnRef> {
        &self.exports
    }
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    type_defns: Vec<TypeDefn>,
    function_defns: Vec<FunctionDefn>,
    field_defns: Vec<FieldDefn>,
    property_defns: Vec<PropertyDefn>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, build: impl FnOnce(TypeDefId) -> TypeDefn) -> TypeDefId {
        let id = TypeDefId::new(self.type_defns.len() as u32);
        self.type_defns.push(build(id));
        id
    }

    pub fn add_function(&mut self, build: impl FnOnce(FunctionDefId) -> FunctionDefn) -> FunctionDefId {
        let id = FunctionDefId::new(self.function_defns.len() as u32);
        self.function_defns.push(build(id));
        id
    }

    pub fn add_field(&mut self, build: impl FnOnce(FieldDefId) -> FieldDefn) -> FieldDefId {
        let id = FieldDefId::new(self.field_defns.len() as u32);
        self.field_defns.push(build(id));
        id
    }

    pub fn add_property(&mut self, build: impl FnOnce(PropertyDefId) -> PropertyDefn) -> PropertyDefId {
        let id = PropertyDefId::new(self.property_defns.len() as u32);
        self.property_defns.push(build(id));
        id
    }

    pub fn type_defn(&self, id: TypeDefId) -> &TypeDefn {
        &self.type_defns[id.index() as usize]
    }

    pub fn type_defn_mut(&mut self, id: TypeDefId) -> &mut TypeDefn {
        &mut self.type_defns[id.index() as usize]
    }

    pub fn function(&self, id: FunctionDefId) -> &FunctionDefn {
        &self.function_defns[id.index() as usize]
    }

    pub fn function_mut(&mut self, id: FunctionDefId) -> &mut FunctionDefn {
        &mut self.function_defns[id.index() as usize]
    }

    pub fn field(&self, id: FieldDefId) -> &FieldDefn {
        &self.field_defns[id.index() as usize]
    }

    pub fn field_mut(&mut self, id: FieldDefId) -> &mut FieldDefn {
        &mut self.field_defns[id.index() as usize]
    }

    pub fn property(&self, id: PropertyDefId) -> &PropertyDefn {
        &self.property_defns[id.index() as usize]
    }

    pub fn property_mut(&mut self, id: PropertyDefId) -> &mut PropertyDefn {
        &mut self.property_defns[id.index() as usize]
    }

    /// Discriminant of an arbitrary definition, for conflict checking.
    pub fn defn_kind(&self, defn: DefnRef) -> DefnKind {
        match defn {
            DefnRef::Type(_) => DefnKind::Type,
            DefnRef::Function(_) => DefnKind::Function,
            DefnRef::Field(id) => match self.field(id).binding {
                crate::frontend::ast::Binding::Var => DefnKind::Var,
                crate::frontend::ast::Binding::Let => DefnKind::Let,
            },
            DefnRef::Property(id) => match self.property(id).kind {
                crate::frontend::ast::PropertyKind::Property => DefnKind::Property,
                crate::frontend::ast::PropertyKind::Indexer => DefnKind::Indexer,
            },
        }
    }

    pub fn defn_name(&self, defn: DefnRef) -> Symbol {
        match defn {
            DefnRef::Type(id) => self.type_defn(id).name,
            DefnRef::Function(id) => self.function(id).name,
            DefnRef::Field(id) => self.field(id).name,
            DefnRef::Property(id) => self.property(id).name,
        }
    }

    pub fn defn_span(&self, defn: DefnRef) -> crate::frontend::Span {
        match defn {
            DefnRef::Type(id) => self.type_defn(id).span,
            DefnRef::Function(id) => self.function(id).span,
            DefnRef::Field(id) => self.field(id).span,
            DefnRef::Property(id) => self.property(id).span,
        }
    }

    /// Every transitive ancestor composite of `id`, in deterministic
    /// discovery order (pre-order over the base lists).
    pub fn ancestors_in_order(&self, id: TypeDefId) -> Vec<TypeDefId> {
        fn walk(
            registry: &EntityRegistry,
            id: TypeDefId,
            order: &mut Vec<TypeDefId>,
            seen: &mut FxHashSet<TypeDefId>,
        ) {
            for &base in &registry.type_defn(id).composite.bases {
                if seen.insert(base) {
                    order.push(base);
                    walk(registry, base, order, seen);
                }
            }
        }

        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        walk(self, id, &mut order, &mut seen);
        order
    }

    /// Search the base graph for an existing dispatch table implementing
    /// `interface`. The nearest one wins; its entries seed the derived
    /// type's own table.
    pub fn find_base_implementation(
        &self,
        id: TypeDefId,
        interface: TypeDefId,
    ) -> Option<Vec<FunctionDefId>> {
        for &base in &self.type_defn(id).composite.bases {
            if let Some(itable) = self.type_defn(base).composite.itable_for(interface) {
                return Some(itable.methods.clone());
            }
            if let Some(methods) = self.find_base_implementation(base, interface) {
                return Some(methods);
            }
        }
        None
    }

    /// The constructor callable with no arguments, if the type has one.
    pub fn default_constructor(&self, id: TypeDefId) -> Option<FunctionDefId> {
        self.type_defn(id)
            .composite
            .member_order
            .iter()
            .filter_map(|defn| match defn {
                DefnRef::Function(f) => Some(*f),
                _ => None,
            })
            .find(|&f| {
                let func = self.function(f);
                func.is_ctor() && func.is_default_callable()
            })
    }

    /// Instance fields of `id` plus all of its supertypes, excluding
    /// reserved super slots.
    pub fn recursive_field_count(&self, id: TypeDefId) -> usize {
        let composite = &self.type_defn(id).composite;
        let own = composite
            .instance_fields
            .iter()
            .filter(|slot| slot.is_some())
            .count();
        match composite.super_type {
            Some(super_id) => own + self.recursive_field_count(super_id),
            None => own,
        }
    }
}
