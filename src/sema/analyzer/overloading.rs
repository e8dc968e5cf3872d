// src/sema/analyzer/overloading.rs
//! Dispatch-table construction: the instance method table (vtable), the
//! per-interface tables (itables), override and hide resolution, and the
//! abstract-method completeness check.

use rustc_hash::FxHashSet;

use crate::errors::SemanticError;
use crate::frontend::ast::StorageClass;
use crate::identity::{FunctionDefId, PropertyDefId, TypeDefId};
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::compatibility::{can_override, same_signature};
use crate::sema::composite::{CompositeKind, InterfaceTable};
use crate::sema::defs::DefnRef;
use crate::sema::function_analyzer::FunctionAnalyzer;
use crate::sema::passes::{AnalysisTask, Pass};

/// Which dispatch table an override operation targets.
#[derive(Clone, Copy)]
enum TableRef {
    VTable,
    ITable(usize),
}

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_overloading(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Overloading) {
            return true;
        }

        // Every base's own dispatch tables must exist first.
        let bases = self.composite().bases.to_vec();
        for base in bases {
            ClassAnalyzer::new(self.comp, base).analyze(AnalysisTask::PrepEvaluation);
        }

        self.copy_base_class_methods();
        self.create_interface_tables();
        let mut success = self.override_members();
        success &= self.add_new_methods();
        success &= self.check_for_required_methods();

        self.composite_mut().passes.finish(Pass::Overloading);
        success
    }

    /// 4.6.1 — Seed the vtable with the super's methods in slot order, so
    /// that inherited methods keep their dispatch indices. Interfaces and
    /// structs without a super inherit from their first base instead.
    fn copy_base_class_methods(&mut self) {
        let composite = self.composite();
        let super_class = composite.super_type.or_else(|| {
            if matches!(
                composite.kind,
                CompositeKind::Interface | CompositeKind::Struct
            ) {
                composite.bases.first().copied()
            } else {
                None
            }
        });

        if let Some(super_id) = super_class {
            let inherited = self
                .comp
                .registry
                .type_defn(super_id)
                .composite
                .instance_methods
                .clone();
            self.composite_mut().instance_methods.extend(inherited);
        }
    }

    /// 4.6.2 — Allocate one dispatch table per implemented interface. An
    /// ancestor that is the first parent of another ancestor shares that
    /// type's itable and gets none of its own.
    fn create_interface_tables(&mut self) {
        let ancestors = self.comp.registry.ancestors_in_order(self.target);

        let mut shared: FxHashSet<TypeDefId> = FxHashSet::default();
        for &id in ancestors.iter().chain(std::iter::once(&self.target)) {
            if let Some(&first) = self.comp.registry.type_defn(id).composite.bases.first() {
                shared.insert(first);
            }
        }

        for itype in ancestors {
            if shared.contains(&itype) {
                continue;
            }
            if self.comp.registry.type_defn(itype).composite.kind != CompositeKind::Interface {
                continue;
            }

            // A base that already implements this interface supplies the
            // starting entries; otherwise the interface's own vtable does.
            let methods = self
                .comp
                .registry
                .find_base_implementation(self.target, itype)
                .unwrap_or_else(|| {
                    self.comp
                        .registry
                        .type_defn(itype)
                        .composite
                        .instance_methods
                        .clone()
                });
            debug_assert_eq!(
                methods.len(),
                self.comp
                    .registry
                    .type_defn(itype)
                    .composite
                    .instance_methods
                    .len()
            );
            self.composite_mut().interfaces.push(InterfaceTable {
                interface: itype,
                methods,
            });
        }
    }

    /// 4.6.3 — For every member name, replace override-compatible slots in
    /// the vtable and all itables with this type's definitions.
    fn override_members(&mut self) -> bool {
        let mut success = true;
        let groups: Vec<Vec<DefnRef>> = self
            .composite()
            .members
            .iter()
            .map(|(_, defns)| defns.to_vec())
            .collect();

        for defns in groups {
            let mut methods: Vec<FunctionDefId> = Vec::new();
            let mut getters: Vec<FunctionDefId> = Vec::new();
            let mut setters: Vec<FunctionDefId> = Vec::new();
            let mut prop: Option<PropertyDefId> = None;

            for defn in defns {
                match defn {
                    DefnRef::Function(func_id) => {
                        let func = self.comp.registry.function(func_id);
                        if !func.is_singular() {
                            continue;
                        }
                        self.comp.module.add_symbol(DefnRef::Function(func_id));
                        let func = self.comp.registry.function(func_id);
                        if func.storage == StorageClass::Instance && !func.is_ctor() {
                            methods.push(func_id);
                        }
                    }
                    DefnRef::Property(prop_id) => {
                        let property = self.comp.registry.property(prop_id);
                        if property.storage != StorageClass::Instance
                            || !property.is_singular()
                        {
                            continue;
                        }
                        prop = Some(prop_id);
                        let getter = property.getter;
                        let setter = property.setter;
                        if let Some(getter) = getter {
                            FunctionAnalyzer::new(self.comp, getter)
                                .analyze(AnalysisTask::PrepTypeGeneration);
                            getters.push(getter);
                        }
                        if let Some(setter) = setter {
                            FunctionAnalyzer::new(self.comp, setter)
                                .analyze(AnalysisTask::PrepTypeGeneration);
                            setters.push(setter);
                        }
                    }
                    _ => {}
                }
            }

            let itable_count = self.composite().interfaces.len();

            if !methods.is_empty() {
                success &= self.ensure_unique_signatures(&methods);
                self.override_into_table(TableRef::VTable, &methods, true);
                for i in 0..itable_count {
                    // Interface slots are never "hidden"; an unmatched name
                    // there simply keeps the inherited entry.
                    self.override_into_table(TableRef::ITable(i), &methods, false);
                }
            }

            if let Some(prop) = prop {
                if !getters.is_empty() {
                    success &= self.ensure_unique_signatures(&getters);
                    self.override_accessors_into_table(TableRef::VTable, prop, &getters, true);
                    for i in 0..itable_count {
                        self.override_accessors_into_table(
                            TableRef::ITable(i),
                            prop,
                            &getters,
                            false,
                        );
                    }
                }
                if !setters.is_empty() {
                    success &= self.ensure_unique_signatures(&setters);
                    self.override_accessors_into_table(TableRef::VTable, prop, &setters, true);
                    for i in 0..itable_count {
                        self.override_accessors_into_table(
                            TableRef::ITable(i),
                            prop,
                            &setters,
                            false,
                        );
                    }
                }
            }
        }

        success
    }

    fn ensure_unique_signatures(&mut self, methods: &[FunctionDefId]) -> bool {
        let mut success = true;
        for (i, &earlier) in methods.iter().enumerate() {
            for &later in &methods[i + 1..] {
                if same_signature(&self.comp.registry, earlier, later) {
                    let span = self.comp.registry.function(later).span;
                    let earlier_span = self.comp.registry.function(earlier).span;
                    self.error(
                        SemanticError::SignatureConflict { span: span.into() },
                        span,
                    );
                    self.info("from here", earlier_span);
                    success = false;
                }
            }
        }
        success
    }

    fn table_methods(&self, table: TableRef) -> Vec<FunctionDefId> {
        match table {
            TableRef::VTable => self.composite().instance_methods.clone(),
            TableRef::ITable(i) => self.composite().interfaces[i].methods.clone(),
        }
    }

    fn store_table(&mut self, table: TableRef, methods: Vec<FunctionDefId>) {
        match table {
            TableRef::VTable => self.composite_mut().instance_methods = methods,
            TableRef::ITable(i) => self.composite_mut().interfaces[i].methods = methods,
        }
    }

    fn override_into_table(
        &mut self,
        table: TableRef,
        overrides: &[FunctionDefId],
        can_hide: bool,
    ) {
        let name = self.comp.registry.function(overrides[0]).name;
        let mut methods = self.table_methods(table);

        for i in 0..methods.len() {
            let old = methods[i];
            if self.comp.registry.function(old).name != name {
                continue;
            }

            let replacement = overrides
                .iter()
                .copied()
                .find(|&new| can_override(&self.comp.registry, new, old));

            if let Some(new) = replacement {
                methods[i] = new;
                if can_hide && self.comp.registry.function(new).dispatch_index < 0 {
                    self.comp.registry.function_mut(new).dispatch_index = i as i32;
                }

                let old_fn = self.comp.registry.function(old);
                if old_fn.has_body() && !self.comp.registry.function(new).is_override() {
                    let method_name = self.comp.name(name).to_string();
                    let base = self
                        .comp
                        .type_name(self.comp.registry.function(old).defined_in);
                    let span = self.comp.registry.function(new).span;
                    self.warn(
                        SemanticError::OverrideMissingKeyword {
                            name: method_name,
                            base,
                            span: span.into(),
                        },
                        span,
                    );
                }

                let new_fn = self.comp.registry.function_mut(new);
                if !new_fn.overridden.contains(&old) {
                    new_fn.overridden.push(old);
                }
            } else if can_hide && self.comp.registry.function(old).has_body() {
                let old_fn = self.comp.registry.function(old);
                let hidden_name = self.comp.name(name).to_string();
                let span = old_fn.span;
                self.warn(
                    SemanticError::HiddenMember {
                        name: hidden_name,
                        span: span.into(),
                    },
                    span,
                );
                for &hiding in overrides {
                    let qualified = self.comp.registry.function(hiding).qualified_name.clone();
                    let hiding_span = self.comp.registry.function(hiding).span;
                    self.info(format!("by '{qualified}'"), hiding_span);
                }
            }
        }

        self.store_table(table, methods);
    }

    /// Accessors are matched like methods, additionally keyed by the name
    /// of the property that owns them.
    fn override_accessors_into_table(
        &mut self,
        table: TableRef,
        prop: PropertyDefId,
        accessors: &[FunctionDefId],
        can_hide: bool,
    ) {
        let name = self.comp.registry.function(accessors[0]).name;
        let prop_name = self.comp.registry.property(prop).name;
        let mut methods = self.table_methods(table);

        for i in 0..methods.len() {
            let old = methods[i];
            let old_fn = self.comp.registry.function(old);
            let Some((old_prop, _)) = old_fn.owning_property else {
                continue;
            };
            if old_fn.name != name || self.comp.registry.property(old_prop).name != prop_name {
                continue;
            }

            let replacement = accessors
                .iter()
                .copied()
                .find(|&new| can_override(&self.comp.registry, new, old));

            if let Some(new) = replacement {
                methods[i] = new;
                if can_hide && self.comp.registry.function(new).dispatch_index < 0 {
                    self.comp.registry.function_mut(new).dispatch_index = i as i32;
                }
                let new_fn = self.comp.registry.function_mut(new);
                if !new_fn.overridden.contains(&old) {
                    new_fn.overridden.push(old);
                }
            } else {
                let accessor_name = self.comp.name(name).to_string();
                let span = self.comp.registry.function(old).span;
                self.warn(
                    SemanticError::IncompatibleAccessorOverride {
                        name: accessor_name,
                        span: span.into(),
                    },
                    span,
                );
                for &hiding in accessors {
                    let qualified = self.comp.registry.function(hiding).qualified_name.clone();
                    let hiding_span = self.comp.registry.function(hiding).span;
                    self.info(format!("by '{qualified}'"), hiding_span);
                }
            }
        }

        self.store_table(table, methods);
    }

    /// 4.6.4 — Methods of this type that override nothing get fresh vtable
    /// slots. Final methods are dispatched statically and never enter the
    /// table; constructors never dispatch virtually at all.
    fn add_new_methods(&mut self) -> bool {
        let mut success = true;
        let members = self.composite().member_order.clone();

        for member in members {
            match member {
                DefnRef::Function(func_id) => {
                    let func = self.comp.registry.function(func_id);
                    if func.storage != StorageClass::Instance || !func.is_singular() {
                        continue;
                    }

                    if func.is_undefined()
                        && func.overridden.is_empty()
                        && (!func.is_ctor() || !func.params.is_empty())
                    {
                        let name = self.comp.name(func.name).to_string();
                        let span = func.span;
                        self.error(
                            SemanticError::UndefWithoutOverride {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                        success = false;
                    }

                    let func = self.comp.registry.function(func_id);
                    if !func.is_ctor() && !func.is_final() && func.dispatch_index < 0 {
                        self.append_to_vtable(func_id);
                    }
                }
                DefnRef::Property(prop_id) => {
                    let property = self.comp.registry.property(prop_id);
                    if property.storage != StorageClass::Instance || !property.is_singular() {
                        continue;
                    }
                    let accessors: Vec<FunctionDefId> =
                        property.getter.into_iter().chain(property.setter).collect();
                    for accessor in accessors {
                        let func = self.comp.registry.function(accessor);
                        if !func.is_final() && func.dispatch_index < 0 {
                            self.append_to_vtable(accessor);
                        }
                    }
                }
                _ => {}
            }
        }

        success
    }

    fn append_to_vtable(&mut self, func_id: FunctionDefId) {
        let index = self.composite().instance_methods.len();
        self.comp.registry.function_mut(func_id).dispatch_index = index as i32;
        self.composite_mut().instance_methods.push(func_id);
    }

    /// 4.6.5 — A concrete type may not leave dispatch slots without bodies,
    /// and every interface slot must point at an implementation.
    fn check_for_required_methods(&mut self) -> bool {
        if self.defn().is_abstract() {
            return true;
        }

        let kind = self.kind();
        let methods = self.composite().instance_methods.clone();
        if !methods.is_empty() {
            let missing: Vec<FunctionDefId> = methods
                .into_iter()
                .filter(|&f| {
                    let func = self.comp.registry.function(f);
                    !func.has_body() && !func.body_optional()
                })
                .collect();

            if !missing.is_empty() {
                if matches!(kind, CompositeKind::Class | CompositeKind::Struct) {
                    let name = self.comp.type_name(self.target);
                    let span = self.span();
                    self.error(
                        SemanticError::MissingMethodBodies {
                            name,
                            span: span.into(),
                        },
                        span,
                    );
                    for f in missing {
                        let qualified = self.comp.registry.function(f).qualified_name.clone();
                        let f_span = self.comp.registry.function(f).span;
                        self.info(format!("missing '{qualified}'"), f_span);
                    }
                    return false;
                }
                // Bodiless slots are expected on interfaces and protocols.
                return true;
            }
        }

        let itables = self.composite().interfaces.clone();
        for itable in itables {
            let unimplemented: Vec<FunctionDefId> = itable
                .methods
                .iter()
                .copied()
                .filter(|&f| {
                    let func = self.comp.registry.function(f);
                    !func.has_body() && !func.body_optional()
                })
                .collect();

            if !unimplemented.is_empty() {
                let name = self.comp.type_name(self.target);
                let interface = self.comp.type_name(itable.interface);
                let span = self.span();
                self.error(
                    SemanticError::UnimplementedInterface {
                        name,
                        interface,
                        span: span.into(),
                    },
                    span,
                );
                for f in unimplemented {
                    let qualified = self.comp.registry.function(f).qualified_name.clone();
                    let f_span = self.comp.registry.function(f).span;
                    self.info(format!("missing '{qualified}'"), f_span);
                }
                return false;
            }
        }

        true
    }
}
