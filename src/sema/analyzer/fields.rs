// src/sema/analyzer/fields.rs
//! Field layout: storage classification, the reserved super slot, and
//! per-type plus cumulative instance-field indices.

use crate::errors::SemanticError;
use crate::frontend::ast::StorageClass;
use crate::identity::FieldDefId;
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::composite::CompositeKind;
use crate::sema::defs::{DefnRef, Traits};
use crate::sema::passes::{AnalysisTask, Pass, PassSet};

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_fields(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Field) {
            return true;
        }

        let mut success = true;
        let mut index: i32 = 0;
        let mut recursive: i32 = 0;

        if let Some(super_id) = self.composite().super_type {
            let super_composite = &self.comp.registry.type_defn(super_id).composite;
            let reserves_slot = super_composite.kind.has_representation();
            if !super_composite.passes.is_finished(Pass::Field) {
                // The super's layout must exist before cumulative indices
                // can continue from it.
                ClassAnalyzer::new(self.comp, super_id).run_passes(
                    AnalysisTask::PrepTypeComparison.passes() | PassSet::FIELD,
                );
            }

            if reserves_slot {
                // Slot 0 embeds the superclass representation.
                self.composite_mut().instance_fields.push(None);
                index = 1;
            }
            recursive = self.comp.registry.recursive_field_count(super_id) as i32;
        }

        let is_interface = self.kind() == CompositeKind::Interface;
        let target_final = self.defn().traits & Traits::FINAL;
        let members = self.composite().member_order.clone();

        for member in members {
            let DefnRef::Field(field_id) = member else {
                continue;
            };

            self.comp.registry.field_mut(field_id).traits |= target_final;
            success &= self.resolve_field_type(field_id);
            self.prepare_field_type(field_id);

            let field = self.comp.registry.field(field_id);
            if !field.requires_storage() {
                continue;
            }
            let name = self.comp.name(field.name).to_string();
            let span = field.span;
            let storage = field.storage;

            if is_interface {
                self.error(
                    SemanticError::DataMemberInInterface {
                        name,
                        span: span.into(),
                    },
                    span,
                );
                success = false;
            }

            match storage {
                StorageClass::Instance => {
                    let field = self.comp.registry.field_mut(field_id);
                    field.member_index = index;
                    field.recursive_index = recursive;
                    index += 1;
                    recursive += 1;
                    self.composite_mut().instance_fields.push(Some(field_id));
                }
                StorageClass::Static => {
                    self.comp.module.add_symbol(DefnRef::Field(field_id));
                    self.composite_mut().static_fields.push(field_id);
                }
            }
        }

        debug_assert_eq!(self.composite().instance_field_count(), index as usize);
        self.composite_mut().passes.finish(Pass::Field);
        success
    }

    /// Bring a field's type definition up to the type-comparison stage.
    fn prepare_field_type(&mut self, field_id: FieldDefId) {
        let field_type = self.comp.registry.field(field_id).ty.clone();
        if let Some(type_id) = field_type.and_then(|ty| ty.composite_defn()) {
            ClassAnalyzer::new(self.comp, type_id).analyze(AnalysisTask::PrepTypeComparison);
        }
    }

    pub(super) fn analyze_field_types(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::FieldType) {
            return true;
        }

        if let Some(super_id) = self.composite().super_type {
            ClassAnalyzer::new(self.comp, super_id).analyze(AnalysisTask::PrepTypeGeneration);
        }

        let fields: Vec<FieldDefId> = self
            .composite()
            .instance_fields
            .iter()
            .flatten()
            .copied()
            .collect();
        for field_id in fields {
            self.resolve_field_type(field_id);
            let field_type = self.comp.registry.field(field_id).ty.clone();
            if let Some(type_id) = field_type.and_then(|ty| ty.composite_defn()) {
                ClassAnalyzer::new(self.comp, type_id).analyze(AnalysisTask::PrepTypeGeneration);
            }
        }

        self.composite_mut().passes.finish(Pass::FieldType);
        true
    }
}
