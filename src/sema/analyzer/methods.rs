// src/sema/analyzer/methods.rs
//! Method and property validation: signature elaboration, interface and
//! protocol member rules, and duplicate-signature detection.

use crate::errors::SemanticError;
use crate::identity::{FunctionDefId, PropertyDefId};
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::compatibility::same_signature;
use crate::sema::composite::CompositeKind;
use crate::sema::defs::DefnRef;
use crate::sema::function_analyzer::FunctionAnalyzer;
use crate::sema::passes::{AnalysisTask, Pass};

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_methods(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Method) {
            return true;
        }

        let mut success = true;
        let abstract_kind = matches!(
            self.kind(),
            CompositeKind::Interface | CompositeKind::Protocol
        );
        let kind_name = self.kind().describe().to_string();

        let members = self.composite().member_order.clone();
        for member in members {
            match member {
                DefnRef::Function(func_id) => {
                    let func = self.comp.registry.function(func_id);
                    // Templated members wait for instantiation.
                    if func.has_unbound_type_params() {
                        continue;
                    }
                    let span = func.span;
                    if abstract_kind {
                        if func.is_final() {
                            self.error(
                                SemanticError::AbstractKindMemberFinal {
                                    kind: kind_name.clone(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        } else if func.visibility != crate::frontend::ast::Visibility::Public {
                            self.error(
                                SemanticError::AbstractKindMemberNotPublic {
                                    kind: kind_name.clone(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        }
                    }
                    FunctionAnalyzer::new(self.comp, func_id)
                        .analyze(AnalysisTask::PrepTypeComparison);
                }
                DefnRef::Property(prop_id) => {
                    let prop = self.comp.registry.property(prop_id);
                    let span = prop.span;
                    if abstract_kind {
                        if prop.traits.contains(crate::sema::defs::Traits::FINAL) {
                            self.error(
                                SemanticError::AbstractKindMemberFinal {
                                    kind: kind_name.clone(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        } else if prop.visibility != crate::frontend::ast::Visibility::Public {
                            self.error(
                                SemanticError::AbstractKindMemberNotPublic {
                                    kind: kind_name.clone(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        }
                    }
                    self.resolve_property_type(prop_id);
                    let prop = self.comp.registry.property(prop_id);
                    let accessors: Vec<FunctionDefId> =
                        prop.getter.into_iter().chain(prop.setter).collect();
                    for accessor in accessors {
                        FunctionAnalyzer::new(self.comp, accessor)
                            .analyze(AnalysisTask::PrepTypeComparison);
                    }
                }
                _ => {}
            }
        }

        success &= self.check_duplicate_signatures();

        self.composite_mut().passes.finish(Pass::Method);
        success
    }

    /// Within one overload set, no two functions may share a signature and
    /// no two properties may share a type.
    fn check_duplicate_signatures(&mut self) -> bool {
        let mut success = true;
        let groups: Vec<Vec<DefnRef>> = self
            .composite()
            .members
            .iter()
            .map(|(_, defns)| defns.to_vec())
            .collect();

        for defns in groups {
            let functions: Vec<FunctionDefId> = defns
                .iter()
                .filter_map(|defn| match defn {
                    DefnRef::Function(id)
                        if !self.comp.registry.function(*id).has_unbound_type_params() =>
                    {
                        Some(*id)
                    }
                    _ => None,
                })
                .collect();
            for (i, &earlier) in functions.iter().enumerate() {
                for &later in &functions[i + 1..] {
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

            let properties: Vec<PropertyDefId> = defns
                .iter()
                .filter_map(|defn| match defn {
                    DefnRef::Property(id) => Some(*id),
                    _ => None,
                })
                .collect();
            for (i, &earlier) in properties.iter().enumerate() {
                for &later in &properties[i + 1..] {
                    let a = self.comp.registry.property(earlier);
                    let b = self.comp.registry.property(later);
                    if a.ty.is_some() && a.ty == b.ty {
                        let name = self.comp.name(b.name).to_string();
                        let span = b.span;
                        let earlier_span = a.span;
                        self.error(
                            SemanticError::PropertyConflict {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                        self.info("from here", earlier_span);
                        success = false;
                    }
                }
            }
        }

        success
    }
}
