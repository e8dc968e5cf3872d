// src/sema/analyzer/bases.rs
//! Base-type analysis: inheritance validation, primary-base selection, and
//! the circular-inheritance guard.

use crate::errors::SemanticError;
use crate::frontend::ast::TypeExpr;
use crate::identity::TypeDefId;
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::composite::CompositeKind;
use crate::sema::defs::{DefnRef, Traits};
use crate::sema::passes::{AnalysisTask, Pass};
use crate::sema::resolve::{display_expr, TypeResolver};

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_base_classes(&mut self) -> bool {
        if self.composite().passes.is_running(Pass::BaseTypes) {
            let span = self.span();
            self.error(
                SemanticError::CircularInheritance { span: span.into() },
                span,
            );
            return false;
        }

        if !self.composite_mut().passes.begin(Pass::BaseTypes) {
            return true;
        }

        let result = self.analyze_base_classes_impl();
        self.composite_mut().passes.finish(Pass::BaseTypes);
        result
    }

    fn analyze_base_classes_impl(&mut self) -> bool {
        // A definition with no AST was created internally by the compiler,
        // which is responsible for prepopulating the base list.
        let Some(decl) = self.defn().ast.as_ref() else {
            return true;
        };
        let base_exprs: Vec<TypeExpr> = decl.bases.clone();

        debug_assert!(self.composite().super_type.is_none());

        let mut success = true;
        let kind = self.kind();

        // Interfaces and protocols are abstract by construction; declaring
        // them final is contradictory.
        if self.defn().is_final()
            && matches!(kind, CompositeKind::Interface | CompositeKind::Protocol)
        {
            let span = self.span();
            self.error(
                SemanticError::AbstractKindFinal {
                    kind: kind.describe().to_string(),
                    span: span.into(),
                },
                span,
            );
            success = false;
        }

        let is_from_template = self.defn().is_template();
        let mut primary: Option<TypeDefId> = None;

        for base_expr in &base_exprs {
            let span = base_expr.span();
            let base_ty =
                TypeResolver::new(self.comp, Some(self.target)).type_from_ast(base_expr);
            if base_ty.is_invalid() {
                return false;
            }

            let Some(base_id) = base_ty.composite_defn() else {
                self.error(
                    SemanticError::CannotInherit {
                        name: display_expr(self.comp, base_expr),
                        span: span.into(),
                    },
                    span,
                );
                return false;
            };

            if !base_ty.is_singular(&self.comp.registry) && !is_from_template {
                let name = self.comp.type_name(base_id);
                self.error(
                    SemanticError::BaseIsTemplate {
                        name,
                        span: span.into(),
                    },
                    span,
                );
                return false;
            }

            if self.comp.registry.type_defn(base_id).is_final() {
                let name = self.comp.type_name(base_id);
                self.error(
                    SemanticError::BaseIsFinal {
                        name,
                        span: span.into(),
                    },
                    span,
                );
                success = false;
            }

            // Bring the base far enough that its own base graph exists; the
            // running bit turns inheritance cycles into diagnostics here.
            if !ClassAnalyzer::new(self.comp, base_id).analyze(AnalysisTask::PrepMemberLookup) {
                return false;
            }

            let base_kind = self.comp.registry.type_defn(base_id).composite.kind;
            let mut is_primary = false;
            match kind {
                CompositeKind::Class => match base_kind {
                    CompositeKind::Class => {
                        if primary.is_none() {
                            is_primary = true;
                        } else {
                            self.error(
                                SemanticError::MultipleSupertypes {
                                    kind: "classes".to_string(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        }
                    }
                    CompositeKind::Interface => {}
                    _ => {
                        self.error(
                            SemanticError::InvalidClassBase { span: span.into() },
                            span,
                        );
                        success = false;
                    }
                },
                CompositeKind::Struct => match base_kind {
                    CompositeKind::Struct => {
                        if primary.is_none() {
                            is_primary = true;
                        } else {
                            self.error(
                                SemanticError::MultipleSupertypes {
                                    kind: "structs".to_string(),
                                    span: span.into(),
                                },
                                span,
                            );
                            success = false;
                        }
                    }
                    // Protocols are erased; they join the base list without
                    // supplying a representation.
                    CompositeKind::Protocol => {}
                    _ => {
                        self.error(
                            SemanticError::InvalidStructBase { span: span.into() },
                            span,
                        );
                        success = false;
                    }
                },
                CompositeKind::Interface | CompositeKind::Protocol => match base_kind {
                    CompositeKind::Interface => {
                        if primary.is_none() {
                            is_primary = true;
                        }
                    }
                    CompositeKind::Protocol => {}
                    _ => {
                        self.error(
                            SemanticError::InvalidInterfaceBase { span: span.into() },
                            span,
                        );
                        success = false;
                    }
                },
            }

            // Singular bases become external references of this module.
            if self.comp.registry.type_defn(base_id).is_singular() {
                self.comp.module.add_symbol(DefnRef::Type(base_id));
            }

            if is_primary {
                primary = Some(base_id);
            } else {
                self.composite_mut().bases.push(base_id);
            }
        }

        // Classes with no declared supertype derive from Object.
        if kind == CompositeKind::Class && primary.is_none() && self.target != self.comp.object {
            let object = self.comp.object;
            self.comp.module.add_symbol(DefnRef::Type(object));
            self.comp.schedule(object, AnalysisTask::PrepMemberLookup);
            primary = Some(object);
        }

        self.composite_mut().super_type = primary;
        if let Some(primary) = primary {
            self.composite_mut().bases.insert(0, primary);
            self.propagate_subtype_attributes(primary);
        }

        success
    }

    /// Inheritable attributes flow from the primary base to the target.
    fn propagate_subtype_attributes(&mut self, base: TypeDefId) {
        let inherited = self.comp.registry.type_defn(base).traits & Traits::NONREFLECTIVE;
        self.defn_mut().traits |= inherited;
    }
}
