// src/sema/analyzer/constructors.rs
//! Constructor analysis: validation of declared constructors and creator
//! functions, and synthesis of the default constructor.

use crate::errors::SemanticError;
use crate::frontend::ast::{self, StorageClass, Visibility};
use crate::identity::FieldDefId;
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::composite::CompositeKind;
use crate::sema::defs::{
    DefnRef, FieldInit, FieldInitValue, FunctionBody, FunctionDefn, ParamDefn, Traits,
};
use crate::sema::function_analyzer::FunctionAnalyzer;
use crate::sema::passes::{AnalysisTask, FnPassSet, Pass};
use crate::sema::types::Type;

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_constructors(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Constructor) {
            return true;
        }
        let result = self.analyze_constructors_impl();
        self.composite_mut().passes.finish(Pass::Constructor);
        result
    }

    fn analyze_constructors_impl(&mut self) -> bool {
        if !matches!(self.kind(), CompositeKind::Class | CompositeKind::Struct) {
            return true;
        }

        // The super's constructor set must exist before default-constructor
        // decisions can be made here.
        if let Some(super_id) = self.composite().super_type {
            let super_passes = &self.comp.registry.type_defn(super_id).composite.passes;
            let needs_prep = !super_passes.is_finished(Pass::Constructor)
                && !super_passes.is_running(Pass::Constructor);
            if needs_prep
                && !ClassAnalyzer::new(self.comp, super_id)
                    .analyze(AnalysisTask::PrepConstruction)
            {
                return false;
            }
        }

        let mut success = true;
        let mut has_constructors = false;

        let ctor_members = self.composite().members.get(self.comp.names.construct).to_vec();
        for member in ctor_members {
            let DefnRef::Function(ctor) = member else {
                let span = self.comp.registry.defn_span(member);
                self.fatal(
                    SemanticError::ConstructorNotMethod { span: span.into() },
                    span,
                );
                success = false;
                break;
            };

            has_constructors = true;
            self.comp.registry.function_mut(ctor).traits |= Traits::CTOR;

            if !FunctionAnalyzer::new(self.comp, ctor).analyze(AnalysisTask::PrepTypeComparison) {
                continue;
            }

            // The signature pass defaults an omitted return type to void;
            // anything else here was written explicitly.
            let func = self.comp.registry.function(ctor);
            let span = func.span;
            if !matches!(func.return_type, Some(Type::Void)) {
                self.fatal(
                    SemanticError::ConstructorReturnType { span: span.into() },
                    span,
                );
                success = false;
                break;
            }
            if func.storage != StorageClass::Instance {
                self.fatal(
                    SemanticError::ConstructorNotInstance { span: span.into() },
                    span,
                );
                success = false;
                break;
            }

            if !func.has_unbound_type_params() && self.defn().is_singular() {
                self.comp.registry.function_mut(ctor).traits |= Traits::SINGULAR;
            }
        }

        // Static creator functions suppress default-constructor synthesis
        // just like declared constructors do.
        let creators = self.composite().members.get(self.comp.names.create).to_vec();
        for member in creators {
            let DefnRef::Function(creator) = member else {
                continue;
            };
            if self.comp.registry.function(creator).storage == StorageClass::Static {
                has_constructors = true;
            }
            FunctionAnalyzer::new(self.comp, creator).analyze(AnalysisTask::PrepTypeComparison);
        }

        if !has_constructors {
            success &= self.create_default_constructor();
        }

        success
    }

    /// Synthesize a constructor from the field set: public instance `var`
    /// fields become parameters (optional when they carry a constant
    /// default), non-public defaulted fields are initialized directly.
    fn create_default_constructor(&mut self) -> bool {
        if let Some(super_id) = self.composite().super_type
            && self.comp.registry.default_constructor(super_id).is_none()
        {
            let span = self.span();
            let name = self.comp.type_name(self.target);
            let super_name = self.comp.type_name(super_id);
            self.fatal(
                SemanticError::NoSuperDefaultConstructor {
                    name,
                    super_name,
                    span: span.into(),
                },
                span,
            );
            return false;
        }

        let mut success = true;
        let mut required: Vec<ParamDefn> = Vec::new();
        let mut optional: Vec<ParamDefn> = Vec::new();
        enum Slot {
            Required(usize),
            Optional(usize),
            Direct(ast::Expr),
        }
        let mut assignments: Vec<(FieldDefId, Slot)> = Vec::new();

        let members = self.composite().member_order.clone();
        for member in members {
            let DefnRef::Field(field_id) = member else {
                continue;
            };
            let field = self.comp.registry.field(field_id);
            if field.storage != StorageClass::Instance {
                continue;
            }

            match field.binding {
                ast::Binding::Let => {
                    // Constant lets carry no storage and need no runtime
                    // init; anything else demands a user constructor.
                    let needs_ctor = match &field.init {
                        Some(init) => !init.is_constant(),
                        None => true,
                    };
                    if needs_ctor {
                        let name = self.comp.name(field.name).to_string();
                        let span = field.span;
                        self.error(
                            SemanticError::FieldRequiresConstructor {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                        success = false;
                    }
                }
                ast::Binding::Var => {
                    self.resolve_field_type(field_id);
                    let field = self.comp.registry.field(field_id);
                    let default = field
                        .init
                        .clone()
                        .filter(ast::Expr::is_constant);

                    if field.visibility == Visibility::Public {
                        let param = ParamDefn {
                            name: field.name,
                            ty_ast: None,
                            ty: field.ty.clone(),
                            default: default.clone(),
                            span: field.span,
                        };
                        let slot = if default.is_some() {
                            optional.push(param);
                            Slot::Optional(optional.len() - 1)
                        } else {
                            required.push(param);
                            Slot::Required(required.len() - 1)
                        };
                        assignments.push((field_id, slot));
                    } else if let Some(default) = default {
                        assignments.push((field_id, Slot::Direct(default)));
                    } else if self.target != self.comp.object {
                        let name = self.comp.name(field.name).to_string();
                        let span = field.span;
                        self.error(
                            SemanticError::FieldRequiresConstructor {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                        success = false;
                    }
                }
            }
        }

        // Required parameters precede optional ones.
        let required_count = required.len();
        let mut params = required;
        params.append(&mut optional);

        let field_inits = assignments
            .into_iter()
            .map(|(field, slot)| FieldInit {
                field,
                value: match slot {
                    Slot::Required(i) => FieldInitValue::Param(i),
                    Slot::Optional(i) => FieldInitValue::Param(required_count + i),
                    Slot::Direct(expr) => FieldInitValue::Default(expr),
                },
            })
            .collect();

        let mut traits = Traits::CTOR | Traits::SYNTHETIC;
        let target_defn = self.defn();
        if target_defn.is_singular() {
            traits |= Traits::SINGULAR;
        }

        let name = self.comp.names.construct;
        let qualified_name = self.member_qualified_name(name);
        let target = self.target;
        let span = self.span();
        let ctor = self.comp.registry.add_function(|id| FunctionDefn {
            id,
            name,
            qualified_name,
            defined_in: target,
            traits,
            visibility: Visibility::Public,
            storage: StorageClass::Instance,
            type_params: Default::default(),
            params,
            return_type: Some(Type::Void),
            return_type_ast: None,
            body: FunctionBody::FieldInits(field_inits),
            dispatch_index: -1,
            overridden: Vec::new(),
            owning_property: None,
            // Synthesized straight into elaborated form; the function
            // analyzer has nothing left to do.
            passes: FnPassSet::synthesized(),
            span,
        });

        if self.defn().is_singular() && !self.defn().is_synthetic() {
            self.comp.module.add_symbol(DefnRef::Function(ctor));
        }

        tracing::debug!(
            target_type = %self.defn().qualified_name,
            "synthesized default constructor"
        );
        self.add_member(name, DefnRef::Function(ctor));
        success
    }
}
