// src/sema/resolve.rs
//! Type resolution: AST type expressions to elaborated types.
//!
//! Resolution dispatches on the expression variant. Name lookup walks the
//! enclosing type scopes (template parameters first, then nested-type
//! members) and falls back to the module scope. Finding a type definition
//! schedules it for at least the member-lookup stage so that demand-driven
//! analysis reaches every referenced type.

use smallvec::SmallVec;

use crate::errors::SemanticError;
use crate::frontend::ast::{Symbol, TypeExpr};
use crate::frontend::Span;
use crate::identity::TypeDefId;
use crate::sema::defs::DefnRef;
use crate::sema::passes::AnalysisTask;
use crate::sema::types::Type;
use crate::sema::{ClassAnalyzer, Compilation};

pub struct TypeResolver<'a> {
    comp: &'a mut Compilation,
    /// The type whose lexical scope resolution happens in
    scope: Option<TypeDefId>,
    /// Template parameters visible at the resolution site, innermost last
    type_params: SmallVec<[Symbol; 4]>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(comp: &'a mut Compilation, scope: Option<TypeDefId>) -> Self {
        let mut type_params = SmallVec::new();
        let mut cursor = scope;
        while let Some(id) = cursor {
            let defn = comp.registry.type_defn(id);
            type_params.extend(defn.type_params.iter().copied());
            cursor = defn.parent;
        }
        Self {
            comp,
            scope,
            type_params,
        }
    }

    /// Additional template parameters, e.g. those of a templated method.
    pub fn with_params(mut self, params: &[Symbol]) -> Self {
        self.type_params.extend(params.iter().copied());
        self
    }

    pub fn type_from_ast(&mut self, expr: &TypeExpr) -> Type {
        match expr {
            TypeExpr::Named(name, span) => self.resolve_named(*name, *span),
            TypeExpr::Member { base, name, span } => self.resolve_member(base, *name, *span),
            TypeExpr::Specialize { base, args, span } => self.resolve_specialize(base, args, *span),
            TypeExpr::Array(elem, _) => {
                let elem = self.type_from_ast(elem);
                if elem.is_invalid() {
                    return elem;
                }
                Type::Array(Box::new(elem))
            }
            TypeExpr::Union(members, _) => {
                let mut types = Vec::with_capacity(members.len());
                for member in members {
                    let ty = self.type_from_ast(member);
                    if ty.is_invalid() {
                        return ty;
                    }
                    types.push(ty);
                }
                Type::Union(types)
            }
            TypeExpr::Function {
                params,
                return_type,
                ..
            } => {
                let mut param_types = Vec::with_capacity(params.len());
                for param in params {
                    let ty = self.type_from_ast(param);
                    if ty.is_invalid() {
                        return ty;
                    }
                    param_types.push(ty);
                }
                let ret = match return_type {
                    Some(expr) => self.type_from_ast(expr),
                    None => Type::Void,
                };
                if ret.is_invalid() {
                    return ret;
                }
                Type::Function {
                    params: param_types,
                    ret: Box::new(ret),
                }
            }
            TypeExpr::Primitive(prim, _) => Type::Primitive(*prim),
        }
    }

    fn resolve_named(&mut self, name: Symbol, span: Span) -> Type {
        if self.type_params.contains(&name) {
            return Type::TypeParam(name);
        }

        let candidates = self.lookup(name);
        self.type_from_candidates(&candidates, name, span)
    }

    /// Candidate definitions for a simple name: enclosing type scopes from
    /// innermost outward, then the module scope. The first scope with any
    /// entry wins.
    fn lookup(&self, name: Symbol) -> Vec<DefnRef> {
        let mut cursor = self.scope;
        while let Some(id) = cursor {
            let defn = self.comp.registry.type_defn(id);
            let found = defn.composite.members.get(name);
            if !found.is_empty() {
                return found.to_vec();
            }
            cursor = defn.parent;
        }
        self.comp.module.scope.get(name).to_vec()
    }

    fn type_from_candidates(
        &mut self,
        candidates: &[DefnRef],
        name: Symbol,
        span: Span,
    ) -> Type {
        if candidates.is_empty() {
            self.comp.diagnostics.fatal(
                SemanticError::UndefinedType {
                    name: self.comp.name(name).to_string(),
                    span: span.into(),
                },
                span,
            );
            return Type::Invalid;
        }
        if candidates.len() > 1 {
            self.comp.diagnostics.fatal(
                SemanticError::AmbiguousType {
                    name: self.comp.name(name).to_string(),
                    span: span.into(),
                },
                span,
            );
            return Type::Invalid;
        }
        match candidates[0] {
            DefnRef::Type(id) => {
                self.comp.schedule(id, AnalysisTask::PrepMemberLookup);
                Type::Composite(id)
            }
            _ => {
                self.comp.diagnostics.fatal(
                    SemanticError::NotAType {
                        name: self.comp.name(name).to_string(),
                        span: span.into(),
                    },
                    span,
                );
                Type::Invalid
            }
        }
    }

    fn resolve_member(&mut self, base: &TypeExpr, name: Symbol, span: Span) -> Type {
        let base_ty = self.type_from_ast(base);
        if base_ty.is_invalid() {
            return base_ty;
        }
        let Some(base_defn) = base_ty.composite_defn() else {
            self.comp.diagnostics.fatal(
                SemanticError::NotAType {
                    name: self.comp.name(name).to_string(),
                    span: span.into(),
                },
                span,
            );
            return Type::Invalid;
        };

        // The qualifier's member scope must exist before we can search it.
        ClassAnalyzer::new(self.comp, base_defn).analyze(AnalysisTask::PrepMemberLookup);

        let candidates = self
            .comp
            .registry
            .type_defn(base_defn)
            .composite
            .members
            .get(name)
            .to_vec();
        self.type_from_candidates(&candidates, name, span)
    }

    fn resolve_specialize(&mut self, base: &TypeExpr, args: &[TypeExpr], span: Span) -> Type {
        let base_ty = self.type_from_ast(base);
        if base_ty.is_invalid() {
            return base_ty;
        }
        let Some(def) = base_ty.composite_defn() else {
            self.comp.diagnostics.fatal(
                SemanticError::NotAType {
                    name: display_expr(self.comp, base),
                    span: span.into(),
                },
                span,
            );
            return Type::Invalid;
        };

        let expected = self.comp.registry.type_defn(def).type_params.len();
        if expected != args.len() {
            self.comp.diagnostics.error(
                SemanticError::WrongTypeArgumentCount {
                    name: self.comp.type_name(def),
                    expected,
                    found: args.len(),
                    span: span.into(),
                },
                span,
            );
            return Type::Invalid;
        }

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            let ty = self.type_from_ast(arg);
            if ty.is_invalid() {
                return ty;
            }
            arg_types.push(ty);
        }
        Type::Specialized {
            def,
            args: arg_types,
        }
    }
}

/// Best-effort rendering of a type expression for diagnostics.
pub fn display_expr(comp: &Compilation, expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Named(name, _) => comp.name(*name).to_string(),
        TypeExpr::Member { base, name, .. } => {
            format!("{}.{}", display_expr(comp, base), comp.name(*name))
        }
        TypeExpr::Specialize { base, .. } => format!("{}[…]", display_expr(comp, base)),
        TypeExpr::Array(elem, _) => format!("{}[]", display_expr(comp, elem)),
        TypeExpr::Union(..) => "union type".to_string(),
        TypeExpr::Function { .. } => "function type".to_string(),
        TypeExpr::Primitive(prim, _) => format!("{prim:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SemanticError;
    use crate::frontend::ast::{PrimitiveType, TypeDeclKind, TypeDecl, Visibility};

    fn sp() -> Span {
        Span::default()
    }

    fn declare_type(comp: &mut Compilation, name: &str, type_params: &[&str]) -> TypeDefId {
        let name = comp.interner.intern(name);
        let type_params = type_params
            .iter()
            .map(|p| comp.interner.intern(p))
            .collect();
        comp.declare(TypeDecl {
            name,
            kind: TypeDeclKind::Class,
            visibility: Visibility::Public,
            is_final: false,
            is_abstract: false,
            type_params,
            bases: Vec::new(),
            members: Vec::new(),
            span: sp(),
        })
    }

    #[test]
    fn named_reference_resolves_to_composite() {
        let mut comp = Compilation::new();
        let id = declare_type(&mut comp, "Shape", &[]);
        let expr = TypeExpr::Named(comp.interner.intern("Shape"), sp());

        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        assert_eq!(ty, Type::Composite(id));
    }

    #[test]
    fn specialization_carries_arguments() {
        let mut comp = Compilation::new();
        let id = declare_type(&mut comp, "Box", &["T"]);
        let expr = TypeExpr::Specialize {
            base: Box::new(TypeExpr::Named(comp.interner.intern("Box"), sp())),
            args: vec![TypeExpr::Primitive(PrimitiveType::I64, sp())],
            span: sp(),
        };

        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        assert_eq!(
            ty,
            Type::Specialized {
                def: id,
                args: vec![Type::Primitive(PrimitiveType::I64)],
            }
        );
        assert!(ty.is_singular(&comp.registry));
    }

    #[test]
    fn specialization_arity_mismatch_is_an_error() {
        let mut comp = Compilation::new();
        declare_type(&mut comp, "Box", &["T"]);
        let expr = TypeExpr::Specialize {
            base: Box::new(TypeExpr::Named(comp.interner.intern("Box"), sp())),
            args: Vec::new(),
            span: sp(),
        };

        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        assert!(ty.is_invalid());
        assert!(comp
            .diagnostics
            .semantic_reports()
            .any(|(e, _)| matches!(e, SemanticError::WrongTypeArgumentCount { .. })));
    }

    #[test]
    fn array_and_union_sugar_build_compound_types() {
        let mut comp = Compilation::new();
        let array = TypeExpr::Array(
            Box::new(TypeExpr::Primitive(PrimitiveType::I64, sp())),
            sp(),
        );
        let union = TypeExpr::Union(
            vec![
                TypeExpr::Primitive(PrimitiveType::I64, sp()),
                TypeExpr::Primitive(PrimitiveType::Str, sp()),
            ],
            sp(),
        );

        let array_ty = TypeResolver::new(&mut comp, None).type_from_ast(&array);
        let union_ty = TypeResolver::new(&mut comp, None).type_from_ast(&union);
        assert_eq!(
            array_ty,
            Type::Array(Box::new(Type::Primitive(PrimitiveType::I64)))
        );
        assert_eq!(
            union_ty,
            Type::Union(vec![
                Type::Primitive(PrimitiveType::I64),
                Type::Primitive(PrimitiveType::Str),
            ])
        );
    }

    #[test]
    fn function_type_defaults_to_void_return() {
        let mut comp = Compilation::new();
        let expr = TypeExpr::Function {
            params: vec![TypeExpr::Primitive(PrimitiveType::Bool, sp())],
            return_type: None,
            span: sp(),
        };

        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        assert_eq!(
            ty,
            Type::Function {
                params: vec![Type::Primitive(PrimitiveType::Bool)],
                ret: Box::new(Type::Void),
            }
        );
    }

    #[test]
    fn type_params_shadow_outer_names() {
        let mut comp = Compilation::new();
        declare_type(&mut comp, "T", &[]);
        let t = comp.interner.intern("T");
        let expr = TypeExpr::Named(t, sp());

        let ty = TypeResolver::new(&mut comp, None)
            .with_params(&[t])
            .type_from_ast(&expr);
        assert_eq!(ty, Type::TypeParam(t));
    }

    #[test]
    fn ambiguous_name_is_an_error() {
        let mut comp = Compilation::new();
        declare_type(&mut comp, "Dup", &[]);
        declare_type(&mut comp, "Dup", &[]);
        let expr = TypeExpr::Named(comp.interner.intern("Dup"), sp());

        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        assert!(ty.is_invalid());
        assert!(comp
            .diagnostics
            .semantic_reports()
            .any(|(e, _)| matches!(e, SemanticError::AmbiguousType { .. })));
    }

    #[test]
    fn member_access_finds_nested_types() {
        let mut comp = Compilation::new();
        let outer_name = comp.interner.intern("Outer");
        let inner_name = comp.interner.intern("Inner");
        let inner_decl = TypeDecl {
            name: inner_name,
            kind: TypeDeclKind::Class,
            visibility: Visibility::Public,
            is_final: false,
            is_abstract: false,
            type_params: Vec::new(),
            bases: Vec::new(),
            members: Vec::new(),
            span: sp(),
        };
        comp.declare(TypeDecl {
            name: outer_name,
            kind: TypeDeclKind::Class,
            visibility: Visibility::Public,
            is_final: false,
            is_abstract: false,
            type_params: Vec::new(),
            bases: Vec::new(),
            members: vec![crate::frontend::ast::MemberDecl::Type(inner_decl)],
            span: sp(),
        });

        let expr = TypeExpr::Member {
            base: Box::new(TypeExpr::Named(outer_name, sp())),
            name: inner_name,
            span: sp(),
        };
        let ty = TypeResolver::new(&mut comp, None).type_from_ast(&expr);
        let inner = ty.composite_defn().expect("nested type");
        assert_eq!(comp.registry.type_defn(inner).name, inner_name);
        assert_eq!(comp.registry.type_defn(inner).qualified_name, "Outer.Inner");
    }
}
