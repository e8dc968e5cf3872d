// src/sema/analyzer/mod.rs
//! The composite-type analyzer.
//!
//! `ClassAnalyzer` drives a composite type through the analysis passes on
//! demand: an external caller asks for a task, the analyzer subtracts the
//! passes that already finished, and runs the remainder in topological
//! order. Any pass may recurse into other types to bring them up to the
//! stage it needs; the pass registry's `running` bit bounds that recursion.

mod bases;
mod coercers;
mod constructors;
mod fields;
mod methods;
mod overloading;


use smallvec::SmallVec;

use crate::errors::SemanticError;
use crate::frontend::ast::{self, StorageClass, Symbol};
use crate::frontend::Span;
use crate::identity::{FieldDefId, FunctionDefId, PropertyDefId, TypeDefId};
use crate::sema::composite::{CompositeKind, CompositeType};
use crate::sema::defs::{
    AccessorKind, DefnRef, FieldDefn, FunctionBody, FunctionDefn, ParamDefn, PropertyDefn,
    Traits, TypeDefn,
};
use crate::sema::function_analyzer::FunctionAnalyzer;
use crate::sema::passes::{AnalysisTask, FnPassSet, Pass, PassSet};
use crate::sema::resolve::TypeResolver;
use crate::sema::Compilation;

pub struct ClassAnalyzer<'a> {
    comp: &'a mut Compilation,
    target: TypeDefId,
}

impl<'a> ClassAnalyzer<'a> {
    pub fn new(comp: &'a mut Compilation, target: TypeDefId) -> Self {
        Self { comp, target }
    }

    /// Bring the target type to the given task. Returns false when a pass
    /// failed; diagnostics describe why.
    pub fn analyze(&mut self, task: AnalysisTask) -> bool {
        self.run_passes(task.passes())
    }

    pub(super) fn run_passes(&mut self, requested: PassSet) -> bool {
        let to_run = requested.difference(self.composite().passes.finished());
        if to_run.is_empty() {
            return true;
        }

        tracing::debug!(
            target_type = %self.defn().qualified_name,
            passes = ?to_run,
            "running analysis passes"
        );

        // Templates only get a member scope and a validated base list; the
        // remaining passes run on their specializations.
        if self.defn().is_template() {
            if to_run.contains(PassSet::SCOPE_CREATION) && !self.create_members() {
                return false;
            }
            if to_run.contains(PassSet::BASE_TYPES) && !self.analyze_base_classes() {
                return false;
            }
            return true;
        }

        if to_run.contains(PassSet::SCOPE_CREATION) && !self.create_members() {
            return false;
        }
        if to_run.contains(PassSet::BASE_TYPES) && !self.analyze_base_classes() {
            return false;
        }
        if to_run.contains(PassSet::ATTRIBUTE) && !self.resolve_attributes() {
            return false;
        }
        if to_run.contains(PassSet::NAMING_CONFLICT) && !self.check_name_conflicts() {
            return false;
        }
        if to_run.contains(PassSet::CONVERTER) && !self.analyze_coercers() {
            return false;
        }
        if to_run.contains(PassSet::CONSTRUCTOR) && !self.analyze_constructors() {
            return false;
        }
        if to_run.contains(PassSet::MEMBER_TYPE) && !self.analyze_member_types() {
            return false;
        }
        if to_run.contains(PassSet::FIELD) && !self.analyze_fields() {
            return false;
        }
        if to_run.contains(PassSet::FIELD_TYPE) && !self.analyze_field_types() {
            return false;
        }
        if to_run.contains(PassSet::METHOD) && !self.analyze_methods() {
            return false;
        }
        if to_run.contains(PassSet::OVERLOADING) && !self.analyze_overloading() {
            return false;
        }
        if to_run.contains(PassSet::COMPLETION) && !self.analyze_completely() {
            return false;
        }

        true
    }

    // ----- shared accessors -------------------------------------------------

    pub(super) fn defn(&self) -> &TypeDefn {
        self.comp.registry.type_defn(self.target)
    }

    pub(super) fn defn_mut(&mut self) -> &mut TypeDefn {
        self.comp.registry.type_defn_mut(self.target)
    }

    pub(super) fn composite(&self) -> &CompositeType {
        &self.defn().composite
    }

    pub(super) fn composite_mut(&mut self) -> &mut CompositeType {
        &mut self.defn_mut().composite
    }

    pub(super) fn kind(&self) -> CompositeKind {
        self.composite().kind
    }

    pub(super) fn span(&self) -> Span {
        self.defn().span
    }

    pub(super) fn error(&mut self, error: SemanticError, span: Span) {
        self.comp.diagnostics.error(error, span);
    }

    pub(super) fn fatal(&mut self, error: SemanticError, span: Span) {
        self.comp.diagnostics.fatal(error, span);
    }

    pub(super) fn warn(&mut self, error: SemanticError, span: Span) {
        self.comp.diagnostics.warn(error, span);
    }

    pub(super) fn info(&mut self, message: impl Into<String>, span: Span) {
        self.comp.diagnostics.info(message, span);
    }

    // ----- scope creation ---------------------------------------------------

    /// Intern the declared members into the composite's symbol table and the
    /// entity registry. Compiler-synthesized types have no AST; their scope
    /// is prepopulated by whoever synthesized them.
    fn create_members(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::ScopeCreation) {
            return true;
        }

        if let Some(decl) = self.defn().ast.as_ref() {
            let members = decl.members.clone();
            for member in members {
                match member {
                    ast::MemberDecl::Field(field) => self.intern_field(field),
                    ast::MemberDecl::Function(func) => {
                        let name = func.name;
                        let id = self.intern_function(func, name, None);
                        self.add_member(name, DefnRef::Function(id));
                    }
                    ast::MemberDecl::Property(prop) => self.intern_property(prop),
                    ast::MemberDecl::Type(nested) => self.intern_nested_type(nested),
                }
            }
        }

        self.composite_mut().passes.finish(Pass::ScopeCreation);
        true
    }

    fn add_member(&mut self, name: Symbol, defn: DefnRef) {
        let composite = self.composite_mut();
        composite.members.add(name, defn);
        composite.member_order.push(defn);
    }

    /// Traits a member is born with: singular iff the enclosing type is and
    /// the member brings no type parameters of its own.
    fn member_traits(&self, own_params: usize) -> Traits {
        if self.defn().is_singular() && own_params == 0 {
            Traits::SINGULAR
        } else {
            Traits::default()
        }
    }

    fn member_qualified_name(&self, name: Symbol) -> String {
        format!(
            "{}.{}",
            self.defn().qualified_name,
            self.comp.interner.resolve(name)
        )
    }

    fn intern_field(&mut self, field: ast::FieldDecl) {
        let mut traits = self.member_traits(0);
        if field.binding == ast::Binding::Let {
            traits |= Traits::READONLY;
        }
        let qualified_name = self.member_qualified_name(field.name);
        let target = self.target;
        let id = self.comp.registry.add_field(|id| FieldDefn {
            id,
            name: field.name,
            qualified_name,
            defined_in: target,
            binding: field.binding,
            traits,
            visibility: field.visibility,
            storage: field.storage,
            ty_ast: field.ty,
            ty: None,
            init: field.init,
            member_index: -1,
            recursive_index: -1,
            span: field.span,
        });
        self.add_member(field.name, DefnRef::Field(id));
    }

    fn intern_function(
        &mut self,
        func: ast::FuncDecl,
        name: Symbol,
        owning_property: Option<(PropertyDefId, AccessorKind)>,
    ) -> FunctionDefId {
        let mut traits = self.member_traits(func.type_params.len());
        if name == self.comp.names.construct {
            traits |= Traits::CTOR;
        }
        if func.is_final {
            traits |= Traits::FINAL;
        }
        if func.is_override {
            traits |= Traits::OVERRIDE;
        }
        if func.is_undef {
            traits |= Traits::UNDEFINED;
        }
        if func.is_extern {
            traits |= Traits::EXTERN;
        }
        if func.is_intrinsic {
            traits |= Traits::INTRINSIC;
        }

        let params = func
            .params
            .into_iter()
            .map(|p| ParamDefn {
                name: p.name,
                ty_ast: Some(p.ty),
                ty: None,
                default: p.default,
                span: p.span,
            })
            .collect();

        let body = match func.body {
            Some(body) => FunctionBody::Ast(body),
            None => FunctionBody::Absent,
        };

        let qualified_name = self.member_qualified_name(name);
        let target = self.target;
        self.comp.registry.add_function(|id| FunctionDefn {
            id,
            name,
            qualified_name,
            defined_in: target,
            traits,
            visibility: func.visibility,
            storage: func.storage,
            type_params: func.type_params.iter().copied().collect(),
            params,
            return_type: None,
            return_type_ast: func.return_type,
            body,
            dispatch_index: -1,
            overridden: Vec::new(),
            owning_property,
            passes: FnPassSet::default(),
            span: func.span,
        })
    }

    fn intern_property(&mut self, prop: ast::PropertyDecl) {
        let mut traits = self.member_traits(0);
        if prop.is_final {
            traits |= Traits::FINAL;
        }

        let qualified_name = self.member_qualified_name(prop.name);
        let target = self.target;
        let name = prop.name;
        let id = self.comp.registry.add_property(|id| PropertyDefn {
            id,
            name,
            qualified_name,
            defined_in: target,
            kind: prop.kind,
            traits,
            visibility: prop.visibility,
            storage: prop.storage,
            ty_ast: prop.ty,
            ty: None,
            getter: None,
            setter: None,
            span: prop.span,
        });

        // Accessors get distinct interned names so that dispatch tables can
        // hold both without colliding; slot matching also compares the
        // owning property's name.
        if let Some(getter) = prop.getter {
            let getter_name = self.comp.interner.member_path(name, "get");
            let fid = self.intern_function(getter, getter_name, Some((id, AccessorKind::Getter)));
            self.comp.registry.property_mut(id).getter = Some(fid);
        }
        if let Some(setter) = prop.setter {
            let setter_name = self.comp.interner.member_path(name, "set");
            let fid = self.intern_function(setter, setter_name, Some((id, AccessorKind::Setter)));
            self.comp.registry.property_mut(id).setter = Some(fid);
        }

        self.add_member(name, DefnRef::Property(id));
    }

    fn intern_nested_type(&mut self, nested: ast::TypeDecl) {
        let kind = match nested.kind {
            ast::TypeDeclKind::Class => CompositeKind::Class,
            ast::TypeDeclKind::Struct => CompositeKind::Struct,
            ast::TypeDeclKind::Interface => CompositeKind::Interface,
            ast::TypeDeclKind::Protocol => CompositeKind::Protocol,
        };
        let mut traits = Traits::default();
        if nested.is_final {
            traits |= Traits::FINAL;
        }
        if nested.is_abstract {
            traits |= Traits::ABSTRACT;
        }

        let name = nested.name;
        let qualified_name = self.member_qualified_name(name);
        let visibility = nested.visibility;
        let span = nested.span;
        let type_params: SmallVec<[Symbol; 2]> = nested.type_params.iter().copied().collect();
        let target = self.target;
        let id = self.comp.registry.add_type(|id| TypeDefn {
            id,
            name,
            qualified_name,
            ast: Some(nested),
            traits,
            visibility,
            storage: StorageClass::Static,
            parent: Some(target),
            type_params,
            composite: CompositeType::new(kind),
            span,
        });
        self.add_member(name, DefnRef::Type(id));
    }

    // ----- attribute pass ---------------------------------------------------

    /// Modifier wellformedness. Inheritable traits are propagated separately
    /// when the primary base is adopted.
    fn resolve_attributes(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Attribute) {
            return true;
        }

        let mut success = true;
        let defn = self.defn();
        if defn.traits.contains(Traits::FINAL | Traits::ABSTRACT) {
            let span = defn.span;
            self.error(
                SemanticError::FinalAbstractConflict { span: span.into() },
                span,
            );
            success = false;
        }

        self.composite_mut().passes.finish(Pass::Attribute);
        success
    }

    // ----- naming-conflict pass ---------------------------------------------

    /// All overloads of a name must share one definition kind.
    fn check_name_conflicts(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::NamingConflict) {
            return true;
        }

        let mut success = true;
        let groups: Vec<Vec<DefnRef>> = self
            .composite()
            .members
            .iter()
            .map(|(_, defns)| defns.to_vec())
            .collect();

        for defns in groups {
            let first_kind = self.comp.registry.defn_kind(defns[0]);
            let first_span = self.comp.registry.defn_span(defns[0]);
            for &defn in &defns[1..] {
                if self.comp.registry.defn_kind(defn) != first_kind {
                    let name = self
                        .comp
                        .name(self.comp.registry.defn_name(defn))
                        .to_string();
                    let span = self.comp.registry.defn_span(defn);
                    self.error(
                        SemanticError::ConflictingDefinition {
                            name,
                            span: span.into(),
                        },
                        span,
                    );
                    self.info("earlier definition is here", first_span);
                    success = false;
                    break;
                }
            }
        }

        self.composite_mut().passes.finish(Pass::NamingConflict);
        success
    }

    // ----- member-type pass -------------------------------------------------

    /// Nested type members inherit reflection suppression from the target.
    fn analyze_member_types(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::MemberType) {
            return true;
        }

        let nonreflective = self.defn().traits.contains(Traits::NONREFLECTIVE);
        if nonreflective {
            let nested: Vec<TypeDefId> = self
                .composite()
                .member_order
                .iter()
                .filter_map(|defn| match defn {
                    DefnRef::Type(id) => Some(*id),
                    _ => None,
                })
                .collect();
            for id in nested {
                self.comp.registry.type_defn_mut(id).traits |= Traits::NONREFLECTIVE;
            }
        }

        self.composite_mut().passes.finish(Pass::MemberType);
        true
    }

    // ----- completion pass --------------------------------------------------

    /// Bring the super and every member to the code-generation stage. It is
    /// legal for this pass to be running already when triggered again; all
    /// that matters is that every member eventually completes.
    fn analyze_completely(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Completion) {
            return true;
        }

        if let Some(super_id) = self.composite().super_type {
            ClassAnalyzer::new(self.comp, super_id).analyze(AnalysisTask::PrepCodeGeneration);
        }

        let members = self.composite().member_order.clone();
        for member in members {
            self.analyze_defn(member, AnalysisTask::PrepCodeGeneration);
        }

        self.composite_mut().passes.finish(Pass::Completion);
        true
    }

    /// Central dispatch over the definition tag.
    pub(super) fn analyze_defn(&mut self, defn: DefnRef, task: AnalysisTask) -> bool {
        match defn {
            DefnRef::Type(id) => ClassAnalyzer::new(self.comp, id).analyze(task),
            DefnRef::Function(id) => FunctionAnalyzer::new(self.comp, id).analyze(task),
            DefnRef::Field(id) => {
                self.resolve_field_type(id);
                let field_type = self.comp.registry.field(id).ty.clone();
                match field_type.and_then(|ty| ty.composite_defn()) {
                    Some(type_id) => ClassAnalyzer::new(self.comp, type_id).analyze(task),
                    None => true,
                }
            }
            DefnRef::Property(id) => {
                let prop = self.comp.registry.property(id);
                let accessors: Vec<FunctionDefId> =
                    prop.getter.into_iter().chain(prop.setter).collect();
                let mut ok = self.resolve_property_type(id);
                for accessor in accessors {
                    ok &= FunctionAnalyzer::new(self.comp, accessor).analyze(task);
                }
                ok
            }
        }
    }

    /// Elaborate a field's declared type if it has not been already.
    pub(super) fn resolve_field_type(&mut self, id: FieldDefId) -> bool {
        if self.comp.registry.field(id).ty.is_some() {
            return true;
        }
        let ty_ast = self.comp.registry.field(id).ty_ast.clone();
        let scope = Some(self.comp.registry.field(id).defined_in);
        let ty = TypeResolver::new(self.comp, scope).type_from_ast(&ty_ast);
        let ok = !ty.is_invalid();
        self.comp.registry.field_mut(id).ty = Some(ty);
        ok
    }

    pub(super) fn resolve_property_type(&mut self, id: PropertyDefId) -> bool {
        if self.comp.registry.property(id).ty.is_some() {
            return true;
        }
        let ty_ast = self.comp.registry.property(id).ty_ast.clone();
        let scope = Some(self.comp.registry.property(id).defined_in);
        let ty = TypeResolver::new(self.comp, scope).type_from_ast(&ty_ast);
        let ok = !ty.is_invalid();
        self.comp.registry.property_mut(id).ty = Some(ty);
        ok
    }
}
