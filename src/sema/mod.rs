// src/sema/mod.rs

pub mod analyzer;
pub mod compatibility;
pub mod composite;
pub mod defs;
pub mod passes;
pub mod registry;
pub mod resolve;
pub mod symbol_table;
pub mod types;

mod function_analyzer;

pub use analyzer::ClassAnalyzer;
pub use composite::{CompositeKind, CompositeType, InterfaceTable};
pub use defs::{
    AccessorKind, DefnKind, DefnRef, FieldDefn, FunctionBody, FunctionDefn, ParamDefn,
    PropertyDefn, Traits, TypeDefn,
};
pub use function_analyzer::FunctionAnalyzer;
pub use passes::{AnalysisTask, FnPassSet, Pass, PassRegistry, PassSet};
pub use registry::{EntityRegistry, Module};
pub use resolve::TypeResolver;
pub use symbol_table::SymbolTable;
pub use types::Type;

use smallvec::SmallVec;

use crate::errors::Diagnostics;
use crate::frontend::ast::{self, StorageClass, Symbol, TypeDeclKind, Visibility};
use crate::frontend::{Interner, Span};
use crate::identity::TypeDefId;

/// Names with fixed meaning in composite-type analysis.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownNames {
    /// Instance constructor member name
    pub construct: Symbol,
    /// Static creator-function member name
    pub create: Symbol,
    /// Static conversion-function member name
    pub coerce: Symbol,
    /// The root class
    pub object: Symbol,
}

/// Per-compilation state: the entity arena, the module scope, the
/// diagnostics sink, and the interned-string pool. All analyzers borrow
/// this mutably; analysis is single-threaded and strictly cooperative.
#[derive(Debug)]
pub struct Compilation {
    pub interner: Interner,
    pub registry: EntityRegistry,
    pub module: Module,
    pub diagnostics: Diagnostics,
    pub names: WellKnownNames,
    /// The root class every base-less class derives from
    pub object: TypeDefId,
    /// Definitions the type resolver has scheduled for later analysis
    pending: Vec<(TypeDefId, AnalysisTask)>,
}

impl Compilation {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let names = WellKnownNames {
            construct: interner.intern("construct"),
            create: interner.intern("create"),
            coerce: interner.intern("coerce"),
            object: interner.intern("Object"),
        };

        let mut registry = EntityRegistry::new();
        let object = registry.add_type(|id| TypeDefn {
            id,
            name: names.object,
            qualified_name: "Object".to_string(),
            ast: None,
            traits: Traits::SYNTHETIC,
            visibility: Visibility::Public,
            storage: StorageClass::Static,
            parent: None,
            type_params: SmallVec::new(),
            composite: CompositeType::new(CompositeKind::Class),
            span: Span::default(),
        });

        let mut module = Module::default();
        module.scope.add(names.object, DefnRef::Type(object));

        Self {
            interner,
            registry,
            module,
            diagnostics: Diagnostics::new(),
            names,
            object,
            pending: Vec::new(),
        }
    }

    /// Intake a top-level composite type declaration. Members are not
    /// interned until the type's scope-creation pass runs.
    pub fn declare(&mut self, decl: ast::TypeDecl) -> TypeDefId {
        let kind = match decl.kind {
            TypeDeclKind::Class => CompositeKind::Class,
            TypeDeclKind::Struct => CompositeKind::Struct,
            TypeDeclKind::Interface => CompositeKind::Interface,
            TypeDeclKind::Protocol => CompositeKind::Protocol,
        };

        let mut traits = Traits::default();
        if decl.is_final {
            traits |= Traits::FINAL;
        }
        if decl.is_abstract {
            traits |= Traits::ABSTRACT;
        }

        let name = decl.name;
        let qualified_name = self.interner.resolve(name).to_string();
        let visibility = decl.visibility;
        let span = decl.span;
        let type_params: SmallVec<[Symbol; 2]> = decl.type_params.iter().copied().collect();

        let id = self.registry.add_type(|id| TypeDefn {
            id,
            name,
            qualified_name,
            ast: Some(decl),
            traits,
            visibility,
            storage: StorageClass::Static,
            parent: None,
            type_params,
            composite: CompositeType::new(kind),
            span,
        });
        self.module.scope.add(name, DefnRef::Type(id));
        id
    }

    /// Bring a composite type to the given task, then drain any definitions
    /// the type resolver scheduled along the way.
    pub fn prepare(&mut self, id: TypeDefId, task: AnalysisTask) -> bool {
        let ok = ClassAnalyzer::new(self, id).analyze(task);
        self.drain_pending();
        ok
    }

    pub(crate) fn schedule(&mut self, id: TypeDefId, task: AnalysisTask) {
        self.pending.push((id, task));
    }

    fn drain_pending(&mut self) {
        while let Some((id, task)) = self.pending.pop() {
            ClassAnalyzer::new(self, id).analyze(task);
        }
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Qualified name of a type, for diagnostics.
    pub fn type_name(&self, id: TypeDefId) -> String {
        self.registry.type_defn(id).qualified_name.clone()
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}
