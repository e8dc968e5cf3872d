// src/sema/defs.rs
//! Definition records for language entities.
//!
//! Definitions are a tagged sum ([`DefnRef`]) over typed records held in the
//! [`EntityRegistry`](crate::sema::EntityRegistry). Each record carries a
//! one-word trait bitset; attribute checks are set algebra, not virtual
//! dispatch.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::frontend::ast;
use crate::frontend::ast::{Binding, StorageClass, Symbol, Visibility};
use crate::frontend::Span;
use crate::identity::{FieldDefId, FunctionDefId, PropertyDefId, TypeDefId};
use crate::sema::composite::CompositeType;
use crate::sema::passes::FnPassSet;
use crate::sema::types::Type;

bitflags! {
    /// Definition traits. One word per definition; inheritable traits are
    /// propagated by the attribute and base-type passes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Traits: u16 {
        const FINAL         = 1 << 0;
        const ABSTRACT      = 1 << 1;
        /// Declared with `undef`: erases an inherited method slot
        const UNDEFINED     = 1 << 2;
        /// The function is a constructor
        const CTOR          = 1 << 3;
        /// No free type parameters remain; eligible for code generation
        const SINGULAR      = 1 << 4;
        /// Created by the compiler, not written by the user
        const SYNTHETIC     = 1 << 5;
        /// Excluded from runtime reflection metadata
        const NONREFLECTIVE = 1 << 6;
        const READONLY      = 1 << 7;
        /// Declared with `override`
        const OVERRIDE      = 1 << 8;
        const EXTERN        = 1 << 9;
        const INTRINSIC     = 1 << 10;
    }
}

/// Discriminant of a definition, used for name-conflict checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefnKind {
    Type,
    Var,
    Let,
    Function,
    Property,
    Indexer,
}

/// A reference to any definition: the tagged sum over entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefnRef {
    Type(TypeDefId),
    Function(FunctionDefId),
    Field(FieldDefId),
    Property(PropertyDefId),
}

/// The definition record for a named composite type. Owns its
/// [`CompositeType`]; all other inter-type links are id handles.
#[derive(Debug)]
pub struct TypeDefn {
    pub id: TypeDefId,
    pub name: Symbol,
    pub qualified_name: String,
    /// None for compiler-synthesized types, which have their semantic
    /// structure prepopulated instead of analyzed from syntax.
    pub ast: Option<ast::TypeDecl>,
    pub traits: Traits,
    pub visibility: Visibility,
    pub storage: StorageClass,
    /// Enclosing type scope for nested type definitions
    pub parent: Option<TypeDefId>,
    pub type_params: SmallVec<[Symbol; 2]>,
    pub composite: CompositeType,
    pub span: Span,
}

impl TypeDefn {
    pub fn is_final(&self) -> bool {
        self.traits.contains(Traits::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.traits.contains(Traits::ABSTRACT)
    }

    pub fn is_synthetic(&self) -> bool {
        self.traits.contains(Traits::SYNTHETIC)
    }

    /// A template still has unbound type parameters and therefore is not a
    /// type; it only becomes one through specialization.
    pub fn is_template(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_singular(&self) -> bool {
        !self.is_template()
    }
}

/// The definition record for a function: method, constructor, accessor, or
/// coercer.
#[derive(Debug)]
pub struct FunctionDefn {
    pub id: FunctionDefId,
    pub name: Symbol,
    pub qualified_name: String,
    pub defined_in: TypeDefId,
    pub traits: Traits,
    pub visibility: Visibility,
    pub storage: StorageClass,
    pub type_params: SmallVec<[Symbol; 2]>,
    pub params: Vec<ParamDefn>,
    /// None until the signature pass has run; constructors default to Void
    pub return_type: Option<Type>,
    pub return_type_ast: Option<ast::TypeExpr>,
    pub body: FunctionBody,
    /// Position in the owning type's vtable; -1 for statically dispatched
    /// functions.
    pub dispatch_index: i32,
    /// Methods from base types this function overrides
    pub overridden: Vec<FunctionDefId>,
    /// Set when the function is a property or indexer accessor
    pub owning_property: Option<(PropertyDefId, AccessorKind)>,
    pub passes: FnPassSet,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

/// Body of a function, as far as this layer cares: present, absent, or a
/// synthesized list of field initializations.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    Absent,
    /// User-written statements, opaque to the composite-type analyzer
    Ast(ast::FuncBody),
    /// Synthesized default-constructor body
    FieldInits(Vec<FieldInit>),
}

/// One assignment in a synthesized default constructor.
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub field: FieldDefId,
    pub value: FieldInitValue,
}

#[derive(Debug, Clone)]
pub enum FieldInitValue {
    /// Assign from the constructor parameter at this position
    Param(usize),
    /// Assign the field's default expression directly
    Default(ast::Expr),
}

impl FunctionDefn {
    pub fn is_ctor(&self) -> bool {
        self.traits.contains(Traits::CTOR)
    }

    pub fn is_final(&self) -> bool {
        self.traits.contains(Traits::FINAL)
    }

    pub fn is_undefined(&self) -> bool {
        self.traits.contains(Traits::UNDEFINED)
    }

    pub fn is_override(&self) -> bool {
        self.traits.contains(Traits::OVERRIDE)
    }

    pub fn is_singular(&self) -> bool {
        self.traits.contains(Traits::SINGULAR)
    }

    pub fn has_body(&self) -> bool {
        !matches!(self.body, FunctionBody::Absent)
    }

    pub fn has_unbound_type_params(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Methods that never require a body: externally supplied, expanded by
    /// the compiler, or explicitly undefined.
    pub fn body_optional(&self) -> bool {
        self.traits
            .intersects(Traits::EXTERN | Traits::INTRINSIC | Traits::UNDEFINED)
    }

    /// Callable with zero arguments: every parameter has a default.
    pub fn is_default_callable(&self) -> bool {
        self.params.iter().all(|p| p.default.is_some())
    }
}

/// A function parameter. The declared type is elaborated by the signature
/// pass; until then only the AST form is present.
#[derive(Debug)]
pub struct ParamDefn {
    pub name: Symbol,
    pub ty_ast: Option<ast::TypeExpr>,
    pub ty: Option<Type>,
    pub default: Option<ast::Expr>,
    pub span: Span,
}

/// The definition record for a data member.
#[derive(Debug)]
pub struct FieldDefn {
    pub id: FieldDefId,
    pub name: Symbol,
    pub qualified_name: String,
    pub defined_in: TypeDefId,
    pub binding: Binding,
    pub traits: Traits,
    pub visibility: Visibility,
    pub storage: StorageClass,
    pub ty_ast: ast::TypeExpr,
    pub ty: Option<Type>,
    pub init: Option<ast::Expr>,
    /// Slot within the defining type; -1 until the field pass assigns it
    pub member_index: i32,
    /// Slot counting all supertype fields; -1 until the field pass assigns it
    pub recursive_index: i32,
    pub span: Span,
}

impl FieldDefn {
    /// A `let` with a compile-time constant initializer needs no storage.
    pub fn requires_storage(&self) -> bool {
        match (self.binding, &self.init) {
            (Binding::Let, Some(init)) => !init.is_constant(),
            _ => true,
        }
    }
}

/// The definition record for a property or indexer.
#[derive(Debug)]
pub struct PropertyDefn {
    pub id: PropertyDefId,
    pub name: Symbol,
    pub qualified_name: String,
    pub defined_in: TypeDefId,
    pub kind: ast::PropertyKind,
    pub traits: Traits,
    pub visibility: Visibility,
    pub storage: StorageClass,
    pub ty_ast: ast::TypeExpr,
    pub ty: Option<Type>,
    pub getter: Option<FunctionDefId>,
    pub setter: Option<FunctionDefId>,
    pub span: Span,
}

impl PropertyDefn {
    pub fn is_singular(&self) -> bool {
        self.traits.contains(Traits::SINGULAR)
    }
}
