// src/sema/composite.rs

use smallvec::SmallVec;

use crate::identity::{FieldDefId, FunctionDefId, TypeDefId};
use crate::sema::defs::DefnRef;
use crate::sema::passes::PassRegistry;
use crate::sema::symbol_table::SymbolTable;

/// Semantic classification of a composite type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    Class,
    Struct,
    Interface,
    /// Structural supertype; participates in inheritance lists but is
    /// erased at runtime.
    Protocol,
}

impl CompositeKind {
    pub fn describe(self) -> &'static str {
        match self {
            CompositeKind::Class => "class",
            CompositeKind::Struct => "struct",
            CompositeKind::Interface => "interface",
            CompositeKind::Protocol => "protocol",
        }
    }

    /// Whether a primary base of this kind contributes an embedded
    /// representation to derived types. Protocols never do.
    pub fn has_representation(self) -> bool {
        matches!(self, CompositeKind::Class | CompositeKind::Struct)
    }
}

/// Per-implemented-interface dispatch table. Slots parallel the interface's
/// own instance-method table and hold the concrete implementations.
#[derive(Debug, Clone)]
pub struct InterfaceTable {
    pub interface: TypeDefId,
    pub methods: Vec<FunctionDefId>,
}

/// The semantic object for a composite type: member scope, inheritance
/// graph, field layout, dispatch tables, and the pass registry driving its
/// analysis. Owned exclusively by its [`TypeDefn`](crate::sema::TypeDefn);
/// references to other composites are id handles whose lifetime is the
/// compilation.
#[derive(Debug)]
pub struct CompositeType {
    pub kind: CompositeKind,
    /// The primary base: supplies the representation and vtable prefix
    pub super_type: Option<TypeDefId>,
    /// Direct bases in analysis order; the primary base is first when present
    pub bases: SmallVec<[TypeDefId; 4]>,
    /// Declared members by name
    pub members: SymbolTable,
    /// Declared members in declaration order
    pub member_order: Vec<DefnRef>,
    /// Instance field slots. Slot 0 is `None` (reserved for the superclass
    /// representation) when a representation-carrying super exists.
    pub instance_fields: Vec<Option<FieldDefId>>,
    pub static_fields: Vec<FieldDefId>,
    /// The vtable: dispatchable instance methods in slot order
    pub instance_methods: Vec<FunctionDefId>,
    /// One dispatch table per implemented interface
    pub interfaces: Vec<InterfaceTable>,
    /// Static conversion functions, consulted during implicit conversion
    /// ranking
    pub coercers: Vec<FunctionDefId>,
    pub passes: PassRegistry,
}

impl CompositeType {
    pub fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            super_type: None,
            bases: SmallVec::new(),
            members: SymbolTable::new(),
            member_order: Vec::new(),
            instance_fields: Vec::new(),
            static_fields: Vec::new(),
            instance_methods: Vec::new(),
            interfaces: Vec::new(),
            coercers: Vec::new(),
            passes: PassRegistry::new(),
        }
    }

    /// Number of instance field slots, including the reserved super slot.
    pub fn instance_field_count(&self) -> usize {
        self.instance_fields.len()
    }

    pub fn itable_for(&self, interface: TypeDefId) -> Option<&InterfaceTable> {
        self.interfaces.iter().find(|it| it.interface == interface)
    }
}
