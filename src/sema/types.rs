// src/sema/types.rs
//! The elaborated type model.
//!
//! Composite types are referenced by [`TypeDefId`]; the full semantic record
//! lives in the [`EntityRegistry`](crate::sema::EntityRegistry). Everything
//! that needs registry context (singularity, type class) takes the registry
//! as an argument rather than holding a back-pointer.

use crate::frontend::ast::{PrimitiveType, Symbol};
use crate::identity::TypeDefId;
use crate::sema::EntityRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    /// Reference to a composite type definition
    Composite(TypeDefId),
    /// A template applied to type arguments: `List[Int]`
    Specialized {
        def: TypeDefId,
        args: Vec<Type>,
    },
    /// An unbound template parameter
    TypeParam(Symbol),
    Array(Box<Type>),
    Union(Vec<Type>),
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    /// Error recovery placeholder; compatible with nothing and everything
    Invalid,
}

impl Type {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// The definition this type reduces to, if it names a composite.
    pub fn composite_defn(&self) -> Option<TypeDefId> {
        match self {
            Type::Composite(id) | Type::Specialized { def: id, .. } => Some(*id),
            _ => None,
        }
    }

    /// A type is singular when no free type parameters remain anywhere in it.
    /// Only singular types are eligible for layout and code generation.
    pub fn is_singular(&self, registry: &EntityRegistry) -> bool {
        match self {
            Type::Primitive(_) | Type::Void | Type::Invalid => true,
            Type::TypeParam(_) => false,
            Type::Composite(id) => !registry.type_defn(*id).is_template(),
            Type::Specialized { args, .. } => args.iter().all(|a| a.is_singular(registry)),
            Type::Array(elem) => elem.is_singular(registry),
            Type::Union(members) => members.iter().all(|m| m.is_singular(registry)),
            Type::Function { params, ret } => {
                params.iter().all(|p| p.is_singular(registry)) && ret.is_singular(registry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::PrimitiveType;

    #[test]
    fn primitives_are_singular() {
        let registry = EntityRegistry::new();
        assert!(Type::Primitive(PrimitiveType::I32).is_singular(&registry));
        assert!(Type::Void.is_singular(&registry));
    }

    #[test]
    fn type_params_are_not_singular() {
        let registry = EntityRegistry::new();
        let t = Type::TypeParam(Symbol(0));
        assert!(!t.is_singular(&registry));
        assert!(!Type::Array(Box::new(t)).is_singular(&registry));
    }

    #[test]
    fn composite_defn_reduces_specializations() {
        let defn = TypeDefId::new(7);
        let ty = Type::Specialized {
            def: defn,
            args: vec![Type::Primitive(PrimitiveType::Bool)],
        };
        assert_eq!(ty.composite_defn(), Some(defn));
        assert_eq!(Type::Void.composite_defn(), None);
    }
}
