// src/sema/compatibility.rs
//
// Signature comparison and override compatibility. These are pure
// predicates over elaborated signatures; they assume the signature pass has
// already run on both functions.

use crate::identity::{FunctionDefId, TypeDefId};
use crate::sema::defs::FunctionDefn;
use crate::sema::types::Type;
use crate::sema::EntityRegistry;

/// Reflexive, transitive derivation over the base graph.
pub fn derives_from(registry: &EntityRegistry, derived: TypeDefId, base: TypeDefId) -> bool {
    if derived == base {
        return true;
    }
    registry
        .type_defn(derived)
        .composite
        .bases
        .iter()
        .any(|&b| derives_from(registry, b, base))
}

fn param_types_equal(a: &FunctionDefn, b: &FunctionDefn) -> bool {
    a.params.len() == b.params.len()
        && a.params.iter().zip(b.params.iter()).all(|(pa, pb)| {
            // Unresolved parameter types never compare equal; a failed
            // signature pass must not manufacture conflicts.
            matches!((&pa.ty, &pb.ty), (Some(ta), Some(tb)) if ta == tb)
        })
}

/// Two functions conflict when their parameter-type tuples and their
/// static/instance classification are both equal.
pub fn same_signature(registry: &EntityRegistry, a: FunctionDefId, b: FunctionDefId) -> bool {
    let fa = registry.function(a);
    let fb = registry.function(b);
    fa.storage == fb.storage && param_types_equal(fa, fb)
}

fn return_compatible(registry: &EntityRegistry, new: &Type, old: &Type) -> bool {
    if new == old {
        return true;
    }
    // Covariant returns: a derived composite may narrow the result.
    match (new.composite_defn(), old.composite_defn()) {
        (Some(n), Some(o)) => derives_from(registry, n, o),
        _ => false,
    }
}

/// Whether `new` may occupy a dispatch slot held by `old`: parameters are
/// invariant, returns are covariant under the base graph, and both must be
/// instance methods.
pub fn can_override(registry: &EntityRegistry, new: FunctionDefId, old: FunctionDefId) -> bool {
    let fnew = registry.function(new);
    let fold = registry.function(old);
    if fnew.storage != fold.storage {
        return false;
    }
    if !param_types_equal(fnew, fold) {
        return false;
    }
    match (&fnew.return_type, &fold.return_type) {
        (Some(rn), Some(ro)) => return_compatible(registry, rn, ro),
        _ => false,
    }
}
