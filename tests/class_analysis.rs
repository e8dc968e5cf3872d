// tests/class_analysis.rs
//! End-to-end scenarios for the composite-type analyzer: inheritance,
//! interface implementation, constructor synthesis, and the dispatch-table
//! invariants that every successfully analyzed hierarchy must satisfy.

use tern::frontend::ast::*;
use tern::frontend::Span;
use tern::identity::TypeDefId;
use tern::sema::{AnalysisTask, Compilation, DefnRef, Pass};
use tern::SemanticError;

fn sp() -> Span {
    Span::default()
}

fn named(comp: &mut Compilation, name: &str) -> TypeExpr {
    TypeExpr::Named(comp.interner.intern(name), sp())
}

fn prim(p: PrimitiveType) -> TypeExpr {
    TypeExpr::Primitive(p, sp())
}

fn declare(
    comp: &mut Compilation,
    kind: TypeDeclKind,
    name: &str,
    bases: Vec<TypeExpr>,
    members: Vec<MemberDecl>,
) -> TypeDefId {
    let name = comp.interner.intern(name);
    comp.declare(TypeDecl {
        name,
        kind,
        visibility: Visibility::Public,
        is_final: false,
        is_abstract: false,
        type_params: Vec::new(),
        bases,
        members,
        span: sp(),
    })
}

fn method(comp: &mut Compilation, name: &str, has_body: bool) -> FuncDecl {
    FuncDecl {
        name: comp.interner.intern(name),
        visibility: Visibility::Public,
        storage: StorageClass::Instance,
        is_final: false,
        is_override: false,
        is_undef: false,
        is_extern: false,
        is_intrinsic: false,
        type_params: Vec::new(),
        params: Vec::new(),
        return_type: None,
        body: has_body.then(|| FuncBody { span: sp() }),
        span: sp(),
    }
}

fn field(
    comp: &mut Compilation,
    name: &str,
    visibility: Visibility,
    init: Option<Expr>,
) -> FieldDecl {
    FieldDecl {
        name: comp.interner.intern(name),
        binding: Binding::Var,
        visibility,
        storage: StorageClass::Instance,
        ty: prim(PrimitiveType::I64),
        init,
        span: sp(),
    }
}

fn member_function(comp: &Compilation, id: TypeDefId, name: &str) -> tern::identity::FunctionDefId {
    let composite = &comp.registry.type_defn(id).composite;
    let sym = composite
        .members
        .names()
        .find(|&s| comp.name(s) == name)
        .expect("member name not found");
    match composite.members.get(sym)[0] {
        DefnRef::Function(f) => f,
        other => panic!("expected function member, found {other:?}"),
    }
}

fn errors(comp: &Compilation) -> Vec<SemanticError> {
    comp.diagnostics
        .semantic_reports()
        .map(|(err, _)| err.clone())
        .collect()
}

// S1 — single class inheritance with an override.
#[test]
fn single_class_inheritance_overrides_in_place() {
    let mut comp = Compilation::new();
    let foo = method(&mut comp, "foo", true);
    let a = declare(
        &mut comp,
        TypeDeclKind::Class,
        "A",
        Vec::new(),
        vec![MemberDecl::Function(foo)],
    );
    let mut foo_override = method(&mut comp, "foo", true);
    foo_override.is_override = true;
    let base = named(&mut comp, "A");
    let b = declare(
        &mut comp,
        TypeDeclKind::Class,
        "B",
        vec![base],
        vec![MemberDecl::Function(foo_override)],
    );

    assert!(comp.prepare(b, AnalysisTask::PrepEvaluation));

    let b_composite = &comp.registry.type_defn(b).composite;
    assert_eq!(b_composite.super_type, Some(a));
    assert_eq!(b_composite.bases.first(), Some(&a));

    let a_methods = &comp.registry.type_defn(a).composite.instance_methods;
    let b_methods = &comp.registry.type_defn(b).composite.instance_methods;
    assert_eq!(a_methods.len(), b_methods.len());

    let a_foo = member_function(&comp, a, "foo");
    let b_foo = member_function(&comp, b, "foo");
    let slot = comp.registry.function(a_foo).dispatch_index as usize;
    assert_eq!(b_methods[slot], b_foo);
    assert_eq!(comp.registry.function(b_foo).overridden, vec![a_foo]);
    assert_eq!(comp.registry.function(b_foo).dispatch_index as usize, slot);
}

// S2 — interface implementation fills the itable.
#[test]
fn interface_implementation_fills_dispatch_table() {
    let mut comp = Compilation::new();
    let m_decl = method(&mut comp, "m", false);
    let i = declare(
        &mut comp,
        TypeDeclKind::Interface,
        "I",
        Vec::new(),
        vec![MemberDecl::Function(m_decl)],
    );
    let m_impl = method(&mut comp, "m", true);
    let base = named(&mut comp, "I");
    let c = declare(
        &mut comp,
        TypeDeclKind::Class,
        "C",
        vec![base],
        vec![MemberDecl::Function(m_impl)],
    );

    assert!(comp.prepare(c, AnalysisTask::PrepEvaluation));
    assert!(!comp.diagnostics.has_errors());

    let c_composite = &comp.registry.type_defn(c).composite;
    assert_eq!(c_composite.interfaces.len(), 1);
    let itable = &c_composite.interfaces[0];
    assert_eq!(itable.interface, i);

    let c_m = member_function(&comp, c, "m");
    assert_eq!(itable.methods[0], c_m);
}

// S3 — missing interface implementation is an abstractness failure.
#[test]
fn missing_interface_implementation_is_diagnosed() {
    let mut comp = Compilation::new();
    let m_decl = method(&mut comp, "m", false);
    declare(
        &mut comp,
        TypeDeclKind::Interface,
        "I",
        Vec::new(),
        vec![MemberDecl::Function(m_decl)],
    );
    let base = named(&mut comp, "I");
    let c = declare(&mut comp, TypeDeclKind::Class, "C", vec![base], Vec::new());

    assert!(!comp.prepare(c, AnalysisTask::PrepEvaluation));
    assert!(errors(&comp)
        .iter()
        .any(|e| matches!(e, SemanticError::UnimplementedInterface { .. })));
}

// S4 — circular inheritance is caught by the running-pass guard.
#[test]
fn circular_inheritance_is_diagnosed() {
    let mut comp = Compilation::new();
    let y_base = named(&mut comp, "Y");
    let x = declare(&mut comp, TypeDeclKind::Class, "X", vec![y_base], Vec::new());
    let x_base = named(&mut comp, "X");
    declare(&mut comp, TypeDeclKind::Class, "Y", vec![x_base], Vec::new());

    assert!(!comp.prepare(x, AnalysisTask::PrepMemberLookup));
    assert!(errors(&comp)
        .iter()
        .any(|e| matches!(e, SemanticError::CircularInheritance { .. })));
}

// S5 — default constructor synthesis from the field set.
#[test]
fn default_constructor_is_synthesized_from_fields() {
    let mut comp = Compilation::new();
    let x = field(&mut comp, "x", Visibility::Public, None);
    let y = field(
        &mut comp,
        "y",
        Visibility::Public,
        Some(Expr::Literal(Literal::Int(3), sp())),
    );
    let z = field(
        &mut comp,
        "z",
        Visibility::Private,
        Some(Expr::Literal(Literal::Int(0), sp())),
    );
    let p = declare(
        &mut comp,
        TypeDeclKind::Class,
        "P",
        Vec::new(),
        vec![
            MemberDecl::Field(x),
            MemberDecl::Field(y),
            MemberDecl::Field(z),
        ],
    );

    assert!(comp.prepare(p, AnalysisTask::PrepConstruction));

    let ctors = comp
        .registry
        .type_defn(p)
        .composite
        .members
        .get(comp.names.construct);
    assert_eq!(ctors.len(), 1);
    let DefnRef::Function(ctor) = ctors[0] else {
        panic!("synthesized constructor is not a function");
    };

    let ctor = comp.registry.function(ctor);
    assert!(ctor.is_ctor());
    assert_eq!(ctor.params.len(), 2);
    assert_eq!(comp.name(ctor.params[0].name), "x");
    assert!(ctor.params[0].default.is_none());
    assert_eq!(comp.name(ctor.params[1].name), "y");
    assert!(ctor.params[1].default.is_some());

    let tern::sema::FunctionBody::FieldInits(inits) = &ctor.body else {
        panic!("synthesized constructor has no field-init body");
    };
    assert_eq!(inits.len(), 3);
}

// S6 — two concrete supertypes.
#[test]
fn multiple_concrete_supertypes_are_rejected() {
    let mut comp = Compilation::new();
    declare(&mut comp, TypeDeclKind::Class, "A", Vec::new(), Vec::new());
    declare(&mut comp, TypeDeclKind::Class, "B", Vec::new(), Vec::new());
    let a_base = named(&mut comp, "A");
    let b_base = named(&mut comp, "B");
    let c = declare(
        &mut comp,
        TypeDeclKind::Class,
        "C",
        vec![a_base, b_base],
        Vec::new(),
    );

    comp.prepare(c, AnalysisTask::PrepMemberLookup);
    assert!(errors(&comp)
        .iter()
        .any(|e| matches!(e, SemanticError::MultipleSupertypes { .. })));
}

// Property 2 — a full preparation finishes every pass.
#[test]
fn code_generation_task_finishes_all_passes() {
    let mut comp = Compilation::new();
    let m = method(&mut comp, "m", true);
    let a = declare(
        &mut comp,
        TypeDeclKind::Class,
        "A",
        Vec::new(),
        vec![MemberDecl::Function(m)],
    );

    assert!(comp.prepare(a, AnalysisTask::PrepCodeGeneration));
    let passes = &comp.registry.type_defn(a).composite.passes;
    for pass in [
        Pass::ScopeCreation,
        Pass::BaseTypes,
        Pass::Attribute,
        Pass::NamingConflict,
        Pass::Converter,
        Pass::Constructor,
        Pass::MemberType,
        Pass::Field,
        Pass::FieldType,
        Pass::Method,
        Pass::Overloading,
        Pass::Completion,
    ] {
        assert!(passes.is_finished(pass), "{pass:?} not finished");
    }
}

// Property 3 — vtable monotonicity along the primary base.
#[test]
fn vtable_slots_are_inherited_or_overridden() {
    let mut comp = Compilation::new();
    let one = method(&mut comp, "one", true);
    let two = method(&mut comp, "two", true);
    let base = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Base",
        Vec::new(),
        vec![MemberDecl::Function(one), MemberDecl::Function(two)],
    );
    let mut two_override = method(&mut comp, "two", true);
    two_override.is_override = true;
    let three = method(&mut comp, "three", true);
    let base_expr = named(&mut comp, "Base");
    let derived = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Derived",
        vec![base_expr],
        vec![
            MemberDecl::Function(two_override),
            MemberDecl::Function(three),
        ],
    );

    assert!(comp.prepare(derived, AnalysisTask::PrepEvaluation));

    let base_methods = comp.registry.type_defn(base).composite.instance_methods.clone();
    let derived_methods = comp
        .registry
        .type_defn(derived)
        .composite
        .instance_methods
        .clone();
    assert!(derived_methods.len() > base_methods.len());

    for (i, &inherited) in base_methods.iter().enumerate() {
        let slot = derived_methods[i];
        let overrides = &comp.registry.function(slot).overridden;
        assert!(
            slot == inherited || overrides.contains(&inherited),
            "slot {i} neither inherited nor overridden"
        );
    }

    // Dispatch indices are consistent with slot positions.
    for (i, &slot) in derived_methods.iter().enumerate() {
        let index = comp.registry.function(slot).dispatch_index;
        assert_eq!(index as usize, i);
    }
}

// Property 4 — itable sizing, including interface extension sharing the
// primary parent's table.
#[test]
fn itable_parallels_interface_vtable() {
    let mut comp = Compilation::new();
    let m_decl = method(&mut comp, "m", false);
    let i = declare(
        &mut comp,
        TypeDeclKind::Interface,
        "I",
        Vec::new(),
        vec![MemberDecl::Function(m_decl)],
    );
    let n_decl = method(&mut comp, "n", false);
    let i_base = named(&mut comp, "I");
    let j = declare(
        &mut comp,
        TypeDeclKind::Interface,
        "J",
        vec![i_base],
        vec![MemberDecl::Function(n_decl)],
    );
    let m_impl = method(&mut comp, "m", true);
    let n_impl = method(&mut comp, "n", true);
    let j_base = named(&mut comp, "J");
    let c = declare(
        &mut comp,
        TypeDeclKind::Class,
        "C",
        vec![j_base],
        vec![MemberDecl::Function(m_impl), MemberDecl::Function(n_impl)],
    );

    assert!(comp.prepare(c, AnalysisTask::PrepEvaluation));
    assert!(!comp.diagnostics.has_errors());

    let c_composite = &comp.registry.type_defn(c).composite;
    // I is J's primary parent, so it shares J's table: one itable total.
    assert_eq!(c_composite.interfaces.len(), 1);
    let itable = &c_composite.interfaces[0];
    assert_eq!(itable.interface, j);
    assert_eq!(
        itable.methods.len(),
        comp.registry.type_defn(j).composite.instance_methods.len()
    );

    let c_m = member_function(&comp, c, "m");
    let c_n = member_function(&comp, c, "n");
    assert!(itable.methods.contains(&c_m));
    assert!(itable.methods.contains(&c_n));
    assert!(c_composite.itable_for(i).is_none());
}

// Property 5 — field index law across the supertype chain.
#[test]
fn field_indices_continue_past_the_super() {
    let mut comp = Compilation::new();
    let a_field = field(&mut comp, "a", Visibility::Public, None);
    let base = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Base",
        Vec::new(),
        vec![MemberDecl::Field(a_field)],
    );
    let b_field = field(&mut comp, "b", Visibility::Public, None);
    let base_expr = named(&mut comp, "Base");
    let derived = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Derived",
        vec![base_expr],
        vec![MemberDecl::Field(b_field)],
    );

    assert!(comp.prepare(derived, AnalysisTask::PrepTypeGeneration));

    let derived_composite = &comp.registry.type_defn(derived).composite;
    // Slot 0 is the reserved super slot.
    assert!(derived_composite.instance_fields[0].is_none());

    let super_count = comp.registry.recursive_field_count(base);
    let b_id = derived_composite.instance_fields[1].expect("field slot");
    let b_defn = comp.registry.field(b_id);
    assert_eq!(b_defn.member_index, 1);
    assert!(b_defn.recursive_index as usize >= super_count);
}

// Hiding without an override-compatible signature warns and appends a new
// slot instead of replacing the old one.
#[test]
fn incompatible_same_name_method_hides_base_method() {
    let mut comp = Compilation::new();
    let f = method(&mut comp, "f", true);
    let base = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Base",
        Vec::new(),
        vec![MemberDecl::Function(f)],
    );
    let mut f_with_arg = method(&mut comp, "f", true);
    f_with_arg.params = vec![ParamDecl {
        name: comp.interner.intern("value"),
        ty: prim(PrimitiveType::I64),
        default: None,
        span: sp(),
    }];
    let base_expr = named(&mut comp, "Base");
    let derived = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Derived",
        vec![base_expr],
        vec![MemberDecl::Function(f_with_arg)],
    );

    assert!(comp.prepare(derived, AnalysisTask::PrepEvaluation));
    assert!(errors(&comp)
        .iter()
        .any(|e| matches!(e, SemanticError::HiddenMember { .. })));

    let base_f = member_function(&comp, base, "f");
    let derived_f = member_function(&comp, derived, "f");
    let derived_methods = &comp.registry.type_defn(derived).composite.instance_methods;
    // The base slot is untouched; the new method gets a fresh slot.
    assert_eq!(derived_methods[0], base_f);
    assert_eq!(derived_methods[1], derived_f);
    assert!(comp.registry.function(derived_f).overridden.is_empty());
}

// Overriding without the keyword is legal but warned about.
#[test]
fn override_without_keyword_warns() {
    let mut comp = Compilation::new();
    let f = method(&mut comp, "f", true);
    declare(
        &mut comp,
        TypeDeclKind::Class,
        "Base",
        Vec::new(),
        vec![MemberDecl::Function(f)],
    );
    let f_again = method(&mut comp, "f", true);
    let base_expr = named(&mut comp, "Base");
    let derived = declare(
        &mut comp,
        TypeDeclKind::Class,
        "Derived",
        vec![base_expr],
        vec![MemberDecl::Function(f_again)],
    );

    assert!(comp.prepare(derived, AnalysisTask::PrepEvaluation));
    assert!(errors(&comp)
        .iter()
        .any(|e| matches!(e, SemanticError::OverrideMissingKeyword { .. })));
    // A warning, not an error: the compilation is still clean.
    assert!(!comp.diagnostics.has_errors());
}

// Property 1 — preparing twice changes nothing observable.
#[test]
fn repeated_preparation_is_idempotent() {
    let mut comp = Compilation::new();
    let foo = method(&mut comp, "foo", true);
    declare(
        &mut comp,
        TypeDeclKind::Class,
        "A",
        Vec::new(),
        vec![MemberDecl::Function(foo)],
    );
    let mut foo_override = method(&mut comp, "foo", true);
    foo_override.is_override = true;
    let base = named(&mut comp, "A");
    let b = declare(
        &mut comp,
        TypeDeclKind::Class,
        "B",
        vec![base],
        vec![MemberDecl::Function(foo_override)],
    );

    assert!(comp.prepare(b, AnalysisTask::PrepCodeGeneration));
    let methods = comp.registry.type_defn(b).composite.instance_methods.clone();
    let itables = comp.registry.type_defn(b).composite.interfaces.len();
    let reports = comp.diagnostics.reports().len();

    assert!(comp.prepare(b, AnalysisTask::PrepCodeGeneration));
    let composite = &comp.registry.type_defn(b).composite;
    assert_eq!(composite.instance_methods, methods);
    assert_eq!(composite.interfaces.len(), itables);
    assert_eq!(comp.diagnostics.reports().len(), reports);
}
