// src/errors/sema.rs
//! Semantic analysis errors (E2xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("undefined type '{name}'")]
    #[diagnostic(code(E2101))]
    UndefinedType {
        name: String,
        #[label("not found in scope")]
        span: SourceSpan,
    },

    #[error("multiple definitions for '{name}'")]
    #[diagnostic(code(E2102))]
    AmbiguousType {
        name: String,
        #[label("ambiguous reference")]
        span: SourceSpan,
    },

    #[error("'{name}' is not a type expression")]
    #[diagnostic(code(E2103))]
    NotAType {
        name: String,
        #[label("expected a type")]
        span: SourceSpan,
    },

    #[error("wrong number of type arguments for '{name}': expected {expected}, found {found}")]
    #[diagnostic(code(E2104))]
    WrongTypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        #[label("in this specialization")]
        span: SourceSpan,
    },

    #[error("cannot inherit from '{name}'")]
    #[diagnostic(code(E2110))]
    CannotInherit {
        name: String,
        #[label("not an inheritable type")]
        span: SourceSpan,
    },

    #[error("base type '{name}' is a template, not a type")]
    #[diagnostic(code(E2111), help("specialize the template before inheriting from it"))]
    BaseIsTemplate {
        name: String,
        #[label("unspecialized template")]
        span: SourceSpan,
    },

    #[error("base type '{name}' is final")]
    #[diagnostic(code(E2112))]
    BaseIsFinal {
        name: String,
        #[label("cannot inherit from a final type")]
        span: SourceSpan,
    },

    #[error("{kind} type cannot be final")]
    #[diagnostic(code(E2113))]
    AbstractKindFinal {
        kind: String,
        #[label("remove 'final'")]
        span: SourceSpan,
    },

    #[error("type cannot be both final and abstract")]
    #[diagnostic(code(E2114))]
    FinalAbstractConflict {
        #[label("conflicting modifiers")]
        span: SourceSpan,
    },

    #[error("{kind} can only have a single concrete supertype")]
    #[diagnostic(code(E2115))]
    MultipleSupertypes {
        /// Plural kind name, e.g. "classes"
        kind: String,
        #[label("second concrete supertype here")]
        span: SourceSpan,
    },

    #[error("a class can only inherit from class or interface")]
    #[diagnostic(code(E2116))]
    InvalidClassBase {
        #[label("invalid base kind")]
        span: SourceSpan,
    },

    #[error("struct can only derive from a struct or protocol type")]
    #[diagnostic(code(E2117))]
    InvalidStructBase {
        #[label("invalid base kind")]
        span: SourceSpan,
    },

    #[error("interface can only inherit from interface or protocol")]
    #[diagnostic(code(E2118))]
    InvalidInterfaceBase {
        #[label("invalid base kind")]
        span: SourceSpan,
    },

    #[error("circular inheritance not allowed")]
    #[diagnostic(code(E2119))]
    CircularInheritance {
        #[label("this type participates in an inheritance cycle")]
        span: SourceSpan,
    },

    #[error("definition of '{name}' conflicts with earlier definition")]
    #[diagnostic(code(E2120))]
    ConflictingDefinition {
        name: String,
        #[label("redefined with a different member kind")]
        span: SourceSpan,
    },

    #[error("data member not allowed in interface: '{name}'")]
    #[diagnostic(code(E2121))]
    DataMemberInInterface {
        name: String,
        #[label("interfaces cannot declare storage")]
        span: SourceSpan,
    },

    #[error("member type signature conflict")]
    #[diagnostic(code(E2122))]
    SignatureConflict {
        #[label("same signature as an earlier declaration")]
        span: SourceSpan,
    },

    #[error("definition of property '{name}' conflicts with earlier definition")]
    #[diagnostic(code(E2123))]
    PropertyConflict {
        name: String,
        #[label("same property type as an earlier declaration")]
        span: SourceSpan,
    },

    #[error("{kind} method cannot be non-public")]
    #[diagnostic(code(E2124))]
    AbstractKindMemberNotPublic {
        kind: String,
        #[label("must be public")]
        span: SourceSpan,
    },

    #[error("{kind} method cannot be final")]
    #[diagnostic(code(E2125))]
    AbstractKindMemberFinal {
        kind: String,
        #[label("must be overridable")]
        span: SourceSpan,
    },

    #[error("constructor cannot declare a return type")]
    #[diagnostic(code(E2130))]
    ConstructorReturnType {
        #[label("constructors return nothing")]
        span: SourceSpan,
    },

    #[error("constructor must be an instance method")]
    #[diagnostic(code(E2131))]
    ConstructorNotInstance {
        #[label("declared static")]
        span: SourceSpan,
    },

    #[error("member named 'construct' must be a method")]
    #[diagnostic(code(E2132))]
    ConstructorNotMethod {
        #[label("not a method")]
        span: SourceSpan,
    },

    #[error("cannot create a default constructor for '{name}': super type '{super_name}' has no default constructor")]
    #[diagnostic(
        code(E2133),
        help("declare a constructor that calls the super constructor explicitly")
    )]
    NoSuperDefaultConstructor {
        name: String,
        super_name: String,
        #[label("default constructor required here")]
        span: SourceSpan,
    },

    #[error("instance field '{name}' requires a constructor to initialize it")]
    #[diagnostic(code(E2134))]
    FieldRequiresConstructor {
        name: String,
        #[label("no constant initializer and no user constructor")]
        span: SourceSpan,
    },

    #[error("method '{name}' defined with 'undef' but does not override a base class method")]
    #[diagnostic(code(E2135))]
    UndefWithoutOverride {
        name: String,
        #[label("nothing to undefine")]
        span: SourceSpan,
    },

    #[error("method '{name}' overrides a method in base class '{base}' and should be declared with 'override'")]
    #[diagnostic(code(W2140), severity(warning))]
    OverrideMissingKeyword {
        name: String,
        base: String,
        #[label("add 'override'")]
        span: SourceSpan,
    },

    #[error("definition of '{name}' is hidden")]
    #[diagnostic(code(W2141), severity(warning))]
    HiddenMember {
        name: String,
        #[label("hidden by a same-named member in a derived type")]
        span: SourceSpan,
    },

    #[error("invalid override of property accessor '{name}' by accessor of incompatible type")]
    #[diagnostic(code(W2142), severity(warning))]
    IncompatibleAccessorOverride {
        name: String,
        #[label("accessor signature mismatch")]
        span: SourceSpan,
    },

    #[error("concrete type '{name}' lacks definitions for the following methods:")]
    #[diagnostic(code(E2150))]
    MissingMethodBodies {
        name: String,
        #[label("type is effectively abstract")]
        span: SourceSpan,
    },

    #[error("concrete class '{name}' implements interface '{interface}' but lacks implementations for:")]
    #[diagnostic(code(E2151))]
    UnimplementedInterface {
        name: String,
        interface: String,
        #[label("incomplete interface implementation")]
        span: SourceSpan,
    },
}
