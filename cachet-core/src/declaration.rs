//! Read-only declaration model consumed by the code generator.
//!
//! The build tool that drives CACHET resolves source declarations into these
//! structures before any generator runs. The pipeline only ever reads them;
//! it never mutates or re-resolves a declaration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A resolved type reference: qualified name, generic arguments, nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef {
    /// Fully qualified type name, e.g. `cachet.cache.Cache`.
    pub name: String,
    /// Generic arguments in declaration order.
    #[serde(default)]
    pub args: Vec<TypeRef>,
    /// Whether the reference admits null at this use site.
    #[serde(default)]
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef {
            name: name.into(),
            args,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Same type constructor, ignoring nullability and generic arguments.
    pub fn same_raw_type(&self, other: &TypeRef) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParamDecl {
            name: name.into(),
            ty,
        }
    }
}

/// Async-wrapper return shapes the cache generator rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsyncWrapper {
    Future,
    ReactiveSingle,
    ReactiveStream,
    Flow,
}

impl fmt::Display for AsyncWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AsyncWrapper::Future => "future",
            AsyncWrapper::ReactiveSingle => "reactive single",
            AsyncWrapper::ReactiveStream => "reactive stream",
            AsyncWrapper::Flow => "coroutine flow",
        };
        write!(f, "{}", s)
    }
}

/// Return-type classification as seen by the generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnType {
    Void,
    /// Direct value return (synchronous or suspend).
    Value(TypeRef),
    /// Value wrapped in an async pipeline type. Never cacheable.
    Async { wrapper: AsyncWrapper, item: TypeRef },
}

impl ReturnType {
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnType::Void)
    }

    pub fn value(&self) -> Option<&TypeRef> {
        match self {
            ReturnType::Value(ty) => Some(ty),
            _ => None,
        }
    }
}

/// Structured annotation argument values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Type(TypeRef),
    Str(String),
    StrList(Vec<String>),
    Bool(bool),
    /// Child annotations of an aggregate (repeatable container) form.
    Annotations(Vec<AnnotationDecl>),
}

impl AnnotationValue {
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            AnnotationValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            AnnotationValue::StrList(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_annotations(&self) -> Option<&[AnnotationDecl]> {
        match self {
            AnnotationValue::Annotations(items) => Some(items),
            _ => None,
        }
    }
}

/// An annotation attached to a declaration, with named arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDecl {
    /// Fully qualified annotation name.
    pub name: String,
    #[serde(default)]
    pub args: BTreeMap<String, AnnotationValue>,
}

impl AnnotationDecl {
    pub fn new(name: impl Into<String>) -> Self {
        AnnotationDecl {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn arg(&self, key: &str) -> Option<&AnnotationValue> {
        self.args.get(key)
    }
}

/// A declared method with its attached annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Qualified name of the declaring type.
    pub owner: String,
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub ret: ReturnType,
    /// Suspend/async direct-return style. Supported, unlike async wrappers.
    #[serde(default)]
    pub suspend: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationDecl>,
}

impl MethodDecl {
    pub fn param(&self, name: &str) -> Option<&ParamDecl> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A declared type whose annotated methods drive decorator generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
}

impl TypeDecl {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A public constructor of a resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub params: Vec<ParamDecl>,
}

/// A mapping declared through the framework's generic mapping annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDecl {
    /// The mapper type the mapping points at.
    pub target: TypeRef,
    /// Optional qualifier tag distinguishing same-typed mappers.
    pub tag: Option<String>,
}

/// Symbol-resolution oracle the pipeline queries during a build pass.
///
/// Implemented by the build tool over its compiled symbol tables; the
/// in-memory implementation in `cachet-test-utils` backs the test suites.
pub trait DeclarationModel {
    /// Full declared supertype chain, declaration order, most specific last.
    fn supertypes(&self, ty: &TypeRef) -> Vec<TypeRef>;

    /// Public constructors of the type, declaration order.
    fn constructors(&self, ty: &TypeRef) -> Vec<ConstructorDecl>;

    /// Mapper mappings declared on the method (or its return position).
    fn key_mappings(&self, method: &MethodDecl) -> Vec<MappingDecl>;

    /// Structural assignability, ignoring nullability.
    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display_generic_nullable() {
        let ty = TypeRef::with_args(
            "cachet.cache.Cache",
            vec![TypeRef::new("kotlin.String"), TypeRef::new("my.Value").nullable()],
        );
        assert_eq!(ty.to_string(), "cachet.cache.Cache<kotlin.String, my.Value?>");
    }

    #[test]
    fn test_type_ref_simple_name() {
        assert_eq!(TypeRef::new("a.b.Cache").simple_name(), "Cache");
        assert_eq!(TypeRef::new("Cache").simple_name(), "Cache");
    }

    #[test]
    fn test_annotation_arg_access() {
        let ann = AnnotationDecl::new("x.Y")
            .with_arg("value", AnnotationValue::Type(TypeRef::new("a.B")))
            .with_arg("flag", AnnotationValue::Bool(true));
        assert_eq!(ann.arg("value").and_then(AnnotationValue::as_type).unwrap().name, "a.B");
        assert_eq!(ann.arg("flag").and_then(AnnotationValue::as_bool), Some(true));
        assert!(ann.arg("missing").is_none());
    }

    #[test]
    fn test_method_param_lookup() {
        let method = MethodDecl {
            owner: "a.Repo".into(),
            name: "get".into(),
            params: vec![ParamDecl::new("id", TypeRef::new("kotlin.String"))],
            ret: ReturnType::Value(TypeRef::new("a.Value")),
            suspend: false,
            annotations: vec![],
        };
        assert!(method.param("id").is_some());
        assert!(method.param("other").is_none());
    }
}
