//! Resolved cache-operation model produced by the builder.
//!
//! One [`CacheOperation`] is constructed per annotated method during a build
//! pass, immutable once built, and handed straight to the decorator emitter.

use crate::declaration::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single cache-operation kind a method resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheOpKind {
    Get,
    Put,
    Evict,
    EvictAll,
}

impl fmt::Display for CacheOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheOpKind::Get => "GET",
            CacheOpKind::Put => "PUT",
            CacheOpKind::Evict => "EVICT",
            CacheOpKind::EvictAll => "EVICT_ALL",
        };
        write!(f, "{}", s)
    }
}

/// Execution contract of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecContract {
    Sync,
    Async,
}

/// An injected constructor field of the generated decorator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field name in the generated decorator.
    pub name: String,
    pub ty: TypeRef,
    /// Qualifier tag distinguishing same-typed injections.
    pub tag: Option<String>,
}

/// How the cache key expression is built from method parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheKeyStrategy {
    /// Invoke an explicit or synthesized N-ary mapper with the parameters
    /// in declared order.
    MapperCall { mapper: FieldRef, params: Vec<String> },
    /// Exactly one parameter supplies the key directly.
    DirectPassthrough { param: String },
    /// The key type has a constructor positionally compatible with the
    /// selected parameters.
    ConstructorCall { key_type: TypeRef, params: Vec<String> },
}

/// One cache level the annotated method caches through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheExecution {
    /// The injected cache-contract field.
    pub field: FieldRef,
    /// The declared cache contract type from the annotation.
    pub contract_type: TypeRef,
    /// Key type declared by the contract's `Cache`/`AsyncCache` supertype.
    pub key_type: TypeRef,
    /// Value type declared by the contract's `Cache`/`AsyncCache` supertype.
    pub value_type: TypeRef,
    pub contract: ExecContract,
    /// Absent only for EVICT_ALL, which needs no key.
    pub key: Option<CacheKeyStrategy>,
}

/// Declaring type + method name, carried for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub type_name: String,
    pub method_name: String,
}

impl Origin {
    pub fn new(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Origin {
            type_name: type_name.into(),
            method_name: method_name.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.method_name)
    }
}

/// Fully resolved caching behavior of one annotated method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOperation {
    pub kind: CacheOpKind,
    /// Ordered, non-empty. Annotation declaration order; the first entry is
    /// checked and written first.
    pub executions: Vec<CacheExecution>,
    pub origin: Origin,
}
