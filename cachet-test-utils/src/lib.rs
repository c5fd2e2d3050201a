//! Test utilities for CACHET: an in-memory [`DeclarationModel`] and fixture
//! builders for methods, annotations, and cache contract types.

use cachet_core::declaration::{
    AnnotationDecl, AnnotationValue, ConstructorDecl, DeclarationModel, MappingDecl, MethodDecl,
    ParamDecl, ReturnType, TypeRef,
};
use cachet_core::known;
use std::collections::HashMap;

/// In-memory declaration model backing the test suites.
///
/// Types, supertypes, constructors, and mappings are registered up front;
/// assignability is name equality widened by the registered supertype chains.
#[derive(Debug, Default, Clone)]
pub struct FixtureModel {
    supertypes: HashMap<String, Vec<TypeRef>>,
    constructors: HashMap<String, Vec<ConstructorDecl>>,
    mappings: HashMap<String, Vec<MappingDecl>>,
}

impl FixtureModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache contract extending `Cache<K, V>`.
    pub fn sync_cache(mut self, name: &str, key: TypeRef, value: TypeRef) -> Self {
        self.supertypes.insert(
            name.to_string(),
            vec![TypeRef::with_args(known::CACHE, vec![key, value])],
        );
        self
    }

    /// Register a cache contract extending `AsyncCache<K, V>` (which itself
    /// extends `Cache<K, V>`).
    pub fn async_cache(mut self, name: &str, key: TypeRef, value: TypeRef) -> Self {
        self.supertypes.insert(
            name.to_string(),
            vec![
                TypeRef::with_args(known::CACHE, vec![key.clone(), value.clone()]),
                TypeRef::with_args(known::ASYNC_CACHE, vec![key, value]),
            ],
        );
        self
    }

    pub fn with_supertypes(mut self, name: &str, supertypes: Vec<TypeRef>) -> Self {
        self.supertypes.insert(name.to_string(), supertypes);
        self
    }

    pub fn with_constructor(mut self, name: &str, params: Vec<ParamDecl>) -> Self {
        self.constructors
            .entry(name.to_string())
            .or_default()
            .push(ConstructorDecl { params });
        self
    }

    /// Attach a declared mapping to `owner.method`.
    pub fn with_mapping(mut self, owner: &str, method: &str, mapping: MappingDecl) -> Self {
        self.mappings
            .entry(format!("{}.{}", owner, method))
            .or_default()
            .push(mapping);
        self
    }
}

impl DeclarationModel for FixtureModel {
    fn supertypes(&self, ty: &TypeRef) -> Vec<TypeRef> {
        self.supertypes.get(&ty.name).cloned().unwrap_or_default()
    }

    fn constructors(&self, ty: &TypeRef) -> Vec<ConstructorDecl> {
        self.constructors.get(&ty.name).cloned().unwrap_or_default()
    }

    fn key_mappings(&self, method: &MethodDecl) -> Vec<MappingDecl> {
        self.mappings
            .get(&format!("{}.{}", method.owner, method.name))
            .cloned()
            .unwrap_or_default()
    }

    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from.name == to.name {
            return true;
        }
        self.supertypes
            .get(&from.name)
            .map(|supers| supers.iter().any(|s| s.name == to.name))
            .unwrap_or(false)
    }
}

/// Builder for method fixtures.
#[derive(Debug, Clone)]
pub struct MethodFixture {
    method: MethodDecl,
}

impl MethodFixture {
    pub fn new(owner: &str, name: &str) -> Self {
        MethodFixture {
            method: MethodDecl {
                owner: owner.to_string(),
                name: name.to_string(),
                params: Vec::new(),
                ret: ReturnType::Void,
                suspend: false,
                annotations: Vec::new(),
            },
        }
    }

    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.method.params.push(ParamDecl::new(name, ty));
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.method.ret = ReturnType::Value(ty);
        self
    }

    pub fn returns_void(mut self) -> Self {
        self.method.ret = ReturnType::Void;
        self
    }

    pub fn ret(mut self, ret: ReturnType) -> Self {
        self.method.ret = ret;
        self
    }

    pub fn suspend(mut self) -> Self {
        self.method.suspend = true;
        self
    }

    pub fn annotate(mut self, annotation: AnnotationDecl) -> Self {
        self.method.annotations.push(annotation);
        self
    }

    pub fn build(self) -> MethodDecl {
        self.method
    }
}

/// `@Cacheable(cache)` marker.
pub fn cacheable(cache: &str) -> AnnotationDecl {
    AnnotationDecl::new(known::CACHEABLE)
        .with_arg("value", AnnotationValue::Type(TypeRef::new(cache)))
}

/// `@CachePut(cache)` marker.
pub fn cache_put(cache: &str) -> AnnotationDecl {
    AnnotationDecl::new(known::CACHE_PUT)
        .with_arg("value", AnnotationValue::Type(TypeRef::new(cache)))
}

/// `@CacheInvalidate(cache)` marker, optionally `invalidateAll`.
pub fn cache_invalidate(cache: &str, invalidate_all: bool) -> AnnotationDecl {
    AnnotationDecl::new(known::CACHE_INVALIDATE)
        .with_arg("value", AnnotationValue::Type(TypeRef::new(cache)))
        .with_arg("invalidateAll", AnnotationValue::Bool(invalidate_all))
}

/// Restrict an annotation to named key parameters.
pub fn with_parameters(annotation: AnnotationDecl, params: &[&str]) -> AnnotationDecl {
    annotation.with_arg(
        "parameters",
        AnnotationValue::StrList(params.iter().map(|s| s.to_string()).collect()),
    )
}

/// Wrap singular annotations into their aggregate container form.
pub fn aggregate(name: &str, children: Vec<AnnotationDecl>) -> AnnotationDecl {
    AnnotationDecl::new(name).with_arg("value", AnnotationValue::Annotations(children))
}
