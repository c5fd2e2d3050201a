//! Per-type processing driver.
//!
//! Runs the classifier and builder once per annotated method, collects
//! diagnostics for the methods that fail, and emits a decorator for the
//! methods that build. A failing method never aborts its siblings, so one
//! build pass can report several independent errors.

use crate::classifier;
use crate::emitter::{self, CodegenOptions};
use crate::operation::{self, FieldRegistry};
use cachet_core::declaration::{DeclarationModel, TypeDecl};
use cachet_core::error::Diagnostic;
use cachet_core::model::{CacheOperation, Origin};
use tracing::debug;

/// Result of processing one annotated type.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Decorator source, absent when no annotated method built successfully.
    pub source: Option<String>,
    /// Operations for the methods that built, method declaration order.
    pub operations: Vec<CacheOperation>,
    /// One entry per failed method.
    pub diagnostics: Vec<Diagnostic>,
}

/// Process every cache-annotated method of `decl`.
pub fn process_type(
    model: &dyn DeclarationModel,
    decl: &TypeDecl,
    options: &CodegenOptions,
) -> ProcessOutcome {
    let mut built = Vec::new();
    let mut diagnostics = Vec::new();

    for method in &decl.methods {
        if !classifier::has_cache_marker(method) {
            continue;
        }
        let origin = Origin::new(decl.name.clone(), method.name.clone());
        // The registry lives for exactly one method's build call.
        let mut registry = FieldRegistry::new();
        let result = classifier::classify(method).and_then(|(kind, annotations)| {
            debug!(method = %origin, kind = %kind, levels = annotations.len(), "building cache operation");
            operation::build(model, method, kind, &annotations, &mut registry)
        });
        match result {
            Ok(op) => built.push((method.clone(), op)),
            Err(error) => {
                debug!(method = %origin, error = %error, "cache operation rejected");
                diagnostics.push(Diagnostic::new(origin, error));
            }
        }
    }

    let operations: Vec<CacheOperation> = built.iter().map(|(_, op)| op.clone()).collect();
    let source = if built.is_empty() {
        None
    } else {
        Some(emitter::emit_decorator(decl, &built, options))
    };

    ProcessOutcome {
        source,
        operations,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::declaration::TypeRef;
    use cachet_core::error::BuildError;
    use cachet_core::model::CacheOpKind;
    use cachet_test_utils::{cache_put, cacheable, FixtureModel, MethodFixture};

    fn model() -> FixtureModel {
        FixtureModel::new().sync_cache(
            "my.UserCache",
            TypeRef::new("kotlin.String"),
            TypeRef::new("my.User"),
        )
    }

    #[test]
    fn test_failed_method_does_not_abort_siblings() {
        let good = MethodFixture::new("my.Repo", "get")
            .param("id", TypeRef::new("kotlin.String"))
            .returns(TypeRef::new("my.User"))
            .annotate(cacheable("my.UserCache"))
            .build();
        let bad = MethodFixture::new("my.Repo", "broken")
            .param("id", TypeRef::new("kotlin.String"))
            .returns(TypeRef::new("my.User"))
            .annotate(cacheable("my.UserCache"))
            .annotate(cache_put("my.UserCache"))
            .build();
        let decl = TypeDecl {
            name: "my.Repo".into(),
            methods: vec![bad, good],
        };

        let outcome = process_type(&model(), &decl, &CodegenOptions::default());
        assert_eq!(outcome.operations.len(), 1);
        assert_eq!(outcome.operations[0].kind, CacheOpKind::Get);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].origin.method_name, "broken");
        assert!(matches!(
            outcome.diagnostics[0].error,
            BuildError::UsageConflict { .. }
        ));
        assert!(outcome.source.is_some());
    }

    #[test]
    fn test_unannotated_methods_are_skipped() {
        let plain = MethodFixture::new("my.Repo", "helper")
            .returns(TypeRef::new("kotlin.String"))
            .build();
        let decl = TypeDecl {
            name: "my.Repo".into(),
            methods: vec![plain],
        };
        let outcome = process_type(&model(), &decl, &CodegenOptions::default());
        assert!(outcome.source.is_none());
        assert!(outcome.operations.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_all_methods_failing_yields_no_source() {
        let bad = MethodFixture::new("my.Repo", "broken")
            .returns_void()
            .annotate(cacheable("my.UserCache"))
            .build();
        let decl = TypeDecl {
            name: "my.Repo".into(),
            methods: vec![bad],
        };
        let outcome = process_type(&model(), &decl, &CodegenOptions::default());
        assert!(outcome.source.is_none());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(
            outcome.diagnostics[0].error,
            BuildError::UnsupportedReturnType { .. }
        ));
    }
}
