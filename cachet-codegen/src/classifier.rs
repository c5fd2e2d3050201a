//! Annotation classifier: buckets a method's cache markers into one family
//! and resolves the operation kind.

use cachet_core::declaration::{AnnotationDecl, AnnotationValue, MethodDecl};
use cachet_core::error::{BuildError, BuildResult};
use cachet_core::known;
use cachet_core::model::CacheOpKind;
use once_cell::sync::Lazy;
use std::collections::HashSet;

static CACHE_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        known::CACHEABLE,
        known::CACHEABLES,
        known::CACHE_PUT,
        known::CACHE_PUTS,
        known::CACHE_INVALIDATE,
        known::CACHE_INVALIDATES,
    ])
});

/// Whether the method carries any cache marker at all.
pub fn has_cache_marker(method: &MethodDecl) -> bool {
    method
        .annotations
        .iter()
        .any(|a| CACHE_MARKERS.contains(a.name.as_str()))
}

/// Resolve the single cache-operation kind for a marker-carrying method,
/// together with the family's annotation instances in declaration order.
///
/// A method may use exactly one family (Cacheable, CachePut, or
/// CacheInvalidate); anything else is a usage conflict. The caller only
/// invokes this for methods that carry a recognized marker, so an empty
/// result is an internal invariant violation.
pub fn classify(method: &MethodDecl) -> BuildResult<(CacheOpKind, Vec<AnnotationDecl>)> {
    let gets = family(method, known::CACHEABLE, known::CACHEABLES);
    let puts = family(method, known::CACHE_PUT, known::CACHE_PUTS);
    let invalidates = family(method, known::CACHE_INVALIDATE, known::CACHE_INVALIDATES);

    let present = [
        (!gets.is_empty(), "Cacheable"),
        (!puts.is_empty(), "CachePut"),
        (!invalidates.is_empty(), "CacheInvalidate"),
    ];
    let names: Vec<&str> = present
        .iter()
        .filter(|(p, _)| *p)
        .map(|(_, n)| *n)
        .collect();
    if names.len() > 1 {
        return Err(BuildError::UsageConflict {
            reason: format!(
                "a method can use only one cache annotation family, found {}",
                names.join(" and ")
            ),
        });
    }

    if !gets.is_empty() {
        return Ok((CacheOpKind::Get, gets));
    }
    if !puts.is_empty() {
        return Ok((CacheOpKind::Put, puts));
    }
    if !invalidates.is_empty() {
        let kind = invalidate_kind(&invalidates)?;
        return Ok((kind, invalidates));
    }

    Err(BuildError::InternalInvariant {
        detail: format!(
            "method '{}' reached the cache classifier without a cache marker",
            method.name
        ),
    })
}

/// Extract one family's annotation instances. When the aggregate container
/// form is present its children are authoritative and the flat singular form
/// is ignored, so repeated annotations are never processed twice.
fn family(method: &MethodDecl, singular: &str, aggregate: &str) -> Vec<AnnotationDecl> {
    if let Some(container) = method.annotations.iter().find(|a| a.name == aggregate) {
        return container
            .arg("value")
            .and_then(AnnotationValue::as_annotations)
            .map(<[AnnotationDecl]>::to_vec)
            .unwrap_or_default();
    }
    method
        .annotations
        .iter()
        .filter(|a| a.name == singular)
        .cloned()
        .collect()
}

/// `invalidateAll` is all-or-nothing across the family: every instance must
/// agree before the method resolves to EVICT_ALL.
fn invalidate_kind(annotations: &[AnnotationDecl]) -> BuildResult<CacheOpKind> {
    let flags: Vec<bool> = annotations
        .iter()
        .map(|a| {
            a.arg("invalidateAll")
                .and_then(AnnotationValue::as_bool)
                .unwrap_or(false)
        })
        .collect();
    let all = flags.iter().all(|f| *f);
    let any = flags.iter().any(|f| *f);
    if any && !all {
        return Err(BuildError::UsageConflict {
            reason: "invalidateAll must be set on all CacheInvalidate annotations of the method \
                     or on none of them"
                .to_string(),
        });
    }
    Ok(if all && any {
        CacheOpKind::EvictAll
    } else {
        CacheOpKind::Evict
    })
}
