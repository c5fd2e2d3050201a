//! Cache-operation builder: validates the annotated method and resolves one
//! [`CacheExecution`] per annotation instance, in declaration order.

pub mod key;

use cachet_core::declaration::{
    AnnotationDecl, AnnotationValue, DeclarationModel, MethodDecl, ParamDecl, ReturnType, TypeRef,
};
use cachet_core::error::{BuildError, BuildResult};
use cachet_core::known;
use cachet_core::model::{
    CacheExecution, CacheOpKind, CacheOperation, ExecContract, FieldRef, Origin,
};
use std::collections::HashMap;

/// Arena of injected constructor fields for one method's build call.
///
/// Deduplicates by (type, qualifier tag): requesting the same pair again
/// returns the already registered field. Discarded once the method's
/// operation is finalized; no cross-method state persists.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldRef>,
    index: HashMap<(TypeRef, Option<String>), usize>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an injected field, reusing the existing one for an identical
    /// (type, tag) pair. Field names derive from the type's simple name,
    /// with a numeric suffix on collision between distinct types.
    pub fn register(&mut self, ty: TypeRef, tag: Option<String>) -> FieldRef {
        if let Some(&i) = self.index.get(&(ty.clone(), tag.clone())) {
            return self.fields[i].clone();
        }
        let base = match &tag {
            Some(t) => format!("{}{}", lower_first(ty.simple_name()), upper_first(t)),
            None => lower_first(ty.simple_name()),
        };
        let mut name = base.clone();
        let mut n = 1;
        while self.fields.iter().any(|f| f.name == name) {
            n += 1;
            name = format!("{}{}", base, n);
        }
        let field = FieldRef { name, ty: ty.clone(), tag: tag.clone() };
        self.index.insert((ty, tag), self.fields.len());
        self.fields.push(field.clone());
        field
    }

    /// Registered fields in insertion order.
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Build the resolved [`CacheOperation`] for a classified method.
///
/// One annotation instance resolves to one cache level; levels keep the
/// annotation declaration order. Any validation failure is terminal for this
/// method and reported through the returned error.
pub fn build(
    model: &dyn DeclarationModel,
    method: &MethodDecl,
    kind: CacheOpKind,
    annotations: &[AnnotationDecl],
    registry: &mut FieldRegistry,
) -> BuildResult<CacheOperation> {
    check_return_type(method, kind)?;
    let subset = key_parameters(method, annotations)?;

    let mut executions = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let contract_type = annotation
            .arg("value")
            .and_then(AnnotationValue::as_type)
            .cloned()
            .ok_or_else(|| BuildError::InternalInvariant {
                detail: format!(
                    "cache annotation '{}' carries no cache contract type",
                    annotation.name
                ),
            })?;
        let tag = match annotation.arg("tag") {
            Some(AnnotationValue::Str(t)) => Some(t.clone()),
            _ => None,
        };

        let (contract, key_type, value_type) = cache_signature(model, &contract_type)?;
        let field = registry.register(contract_type.clone(), tag);

        let key_strategy = if kind == CacheOpKind::EvictAll {
            None
        } else {
            Some(key::resolve(model, method, &key_type, &subset, registry)?)
        };

        executions.push(CacheExecution {
            field,
            contract_type,
            key_type,
            value_type,
            contract,
            key: key_strategy,
        });
    }

    Ok(CacheOperation {
        kind,
        executions,
        origin: Origin::new(method.owner.clone(), method.name.clone()),
    })
}

/// GET and PUT need a value to cache; no kind may decorate an async-wrapper
/// return. Suspend direct returns are fine.
fn check_return_type(method: &MethodDecl, kind: CacheOpKind) -> BuildResult<()> {
    match (&method.ret, kind) {
        (ReturnType::Void, CacheOpKind::Get | CacheOpKind::Put) => {
            Err(BuildError::UnsupportedReturnType {
                found: "void".to_string(),
                reason: format!("{} requires a value to cache", kind),
            })
        }
        (ReturnType::Async { wrapper, .. }, _) => Err(BuildError::UnsupportedReturnType {
            found: wrapper.to_string(),
            reason: "cache decorators support only direct synchronous or suspend returns"
                .to_string(),
        }),
        _ => Ok(()),
    }
}

/// Resolve the parameter subset used for key derivation. The first non-empty
/// explicit `parameters` list wins and every other non-empty list must match
/// it exactly; with no explicit list, all parameters apply in declaration
/// order.
fn key_parameters<'m>(
    method: &'m MethodDecl,
    annotations: &[AnnotationDecl],
) -> BuildResult<Vec<&'m ParamDecl>> {
    let mut chosen: Option<Vec<String>> = None;
    for annotation in annotations {
        let Some(list) = annotation.arg("parameters").and_then(AnnotationValue::as_str_list)
        else {
            continue;
        };
        if list.is_empty() {
            continue;
        }
        match &chosen {
            None => chosen = Some(list.to_vec()),
            Some(prev) if prev.as_slice() != list => {
                return Err(BuildError::UsageConflict {
                    reason: format!(
                        "cache annotations on one method must agree on key parameters, \
                         found [{}] and [{}]",
                        prev.join(", "),
                        list.join(", ")
                    ),
                });
            }
            Some(_) => {}
        }
    }

    match chosen {
        Some(names) => names
            .iter()
            .map(|name| {
                method.param(name).ok_or_else(|| BuildError::UsageConflict {
                    reason: format!(
                        "cache key parameter '{}' is not a parameter of '{}'",
                        name, method.name
                    ),
                })
            })
            .collect(),
        None => Ok(method.params.iter().collect()),
    }
}

/// Inspect the contract's supertype chain: the presence of `AsyncCache`
/// selects the async execution contract, and the last (most specific)
/// `Cache`/`AsyncCache` entry is authoritative for the key and value types.
fn cache_signature(
    model: &dyn DeclarationModel,
    contract_type: &TypeRef,
) -> BuildResult<(ExecContract, TypeRef, TypeRef)> {
    let supertypes = model.supertypes(contract_type);
    let mut is_async = false;
    let mut signature: Option<&TypeRef> = None;
    for supertype in &supertypes {
        if supertype.name == known::ASYNC_CACHE {
            is_async = true;
            signature = Some(supertype);
        } else if supertype.name == known::CACHE {
            signature = Some(supertype);
        }
    }
    let Some(signature) = signature else {
        return Err(BuildError::InternalInvariant {
            detail: format!(
                "cache contract '{}' does not extend '{}'",
                contract_type.name,
                known::CACHE
            ),
        });
    };
    let [key_type, value_type] = signature.args.as_slice() else {
        return Err(BuildError::InternalInvariant {
            detail: format!(
                "cache supertype of '{}' must carry key and value type arguments",
                contract_type.name
            ),
        });
    };
    let contract = if is_async { ExecContract::Async } else { ExecContract::Sync };
    Ok((contract, key_type.clone(), value_type.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dedup_same_type_and_tag() {
        let mut registry = FieldRegistry::new();
        let a = registry.register(TypeRef::new("my.UserCache"), None);
        let b = registry.register(TypeRef::new("my.UserCache"), None);
        assert_eq!(a, b);
        assert_eq!(registry.fields().len(), 1);
        assert_eq!(a.name, "userCache");
    }

    #[test]
    fn test_registry_distinct_tags_distinct_fields() {
        let mut registry = FieldRegistry::new();
        let plain = registry.register(TypeRef::new("my.UserCache"), None);
        let tagged = registry.register(TypeRef::new("my.UserCache"), Some("replica".into()));
        assert_ne!(plain, tagged);
        assert_eq!(tagged.name, "userCacheReplica");
        assert_eq!(registry.fields().len(), 2);
    }

    #[test]
    fn test_registry_name_collision_gets_suffix() {
        let mut registry = FieldRegistry::new();
        let first = registry.register(TypeRef::new("a.UserCache"), None);
        let second = registry.register(TypeRef::new("b.UserCache"), None);
        assert_eq!(first.name, "userCache");
        assert_eq!(second.name, "userCache2");
    }
}
