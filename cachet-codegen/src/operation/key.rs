//! Key-strategy resolution.
//!
//! Four-tier precedence: explicit mapper, then single-parameter passthrough,
//! then key-type constructor match, then a synthesized N-ary mapper. Explicit
//! user intent always wins; the common one-ID case needs no boilerplate;
//! value-object keys mirroring the parameter list need no mapper class; and
//! everything else gets an injected mapper, capped at the 9-ary interface.

use super::FieldRegistry;
use cachet_core::declaration::{DeclarationModel, MethodDecl, ParamDecl, TypeRef};
use cachet_core::error::{BuildError, BuildResult};
use cachet_core::known;
use cachet_core::model::CacheKeyStrategy;

/// Resolve how the cache key expression is built from `params`.
pub fn resolve(
    model: &dyn DeclarationModel,
    method: &MethodDecl,
    key_type: &TypeRef,
    params: &[&ParamDecl],
    registry: &mut FieldRegistry,
) -> BuildResult<CacheKeyStrategy> {
    if let Some(strategy) = explicit_mapper(model, method, params, registry) {
        return Ok(strategy);
    }

    if let [single] = params {
        return Ok(CacheKeyStrategy::DirectPassthrough {
            param: single.name.clone(),
        });
    }

    if let Some(strategy) = constructor_match(model, key_type, params) {
        return Ok(strategy);
    }

    synthesized_mapper(key_type, params, registry)
}

/// Tier 1: a mapping declared on the method whose target is one of the nine
/// key-mapper interfaces. Shapes are scanned in ascending arity order and
/// the first non-null match wins.
fn explicit_mapper(
    model: &dyn DeclarationModel,
    method: &MethodDecl,
    params: &[&ParamDecl],
    registry: &mut FieldRegistry,
) -> Option<CacheKeyStrategy> {
    let mappings = model.key_mappings(method);
    if mappings.is_empty() {
        return None;
    }
    for arity in 1..=known::MAX_KEY_ARITY {
        let shape = known::key_mapper_name(arity)?;
        if let Some(mapping) = mappings.iter().find(|m| m.target.name == shape) {
            let mapper = registry.register(mapping.target.clone(), mapping.tag.clone());
            return Some(CacheKeyStrategy::MapperCall {
                mapper,
                params: params.iter().map(|p| p.name.clone()).collect(),
            });
        }
    }
    None
}

/// Tier 3: a public constructor of the key type whose parameter list is
/// positionally assignable from the subset. A nullable method parameter may
/// not feed a non-nullable constructor parameter; the reverse is allowed.
fn constructor_match(
    model: &dyn DeclarationModel,
    key_type: &TypeRef,
    params: &[&ParamDecl],
) -> Option<CacheKeyStrategy> {
    // An empty subset never matches, even against a zero-arg constructor;
    // a constant key carries no information.
    if params.is_empty() {
        return None;
    }
    for constructor in model.constructors(key_type) {
        if constructor.params.len() != params.len() {
            continue;
        }
        let compatible = constructor.params.iter().zip(params).all(|(ctor, param)| {
            if param.ty.nullable && !ctor.ty.nullable {
                return false;
            }
            model.is_assignable(&param.ty, &ctor.ty)
        });
        if compatible {
            return Some(CacheKeyStrategy::ConstructorCall {
                key_type: key_type.clone(),
                params: params.iter().map(|p| p.name.clone()).collect(),
            });
        }
    }
    None
}

/// Tier 4: inject a `CacheKeyMapperN<Key, P1..PN>` field. The interface
/// family stops at 9 type parameters, so a larger subset is a hard error.
fn synthesized_mapper(
    key_type: &TypeRef,
    params: &[&ParamDecl],
    registry: &mut FieldRegistry,
) -> BuildResult<CacheKeyStrategy> {
    let Some(shape) = known::key_mapper_name(params.len()) else {
        return Err(BuildError::KeyArity { arity: params.len() });
    };
    let mut args = Vec::with_capacity(params.len() + 1);
    args.push(key_type.clone());
    args.extend(params.iter().map(|p| p.ty.clone()));
    let mapper = registry.register(TypeRef::with_args(shape, args), None);
    Ok(CacheKeyStrategy::MapperCall {
        mapper,
        params: params.iter().map(|p| p.name.clone()).collect(),
    })
}
