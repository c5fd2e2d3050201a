use cachet_codegen::{process_type, CodegenOptions};
use cachet_core::declaration::{TypeDecl, TypeRef};
use cachet_core::error::BuildError;
use cachet_core::known;
use cachet_core::model::{CacheKeyStrategy, CacheOpKind, ExecContract};
use cachet_test_utils::{aggregate, cache_invalidate, cacheable, FixtureModel, MethodFixture};

fn string_ty() -> TypeRef {
    TypeRef::new("kotlin.String")
}

#[test]
fn two_level_cacheable_end_to_end() {
    let model = FixtureModel::new()
        .sync_cache("my.Level1", string_ty(), string_ty())
        .sync_cache("my.Level2", string_ty(), string_ty());
    let method = MethodFixture::new("my.Repo", "getValue")
        .param("id", string_ty())
        .returns(string_ty())
        .annotate(aggregate(
            known::CACHEABLES,
            vec![cacheable("my.Level1"), cacheable("my.Level2")],
        ))
        .build();
    let decl = TypeDecl {
        name: "my.Repo".into(),
        methods: vec![method],
    };

    let outcome = process_type(&model, &decl, &CodegenOptions::default());
    assert!(outcome.diagnostics.is_empty());

    let op = &outcome.operations[0];
    assert_eq!(op.kind, CacheOpKind::Get);
    assert_eq!(op.executions.len(), 2);
    for execution in &op.executions {
        assert_eq!(execution.contract, ExecContract::Sync);
        assert_eq!(
            execution.key,
            Some(CacheKeyStrategy::DirectPassthrough { param: "id".into() })
        );
    }

    let source = outcome.source.expect("decorator source");
    assert!(source.contains("public class RepoCacheDecorator("));
    // Level 1 is probed before level 2; a level-2 hit backfills level 1.
    let l1 = source.find("this.level1.get(key)").unwrap();
    let l2 = source.find("this.level2.get(key)").unwrap();
    assert!(l1 < l2);
    assert!(source.contains("this.level1.put(key, hit2)"));
    // Total miss populates both levels.
    assert!(source.contains("this.level1.put(key, value)"));
    assert!(source.contains("this.level2.put(key, value)"));
}

#[test]
fn mixed_invalidate_all_reports_usage_conflict() {
    let model = FixtureModel::new()
        .sync_cache("my.L1", string_ty(), string_ty())
        .sync_cache("my.L2", string_ty(), string_ty());
    let method = MethodFixture::new("my.Repo", "evict")
        .param("id", string_ty())
        .returns_void()
        .annotate(cache_invalidate("my.L1", true))
        .annotate(cache_invalidate("my.L2", false))
        .build();
    let decl = TypeDecl {
        name: "my.Repo".into(),
        methods: vec![method],
    };

    let outcome = process_type(&model, &decl, &CodegenOptions::default());
    assert!(outcome.source.is_none());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(matches!(
        outcome.diagnostics[0].error,
        BuildError::UsageConflict { .. }
    ));
    assert_eq!(outcome.diagnostics[0].origin.method_name, "evict");
}

#[test]
fn mixed_sync_and_async_levels_each_use_their_contract() {
    let model = FixtureModel::new()
        .sync_cache("my.Local", string_ty(), string_ty())
        .async_cache("my.Remote", string_ty(), string_ty());
    let method = MethodFixture::new("my.Repo", "getValue")
        .param("id", string_ty())
        .returns(string_ty())
        .suspend()
        .annotate(aggregate(
            known::CACHEABLES,
            vec![cacheable("my.Local"), cacheable("my.Remote")],
        ))
        .build();
    let decl = TypeDecl {
        name: "my.Repo".into(),
        methods: vec![method],
    };

    let outcome = process_type(&model, &decl, &CodegenOptions::default());
    let source = outcome.source.expect("decorator source");
    assert!(source.contains("override suspend fun getValue"));
    assert!(source.contains("this.local.get(key)"));
    assert!(source.contains("this.remote.getAsync(key)"));
    assert!(source.contains("this.local.put(key, hit2)"));
    assert!(source.contains("this.remote.putAsync(key, value)"));
}

#[test]
fn evict_invalidates_every_level_after_delegate_call() {
    let model = FixtureModel::new()
        .sync_cache("my.L1", string_ty(), string_ty())
        .sync_cache("my.L2", string_ty(), string_ty());
    let method = MethodFixture::new("my.Repo", "delete")
        .param("id", string_ty())
        .returns_void()
        .annotate(aggregate(
            known::CACHE_INVALIDATES,
            vec![cache_invalidate("my.L1", false), cache_invalidate("my.L2", false)],
        ))
        .build();
    let decl = TypeDecl {
        name: "my.Repo".into(),
        methods: vec![method],
    };

    let outcome = process_type(&model, &decl, &CodegenOptions::default());
    let source = outcome.source.expect("decorator source");
    let delegate = source.find("this.delegate.delete(id)").unwrap();
    let l1 = source.find("this.l1.invalidate(key)").unwrap();
    let l2 = source.find("this.l2.invalidate(key)").unwrap();
    assert!(delegate < l1 && l1 < l2);
}

#[test]
fn shared_cache_field_appears_once_in_decorator() {
    let model = FixtureModel::new().sync_cache("my.UserCache", string_ty(), string_ty());
    let get = MethodFixture::new("my.Repo", "get")
        .param("id", string_ty())
        .returns(string_ty())
        .annotate(cacheable("my.UserCache"))
        .build();
    let evict = MethodFixture::new("my.Repo", "delete")
        .param("id", string_ty())
        .returns_void()
        .annotate(cache_invalidate("my.UserCache", false))
        .build();
    let decl = TypeDecl {
        name: "my.Repo".into(),
        methods: vec![get, evict],
    };

    let outcome = process_type(&model, &decl, &CodegenOptions::default());
    let source = outcome.source.expect("decorator source");
    assert_eq!(source.matches("private val userCache: my.UserCache").count(), 1);
}
