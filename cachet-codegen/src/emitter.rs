//! Decorator emitter: deterministic source output for resolved operations.
//!
//! One decorator class per annotated type, delegating to the original
//! declaration and holding the deduplicated injected cache and mapper
//! fields. Levels are probed and written in annotation declaration order.

use cachet_core::declaration::{MethodDecl, ReturnType, TypeDecl};
use cachet_core::model::{
    CacheExecution, CacheKeyStrategy, CacheOpKind, CacheOperation, ExecContract, FieldRef,
};
use serde::{Deserialize, Serialize};

/// Generator options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Suffix appended to the decorated type's simple name.
    pub decorator_suffix: String,
    /// Leading `// Generated ...` marker line.
    pub header: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            decorator_suffix: "CacheDecorator".to_string(),
            header: true,
        }
    }
}

const INDENT: &str = "    ";

/// Emit the decorator source for `decl` covering the successfully built
/// method/operation pairs. Output is deterministic for identical inputs.
pub fn emit_decorator(
    decl: &TypeDecl,
    entries: &[(MethodDecl, CacheOperation)],
    options: &CodegenOptions,
) -> String {
    let mut out = String::new();
    if options.header {
        out.push_str("// Generated by cachet-codegen. Do not edit.\n\n");
    }

    let class_name = format!("{}{}", decl.simple_name(), options.decorator_suffix);
    let fields = collect_fields(entries);

    out.push_str(&format!("public class {}(\n", class_name));
    out.push_str(&format!("{}private val delegate: {},\n", INDENT, decl.name));
    for field in &fields {
        out.push_str(&format!("{}private val {}: {},\n", INDENT, field.name, field.ty));
    }
    out.push_str(&format!(") : {} {{\n", decl.name));

    for (method, operation) in entries {
        out.push('\n');
        emit_method(&mut out, method, operation);
    }

    out.push_str("}\n");
    out
}

/// Injected fields across all operations, deduplicated by (type, tag) in
/// first-appearance order. Cache fields come from the executions, mapper
/// fields from the key strategies.
fn collect_fields(entries: &[(MethodDecl, CacheOperation)]) -> Vec<FieldRef> {
    let mut fields: Vec<FieldRef> = Vec::new();
    let mut push = |field: &FieldRef| {
        if !fields.iter().any(|f| f.ty == field.ty && f.tag == field.tag) {
            fields.push(field.clone());
        }
    };
    for (_, operation) in entries {
        for execution in &operation.executions {
            push(&execution.field);
            if let Some(CacheKeyStrategy::MapperCall { mapper, .. }) = &execution.key {
                push(mapper);
            }
        }
    }
    fields
}

fn emit_method(out: &mut String, method: &MethodDecl, operation: &CacheOperation) {
    let suspend = if method.suspend { "suspend " } else { "" };
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect();
    let ret = match &method.ret {
        ReturnType::Void => String::new(),
        ReturnType::Value(ty) => format!(": {}", ty),
        // Builder rejects async wrappers before emission.
        ReturnType::Async { item, .. } => format!(": {}", item),
    };
    out.push_str(&format!(
        "{}override {}fun {}({}){} {{\n",
        INDENT,
        suspend,
        method.name,
        params.join(", "),
        ret
    ));

    match operation.kind {
        CacheOpKind::Get => emit_get(out, method, operation),
        CacheOpKind::Put => emit_put(out, method, operation),
        CacheOpKind::Evict => emit_evict(out, method, operation),
        CacheOpKind::EvictAll => emit_evict_all(out, method, operation),
    }

    out.push_str(&format!("{}}}\n", INDENT));
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

/// The key expression for one execution, from its resolved strategy.
fn key_expr(execution: &CacheExecution) -> String {
    match execution.key.as_ref() {
        Some(CacheKeyStrategy::DirectPassthrough { param }) => param.clone(),
        Some(CacheKeyStrategy::MapperCall { mapper, params }) => {
            format!("this.{}.map({})", mapper.name, params.join(", "))
        }
        Some(CacheKeyStrategy::ConstructorCall { key_type, params }) => {
            format!("{}({})", key_type.name, params.join(", "))
        }
        None => unreachable!("key expression requested for EVICT_ALL"),
    }
}

fn get_call(execution: &CacheExecution, key_var: &str) -> String {
    match execution.contract {
        ExecContract::Sync => format!("this.{}.get({})", execution.field.name, key_var),
        ExecContract::Async => format!("this.{}.getAsync({})", execution.field.name, key_var),
    }
}

fn put_call(execution: &CacheExecution, key_var: &str, value_var: &str) -> String {
    match execution.contract {
        ExecContract::Sync => {
            format!("this.{}.put({}, {})", execution.field.name, key_var, value_var)
        }
        ExecContract::Async => {
            format!("this.{}.putAsync({}, {})", execution.field.name, key_var, value_var)
        }
    }
}

fn invalidate_call(execution: &CacheExecution, key_var: &str) -> String {
    match execution.contract {
        ExecContract::Sync => format!("this.{}.invalidate({})", execution.field.name, key_var),
        ExecContract::Async => {
            format!("this.{}.invalidateAsync({})", execution.field.name, key_var)
        }
    }
}

fn invalidate_all_call(execution: &CacheExecution) -> String {
    match execution.contract {
        ExecContract::Sync => format!("this.{}.invalidateAll()", execution.field.name),
        ExecContract::Async => format!("this.{}.invalidateAllAsync()", execution.field.name),
    }
}

fn delegate_call(method: &MethodDecl) -> String {
    let args: Vec<&str> = method.params.iter().map(|p| p.name.as_str()).collect();
    format!("this.delegate.{}({})", method.name, args.join(", "))
}

fn returns_nullable(method: &MethodDecl) -> bool {
    matches!(&method.ret, ReturnType::Value(ty) if ty.nullable)
}

/// Bind one `val` per distinct key expression, in level order, and return
/// the variable each execution should use. Levels usually share one
/// strategy, but distinct key types per level resolve independently.
fn emit_keys(out: &mut String, operation: &CacheOperation) -> Vec<String> {
    let mut bound: Vec<(String, String)> = Vec::new();
    let mut vars = Vec::with_capacity(operation.executions.len());
    for execution in &operation.executions {
        let expr = key_expr(execution);
        if let Some((_, var)) = bound.iter().find(|(e, _)| *e == expr) {
            vars.push(var.clone());
            continue;
        }
        let var = if bound.is_empty() {
            "key".to_string()
        } else {
            format!("key{}", bound.len() + 1)
        };
        line(out, 2, &format!("val {} = {}", var, expr));
        bound.push((expr, var.clone()));
        vars.push(var);
    }
    vars
}

/// Probe levels in order; a hit at a deeper level backfills every shallower
/// level before returning; a total miss invokes the delegate and writes the
/// result into every level.
fn emit_get(out: &mut String, method: &MethodDecl, operation: &CacheOperation) {
    let keys = emit_keys(out, operation);
    for (i, execution) in operation.executions.iter().enumerate() {
        let hit = format!("hit{}", i + 1);
        line(out, 2, &format!("val {} = {}", hit, get_call(execution, &keys[i])));
        line(out, 2, &format!("if ({} != null) {{", hit));
        for (j, earlier) in operation.executions[..i].iter().enumerate() {
            line(out, 3, &put_call(earlier, &keys[j], &hit));
        }
        line(out, 3, &format!("return {}", hit));
        line(out, 2, "}");
    }
    line(out, 2, &format!("val value = {}", delegate_call(method)));
    emit_store_all(out, operation, method, &keys, "value");
    line(out, 2, "return value");
}

/// Invoke the delegate, then write the result into every level.
fn emit_put(out: &mut String, method: &MethodDecl, operation: &CacheOperation) {
    let keys = emit_keys(out, operation);
    line(out, 2, &format!("val value = {}", delegate_call(method)));
    emit_store_all(out, operation, method, &keys, "value");
    line(out, 2, "return value");
}

fn emit_store_all(
    out: &mut String,
    operation: &CacheOperation,
    method: &MethodDecl,
    keys: &[String],
    value_var: &str,
) {
    if returns_nullable(method) {
        line(out, 2, &format!("if ({} != null) {{", value_var));
        for (i, execution) in operation.executions.iter().enumerate() {
            line(out, 3, &put_call(execution, &keys[i], value_var));
        }
        line(out, 2, "}");
    } else {
        for (i, execution) in operation.executions.iter().enumerate() {
            line(out, 2, &put_call(execution, &keys[i], value_var));
        }
    }
}

/// Invoke the delegate, then remove the key from every level.
fn emit_evict(out: &mut String, method: &MethodDecl, operation: &CacheOperation) {
    let keys = emit_keys(out, operation);
    emit_delegate_then(out, method, |out| {
        for (i, execution) in operation.executions.iter().enumerate() {
            line(out, 2, &invalidate_call(execution, &keys[i]));
        }
    });
}

/// Invoke the delegate, then clear every level entirely.
fn emit_evict_all(out: &mut String, method: &MethodDecl, operation: &CacheOperation) {
    emit_delegate_then(out, method, |out| {
        for execution in &operation.executions {
            line(out, 2, &invalidate_all_call(execution));
        }
    });
}

fn emit_delegate_then(
    out: &mut String,
    method: &MethodDecl,
    invalidate: impl FnOnce(&mut String),
) {
    if method.ret.is_void() {
        line(out, 2, &delegate_call(method));
        invalidate(out);
    } else {
        line(out, 2, &format!("val value = {}", delegate_call(method)));
        invalidate(out);
        line(out, 2, "return value");
    }
}
