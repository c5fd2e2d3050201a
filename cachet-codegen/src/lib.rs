//! CACHET Codegen - Cache-Operation Compiler
//!
//! Turns `Cacheable` / `CachePut` / `CacheInvalidate` method annotations into
//! generated caching decorators, entirely at build time.
//!
//! Pipeline:
//! ```text
//! DeclarationModel (methods + annotations)
//!     ↓
//! Classifier (one family → GET / PUT / EVICT / EVICT_ALL)
//!     ↓
//! Operation Builder (validate + one CacheExecution per cache level)
//!     ↓            ↘ Key Resolver (mapper > passthrough > constructor > synthesized)
//! CacheOperation
//!     ↓
//! Decorator Emitter (source text, levels chained in declaration order)
//! ```
//!
//! Each method is processed exactly once; a validation failure aborts that
//! method alone and surfaces as a [`Diagnostic`](cachet_core::Diagnostic).

pub mod classifier;
pub mod emitter;
pub mod operation;
pub mod processor;

// Re-export key types for convenience
pub use classifier::{classify, has_cache_marker};
pub use emitter::{emit_decorator, CodegenOptions};
pub use operation::{build, FieldRegistry};
pub use processor::{process_type, ProcessOutcome};
