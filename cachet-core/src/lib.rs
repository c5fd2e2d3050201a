//! CACHET Core - Declaration and Cache Model Types
//!
//! Pure data structures with no generation logic. The codegen crate depends
//! on this; the build tool hosting the generators implements the
//! [`DeclarationModel`] oracle over its own symbol tables.

pub mod declaration;
pub mod error;
pub mod known;
pub mod model;

// Re-exports for convenience
pub use declaration::{
    AnnotationDecl, AnnotationValue, AsyncWrapper, ConstructorDecl, DeclarationModel, MappingDecl,
    MethodDecl, ParamDecl, ReturnType, TypeDecl, TypeRef,
};
pub use error::{BuildError, BuildResult, Diagnostic};
pub use model::{
    CacheExecution, CacheKeyStrategy, CacheOpKind, CacheOperation, ExecContract, FieldRef, Origin,
};
