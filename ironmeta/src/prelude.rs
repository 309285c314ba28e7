//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use ironmeta::prelude::*;
//! ```

// Type graph
pub use ironmeta_schema::{
    BasicKind, ChanDir, Method, PackageId, Shape, StructField, TypeGraph, TypeId,
};

// Annotations and fields
pub use ironmeta_schema::{
    Annotation, Field, FieldPath, FieldTable, FlattenOptions, Params, flatten,
};

// Catalog
pub use ironmeta_schema::{
    Catalog, CatalogBuilder, DeclarationSource, Initializer, SourceUnit, TypeDecl, TypeFilter,
    VarDecl,
};
pub use ironmeta_schema::{ParamError, SchemaError};

// Code generation
pub use ironmeta_codegen::{
    Arg, Code, CodeError, CodegenError, FlatViewGenerator, Formatter, Passthrough, Qualifier,
    RustFormatter,
};
