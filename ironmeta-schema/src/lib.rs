//! # IronMeta Schema
//!
//! Type graph and structural introspection for code generators.
//!
//! This crate provides:
//! - An arena type graph with named types, pointers, collections and structs
//! - Pure type predicates (shape queries, identity, assignability)
//! - Struct-tag annotation parsing
//! - Field flattening with deterministic shadowing of embedded fields
//! - A declaration catalog fed by an external declaration source

pub mod catalog;
pub mod error;
pub mod fields;
pub mod graph;
pub mod predicates;
pub mod tags;

pub use catalog::{
    Catalog, CatalogBuilder, Declaration, DeclarationSource, Initializer, SourceUnit, TypeDecl,
    VarDecl,
};
pub use error::{ParamError, SchemaError};
pub use fields::{
    Field, FieldPath, FieldTable, FlattenOptions, PathSegment, field_name, flatten, shortest_path,
};
pub use graph::{
    BasicInfo, BasicKind, ChanDir, InterfaceType, Method, NamedType, Package, PackageId, Shape,
    Signature, StructField, StructType, TypeGraph, TypeId,
};
pub use predicates::TypeFilter;
pub use tags::{Annotation, Params, has_tag, lookup_tag};
