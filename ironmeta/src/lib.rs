//! # IronMeta
//!
//! Structural introspection and source assembly for code generators.
//!
//! IronMeta turns declarations supplied by a front end into a normalized
//! model of struct types and helps emit new source that refers to them.
//!
//! ## Features
//!
//! - **Field flattening** - Embedded structs promoted with deterministic shadowing
//! - **Struct-tag parsing** - `key:"name,flag,k=v"` annotations with typed parameters
//! - **Type predicates** - Shape queries, identity, assignability and convertibility
//! - **Source buffers** - Value-semantics text assembly with dependency tracking
//!
//! ## Quick Start
//!
//! ```ignore
//! use ironmeta::prelude::*;
//!
//! let catalog = Catalog::load("crate::shop", "shop", &MySource)?;
//! let order = catalog.lookup_type("Order").unwrap();
//! let fields = flatten(catalog.graph(), order, "json", true);
//! for (name, field) in fields.iter() {
//!     println!("{name} at {}", field.path);
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Type graph, predicates, tags, field resolution, catalog
//! - [`codegen`] - Source buffers, type rendering, formatting, generators

pub mod prelude;

/// Type graph, predicates, tags, field resolution and declaration catalog.
pub mod schema {
    pub use ironmeta_schema::*;
}

/// Source assembly and generation.
pub mod codegen {
    pub use ironmeta_codegen::*;
}
