//! # IronMeta Codegen
//!
//! Building blocks for source generators.
//!
//! This crate provides:
//! - A value-semantics source buffer that tracks package dependencies
//! - Package qualification and Rust rendering of graph types
//! - Formatting of finished output through `syn` and `prettyplease`
//! - A flattened-view generator built on the above

pub mod code;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod imports;
pub mod qualifier;

pub use code::{Arg, Code};
pub use error::{CodeError, CodegenError};
pub use formatter::{Formatter, Passthrough, RustFormatter};
pub use generator::{FlatViewGenerator, to_snake_case};
pub use imports::type_imports;
pub use qualifier::{Qualifier, type_string};

use ironmeta_schema::{Catalog, DeclarationSource};

/// Generates flattened views for every struct type declared by `source`.
///
/// # Arguments
/// * `path` - Module path of the package the declarations belong to
/// * `name` - Package name
/// * `source` - Supplier of the declarations
///
/// # Returns
/// Formatted Rust source.
///
/// # Errors
/// Returns `CodegenError` if loading, generation, or formatting fails.
pub fn generate_flat_views(
    path: &str,
    name: &str,
    source: &impl DeclarationSource,
) -> Result<String, CodegenError> {
    let catalog = Catalog::load(path, name, source)?;
    FlatViewGenerator::new(&catalog).generate()
}

/// Generates flattened views and writes them to `out`.
///
/// # Errors
/// Returns `CodegenError` if generation or writing fails.
pub fn generate_flat_views_to_file(
    path: &str,
    name: &str,
    source: &impl DeclarationSource,
    out: &std::path::Path,
) -> Result<(), CodegenError> {
    let code = generate_flat_views(path, name, source)?;
    std::fs::write(out, code)?;
    Ok(())
}
