//! Declaration catalog.
//!
//! Indexes the type and variable declarations supplied by a
//! [`DeclarationSource`] and answers read-only queries over them.

use crate::error::SchemaError;
use crate::graph::{PackageId, TypeGraph, TypeId};
use crate::predicates::TypeFilter;
use std::collections::BTreeMap;

/// Top-level type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Declared name.
    pub name: String,
    /// Handle of the declared type.
    pub ty: TypeId,
}

impl TypeDecl {
    /// Creates a type declaration.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Initializer expression of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Initializer {
    /// Source text of the expression.
    pub source: String,
    /// Packages the expression refers to.
    pub references: Vec<PackageId>,
}

impl Initializer {
    /// Creates an initializer with no package references.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            references: Vec::new(),
        }
    }

    /// Adds a package reference.
    #[must_use]
    pub fn reference(mut self, package: PackageId) -> Self {
        self.references.push(package);
        self
    }
}

/// Top-level variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    /// Identifier.
    pub name: String,
    /// Variable type.
    pub ty: TypeId,
    /// Initializer expression, if any.
    pub initializer: Option<Initializer>,
}

impl VarDecl {
    /// Creates a variable declaration without an initializer.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            initializer: None,
        }
    }

    /// Sets the initializer expression.
    #[must_use]
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Type declaration.
    Type(TypeDecl),
    /// Variable declaration.
    Var(VarDecl),
}

/// Declarations and imports of one parsed source file.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    /// Unit name, usually the file name.
    pub name: String,
    /// Imported packages in source order.
    pub imports: Vec<PackageId>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl SourceUnit {
    /// Creates an empty unit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an import.
    #[must_use]
    pub fn import(mut self, package: PackageId) -> Self {
        self.imports.push(package);
        self
    }

    /// Adds a type declaration.
    #[must_use]
    pub fn type_decl(mut self, decl: TypeDecl) -> Self {
        self.declarations.push(Declaration::Type(decl));
        self
    }

    /// Adds a variable declaration.
    #[must_use]
    pub fn var_decl(mut self, decl: VarDecl) -> Self {
        self.declarations.push(Declaration::Var(decl));
        self
    }
}

/// Supplier of parsed declarations.
///
/// Implemented by front ends that turn source text into types and
/// declarations. The catalog never parses anything itself.
pub trait DeclarationSource {
    /// Builds types in the builder's graph and adds the source units.
    ///
    /// # Errors
    /// Returns an error if the declarations cannot be produced.
    fn populate(&self, builder: &mut CatalogBuilder) -> Result<(), SchemaError>;
}

/// Mutable state used to assemble a [`Catalog`].
#[derive(Debug)]
pub struct CatalogBuilder {
    graph: TypeGraph,
    home: PackageId,
    units: Vec<SourceUnit>,
}

impl CatalogBuilder {
    /// Creates a builder for the package at `path` named `name`.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        let mut graph = TypeGraph::new();
        let home = graph.package(path, name);
        Self {
            graph,
            home,
            units: Vec::new(),
        }
    }

    /// Returns the home package.
    #[must_use]
    pub fn home(&self) -> PackageId {
        self.home
    }

    /// Returns the type graph under construction.
    pub fn graph_mut(&mut self) -> &mut TypeGraph {
        &mut self.graph
    }

    /// Adds a source unit.
    pub fn unit(&mut self, unit: SourceUnit) -> &mut Self {
        self.units.push(unit);
        self
    }

    /// Consumes the builder, producing a read-only catalog.
    #[must_use]
    pub fn build(self) -> Catalog {
        let catalog = Catalog {
            graph: self.graph,
            home: self.home,
            units: self.units,
        };
        tracing::debug!(
            package = %catalog.graph.package_info(catalog.home).path,
            units = catalog.units.len(),
            types = catalog.type_decls().count(),
            vars = catalog.var_decls().count(),
            "catalog built"
        );
        catalog
    }
}

/// Read-only index over the declarations of one package.
#[derive(Debug)]
pub struct Catalog {
    graph: TypeGraph,
    home: PackageId,
    units: Vec<SourceUnit>,
}

impl Catalog {
    /// Loads a catalog for the package at `path` named `name` from `source`.
    ///
    /// # Errors
    /// Returns the error reported by `source`.
    pub fn load(
        path: impl Into<String>,
        name: impl Into<String>,
        source: &impl DeclarationSource,
    ) -> Result<Self, SchemaError> {
        let mut builder = CatalogBuilder::new(path, name);
        source.populate(&mut builder)?;
        Ok(builder.build())
    }

    /// Returns the type graph.
    #[must_use]
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Returns the home package.
    #[must_use]
    pub fn home(&self) -> PackageId {
        self.home
    }

    /// Returns the source units in load order.
    #[must_use]
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// Iterates over type declarations in declaration order.
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.declarations().filter_map(|d| match d {
            Declaration::Type(t) => Some(t),
            Declaration::Var(_) => None,
        })
    }

    /// Iterates over variable declarations in declaration order.
    pub fn var_decls(&self) -> impl Iterator<Item = &VarDecl> {
        self.declarations().filter_map(|d| match d {
            Declaration::Var(v) => Some(v),
            Declaration::Type(_) => None,
        })
    }

    fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.units.iter().flat_map(|u| u.declarations.iter())
    }

    /// Returns every declared type accepted by `filter`.
    #[must_use]
    pub fn defined_types(&self, filter: &impl TypeFilter) -> Vec<TypeId> {
        self.defined_types_n(0, filter)
    }

    /// Returns at most `max` declared types accepted by `filter`.
    ///
    /// A `max` of zero or less means no limit.
    #[must_use]
    pub fn defined_types_n(&self, max: isize, filter: &impl TypeFilter) -> Vec<TypeId> {
        let accepted = self
            .type_decls()
            .map(|t| t.ty)
            .filter(|&ty| filter.accept(&self.graph, ty));
        match usize::try_from(max) {
            Ok(n) if n > 0 => accepted.take(n).collect(),
            _ => accepted.collect(),
        }
    }

    /// Returns the initialized variables whose type is accepted by `filter`.
    ///
    /// Variables without an initializer and the blank identifier `_` are
    /// skipped.
    #[must_use]
    pub fn defined_vars(&self, filter: &impl TypeFilter) -> Vec<&VarDecl> {
        self.var_decls()
            .filter(|v| v.name != "_" && v.initializer.is_some())
            .filter(|v| filter.accept(&self.graph, v.ty))
            .collect()
    }

    /// Looks up a declared type by name. The first declaration wins.
    #[must_use]
    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_decls().find(|t| t.name == name).map(|t| t.ty)
    }

    /// Returns all declared types by name. The first declaration of a
    /// duplicated name wins.
    #[must_use]
    pub fn named_types(&self) -> BTreeMap<&str, TypeId> {
        let mut named = BTreeMap::new();
        for decl in self.type_decls() {
            named.entry(decl.name.as_str()).or_insert(decl.ty);
        }
        named
    }

    /// Finds an imported package by package name, in unit order.
    #[must_use]
    pub fn find_import(&self, name: &str) -> Option<PackageId> {
        self.units
            .iter()
            .flat_map(|u| u.imports.iter().copied())
            .find(|&p| self.graph.package_info(p).name == name)
    }
}
