//! Type graph definitions.
//!
//! This module contains the arena that holds every resolved type handed to
//! the toolkit by a declaration source: basic types, composite shapes,
//! struct-like aggregates and named declarations. Handles are plain indices,
//! so they are `Copy` and can be stored freely in field tables and buffers.

use crate::error::SchemaError;
use std::collections::HashMap;
use std::fmt;

/// Handle to a type stored in a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a package stored in a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

impl PackageId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A package (module) that declares named types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    /// Full module path, e.g. `crate::model` or `chrono`.
    pub path: String,
    /// Name used when qualifying types, e.g. `model`.
    pub name: String,
}

impl Package {
    /// Returns true if the package name is the last segment of its path.
    #[must_use]
    pub fn name_matches_path(&self) -> bool {
        self.path.rsplit("::").next() == Some(self.name.as_str())
    }
}

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    /// Boolean.
    Bool,
    /// Unicode scalar value.
    Char,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Signed 128-bit integer.
    Int128,
    /// Pointer-sized signed integer.
    Isize,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Unsigned 128-bit integer.
    Uint128,
    /// Pointer-sized unsigned integer.
    Usize,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Owned UTF-8 string.
    String,
    /// The unit type.
    Unit,
}

/// Property classes of basic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicInfo {
    /// Boolean kinds.
    Boolean,
    /// Signed and unsigned integers.
    Integer,
    /// Unsigned integers.
    Unsigned,
    /// Floating point kinds.
    Float,
    /// String kinds.
    String,
    /// Integers and floats.
    Numeric,
    /// Kinds supporting ordering comparisons.
    Ordered,
}

impl BasicKind {
    /// Returns the Rust spelling of this kind.
    #[must_use]
    pub const fn rust_type(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Int128 => "i128",
            Self::Isize => "isize",
            Self::Uint8 => "u8",
            Self::Uint16 => "u16",
            Self::Uint32 => "u32",
            Self::Uint64 => "u64",
            Self::Uint128 => "u128",
            Self::Usize => "usize",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::String => "String",
            Self::Unit => "()",
        }
    }

    /// Returns true if this is an integer kind.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Int128
                | Self::Isize
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uint128
                | Self::Usize
        )
    }

    /// Returns true if this is an unsigned integer kind.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64 | Self::Uint128 | Self::Usize
        )
    }

    /// Returns true if this is a floating point kind.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true if this kind belongs to the given property class.
    #[must_use]
    pub const fn has_info(&self, info: BasicInfo) -> bool {
        match info {
            BasicInfo::Boolean => matches!(self, Self::Bool),
            BasicInfo::Integer => self.is_integer(),
            BasicInfo::Unsigned => self.is_unsigned(),
            BasicInfo::Float => self.is_float(),
            BasicInfo::String => matches!(self, Self::String),
            BasicInfo::Numeric => self.is_integer() || self.is_float(),
            BasicInfo::Ordered => {
                self.is_integer() || self.is_float() || matches!(self, Self::String | Self::Char)
            }
        }
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChanDir {
    /// Send and receive.
    #[default]
    Both,
    /// Send only.
    Send,
    /// Receive only.
    Recv,
}

/// A field of a struct-like aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Declared name; empty or the type name for embedded fields.
    pub name: String,
    /// Field type.
    pub ty: TypeId,
    /// Whether the field is embedded (anonymous).
    pub embedded: bool,
    /// Raw annotation string.
    pub tag: String,
}

impl StructField {
    /// Creates a named field without annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: false,
            tag: String::new(),
        }
    }

    /// Creates an embedded field. Its name is derived from its type.
    #[must_use]
    pub fn embedded(ty: TypeId) -> Self {
        Self {
            name: String::new(),
            ty,
            embedded: true,
            tag: String::new(),
        }
    }

    /// Sets the raw annotation string.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Struct-like aggregate type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructType {
    /// Fields in declaration order.
    pub fields: Vec<StructField>,
}

impl StructType {
    /// Returns the number of fields.
    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the field at the given index.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&StructField> {
        self.fields.get(index)
    }

    /// Returns the raw annotation string of the field at the given index.
    #[must_use]
    pub fn tag(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.tag.as_str())
    }
}

/// Function signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Parameter types.
    pub params: Vec<TypeId>,
    /// Result types.
    pub results: Vec<TypeId>,
    /// Whether the last parameter is variadic.
    pub variadic: bool,
}

/// Interface method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Signature type handle.
    pub signature: TypeId,
}

/// Interface type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceType {
    /// Declared methods.
    pub methods: Vec<Method>,
}

impl InterfaceType {
    /// Returns true if the interface declares no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Named type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    /// Declared name.
    pub name: String,
    /// Declaring package, `None` for predeclared types.
    pub package: Option<PackageId>,
    /// Underlying shape, `None` until set.
    pub underlying: Option<TypeId>,
}

/// Shape of a type in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Built-in scalar.
    Basic(BasicKind),
    /// Pointer to an element type.
    Pointer(TypeId),
    /// Fixed-length array.
    Array {
        /// Number of elements.
        len: usize,
        /// Element type.
        elem: TypeId,
    },
    /// Growable sequence.
    Slice(TypeId),
    /// Key/value mapping.
    Map {
        /// Key type.
        key: TypeId,
        /// Value type.
        value: TypeId,
    },
    /// Channel.
    Chan {
        /// Direction.
        dir: ChanDir,
        /// Element type.
        elem: TypeId,
    },
    /// Function signature.
    Signature(Signature),
    /// Struct-like aggregate.
    Struct(StructType),
    /// Interface.
    Interface(InterfaceType),
    /// Named declaration.
    Named(NamedType),
}

impl Shape {
    /// Returns a short name for the shape kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Basic(_) => "basic",
            Self::Pointer(_) => "pointer",
            Self::Array { .. } => "array",
            Self::Slice(_) => "slice",
            Self::Map { .. } => "map",
            Self::Chan { .. } => "chan",
            Self::Signature(_) => "signature",
            Self::Struct(_) => "struct",
            Self::Interface(_) => "interface",
            Self::Named(_) => "named",
        }
    }

    /// Returns true if this is a named declaration.
    #[must_use]
    pub const fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

/// Append-only arena of types and packages.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: Vec<Shape>,
    packages: Vec<Package>,
    package_map: HashMap<String, PackageId>,
    basics: HashMap<BasicKind, TypeId>,
}

impl TypeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of types in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if the graph holds no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registers a package, returning the existing handle if the path is known.
    pub fn package(&mut self, path: impl Into<String>, name: impl Into<String>) -> PackageId {
        let path = path.into();
        if let Some(&id) = self.package_map.get(&path) {
            return id;
        }
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            path: path.clone(),
            name: name.into(),
        });
        self.package_map.insert(path, id);
        id
    }

    /// Looks up a package handle by path.
    #[must_use]
    pub fn find_package(&self, path: &str) -> Option<PackageId> {
        self.package_map.get(path).copied()
    }

    /// Returns the package behind a handle.
    ///
    /// # Panics
    /// Panics if the handle was issued by another graph.
    #[must_use]
    pub fn package_info(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    /// Iterates over all packages in registration order.
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i as u32), p))
    }

    /// Returns the shape behind a handle.
    ///
    /// # Panics
    /// Panics if the handle was issued by another graph.
    #[must_use]
    pub fn shape(&self, id: TypeId) -> &Shape {
        &self.types[id.index()]
    }

    /// Returns the shape behind a handle, if it exists.
    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&Shape> {
        self.types.get(id.index())
    }

    fn push(&mut self, shape: Shape) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(shape);
        id
    }

    /// Returns the interned handle for a basic kind.
    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        if let Some(&id) = self.basics.get(&kind) {
            return id;
        }
        let id = self.push(Shape::Basic(kind));
        self.basics.insert(kind, id);
        id
    }

    /// Adds a pointer type.
    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.push(Shape::Pointer(elem))
    }

    /// Adds a slice type.
    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.push(Shape::Slice(elem))
    }

    /// Adds a fixed-length array type.
    pub fn array(&mut self, len: usize, elem: TypeId) -> TypeId {
        self.push(Shape::Array { len, elem })
    }

    /// Adds a map type.
    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.push(Shape::Map { key, value })
    }

    /// Adds a channel type.
    pub fn chan(&mut self, dir: ChanDir, elem: TypeId) -> TypeId {
        self.push(Shape::Chan { dir, elem })
    }

    /// Adds a function signature type.
    pub fn signature(&mut self, params: Vec<TypeId>, results: Vec<TypeId>, variadic: bool) -> TypeId {
        self.push(Shape::Signature(Signature {
            params,
            results,
            variadic,
        }))
    }

    /// Adds a struct-like aggregate type.
    pub fn struct_type(&mut self, fields: Vec<StructField>) -> TypeId {
        self.push(Shape::Struct(StructType { fields }))
    }

    /// Adds an interface type.
    pub fn interface(&mut self, methods: Vec<Method>) -> TypeId {
        self.push(Shape::Interface(InterfaceType { methods }))
    }

    /// Adds a named type whose underlying shape is set later.
    pub fn named(&mut self, name: impl Into<String>, package: Option<PackageId>) -> TypeId {
        self.push(Shape::Named(NamedType {
            name: name.into(),
            package,
            underlying: None,
        }))
    }

    /// Sets the underlying shape of a named type.
    ///
    /// # Errors
    /// Returns `SchemaError` if `named` is not a named type, already has an
    /// underlying type, or `underlying` is itself named.
    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> Result<(), SchemaError> {
        let underlying_is_named = self
            .get(underlying)
            .is_some_and(Shape::is_named);
        match self.types.get_mut(named.index()) {
            Some(Shape::Named(n)) => {
                if n.underlying.is_some() {
                    return Err(SchemaError::UnderlyingAlreadySet {
                        name: n.name.clone(),
                    });
                }
                if underlying_is_named {
                    return Err(SchemaError::NamedUnderlying {
                        name: n.name.clone(),
                    });
                }
                n.underlying = Some(underlying);
                Ok(())
            }
            _ => Err(SchemaError::NotNamed { id: named.index() }),
        }
    }

    /// Adds a named type with its underlying shape in one step.
    ///
    /// # Errors
    /// Returns `SchemaError` if `underlying` is itself named.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        package: Option<PackageId>,
        underlying: TypeId,
    ) -> Result<TypeId, SchemaError> {
        let named = self.named(name, package);
        self.set_underlying(named, underlying)?;
        Ok(named)
    }

    /// Returns the named declaration behind a handle, if it is one.
    #[must_use]
    pub fn as_named(&self, id: TypeId) -> Option<&NamedType> {
        match self.get(id) {
            Some(Shape::Named(n)) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_types_are_interned() {
        let mut graph = TypeGraph::new();
        let a = graph.basic(BasicKind::Int64);
        let b = graph.basic(BasicKind::Int64);
        let c = graph.basic(BasicKind::String);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_package_dedup_by_path() {
        let mut graph = TypeGraph::new();
        let a = graph.package("crate::model", "model");
        let b = graph.package("crate::model", "other");
        assert_eq!(a, b);
        assert_eq!(graph.package_info(a).name, "model");
        assert_eq!(graph.find_package("crate::model"), Some(a));
        assert_eq!(graph.find_package("crate::missing"), None);
    }

    #[test]
    fn test_package_name_matches_path() {
        let pkg = Package {
            path: "crate::model".to_string(),
            name: "model".to_string(),
        };
        assert!(pkg.name_matches_path());

        let aliased = Package {
            path: "serde_json".to_string(),
            name: "json".to_string(),
        };
        assert!(!aliased.name_matches_path());
    }

    #[test]
    fn test_set_underlying_twice_fails() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int32);
        let named = graph.named("Id", None);
        graph.set_underlying(named, int).expect("first set");
        let err = graph.set_underlying(named, int).unwrap_err();
        assert!(matches!(err, SchemaError::UnderlyingAlreadySet { .. }));
    }

    #[test]
    fn test_set_underlying_on_unnamed_fails() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int32);
        let ptr = graph.pointer(int);
        let err = graph.set_underlying(ptr, int).unwrap_err();
        assert!(matches!(err, SchemaError::NotNamed { .. }));
    }

    #[test]
    fn test_named_underlying_rejected() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int32);
        let id = graph.declare("Id", None, int).expect("declare");
        let other = graph.named("OtherId", None);
        let err = graph.set_underlying(other, id).unwrap_err();
        assert!(matches!(err, SchemaError::NamedUnderlying { .. }));
    }

    #[test]
    fn test_self_referencing_named_type() {
        let mut graph = TypeGraph::new();
        let node = graph.named("Node", None);
        let next = graph.pointer(node);
        let body = graph.struct_type(vec![StructField::new("next", next)]);
        graph.set_underlying(node, body).expect("set");

        let named = graph.as_named(node).expect("named");
        assert_eq!(named.underlying, Some(body));
        assert_eq!(graph.shape(next), &Shape::Pointer(node));
    }

    #[test]
    fn test_basic_info() {
        assert!(BasicKind::Uint8.has_info(BasicInfo::Unsigned));
        assert!(BasicKind::Uint8.has_info(BasicInfo::Numeric));
        assert!(!BasicKind::Int8.has_info(BasicInfo::Unsigned));
        assert!(BasicKind::Float64.has_info(BasicInfo::Ordered));
        assert!(BasicKind::String.has_info(BasicInfo::Ordered));
        assert!(!BasicKind::Bool.has_info(BasicInfo::Ordered));
        assert!(BasicKind::Bool.has_info(BasicInfo::Boolean));
    }

    #[test]
    fn test_struct_field_builders() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int64);
        let field = StructField::new("id", int).with_tag(r#"json:"id""#);
        assert!(!field.embedded);
        assert_eq!(field.tag, r#"json:"id""#);

        let embedded = StructField::embedded(int);
        assert!(embedded.embedded);
        assert!(embedded.name.is_empty());
    }

    #[test]
    fn test_shape_kind_name() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int64);
        let map = graph.map(int, int);
        assert_eq!(graph.shape(map).kind_name(), "map");
        assert_eq!(graph.shape(int).kind_name(), "basic");
    }
}
