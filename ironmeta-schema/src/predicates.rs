//! Pure queries over the type graph.
//!
//! Every predicate takes the graph and a handle and answers by pattern
//! matching on [`Shape`]. Asking a question of the wrong shape (for example
//! the element of a non-pointer) yields `false` or `None`, never an error.

use crate::graph::{
    BasicInfo, BasicKind, ChanDir, InterfaceType, Shape, Signature, StructField, StructType,
    TypeGraph, TypeId,
};

/// Resolves a named type to its underlying shape.
///
/// Unnamed types resolve to themselves. Returns `None` for a named type whose
/// underlying shape has not been set.
#[must_use]
pub fn resolve(graph: &TypeGraph, ty: TypeId) -> Option<TypeId> {
    match graph.get(ty)? {
        // underlying types are never named, see `TypeGraph::set_underlying`
        Shape::Named(named) => named.underlying,
        _ => Some(ty),
    }
}

fn resolved_shape(graph: &TypeGraph, ty: TypeId) -> Option<&Shape> {
    resolve(graph, ty).and_then(|t| graph.get(t))
}

/// Package and type name of a type, looking through pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Declaring package name, if any.
    pub package: Option<String>,
    /// Type name.
    pub name: String,
    /// Whether the type is a named declaration.
    pub named: bool,
}

/// Returns the qualified name of a type.
#[must_use]
pub fn qualified_name(graph: &TypeGraph, ty: TypeId) -> QualifiedName {
    match graph.get(ty) {
        Some(Shape::Named(named)) => QualifiedName {
            package: named
                .package
                .map(|p| graph.package_info(p).name.clone()),
            name: named.name.clone(),
            named: true,
        },
        Some(Shape::Pointer(elem)) => qualified_name(graph, *elem),
        _ => QualifiedName {
            package: None,
            name: type_label(graph, ty),
            named: false,
        },
    }
}

/// Short unqualified label for a type, used when a name must be derived
/// from a type (embedded fields of unnamed types).
#[must_use]
pub fn type_label(graph: &TypeGraph, ty: TypeId) -> String {
    match graph.get(ty) {
        Some(Shape::Basic(kind)) => kind.rust_type().to_string(),
        Some(Shape::Named(named)) => named.name.clone(),
        Some(Shape::Pointer(elem)) => type_label(graph, *elem),
        Some(shape) => shape.kind_name().to_string(),
        None => String::new(),
    }
}

/// Returns the struct shape of an embedded field.
///
/// Looks through at most one pointer. Returns the resolved struct handle
/// along with its shape.
#[must_use]
pub fn embedded<'g>(graph: &'g TypeGraph, field: &StructField) -> Option<(TypeId, &'g StructType)> {
    if !field.embedded {
        return None;
    }
    let mut ty = resolve(graph, field.ty)?;
    if let Shape::Pointer(elem) = graph.get(ty)? {
        ty = resolve(graph, *elem)?;
    }
    match graph.get(ty)? {
        Shape::Struct(s) => Some((ty, s)),
        _ => None,
    }
}

/// Returns the struct shape of a type.
#[must_use]
pub fn as_struct(graph: &TypeGraph, ty: TypeId) -> Option<&StructType> {
    match resolved_shape(graph, ty)? {
        Shape::Struct(s) => Some(s),
        _ => None,
    }
}

/// Returns true if the type resolves to a struct.
#[must_use]
pub fn is_struct(graph: &TypeGraph, ty: TypeId) -> bool {
    as_struct(graph, ty).is_some()
}

/// Returns the element type of a pointer.
#[must_use]
pub fn as_pointer(graph: &TypeGraph, ty: TypeId) -> Option<TypeId> {
    match resolved_shape(graph, ty)? {
        Shape::Pointer(elem) => Some(*elem),
        _ => None,
    }
}

/// Returns the element type of a slice.
#[must_use]
pub fn as_slice(graph: &TypeGraph, ty: TypeId) -> Option<TypeId> {
    match resolved_shape(graph, ty)? {
        Shape::Slice(elem) => Some(*elem),
        _ => None,
    }
}

/// Returns the length and element type of an array.
#[must_use]
pub fn as_array(graph: &TypeGraph, ty: TypeId) -> Option<(usize, TypeId)> {
    match resolved_shape(graph, ty)? {
        Shape::Array { len, elem } => Some((*len, *elem)),
        _ => None,
    }
}

/// Returns the key and value types of a map.
#[must_use]
pub fn as_map(graph: &TypeGraph, ty: TypeId) -> Option<(TypeId, TypeId)> {
    match resolved_shape(graph, ty)? {
        Shape::Map { key, value } => Some((*key, *value)),
        _ => None,
    }
}

/// Returns the direction and element type of a channel.
#[must_use]
pub fn as_chan(graph: &TypeGraph, ty: TypeId) -> Option<(ChanDir, TypeId)> {
    match resolved_shape(graph, ty)? {
        Shape::Chan { dir, elem } => Some((*dir, *elem)),
        _ => None,
    }
}

/// Returns the signature of a function type.
#[must_use]
pub fn as_signature(graph: &TypeGraph, ty: TypeId) -> Option<&Signature> {
    match resolved_shape(graph, ty)? {
        Shape::Signature(sig) => Some(sig),
        _ => None,
    }
}

/// Returns the interface shape of a type.
#[must_use]
pub fn as_interface(graph: &TypeGraph, ty: TypeId) -> Option<&InterfaceType> {
    match resolved_shape(graph, ty)? {
        Shape::Interface(iface) => Some(iface),
        _ => None,
    }
}

/// Returns the basic kind of a type.
#[must_use]
pub fn as_basic(graph: &TypeGraph, ty: TypeId) -> Option<BasicKind> {
    match resolved_shape(graph, ty)? {
        Shape::Basic(kind) => Some(*kind),
        _ => None,
    }
}

/// Returns true if the type resolves to the given basic kind.
#[must_use]
pub fn is_basic_kind(graph: &TypeGraph, ty: TypeId, kind: BasicKind) -> bool {
    as_basic(graph, ty) == Some(kind)
}

/// Returns true if the type resolves to a basic kind of the given class.
#[must_use]
pub fn has_basic_info(graph: &TypeGraph, ty: TypeId, info: BasicInfo) -> bool {
    as_basic(graph, ty).is_some_and(|k| k.has_info(info))
}

/// Returns true if values of the type have a length: arrays, slices, maps,
/// or pointers to one of those.
#[must_use]
pub fn is_sized(graph: &TypeGraph, ty: TypeId) -> bool {
    match resolved_shape(graph, ty) {
        Some(Shape::Pointer(elem)) => is_sized(graph, *elem),
        Some(Shape::Array { .. } | Shape::Slice(_) | Shape::Map { .. }) => true,
        _ => false,
    }
}

/// Returns true if the type has an absent (nil) value.
#[must_use]
pub fn is_nilable(graph: &TypeGraph, ty: TypeId) -> bool {
    matches!(
        resolved_shape(graph, ty),
        Some(
            Shape::Pointer(_)
                | Shape::Slice(_)
                | Shape::Map { .. }
                | Shape::Chan { .. }
                | Shape::Signature(_)
                | Shape::Interface(_)
        )
    )
}

/// Returns true if two types are identical.
///
/// Named types are identical only to themselves; unnamed types compare
/// structurally. Cycles always pass through a named type, so the
/// comparison terminates.
#[must_use]
pub fn identical(graph: &TypeGraph, a: TypeId, b: TypeId) -> bool {
    if a == b {
        return true;
    }
    let (Some(sa), Some(sb)) = (graph.get(a), graph.get(b)) else {
        return false;
    };
    match (sa, sb) {
        (Shape::Basic(x), Shape::Basic(y)) => x == y,
        (Shape::Pointer(x), Shape::Pointer(y)) | (Shape::Slice(x), Shape::Slice(y)) => {
            identical(graph, *x, *y)
        }
        (Shape::Array { len: la, elem: ea }, Shape::Array { len: lb, elem: eb }) => {
            la == lb && identical(graph, *ea, *eb)
        }
        (Shape::Map { key: ka, value: va }, Shape::Map { key: kb, value: vb }) => {
            identical(graph, *ka, *kb) && identical(graph, *va, *vb)
        }
        (Shape::Chan { dir: da, elem: ea }, Shape::Chan { dir: db, elem: eb }) => {
            da == db && identical(graph, *ea, *eb)
        }
        (Shape::Signature(x), Shape::Signature(y)) => identical_signatures(graph, x, y),
        (Shape::Struct(x), Shape::Struct(y)) => {
            x.fields.len() == y.fields.len()
                && x.fields.iter().zip(&y.fields).all(|(fa, fb)| {
                    fa.name == fb.name
                        && fa.embedded == fb.embedded
                        && fa.tag == fb.tag
                        && identical(graph, fa.ty, fb.ty)
                })
        }
        (Shape::Interface(x), Shape::Interface(y)) => {
            x.methods.len() == y.methods.len()
                && x.methods.iter().all(|m| {
                    y.methods
                        .iter()
                        .any(|n| n.name == m.name && identical(graph, m.signature, n.signature))
                })
        }
        _ => false,
    }
}

fn identical_signatures(graph: &TypeGraph, a: &Signature, b: &Signature) -> bool {
    a.variadic == b.variadic
        && a.params.len() == b.params.len()
        && a.results.len() == b.results.len()
        && a.params
            .iter()
            .zip(&b.params)
            .chain(a.results.iter().zip(&b.results))
            .all(|(x, y)| identical(graph, *x, *y))
}

fn is_named(graph: &TypeGraph, ty: TypeId) -> bool {
    graph.get(ty).is_some_and(Shape::is_named)
}

/// Returns true if a value of type `value` can be assigned to `target`.
#[must_use]
pub fn assignable_to(graph: &TypeGraph, value: TypeId, target: TypeId) -> bool {
    if identical(graph, value, target) {
        return true;
    }
    let (Some(vu), Some(tu)) = (resolve(graph, value), resolve(graph, target)) else {
        return false;
    };
    if (!is_named(graph, value) || !is_named(graph, target)) && identical(graph, vu, tu) {
        return true;
    }
    match (graph.get(vu), graph.get(tu)) {
        (_, Some(Shape::Interface(t))) if t.is_empty() => true,
        (Some(Shape::Interface(v)), Some(Shape::Interface(t))) => t
            .methods
            .iter()
            .all(|m| v.methods.iter().any(|n| n.name == m.name)),
        _ => false,
    }
}

/// Returns true if a value of type `value` can be converted to `target`.
#[must_use]
pub fn convertible_to(graph: &TypeGraph, value: TypeId, target: TypeId) -> bool {
    if assignable_to(graph, value, target) {
        return true;
    }
    let (Some(vu), Some(tu)) = (resolve(graph, value), resolve(graph, target)) else {
        return false;
    };
    if identical(graph, vu, tu) {
        return true;
    }
    if let (Some(Shape::Pointer(a)), Some(Shape::Pointer(b))) = (graph.get(value), graph.get(target))
    {
        if let (Some(ra), Some(rb)) = (resolve(graph, *a), resolve(graph, *b)) {
            if identical(graph, ra, rb) {
                return true;
            }
        }
    }
    match (graph.get(vu), graph.get(tu)) {
        (Some(Shape::Basic(v)), Some(Shape::Basic(t))) => {
            let numeric = BasicInfo::Numeric;
            (v.has_info(numeric) && t.has_info(numeric))
                || (v.is_integer() && *t == BasicKind::String)
        }
        (Some(Shape::Basic(BasicKind::String)), Some(Shape::Slice(elem)))
        | (Some(Shape::Slice(elem)), Some(Shape::Basic(BasicKind::String))) => matches!(
            as_basic(graph, *elem),
            Some(BasicKind::Uint8 | BasicKind::Char)
        ),
        _ => false,
    }
}

/// Predicate over types used to filter catalog queries.
pub trait TypeFilter {
    /// Returns true if the type should be kept.
    fn accept(&self, graph: &TypeGraph, ty: TypeId) -> bool;
}

impl<F> TypeFilter for F
where
    F: Fn(&TypeGraph, TypeId) -> bool,
{
    fn accept(&self, graph: &TypeGraph, ty: TypeId) -> bool {
        self(graph, ty)
    }
}

/// Filter accepting types assignable to `target`.
#[must_use]
pub fn assignable_to_filter(target: TypeId) -> impl TypeFilter {
    move |graph: &TypeGraph, ty: TypeId| assignable_to(graph, ty, target)
}

/// Filter accepting types convertible to `target`.
#[must_use]
pub fn convertible_to_filter(target: TypeId) -> impl TypeFilter {
    move |graph: &TypeGraph, ty: TypeId| convertible_to(graph, ty, target)
}

/// Filter accepting struct types.
#[must_use]
pub fn struct_filter() -> impl TypeFilter {
    |graph: &TypeGraph, ty: TypeId| is_struct(graph, ty)
}
