//! Package dependencies of types.

use ironmeta_schema::{PackageId, Shape, TypeGraph, TypeId};

/// Appends the packages referenced by `ty` to `out`, in reference order.
///
/// Composite shapes are unwrapped recursively. Named types contribute their
/// own package and are not expanded further.
pub fn collect_type_imports(graph: &TypeGraph, ty: TypeId, out: &mut Vec<PackageId>) {
    let Some(shape) = graph.get(ty) else {
        return;
    };
    match shape {
        Shape::Basic(_) => {}
        Shape::Named(named) => out.extend(named.package),
        Shape::Pointer(elem)
        | Shape::Slice(elem)
        | Shape::Array { elem, .. }
        | Shape::Chan { elem, .. } => collect_type_imports(graph, *elem, out),
        Shape::Map { key, value } => {
            collect_type_imports(graph, *key, out);
            collect_type_imports(graph, *value, out);
        }
        Shape::Signature(sig) => {
            for t in sig.params.iter().chain(&sig.results) {
                collect_type_imports(graph, *t, out);
            }
        }
        Shape::Struct(body) => {
            for field in &body.fields {
                collect_type_imports(graph, field.ty, out);
            }
        }
        Shape::Interface(iface) => {
            for method in &iface.methods {
                collect_type_imports(graph, method.signature, out);
            }
        }
    }
}

/// Returns the packages referenced by `ty`, in reference order.
#[must_use]
pub fn type_imports(graph: &TypeGraph, ty: TypeId) -> Vec<PackageId> {
    let mut out = Vec::new();
    collect_type_imports(graph, ty, &mut out);
    out
}

/// Removes repeated packages, keeping the first occurrence of each.
#[must_use]
pub fn dedup_packages(packages: &[PackageId]) -> Vec<PackageId> {
    let mut seen = std::collections::HashSet::new();
    packages.iter().copied().filter(|p| seen.insert(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmeta_schema::{BasicKind, ChanDir, Method, StructField};

    #[test]
    fn test_collects_through_every_shape() {
        let mut g = TypeGraph::new();
        let a = g.package("crate::a", "a");
        let b = g.package("crate::b", "b");
        let c = g.package("crate::c", "c");
        let int = g.basic(BasicKind::Int32);
        let ta = g.declare("TA", Some(a), int).expect("declare");
        let tb = g.declare("TB", Some(b), int).expect("declare");
        let tc = g.declare("TC", Some(c), int).expect("declare");

        let ptr = g.pointer(ta);
        let map = g.map(ptr, tb);
        let chan = g.chan(ChanDir::Recv, tc);
        let sig = g.signature(vec![map], vec![chan], false);
        let iface = g.interface(vec![Method {
            name: "Run".to_string(),
            signature: sig,
        }]);
        let arr = g.array(2, iface);
        let body = g.struct_type(vec![StructField::new("f", arr), StructField::new("g", ptr)]);

        assert_eq!(type_imports(&g, body), [a, b, c, a]);
        assert_eq!(dedup_packages(&type_imports(&g, body)), [a, b, c]);
    }

    #[test]
    fn test_named_types_are_not_expanded() {
        let mut g = TypeGraph::new();
        let inner_pkg = g.package("crate::inner", "inner");
        let outer_pkg = g.package("crate::outer", "outer");
        let int = g.basic(BasicKind::Int32);
        let inner = g.declare("Inner", Some(inner_pkg), int).expect("declare");
        let body = g.struct_type(vec![StructField::new("i", inner)]);
        let outer = g.declare("Outer", Some(outer_pkg), body).expect("declare");
        assert_eq!(type_imports(&g, outer), [outer_pkg]);

        let predeclared = g.declare("error", None, int).expect("declare");
        assert!(type_imports(&g, predeclared).is_empty());
    }
}
