//! Type graphs used by the benchmarks.

use ironmeta_schema::{BasicKind, PackageId, StructField, TypeGraph, TypeId};

/// A generated graph and the root aggregate to flatten.
pub struct Fixture {
    /// Type graph.
    pub graph: TypeGraph,
    /// Home package.
    pub home: PackageId,
    /// Root aggregate.
    pub root: TypeId,
}

/// Builds a struct with `width` annotated scalar fields.
#[must_use]
pub fn wide_struct(width: usize) -> Fixture {
    let mut graph = TypeGraph::new();
    let home = graph.package("crate::bench", "bench");
    let int = graph.basic(BasicKind::Int64);
    let fields = (0..width)
        .map(|i| {
            StructField::new(format!("Field{i}"), int)
                .with_tag(format!(r#"json:"field_{i},omitempty""#))
        })
        .collect();
    let body = graph.struct_type(fields);
    let root = graph.declare("Wide", Some(home), body).expect("declare");
    Fixture { graph, home, root }
}

/// Builds a tree of embedded structs `depth` levels deep, each level
/// embedding `fanout` children and declaring a shared `Id` field plus one
/// uniquely named field.
///
/// Every level shadows the `Id` fields below it, so flattening exercises
/// both promotion and shadow resolution.
#[must_use]
pub fn embedding_tree(depth: usize, fanout: usize) -> Fixture {
    let mut graph = TypeGraph::new();
    let home = graph.package("crate::bench", "bench");
    let ext = graph.package("crate::ext", "ext");
    let int = graph.basic(BasicKind::Int64);
    let ext_ty = graph.declare("Stamp", Some(ext), int).expect("declare");

    let mut counter = 0usize;
    let root = build_level(&mut graph, home, ext_ty, int, depth, fanout, &mut counter);
    Fixture { graph, home, root }
}

fn build_level(
    graph: &mut TypeGraph,
    home: PackageId,
    ext_ty: TypeId,
    int: TypeId,
    depth: usize,
    fanout: usize,
    counter: &mut usize,
) -> TypeId {
    let id = *counter;
    *counter += 1;

    let mut fields = Vec::with_capacity(fanout + 2);
    if depth > 0 {
        for _ in 0..fanout {
            let child = build_level(graph, home, ext_ty, int, depth - 1, fanout, counter);
            let child_ptr = graph.pointer(child);
            fields.push(StructField::embedded(child_ptr));
        }
    }
    fields.push(StructField::new("Id", int).with_tag(r#"json:"id""#));
    fields.push(StructField::new(format!("Value{id}"), ext_ty).with_tag(r#"db:"value""#));

    let body = graph.struct_type(fields);
    graph
        .declare(format!("Level{id}"), Some(home), body)
        .expect("declare")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmeta_schema::flatten;

    #[test]
    fn test_wide_struct_flattens_every_field() {
        let fx = wide_struct(16);
        assert_eq!(flatten(&fx.graph, fx.root, "json", true).len(), 16);
    }

    #[test]
    fn test_embedding_tree_promotes_unique_fields() {
        let fx = embedding_tree(2, 2);
        let table = flatten(&fx.graph, fx.root, "json", true);
        // seven levels, one unique field each, plus the shared Id
        assert_eq!(table.len(), 8);
        assert_eq!(table.get("Id").map(|f| f.depth()), Some(0));
        assert_eq!(table.candidates("Id").len(), 7);
    }
}
