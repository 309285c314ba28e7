use ironmeta_schema::{
    BasicKind, FieldTable, FlattenOptions, StructField, TypeGraph, TypeId, flatten,
};

struct Fixture {
    graph: TypeGraph,
    root: TypeId,
}

/// `Root { Base, Audit, Name string }` where both `Base` and `Audit` carry
/// `Id` and `Base` carries `Name`.
fn shadowing_fixture() -> Fixture {
    let mut graph = TypeGraph::new();
    let pkg = graph.package("crate::model", "model");
    let string = graph.basic(BasicKind::String);
    let int = graph.basic(BasicKind::Int64);

    let base_body = graph.struct_type(vec![
        StructField::new("Id", int).with_tag(r#"json:"id""#),
        StructField::new("Name", string).with_tag(r#"json:"base_name""#),
    ]);
    let base = graph.declare("Base", Some(pkg), base_body).expect("declare");

    let audit_body = graph.struct_type(vec![
        StructField::new("Id", string).with_tag(r#"json:"audit_id""#),
        StructField::new("CreatedBy", string),
    ]);
    let audit = graph.declare("Audit", Some(pkg), audit_body).expect("declare");
    let audit_ptr = graph.pointer(audit);

    let root_body = graph.struct_type(vec![
        StructField::embedded(base),
        StructField::embedded(audit_ptr),
        StructField::new("Name", string).with_tag(r#"json:"name""#),
    ]);
    let root = graph.declare("Root", Some(pkg), root_body).expect("declare");
    Fixture { graph, root }
}

#[test]
fn test_shallower_field_shadows_promoted_one() {
    let fx = shadowing_fixture();
    let table = flatten(&fx.graph, fx.root, "json", true);

    let name = table.get("Name").expect("Name");
    assert_eq!(name.depth(), 0);
    assert_eq!(name.path.to_string(), ".Name");
    assert_eq!(name.annotation("json").map(|a| a.name.as_str()), Some("name"));

    let candidates = table.candidates("Name");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1].path.to_string(), ".Base.Name");
}

#[test]
fn test_equal_depth_tie_breaks_by_index() {
    let fx = shadowing_fixture();
    let table = flatten(&fx.graph, fx.root, "json", true);

    let candidates = table.candidates("Id");
    let paths: Vec<_> = candidates.iter().map(|f| f.path.to_string()).collect();
    assert_eq!(paths, [".Base.Id", ".Audit.Id"]);
    assert_eq!(
        table.get("Id").and_then(|f| f.annotation("json")).map(|a| a.name.as_str()),
        Some("id")
    );
}

#[test]
fn test_flatten_is_deterministic() {
    let fx = shadowing_fixture();
    let first = flatten(&fx.graph, fx.root, "json", true);
    for _ in 0..32 {
        let again = flatten(&fx.graph, fx.root, "json", true);
        let a: Vec<_> = first.iter().map(|(n, f)| (n.to_string(), f.path.to_string())).collect();
        let b: Vec<_> = again.iter().map(|(n, f)| (n.to_string(), f.path.to_string())).collect();
        assert_eq!(a, b);
    }
    assert_eq!(
        first.names().collect::<Vec<_>>(),
        ["Id", "Name", "CreatedBy"]
    );
}

#[test]
fn test_without_follow_embeds_keeps_embedding_fields() {
    let fx = shadowing_fixture();
    let table = flatten(&fx.graph, fx.root, "json", false);
    assert_eq!(table.names().collect::<Vec<_>>(), ["Base", "Audit", "Name"]);
    assert!(table.get("Base").expect("Base").embedded);
}

#[test]
fn test_annotated_embedding_is_not_promoted() {
    let mut graph = TypeGraph::new();
    let int = graph.basic(BasicKind::Int32);
    let inner_body = graph.struct_type(vec![StructField::new("X", int)]);
    let inner = graph.declare("Inner", None, inner_body).expect("declare");
    let root = graph.struct_type(vec![
        StructField::embedded(inner).with_tag(r#"json:"inner""#),
    ]);

    let table = flatten(&graph, root, "json", true);
    assert_eq!(table.names().collect::<Vec<_>>(), ["Inner"]);

    let table = flatten(&graph, root, "db", true);
    assert_eq!(table.names().collect::<Vec<_>>(), ["X"]);
}

#[test]
fn test_merge_accumulates_annotations_per_key() {
    let mut graph = TypeGraph::new();
    let int = graph.basic(BasicKind::Int32);
    let inner_body = graph.struct_type(vec![
        StructField::new("X", int).with_tag(r#"a:"1" b:"2""#),
    ]);
    let inner = graph.declare("Inner", None, inner_body).expect("declare");
    let root = graph.struct_type(vec![StructField::embedded(inner)]);

    let table = FieldTable::new()
        .merge(&graph, root, &FlattenOptions::new("a"))
        .merge(&graph, root, &FlattenOptions::new("b"));
    let x = table.get("X").expect("X");
    assert_eq!(table.candidates("X").len(), 1);
    assert_eq!(x.annotation("a").map(|a| a.name.as_str()), Some("1"));
    assert_eq!(x.annotation("b").map(|a| a.name.as_str()), Some("2"));
}

#[test]
fn test_empty_aggregate_yields_empty_table() {
    let mut graph = TypeGraph::new();
    let empty = graph.struct_type(Vec::new());
    assert!(flatten(&graph, empty, "json", true).is_empty());
}

#[test]
fn test_self_embedding_terminates() {
    let mut graph = TypeGraph::new();
    let int = graph.basic(BasicKind::Int32);
    let node = graph.named("Node", None);
    let node_ptr = graph.pointer(node);
    let body = graph.struct_type(vec![
        StructField::new("Value", int),
        StructField::embedded(node_ptr),
    ]);
    graph.set_underlying(node, body).expect("set underlying");

    let table = flatten(&graph, node, "json", true);
    assert_eq!(table.names().collect::<Vec<_>>(), ["Value", "Node"]);
    let leaf = table.get("Node").expect("cyclic embedding kept as leaf");
    assert!(leaf.embedded);
    assert_eq!(leaf.ty, node_ptr);
}

#[test]
fn test_mutual_embedding_terminates() {
    let mut graph = TypeGraph::new();
    let int = graph.basic(BasicKind::Int32);
    let a = graph.named("A", None);
    let b = graph.named("B", None);
    let b_ptr = graph.pointer(b);
    let a_ptr = graph.pointer(a);
    let a_body = graph.struct_type(vec![StructField::new("X", int), StructField::embedded(b_ptr)]);
    let b_body = graph.struct_type(vec![StructField::new("Y", int), StructField::embedded(a_ptr)]);
    graph.set_underlying(a, a_body).expect("set underlying");
    graph.set_underlying(b, b_body).expect("set underlying");

    let table = flatten(&graph, a, "json", true);
    assert_eq!(table.names().collect::<Vec<_>>(), ["X", "Y", "A"]);
    assert_eq!(table.get("A").expect("A").path.to_string(), ".B.A");
}
