//! Example generator printing flattened views of a small model.
//!
//! Run with: `cargo run --example flat_view`
//!
//! Set `RUST_LOG=debug` to see field resolution decisions.

use ironmeta::prelude::*;
use ironmeta::schema::predicates::struct_filter;

/// In-memory declarations standing in for a parser front end.
struct Inventory;

impl DeclarationSource for Inventory {
    fn populate(&self, builder: &mut CatalogBuilder) -> Result<(), SchemaError> {
        let home = builder.home();
        let g = builder.graph_mut();
        let chrono = g.package("chrono", "chrono");
        let string = g.basic(BasicKind::String);
        let int = g.basic(BasicKind::Int64);
        let float = g.basic(BasicKind::Float64);
        let stamp = g.declare("NaiveDateTime", Some(chrono), int)?;

        let audit_body = g.struct_type(vec![
            StructField::new("CreatedAt", stamp).with_tag(r#"json:"created_at""#),
            StructField::new("UpdatedAt", stamp).with_tag(r#"json:"updated_at,omitempty""#),
        ]);
        let audit = g.declare("Audit", Some(home), audit_body)?;
        let audit_ptr = g.pointer(audit);

        let product_body = g.struct_type(vec![
            StructField::embedded(audit_ptr),
            StructField::new("SKU", string).with_tag(r#"json:"sku" db:"sku_code""#),
            StructField::new("Price", float).with_tag(r#"json:"price,string""#),
            StructField::new("Internal", string).with_tag(r#"json:"-""#),
        ]);
        let product = g.declare("Product", Some(home), product_body)?;
        let tags = g.slice(string);
        let catalog_ty = g.map(string, product);
        let default_tags = VarDecl::new("DEFAULT_TAGS", tags)
            .with_initializer(Initializer::new("vec![\"new\".to_string()]"));

        builder.unit(
            SourceUnit::new("inventory.go")
                .import(chrono)
                .type_decl(TypeDecl::new("Audit", audit))
                .type_decl(TypeDecl::new("Product", product))
                .var_decl(default_tags)
                .var_decl(VarDecl::new("INDEX", catalog_ty)),
        );
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let catalog = Catalog::load("crate::inventory", "inventory", &Inventory)?;
    let graph = catalog.graph();

    for ty in catalog.defined_types(&struct_filter()) {
        let name = graph.as_named(ty).map_or("", |n| n.name.as_str());
        let fields = FieldTable::new()
            .merge(graph, ty, &FlattenOptions::new("json"))
            .merge(graph, ty, &FlattenOptions::new("db"));
        println!("{name}:");
        for (field_name, field) in fields.iter() {
            let json = field.annotation("json").map(ToString::to_string);
            let db = field.annotation("db").map(ToString::to_string);
            println!(
                "  {field_name:<10} {:<14} json={} db={}",
                field.path.to_string(),
                json.as_deref().unwrap_or("-"),
                db.as_deref().unwrap_or("-"),
            );
        }
    }

    let all = |_: &TypeGraph, _: TypeId| true;
    for var in catalog.defined_vars(&all) {
        let code = Code::new(Some(catalog.home())).format(
            graph,
            "pub static {}: ::std::sync::LazyLock<{}> = ::std::sync::LazyLock::new(|| {});",
            &[
                Arg::from(var),
                Arg::Type(var.ty),
                Arg::display(var.initializer.as_ref().map_or("Default::default()", |i| i.source.as_str())),
            ],
        );
        println!("\n{}", code.finalize(&RustFormatter)?);
    }

    let views = FlatViewGenerator::new(&catalog)
        .derives(["Debug", "Clone", "Default"])
        .generate()?;
    println!("{views}");
    Ok(())
}
