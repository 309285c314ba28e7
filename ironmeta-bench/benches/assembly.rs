//! Source assembly benchmarks.

use criterion::{Criterion, criterion_group, criterion_main};
use ironmeta_bench::fixtures::embedding_tree;
use ironmeta_codegen::{Arg, Code, Passthrough, RustFormatter};
use ironmeta_schema::flatten;
use std::hint::black_box;

fn assemble(fx: &ironmeta_bench::fixtures::Fixture) -> Code {
    let table = flatten(&fx.graph, fx.root, "json", true);
    let code = Code::new(Some(fx.home)).print("pub struct View {\n");
    table
        .fields()
        .fold(code, |code, field| {
            code.format(
                &fx.graph,
                "    pub {}: {},\n",
                &[Arg::Owned(field.name.to_lowercase()), Arg::Type(field.ty)],
            )
        })
        .println("}")
}

fn benchmark_format(c: &mut Criterion) {
    let fx = embedding_tree(3, 2);

    c.bench_function("code_format_fields", |b| b.iter(|| assemble(black_box(&fx))));
}

fn benchmark_finalize(c: &mut Criterion) {
    let fx = embedding_tree(3, 2);
    let code = assemble(&fx);

    c.bench_function("finalize_passthrough", |b| {
        b.iter(|| code.clone().finalize_file(&fx.graph, &Passthrough))
    });

    c.bench_function("finalize_rustfmt", |b| {
        b.iter(|| code.clone().finalize_file(&fx.graph, &RustFormatter))
    });
}

criterion_group!(benches, benchmark_format, benchmark_finalize);
criterion_main!(benches);
