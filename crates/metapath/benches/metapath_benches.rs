use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use metapath::model::simple::{SimpleNode, assembly, doc, field, flag, root_assembly};
use metapath::{
    AtomicType, CompiledExpr, DynamicContextBuilder, Error, MetapathParser, compile_default,
    evaluate,
};
use std::hint::black_box;

fn sample_queries() -> Vec<&'static str> {
    vec![
        "1 + 2 * 3",
        "string-length('Lorem ipsum dolor sit amet, consectetur adipiscing elit.')",
        "/catalog/group/control[@class = 'SP800-53'][position() < 5]/@id",
        "for $n in 1 to 100 return $n * $n",
        "count(//prop[@name = 'label'])",
        "sum(//control/prop[@name = 'weight'])",
        "if (exists(//control[@id = 'ac-2'])) then 'present' else 'absent'",
        "//control[title = 'Account Management']/mp:path()",
    ]
}

fn benchmark_parser(c: &mut Criterion) {
    let queries = sample_queries();
    c.bench_function("parser/parse_to_ast", |b| {
        b.iter(|| {
            for q in &queries {
                let ast = MetapathParser::parse_to_ast(black_box(q)).expect("parse failure");
                black_box(ast);
            }
        })
    });
}

fn benchmark_compiler(c: &mut Criterion) {
    let queries = sample_queries();
    c.bench_function("compiler/compile_default", |b| {
        b.iter(|| {
            for q in &queries {
                let compiled = compile_default(black_box(q)).expect("compile failure");
                black_box(compiled);
            }
        })
    });
}

fn control(group: usize, index: usize) -> metapath::model::simple::SimpleNodeBuilder {
    assembly("control")
        .flag(flag("id", &format!("g{group}-{index}")))
        .flag(flag("class", if index % 2 == 0 { "SP800-53" } else { "custom" }))
        .child(field("title", if index == 2 { "Account Management" } else { "Control" }))
        .child(field("prop", &format!("{group}.{index}")).flag(flag("name", "label")))
        .child(
            field("prop", &index.to_string())
                .typed(AtomicType::Integer)
                .flag(flag("name", "weight")),
        )
}

fn build_sample_document() -> SimpleNode {
    let groups = (1..=4).map(|g| {
        assembly("group")
            .flag(flag("id", &format!("g{g}")))
            .children((1..=10).map(|i| control(g, i)))
    });
    doc()
        .child(
            root_assembly("catalog")
                .flag(flag("uuid", "6d7c0a5e-3b7f-4f3e-9c4b-2a1d8e0f9b11").typed(AtomicType::Uuid))
                .child(field("title", "Benchmark Catalog"))
                .children(groups)
                .child(assembly("control").flag(flag("id", "ac-2")).child(field("title", "Loose"))),
        )
        .build()
}

fn prepared_compiled_queries() -> Result<Vec<(String, CompiledExpr)>, Error> {
    sample_queries()
        .into_iter()
        .map(|q| compile_default(q).map(|c| (q.to_string(), c)))
        .collect()
}

fn benchmark_evaluator(c: &mut Criterion) {
    let document = build_sample_document();
    let ctx = DynamicContextBuilder::new()
        .with_context_node(document)
        .build();
    let compiled = prepared_compiled_queries().expect("compile failure");

    let mut group = c.benchmark_group("evaluator/evaluate");
    for (name, expr) in &compiled {
        group.bench_with_input(BenchmarkId::from_parameter(name), expr, |b, expr| {
            b.iter(|| {
                let result = evaluate::<SimpleNode>(expr, black_box(&ctx)).expect("eval failure");
                black_box(result.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parser,
    benchmark_compiler,
    benchmark_evaluator
);
criterion_main!(benches);
