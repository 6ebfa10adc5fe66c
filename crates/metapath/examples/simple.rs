use metapath::{
    AtomicType, DynamicContextBuilder, StaticContextBuilder, compile, evaluate,
    model::simple::{SimpleNode, assembly, doc, field, flag, root_assembly},
};

fn main() {
    let document = doc()
        .base_uri("https://example.com/catalog.json")
        .child(
            root_assembly("catalog")
                .namespace("http://csrc.nist.gov/ns/oscal/1.0")
                .flag(flag("uuid", "6d7c0a5e-3b7f-4f3e-9c4b-2a1d8e0f9b11").typed(AtomicType::Uuid))
                .child(field("title", "Sample Catalog"))
                .child(
                    assembly("group")
                        .flag(flag("id", "ac"))
                        .child(assembly("control").flag(flag("id", "ac-1")))
                        .child(
                            assembly("control")
                                .flag(flag("id", "ac-2"))
                                .child(field("prop", "3").typed(AtomicType::Integer)),
                        ),
                ),
        )
        .build();

    let static_ctx = StaticContextBuilder::new()
        .with_namespace("o", "http://csrc.nist.gov/ns/oscal/1.0")
        .build();
    let compiled = compile(
        "for $c in /o:catalog//control return concat($c/@id, ' at ', mp:path($c))",
        &static_ctx,
    )
    .unwrap();
    print!("Compiled: ");
    println!("{:?}", compiled.ast());

    let ctx = DynamicContextBuilder::new()
        .with_context_node(document)
        .build();
    let result = evaluate::<SimpleNode>(&compiled, &ctx);
    match result.and_then(|seq| seq.atomize()) {
        Ok(values) => values.iter().for_each(|v| println!("{v}")),
        Err(e) => println!("{} {e}", e.code()),
    }
}
