use metapath::model::simple::{SimpleNode, doc, field, root_assembly};
use metapath::{AtomicItem, AtomicType, DynamicContextBuilder, Error, ErrorCode, evaluate_expr};
use rstest::rstest;

fn eval(expr: &str) -> Result<Vec<AtomicItem>, Error> {
    let ctx = DynamicContextBuilder::<SimpleNode>::new().build();
    evaluate_expr::<SimpleNode>(expr, &ctx)?.atomize()
}

fn boolean(expr: &str) -> bool {
    match eval(expr).unwrap().as_slice() {
        [AtomicItem::Boolean(b)] => *b,
        other => panic!("{expr}: expected a boolean, got {other:?}"),
    }
}

#[rstest]
#[case("(1, 2, 3) = (3, 4)", true)]
#[case("(1, 2) = (3, 4)", false)]
#[case("() = 1", false)]
#[case("(1, 2) != (1, 2)", true)]
#[case("(1, 2) < (0, 1)", false)]
#[case("(1, 5) > (4, 9)", true)]
#[case("'b' >= ('a', 'z')", true)]
fn general_comparison_is_existential(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(boolean(expr), expected, "{expr}");
}

#[rstest]
#[case("1 eq 1.0", true)]
#[case("1 lt 2.5e0", true)]
#[case("0.1 + 0.2 eq 0.3", true)]
#[case("'abc' lt 'abd'", true)]
#[case("'a' ne 'a'", false)]
#[case("true() gt false()", true)]
#[case("meta:date('2024-01-01') lt meta:date('2024-01-02')", true)]
#[case(
    "meta:date-time-with-timezone('2024-01-01T10:00:00+02:00') eq meta:date-time-with-timezone('2024-01-01T08:00:00Z')",
    true
)]
#[case("meta:ip-v4-address('10.0.0.2') gt meta:ip-v4-address('10.0.0.10')", false)]
#[case("meta:token('abc') eq 'abc'", true)]
fn value_comparison_promotes_operands(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(boolean(expr), expected, "{expr}");
}

#[rstest]
fn value_comparison_rejects_sequences() {
    let err = eval("(1, 2) eq 1").unwrap_err();
    assert!(matches!(err, Error::Cardinality { actual: 2, .. }), "{err:?}");
    assert_eq!(err.code(), ErrorCode::XPTY0004);
}

#[rstest]
fn value_comparison_with_empty_operand_is_empty() {
    assert!(eval("() eq 1").unwrap().is_empty());
    assert!(eval("1 ne ()").unwrap().is_empty());
}

#[rstest]
#[case("'1' = 1")]
#[case("1 eq true()")]
#[case("meta:date('2024-01-01') eq '2024-01-01'")]
#[case("meta:base64('AAE=') lt meta:base64('AAI=')")]
fn unrelated_types_are_type_errors(#[case] expr: &str) {
    let err = eval(expr).unwrap_err();
    assert!(matches!(err, Error::Type { .. }), "{expr}: {err:?}");
    assert_eq!(err.code(), ErrorCode::XPTY0004);
}

#[rstest]
fn nan_is_unequal_to_itself() {
    assert!(!boolean("meta:double('NaN') eq meta:double('NaN')"));
    assert!(boolean("meta:double('NaN') ne meta:double('NaN')"));
}

#[rstest]
fn typed_field_values_compare_numerically() {
    let document = doc()
        .child(
            root_assembly("inventory")
                .child(field("count", "9").typed(AtomicType::Integer))
                .child(field("count", "10").typed(AtomicType::Integer)),
        )
        .build();
    let ctx = DynamicContextBuilder::new().with_context_node(document).build();
    let out = evaluate_expr::<SimpleNode>("/inventory/count[. > 9]", &ctx)
        .unwrap()
        .atomize()
        .unwrap();
    assert_eq!(out, [AtomicItem::Integer(10)]);
}
