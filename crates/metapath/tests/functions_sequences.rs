use metapath::model::simple::SimpleNode;
use metapath::{AtomicItem, DynamicContext, DynamicContextBuilder, ErrorCode, evaluate_expr};
use rstest::{fixture, rstest};
use rust_decimal::Decimal;

#[fixture]
fn ctx() -> DynamicContext<SimpleNode> {
    DynamicContextBuilder::new().build()
}

fn atoms(expr: &str, ctx: &DynamicContext<SimpleNode>) -> Vec<AtomicItem> {
    evaluate_expr::<SimpleNode>(expr, ctx).unwrap().atomize().unwrap()
}

fn strings(expr: &str, ctx: &DynamicContext<SimpleNode>) -> Vec<String> {
    atoms(expr, ctx).iter().map(ToString::to_string).collect()
}

#[rstest]
#[case("count(())", &["0"])]
#[case("count(1 to 10)", &["10"])]
#[case("empty(())", &["true"])]
#[case("exists((0))", &["true"])]
#[case("head((3, 2, 1))", &["3"])]
#[case("head(())", &[])]
#[case("tail((3, 2, 1))", &["2", "1"])]
#[case("reverse(1 to 3)", &["3", "2", "1"])]
#[case("distinct-values((1, 1.0, 2, 'a', 'a'))", &["1", "2", "a"])]
#[case("exactly-one('x')", &["x"])]
#[case("zero-or-one(())", &[])]
#[case("one-or-more((1, 2))", &["1", "2"])]
fn sequence_functions(
    ctx: DynamicContext<SimpleNode>,
    #[case] expr: &str,
    #[case] expected: &[&str],
) {
    assert_eq!(strings(expr, &ctx), expected, "{expr}");
}

#[rstest]
#[case("exactly-one(())", ErrorCode::FORG0005)]
#[case("exactly-one((1, 2))", ErrorCode::FORG0005)]
#[case("zero-or-one((1, 2))", ErrorCode::FORG0004)]
#[case("one-or-more(())", ErrorCode::FORG0004)]
fn cardinality_functions_raise(
    ctx: DynamicContext<SimpleNode>,
    #[case] expr: &str,
    #[case] code: ErrorCode,
) {
    let err = evaluate_expr::<SimpleNode>(expr, &ctx).unwrap_err();
    assert_eq!(err.code(), code, "{expr}");
}

#[rstest]
fn sum_keeps_the_narrowest_numeric_type(ctx: DynamicContext<SimpleNode>) {
    assert_eq!(atoms("sum(())", &ctx), [AtomicItem::Integer(0)]);
    assert_eq!(atoms("sum(1 to 4)", &ctx), [AtomicItem::Integer(10)]);
    assert_eq!(atoms("sum((1, 2.5))", &ctx), [AtomicItem::Decimal(Decimal::new(35, 1))]);
    assert_eq!(atoms("sum((1, 2.5e0))", &ctx), [AtomicItem::Double(3.5)]);
}

#[rstest]
fn avg_divides_by_count(ctx: DynamicContext<SimpleNode>) {
    assert_eq!(atoms("avg((1, 2, 3, 4))", &ctx), [AtomicItem::Decimal(Decimal::new(25, 1))]);
    assert!(atoms("avg(())", &ctx).is_empty());
}

#[rstest]
#[case("min((3, 1, 2))", &["1"])]
#[case("max((1, 2.5, 2))", &["2.5"])]
#[case("min(('b', 'a', 'c'))", &["a"])]
#[case("max(())", &[])]
#[case("max((1, meta:double('NaN')))", &["NaN"])]
fn min_and_max(ctx: DynamicContext<SimpleNode>, #[case] expr: &str, #[case] expected: &[&str]) {
    assert_eq!(strings(expr, &ctx), expected, "{expr}");
}

#[rstest]
#[case("sum(('a', 'b'))")]
#[case("max((1, 'a'))")]
fn aggregates_over_mixed_types_fail(ctx: DynamicContext<SimpleNode>, #[case] expr: &str) {
    let err = evaluate_expr::<SimpleNode>(expr, &ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::XPTY0004, "{expr}");
}

#[rstest]
fn range_requires_integers(ctx: DynamicContext<SimpleNode>) {
    assert!(atoms("5 to 1", &ctx).is_empty());
    assert_eq!(strings("() to 3", &ctx), Vec::<String>::new());
    let err = evaluate_expr::<SimpleNode>("1.5 to 3", &ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::XPTY0004);
}
