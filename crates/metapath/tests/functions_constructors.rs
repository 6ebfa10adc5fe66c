use metapath::model::simple::SimpleNode;
use metapath::{AtomicItem, AtomicType, DynamicContextBuilder, Error, ErrorCode, evaluate_expr};
use rstest::rstest;
use rust_decimal::Decimal;

fn eval(expr: &str) -> Result<Vec<AtomicItem>, Error> {
    let ctx = DynamicContextBuilder::<SimpleNode>::new().build();
    evaluate_expr::<SimpleNode>(expr, &ctx)?.atomize()
}

#[rstest]
#[case("meta:integer('42')", AtomicItem::Integer(42))]
#[case("meta:integer(' -7 ')", AtomicItem::Integer(-7))]
#[case("meta:integer(5.9)", AtomicItem::Integer(5))]
#[case("meta:decimal(3)", AtomicItem::Decimal(Decimal::from(3)))]
#[case("meta:double('1e3')", AtomicItem::Double(1000.0))]
#[case("meta:boolean('1')", AtomicItem::Boolean(true))]
#[case("meta:boolean(0)", AtomicItem::Boolean(false))]
#[case("meta:string(1.5e0)", AtomicItem::String("1.5".to_string()))]
#[case("meta:token(' ac-1 ')", AtomicItem::Token("ac-1".to_string()))]
#[case("meta:positive-integer('3')", AtomicItem::PositiveInteger(3))]
#[case("meta:non-negative-integer(0)", AtomicItem::NonNegativeInteger(0))]
#[case("meta:uri-reference('../catalog.json#ac-1')", AtomicItem::UriReference("../catalog.json#ac-1".to_string()))]
fn constructors_cast_their_argument(#[case] expr: &str, #[case] expected: AtomicItem) {
    assert_eq!(eval(expr).unwrap(), [expected], "{expr}");
}

#[rstest]
#[case("meta:ip-v6-address('fe80::/64')", AtomicType::IpV6Address, "fe80::/64")]
#[case("meta:ip-v4-address('192.0.2.1')", AtomicType::IpV4Address, "192.0.2.1")]
#[case(
    "meta:uuid('6D7C0A5E-3B7F-4F3E-9C4B-2A1D8E0F9B11')",
    AtomicType::Uuid,
    "6d7c0a5e-3b7f-4f3e-9c4b-2a1d8e0f9b11"
)]
#[case("meta:date('2024-02-29Z')", AtomicType::Date, "2024-02-29Z")]
#[case(
    "meta:date-time('2024-02-29T12:30:00.500+05:30')",
    AtomicType::DateTime,
    "2024-02-29T12:30:00.5+05:30"
)]
#[case("meta:date(meta:date-time('2024-01-02T23:59:59'))", AtomicType::Date, "2024-01-02")]
#[case("meta:base64('aGVsbG8=')", AtomicType::Base64Binary, "aGVsbG8=")]
#[case("meta:markup-line('**bold** text')", AtomicType::MarkupLine, "**bold** text")]
fn constructors_produce_canonical_values(
    #[case] expr: &str,
    #[case] ty: AtomicType,
    #[case] canonical: &str,
) {
    let out = eval(expr).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].atomic_type(), ty);
    assert_eq!(out[0].to_string(), canonical);
}

#[rstest]
fn constructor_of_empty_is_empty() {
    assert!(eval("meta:integer(())").unwrap().is_empty());
    assert!(eval("meta:uuid(())").unwrap().is_empty());
}

#[rstest]
#[case("meta:integer('x')", AtomicType::Integer)]
#[case("meta:positive-integer('0')", AtomicType::PositiveInteger)]
#[case("meta:non-negative-integer(-1)", AtomicType::NonNegativeInteger)]
#[case("meta:date('2023-02-29')", AtomicType::Date)]
#[case("meta:date-with-timezone('2024-01-01')", AtomicType::DateWithTimezone)]
#[case("meta:ip-v6-address('127.0.0.1')", AtomicType::IpV6Address)]
#[case("meta:uri('relative/path')", AtomicType::Uri)]
#[case("meta:markup-line('one\ntwo')", AtomicType::MarkupLine)]
#[case("meta:token('1abc')", AtomicType::Token)]
fn invalid_lexical_forms_are_cast_errors(#[case] expr: &str, #[case] target: AtomicType) {
    let err = eval(expr).unwrap_err();
    match &err {
        Error::Cast { target: t, .. } => assert_eq!(*t, target, "{expr}"),
        other => panic!("{expr}: expected a cast error, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::FORG0001);
}

#[rstest]
#[case("meta:integer(meta:date('2024-01-01'))")]
#[case("meta:date(1)")]
#[case("meta:ip-v4-address(true())")]
fn incompatible_sources_are_type_errors(#[case] expr: &str) {
    let err = eval(expr).unwrap_err();
    assert_eq!(err.code(), ErrorCode::XPTY0004, "{expr}: {err}");
}

#[rstest]
fn constructor_rejects_sequences() {
    let err = eval("meta:integer(('1', '2'))").unwrap_err();
    assert!(matches!(err, Error::Cardinality { .. }));
}
