use metapath::model::simple::{SimpleNode, doc, field, root_assembly};
use metapath::{DynamicContext, DynamicContextBuilder, ErrorCode, evaluate_expr};
use rstest::rstest;

fn ctx() -> DynamicContext<SimpleNode> {
    let document = doc()
        .child(
            root_assembly("statement")
                .child(field("part", "  The organization   shall\tdocument  "))
                .child(field("label", "AC-1")),
        )
        .build();
    DynamicContextBuilder::new().with_context_node(document).build()
}

fn string(expr: &str) -> String {
    let out = evaluate_expr::<SimpleNode>(expr, &ctx()).unwrap().atomize().unwrap();
    assert_eq!(out.len(), 1, "{expr} returned {out:?}");
    out[0].to_string()
}

#[rstest]
#[case("string(())", "")]
#[case("string(1.0)", "1")]
#[case("string(/statement/label)", "AC-1")]
#[case("/statement/label/string()", "AC-1")]
#[case("string-length('héllo')", "5")]
#[case("string-length(())", "0")]
#[case("/statement/label/string-length()", "4")]
#[case("concat('a', 1, 'b')", "a1b")]
#[case("concat('a', (), 'c', ' ', true())", "ac true")]
#[case("'x' || 2 || ()", "x2")]
#[case("upper-case('ac-1')", "AC-1")]
#[case("lower-case(/statement/label)", "ac-1")]
#[case("normalize-space(/statement/part)", "The organization shall document")]
#[case("normalize-space(())", "")]
fn string_values(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string(expr), expected, "{expr}");
}

#[rstest]
#[case("/statement/string()", "")]
#[case("/statement/string-length()", "0")]
#[case("/statement/normalize-space()", "")]
#[case("string-length()", "0")]
#[case("normalize-space()", "")]
#[case("/statement/part/string-length() > 0", "true")]
fn context_forms_use_the_string_value(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string(expr), expected, "{expr}");
}

#[rstest]
#[case("substring('12345', 1.5, 2.6)", "234")]
#[case("substring('12345', 0, 3)", "12")]
#[case("substring('motor car', 6)", " car")]
#[case("substring('12345', -42, 1 div 0e0)", "12345")]
#[case("substring('12345', 5, -3)", "")]
#[case("substring((), 1, 2)", "")]
fn substring_rounds_positions(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string(expr), expected, "{expr}");
}

#[rstest]
#[case("contains('access control', 'control')", "true")]
#[case("contains('abc', '')", "true")]
#[case("contains((), 'a')", "false")]
#[case("starts-with(/statement/label, 'AC')", "true")]
#[case("ends-with(/statement/label, '-2')", "false")]
#[case("matches('AC-1', '^[A-Z]{2}-\\d+$')", "true")]
#[case("matches('ac-1', '^AC', 'i')", "true")]
#[case("matches('a\nb', '^b$', 'm')", "true")]
#[case("matches('a\nb', 'a.b')", "false")]
#[case("matches('a\nb', 'a.b', 's')", "true")]
fn string_predicates(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(string(expr), expected, "{expr}");
}

#[rstest]
#[case("matches('a', 'a', 'q')", ErrorCode::FORX0001)]
#[case("matches('a', '(')", ErrorCode::FORX0002)]
#[case("string-length(12)", ErrorCode::XPTY0004)]
#[case("upper-case(('a', 'b'))", ErrorCode::XPTY0004)]
fn string_function_errors(#[case] expr: &str, #[case] code: ErrorCode) {
    let err = evaluate_expr::<SimpleNode>(expr, &ctx()).unwrap_err();
    assert_eq!(err.code(), code, "{expr}: {err}");
}
