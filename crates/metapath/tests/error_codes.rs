use metapath::consts::ERR_NS;
use metapath::{Error, ErrorCode, compile_default};
use rstest::rstest;

#[rstest]
#[case(ErrorCode::FOAR0001)]
#[case(ErrorCode::FORG0001)]
#[case(ErrorCode::FORX0002)]
#[case(ErrorCode::XPDY0002)]
#[case(ErrorCode::XPST0003)]
#[case(ErrorCode::XPST0081)]
#[case(ErrorCode::XPTY0020)]
fn codes_round_trip_through_text(#[case] code: ErrorCode) {
    assert!(code.as_str().starts_with("err:"));
    assert_eq!(ErrorCode::from_code(code.as_str()), code);
    assert_eq!(code.to_string(), code.as_str());
}

#[rstest]
#[case("err:NOPE0000")]
#[case("XPST0003")]
#[case("")]
fn unrecognized_codes_map_to_unknown(#[case] text: &str) {
    assert_eq!(ErrorCode::from_code(text), ErrorCode::Unknown);
}

#[rstest]
fn codes_are_names_in_the_error_namespace() {
    let name = ErrorCode::XPTY0004.qname();
    assert_eq!(name.ns_uri.as_deref(), Some(ERR_NS));
    assert_eq!(name.local, "XPTY0004");
}

#[rstest]
fn static_and_dynamic_errors_are_told_apart() {
    assert!(compile_default("1 +").unwrap_err().is_static());
    assert!(compile_default("nope()").unwrap_err().is_static());
    let dynamic = Error::dynamic(ErrorCode::FOAR0001, "division by zero");
    assert!(!dynamic.is_static());
    assert_eq!(dynamic.code(), ErrorCode::FOAR0001);
    assert_eq!(dynamic.to_string(), "division by zero (err:FOAR0001)");
}

#[rstest]
fn helper_constructors_pick_their_codes() {
    assert_eq!(Error::type_mismatch("a", "b").code(), ErrorCode::XPTY0004);
    assert_eq!(Error::ebv("(1, 2)").code(), ErrorCode::FORG0006);
}
