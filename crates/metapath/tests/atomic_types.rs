use metapath::{AtomicItem, AtomicType, ErrorCode};
use rstest::rstest;

#[rstest]
fn type_names_round_trip() {
    for ty in AtomicType::ALL {
        assert_eq!(AtomicType::from_name(ty.name()), Some(ty), "{ty}");
    }
    assert_eq!(AtomicType::from_name("no-such-type"), None);
}

#[rstest]
#[case("::")]
#[case("::1")]
#[case("::/128")]
#[case("fe80::/64")]
#[case("::ffff:192.0.2.47")]
#[case("2001:0000:0000:0000:0000:ffff:0a02:0202")]
#[case("2001:db8:85a3::8a2e:370:7334")]
fn ipv6_accepts(#[case] lexical: &str) {
    let v = AtomicType::IpV6Address.parse(lexical).unwrap();
    assert_eq!(v.atomic_type(), AtomicType::IpV6Address);
}

#[rstest]
#[case("")]
#[case("127.0.0.1")]
#[case("2001:00000::1")]
#[case("fe80::*")]
#[case("::/129")]
#[case("::/")]
#[case("1:2:3:4:5:6:7:8:9")]
#[case("fe80::g")]
fn ipv6_rejects(#[case] lexical: &str) {
    let err = AtomicType::IpV6Address.parse(lexical).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FORG0001, "{lexical}");
}

#[rstest]
fn ipv6_keeps_the_prefix_in_canonical_form() {
    let v = AtomicType::IpV6Address
        .parse("2001:0000:0000:0000:0000:ffff:0a02:0202")
        .unwrap();
    assert_eq!(v.to_string(), "2001::ffff:a02:202");
    assert_eq!(
        AtomicType::IpV6Address.parse("fe80:0::/10").unwrap().to_string(),
        "fe80::/10"
    );
}

#[rstest]
#[case(AtomicType::Integer, "+12", "12")]
#[case(AtomicType::Integer, "-0", "0")]
#[case(AtomicType::Decimal, "01.500", "1.5")]
#[case(AtomicType::Decimal, ".25", "0.25")]
#[case(AtomicType::Double, "1E2", "100")]
#[case(AtomicType::Double, "-INF", "-INF")]
#[case(AtomicType::Boolean, " true ", "true")]
#[case(AtomicType::Boolean, "0", "false")]
#[case(AtomicType::Token, "  id-1.a ", "id-1.a")]
#[case(AtomicType::Date, "2024-01-31-05:00", "2024-01-31-05:00")]
#[case(AtomicType::Date, "2024-01-31+00:00", "2024-01-31Z")]
#[case(AtomicType::Date, "10000-01-01", "10000-01-01")]
#[case(AtomicType::Date, "-0044-03-15", "-0044-03-15")]
#[case(AtomicType::DateTime, "2024-01-31T10:00:00.120", "2024-01-31T10:00:00.12")]
#[case(AtomicType::DateTime, "12024-06-30T23:59:59-14:00", "12024-06-30T23:59:59-14:00")]
#[case(AtomicType::DateTime, "2024-01-31T10:00:00-00:00", "2024-01-31T10:00:00Z")]
#[case(AtomicType::Double, "1e300", "1.0E300")]
#[case(AtomicType::Double, "0.0000001", "1.0E-7")]
#[case(AtomicType::Double, "-0", "-0")]
#[case(AtomicType::DateTimeWithTimezone, "2024-01-31T10:00:00Z", "2024-01-31T10:00:00Z")]
#[case(AtomicType::Base64Binary, "aGVs bG8=", "aGVsbG8=")]
#[case(AtomicType::IpV4Address, "10.0.0.1", "10.0.0.1")]
#[case(AtomicType::Uri, "https://example.com/a?b#c", "https://example.com/a?b#c")]
#[case(AtomicType::UriReference, "#fragment", "#fragment")]
#[case(AtomicType::Uuid, "6D7C0A5E-3B7F-4F3E-9C4B-2A1D8E0F9B11", "6d7c0a5e-3b7f-4f3e-9c4b-2a1d8e0f9b11")]
#[case(AtomicType::Empty, "", "")]
fn lexical_forms_and_canonical_output(
    #[case] ty: AtomicType,
    #[case] lexical: &str,
    #[case] canonical: &str,
) {
    let v = ty.parse(lexical).unwrap_or_else(|e| panic!("{ty} '{lexical}': {e}"));
    assert_eq!(v.atomic_type(), ty);
    assert_eq!(v.to_string(), canonical);
}

#[rstest]
#[case(AtomicType::Integer, "1.0")]
#[case(AtomicType::Integer, "99999999999999999999")]
#[case(AtomicType::Decimal, "1e3")]
#[case(AtomicType::Decimal, ".")]
#[case(AtomicType::Double, "1e")]
#[case(AtomicType::Boolean, "yes")]
#[case(AtomicType::Token, "has space")]
#[case(AtomicType::Date, "2024-1-31")]
#[case(AtomicType::Date, "2024-13-01")]
#[case(AtomicType::Date, "02024-01-01")]
#[case(AtomicType::Date, "999-01-01")]
#[case(AtomicType::Date, "2024-01-31+15:00")]
#[case(AtomicType::DateTime, "2024-01-31")]
#[case(AtomicType::DateTime, "2024-01-31T25:00:00")]
#[case(AtomicType::DateTimeWithTimezone, "2024-01-31T10:00:00")]
#[case(AtomicType::Base64Binary, "not base64!")]
#[case(AtomicType::IpV4Address, "256.0.0.1")]
#[case(AtomicType::Uri, "no-scheme")]
#[case(AtomicType::UriReference, "has space")]
#[case(AtomicType::Uuid, "6d7c0a5e3b7f4f3e9c4b2a1d8e0f9b11")]
#[case(AtomicType::MarkupLine, "line\r\nbreak")]
#[case(AtomicType::Empty, "x")]
fn invalid_lexical_forms(#[case] ty: AtomicType, #[case] lexical: &str) {
    match ty.parse(lexical) {
        Err(metapath::Error::Cast { target, .. }) => assert_eq!(target, ty),
        other => panic!("{ty} '{lexical}': expected a cast error, got {other:?}"),
    }
}

#[rstest]
fn string_and_markup_keep_whitespace() {
    assert_eq!(
        AtomicType::String.parse("  a  ").unwrap(),
        AtomicItem::String("  a  ".to_string())
    );
    assert_eq!(
        AtomicType::MarkupMultiline.parse("one\ntwo").unwrap().to_string(),
        "one\ntwo"
    );
}

#[rstest]
fn type_families() {
    assert!(AtomicType::PositiveInteger.is_numeric());
    assert!(AtomicType::PositiveInteger.is_integer());
    assert!(!AtomicType::Double.is_integer());
    assert!(AtomicType::Token.is_string_like());
    assert!(AtomicType::MarkupLine.is_string_like());
    assert!(!AtomicType::Uuid.is_numeric());
}
