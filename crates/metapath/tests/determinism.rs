use chrono::{DateTime, FixedOffset, TimeZone};
use metapath::model::simple::SimpleNode;
use metapath::{AtomicType, DynamicContext, DynamicContextBuilder, compile_default, evaluate};
use rstest::rstest;

fn fixed_now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 9, 30, 0)
        .unwrap()
}

fn strings(expr: &str, ctx: &DynamicContext<SimpleNode>) -> Vec<String> {
    let compiled = compile_default(expr).unwrap();
    evaluate(&compiled, ctx)
        .unwrap()
        .atomize()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[rstest]
fn fixed_moment_drives_the_clock_functions() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new()
        .with_now(fixed_now())
        .build();
    assert_eq!(strings("current-dateTime()", &ctx), ["2024-05-17T09:30:00+02:00"]);
    assert_eq!(strings("current-date()", &ctx), ["2024-05-17+02:00"]);
    assert_eq!(strings("implicit-timezone()", &ctx), ["+02:00"]);
}

#[rstest]
fn clock_functions_are_typed() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new()
        .with_now(fixed_now())
        .build();
    let compiled = compile_default("(current-dateTime(), current-date())").unwrap();
    let out = evaluate(&compiled, &ctx).unwrap().atomize().unwrap();
    assert_eq!(out[0].atomic_type(), AtomicType::DateTimeWithTimezone);
    assert_eq!(out[1].atomic_type(), AtomicType::DateWithTimezone);
}

#[rstest]
fn one_evaluation_sees_one_instant() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new().build();
    let out = strings(
        "let $a := current-dateTime() return (for $i in 1 to 50 return current-dateTime() = $a)",
        &ctx,
    );
    assert_eq!(out.len(), 50);
    assert!(out.iter().all(|s| s == "true"));
}

#[rstest]
fn the_same_context_gives_the_same_answer() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new().build();
    let first = strings("current-dateTime()", &ctx);
    let second = strings("current-dateTime()", &ctx);
    assert_eq!(first, second);
}

#[rstest]
fn implicit_timezone_shifts_the_fixed_moment() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new()
        .with_now(fixed_now())
        .with_implicit_timezone(FixedOffset::west_opt(5 * 3600).unwrap())
        .build();
    assert_eq!(strings("implicit-timezone()", &ctx), ["-05:00"]);
    assert_eq!(strings("current-dateTime()", &ctx), ["2024-05-17T02:30:00-05:00"]);
    assert_eq!(strings("current-date()", &ctx), ["2024-05-17-05:00"]);
}

#[rstest]
fn utc_is_written_as_z() {
    let ctx = DynamicContextBuilder::<SimpleNode>::new()
        .with_now(fixed_now())
        .with_implicit_timezone(FixedOffset::east_opt(0).unwrap())
        .build();
    assert_eq!(strings("current-dateTime()", &ctx), ["2024-05-17T07:30:00Z"]);
    assert_eq!(strings("implicit-timezone()", &ctx), ["+00:00"]);
}
