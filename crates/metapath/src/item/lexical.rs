//! Lexical-space parsers and canonical formatters shared by the atomic types.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use core::fmt;
use ipnet::Ipv6Net;
use rust_decimal::Decimal;
use std::net::Ipv6Addr;
use std::str::FromStr;

pub(crate) fn parse_boolean(s: &str) -> Option<bool> {
    match s {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn strip_sign(s: &str) -> (&str, &str) {
    match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    }
}

pub(crate) fn parse_integer(s: &str) -> Option<i64> {
    let (sign, digits) = strip_sign(s);
    if !is_digits(digits) {
        return None;
    }
    format!("{sign}{digits}").parse().ok()
}

pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    let (sign, body) = strip_sign(s);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let int_ok = int_part.is_empty() || is_digits(int_part);
    let frac_ok = frac_part.is_empty() || is_digits(frac_part);
    if !int_ok || !frac_ok || (int_part.is_empty() && frac_part.is_empty()) {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let text = if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    };
    Decimal::from_str(&text).ok()
}

pub(crate) fn parse_double(s: &str) -> Option<f64> {
    match s {
        "NaN" => return Some(f64::NAN),
        "INF" | "+INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };
    parse_decimal(mantissa)?;
    if let Some(exp) = exponent {
        let (_, digits) = strip_sign(exp);
        if !is_digits(digits) {
            return None;
        }
    }
    s.parse().ok()
}

pub(crate) fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "INF" } else { "-INF" }.to_string()
    } else if v != 0.0 && !(1e-6..1e6).contains(&v.abs()) {
        let text = format!("{v:E}");
        match text.split_once('E') {
            Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
            _ => text,
        }
    } else {
        format!("{v}")
    }
}

/// Split a trailing `Z` or `±HH:MM` zone designator off a date/time lexical.
fn split_timezone(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(rest) = s.strip_suffix('Z') {
        return Some((rest, FixedOffset::east_opt(0)));
    }
    let bytes = s.as_bytes();
    if bytes.len() > 6 {
        let at = bytes.len() - 6;
        if matches!(bytes[at], b'+' | b'-') && bytes[at + 3] == b':' {
            let tz = parse_offset(&s[at..])?;
            return Some((&s[..at], Some(tz)));
        }
    }
    Some((s, None))
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let sign = if s.starts_with('-') { -1 } else { 1 };
    let hours = &s[1..3];
    let minutes = &s[4..6];
    if !is_digits(hours) || !is_digits(minutes) {
        return None;
    }
    let h: i32 = hours.parse().ok()?;
    let m: i32 = minutes.parse().ok()?;
    if m >= 60 || h > 14 || (h == 14 && m != 0) {
        return None;
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
}

/// `YYYY-MM-DD` with an optional `-` sign; years past four digits
/// must not start with zero.
fn parse_ymd(s: &str) -> Option<NaiveDate> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let mut parts = body.splitn(3, '-');
    let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let year_ok = y.len() >= 4 && is_digits(y) && (y.len() == 4 || !y.starts_with('0'));
    if !year_ok || m.len() != 2 || !is_digits(m) || d.len() != 2 || !is_digits(d) {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let year = if negative { -year } else { year };
    NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
}

fn parse_hms(s: &str) -> Option<NaiveTime> {
    let (hms, fraction) = match s.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };
    let hms_ok = hms.len() == 8
        && hms.split(':').count() == 3
        && hms.split(':').all(|p| p.len() == 2 && is_digits(p));
    if !hms_ok || fraction.is_some_and(|f| !is_digits(f)) {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()
}

pub(crate) fn parse_date(s: &str) -> Option<(NaiveDate, Option<FixedOffset>)> {
    let (body, tz) = split_timezone(s)?;
    Some((parse_ymd(body)?, tz))
}

pub(crate) fn parse_date_time(s: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    let (body, tz) = split_timezone(s)?;
    let (date_part, time_part) = body.split_once('T')?;
    let value = NaiveDateTime::new(parse_ymd(date_part)?, parse_hms(time_part)?);
    Some((value, tz))
}

/// Year padded to four digits, with a leading `-` before year one.
pub(crate) fn write_date(f: &mut fmt::Formatter<'_>, date: &NaiveDate) -> fmt::Result {
    let year = date.year();
    if year < 0 {
        f.write_str("-")?;
    }
    write!(f, "{:04}-{:02}-{:02}", year.unsigned_abs(), date.month(), date.day())
}

/// `Z` for UTC, otherwise the `±HH:MM` offset.
pub(crate) fn write_timezone(f: &mut fmt::Formatter<'_>, tz: Option<&FixedOffset>) -> fmt::Result {
    match tz {
        None => Ok(()),
        Some(tz) if tz.local_minus_utc() == 0 => f.write_str("Z"),
        Some(tz) => f.write_str(&format_offset(tz)),
    }
}

/// `±HH:MM`, with `+00:00` for UTC.
pub(crate) fn format_offset(tz: &FixedOffset) -> String {
    let secs = tz.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let mins = secs.unsigned_abs() / 60;
    format!("{sign}{:02}:{:02}", mins / 60, mins % 60)
}

pub(crate) fn parse_base64(s: &str) -> Option<Vec<u8>> {
    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}

pub(crate) fn format_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Parse an IPv6 address with an optional `/prefix`.
///
/// The address must be in colon notation; dotted IPv4-only forms, wildcard
/// groups and groups of more than four hex digits are rejected. A prefix
/// must be 0..=128.
pub(crate) fn parse_ipv6(s: &str) -> Option<(Ipv6Addr, Option<u8>)> {
    if s.is_empty() || !s.contains(':') || s.contains('*') {
        return None;
    }
    let (addr_text, prefix_text) = match s.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (s, None),
    };
    let addr = Ipv6Addr::from_str(addr_text).ok()?;
    let prefix = match prefix_text {
        None => None,
        Some(p) => {
            if !is_digits(p) || p.len() > 3 {
                return None;
            }
            let len: u8 = p.parse().ok()?;
            Ipv6Net::new(addr, len).ok()?;
            Some(len)
        }
    };
    Some((addr, prefix))
}

pub(crate) fn parse_uuid(s: &str) -> Option<uuid::Uuid> {
    if s.len() != 36 {
        return None;
    }
    uuid::Uuid::parse_str(s).ok()
}

pub(crate) fn is_absolute_uri(s: &str) -> bool {
    !s.is_empty() && !s.contains(char::is_whitespace) && url::Url::parse(s).is_ok()
}

pub(crate) fn is_uri_reference(s: &str) -> bool {
    if s.contains(char::is_whitespace) {
        return false;
    }
    if url::Url::parse(s).is_ok() {
        return true;
    }
    url::Url::parse("http://base.invalid/").is_ok_and(|base| base.join(s).is_ok())
}

/// A token starts with a letter or `_` and continues with letters, digits,
/// `.`, `-` or `_`.
pub(crate) fn is_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
