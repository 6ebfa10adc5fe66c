//! Atomic item types and values.
//!
//! The set of types is closed: every value is one [`AtomicItem`] variant and
//! every variant names exactly one [`AtomicType`]. Lexical parsing lives in
//! [`AtomicType::parse`], canonical formatting in the `Display` impl of
//! [`AtomicItem`].

use super::lexical;
use crate::engine::error::Error;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use core::fmt;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomicType {
    String,
    Token,
    Boolean,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Double,
    Date,
    DateWithTimezone,
    DateTime,
    DateTimeWithTimezone,
    Base64Binary,
    IpV4Address,
    IpV6Address,
    Uri,
    UriReference,
    Uuid,
    MarkupLine,
    MarkupMultiline,
    Empty,
}

impl AtomicType {
    pub const ALL: [AtomicType; 21] = [
        AtomicType::String,
        AtomicType::Token,
        AtomicType::Boolean,
        AtomicType::Integer,
        AtomicType::NonNegativeInteger,
        AtomicType::PositiveInteger,
        AtomicType::Decimal,
        AtomicType::Double,
        AtomicType::Date,
        AtomicType::DateWithTimezone,
        AtomicType::DateTime,
        AtomicType::DateTimeWithTimezone,
        AtomicType::Base64Binary,
        AtomicType::IpV4Address,
        AtomicType::IpV6Address,
        AtomicType::Uri,
        AtomicType::UriReference,
        AtomicType::Uuid,
        AtomicType::MarkupLine,
        AtomicType::MarkupMultiline,
        AtomicType::Empty,
    ];

    /// Lexical type name, also the local name of the constructor function.
    pub fn name(&self) -> &'static str {
        match self {
            AtomicType::String => "string",
            AtomicType::Token => "token",
            AtomicType::Boolean => "boolean",
            AtomicType::Integer => "integer",
            AtomicType::NonNegativeInteger => "non-negative-integer",
            AtomicType::PositiveInteger => "positive-integer",
            AtomicType::Decimal => "decimal",
            AtomicType::Double => "double",
            AtomicType::Date => "date",
            AtomicType::DateWithTimezone => "date-with-timezone",
            AtomicType::DateTime => "date-time",
            AtomicType::DateTimeWithTimezone => "date-time-with-timezone",
            AtomicType::Base64Binary => "base64",
            AtomicType::IpV4Address => "ip-v4-address",
            AtomicType::IpV6Address => "ip-v6-address",
            AtomicType::Uri => "uri",
            AtomicType::UriReference => "uri-reference",
            AtomicType::Uuid => "uuid",
            AtomicType::MarkupLine => "markup-line",
            AtomicType::MarkupMultiline => "markup-multiline",
            AtomicType::Empty => "empty",
        }
    }

    pub fn from_name(name: &str) -> Option<AtomicType> {
        AtomicType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicType::Integer
                | AtomicType::NonNegativeInteger
                | AtomicType::PositiveInteger
                | AtomicType::Decimal
                | AtomicType::Double
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            AtomicType::Integer | AtomicType::NonNegativeInteger | AtomicType::PositiveInteger
        )
    }

    /// Types compared and promoted as plain strings.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            AtomicType::String
                | AtomicType::Token
                | AtomicType::Uri
                | AtomicType::UriReference
                | AtomicType::Uuid
                | AtomicType::MarkupLine
                | AtomicType::MarkupMultiline
        )
    }

    /// Parse a lexical form into a value of this type.
    ///
    /// A lexically invalid input yields [`Error::Cast`] naming this type.
    pub fn parse(&self, lexical: &str) -> Result<AtomicItem, Error> {
        let fail = || Error::cast(lexical, *self);
        let collapsed = lexical.trim();
        Ok(match self {
            AtomicType::String => AtomicItem::String(lexical.to_string()),
            AtomicType::Token => {
                if !lexical::is_token(collapsed) {
                    return Err(fail());
                }
                AtomicItem::Token(collapsed.to_string())
            }
            AtomicType::Boolean => AtomicItem::Boolean(lexical::parse_boolean(collapsed).ok_or_else(fail)?),
            AtomicType::Integer => AtomicItem::Integer(lexical::parse_integer(collapsed).ok_or_else(fail)?),
            AtomicType::NonNegativeInteger => {
                let v = lexical::parse_integer(collapsed).ok_or_else(fail)?;
                if v < 0 {
                    return Err(fail());
                }
                AtomicItem::NonNegativeInteger(v)
            }
            AtomicType::PositiveInteger => {
                let v = lexical::parse_integer(collapsed).ok_or_else(fail)?;
                if v < 1 {
                    return Err(fail());
                }
                AtomicItem::PositiveInteger(v)
            }
            AtomicType::Decimal => AtomicItem::Decimal(lexical::parse_decimal(collapsed).ok_or_else(fail)?),
            AtomicType::Double => AtomicItem::Double(lexical::parse_double(collapsed).ok_or_else(fail)?),
            AtomicType::Date => {
                let (date, tz) = lexical::parse_date(collapsed).ok_or_else(fail)?;
                AtomicItem::Date { date, tz }
            }
            AtomicType::DateWithTimezone => match lexical::parse_date(collapsed) {
                Some((date, Some(tz))) => AtomicItem::DateWithTimezone { date, tz },
                _ => return Err(fail()),
            },
            AtomicType::DateTime => {
                let (value, tz) = lexical::parse_date_time(collapsed).ok_or_else(fail)?;
                AtomicItem::DateTime { value, tz }
            }
            AtomicType::DateTimeWithTimezone => match lexical::parse_date_time(collapsed) {
                Some((value, Some(tz))) => AtomicItem::DateTimeWithTimezone { value, tz },
                _ => return Err(fail()),
            },
            AtomicType::Base64Binary => AtomicItem::Base64Binary(lexical::parse_base64(collapsed).ok_or_else(fail)?),
            AtomicType::IpV4Address => AtomicItem::IpV4Address(collapsed.parse().map_err(|_| fail())?),
            AtomicType::IpV6Address => {
                let (addr, prefix) = lexical::parse_ipv6(collapsed).ok_or_else(fail)?;
                AtomicItem::IpV6Address { addr, prefix }
            }
            AtomicType::Uri => {
                if !lexical::is_absolute_uri(collapsed) {
                    return Err(fail());
                }
                AtomicItem::Uri(collapsed.to_string())
            }
            AtomicType::UriReference => {
                if !lexical::is_uri_reference(collapsed) {
                    return Err(fail());
                }
                AtomicItem::UriReference(collapsed.to_string())
            }
            AtomicType::Uuid => AtomicItem::Uuid(lexical::parse_uuid(collapsed).ok_or_else(fail)?),
            AtomicType::MarkupLine => {
                if lexical.contains(['\n', '\r']) {
                    return Err(fail());
                }
                AtomicItem::MarkupLine(lexical.to_string())
            }
            AtomicType::MarkupMultiline => AtomicItem::MarkupMultiline(lexical.to_string()),
            AtomicType::Empty => {
                if !collapsed.is_empty() {
                    return Err(fail());
                }
                AtomicItem::Empty
            }
        })
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicItem {
    String(String),
    Token(String),
    Boolean(bool),
    Integer(i64),
    NonNegativeInteger(i64),
    PositiveInteger(i64),
    Decimal(Decimal),
    Double(f64),
    Date {
        date: NaiveDate,
        tz: Option<FixedOffset>,
    },
    DateWithTimezone {
        date: NaiveDate,
        tz: FixedOffset,
    },
    DateTime {
        value: NaiveDateTime,
        tz: Option<FixedOffset>,
    },
    DateTimeWithTimezone {
        value: NaiveDateTime,
        tz: FixedOffset,
    },
    /// Decoded octets.
    Base64Binary(Vec<u8>),
    IpV4Address(Ipv4Addr),
    IpV6Address {
        addr: Ipv6Addr,
        prefix: Option<u8>,
    },
    Uri(String),
    UriReference(String),
    Uuid(uuid::Uuid),
    MarkupLine(String),
    MarkupMultiline(String),
    Empty,
}

impl AtomicItem {
    pub fn string(s: impl Into<String>) -> Self {
        AtomicItem::String(s.into())
    }

    pub fn atomic_type(&self) -> AtomicType {
        match self {
            AtomicItem::String(_) => AtomicType::String,
            AtomicItem::Token(_) => AtomicType::Token,
            AtomicItem::Boolean(_) => AtomicType::Boolean,
            AtomicItem::Integer(_) => AtomicType::Integer,
            AtomicItem::NonNegativeInteger(_) => AtomicType::NonNegativeInteger,
            AtomicItem::PositiveInteger(_) => AtomicType::PositiveInteger,
            AtomicItem::Decimal(_) => AtomicType::Decimal,
            AtomicItem::Double(_) => AtomicType::Double,
            AtomicItem::Date { .. } => AtomicType::Date,
            AtomicItem::DateWithTimezone { .. } => AtomicType::DateWithTimezone,
            AtomicItem::DateTime { .. } => AtomicType::DateTime,
            AtomicItem::DateTimeWithTimezone { .. } => AtomicType::DateTimeWithTimezone,
            AtomicItem::Base64Binary(_) => AtomicType::Base64Binary,
            AtomicItem::IpV4Address(_) => AtomicType::IpV4Address,
            AtomicItem::IpV6Address { .. } => AtomicType::IpV6Address,
            AtomicItem::Uri(_) => AtomicType::Uri,
            AtomicItem::UriReference(_) => AtomicType::UriReference,
            AtomicItem::Uuid(_) => AtomicType::Uuid,
            AtomicItem::MarkupLine(_) => AtomicType::MarkupLine,
            AtomicItem::MarkupMultiline(_) => AtomicType::MarkupMultiline,
            AtomicItem::Empty => AtomicType::Empty,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.atomic_type().is_numeric()
    }

    /// Integer payload of any integer-family value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AtomicItem::Integer(v)
            | AtomicItem::NonNegativeInteger(v)
            | AtomicItem::PositiveInteger(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a double; `None` for non-numeric items.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AtomicItem::Double(v) => Some(*v),
            AtomicItem::Decimal(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Numeric value as a decimal; `None` for doubles and non-numeric items.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AtomicItem::Decimal(d) => Some(*d),
            other => other.as_i64().map(Decimal::from),
        }
    }

    /// Text payload of string-like items.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AtomicItem::String(s)
            | AtomicItem::Token(s)
            | AtomicItem::Uri(s)
            | AtomicItem::UriReference(s)
            | AtomicItem::MarkupLine(s)
            | AtomicItem::MarkupMultiline(s) => Some(s),
            _ => None,
        }
    }

    /// Effective boolean value of a single atomic item, if it has one.
    pub fn effective_boolean_value(&self) -> Option<bool> {
        match self {
            AtomicItem::Boolean(b) => Some(*b),
            AtomicItem::Double(v) => Some(!v.is_nan() && *v != 0.0),
            AtomicItem::Decimal(d) => Some(!d.is_zero()),
            AtomicItem::Uuid(_) => Some(true),
            other => other
                .as_i64()
                .map(|v| v != 0)
                .or_else(|| other.as_str().map(|s| !s.is_empty())),
        }
    }
}

impl fmt::Display for AtomicItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicItem::String(s)
            | AtomicItem::Token(s)
            | AtomicItem::Uri(s)
            | AtomicItem::UriReference(s)
            | AtomicItem::MarkupLine(s)
            | AtomicItem::MarkupMultiline(s) => f.write_str(s),
            AtomicItem::Boolean(b) => write!(f, "{b}"),
            AtomicItem::Integer(v)
            | AtomicItem::NonNegativeInteger(v)
            | AtomicItem::PositiveInteger(v) => write!(f, "{v}"),
            AtomicItem::Decimal(d) => write!(f, "{}", d.normalize()),
            AtomicItem::Double(v) => f.write_str(&lexical::format_double(*v)),
            AtomicItem::Date { date, tz } => {
                lexical::write_date(f, date)?;
                lexical::write_timezone(f, tz.as_ref())
            }
            AtomicItem::DateWithTimezone { date, tz } => {
                lexical::write_date(f, date)?;
                lexical::write_timezone(f, Some(tz))
            }
            AtomicItem::DateTime { value, tz } => {
                write_date_time(f, value)?;
                lexical::write_timezone(f, tz.as_ref())
            }
            AtomicItem::DateTimeWithTimezone { value, tz } => {
                write_date_time(f, value)?;
                lexical::write_timezone(f, Some(tz))
            }
            AtomicItem::Base64Binary(bytes) => f.write_str(&lexical::format_base64(bytes)),
            AtomicItem::IpV4Address(addr) => write!(f, "{addr}"),
            AtomicItem::IpV6Address { addr, prefix } => match prefix {
                Some(p) => write!(f, "{addr}/{p}"),
                None => write!(f, "{addr}"),
            },
            AtomicItem::Uuid(u) => write!(f, "{}", u.hyphenated()),
            AtomicItem::Empty => Ok(()),
        }
    }
}

fn write_date_time(f: &mut fmt::Formatter<'_>, value: &NaiveDateTime) -> fmt::Result {
    lexical::write_date(f, &value.date())?;
    write!(f, "{}", value.format("T%H:%M:%S"))?;
    let nanos = value.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        write!(f, ".{}", fraction.trim_end_matches('0'))?;
    }
    Ok(())
}
