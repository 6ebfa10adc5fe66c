//! Casting between atomic types.
//!
//! Rules:
//! - identity casts always succeed;
//! - every type casts to `string` (its canonical lexical form);
//! - `string` and `token` cast to any type whose lexical space accepts the text;
//! - the numeric family casts within itself, integer to decimal/double is
//!   lossless and decimal/double to an integer type truncates toward zero;
//! - numeric and boolean cast both ways;
//! - dates and date-times convert between each other, a `*-with-timezone`
//!   target needs a zone on the source;
//! - `uri` widens to `uri-reference`, the reverse needs an absolute reference.
//!
//! A lexical or range failure is [`Error::Cast`]; a pair outside these rules
//! is a type error.

use super::atomic::{AtomicItem, AtomicType};
use super::lexical;
use crate::engine::error::{Error, ErrorCode};
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

impl AtomicItem {
    pub fn cast_to(&self, target: AtomicType) -> Result<AtomicItem, Error> {
        let source = self.atomic_type();
        if source == target {
            return Ok(self.clone());
        }
        if target == AtomicType::String {
            return Ok(AtomicItem::String(self.to_string()));
        }
        match self {
            AtomicItem::String(s) | AtomicItem::Token(s) => return target.parse(s),
            _ if source.is_numeric() && target.is_numeric() => return self.cast_numeric(target),
            _ if source.is_numeric() && target == AtomicType::Boolean => {
                return Ok(AtomicItem::Boolean(
                    self.effective_boolean_value().unwrap_or(false),
                ));
            }
            AtomicItem::Boolean(b) if target.is_numeric() => {
                return AtomicItem::Integer(i64::from(*b)).cast_numeric(target);
            }
            AtomicItem::Uri(s) if target == AtomicType::UriReference => {
                return Ok(AtomicItem::UriReference(s.clone()));
            }
            AtomicItem::UriReference(s) if target == AtomicType::Uri => {
                return if lexical::is_absolute_uri(s) {
                    Ok(AtomicItem::Uri(s.clone()))
                } else {
                    Err(Error::cast(s.as_str(), target))
                };
            }
            _ => {}
        }
        if let Some((date, time, tz)) = self.temporal_parts() {
            return self.cast_temporal(date, time, tz, target);
        }
        Err(Error::Type {
            expected: format!("a type castable to {target}"),
            found: source.name().to_string(),
            code: ErrorCode::XPTY0004,
        })
    }

    /// Whether [`cast_to`](Self::cast_to) would succeed.
    pub fn castable_to(&self, target: AtomicType) -> bool {
        self.cast_to(target).is_ok()
    }

    fn cast_numeric(&self, target: AtomicType) -> Result<AtomicItem, Error> {
        let fail = || Error::cast(self.to_string(), target);
        match target {
            AtomicType::Double => self.as_f64().map(AtomicItem::Double).ok_or_else(fail),
            AtomicType::Decimal => match self {
                AtomicItem::Double(v) => Decimal::from_f64(*v)
                    .map(AtomicItem::Decimal)
                    .ok_or_else(fail),
                other => other.as_decimal().map(AtomicItem::Decimal).ok_or_else(fail),
            },
            AtomicType::Integer | AtomicType::NonNegativeInteger | AtomicType::PositiveInteger => {
                let v = match self {
                    AtomicItem::Double(v) => {
                        if !v.is_finite() {
                            return Err(fail());
                        }
                        let truncated = v.trunc();
                        if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                            return Err(fail());
                        }
                        truncated as i64
                    }
                    AtomicItem::Decimal(d) => d.trunc().to_i64().ok_or_else(fail)?,
                    other => other.as_i64().ok_or_else(fail)?,
                };
                match target {
                    AtomicType::NonNegativeInteger if v >= 0 => {
                        Ok(AtomicItem::NonNegativeInteger(v))
                    }
                    AtomicType::PositiveInteger if v >= 1 => Ok(AtomicItem::PositiveInteger(v)),
                    AtomicType::Integer => Ok(AtomicItem::Integer(v)),
                    _ => Err(fail()),
                }
            }
            _ => Err(fail()),
        }
    }

    /// Date, time-of-day and zone of any date or date-time item.
    pub(crate) fn temporal_parts(&self) -> Option<(NaiveDate, NaiveTime, Option<FixedOffset>)> {
        match self {
            AtomicItem::Date { date, tz } => Some((*date, NaiveTime::MIN, *tz)),
            AtomicItem::DateWithTimezone { date, tz } => Some((*date, NaiveTime::MIN, Some(*tz))),
            AtomicItem::DateTime { value, tz } => Some((value.date(), value.time(), *tz)),
            AtomicItem::DateTimeWithTimezone { value, tz } => {
                Some((value.date(), value.time(), Some(*tz)))
            }
            _ => None,
        }
    }

    fn cast_temporal(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        tz: Option<FixedOffset>,
        target: AtomicType,
    ) -> Result<AtomicItem, Error> {
        let missing_zone = || Error::cast(self.to_string(), target);
        match target {
            AtomicType::Date => Ok(AtomicItem::Date { date, tz }),
            AtomicType::DateWithTimezone => Ok(AtomicItem::DateWithTimezone {
                date,
                tz: tz.ok_or_else(missing_zone)?,
            }),
            AtomicType::DateTime => Ok(AtomicItem::DateTime {
                value: date.and_time(time),
                tz,
            }),
            AtomicType::DateTimeWithTimezone => Ok(AtomicItem::DateTimeWithTimezone {
                value: date.and_time(time),
                tz: tz.ok_or_else(missing_zone)?,
            }),
            _ => Err(Error::Type {
                expected: format!("a type castable to {target}"),
                found: self.atomic_type().name().to_string(),
                code: ErrorCode::XPTY0004,
            }),
        }
    }
}
