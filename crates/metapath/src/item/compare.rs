//! Value comparison of atomic items.
//!
//! Both operands are promoted to a shared supertype before comparing:
//! integer -> decimal -> double for numbers, string for the string-like
//! family, and an instant on the UTC timeline for dates and date-times (a
//! missing zone is filled in from the implicit timezone). Types from
//! unrelated families cannot be compared.

use super::atomic::{AtomicItem, AtomicType};
use crate::engine::error::Error;
use chrono::{FixedOffset, NaiveDateTime};
use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    fn is_equality(self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }

    fn holds(self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (ComparisonOp::Ne, None) => true,
            (_, None) => false,
            (ComparisonOp::Eq, Some(o)) => o == Ordering::Equal,
            (ComparisonOp::Ne, Some(o)) => o != Ordering::Equal,
            (ComparisonOp::Lt, Some(o)) => o == Ordering::Less,
            (ComparisonOp::Le, Some(o)) => o != Ordering::Greater,
            (ComparisonOp::Gt, Some(o)) => o == Ordering::Greater,
            (ComparisonOp::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

/// Families whose members only support `eq`/`ne`.
fn equality_only(t: AtomicType) -> bool {
    matches!(t, AtomicType::Base64Binary | AtomicType::Empty)
}

/// Compare two atomic items under `op`.
pub fn compare_atomic(
    left: &AtomicItem,
    op: ComparisonOp,
    right: &AtomicItem,
    implicit_tz: FixedOffset,
) -> Result<bool, Error> {
    if !op.is_equality()
        && (equality_only(left.atomic_type()) || equality_only(right.atomic_type()))
    {
        return Err(incomparable(left, right));
    }
    let ord = atomic_order(left, right, implicit_tz)?;
    Ok(op.holds(ord))
}

/// Equality used by `distinct-values`: incomparable pairs are unequal and
/// NaN equals NaN.
pub fn atomic_equal(left: &AtomicItem, right: &AtomicItem, implicit_tz: FixedOffset) -> bool {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64())
        && a.is_nan()
        && b.is_nan()
    {
        return true;
    }
    matches!(
        atomic_order(left, right, implicit_tz),
        Ok(Some(Ordering::Equal))
    )
}

/// Ordering after promotion; `Ok(None)` when the values are unordered (NaN).
pub fn atomic_order(
    left: &AtomicItem,
    right: &AtomicItem,
    implicit_tz: FixedOffset,
) -> Result<Option<Ordering>, Error> {
    use AtomicItem as A;
    let lt = left.atomic_type();
    let rt = right.atomic_type();

    if lt.is_numeric() && rt.is_numeric() {
        return Ok(numeric_order(left, right));
    }
    if is_string_promotable(lt, rt) {
        return Ok(Some(left.to_string().cmp(&right.to_string())));
    }
    let ord = match (left, right) {
        (A::Boolean(a), A::Boolean(b)) => a.cmp(b),
        (A::IpV4Address(a), A::IpV4Address(b)) => a.cmp(b),
        (A::IpV6Address { addr: a, prefix: pa }, A::IpV6Address { addr: b, prefix: pb }) => {
            a.cmp(b).then(pa.cmp(pb))
        }
        (A::Base64Binary(a), A::Base64Binary(b)) => a.cmp(b),
        (A::Empty, A::Empty) => Ordering::Equal,
        (
            A::Date { .. } | A::DateWithTimezone { .. },
            A::Date { .. } | A::DateWithTimezone { .. },
        )
        | (
            A::DateTime { .. } | A::DateTimeWithTimezone { .. },
            A::DateTime { .. } | A::DateTimeWithTimezone { .. },
        ) => match (instant(left, implicit_tz), instant(right, implicit_tz)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => return Err(incomparable(left, right)),
        },
        _ => return Err(incomparable(left, right)),
    };
    Ok(Some(ord))
}

/// String-like values compare with each other; IP addresses compare with
/// plain strings and tokens through their canonical form.
fn is_string_promotable(lt: AtomicType, rt: AtomicType) -> bool {
    let plain = |t: AtomicType| matches!(t, AtomicType::String | AtomicType::Token);
    let ip = |t: AtomicType| matches!(t, AtomicType::IpV4Address | AtomicType::IpV6Address);
    (lt.is_string_like() && rt.is_string_like())
        || (plain(lt) && ip(rt))
        || (ip(lt) && plain(rt))
}

fn numeric_order(left: &AtomicItem, right: &AtomicItem) -> Option<Ordering> {
    match (left, right) {
        (AtomicItem::Double(_), _) | (_, AtomicItem::Double(_)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (AtomicItem::Decimal(_), _) | (_, AtomicItem::Decimal(_)) => {
            Some(left.as_decimal()?.cmp(&right.as_decimal()?))
        }
        _ => Some(left.as_i64()?.cmp(&right.as_i64()?)),
    }
}

/// UTC instant of a date or date-time, using `implicit_tz` when unzoned.
fn instant(item: &AtomicItem, implicit_tz: FixedOffset) -> Option<NaiveDateTime> {
    let (date, time, tz) = item.temporal_parts()?;
    let offset = tz.unwrap_or(implicit_tz);
    let local = date.and_time(time);
    local.checked_sub_signed(chrono::TimeDelta::seconds(i64::from(offset.local_minus_utc())))
}

fn incomparable(left: &AtomicItem, right: &AtomicItem) -> Error {
    Error::type_mismatch(
        format!("a value comparable with {}", left.atomic_type()),
        right.atomic_type().name(),
    )
}
