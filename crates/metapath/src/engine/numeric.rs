//! Arithmetic over the numeric lattice integer -> decimal -> double.
//!
//! Integer and decimal arithmetic is checked: overflow raises
//! `err:FOAR0002` and division by zero `err:FOAR0001`. Double arithmetic
//! follows IEEE 754 except for `idiv`, whose result must be an integer.

use crate::engine::error::{Error, ErrorCode};
use crate::item::AtomicItem;
use crate::parser::ast::BinaryOp;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operands {
    Integer(i64, i64),
    Decimal(Decimal, Decimal),
    Double(f64, f64),
}

fn overflow() -> Error {
    Error::dynamic(ErrorCode::FOAR0002, "numeric overflow")
}

fn division_by_zero() -> Error {
    Error::dynamic(ErrorCode::FOAR0001, "division by zero")
}

fn classify(op: BinaryOp, left: &AtomicItem, right: &AtomicItem) -> Result<Operands, Error> {
    let mismatch = |a: &AtomicItem| {
        Error::type_mismatch(
            format!("numeric operands for {op:?}"),
            a.atomic_type().name(),
        )
    };
    if !left.is_numeric() {
        return Err(mismatch(left));
    }
    if !right.is_numeric() {
        return Err(mismatch(right));
    }
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return Ok(Operands::Integer(a, b));
    }
    if let (Some(a), Some(b)) = (left.as_decimal(), right.as_decimal()) {
        return Ok(Operands::Decimal(a, b));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Operands::Double(a, b)),
        _ => Err(overflow()),
    }
}

/// Apply an arithmetic operator to two numeric atomic values.
pub fn arithmetic(op: BinaryOp, left: &AtomicItem, right: &AtomicItem) -> Result<AtomicItem, Error> {
    let operands = classify(op, left, right)?;
    match (op, operands) {
        (BinaryOp::Add, Operands::Integer(a, b)) => {
            a.checked_add(b).map(AtomicItem::Integer).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Operands::Integer(a, b)) => {
            a.checked_sub(b).map(AtomicItem::Integer).ok_or_else(overflow)
        }
        (BinaryOp::Mul, Operands::Integer(a, b)) => {
            a.checked_mul(b).map(AtomicItem::Integer).ok_or_else(overflow)
        }
        (BinaryOp::Div, Operands::Integer(a, b)) => {
            decimal_div(Decimal::from(a), Decimal::from(b)).map(AtomicItem::Decimal)
        }
        (BinaryOp::IDiv, Operands::Integer(a, b)) => {
            if b == 0 {
                return Err(division_by_zero());
            }
            a.checked_div(b).map(AtomicItem::Integer).ok_or_else(overflow)
        }
        (BinaryOp::Mod, Operands::Integer(a, b)) => {
            if b == 0 {
                return Err(division_by_zero());
            }
            a.checked_rem(b).map(AtomicItem::Integer).ok_or_else(overflow)
        }

        (BinaryOp::Add, Operands::Decimal(a, b)) => {
            a.checked_add(b).map(AtomicItem::Decimal).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Operands::Decimal(a, b)) => {
            a.checked_sub(b).map(AtomicItem::Decimal).ok_or_else(overflow)
        }
        (BinaryOp::Mul, Operands::Decimal(a, b)) => {
            a.checked_mul(b).map(AtomicItem::Decimal).ok_or_else(overflow)
        }
        (BinaryOp::Div, Operands::Decimal(a, b)) => decimal_div(a, b).map(AtomicItem::Decimal),
        (BinaryOp::IDiv, Operands::Decimal(a, b)) => {
            let q = decimal_div(a, b)?;
            q.trunc().to_i64().map(AtomicItem::Integer).ok_or_else(overflow)
        }
        (BinaryOp::Mod, Operands::Decimal(a, b)) => {
            if b.is_zero() {
                return Err(division_by_zero());
            }
            a.checked_rem(b).map(AtomicItem::Decimal).ok_or_else(overflow)
        }

        (BinaryOp::Add, Operands::Double(a, b)) => Ok(AtomicItem::Double(a + b)),
        (BinaryOp::Sub, Operands::Double(a, b)) => Ok(AtomicItem::Double(a - b)),
        (BinaryOp::Mul, Operands::Double(a, b)) => Ok(AtomicItem::Double(a * b)),
        (BinaryOp::Div, Operands::Double(a, b)) => Ok(AtomicItem::Double(a / b)),
        (BinaryOp::IDiv, Operands::Double(a, b)) => {
            if b == 0.0 {
                return Err(division_by_zero());
            }
            let q = (a / b).trunc();
            if !q.is_finite() || q < i64::MIN as f64 || q > i64::MAX as f64 {
                return Err(overflow());
            }
            Ok(AtomicItem::Integer(q as i64))
        }
        (BinaryOp::Mod, Operands::Double(a, b)) => Ok(AtomicItem::Double(a % b)),

        (BinaryOp::And | BinaryOp::Or, _) => Err(Error::type_mismatch(
            "an arithmetic operator",
            format!("{op:?}"),
        )),
    }
}

fn decimal_div(a: Decimal, b: Decimal) -> Result<Decimal, Error> {
    if b.is_zero() {
        return Err(division_by_zero());
    }
    a.checked_div(b).map(|d| d.normalize()).ok_or_else(overflow)
}

/// Unary minus.
pub fn negate(value: &AtomicItem) -> Result<AtomicItem, Error> {
    match value {
        AtomicItem::Double(v) => Ok(AtomicItem::Double(-v)),
        AtomicItem::Decimal(d) => Ok(AtomicItem::Decimal(-*d)),
        other => match other.as_i64() {
            Some(v) => v.checked_neg().map(AtomicItem::Integer).ok_or_else(overflow),
            None => Err(Error::type_mismatch(
                "a numeric operand for unary minus",
                other.atomic_type().name(),
            )),
        },
    }
}

/// Unary plus: checks the operand is numeric.
pub fn identity(value: &AtomicItem) -> Result<AtomicItem, Error> {
    if value.is_numeric() {
        Ok(value.clone())
    } else {
        Err(Error::type_mismatch(
            "a numeric operand for unary plus",
            value.atomic_type().name(),
        ))
    }
}

pub fn abs(value: &AtomicItem) -> Result<AtomicItem, Error> {
    match value {
        AtomicItem::Double(v) => Ok(AtomicItem::Double(v.abs())),
        AtomicItem::Decimal(d) => Ok(AtomicItem::Decimal(d.abs())),
        other => match other.as_i64() {
            Some(v) => v.checked_abs().map(AtomicItem::Integer).ok_or_else(overflow),
            None => Err(Error::type_mismatch("numeric", other.atomic_type().name())),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Ceiling,
    Floor,
    /// Half values round towards positive infinity.
    Round,
}

/// Nearest integer, exact halves towards positive infinity. Keeps the sign
/// of zero, so `-0.5` gives `-0`.
pub(crate) fn round_half_up(v: f64) -> f64 {
    if v - v.floor() == 0.5 { v.ceil() } else { v.round() }
}

/// Round a numeric value; integers are returned unchanged.
pub fn round(value: &AtomicItem, mode: Rounding) -> Result<AtomicItem, Error> {
    match value {
        AtomicItem::Double(v) => Ok(AtomicItem::Double(match mode {
            Rounding::Ceiling => v.ceil(),
            Rounding::Floor => v.floor(),
            Rounding::Round => round_half_up(*v),
        })),
        AtomicItem::Decimal(d) => {
            let r = match mode {
                Rounding::Ceiling => d.ceil(),
                Rounding::Floor => d.floor(),
                Rounding::Round => d
                    .checked_add(Decimal::new(5, 1))
                    .ok_or_else(overflow)?
                    .floor(),
            };
            Ok(AtomicItem::Decimal(r.normalize()))
        }
        other if other.as_i64().is_some() => Ok(other.clone()),
        other => Err(Error::type_mismatch("numeric", other.atomic_type().name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_yields_decimal() {
        let r = arithmetic(BinaryOp::Div, &AtomicItem::Integer(7), &AtomicItem::Integer(2)).unwrap();
        assert_eq!(r, AtomicItem::Decimal(Decimal::new(35, 1)));
    }

    #[test]
    fn integer_overflow_is_reported() {
        let err = arithmetic(BinaryOp::Add, &AtomicItem::Integer(i64::MAX), &AtomicItem::Integer(1))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FOAR0002);
    }

    #[test]
    fn mixed_operands_promote_to_double() {
        let r = arithmetic(BinaryOp::Mul, &AtomicItem::Integer(2), &AtomicItem::Double(1.5)).unwrap();
        assert_eq!(r, AtomicItem::Double(3.0));
    }

    #[test]
    fn double_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(0.499_999_999_999_999_94), 0.0);
        assert!(round_half_up(-0.5).is_sign_negative());
        assert!(round_half_up(-0.2).is_sign_negative());
        assert!(round_half_up(f64::NAN).is_nan());
        assert_eq!(round_half_up(f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn decimal_round_half_up() {
        let r = round(&AtomicItem::Decimal(Decimal::new(-25, 1)), Rounding::Round).unwrap();
        assert_eq!(r, AtomicItem::Decimal(Decimal::from(-2)));
    }
}
