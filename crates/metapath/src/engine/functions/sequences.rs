use super::{boolean_result, integer_result};
use crate::engine::error::{Error, ErrorCode};
use crate::engine::numeric::arithmetic;
use crate::engine::runtime::CallCtx;
use crate::item::compare::{atomic_equal, atomic_order};
use crate::item::{AtomicItem, Item, Sequence};
use crate::model::NodeItem;
use crate::parser::ast::BinaryOp;
use core::cmp::Ordering;

pub(super) fn count_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    integer_result(args[0].len())
}

pub(super) fn empty_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(args[0].is_empty()))
}

pub(super) fn exists_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(!args[0].is_empty()))
}

pub(super) fn exactly_one_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    if args[0].len() != 1 {
        return Err(Error::dynamic(
            ErrorCode::FORG0005,
            format!("exactly-one called with {} items", args[0].len()),
        ));
    }
    Ok(args[0].clone())
}

pub(super) fn zero_or_one_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    if args[0].len() > 1 {
        return Err(Error::dynamic(
            ErrorCode::FORG0004,
            format!("zero-or-one called with {} items", args[0].len()),
        ));
    }
    Ok(args[0].clone())
}

pub(super) fn one_or_more_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    if args[0].is_empty() {
        return Err(Error::dynamic(
            ErrorCode::FORG0004,
            "one-or-more called with an empty sequence",
        ));
    }
    Ok(args[0].clone())
}

pub(super) fn head_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(args[0].first().cloned().into_iter().collect())
}

pub(super) fn tail_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(args[0].iter().skip(1).cloned().collect())
}

pub(super) fn reverse_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(args[0].iter().rev().cloned().collect())
}

fn atoms<N>(seq: &Sequence<N>) -> impl Iterator<Item = &AtomicItem> {
    seq.iter().filter_map(|i| match i {
        Item::Atomic(a) => Some(a),
        Item::Node(_) => None,
    })
}

pub(super) fn distinct_values_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let tz = ctx.implicit_timezone();
    let mut kept: Vec<AtomicItem> = Vec::new();
    for a in atoms(&args[0]) {
        if !kept.iter().any(|k| atomic_equal(k, a, tz)) {
            kept.push(a.clone());
        }
    }
    Ok(Sequence::from_atomics(kept))
}

fn total<'a>(values: impl Iterator<Item = &'a AtomicItem>) -> Result<Option<AtomicItem>, Error> {
    let mut acc: Option<AtomicItem> = None;
    for v in values {
        acc = Some(match acc {
            None => arithmetic(BinaryOp::Add, &AtomicItem::Integer(0), v)?,
            Some(sum) => arithmetic(BinaryOp::Add, &sum, v)?,
        });
    }
    Ok(acc)
}

pub(super) fn sum_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let sum = total(atoms(&args[0]))?.unwrap_or(AtomicItem::Integer(0));
    Ok(Sequence::singleton(sum))
}

pub(super) fn avg_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let Some(sum) = total(atoms(&args[0]))? else {
        return Ok(Sequence::empty());
    };
    let count = i64::try_from(args[0].len())
        .map_err(|_| Error::dynamic(ErrorCode::FOAR0002, "sequence too long"))?;
    let avg = arithmetic(BinaryOp::Div, &sum, &AtomicItem::Integer(count))?;
    Ok(Sequence::singleton(avg))
}

fn extreme<N: NodeItem>(
    ctx: &CallCtx<N>,
    seq: &Sequence<N>,
    wanted: Ordering,
) -> Result<Sequence<N>, Error> {
    let tz = ctx.implicit_timezone();
    let mut best: Option<&AtomicItem> = None;
    for a in atoms(seq) {
        if a.as_f64().is_some_and(f64::is_nan) {
            return Ok(Sequence::singleton(AtomicItem::Double(f64::NAN)));
        }
        best = match best {
            None => Some(a),
            Some(b) => match atomic_order(a, b, tz)? {
                Some(o) if o == wanted => Some(a),
                _ => Some(b),
            },
        };
    }
    Ok(best.cloned().into_iter().map(Item::Atomic).collect())
}

pub(super) fn min_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    extreme(ctx, &args[0], Ordering::Less)
}

pub(super) fn max_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    extreme(ctx, &args[0], Ordering::Greater)
}
