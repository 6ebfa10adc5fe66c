use super::atomic_arg;
use crate::engine::error::Error;
use crate::engine::numeric::{self, Rounding};
use crate::engine::runtime::CallCtx;
use crate::item::{AtomicItem, Sequence};
use crate::model::NodeItem;

fn num_unary<N>(
    args: &[Sequence<N>],
    f: impl Fn(&AtomicItem) -> Result<AtomicItem, Error>,
) -> Result<Sequence<N>, Error> {
    match atomic_arg(&args[0]) {
        Some(a) => Ok(Sequence::singleton(f(a)?)),
        None => Ok(Sequence::empty()),
    }
}

pub(super) fn abs_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    num_unary(args, numeric::abs)
}

pub(super) fn ceiling_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    num_unary(args, |a| numeric::round(a, Rounding::Ceiling))
}

pub(super) fn floor_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    num_unary(args, |a| numeric::round(a, Rounding::Floor))
}

pub(super) fn round_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    num_unary(args, |a| numeric::round(a, Rounding::Round))
}
