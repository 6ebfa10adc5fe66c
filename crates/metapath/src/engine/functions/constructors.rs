//! `meta:<type>(value?)` constructor functions, one per atomic type.
//!
//! A constructor is a cast: the empty sequence maps to the empty sequence
//! and anything else goes through [`AtomicItem::cast_to`](crate::item::AtomicItem::cast_to).

use super::atomic_arg;
use crate::engine::error::Error;
use crate::engine::runtime::CallCtx;
use crate::item::{AtomicType, Sequence};
use crate::model::NodeItem;

pub(super) fn construct<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
    target: AtomicType,
) -> Result<Sequence<N>, Error> {
    match atomic_arg(&args[0]) {
        Some(value) => Ok(Sequence::singleton(value.cast_to(target)?)),
        None => Ok(Sequence::empty()),
    }
}
