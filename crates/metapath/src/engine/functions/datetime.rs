use super::string_result;
use crate::engine::error::Error;
use crate::engine::runtime::CallCtx;
use crate::item::{AtomicItem, Sequence, lexical};
use crate::model::NodeItem;

pub(super) fn current_date_time_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let tz = ctx.implicit_timezone();
    let now = ctx.dyn_ctx.current_moment().with_timezone(&tz);
    Ok(Sequence::singleton(AtomicItem::DateTimeWithTimezone {
        value: now.naive_local(),
        tz,
    }))
}

pub(super) fn current_date_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let tz = ctx.implicit_timezone();
    let now = ctx.dyn_ctx.current_moment().with_timezone(&tz);
    Ok(Sequence::singleton(AtomicItem::DateWithTimezone {
        date: now.date_naive(),
        tz,
    }))
}

pub(super) fn implicit_timezone_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(string_result(lexical::format_offset(&ctx.implicit_timezone())))
}
