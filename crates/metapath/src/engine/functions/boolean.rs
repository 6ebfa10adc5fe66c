use super::boolean_result;
use crate::engine::error::Error;
use crate::engine::runtime::CallCtx;
use crate::item::Sequence;
use crate::model::NodeItem;

pub(super) fn fn_true<N: NodeItem>(
    _ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(true))
}

pub(super) fn fn_false<N: NodeItem>(
    _ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(false))
}

pub(super) fn fn_not<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(!args[0].effective_boolean_value()?))
}

pub(super) fn fn_boolean<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(boolean_result(args[0].effective_boolean_value()?))
}
