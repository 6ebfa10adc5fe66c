use super::{integer_result, node_arg_or_context, string_result};
use crate::engine::error::{Error, ErrorCode};
use crate::engine::runtime::CallCtx;
use crate::item::{AtomicItem, AtomicType, Item, Sequence};
use crate::model::NodeItem;
use crate::model::path::format_path;

fn focus_missing() -> Error {
    Error::dynamic(ErrorCode::XPDY0002, "focus is absent")
}

pub(super) fn position_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let focus = ctx.focus.ok_or_else(focus_missing)?;
    integer_result(focus.position)
}

pub(super) fn last_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let focus = ctx.focus.ok_or_else(focus_missing)?;
    integer_result(focus.size)
}

pub(super) fn data_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let atoms = match args.first() {
        Some(seq) => seq.atomize()?,
        None => vec![ctx.context_item()?.atomize()?],
    };
    Ok(Sequence::from_atomics(atoms))
}

pub(super) fn name_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let name = node_arg_or_context(ctx, args)?
        .and_then(|n| n.name())
        .map(|q| q.lexical())
        .unwrap_or_default();
    Ok(string_result(name))
}

pub(super) fn local_name_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let name = node_arg_or_context(ctx, args)?
        .and_then(|n| n.name())
        .map(|q| q.local)
        .unwrap_or_default();
    Ok(string_result(name))
}

pub(super) fn root_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(node_arg_or_context(ctx, args)?
        .map(|n| Item::Node(n.root()))
        .into_iter()
        .collect())
}

fn uri_item(uri: &str) -> Result<AtomicItem, Error> {
    AtomicType::Uri
        .parse(uri)
        .or_else(|_| AtomicType::UriReference.parse(uri))
}

pub(super) fn base_uri_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    match node_arg_or_context(ctx, args)?.and_then(|n| n.base_uri()) {
        Some(uri) => Ok(Sequence::singleton(uri_item(&uri)?)),
        None => Ok(Sequence::empty()),
    }
}

pub(super) fn static_base_uri_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    _args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    match &ctx.static_ctx.base_uri {
        Some(uri) => Ok(Sequence::singleton(uri_item(uri)?)),
        None => Ok(Sequence::empty()),
    }
}

/// `mp:path`: location string of a node, `""` for the empty sequence.
pub(super) fn path_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let path = node_arg_or_context(ctx, args)?
        .map(|n| format_path(&n))
        .unwrap_or_default();
    Ok(string_result(path))
}
