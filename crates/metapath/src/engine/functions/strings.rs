use super::{
    boolean_result, integer_result, string_arg, string_arg_or_context, string_result, string_value,
};
use crate::engine::error::{Error, ErrorCode};
use crate::engine::numeric::round_half_up;
use crate::engine::runtime::CallCtx;
use crate::item::Sequence;
use crate::model::NodeItem;

pub(super) fn string_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = match args.first() {
        Some(seq) => match seq.first() {
            Some(item) => string_value(item)?,
            None => String::new(),
        },
        None => string_value(ctx.context_item()?)?,
    };
    Ok(string_result(s))
}

pub(super) fn string_length_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg_or_context(ctx, args)?;
    integer_result(s.chars().count())
}

pub(super) fn concat_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let out: String = args.iter().map(string_arg).collect();
    Ok(string_result(out))
}

pub(super) fn contains_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg(&args[0]);
    let sub = string_arg(&args[1]);
    Ok(boolean_result(s.contains(&sub)))
}

pub(super) fn starts_with_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg(&args[0]);
    let sub = string_arg(&args[1]);
    Ok(boolean_result(s.starts_with(&sub)))
}

pub(super) fn ends_with_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg(&args[0]);
    let sub = string_arg(&args[1]);
    Ok(boolean_result(s.ends_with(&sub)))
}

/// Characters at 1-based positions `p` with `start <= p < start + len`,
/// where both bounds are rounded first.
pub(crate) fn substring(s: &str, start: f64, len: Option<f64>) -> String {
    let first = round_half_up(start);
    let end = match len {
        Some(l) => first + round_half_up(l),
        None => f64::INFINITY,
    };
    // NaN bounds select nothing: every comparison below is false
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let p = (*i + 1) as f64;
            p >= first && p < end
        })
        .map(|(_, c)| c)
        .collect()
}

pub(super) fn substring_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg(&args[0]);
    let number = |seq: &Sequence<N>| {
        super::atomic_arg(seq)
            .and_then(|a| a.as_f64())
            .unwrap_or(f64::NAN)
    };
    let start = number(&args[1]);
    let len = args.get(2).map(number);
    Ok(string_result(substring(&s, start, len)))
}

pub(super) fn upper_case_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(string_result(string_arg(&args[0]).to_uppercase()))
}

pub(super) fn lower_case_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    Ok(string_result(string_arg(&args[0]).to_lowercase()))
}

pub(super) fn normalize_space_fn<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let s = string_arg_or_context(ctx, args)?;
    let normalized = s.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    Ok(string_result(normalized))
}

fn build_regex(pattern: &str, flags: &str) -> Result<fancy_regex::Regex, Error> {
    let mut builder = fancy_regex::RegexBuilder::new(pattern);
    for ch in flags.chars() {
        match ch {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.verbose_mode(true);
            }
            _ => {
                return Err(Error::dynamic(
                    ErrorCode::FORX0001,
                    format!("unsupported regular expression flag '{ch}'"),
                ));
            }
        }
    }
    Ok(builder.build()?)
}

pub(super) fn matches_fn<N: NodeItem>(
    _ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    let input = string_arg(&args[0]);
    let pattern = string_arg(&args[1]);
    let flags = args.get(2).map(string_arg).unwrap_or_default();
    let re = build_regex(&pattern, &flags)?;
    Ok(boolean_result(re.is_match(&input)?))
}
