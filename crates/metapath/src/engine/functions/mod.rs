use crate::consts::{FNS, META_NS, MP_FNS};
use crate::engine::error::Error;
use crate::engine::runtime::{
    CallCtx, FunctionImplementations, FunctionSignatures, ItemTypeSpec, ParamTypeSpec,
};
use crate::item::{AtomicItem, AtomicType, Item, Occurrence, Sequence};
use crate::model::NodeItem;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub mod boolean;
pub mod constructors;
pub mod datetime;
pub mod nodes;
pub mod numeric;
pub mod sequences;
pub mod strings;

use Occurrence::{ExactlyOne as One, OneOrMore as Plus, ZeroOrMore as Star, ZeroOrOne as Opt};

fn register_default_functions<N: NodeItem>(
    reg: Option<&mut FunctionImplementations<N>>,
    sigs: Option<&mut FunctionSignatures>,
) {
    let mut reg = reg;
    let mut sigs = sigs;
    macro_rules! reg_ns_range {
        ($ns:expr, $local:expr, $min:expr, $max:expr, $func:expr, [$($param:expr),* $(,)?], $ret:expr $(,)?) => {{
            if let Some(s) = sigs.as_mut() {
                s.register_ns($ns, $local, $min, $max, vec![$($param),*], $ret);
            }
            if let Some(r) = reg.as_mut() {
                r.register_ns_range($ns, $local, $min, $max, $func);
            }
        }};
    }
    macro_rules! reg_ns {
        ($ns:expr, $local:expr, $arity:expr, $func:expr, [$($param:expr),* $(,)?], $ret:expr $(,)?) => {{
            if let Some(s) = sigs.as_mut() {
                s.register_ns($ns, $local, $arity, Some($arity), vec![$($param),*], $ret);
            }
            if let Some(r) = reg.as_mut() {
                r.register_ns($ns, $local, $arity, $func);
            }
        }};
    }
    macro_rules! reg_ns_variadic {
        ($ns:expr, $local:expr, $min:expr, $func:expr, [$($param:expr),* $(,)?], $ret:expr $(,)?) => {{
            if let Some(s) = sigs.as_mut() {
                s.register_ns($ns, $local, $min, None, vec![$($param),*], $ret);
            }
            if let Some(r) = reg.as_mut() {
                r.register_ns_variadic($ns, $local, $min, $func);
            }
        }};
    }

    // ===== Booleans =====
    reg_ns!(FNS, "true", 0, boolean::fn_true::<N>, [], ParamTypeSpec::boolean(One));
    reg_ns!(FNS, "false", 0, boolean::fn_false::<N>, [], ParamTypeSpec::boolean(One));
    reg_ns!(
        FNS,
        "not",
        1,
        boolean::fn_not::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns!(
        FNS,
        "boolean",
        1,
        boolean::fn_boolean::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::boolean(One)
    );

    // ===== Strings =====
    reg_ns_range!(
        FNS,
        "string",
        0,
        Some(1),
        strings::string_fn::<N>,
        [ParamTypeSpec::any_item(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns_range!(
        FNS,
        "string-length",
        0,
        Some(1),
        strings::string_length_fn::<N>,
        [ParamTypeSpec::string(Opt)],
        ParamTypeSpec::integer(One)
    );
    reg_ns_variadic!(
        FNS,
        "concat",
        2,
        strings::concat_fn::<N>,
        [ParamTypeSpec::any_atomic(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns!(
        FNS,
        "contains",
        2,
        strings::contains_fn::<N>,
        [ParamTypeSpec::string(Opt), ParamTypeSpec::string(Opt)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns!(
        FNS,
        "starts-with",
        2,
        strings::starts_with_fn::<N>,
        [ParamTypeSpec::string(Opt), ParamTypeSpec::string(Opt)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns!(
        FNS,
        "ends-with",
        2,
        strings::ends_with_fn::<N>,
        [ParamTypeSpec::string(Opt), ParamTypeSpec::string(Opt)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns_range!(
        FNS,
        "substring",
        2,
        Some(3),
        strings::substring_fn::<N>,
        [
            ParamTypeSpec::string(Opt),
            ParamTypeSpec::double(One),
            ParamTypeSpec::double(One)
        ],
        ParamTypeSpec::string(One)
    );
    reg_ns!(
        FNS,
        "upper-case",
        1,
        strings::upper_case_fn::<N>,
        [ParamTypeSpec::string(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns!(
        FNS,
        "lower-case",
        1,
        strings::lower_case_fn::<N>,
        [ParamTypeSpec::string(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns_range!(
        FNS,
        "normalize-space",
        0,
        Some(1),
        strings::normalize_space_fn::<N>,
        [ParamTypeSpec::string(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns_range!(
        FNS,
        "matches",
        2,
        Some(3),
        strings::matches_fn::<N>,
        [
            ParamTypeSpec::string(Opt),
            ParamTypeSpec::string(One),
            ParamTypeSpec::string(One)
        ],
        ParamTypeSpec::boolean(One)
    );

    // ===== Sequences =====
    reg_ns!(
        FNS,
        "count",
        1,
        sequences::count_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::integer(One)
    );
    reg_ns!(
        FNS,
        "empty",
        1,
        sequences::empty_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns!(
        FNS,
        "exists",
        1,
        sequences::exists_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::boolean(One)
    );
    reg_ns!(
        FNS,
        "exactly-one",
        1,
        sequences::exactly_one_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(One)
    );
    reg_ns!(
        FNS,
        "zero-or-one",
        1,
        sequences::zero_or_one_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(Opt)
    );
    reg_ns!(
        FNS,
        "one-or-more",
        1,
        sequences::one_or_more_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(Plus)
    );
    reg_ns!(
        FNS,
        "head",
        1,
        sequences::head_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(Opt)
    );
    reg_ns!(
        FNS,
        "tail",
        1,
        sequences::tail_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(Star)
    );
    reg_ns!(
        FNS,
        "reverse",
        1,
        sequences::reverse_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_item(Star)
    );
    reg_ns!(
        FNS,
        "distinct-values",
        1,
        sequences::distinct_values_fn::<N>,
        [ParamTypeSpec::any_atomic(Star)],
        ParamTypeSpec::any_atomic(Star)
    );
    reg_ns!(
        FNS,
        "sum",
        1,
        sequences::sum_fn::<N>,
        [ParamTypeSpec::any_atomic(Star)],
        ParamTypeSpec::any_atomic(One)
    );
    reg_ns!(
        FNS,
        "avg",
        1,
        sequences::avg_fn::<N>,
        [ParamTypeSpec::any_atomic(Star)],
        ParamTypeSpec::any_atomic(Opt)
    );
    reg_ns!(
        FNS,
        "min",
        1,
        sequences::min_fn::<N>,
        [ParamTypeSpec::any_atomic(Star)],
        ParamTypeSpec::any_atomic(Opt)
    );
    reg_ns!(
        FNS,
        "max",
        1,
        sequences::max_fn::<N>,
        [ParamTypeSpec::any_atomic(Star)],
        ParamTypeSpec::any_atomic(Opt)
    );

    // ===== Numeric =====
    reg_ns!(
        FNS,
        "abs",
        1,
        numeric::abs_fn::<N>,
        [ParamTypeSpec::numeric(Opt)],
        ParamTypeSpec::numeric(Opt)
    );
    reg_ns!(
        FNS,
        "ceiling",
        1,
        numeric::ceiling_fn::<N>,
        [ParamTypeSpec::numeric(Opt)],
        ParamTypeSpec::numeric(Opt)
    );
    reg_ns!(
        FNS,
        "floor",
        1,
        numeric::floor_fn::<N>,
        [ParamTypeSpec::numeric(Opt)],
        ParamTypeSpec::numeric(Opt)
    );
    reg_ns!(
        FNS,
        "round",
        1,
        numeric::round_fn::<N>,
        [ParamTypeSpec::numeric(Opt)],
        ParamTypeSpec::numeric(Opt)
    );

    // ===== Focus and nodes =====
    reg_ns!(FNS, "position", 0, nodes::position_fn::<N>, [], ParamTypeSpec::integer(One));
    reg_ns!(FNS, "last", 0, nodes::last_fn::<N>, [], ParamTypeSpec::integer(One));
    reg_ns_range!(
        FNS,
        "data",
        0,
        Some(1),
        nodes::data_fn::<N>,
        [ParamTypeSpec::any_item(Star)],
        ParamTypeSpec::any_atomic(Star)
    );
    reg_ns_range!(
        FNS,
        "name",
        0,
        Some(1),
        nodes::name_fn::<N>,
        [ParamTypeSpec::node(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns_range!(
        FNS,
        "local-name",
        0,
        Some(1),
        nodes::local_name_fn::<N>,
        [ParamTypeSpec::node(Opt)],
        ParamTypeSpec::string(One)
    );
    reg_ns_range!(
        FNS,
        "root",
        0,
        Some(1),
        nodes::root_fn::<N>,
        [ParamTypeSpec::node(Opt)],
        ParamTypeSpec::node(Opt)
    );
    reg_ns_range!(
        FNS,
        "base-uri",
        0,
        Some(1),
        nodes::base_uri_fn::<N>,
        [ParamTypeSpec::node(Opt)],
        ParamTypeSpec::atomic(AtomicType::UriReference, Opt)
    );
    reg_ns!(
        FNS,
        "static-base-uri",
        0,
        nodes::static_base_uri_fn::<N>,
        [],
        ParamTypeSpec::atomic(AtomicType::UriReference, Opt)
    );
    reg_ns_range!(
        MP_FNS,
        "path",
        0,
        Some(1),
        nodes::path_fn::<N>,
        [ParamTypeSpec::node(Opt)],
        ParamTypeSpec::string(One)
    );

    // ===== Date and time =====
    reg_ns!(
        FNS,
        "current-dateTime",
        0,
        datetime::current_date_time_fn::<N>,
        [],
        ParamTypeSpec::atomic(AtomicType::DateTimeWithTimezone, One)
    );
    reg_ns!(
        FNS,
        "current-date",
        0,
        datetime::current_date_fn::<N>,
        [],
        ParamTypeSpec::atomic(AtomicType::DateWithTimezone, One)
    );
    reg_ns!(
        FNS,
        "implicit-timezone",
        0,
        datetime::implicit_timezone_fn::<N>,
        [],
        ParamTypeSpec::string(One)
    );

    // ===== Constructors: meta:<type>(value?) =====
    for ty in AtomicType::ALL {
        reg_ns!(
            META_NS,
            ty.name(),
            1,
            move |ctx: &CallCtx<N>, args: &[Sequence<N>]| constructors::construct(ctx, args, ty),
            [ParamTypeSpec::any_atomic(Opt)],
            ParamTypeSpec::atomic(ty, Opt)
        );
    }
}

/// Implementations of the built-in functions for node type `N`, built once
/// per type and shared.
pub fn default_function_implementations<N: NodeItem>() -> Arc<FunctionImplementations<N>> {
    static CACHE: OnceLock<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> = OnceLock::new();
    let map = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = map.lock().unwrap_or_else(PoisonError::into_inner);
    let type_id = TypeId::of::<N>();
    if let Some(existing) = guard
        .get(&type_id)
        .and_then(|b| b.downcast_ref::<Arc<FunctionImplementations<N>>>())
    {
        return existing.clone();
    }
    let mut reg = FunctionImplementations::new();
    register_default_functions(Some(&mut reg), None);
    tracing::debug!(
        node_type = std::any::type_name::<N>(),
        "built default function implementations"
    );
    let arc = Arc::new(reg);
    guard.insert(type_id, Box::new(arc.clone()));
    arc
}

/// Signatures of the built-in functions.
pub fn default_function_signatures() -> Arc<FunctionSignatures> {
    static SIGS: OnceLock<Arc<FunctionSignatures>> = OnceLock::new();
    SIGS.get_or_init(|| {
        let mut sigs = FunctionSignatures::default();
        register_default_functions::<crate::model::simple::SimpleNode>(None, Some(&mut sigs));
        tracing::debug!(functions = sigs.len(), "built default function signatures");
        Arc::new(sigs)
    })
    .clone()
}

// ===== Helpers shared by the function modules =====

pub(crate) fn string_result<N>(s: impl Into<String>) -> Sequence<N> {
    Sequence::singleton(AtomicItem::String(s.into()))
}

pub(crate) fn boolean_result<N>(b: bool) -> Sequence<N> {
    Sequence::singleton(AtomicItem::Boolean(b))
}

pub(crate) fn integer_result<N>(v: usize) -> Result<Sequence<N>, Error> {
    let v = i64::try_from(v).map_err(|_| {
        Error::dynamic(crate::engine::error::ErrorCode::FOAR0002, "integer overflow")
    })?;
    Ok(Sequence::singleton(AtomicItem::Integer(v)))
}

/// Canonical string of an optional converted argument, `""` when empty.
pub(crate) fn string_arg<N>(seq: &Sequence<N>) -> String {
    match seq.first() {
        Some(Item::Atomic(a)) => a.to_string(),
        _ => String::new(),
    }
}

/// First atomic item of a converted argument.
pub(crate) fn atomic_arg<N>(seq: &Sequence<N>) -> Option<&AtomicItem> {
    seq.first().and_then(|i| match i {
        Item::Atomic(a) => Some(a),
        Item::Node(_) => None,
    })
}

/// Node from an optional node argument, or the context item when the
/// function was called without arguments.
pub(crate) fn node_arg_or_context<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<Option<N>, Error> {
    let item = match args.first() {
        Some(seq) => match seq.first() {
            Some(i) => i.clone(),
            None => return Ok(None),
        },
        None => ctx.context_item()?.clone(),
    };
    match item {
        Item::Node(n) => Ok(Some(n)),
        Item::Atomic(a) => Err(Error::type_mismatch(
            ItemTypeSpec::Node.to_string(),
            a.atomic_type().name(),
        )),
    }
}

/// String value of one item; nodes without a value give `""`.
pub(crate) fn string_value<N: NodeItem>(item: &Item<N>) -> Result<String, Error> {
    match item {
        Item::Atomic(a) => Ok(a.to_string()),
        Item::Node(n) => Ok(n
            .typed_value()?
            .map(|v| v.to_string())
            .unwrap_or_default()),
    }
}

/// String argument, or the string value of the context item when the
/// function was called without arguments.
pub(crate) fn string_arg_or_context<N: NodeItem>(
    ctx: &CallCtx<N>,
    args: &[Sequence<N>],
) -> Result<String, Error> {
    match args.first() {
        Some(seq) => Ok(string_arg(seq)),
        None => string_value(ctx.context_item()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ExpandedName;

    #[test]
    fn signatures_cover_constructors() {
        let sigs = default_function_signatures();
        for ty in AtomicType::ALL {
            let name = ExpandedName::in_ns(META_NS, ty.name());
            assert!(sigs.resolve(&name, 1).is_ok(), "missing meta:{ty}");
        }
    }

    #[test]
    fn implementations_are_shared_per_node_type() {
        let a = default_function_implementations::<crate::model::simple::SimpleNode>();
        let b = default_function_implementations::<crate::model::simple::SimpleNode>();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
