use crate::consts::{BUILTIN_PREFIXES, FNS};
use crate::engine::error::{Error, ErrorCode};
use crate::item::{AtomicItem, AtomicType, ExpandedName, Item, Occurrence, Sequence};
use crate::model::NodeItem;
use chrono::{DateTime, FixedOffset};
use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub type Arity = usize;

/// Item type accepted by a function parameter or produced by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTypeSpec {
    AnyItem,
    AnyAtomic,
    Node,
    /// Any member of the numeric family, kept at its own type.
    Numeric,
    Atomic(AtomicType),
}

impl fmt::Display for ItemTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemTypeSpec::AnyItem => f.write_str("item()"),
            ItemTypeSpec::AnyAtomic => f.write_str("any-atomic-type"),
            ItemTypeSpec::Node => f.write_str("node()"),
            ItemTypeSpec::Numeric => f.write_str("numeric"),
            ItemTypeSpec::Atomic(t) => write!(f, "meta:{t}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamTypeSpec {
    pub item: ItemTypeSpec,
    pub occurrence: Occurrence,
}

impl ParamTypeSpec {
    pub const fn new(item: ItemTypeSpec, occurrence: Occurrence) -> Self {
        Self { item, occurrence }
    }
    pub const fn any_item(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::AnyItem, occurrence)
    }
    pub const fn any_atomic(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::AnyAtomic, occurrence)
    }
    pub const fn node(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Node, occurrence)
    }
    pub const fn numeric(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Numeric, occurrence)
    }
    pub const fn string(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Atomic(AtomicType::String), occurrence)
    }
    pub const fn boolean(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Atomic(AtomicType::Boolean), occurrence)
    }
    pub const fn integer(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Atomic(AtomicType::Integer), occurrence)
    }
    pub const fn double(occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Atomic(AtomicType::Double), occurrence)
    }
    pub const fn atomic(ty: AtomicType, occurrence: Occurrence) -> Self {
        Self::new(ItemTypeSpec::Atomic(ty), occurrence)
    }

    /// Apply the function conversion rules to an argument.
    ///
    /// Atomic-typed parameters atomize their argument. Integers promote to
    /// decimal, integers and decimals promote to double, and every
    /// string-like value promotes to string. The cardinality is checked
    /// after conversion.
    pub fn convert<N: NodeItem>(&self, arg: Sequence<N>) -> Result<Sequence<N>, Error> {
        let converted: Sequence<N> = match self.item {
            ItemTypeSpec::AnyItem => arg,
            ItemTypeSpec::Node => {
                let nodes = arg.into_nodes()?;
                Sequence::from_nodes(nodes)
            }
            ItemTypeSpec::AnyAtomic => Sequence::from_atomics(arg.atomize()?),
            ItemTypeSpec::Numeric => {
                let atoms = arg.atomize()?;
                if let Some(bad) = atoms.iter().find(|a| !a.is_numeric()) {
                    return Err(Error::type_mismatch(
                        self.item.to_string(),
                        bad.atomic_type().name(),
                    ));
                }
                Sequence::from_atomics(atoms)
            }
            ItemTypeSpec::Atomic(target) => {
                let atoms = arg
                    .atomize()?
                    .into_iter()
                    .map(|a| promote(a, target))
                    .collect::<Result<Vec<_>, _>>()?;
                Sequence::from_atomics(atoms)
            }
        };
        converted.check_occurrence(self.occurrence)?;
        Ok(converted)
    }
}

fn promote(value: AtomicItem, target: AtomicType) -> Result<AtomicItem, Error> {
    let source = value.atomic_type();
    if source == target {
        return Ok(value);
    }
    let allowed = match target {
        AtomicType::String => source.is_string_like(),
        AtomicType::Double => source.is_numeric(),
        AtomicType::Decimal => source.is_integer(),
        AtomicType::Integer => source.is_integer(),
        AtomicType::UriReference => source == AtomicType::Uri,
        _ => false,
    };
    if allowed {
        value.cast_to(target)
    } else {
        Err(Error::type_mismatch(format!("meta:{target}"), source.name()))
    }
}

/// Static description of one function: name, arity range and types.
///
/// For a variadic function the last parameter type repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: ExpandedName,
    pub min_arity: Arity,
    pub max_arity: Option<Arity>,
    pub params: Vec<ParamTypeSpec>,
    pub returns: ParamTypeSpec,
}

impl FunctionSignature {
    pub fn accepts_arity(&self, arity: Arity) -> bool {
        arity >= self.min_arity && self.max_arity.is_none_or(|m| arity <= m)
    }

    /// Type of the parameter at `index`.
    pub fn param(&self, index: usize) -> ParamTypeSpec {
        self.params
            .get(index)
            .or_else(|| self.params.last())
            .copied()
            .unwrap_or(ParamTypeSpec::any_item(Occurrence::ZeroOrMore))
    }
}

/// Error type returned by function resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No function with the name exists.
    Unknown(ExpandedName),
    /// Function exists, but not for the requested arity.
    WrongArity {
        name: ExpandedName,
        available: Vec<Arity>,
    },
}

impl ResolveError {
    pub fn into_error(self, arity: Arity) -> Error {
        match self {
            ResolveError::Unknown(name) => Error::UnknownFunction {
                name: name.to_string(),
                arity,
                available: Vec::new(),
            },
            ResolveError::WrongArity { name, available } => Error::UnknownFunction {
                name: name.to_string(),
                arity,
                available,
            },
        }
    }
}

fn arities_of<'a>(ranges: impl Iterator<Item = (Arity, Option<Arity>)> + 'a) -> Vec<Arity> {
    let mut arities: Vec<Arity> = Vec::new();
    for (min, max) in ranges {
        match max {
            Some(m) => arities.extend(min..=m),
            // variadic: report the minimum only
            None => arities.push(min),
        }
    }
    arities.sort_unstable();
    arities.dedup();
    arities
}

/// Node-independent function table consulted by the compiler.
#[derive(Debug, Clone, Default)]
pub struct FunctionSignatures {
    by_name: HashMap<ExpandedName, Vec<FunctionSignature>>,
}

impl FunctionSignatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sig: FunctionSignature) {
        let entry = self.by_name.entry(sig.name.clone()).or_default();
        entry.push(sig);
        // the most specific range wins: higher min first, bounded before variadic
        entry.sort_by(|a, b| {
            b.min_arity
                .cmp(&a.min_arity)
                .then_with(|| match (a.max_arity, b.max_arity) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => core::cmp::Ordering::Less,
                    (None, Some(_)) => core::cmp::Ordering::Greater,
                    (None, None) => core::cmp::Ordering::Equal,
                })
        });
    }

    /// Convenience: register a function in a namespace using ns URI and local name.
    pub fn register_ns(
        &mut self,
        ns_uri: &str,
        local: &str,
        min_arity: Arity,
        max_arity: Option<Arity>,
        params: Vec<ParamTypeSpec>,
        returns: ParamTypeSpec,
    ) {
        self.register(FunctionSignature {
            name: ExpandedName::in_ns(ns_uri, local),
            min_arity,
            max_arity,
            params,
            returns,
        });
    }

    pub fn resolve(
        &self,
        name: &ExpandedName,
        arity: Arity,
    ) -> Result<&FunctionSignature, ResolveError> {
        let Some(cands) = self.by_name.get(name) else {
            return Err(ResolveError::Unknown(name.clone()));
        };
        cands
            .iter()
            .find(|s| s.accepts_arity(arity))
            .ok_or_else(|| ResolveError::WrongArity {
                name: name.clone(),
                available: arities_of(cands.iter().map(|s| (s.min_arity, s.max_arity))),
            })
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Focus of an evaluation step: the context item and its position in the
/// sequence being processed.
#[derive(Debug, Clone)]
pub struct Focus<N> {
    pub item: Item<N>,
    /// 1-based.
    pub position: usize,
    pub size: usize,
}

pub struct CallCtx<'a, N> {
    pub dyn_ctx: &'a DynamicContext<N>,
    pub static_ctx: &'a StaticContext,
    pub focus: Option<&'a Focus<N>>,
}

impl<N: NodeItem> CallCtx<'_, N> {
    pub fn context_item(&self) -> Result<&Item<N>, Error> {
        self.focus
            .map(|f| &f.item)
            .ok_or_else(|| Error::dynamic(ErrorCode::XPDY0002, "context item is absent"))
    }

    pub fn implicit_timezone(&self) -> FixedOffset {
        self.dyn_ctx.implicit_timezone()
    }
}

pub type FunctionImpl<N> =
    Arc<dyn Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error> + Send + Sync>;

pub type FunctionOverload<N> = (Arity, Option<Arity>, FunctionImpl<N>);
pub type FunctionOverloads<N> = Vec<FunctionOverload<N>>;

/// Node-specific implementations, keyed like [`FunctionSignatures`].
pub struct FunctionImplementations<N> {
    // A call matches when argc >= min_arity and (max_arity is None or
    // argc <= max_arity).
    fns: HashMap<ExpandedName, FunctionOverloads<N>>,
}

impl<N> Default for FunctionImplementations<N> {
    fn default() -> Self {
        Self {
            fns: HashMap::new(),
        }
    }
}

impl<N> fmt::Debug for FunctionImplementations<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionImplementations")
            .field("names", &self.fns.len())
            .finish()
    }
}

impl<N> FunctionImplementations<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_range(
        &mut self,
        name: ExpandedName,
        min_arity: Arity,
        max_arity: Option<Arity>,
        func: FunctionImpl<N>,
    ) {
        let entry = self.fns.entry(name).or_default();
        entry.push((min_arity, max_arity, func));
        entry.sort_by(|a, b| {
            b.0.cmp(&a.0).then_with(|| match (&a.1, &b.1) {
                (Some(amax), Some(bmax)) => amax.cmp(bmax),
                (Some(_), None) => core::cmp::Ordering::Less,
                (None, Some(_)) => core::cmp::Ordering::Greater,
                (None, None) => core::cmp::Ordering::Equal,
            })
        });
    }

    /// Convenience: register a function in a namespace with an arity range.
    pub fn register_ns_range<F>(
        &mut self,
        ns_uri: &str,
        local: &str,
        min_arity: Arity,
        max_arity: Option<Arity>,
        f: F,
    ) where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        self.register_range(
            ExpandedName::in_ns(ns_uri, local),
            min_arity,
            max_arity,
            Arc::new(f),
        );
    }

    pub fn register_ns<F>(&mut self, ns_uri: &str, local: &str, arity: Arity, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        self.register_ns_range(ns_uri, local, arity, Some(arity), f);
    }

    pub fn register_ns_variadic<F>(&mut self, ns_uri: &str, local: &str, min_arity: Arity, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<N>, &[Sequence<N>]) -> Result<Sequence<N>, Error>,
    {
        self.register_ns_range(ns_uri, local, min_arity, None, f);
    }

    pub fn resolve(
        &self,
        name: &ExpandedName,
        arity: Arity,
    ) -> Result<&FunctionImpl<N>, ResolveError> {
        let Some(cands) = self.fns.get(name) else {
            return Err(ResolveError::Unknown(name.clone()));
        };
        cands
            .iter()
            .find(|(min, max, _)| arity >= *min && max.is_none_or(|m| arity <= m))
            .map(|(_, _, f)| f)
            .ok_or_else(|| ResolveError::WrongArity {
                name: name.clone(),
                available: arities_of(cands.iter().map(|(min, max, _)| (*min, *max))),
            })
    }
}

/// Compile-time context: namespaces, defaults and the function signatures.
///
/// A `StaticContext` is captured by [`compile`](crate::compile); the
/// compiled expression keeps its own copy.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub namespaces: HashMap<String, String>,
    pub default_function_namespace: String,
    /// Namespace required of unprefixed name tests, if any.
    pub default_model_namespace: Option<String>,
    pub base_uri: Option<String>,
    pub functions: Arc<FunctionSignatures>,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self {
            namespaces: BUILTIN_PREFIXES
                .iter()
                .map(|(p, uri)| ((*p).to_string(), (*uri).to_string()))
                .collect(),
            default_function_namespace: FNS.to_string(),
            default_model_namespace: None,
            base_uri: None,
            functions: crate::engine::functions::default_function_signatures(),
        }
    }
}

impl StaticContext {
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }
}

/// Builder for [`StaticContext`]: explicit namespace registrations and
/// defaults; the built-in prefixes are always bound.
#[derive(Default)]
pub struct StaticContextBuilder {
    ctx: StaticContext,
}

impl StaticContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a prefix. Attempts to rebind a built-in prefix are ignored.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let p = prefix.into();
        if BUILTIN_PREFIXES.iter().any(|(builtin, _)| *builtin == p) {
            return self;
        }
        self.ctx.namespaces.insert(p, uri.into());
        self
    }

    pub fn with_default_function_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_function_namespace = uri.into();
        self
    }

    pub fn with_default_model_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_model_namespace = Some(uri.into());
        self
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.ctx.base_uri = Some(uri.into());
        self
    }

    pub fn with_functions(mut self, sigs: Arc<FunctionSignatures>) -> Self {
        self.ctx.functions = sigs;
        self
    }

    pub fn build(self) -> StaticContext {
        self.ctx
    }
}

/// Per-evaluation context.
///
/// The current moment is captured at most once per context, so every
/// clock-reading function sees the same instant. Give each evaluation its
/// own context when distinct instants are wanted.
#[derive(Clone)]
pub struct DynamicContext<N> {
    pub context_item: Option<Item<N>>,
    pub variables: HashMap<ExpandedName, Sequence<N>>,
    pub functions: Arc<FunctionImplementations<N>>,
    pub implicit_timezone: Option<FixedOffset>,
    now: OnceLock<DateTime<FixedOffset>>,
}

impl<N: NodeItem> Default for DynamicContext<N> {
    fn default() -> Self {
        Self {
            context_item: None,
            variables: HashMap::new(),
            functions: crate::engine::functions::default_function_implementations::<N>(),
            implicit_timezone: None,
            now: OnceLock::new(),
        }
    }
}

impl<N> DynamicContext<N> {
    pub fn current_moment(&self) -> DateTime<FixedOffset> {
        *self.now.get_or_init(|| {
            let now = chrono::Local::now().fixed_offset();
            tracing::debug!(%now, "captured current moment");
            now
        })
    }

    /// Configured timezone, otherwise the offset of the current moment.
    pub fn implicit_timezone(&self) -> FixedOffset {
        self.implicit_timezone
            .unwrap_or_else(|| *self.current_moment().offset())
    }

    pub fn variable(&self, name: &ExpandedName) -> Option<&Sequence<N>> {
        self.variables.get(name)
    }
}

impl<N: fmt::Debug> fmt::Debug for DynamicContext<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicContext")
            .field("context_item", &self.context_item)
            .field("variables", &self.variables.len())
            .field("implicit_timezone", &self.implicit_timezone)
            .field("now", &self.now.get())
            .finish()
    }
}

pub struct DynamicContextBuilder<N> {
    ctx: DynamicContext<N>,
    now: Option<DateTime<FixedOffset>>,
}

impl<N: NodeItem> Default for DynamicContextBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeItem> DynamicContextBuilder<N> {
    pub fn new() -> Self {
        Self {
            ctx: DynamicContext::default(),
            now: None,
        }
    }

    pub fn with_context_item(mut self, item: impl Into<Item<N>>) -> Self {
        self.ctx.context_item = Some(item.into());
        self
    }

    pub fn with_context_node(mut self, node: N) -> Self {
        self.ctx.context_item = Some(Item::Node(node));
        self
    }

    pub fn with_variable(mut self, name: ExpandedName, value: impl Into<Sequence<N>>) -> Self {
        self.ctx.variables.insert(name, value.into());
        self
    }

    pub fn with_functions(mut self, reg: Arc<FunctionImplementations<N>>) -> Self {
        self.ctx.functions = reg;
        self
    }

    /// Fix the current moment instead of reading the clock.
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_implicit_timezone(mut self, tz: FixedOffset) -> Self {
        self.ctx.implicit_timezone = Some(tz);
        self
    }

    pub fn build(self) -> DynamicContext<N> {
        let mut ctx = self.ctx;
        if let Some(now) = self.now {
            ctx.now = OnceLock::from(now);
        }
        ctx
    }
}
