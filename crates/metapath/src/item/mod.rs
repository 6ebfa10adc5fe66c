//! Items and sequences: the values every expression evaluates to.
//!
//! An [`Item`] is either a node of the navigated tree or an [`AtomicItem`].
//! A [`Sequence`] is an ordered list of items; it never removes duplicates
//! on its own and the empty sequence is a single canonical value.

pub mod atomic;
pub mod cast;
pub mod compare;
pub(crate) mod lexical;

pub use atomic::{AtomicItem, AtomicType};

use crate::engine::error::{Error, ErrorCode};
use crate::model::NodeItem;
use crate::model::path::format_path;
use core::fmt;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns_uri,
            local: local.into(),
        }
    }

    pub fn in_ns(ns_uri: &str, local: impl Into<String>) -> Self {
        Self::new(Some(ns_uri.to_string()), local)
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns_uri {
            Some(ns) => write!(f, "Q{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Cardinality constraint on a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    ExactlyOne,
    ZeroOrOne,
    OneOrMore,
    ZeroOrMore,
}

impl Occurrence {
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            Occurrence::ExactlyOne => len == 1,
            Occurrence::ZeroOrOne => len <= 1,
            Occurrence::OneOrMore => len >= 1,
            Occurrence::ZeroOrMore => true,
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Occurrence::ExactlyOne => "",
            Occurrence::ZeroOrOne => "?",
            Occurrence::OneOrMore => "+",
            Occurrence::ZeroOrMore => "*",
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Occurrence::ExactlyOne => "exactly one",
            Occurrence::ZeroOrOne => "zero or one",
            Occurrence::OneOrMore => "one or more",
            Occurrence::ZeroOrMore => "zero or more",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item<N> {
    Node(N),
    Atomic(AtomicItem),
}

impl<N> From<AtomicItem> for Item<N> {
    fn from(a: AtomicItem) -> Self {
        Item::Atomic(a)
    }
}

impl<N: NodeItem> Item<N> {
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(n) => Some(n),
            Item::Atomic(_) => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicItem> {
        match self {
            Item::Atomic(a) => Some(a),
            Item::Node(_) => None,
        }
    }

    /// Atomize a single item: nodes yield their typed value.
    pub fn atomize(&self) -> Result<AtomicItem, Error> {
        match self {
            Item::Atomic(a) => Ok(a.clone()),
            Item::Node(n) => n.typed_value()?.ok_or_else(|| {
                Error::type_mismatch(
                    "a node with a typed value",
                    format!("{:?} node '{}'", n.kind(), format_path(n)),
                )
            }),
        }
    }
}

impl<N> fmt::Display for Item<N>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Node(_) => write!(f, "<node>"),
            Item::Atomic(a) => write!(f, "{a}"),
        }
    }
}

/// Ordered sequence of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<N> {
    items: Vec<Item<N>>,
}

impl<N> Default for Sequence<N> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<N> From<Vec<Item<N>>> for Sequence<N> {
    fn from(items: Vec<Item<N>>) -> Self {
        Self { items }
    }
}

impl<N> FromIterator<Item<N>> for Sequence<N> {
    fn from_iter<I: IntoIterator<Item = Item<N>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<N> IntoIterator for Sequence<N> {
    type Item = Item<N>;
    type IntoIter = std::vec::IntoIter<Item<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, N> IntoIterator for &'a Sequence<N> {
    type Item = &'a Item<N>;
    type IntoIter = std::slice::Iter<'a, Item<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<N> Sequence<N> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(item: impl Into<Item<N>>) -> Self {
        Self {
            items: vec![item.into()],
        }
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = N>) -> Self {
        nodes.into_iter().map(Item::Node).collect()
    }

    pub fn from_atomics(atoms: impl IntoIterator<Item = AtomicItem>) -> Self {
        atoms.into_iter().map(Item::Atomic).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item<N>> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Item<N>> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&Item<N>> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[Item<N>] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Item<N>> {
        self.items
    }

    pub fn push(&mut self, item: Item<N>) {
        self.items.push(item);
    }

    pub fn extend(&mut self, other: Sequence<N>) {
        self.items.extend(other.items);
    }

    pub fn check_occurrence(&self, expected: Occurrence) -> Result<(), Error> {
        if expected.accepts(self.len()) {
            Ok(())
        } else {
            Err(Error::cardinality(expected, self.len()))
        }
    }
}

impl<N: NodeItem> Sequence<N> {
    /// Map every node to its typed value; atomic items pass through.
    pub fn atomize(&self) -> Result<Vec<AtomicItem>, Error> {
        self.items.iter().map(Item::atomize).collect()
    }

    /// Atomize and require at most one value.
    pub fn atomize_optional(&self) -> Result<Option<AtomicItem>, Error> {
        let mut atoms: SmallVec<[AtomicItem; 1]> = SmallVec::new();
        for item in &self.items {
            atoms.push(item.atomize()?);
            if atoms.len() > 1 {
                return Err(Error::cardinality(Occurrence::ZeroOrOne, self.len()));
            }
        }
        Ok(atoms.pop())
    }

    pub fn exactly_one(&self) -> Result<&Item<N>, Error> {
        match self.items.as_slice() {
            [single] => Ok(single),
            _ => Err(Error::cardinality(Occurrence::ExactlyOne, self.len())),
        }
    }

    pub fn zero_or_one(&self) -> Result<Option<&Item<N>>, Error> {
        match self.items.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single)),
            _ => Err(Error::cardinality(Occurrence::ZeroOrOne, self.len())),
        }
    }

    pub fn one_or_more(&self) -> Result<&[Item<N>], Error> {
        if self.items.is_empty() {
            Err(Error::cardinality(Occurrence::OneOrMore, 0))
        } else {
            Ok(&self.items)
        }
    }

    /// Effective boolean value.
    ///
    /// Empty is false, a sequence starting with a node is true, and a
    /// singleton boolean, numeric or string-like value decides by its
    /// content. Anything else has no boolean value.
    pub fn effective_boolean_value(&self) -> Result<bool, Error> {
        match self.items.as_slice() {
            [] => Ok(false),
            [Item::Node(_), ..] => Ok(true),
            [Item::Atomic(a)] => a
                .effective_boolean_value()
                .ok_or_else(|| Error::ebv(a.atomic_type().name())),
            [_, ..] => Err(Error::ebv(format!(
                "a sequence of {} atomic items",
                self.len()
            ))),
        }
    }

    /// Split the sequence into nodes, failing on the first atomic item.
    pub fn into_nodes(self) -> Result<Vec<N>, Error> {
        self.items
            .into_iter()
            .map(|item| match item {
                Item::Node(n) => Ok(n),
                Item::Atomic(a) => Err(Error::Type {
                    expected: "node()".to_string(),
                    found: a.atomic_type().name().to_string(),
                    code: ErrorCode::XPTY0004,
                }),
            })
            .collect()
    }
}
