use crate::engine::error::{Error, ErrorCode};
use crate::item::{AtomicItem, AtomicType};

pub mod path;
pub mod simple;
use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    /// Top-level node of a Metaschema module definition tree.
    Module,
    RootAssembly,
    Assembly,
    Field,
    Flag,
}

impl NodeKind {
    /// Assemblies and fields: the nodes reached by the child-like axes.
    pub fn is_model_node(&self) -> bool {
        matches!(
            self,
            NodeKind::RootAssembly | NodeKind::Assembly | NodeKind::Field
        )
    }

    pub fn is_assembly(&self) -> bool {
        matches!(self, NodeKind::RootAssembly | NodeKind::Assembly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            ns_uri: None,
        }
    }

    pub fn with_ns(ns_uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            ns_uri: Some(ns_uri.into()),
        }
    }

    /// Lexical `prefix:local` form (local name only when unprefixed).
    pub fn lexical(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

/// Compare two nodes by ancestry and sibling order.
///
/// - An ancestor precedes its descendants.
/// - Among siblings, flags precede model children; within each group the
///   order reported by the adapter is kept.
/// - Nodes of different trees have no common order and yield `err:FOER0000`.
///   Adapters holding several documents must override
///   [`NodeItem::compare_document_order`].
pub fn try_compare_by_ancestry<N: NodeItem>(a: &N, b: &N) -> Result<Ordering, Error> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    fn path_to_root<N: NodeItem>(mut n: N) -> Vec<N> {
        let mut p = vec![n.clone()];
        while let Some(parent) = n.parent() {
            p.push(parent.clone());
            n = parent;
        }
        p.reverse();
        p
    }
    let pa = path_to_root(a.clone());
    let pb = path_to_root(b.clone());
    let len = core::cmp::min(pa.len(), pb.len());
    let i = pa
        .iter()
        .zip(&pb)
        .take_while(|(x, y)| x == y)
        .count();
    if i == len {
        // the shorter path is an ancestor
        return Ok(pa.len().cmp(&pb.len()));
    }
    if i == 0 {
        return Err(Error::dynamic(
            ErrorCode::FOER0000,
            "document order requires adapter: nodes from different roots",
        ));
    }
    let parent = &pa[i - 1];
    let mut sibs: Vec<N> = parent.flags();
    sibs.extend(parent.children());
    let posa = sibs.iter().position(|n| n == &pa[i]);
    let posb = sibs.iter().position(|n| n == &pb[i]);
    Ok(match (posa, posb) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    })
}

/// Read-only view of one position in a schema-typed document tree.
///
/// Implemented by the binding layer; the engine never mutates a node.
/// `children` yields assemblies and fields in document order, `flags` the
/// node's flags.
pub trait NodeItem: Clone + Eq + core::fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;
    /// `None` for documents and modules.
    fn name(&self) -> Option<QName>;
    /// 1-based position among same-named siblings under the same parent.
    fn position(&self) -> usize;
    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;
    fn flags(&self) -> Vec<Self>;

    /// Raw lexical value of a field or flag.
    fn raw_value(&self) -> Option<String>;
    /// Schema-declared type of the raw value.
    fn value_type(&self) -> AtomicType {
        AtomicType::String
    }

    /// Typed value: the raw value parsed with the declared type.
    ///
    /// `Ok(None)` for nodes without a value (documents, modules and plain
    /// assemblies).
    fn typed_value(&self) -> Result<Option<AtomicItem>, Error> {
        match self.raw_value() {
            Some(raw) => self.value_type().parse(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn base_uri(&self) -> Option<String> {
        None
    }

    /// Defaults to [`try_compare_by_ancestry`].
    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        try_compare_by_ancestry(self, other)
    }

    fn root(&self) -> Self {
        let mut cur = self.clone();
        while let Some(p) = cur.parent() {
            cur = p;
        }
        cur
    }
}
