//! Simple in-memory tree implementing [`NodeItem`], for tests and prototypes.
//!
//! Focus:
//! - Ergonomic builder for quick tree creation
//! - Parent links and sibling positions fixed at build time
//! - Typed values computed once and published through `OnceLock`
//!
//! Example:
//! ```
//! use metapath::model::simple::{doc, root_assembly, field, flag};
//! use metapath::{AtomicType, NodeItem};
//!
//! let document = doc()
//!     .child(
//!         root_assembly("catalog")
//!             .flag(flag("uuid", "6d7c0a5e-3b7f-4f3e-9c4b-2a1d8e0f9b11").typed(AtomicType::Uuid))
//!             .child(field("title", "Sample"))
//!             .child(field("title", "Other")),
//!     )
//!     .build();
//!
//! let catalog = document.children()[0].clone();
//! assert_eq!(catalog.name().unwrap().local, "catalog");
//! assert_eq!(catalog.children()[1].position(), 2);
//! ```
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::engine::error::Error;
use crate::item::{AtomicItem, AtomicType};
use crate::model::{NodeItem, NodeKind, QName};

#[derive(Debug)]
pub(crate) struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    value_type: AtomicType,
    base_uri: Option<String>,
    parent: OnceLock<Weak<Inner>>,
    position: OnceLock<usize>,
    flags: Vec<SimpleNode>,
    children: Vec<SimpleNode>,
    typed: OnceLock<Result<Option<AtomicItem>, Error>>,
}

/// Arc-backed node; equality is identity.
#[derive(Clone)]
pub struct SimpleNode(pub(crate) Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}
impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name.as_ref().map(|n| &n.local))
            .field("value", &self.0.value)
            .finish()
    }
}

impl SimpleNode {
    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None, None)
    }
    pub fn module() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Module, None, None)
    }
    pub fn root_assembly(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::RootAssembly, Some(QName::local(name)), None)
    }
    pub fn assembly(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Assembly, Some(QName::local(name)), None)
    }
    pub fn field(name: &str, value: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(
            NodeKind::Field,
            Some(QName::local(name)),
            Some(value.to_string()),
        )
    }
    pub fn flag(name: &str, value: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(
            NodeKind::Flag,
            Some(QName::local(name)),
            Some(value.to_string()),
        )
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    value_type: AtomicType,
    base_uri: Option<String>,
    pending_children: Vec<SimpleNode>,
    pending_flags: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            value_type: AtomicType::String,
            base_uri: None,
            pending_children: Vec::new(),
            pending_flags: Vec::new(),
        }
    }

    /// Append an assembly or field child.
    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        let node = child.into().into_node();
        debug_assert!(node.kind().is_model_node());
        self.pending_children.push(node);
        self
    }

    pub fn children<I, C>(mut self, it: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SimpleNodeOrBuilder>,
    {
        for c in it {
            self = self.child(c);
        }
        self
    }

    pub fn flag(mut self, flag: impl Into<SimpleNodeOrBuilder>) -> Self {
        let node = flag.into().into_node();
        debug_assert!(node.kind() == NodeKind::Flag);
        self.pending_flags.push(node);
        self
    }

    /// Declared type of the node's value (defaults to `string`).
    pub fn typed(mut self, ty: AtomicType) -> Self {
        self.value_type = ty;
        self
    }

    /// Set the value of an assembly with simple content or override a field value.
    pub fn value(mut self, v: &str) -> Self {
        self.value = Some(v.to_string());
        self
    }

    pub fn namespace(mut self, uri: &str) -> Self {
        if let Some(name) = self.name.as_mut() {
            name.ns_uri = Some(uri.to_string());
        }
        self
    }

    pub fn base_uri(mut self, uri: &str) -> Self {
        self.base_uri = Some(uri.to_string());
        self
    }

    pub fn build(self) -> SimpleNode {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            for f in &self.pending_flags {
                attach(f, weak);
                let _ = f.0.position.set(1);
            }
            for (idx, c) in self.pending_children.iter().enumerate() {
                attach(c, weak);
                let same_named = self.pending_children[..idx]
                    .iter()
                    .filter(|s| s.0.name == c.0.name)
                    .count();
                let _ = c.0.position.set(same_named + 1);
            }
            Inner {
                kind: self.kind,
                name: self.name,
                value: self.value,
                value_type: self.value_type,
                base_uri: self.base_uri,
                parent: OnceLock::new(),
                position: OnceLock::new(),
                flags: self.pending_flags,
                children: self.pending_children,
                typed: OnceLock::new(),
            }
        });
        SimpleNode(inner)
    }
}

/// A node keeps the first parent it is attached to. Attaching it again
/// panics in debug builds; release builds leave the first link in place.
fn attach(node: &SimpleNode, parent: &Weak<Inner>) {
    let attached = node.0.parent.set(parent.clone()).is_ok();
    debug_assert!(attached, "node is already attached to a parent");
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl SimpleNodeOrBuilder {
    fn into_node(self) -> SimpleNode {
        match self {
            SimpleNodeOrBuilder::Built(n) => n,
            SimpleNodeOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}
impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

// Convenience helpers for concise test code
pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}
pub fn module() -> SimpleNodeBuilder {
    SimpleNode::module()
}
pub fn root_assembly(name: &str) -> SimpleNodeBuilder {
    SimpleNode::root_assembly(name)
}
pub fn assembly(name: &str) -> SimpleNodeBuilder {
    SimpleNode::assembly(name)
}
pub fn field(name: &str, value: &str) -> SimpleNodeBuilder {
    SimpleNode::field(name, value)
}
pub fn flag(name: &str, value: &str) -> SimpleNodeBuilder {
    SimpleNode::flag(name, value)
}

impl NodeItem for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }
    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }
    fn position(&self) -> usize {
        self.0.position.get().copied().unwrap_or(1)
    }
    fn parent(&self) -> Option<Self> {
        self.0.parent.get().and_then(Weak::upgrade).map(SimpleNode)
    }
    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }
    fn flags(&self) -> Vec<Self> {
        self.0.flags.clone()
    }
    fn raw_value(&self) -> Option<String> {
        self.0.value.clone()
    }
    fn value_type(&self) -> AtomicType {
        self.0.value_type
    }
    fn typed_value(&self) -> Result<Option<AtomicItem>, Error> {
        self.0
            .typed
            .get_or_init(|| match &self.0.value {
                Some(raw) => self.0.value_type.parse(raw).map(Some),
                None => Ok(None),
            })
            .clone()
    }
    fn base_uri(&self) -> Option<String> {
        match &self.0.base_uri {
            Some(uri) => Some(uri.clone()),
            None => self.parent().and_then(|p| p.base_uri()),
        }
    }
}
