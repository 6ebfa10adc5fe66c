//! Diagnostic location strings for nodes.
//!
//! `format_path` walks from the document root down to a node. Documents and
//! modules contribute nothing, a root assembly contributes its name, other
//! assemblies and fields contribute `name[position]` and a flag contributes
//! `@name`. Segments are joined by a single `/`. The result is meant for
//! error messages and is not re-parsed.

use super::{NodeItem, NodeKind};
use core::fmt;
use itertools::Itertools;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Root(String),
    Model { name: String, position: usize },
    Flag(String),
}

impl PathSegment {
    /// Segment contributed by a node, `None` for documents and modules.
    pub fn of<N: NodeItem>(node: &N) -> Option<PathSegment> {
        let name = node.name().map(|q| q.lexical()).unwrap_or_default();
        match node.kind() {
            NodeKind::Document | NodeKind::Module => None,
            NodeKind::RootAssembly => Some(PathSegment::Root(name)),
            NodeKind::Assembly | NodeKind::Field => Some(PathSegment::Model {
                name,
                position: node.position(),
            }),
            NodeKind::Flag => Some(PathSegment::Flag(name)),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Root(name) => f.write_str(name),
            PathSegment::Model { name, position } => write!(f, "{name}[{position}]"),
            PathSegment::Flag(name) => write!(f, "@{name}"),
        }
    }
}

/// Immutable list of segments; `push` and `pop` return new paths and share
/// the unchanged prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationPath {
    last: Option<Arc<Link>>,
}

#[derive(Debug, PartialEq, Eq)]
struct Link {
    segment: PathSegment,
    prev: Option<Arc<Link>>,
}

impl LocationPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, segment: PathSegment) -> LocationPath {
        LocationPath {
            last: Some(Arc::new(Link {
                segment,
                prev: self.last.clone(),
            })),
        }
    }

    /// The path without its last segment, or `None` when empty.
    pub fn pop(&self) -> Option<LocationPath> {
        self.last.as_ref().map(|link| LocationPath {
            last: link.prev.clone(),
        })
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.last.as_deref().map(|l| &l.segment)
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Segments from the root down.
    pub fn segments(&self) -> Vec<&PathSegment> {
        let mut out = Vec::new();
        let mut cur = self.last.as_deref();
        while let Some(link) = cur {
            out.push(&link.segment);
            cur = link.prev.as_deref();
        }
        out.reverse();
        out
    }

    pub fn of<N: NodeItem>(node: &N) -> LocationPath {
        let mut chain = vec![node.clone()];
        let mut cur = node.clone();
        while let Some(parent) = cur.parent() {
            chain.push(parent.clone());
            cur = parent;
        }
        chain
            .iter()
            .rev()
            .filter_map(PathSegment::of)
            .fold(LocationPath::new(), |path, seg| path.push(seg))
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().into_iter().join("/"))
    }
}

pub fn format_path<N: NodeItem>(node: &N) -> String {
    LocationPath::of(node).to_string()
}
