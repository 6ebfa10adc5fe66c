//! Axis traversal and node tests.
//!
//! Forward axes yield nodes in document order; reverse axes yield the
//! nearest node first, which is the order predicate positions count in.

use crate::model::{NodeItem, NodeKind, QName};
use crate::parser::ast::{Axis, KindTest, NameTest, NodeTest, WildcardName};

/// Nodes reachable from `node` along `axis`, in axis order.
pub fn axis_nodes<N: NodeItem>(node: &N, axis: Axis) -> Vec<N> {
    match axis {
        Axis::Child => node.children(),
        Axis::Flag => node.flags(),
        Axis::SelfAxis => vec![node.clone()],
        Axis::Descendant => {
            let mut out = Vec::new();
            collect_descendants(node, &mut out);
            out
        }
        Axis::DescendantOrSelf => {
            let mut out = vec![node.clone()];
            collect_descendants(node, &mut out);
            out
        }
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node.clone()];
            out.extend(ancestors(node));
            out
        }
        Axis::FollowingSibling => siblings(node)
            .into_iter()
            .skip_while(|s| s != node)
            .skip(1)
            .collect(),
        Axis::PrecedingSibling => {
            let mut before: Vec<N> = siblings(node)
                .into_iter()
                .take_while(|s| s != node)
                .collect();
            before.reverse();
            before
        }
    }
}

// pre-order over model children only; flags are reached through the flag axis
fn collect_descendants<N: NodeItem>(node: &N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

fn ancestors<N: NodeItem>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    let mut cur = node.parent();
    while let Some(p) = cur {
        cur = p.parent();
        out.push(p);
    }
    out
}

fn siblings<N: NodeItem>(node: &N) -> Vec<N> {
    if node.kind() == NodeKind::Flag {
        return Vec::new();
    }
    node.parent().map(|p| p.children()).unwrap_or_default()
}

/// Test `node` reached along `axis` against `test`.
pub fn matches_test<N: NodeItem>(node: &N, axis: Axis, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name_test) => {
            let principal = if axis == Axis::Flag {
                node.kind() == NodeKind::Flag
            } else {
                node.kind().is_model_node()
            };
            principal && matches_name_test(node.name().as_ref(), name_test)
        }
        NodeTest::Kind(kind) => match kind {
            KindTest::AnyKind => true,
            KindTest::Document => matches!(node.kind(), NodeKind::Document | NodeKind::Module),
            KindTest::Assembly(name) => {
                node.kind().is_assembly() && optional_name_matches(node, name.as_ref())
            }
            KindTest::Field(name) => {
                node.kind() == NodeKind::Field && optional_name_matches(node, name.as_ref())
            }
            KindTest::Flag(name) => {
                node.kind() == NodeKind::Flag && optional_name_matches(node, name.as_ref())
            }
        },
    }
}

fn optional_name_matches<N: NodeItem>(node: &N, expected: Option<&QName>) -> bool {
    match expected {
        None => true,
        Some(q) => node.name().as_ref().is_some_and(|n| qname_matches(n, q)),
    }
}

/// An expected name without a namespace matches on the local name alone.
fn qname_matches(actual: &QName, expected: &QName) -> bool {
    actual.local == expected.local
        && match &expected.ns_uri {
            None => true,
            Some(ns) => actual.ns_uri.as_deref() == Some(ns.as_str()),
        }
}

fn matches_name_test(name: Option<&QName>, test: &NameTest) -> bool {
    let Some(name) = name else {
        return false;
    };
    match test {
        NameTest::QName(q) => qname_matches(name, q),
        NameTest::Wildcard(WildcardName::Any) => true,
        NameTest::Wildcard(WildcardName::LocalWildcard(local)) => name.local == *local,
        NameTest::Wildcard(WildcardName::NsWildcard { ns_uri, .. }) => {
            name.ns_uri.as_deref() == ns_uri.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::simple::{assembly, doc, field, flag, root_assembly};

    fn sample() -> crate::model::simple::SimpleNode {
        doc()
            .child(
                root_assembly("catalog")
                    .flag(flag("id", "c1"))
                    .child(assembly("group").child(field("title", "A")))
                    .child(field("title", "B"))
                    .child(field("remark", "C")),
            )
            .build()
    }

    #[test]
    fn descendant_is_pre_order() {
        let d = sample();
        let names: Vec<String> = axis_nodes(&d, Axis::Descendant)
            .iter()
            .filter_map(|n| n.name().map(|q| q.local))
            .collect();
        assert_eq!(names, ["catalog", "group", "title", "title", "remark"]);
    }

    #[test]
    fn preceding_sibling_is_nearest_first() {
        let d = sample();
        let remark = d.children()[0].children()[2].clone();
        let names: Vec<String> = axis_nodes(&remark, Axis::PrecedingSibling)
            .iter()
            .filter_map(|n| n.name().map(|q| q.local))
            .collect();
        assert_eq!(names, ["title", "group"]);
    }

    #[test]
    fn name_test_follows_principal_kind() {
        let d = sample();
        let catalog = d.children()[0].clone();
        let id = catalog.flags()[0].clone();
        let test = NodeTest::Name(NameTest::QName(QName::local("id")));
        assert!(matches_test(&id, Axis::Flag, &test));
        assert!(!matches_test(&id, Axis::SelfAxis, &test));
    }
}
