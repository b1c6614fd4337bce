//! Generic depth-first traversal shared by every back end.
//!
//! `walk` dispatches one node to the matching `Visitor` method. Composite
//! handlers receive a `Next` token; calling `descend` continues into the
//! children with a handler-chosen context, not calling it prunes the
//! subtree. The engine holds no state of its own, so the type and
//! validator compilers see identical child orderings by construction:
//! object members visit `properties` entries then `optionalProperties`
//! entries in insertion order, union arms visit `mapping` entries in
//! insertion order and then descend into each arm object's own members.

use crate::ast::{Ast, NodeId, NodeKind, Primitive};

/// Continuation into a node's children. Consumed on use.
pub struct Next<'a> {
    ast: &'a Ast,
    edge: Edge,
}

enum Edge {
    /// The single child of Nullable/Elements/Values.
    Node(NodeId),
    /// An object's member entries.
    Members(NodeId),
    /// A union's mapping arms.
    Arms(NodeId),
}

impl<'a> Next<'a> {
    pub fn descend<V: Visitor>(self, visitor: &mut V, cx: V::Cx) {
        match self.edge {
            Edge::Node(id) => walk(self.ast, id, visitor, cx),
            Edge::Members(owner) => {
                let NodeKind::Object {
                    properties,
                    optional_properties,
                } = self.ast.kind(owner)
                else {
                    return;
                };
                for (key, child) in properties {
                    let next = Next {
                        ast: self.ast,
                        edge: Edge::Node(*child),
                    };
                    visitor.property(&cx, owner, key, *child, next);
                }
                for (key, child) in optional_properties {
                    let next = Next {
                        ast: self.ast,
                        edge: Edge::Node(*child),
                    };
                    visitor.optional_property(&cx, owner, key, *child, next);
                }
            }
            Edge::Arms(owner) => {
                let NodeKind::Union { mapping, .. } = self.ast.kind(owner) else {
                    return;
                };
                for (key, arm) in mapping {
                    // an arm's continuation goes straight into the arm
                    // object's own members
                    let next = Next {
                        ast: self.ast,
                        edge: Edge::Members(*arm),
                    };
                    visitor.mapping(&cx, owner, key, *arm, next);
                }
            }
        }
    }
}

/// One handler per node kind plus the per-entry object/union callbacks.
/// Defaults descend with the unchanged context; override to rewrite the
/// context on the way down or to prune.
pub trait Visitor: Sized {
    type Cx: Clone;

    fn any(&mut self, _cx: &Self::Cx, _id: NodeId) {}
    fn reference(&mut self, _cx: &Self::Cx, _id: NodeId, _target: &str) {}
    fn primitive(&mut self, _cx: &Self::Cx, _id: NodeId, _primitive: Primitive) {}
    fn enumeration(&mut self, _cx: &Self::Cx, _id: NodeId, _values: &[String]) {}

    fn nullable(&mut self, cx: &Self::Cx, _id: NodeId, _inner: NodeId, next: Next<'_>) {
        next.descend(self, cx.clone());
    }

    fn elements(&mut self, cx: &Self::Cx, _id: NodeId, _inner: NodeId, next: Next<'_>) {
        next.descend(self, cx.clone());
    }

    fn values(&mut self, cx: &Self::Cx, _id: NodeId, _inner: NodeId, next: Next<'_>) {
        next.descend(self, cx.clone());
    }

    fn object(&mut self, cx: &Self::Cx, _id: NodeId, next: Next<'_>) {
        next.descend(self, cx.clone());
    }

    fn property(
        &mut self,
        cx: &Self::Cx,
        _owner: NodeId,
        _key: &str,
        _node: NodeId,
        next: Next<'_>,
    ) {
        next.descend(self, cx.clone());
    }

    fn optional_property(
        &mut self,
        cx: &Self::Cx,
        _owner: NodeId,
        _key: &str,
        _node: NodeId,
        next: Next<'_>,
    ) {
        next.descend(self, cx.clone());
    }

    fn union(&mut self, cx: &Self::Cx, _id: NodeId, _discriminator: &str, next: Next<'_>) {
        next.descend(self, cx.clone());
    }

    fn mapping(
        &mut self,
        cx: &Self::Cx,
        _owner: NodeId,
        _key: &str,
        _arm: NodeId,
        next: Next<'_>,
    ) {
        next.descend(self, cx.clone());
    }
}

/// Dispatch `id` to the handler matching its kind.
pub fn walk<V: Visitor>(ast: &Ast, id: NodeId, visitor: &mut V, cx: V::Cx) {
    match ast.kind(id) {
        NodeKind::Any => visitor.any(&cx, id),
        NodeKind::Ref { target } => visitor.reference(&cx, id, target),
        NodeKind::Type { primitive } => visitor.primitive(&cx, id, *primitive),
        NodeKind::Enum { values } => visitor.enumeration(&cx, id, values),
        NodeKind::Nullable { inner } => {
            let next = Next {
                ast,
                edge: Edge::Node(*inner),
            };
            visitor.nullable(&cx, id, *inner, next);
        }
        NodeKind::Elements { inner } => {
            let next = Next {
                ast,
                edge: Edge::Node(*inner),
            };
            visitor.elements(&cx, id, *inner, next);
        }
        NodeKind::Values { inner } => {
            let next = Next {
                ast,
                edge: Edge::Node(*inner),
            };
            visitor.values(&cx, id, *inner, next);
        }
        NodeKind::Object { .. } => {
            let next = Next {
                ast,
                edge: Edge::Members(id),
            };
            visitor.object(&cx, id, next);
        }
        NodeKind::Union { discriminator, .. } => {
            let next = Next {
                ast,
                edge: Edge::Arms(id),
            };
            visitor.union(&cx, id, discriminator, next);
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_root;
    use crate::schema::SchemaDef;
    use serde_json::json;

    fn ast_of(v: serde_json::Value) -> Ast {
        let def: SchemaDef = serde_json::from_value(v).expect("schema fixture");
        let mut ast = Ast::new();
        build_root(&mut ast, "root", &def).expect("builds");
        ast
    }

    /// Records one line per visit; context is the nesting depth.
    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        prune_elements: bool,
    }

    impl Visitor for Trace {
        type Cx = usize;

        fn any(&mut self, depth: &usize, _id: NodeId) {
            self.events.push(format!("{depth}:any"));
        }

        fn primitive(&mut self, depth: &usize, _id: NodeId, primitive: Primitive) {
            self.events.push(format!("{depth}:type {}", primitive.as_str()));
        }

        fn elements(&mut self, depth: &usize, _id: NodeId, _inner: NodeId, next: Next<'_>) {
            self.events.push(format!("{depth}:elements"));
            if !self.prune_elements {
                next.descend(self, depth + 1);
            }
        }

        fn object(&mut self, depth: &usize, _id: NodeId, next: Next<'_>) {
            self.events.push(format!("{depth}:object"));
            next.descend(self, depth + 1);
        }

        fn property(
            &mut self,
            depth: &usize,
            _owner: NodeId,
            key: &str,
            _node: NodeId,
            next: Next<'_>,
        ) {
            self.events.push(format!("{depth}:prop {key}"));
            next.descend(self, *depth);
        }

        fn optional_property(
            &mut self,
            depth: &usize,
            _owner: NodeId,
            key: &str,
            _node: NodeId,
            next: Next<'_>,
        ) {
            self.events.push(format!("{depth}:opt {key}"));
            next.descend(self, *depth);
        }

        fn union(&mut self, depth: &usize, _id: NodeId, discriminator: &str, next: Next<'_>) {
            self.events.push(format!("{depth}:union {discriminator}"));
            next.descend(self, depth + 1);
        }

        fn mapping(
            &mut self,
            depth: &usize,
            _owner: NodeId,
            key: &str,
            _arm: NodeId,
            next: Next<'_>,
        ) {
            self.events.push(format!("{depth}:arm {key}"));
            next.descend(self, *depth);
        }
    }

    #[test]
    fn object_members_visit_required_then_optional_in_insertion_order() {
        let ast = ast_of(json!({
            "properties": { "z": { "type": "string" }, "a": { "type": "boolean" } },
            "optionalProperties": { "m": {} }
        }));
        let mut trace = Trace::default();
        walk(&ast, ast.definitions["root"], &mut trace, 0);
        assert_eq!(
            trace.events,
            [
                "0:object",
                "1:prop z",
                "1:type string",
                "1:prop a",
                "1:type boolean",
                "1:opt m",
                "1:any",
            ]
        );
    }

    #[test]
    fn union_arms_descend_into_arm_members() {
        let ast = ast_of(json!({
            "discriminator": "kind",
            "mapping": {
                "b": { "properties": { "x": { "type": "int8" } } },
                "a": { "properties": {} }
            }
        }));
        let mut trace = Trace::default();
        walk(&ast, ast.definitions["root"], &mut trace, 0);
        assert_eq!(
            trace.events,
            ["0:union kind", "1:arm b", "1:prop x", "1:type int8", "1:arm a",]
        );
    }

    #[test]
    fn skipping_descend_prunes_the_subtree() {
        let ast = ast_of(json!({ "elements": { "type": "string" } }));
        let mut trace = Trace {
            prune_elements: true,
            ..Trace::default()
        };
        walk(&ast, ast.definitions["root"], &mut trace, 0);
        assert_eq!(trace.events, ["0:elements"]);
    }
}
