//! Arena-backed AST for parsed JTD schemas.
//!
//! Nodes are owned by `Ast` and addressed by `NodeId`. The parent
//! back-reference is a plain index, assigned once at allocation and never
//! reassigned, so ignoring `Ref` indirection the node graph is a tree.
//! Cycles are only expressible through `Ref`, and codegen never follows a
//! `Ref` structurally (it emits a call and stops), so traversal always
//! terminates.

use indexmap::IndexMap;
use serde_json::Value;

/// The eleven RFC 8927 type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    String,
    Timestamp,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
}

impl Primitive {
    pub fn parse(tag: &str) -> Option<Primitive> {
        match tag {
            "boolean" => Some(Primitive::Boolean),
            "string" => Some(Primitive::String),
            "timestamp" => Some(Primitive::Timestamp),
            "float32" => Some(Primitive::Float32),
            "float64" => Some(Primitive::Float64),
            "int8" => Some(Primitive::Int8),
            "uint8" => Some(Primitive::Uint8),
            "int16" => Some(Primitive::Int16),
            "uint16" => Some(Primitive::Uint16),
            "int32" => Some(Primitive::Int32),
            "uint32" => Some(Primitive::Uint32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Timestamp => "timestamp",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Int8 => "int8",
            Primitive::Uint8 => "uint8",
            Primitive::Int16 => "int16",
            Primitive::Uint16 => "uint16",
            Primitive::Int32 => "int32",
            Primitive::Uint32 => "uint32",
        }
    }

    /// Closed range for the integer family; `None` for everything else.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Primitive::Int8 => Some((-128, 127)),
            Primitive::Uint8 => Some((0, 255)),
            Primitive::Int16 => Some((-32768, 32767)),
            Primitive::Uint16 => Some((0, 65535)),
            Primitive::Int32 => Some((-2147483648, 2147483647)),
            Primitive::Uint32 => Some((0, 4294967295)),
            _ => None,
        }
    }
}

/// Index into the owning `Ast`'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Any,
    Ref {
        target: String,
    },
    Nullable {
        inner: NodeId,
    },
    Type {
        primitive: Primitive,
    },
    /// Ordered, unique member strings.
    Enum {
        values: Vec<String>,
    },
    Elements {
        inner: NodeId,
    },
    Values {
        inner: NodeId,
    },
    Object {
        properties: Vec<(String, NodeId)>,
        optional_properties: Vec<(String, NodeId)>,
    },
    /// Every mapping arm is an `Object` node, enforced by the builder.
    Union {
        discriminator: String,
        mapping: Vec<(String, NodeId)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Metadata from the originating schema; `description` feeds doc comments.
    pub metadata: IndexMap<String, Value>,
}

impl Node {
    /// Non-empty documentation text carried in `metadata.description`.
    pub fn description(&self) -> Option<&str> {
        self.metadata
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    /// Definition table; insertion order fixes emission order.
    pub definitions: IndexMap<String, NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node slot with its parent link fixed. The kind starts as
    /// `Any` and is filled in by the builder once children exist; the
    /// parent is never touched again.
    pub(crate) fn alloc(
        &mut self,
        parent: Option<NodeId>,
        metadata: IndexMap<String, Value>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind: NodeKind::Any,
            parent,
            metadata,
        });
        id
    }

    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Any, or Nullable-of-unconstrained transitively. Such a node never
    /// fails validation, so validator codegen elides it entirely.
    pub fn is_unconstrained(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Any => true,
            NodeKind::Nullable { inner } => self.is_unconstrained(*inner),
            _ => false,
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
