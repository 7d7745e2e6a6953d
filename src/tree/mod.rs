//! Tree data model for the Arbor engine
//!
//! This module provides the immutable, typed node record at the heart of the
//! engine: a [`Node`] is a kind tag plus an ordered set of named fields, each
//! holding either a single child or an ordered list of children. Nodes are
//! never mutated once constructed; rebuilding always produces new nodes.
//!
//! Every node carries a [`NodeId`] minted from a process-wide counter at
//! creation. Identity-sensitive operations (child lookup during `push`,
//! `get_pos`, action-log creation tags) match on this id, never on structural
//! equality. Structural equality (`PartialEq`) ignores ids and exists for
//! whole-tree comparison in tests and callers.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub mod literal;

pub use literal::Literal;

/// Canonical shared-ownership handle for nodes. Trees share subtrees freely;
/// a rebuild clones handles, not nodes.
pub type NodeRef = Arc<Node>;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Stable identity of a node, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Mints a fresh, process-unique id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    /// A default id is a fresh id. Deserialized nodes rely on this: ids are
    /// skipped during serialization and re-minted on the way back in.
    fn default() -> Self {
        NodeId::fresh()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One child position: either a nested node or an atomic literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Node(NodeRef),
    Literal(Literal),
}

impl Item {
    /// Wraps a node handle as a child item.
    pub fn node(node: NodeRef) -> Self {
        Item::Node(node)
    }

    /// Wraps any literal-convertible value as a child item.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbor::tree::{Item, Literal};
    /// assert_eq!(Item::literal(3.0), Item::Literal(Literal::Number(3.0)));
    /// assert_eq!(Item::literal("x"), Item::Literal(Literal::String("x".into())));
    /// ```
    pub fn literal(value: impl Into<Literal>) -> Self {
        Item::Literal(value.into())
    }

    /// Returns the node handle if this item is a node.
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Item::Node(n) => Some(n),
            Item::Literal(_) => None,
        }
    }

    /// Returns the literal if this item is a literal.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Item::Node(_) => None,
            Item::Literal(v) => Some(v),
        }
    }

    /// Returns the identity of the contained node, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        self.as_node().map(|n| n.id())
    }

    fn pretty(&self) -> String {
        match self {
            Item::Node(n) => n.pretty(),
            Item::Literal(v) => v.to_string(),
        }
    }
}

impl From<Literal> for Item {
    fn from(value: Literal) -> Self {
        Item::Literal(value)
    }
}

impl From<NodeRef> for Item {
    fn from(node: NodeRef) -> Self {
        Item::Node(node)
    }
}

/// The value stored at one declared field of a node.
///
/// A scalar field holds at most one item; `None` means an optional scalar was
/// left empty. A list field holds items in placement order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Scalar(Option<Item>),
    List(Vec<Item>),
}

/// A named field with its value, in schema declaration order on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// An immutable, typed tree node: a kind tag plus named fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(skip)]
    id: NodeId,
    kind: String,
    fields: Vec<Field>,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Node {
    /// Creates a node with a fresh identity. Fields are stored in the order
    /// given, which callers are expected to keep aligned with the kind's
    /// schema declaration order.
    pub fn new(kind: impl Into<String>, fields: Vec<Field>) -> NodeRef {
        Arc::new(Node {
            id: NodeId::fresh(),
            kind: kind.into(),
            fields,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field value by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Returns the item in a scalar field, if the field exists and is filled.
    pub fn scalar(&self, name: &str) -> Option<&Item> {
        match self.field(name)? {
            FieldValue::Scalar(item) => item.as_ref(),
            FieldValue::List(_) => None,
        }
    }

    /// Returns the items of a list field, if the field exists and is a list.
    pub fn list(&self, name: &str) -> Option<&[Item]> {
        match self.field(name)? {
            FieldValue::Scalar(_) => None,
            FieldValue::List(items) => Some(items),
        }
    }

    /// Pretty-prints the node as a compact one-line form.
    ///
    /// Unfilled optional scalars are omitted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbor::tree::{Field, FieldValue, Item, Node};
    /// let name = Node::new(
    ///     "Name",
    ///     vec![Field {
    ///         name: "id".to_string(),
    ///         value: FieldValue::Scalar(Some(Item::literal("x"))),
    ///     }],
    /// );
    /// assert_eq!(name.pretty(), "Name(id: \"x\")");
    /// ```
    pub fn pretty(&self) -> String {
        let mut parts = Vec::new();
        for field in &self.fields {
            match &field.value {
                FieldValue::Scalar(None) => continue,
                FieldValue::Scalar(Some(item)) => {
                    parts.push(format!("{}: {}", field.name, item.pretty()));
                }
                FieldValue::List(items) => {
                    let inner = items
                        .iter()
                        .map(Item::pretty)
                        .collect::<Vec<_>>()
                        .join(", ");
                    parts.push(format!("{}: [{}]", field.name, inner));
                }
            }
        }
        format!("{}({})", self.kind, parts.join(", "))
    }
}

/// Structural equality: same kind, same fields, same order. Ids are ignored,
/// so a rebuilt tree compares equal to its source.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.fields == other.fields
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}
