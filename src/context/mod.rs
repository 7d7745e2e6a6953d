//! Builder contexts for the Arbor engine
//!
//! A [`BuildContext`] is the mutable, short-lived construction-in-progress
//! counterpart to one immutable node. It holds a back-reference to the
//! enclosing context, the original node being mirrored (none for a synthetic
//! root), and one storage slot per declared field of its kind's schema.
//!
//! ## Invariants
//! - The parent link is set once at creation and never changes.
//! - Parent links run child -> parent only. There are no back edges, so the
//!   chain is acyclic and the contexts for one traversal are freed when the
//!   last handle drops.
//! - A scalar slot is filled at most once; a list slot accumulates in
//!   placement order.
//! - `construct` is only meaningful once no further `place` calls are
//!   expected; it is idempotent and does not consume the slots, so a caller
//!   may construct a provisional node, adjust slots, and construct again.

// ============================================================================
// IMPORTS
// ============================================================================

use crate::diagnostics::{ArborError, ArborResult};
use crate::schema::{FieldArity, Schema};
use crate::tree::{Field, FieldValue, Item, Node, NodeRef};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub mod iter;
pub mod registry;

pub use iter::{Ancestors, ChildIter, ReverseIter};
pub use registry::{ContextCtor, ContextParts, ContextRegistry};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Per-field storage while a node is under construction.
#[derive(Debug, Clone)]
enum Slot {
    Scalar(Option<Item>),
    List(Vec<Item>),
}

/// The unit of in-progress construction for one node.
///
/// Contexts are materialized through a [`ContextRegistry`] as a traversal
/// descends, mutated by `place` calls as children finish, and discarded once
/// finalized into a constructed node.
#[derive(Debug)]
pub struct BuildContext {
    parent: Option<Rc<BuildContext>>,
    original: Option<NodeRef>,
    schema: Arc<Schema>,
    registry: ContextRegistry,
    slots: RefCell<Vec<Slot>>,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl BuildContext {
    /// The schema-driven default constructor registered for every kind by
    /// [`ContextRegistry::with_default_contexts`]. A specialization can wrap
    /// this and then adjust the fresh context before returning it.
    pub fn from_parts(parts: ContextParts) -> BuildContext {
        let slots = parts
            .schema
            .fields()
            .iter()
            .map(|spec| match spec.arity {
                FieldArity::Scalar { .. } => Slot::Scalar(None),
                FieldArity::List => Slot::List(Vec::new()),
            })
            .collect();
        BuildContext {
            parent: parts.parent,
            original: parts.original,
            schema: parts.schema,
            registry: parts.registry,
            slots: RefCell::new(slots),
        }
    }

    pub fn kind(&self) -> &str {
        self.schema.kind()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The pre-rebuild node this context mirrors, if any. A synthetic root
    /// sentinel has none.
    pub fn original(&self) -> Option<&NodeRef> {
        self.original.as_ref()
    }

    pub fn parent(&self) -> Option<&Rc<BuildContext>> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The registry this context was materialized from.
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Opens a child context for a node that is structurally part of the
    /// original node.
    ///
    /// The child is located by identity (`NodeId`) among the original node's
    /// fields; a value that does not appear there is rejected, which guards
    /// against traversing into something that is not actually attached to
    /// the tree.
    ///
    /// # Errors
    /// Fails if this context has no original node, if the child is not
    /// attached to any declared field, or if the child's kind is not
    /// registered.
    pub fn push(this: &Rc<BuildContext>, child: &NodeRef) -> ArborResult<Rc<BuildContext>> {
        let Some(original) = this.original.as_ref() else {
            return Err(ArborError::ChildNotDeclared {
                kind: this.kind().to_string(),
            });
        };
        if locate(original, &Item::Node(child.clone())).is_none() {
            return Err(ArborError::ChildNotDeclared {
                kind: this.kind().to_string(),
            });
        }
        this.registry
            .make_context(child.kind(), Some(child.clone()), Some(Rc::clone(this)))
    }

    /// Places a value into a field slot.
    ///
    /// List slots append, preserving order; scalar slots are set exactly
    /// once.
    ///
    /// # Errors
    /// Fails for an undeclared field, or for a scalar slot that is already
    /// set.
    pub fn place(&self, field: &str, item: impl Into<Item>) -> ArborResult<()> {
        let idx = self.field_index(field)?;
        let mut slots = self.slots.borrow_mut();
        match &mut slots[idx] {
            Slot::List(items) => items.push(item.into()),
            Slot::Scalar(slot @ None) => *slot = Some(item.into()),
            Slot::Scalar(Some(_)) => {
                return Err(ArborError::FieldAlreadySet {
                    kind: self.kind().to_string(),
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Empties a field slot so it can be placed again.
    ///
    /// This is the escape hatch for transformers that replace an
    /// already-placed child; `place` on its own still enforces the
    /// at-most-once invariant for scalars.
    pub fn clear(&self, field: &str) -> ArborResult<()> {
        let idx = self.field_index(field)?;
        let mut slots = self.slots.borrow_mut();
        match &mut slots[idx] {
            Slot::Scalar(slot) => *slot = None,
            Slot::List(items) => items.clear(),
        }
        Ok(())
    }

    /// Reads the value placed into a scalar slot.
    ///
    /// # Errors
    /// Fails for an undeclared field, for a list field, or for a scalar slot
    /// that has not been placed yet.
    pub fn get(&self, field: &str) -> ArborResult<Item> {
        let idx = self.field_index(field)?;
        let slots = self.slots.borrow();
        match &slots[idx] {
            Slot::Scalar(Some(item)) => Ok(item.clone()),
            Slot::Scalar(None) => Err(ArborError::UnsetField {
                kind: self.kind().to_string(),
                field: field.to_string(),
            }),
            Slot::List(_) => Err(ArborError::WrongArity {
                kind: self.kind().to_string(),
                field: field.to_string(),
                expected: "scalar",
                actual: "list",
            }),
        }
    }

    /// Reads the values accumulated in a list slot, in placement order.
    ///
    /// # Errors
    /// Fails for an undeclared field or a scalar field.
    pub fn items(&self, field: &str) -> ArborResult<Vec<Item>> {
        let idx = self.field_index(field)?;
        let slots = self.slots.borrow();
        match &slots[idx] {
            Slot::List(items) => Ok(items.clone()),
            Slot::Scalar(_) => Err(ArborError::WrongArity {
                kind: self.kind().to_string(),
                field: field.to_string(),
                expected: "list",
                actual: "scalar",
            }),
        }
    }

    /// Synthesizes a new node from the current slot contents, in schema
    /// field order.
    ///
    /// Idempotent: the slots are read, not consumed, so calling twice (once
    /// for a provisional pre-transform node, once for the final node) is
    /// valid.
    ///
    /// # Errors
    /// Fails if a required scalar slot is still empty.
    pub fn construct(&self) -> ArborResult<NodeRef> {
        let slots = self.slots.borrow();
        let mut fields = Vec::with_capacity(slots.len());
        for (spec, slot) in self.schema.fields().iter().zip(slots.iter()) {
            if matches!(spec.arity, FieldArity::Scalar { required: true })
                && matches!(slot, Slot::Scalar(None))
            {
                return Err(ArborError::MissingField {
                    kind: self.kind().to_string(),
                    field: spec.name.clone(),
                });
            }
            let value = match slot {
                Slot::Scalar(item) => FieldValue::Scalar(item.clone()),
                Slot::List(items) => FieldValue::List(items.clone()),
            };
            fields.push(Field {
                name: spec.name.clone(),
                value,
            });
        }
        Ok(Node::new(self.kind(), fields))
    }

    /// Locates which field of the original node holds a given child, and at
    /// which index for list fields.
    ///
    /// Nodes are matched by identity, literals by equality.
    ///
    /// # Errors
    /// Fails if this context has no original node or the child is absent.
    pub fn get_pos(&self, child: &Item) -> ArborResult<(String, Option<usize>)> {
        let Some(original) = self.original.as_ref() else {
            return Err(ArborError::ChildNotOnNode {
                kind: self.kind().to_string(),
            });
        };
        locate(original, child).ok_or_else(|| ArborError::ChildNotOnNode {
            kind: self.kind().to_string(),
        })
    }

    /// Iterates this context, then its parent, up to the root sentinel.
    pub fn ancestors(this: &Rc<BuildContext>) -> Ancestors {
        Ancestors::new(Rc::clone(this))
    }

    /// Iterates everything textually prior to this context's node,
    /// nearest-first, scanning outward through enclosing scopes. See
    /// [`ReverseIter`].
    pub fn reverse_iter(this: &Rc<BuildContext>) -> ReverseIter {
        ReverseIter::new(Rc::clone(this))
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    fn field_index(&self, field: &str) -> ArborResult<usize> {
        self.schema
            .field_index(field)
            .ok_or_else(|| ArborError::UnknownField {
                kind: self.kind().to_string(),
                field: field.to_string(),
            })
    }
}

/// Finds the (field, index) address of a child on a node. Nodes match by
/// identity, literals by equality.
fn locate(node: &NodeRef, child: &Item) -> Option<(String, Option<usize>)> {
    for field in node.fields() {
        match &field.value {
            FieldValue::Scalar(Some(item)) => {
                if items_match(item, child) {
                    return Some((field.name.clone(), None));
                }
            }
            FieldValue::Scalar(None) => {}
            FieldValue::List(items) => {
                if let Some(index) = items.iter().position(|item| items_match(item, child)) {
                    return Some((field.name.clone(), Some(index)));
                }
            }
        }
    }
    None
}

fn items_match(item: &Item, target: &Item) -> bool {
    match (item, target) {
        (Item::Node(a), Item::Node(b)) => a.id() == b.id(),
        (Item::Literal(a), Item::Literal(b)) => a == b,
        _ => false,
    }
}
