//! Child, ancestor, and reverse iteration
//!
//! Three iterators back the engine's walks and the scope-sensitive lookups
//! layered on top of it. All of them signal exhaustion through `Option`,
//! never through an error path, and all of them terminate explicitly at the
//! root sentinel.

use crate::context::BuildContext;
use crate::tree::{FieldValue, Item, NodeRef};
use std::rc::Rc;

// ============================================================================
// CHILD ITERATION
// ============================================================================

/// Iterates the `(field, item)` pairs of a node: declared fields in schema
/// order, list elements in order. Empty optional scalars yield nothing.
#[derive(Debug, Clone)]
pub struct ChildIter {
    node: NodeRef,
    field: usize,
    index: usize,
}

impl ChildIter {
    pub fn new(node: NodeRef) -> Self {
        ChildIter {
            node,
            field: 0,
            index: 0,
        }
    }
}

impl Iterator for ChildIter {
    type Item = (String, Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let field = self.node.fields().get(self.field)?;
            match &field.value {
                FieldValue::Scalar(slot) => {
                    let name = field.name.clone();
                    let item = slot.clone();
                    self.field += 1;
                    if let Some(item) = item {
                        return Some((name, item));
                    }
                }
                FieldValue::List(items) => {
                    if self.index < items.len() {
                        let pair = (field.name.clone(), items[self.index].clone());
                        self.index += 1;
                        return Some(pair);
                    }
                    self.field += 1;
                    self.index = 0;
                }
            }
        }
    }
}

// ============================================================================
// ANCESTOR ITERATION
// ============================================================================

/// Yields a context, then its parent, and so on up to the root sentinel.
#[derive(Debug)]
pub struct Ancestors {
    next: Option<Rc<BuildContext>>,
}

impl Ancestors {
    pub fn new(start: Rc<BuildContext>) -> Self {
        Ancestors { next: Some(start) }
    }
}

impl Iterator for Ancestors {
    type Item = Rc<BuildContext>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent().cloned();
        Some(current)
    }
}

// ============================================================================
// REVERSE ITERATION
// ============================================================================

/// Yields, nearest-first, everything that appears textually before a
/// context's node, scanning outward through enclosing scopes.
///
/// At each level the elder siblings (the items before this node among its
/// parent's children, in declared order) are produced in reverse, paired with
/// the parent context that owns them; the iteration then continues with the
/// parent's own reverse sequence. A context with no parent, or whose parent
/// is a synthetic sentinel without an original node, contributes nothing:
/// the root case is an explicit terminal condition.
///
/// This ordering is what scope-sensitive lookups ("the nearest prior binding
/// of a name") are built on.
#[derive(Debug)]
pub struct ReverseIter {
    cursor: Option<Rc<BuildContext>>,
    pending: std::vec::IntoIter<(Rc<BuildContext>, Item)>,
}

impl ReverseIter {
    pub fn new(start: Rc<BuildContext>) -> Self {
        ReverseIter {
            cursor: Some(start),
            pending: Vec::new().into_iter(),
        }
    }

    /// Moves the cursor up one or more levels until a level with elder
    /// siblings is found. Returns false once the root is reached.
    fn climb(&mut self) -> bool {
        loop {
            let Some(ctx) = self.cursor.take() else {
                return false;
            };
            let Some(parent) = ctx.parent().cloned() else {
                return false;
            };
            self.cursor = Some(Rc::clone(&parent));
            let Some(node) = ctx.original() else {
                return false;
            };
            let Some(parent_node) = parent.original().cloned() else {
                // Sentinel parent: no siblings there, keep climbing.
                continue;
            };
            let id = node.id();
            let mut elders = Vec::new();
            let mut found = false;
            for (_field, item) in ChildIter::new(parent_node) {
                if item.node_id() == Some(id) {
                    found = true;
                    break;
                }
                elders.push((Rc::clone(&parent), item));
            }
            if !found {
                elders.clear();
            }
            if !elders.is_empty() {
                elders.reverse();
                self.pending = elders.into_iter();
                return true;
            }
        }
    }
}

impl Iterator for ReverseIter {
    type Item = (Rc<BuildContext>, Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.pending.next() {
                return Some(pair);
            }
            if !self.climb() {
                return None;
            }
        }
    }
}
