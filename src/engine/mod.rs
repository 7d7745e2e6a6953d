//!
//! The traversal engine: two iterative, stack-based depth-first walks over
//! immutable trees. `rebuild` reconstructs a tree post-order through a
//! transformer; [`capture`](capture::capture) searches one post-order with a
//! predicate and an optional stop cutoff.
//!
//! Both walks use an explicit frame stack rather than native recursion, so
//! trees of unbounded depth cannot exhaust the call stack. Exhaustion of a
//! child iterator is an ordinary `None`, checked by the loop, never an error
//! path. Each call owns its own stack and its own chain of contexts; the
//! registries are the only state shared across calls.

use crate::context::{BuildContext, ChildIter, ContextRegistry};
use crate::diagnostics::ArborResult;
use crate::tree::{Item, NodeRef};
use std::rc::Rc;

pub mod capture;

pub use capture::{capture, capture_with_stop, Capture};

/// A suspended parent waiting for a child subtree to finish.
struct Frame {
    ctx: Rc<BuildContext>,
    field: String,
    children: ChildIter,
}

/// Rebuilds a tree node-by-node through a transformer, post-order.
///
/// The transformer for a node runs exactly once, strictly after the
/// transformers for all of that node's descendants have run and their
/// results have been placed into this node's slots. It receives the node's
/// context together with a provisional construction of the node, may inspect
/// or adjust the context's slots, and returns the context from which the
/// final node is constructed. Rebuilding never mutates the input tree; it
/// always produces new nodes.
///
/// The identity transformer `|ctx, _| Ok(ctx)` reproduces the input tree.
///
/// # Errors
/// Fails on unregistered kinds, on invariant violations raised by the
/// transformer's own slot adjustments, and on anything the transformer
/// itself returns as an error.
pub fn rebuild<F>(
    registry: &ContextRegistry,
    root: &NodeRef,
    mut transformer: F,
) -> ArborResult<NodeRef>
where
    F: FnMut(Rc<BuildContext>, NodeRef) -> ArborResult<Rc<BuildContext>>,
{
    let mut cur = registry.context_for(root)?;
    let mut children = ChildIter::new(root.clone());
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match children.next() {
            // A nested node: suspend this frame and descend.
            Some((field, Item::Node(child))) => {
                let next = BuildContext::push(&cur, &child)?;
                let next_children = ChildIter::new(child);
                stack.push(Frame {
                    ctx: cur,
                    field,
                    children,
                });
                cur = next;
                children = next_children;
            }
            // A literal: place it immediately, keeping list order intact.
            Some((field, item @ Item::Literal(_))) => {
                cur.place(&field, item)?;
            }
            // This node is finished: transform, finalize, resume the parent.
            None => {
                let provisional = cur.construct()?;
                let finished = transformer(cur, provisional)?;
                let node = finished.construct()?;
                let Some(frame) = stack.pop() else {
                    return Ok(node);
                };
                cur = frame.ctx;
                children = frame.children;
                cur.place(&frame.field, Item::Node(node))?;
            }
        }
    }
}
