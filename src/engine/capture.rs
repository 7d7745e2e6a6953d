//!
//! Predicate-filtered post-order search over a tree.
//!
//! `capture` walks the same iterative shape as `rebuild`, but contexts exist
//! purely to give the predicate typed field access — nothing is synthesized
//! and nothing is placed. The result is a lazy, finite, single-pass sequence
//! of `(context, node)` matches in post-order. It is not restartable; a
//! fresh call re-walks from the root.

use crate::context::{BuildContext, ChildIter, ContextRegistry};
use crate::diagnostics::ArborResult;
use crate::tree::{Item, NodeRef};
use std::rc::Rc;

/// One level of the walk: a context and its remaining children.
struct Level {
    ctx: Rc<BuildContext>,
    children: ChildIter,
}

/// Lazy post-order match sequence produced by [`capture`] and
/// [`capture_with_stop`].
///
/// Yields `Ok((context, node))` for every finished node the predicate
/// accepts. A traversal error (an unregistered kind encountered mid-walk)
/// is yielded once as `Err` and ends the sequence.
pub struct Capture<P, S = fn(&Rc<BuildContext>, &NodeRef) -> bool> {
    predicate: P,
    stop: Option<S>,
    stack: Vec<Level>,
    cur: Option<Level>,
    done: bool,
}

/// Searches a tree for nodes matching a predicate, post-order.
///
/// # Errors
/// Fails immediately if the root's kind is not registered.
pub fn capture<P>(
    registry: &ContextRegistry,
    root: &NodeRef,
    predicate: P,
) -> ArborResult<Capture<P>>
where
    P: FnMut(&Rc<BuildContext>, &NodeRef) -> bool,
{
    Ok(Capture {
        predicate,
        stop: None,
        stack: Vec::new(),
        cur: Some(Level {
            ctx: registry.context_for(root)?,
            children: ChildIter::new(root.clone()),
        }),
        done: false,
    })
}

/// Like [`capture`], with a stop cutoff bounding the search.
///
/// `stop` is consulted when a node finishes, before the predicate sees it; a
/// true result halts the entire traversal immediately, so the stop node and
/// everything after it in post-order yield nothing. Used to keep a search
/// from crossing into an enclosing scope.
pub fn capture_with_stop<P, S>(
    registry: &ContextRegistry,
    root: &NodeRef,
    predicate: P,
    stop: S,
) -> ArborResult<Capture<P, S>>
where
    P: FnMut(&Rc<BuildContext>, &NodeRef) -> bool,
    S: FnMut(&Rc<BuildContext>, &NodeRef) -> bool,
{
    Ok(Capture {
        predicate,
        stop: Some(stop),
        stack: Vec::new(),
        cur: Some(Level {
            ctx: registry.context_for(root)?,
            children: ChildIter::new(root.clone()),
        }),
        done: false,
    })
}

impl<P, S> Iterator for Capture<P, S>
where
    P: FnMut(&Rc<BuildContext>, &NodeRef) -> bool,
    S: FnMut(&Rc<BuildContext>, &NodeRef) -> bool,
{
    type Item = ArborResult<(Rc<BuildContext>, NodeRef)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(mut level) = self.cur.take() else {
                self.done = true;
                return None;
            };
            match level.children.next() {
                // Descend into a nested node.
                Some((_field, Item::Node(child))) => {
                    let next = match BuildContext::push(&level.ctx, &child) {
                        Ok(ctx) => ctx,
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    };
                    self.stack.push(level);
                    self.cur = Some(Level {
                        ctx: next,
                        children: ChildIter::new(child),
                    });
                }
                // Literals are not candidate matches.
                Some((_field, Item::Literal(_))) => {
                    self.cur = Some(level);
                }
                // Node finished: cutoff check, then offer it to the predicate.
                None => {
                    let ctx = level.ctx;
                    // Capture contexts always mirror an original node.
                    let Some(node) = ctx.original().cloned() else {
                        self.done = true;
                        return None;
                    };
                    self.cur = self.stack.pop();
                    if let Some(stop) = self.stop.as_mut() {
                        if stop(&ctx, &node) {
                            self.done = true;
                            return None;
                        }
                    }
                    if (self.predicate)(&ctx, &node) {
                        return Some(Ok((ctx, node)));
                    }
                }
            }
        }
    }
}
