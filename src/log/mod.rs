//! Action log: a replayable, truncatable record of construction steps
//!
//! Instead of applying construction directly, a caller may record it: nodes
//! are built by first opening a template with `create`, emplacing details
//! onto it with `emplace`, and closing it out with `commit`. Replaying the
//! recorded chain with `execute` produces the same result as a direct
//! traversal would, and the chain can be truncated at any node it produced
//! (`revert`) and continued differently without repeating the
//! already-validated prefix of the build.
//!
//! Entries form a linked chain stored in an arena with explicit neighbor
//! indices. `revert` severs the chain after the located entry; the discarded
//! slots stay in the arena as garbage, which keeps entry ids stable for the
//! life of the log. Entries are never mutated after creation, only discarded
//! en masse by truncation. A log is owned by exactly one in-progress build:
//! it lives for a single session and is single-writer.

// ============================================================================
// IMPORTS
// ============================================================================

use crate::context::{BuildContext, ContextRegistry};
use crate::diagnostics::{ArborError, ArborResult};
use crate::tree::{Item, Literal, NodeId, NodeRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Index of an entry in the log's arena. Stable for the life of the log.
pub type EntryId = usize;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// One discrete construction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Opens a nested frame for a child of the given kind, to be attached at
    /// the given field of the node under construction when committed.
    CreateChild { field: String, kind: String },
    /// Places a literal onto a field of the node under construction.
    EmplaceLiteral { field: String, value: Literal },
    /// Closes the most recently opened frame and attaches its finished node
    /// onto the parent's recorded field.
    CommitChild,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateChild { field, kind } => write!(f, "create {}: {}", field, kind),
            Action::EmplaceLiteral { field, value } => write!(f, "emplace {} = {}", field, value),
            Action::CommitChild => write!(f, "commit"),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    action: Action,
    /// Nesting depth at which the entry was recorded; a create is tagged
    /// with its parent's depth + 1.
    depth: usize,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

/// A replayable, truncatable construction log rooted at one node kind.
#[derive(Debug)]
pub struct ActionLog {
    registry: ContextRegistry,
    root_kind: String,
    entries: Vec<Entry>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    /// Frames opened but not yet committed at the chain's tail.
    open: usize,
    /// Identity tags: which entry's replay produced which node.
    created: HashMap<NodeId, EntryId>,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl ActionLog {
    /// Creates an empty log whose replay synthesizes a root of `root_kind`.
    ///
    /// # Errors
    /// Fails if the root kind is not registered.
    pub fn new(registry: ContextRegistry, root_kind: &str) -> ArborResult<Self> {
        registry.schemas().get(root_kind)?;
        Ok(ActionLog {
            registry,
            root_kind: root_kind.to_string(),
            entries: Vec::new(),
            head: None,
            tail: None,
            open: 0,
            created: HashMap::new(),
        })
    }

    pub fn root_kind(&self) -> &str {
        &self.root_kind
    }

    /// Appends a create step: opens a nested frame for a child of `kind` at
    /// `field` of the node currently under construction.
    ///
    /// # Errors
    /// Fails if the kind is not registered.
    pub fn create(&mut self, field: &str, kind: &str) -> ArborResult<EntryId> {
        self.registry.schemas().get(kind)?;
        self.open += 1;
        let depth = self.open;
        Ok(self.append(
            Action::CreateChild {
                field: field.to_string(),
                kind: kind.to_string(),
            },
            depth,
        ))
    }

    /// Appends an emplace step: places a literal onto a field of the node
    /// currently under construction. Does not change depth.
    pub fn emplace(&mut self, field: &str, value: impl Into<Literal>) -> EntryId {
        self.append(
            Action::EmplaceLiteral {
                field: field.to_string(),
                value: value.into(),
            },
            self.open,
        )
    }

    /// Appends a commit step, closing the most recently opened frame.
    ///
    /// # Errors
    /// Fails with an unbalanced-build error when no frame is open. This is
    /// caught at record time, not replay time.
    pub fn commit(&mut self) -> ArborResult<EntryId> {
        if self.open == 0 {
            return Err(ArborError::UnbalancedBuild);
        }
        self.open -= 1;
        Ok(self.append(Action::CommitChild, self.open))
    }

    /// Replays the full chain, first to last, and returns the synthesized
    /// root.
    ///
    /// Each node constructed for a create entry is tagged with that entry's
    /// id, enabling [`edit`](Self::edit) and [`revert`](Self::revert) to
    /// locate "the step that produced this node" later.
    ///
    /// # Errors
    /// Fails on unregistered kinds, on field invariant violations, and if
    /// frames remain open at the end of the chain.
    pub fn execute(&mut self) -> ArborResult<NodeRef> {
        let mut cur = self.registry.root_context(&self.root_kind)?;
        let mut stack: Vec<(Rc<BuildContext>, EntryId)> = Vec::new();
        let mut cursor = self.head;

        while let Some(id) = cursor {
            let action = self.entries[id].action.clone();
            cursor = self.entries[id].next;
            match action {
                Action::CreateChild { kind, .. } => {
                    let child = self
                        .registry
                        .make_context(&kind, None, Some(Rc::clone(&cur)))?;
                    stack.push((cur, id));
                    cur = child;
                }
                Action::EmplaceLiteral { field, value } => {
                    cur.place(&field, Item::Literal(value))?;
                }
                Action::CommitChild => {
                    // Record-time depth tracking keeps the chain balanced, so
                    // a frame is always open here.
                    let Some((parent, create_id)) = stack.pop() else {
                        return Err(ArborError::UnbalancedBuild);
                    };
                    let node = cur.construct()?;
                    self.created.insert(node.id(), create_id);
                    let Action::CreateChild { field, .. } = self.entries[create_id].action.clone()
                    else {
                        return Err(ArborError::UnbalancedBuild);
                    };
                    parent.place(&field, Item::Node(node))?;
                    cur = parent;
                }
            }
        }

        if !stack.is_empty() {
            return Err(ArborError::UnfinishedBuild { open: stack.len() });
        }
        cur.construct()
    }

    /// Locates the create entry whose replay produced `node`.
    ///
    /// # Errors
    /// Fails for a node this log never produced — a node from a different or
    /// unrelated build session has no creation tag here.
    pub fn edit(&self, node: &NodeRef) -> ArborResult<EntryId> {
        self.created
            .get(&node.id())
            .copied()
            .ok_or_else(|| ArborError::NoCreationRecord {
                kind: node.kind().to_string(),
            })
    }

    /// Truncates the chain immediately after the entry that produced `node`,
    /// discarding everything recorded afterward, and returns the id of the
    /// chain's first entry.
    ///
    /// New `create`/`emplace`/`commit` calls may then be appended to try a
    /// different continuation without repeating the surviving prefix.
    ///
    /// # Errors
    /// Fails for a node this log never produced.
    pub fn revert(&mut self, node: &NodeRef) -> ArborResult<EntryId> {
        let at = self.edit(node)?;

        // Unlink the suffix and drop the creation tags that pointed into it.
        let mut dropped: HashSet<EntryId> = HashSet::new();
        let mut cursor = self.entries[at].next;
        while let Some(id) = cursor {
            dropped.insert(id);
            cursor = self.entries[id].next;
        }
        self.entries[at].next = None;
        self.tail = Some(at);
        if !dropped.is_empty() {
            self.created.retain(|_, entry| !dropped.contains(entry));
        }

        // Recount open frames over the surviving prefix. A prefix of a chain
        // that was balanced at record time never underflows.
        let mut open = 0usize;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            match self.entries[id].action {
                Action::CreateChild { .. } => open += 1,
                Action::CommitChild => open = open.saturating_sub(1),
                Action::EmplaceLiteral { .. } => {}
            }
            cursor = self.entries[id].next;
        }
        self.open = open;

        Ok(self.head.unwrap_or(at))
    }

    /// Id of the chain's first entry, if any.
    pub fn first(&self) -> Option<EntryId> {
        self.head
    }

    /// Id of the chain's last entry, if any.
    pub fn last(&self) -> Option<EntryId> {
        self.tail
    }

    /// The action recorded at an entry, if the id is in the arena.
    pub fn action(&self, id: EntryId) -> Option<&Action> {
        self.entries.get(id).map(|entry| &entry.action)
    }

    /// The nesting depth an entry was recorded at.
    pub fn depth(&self, id: EntryId) -> Option<usize> {
        self.entries.get(id).map(|entry| entry.depth)
    }

    /// The entry preceding `id` in the chain.
    pub fn prev(&self, id: EntryId) -> Option<EntryId> {
        self.entries.get(id).and_then(|entry| entry.prev)
    }

    /// The entry following `id` in the chain.
    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        self.entries.get(id).and_then(|entry| entry.next)
    }

    /// Number of frames currently open at the chain's tail.
    pub fn open_frames(&self) -> usize {
        self.open
    }

    /// Number of live entries in the chain.
    pub fn len(&self) -> usize {
        self.actions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterates the live chain, first to last.
    pub fn actions(&self) -> Actions<'_> {
        Actions {
            log: self,
            cursor: self.head,
        }
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    fn append(&mut self, action: Action, depth: usize) -> EntryId {
        let id = self.entries.len();
        self.entries.push(Entry {
            action,
            depth,
            prev: self.tail,
            next: None,
        });
        if let Some(tail) = self.tail {
            self.entries[tail].next = Some(id);
        }
        if self.head.is_none() {
            self.head = Some(id);
        }
        self.tail = Some(id);
        id
    }
}

/// Iterator over the live entries of an [`ActionLog`].
pub struct Actions<'a> {
    log: &'a ActionLog,
    cursor: Option<EntryId>,
}

impl<'a> Iterator for Actions<'a> {
    type Item = (EntryId, &'a Action);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.log.entries[id].next;
        Some((id, &self.log.entries[id].action))
    }
}
