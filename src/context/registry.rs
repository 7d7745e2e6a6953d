//!
//! Provides the canonical mapping from a node-kind tag to the builder-context
//! constructor responsible for it, so traversal code can materialize contexts
//! polymorphically without knowing concrete kinds.
//!
//! ## Registry Invariant
//! The context registry is a single source of truth. It is constructed once
//! at the entrypoint, after the schema registry is fully populated, and
//! passed by handle to all traversal and replay code. It is read-only for
//! the remainder of the process; concurrent traversals share it safely
//! because no writes occur after initialization.

use crate::context::BuildContext;
use crate::diagnostics::{ArborError, ArborResult};
use crate::schema::{Schema, SchemaRegistry};
use crate::tree::NodeRef;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Constructor for one kind's builder context.
///
/// The default for every kind is [`BuildContext::from_parts`]; register a
/// different function to specialize how contexts for a kind are seeded.
pub type ContextCtor = fn(ContextParts) -> BuildContext;

/// Everything a context constructor receives.
pub struct ContextParts {
    pub schema: Arc<Schema>,
    pub original: Option<NodeRef>,
    pub parent: Option<Rc<BuildContext>>,
    pub registry: ContextRegistry,
}

#[derive(Debug, Clone)]
struct RegistryInner {
    schemas: Arc<SchemaRegistry>,
    ctors: HashMap<String, ContextCtor>,
}

/// Maps a node-kind tag to the context constructor for that kind.
///
/// The registry is a cheap-to-clone shared handle; every context it
/// materializes carries a copy, which is how `push` reaches the constructor
/// for a child's kind without the caller naming concrete types.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use arbor::context::ContextRegistry;
/// use arbor::schema::{FieldSpec, SchemaRegistry};
///
/// let mut schemas = SchemaRegistry::new();
/// schemas.register("Name", vec![FieldSpec::scalar("id")]).unwrap();
/// let registry = ContextRegistry::with_default_contexts(Arc::new(schemas));
/// let ctx = registry.root_context("Name").unwrap();
/// assert_eq!(ctx.kind(), "Name");
/// assert!(registry.root_context("Missing").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ContextRegistry {
    inner: Arc<RegistryInner>,
}

impl ContextRegistry {
    /// Builds a registry with the schema-driven default constructor
    /// registered for every kind the schema registry knows.
    ///
    /// This is the canonical way to construct the registry; customize
    /// individual kinds with [`register`](Self::register) before sharing the
    /// handle and starting traversals.
    pub fn with_default_contexts(schemas: Arc<SchemaRegistry>) -> Self {
        let ctors = schemas
            .kinds()
            .map(|kind| (kind.clone(), BuildContext::from_parts as ContextCtor))
            .collect();
        ContextRegistry {
            inner: Arc::new(RegistryInner { schemas, ctors }),
        }
    }

    /// Replaces the constructor for one kind.
    ///
    /// Copy-on-write: intended for the population phase, before the handle
    /// has been shared.
    ///
    /// # Errors
    /// Fails if the kind has no registered schema.
    pub fn register(&mut self, kind: &str, ctor: ContextCtor) -> ArborResult<()> {
        if !self.inner.schemas.contains(kind) {
            return Err(ArborError::UnregisteredKind {
                kind: kind.to_string(),
            });
        }
        Arc::make_mut(&mut self.inner)
            .ctors
            .insert(kind.to_string(), ctor);
        Ok(())
    }

    /// The schema registry this registry was built from.
    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.inner.schemas
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.inner.ctors.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.inner.ctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.ctors.is_empty()
    }

    /// Materializes a context for a kind.
    ///
    /// # Errors
    /// Fails with a registration error for an unknown kind; this is always a
    /// programmer/configuration error and is not retried.
    pub fn make_context(
        &self,
        kind: &str,
        original: Option<NodeRef>,
        parent: Option<Rc<BuildContext>>,
    ) -> ArborResult<Rc<BuildContext>> {
        let schema = self.inner.schemas.get(kind)?;
        let ctor = self
            .inner
            .ctors
            .get(kind)
            .ok_or_else(|| ArborError::UnregisteredKind {
                kind: kind.to_string(),
            })?;
        Ok(Rc::new(ctor(ContextParts {
            schema,
            original,
            parent,
            registry: self.clone(),
        })))
    }

    /// A parentless context for a kind, with no original node: the synthetic
    /// root sentinel used by replay and by callers building from scratch.
    pub fn root_context(&self, kind: &str) -> ArborResult<Rc<BuildContext>> {
        self.make_context(kind, None, None)
    }

    /// A parentless context mirroring an existing node: the starting point
    /// of a traversal.
    pub fn context_for(&self, node: &NodeRef) -> ArborResult<Rc<BuildContext>> {
        self.make_context(node.kind(), Some(node.clone()), None)
    }
}
