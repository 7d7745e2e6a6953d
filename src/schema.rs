//! Node schema registry for the Arbor engine.
//!
//! A [`Schema`] records, for one node kind, the ordered list of declared
//! field names and each field's arity (scalar vs. list). The
//! [`SchemaRegistry`] maps kind tags to schemas. It is populated once at
//! startup and read-only thereafter; looking up an unregistered kind is a
//! fatal configuration error, never a recoverable condition.
//!
//! Keeping node-kind knowledge here rather than in a dispatch table inside
//! the traversal engine is what lets callers add new node kinds without
//! touching traversal code.
//!
//! # Thread Safety
//! The registry itself is plain data. Share it after startup via `Arc`;
//! concurrent reads are safe because no writes occur after initialization.

use crate::diagnostics::{ArborError, ArborResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Arity of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldArity {
    /// Holds at most one child. A required scalar must be filled before a
    /// node can be constructed; an optional one may stay empty.
    Scalar { required: bool },
    /// Holds an ordered sequence of children, in placement order.
    List,
}

impl FieldArity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldArity::Scalar { .. } => "scalar",
            FieldArity::List => "list",
        }
    }
}

/// One declared field: a name and its arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub arity: FieldArity,
}

impl FieldSpec {
    /// A required scalar field.
    pub fn scalar(name: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            arity: FieldArity::Scalar { required: true },
        }
    }

    /// An optional scalar field.
    pub fn optional(name: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            arity: FieldArity::Scalar { required: false },
        }
    }

    /// An ordered list field.
    pub fn list(name: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            arity: FieldArity::List,
        }
    }
}

/// The declared shape of one node kind: field names and arities, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    kind: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Position of a field in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Looks up a field's spec by name.
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Startup-populated map from node-kind tag to schema.
///
/// # Example
/// ```rust
/// use arbor::schema::{FieldSpec, SchemaRegistry};
/// let mut schemas = SchemaRegistry::new();
/// schemas
///     .register("Assign", vec![FieldSpec::scalar("target"), FieldSpec::scalar("value")])
///     .unwrap();
/// assert!(schemas.contains("Assign"));
/// assert!(schemas.get("Assign").is_ok());
/// assert!(schemas.get("Missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    kinds: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Creates a new, empty schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the schema for one node kind.
    ///
    /// Called once per kind at startup. Kind tags are case-sensitive.
    ///
    /// # Errors
    /// Fails if the kind is already registered, or if two fields share a name.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> ArborResult<()> {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            return Err(ArborError::DuplicateKind { kind });
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ArborError::DuplicateField {
                    kind,
                    field: field.name.clone(),
                });
            }
        }
        let schema = Arc::new(Schema {
            kind: kind.clone(),
            fields,
        });
        self.kinds.insert(kind, schema);
        Ok(())
    }

    /// Looks up the schema for a kind.
    ///
    /// # Errors
    /// Fails with a registration error for an unknown kind. This is always a
    /// programmer/configuration error and is not retried.
    pub fn get(&self, kind: &str) -> ArborResult<Arc<Schema>> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| ArborError::UnregisteredKind {
                kind: kind.to_string(),
            })
    }

    /// Checks whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Returns an iterator over registered kind tags.
    pub fn kinds(&self) -> impl Iterator<Item = &String> {
        self.kinds.keys()
    }
}
