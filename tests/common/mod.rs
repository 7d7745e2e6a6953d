//! Shared fixtures for the integration tests.
//!
//! One canonical schema/context registry is built once and shared by every
//! test; individual tests that need a customized registry build their own.

#![allow(dead_code)]

use arbor::context::ContextRegistry;
use arbor::schema::{FieldSpec, SchemaRegistry};
use arbor::tree::{Field, FieldValue, Item, Node, NodeRef};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// The canonical fixture registry: a small statement-language shape.
pub static REGISTRY: Lazy<ContextRegistry> = Lazy::new(|| {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register("Module", vec![FieldSpec::list("body")])
        .expect("fixture schema");
    schemas
        .register(
            "Assign",
            vec![FieldSpec::scalar("target"), FieldSpec::scalar("value")],
        )
        .expect("fixture schema");
    schemas
        .register("Name", vec![FieldSpec::scalar("id")])
        .expect("fixture schema");
    schemas
        .register("Const", vec![FieldSpec::scalar("value")])
        .expect("fixture schema");
    schemas
        .register(
            "Function",
            vec![FieldSpec::scalar("name"), FieldSpec::list("body")],
        )
        .expect("fixture schema");
    schemas
        .register(
            "Let",
            vec![
                FieldSpec::scalar("name"),
                FieldSpec::optional("ty"),
                FieldSpec::scalar("value"),
            ],
        )
        .expect("fixture schema");
    schemas
        .register("Wrap", vec![FieldSpec::optional("inner")])
        .expect("fixture schema");
    ContextRegistry::with_default_contexts(Arc::new(schemas))
});

pub fn registry() -> ContextRegistry {
    REGISTRY.clone()
}

// ----------------------------------------------------------------------------
// Node constructors
// ----------------------------------------------------------------------------

pub fn scalar_field(name: &str, item: Item) -> Field {
    Field {
        name: name.to_string(),
        value: FieldValue::Scalar(Some(item)),
    }
}

pub fn empty_field(name: &str) -> Field {
    Field {
        name: name.to_string(),
        value: FieldValue::Scalar(None),
    }
}

pub fn list_field(name: &str, items: Vec<Item>) -> Field {
    Field {
        name: name.to_string(),
        value: FieldValue::List(items),
    }
}

pub fn module(body: Vec<Item>) -> NodeRef {
    Node::new("Module", vec![list_field("body", body)])
}

pub fn assign(target: NodeRef, value: NodeRef) -> NodeRef {
    Node::new(
        "Assign",
        vec![
            scalar_field("target", Item::node(target)),
            scalar_field("value", Item::node(value)),
        ],
    )
}

pub fn name(id: &str) -> NodeRef {
    Node::new("Name", vec![scalar_field("id", Item::literal(id))])
}

pub fn constant(value: f64) -> NodeRef {
    Node::new("Const", vec![scalar_field("value", Item::literal(value))])
}

pub fn function(fn_name: &str, body: Vec<Item>) -> NodeRef {
    Node::new(
        "Function",
        vec![
            scalar_field("name", Item::literal(fn_name)),
            list_field("body", body),
        ],
    )
}

pub fn let_binding(binding: &str, ty: Option<Item>, value: Item) -> NodeRef {
    let ty_field = match ty {
        Some(item) => scalar_field("ty", item),
        None => empty_field("ty"),
    };
    Node::new(
        "Let",
        vec![
            scalar_field("name", Item::literal(binding)),
            ty_field,
            scalar_field("value", value),
        ],
    )
}

pub fn wrap(inner: Option<Item>) -> NodeRef {
    let inner_field = match inner {
        Some(item) => scalar_field("inner", item),
        None => empty_field("inner"),
    };
    Node::new("Wrap", vec![inner_field])
}

/// The tree `Module(body=[Assign(target=Name("x"), value=Const(3))])`.
pub fn assignment_module() -> NodeRef {
    module(vec![Item::node(assign(name("x"), constant(3.0)))])
}
