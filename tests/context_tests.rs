//! Builder-context and registry unit tests
//!
//! Exercise field-arity enforcement, identity-based child lookup, construct
//! invariants, and the failure modes of both registries. Error assertions go
//! through the `ErrorKind` classification rather than message strings.

mod common;

use arbor::context::{BuildContext, ContextParts, ContextRegistry};
use arbor::schema::{FieldSpec, SchemaRegistry};
use arbor::tree::{Item, Node};
use arbor::{ArborError, ErrorKind};
use common::*;
use std::sync::Arc;

#[cfg(test)]
mod arity_tests {
    use super::*;

    #[test]
    fn scalar_field_is_set_at_most_once() {
        let registry = registry();
        let ctx = registry.root_context("Name").unwrap();

        ctx.place("id", Item::literal("x")).unwrap();
        let err = ctx.place("id", Item::literal("y")).unwrap_err();

        assert!(matches!(err, ArborError::FieldAlreadySet { .. }));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn list_field_accumulates_in_placement_order() {
        let registry = registry();
        let ctx = registry.root_context("Module").unwrap();

        for i in 0..4 {
            ctx.place("body", Item::literal(i as f64)).unwrap();
        }

        let items = ctx.items("body").unwrap();
        assert_eq!(items.len(), 4);
        let values: Vec<_> = items
            .iter()
            .map(|item| item.as_literal().and_then(|lit| lit.as_number()).unwrap())
            .collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn placing_into_an_undeclared_field_fails() {
        let registry = registry();
        let ctx = registry.root_context("Name").unwrap();

        let err = ctx.place("nope", Item::literal(1.0)).unwrap_err();
        assert!(matches!(err, ArborError::UnknownField { .. }));
    }

    #[test]
    fn reading_a_scalar_before_fill_fails() {
        let registry = registry();
        let ctx = registry.root_context("Name").unwrap();

        let err = ctx.get("id").unwrap_err();
        assert!(matches!(err, ArborError::UnsetField { .. }));
    }

    #[test]
    fn reading_with_the_wrong_arity_fails() {
        let registry = registry();
        let module_ctx = registry.root_context("Module").unwrap();
        let name_ctx = registry.root_context("Name").unwrap();

        assert!(matches!(
            module_ctx.get("body").unwrap_err(),
            ArborError::WrongArity { .. }
        ));
        assert!(matches!(
            name_ctx.items("id").unwrap_err(),
            ArborError::WrongArity { .. }
        ));
    }

    #[test]
    fn clear_makes_a_scalar_placeable_again() {
        let registry = registry();
        let ctx = registry.root_context("Name").unwrap();

        ctx.place("id", Item::literal("x")).unwrap();
        ctx.clear("id").unwrap();
        ctx.place("id", Item::literal("y")).unwrap();

        let node = ctx.construct().unwrap();
        assert_eq!(
            node.scalar("id").and_then(Item::as_literal).and_then(|l| l.as_str()),
            Some("y")
        );
    }
}

#[cfg(test)]
mod construct_tests {
    use super::*;

    #[test]
    fn construct_requires_every_mandatory_scalar() {
        let registry = registry();
        let ctx = registry.root_context("Assign").unwrap();
        ctx.place("target", Item::node(name("x"))).unwrap();

        let err = ctx.construct().unwrap_err();
        assert!(matches!(err, ArborError::MissingField { .. }));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn construct_allows_empty_optional_scalars() {
        let registry = registry();
        let ctx = registry.root_context("Wrap").unwrap();

        let node = ctx.construct().unwrap();
        assert!(node.scalar("inner").is_none());
    }

    #[test]
    fn construct_is_idempotent() {
        let registry = registry();
        let ctx = registry.root_context("Name").unwrap();
        ctx.place("id", Item::literal("x")).unwrap();

        let first = ctx.construct().unwrap();
        let second = ctx.construct().unwrap();

        assert_eq!(first, second);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn constructed_fields_follow_schema_order() {
        let registry = registry();
        let ctx = registry.root_context("Assign").unwrap();
        // Place out of declaration order.
        ctx.place("value", Item::node(constant(3.0))).unwrap();
        ctx.place("target", Item::node(name("x"))).unwrap();

        let node = ctx.construct().unwrap();
        let names: Vec<_> = node.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["target", "value"]);
    }
}

#[cfg(test)]
mod push_tests {
    use super::*;

    #[test]
    fn push_accepts_a_declared_child() {
        let registry = registry();
        let tree = assignment_module();
        let ctx = registry.context_for(&tree).unwrap();

        let child = tree.list("body").unwrap()[0].as_node().unwrap().clone();
        let child_ctx = BuildContext::push(&ctx, &child).unwrap();

        assert_eq!(child_ctx.kind(), "Assign");
        assert_eq!(child_ctx.parent().unwrap().kind(), "Module");
    }

    #[test]
    fn push_rejects_a_value_not_on_the_original() {
        let registry = registry();
        let tree = assignment_module();
        let ctx = registry.context_for(&tree).unwrap();

        // Structurally identical, but a different node identity.
        let stranger = assign(name("x"), constant(3.0));
        let err = BuildContext::push(&ctx, &stranger).unwrap_err();

        assert!(matches!(err, ArborError::ChildNotDeclared { .. }));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn push_rejects_children_on_a_synthetic_root() {
        let registry = registry();
        let ctx = registry.root_context("Module").unwrap();

        let err = BuildContext::push(&ctx, &name("x")).unwrap_err();
        assert!(matches!(err, ArborError::ChildNotDeclared { .. }));
    }
}

#[cfg(test)]
mod get_pos_tests {
    use super::*;

    #[test]
    fn get_pos_reports_scalar_fields_without_an_index() {
        let registry = registry();
        let tree = assign(name("x"), constant(3.0));
        let ctx = registry.context_for(&tree).unwrap();

        let value = tree.scalar("value").unwrap().clone();
        let (field, index) = ctx.get_pos(&value).unwrap();

        assert_eq!(field, "value");
        assert_eq!(index, None);
    }

    #[test]
    fn get_pos_reports_list_indices() {
        let registry = registry();
        let a = constant(1.0);
        let b = constant(2.0);
        let tree = module(vec![Item::node(a), Item::node(b.clone())]);
        let ctx = registry.context_for(&tree).unwrap();

        let (field, index) = ctx.get_pos(&Item::node(b)).unwrap();
        assert_eq!(field, "body");
        assert_eq!(index, Some(1));
    }

    #[test]
    fn get_pos_matches_literals_by_equality() {
        let registry = registry();
        let tree = name("x");
        let ctx = registry.context_for(&tree).unwrap();

        let (field, index) = ctx.get_pos(&Item::literal("x")).unwrap();
        assert_eq!(field, "id");
        assert_eq!(index, None);
    }

    #[test]
    fn get_pos_fails_for_an_absent_child() {
        let registry = registry();
        let tree = assignment_module();
        let ctx = registry.context_for(&tree).unwrap();

        let err = ctx.get_pos(&Item::node(name("z"))).unwrap_err();
        assert!(matches!(err, ArborError::ChildNotOnNode { .. }));
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn unregistered_kind_lookup_is_a_registration_error() {
        let registry = registry();

        let err = registry.root_context("Mystery").unwrap_err();
        assert!(matches!(err, ArborError::UnregisteredKind { .. }));
        assert_eq!(err.kind(), ErrorKind::Registration);

        let err = registry.schemas().get("Mystery").unwrap_err();
        assert!(matches!(err, ArborError::UnregisteredKind { .. }));
    }

    #[test]
    fn registering_a_kind_twice_fails() {
        let mut schemas = SchemaRegistry::new();
        schemas
            .register("Name", vec![FieldSpec::scalar("id")])
            .unwrap();

        let err = schemas
            .register("Name", vec![FieldSpec::scalar("id")])
            .unwrap_err();
        assert!(matches!(err, ArborError::DuplicateKind { .. }));
    }

    #[test]
    fn registering_a_duplicate_field_fails() {
        let mut schemas = SchemaRegistry::new();
        let err = schemas
            .register(
                "Pair",
                vec![FieldSpec::scalar("item"), FieldSpec::list("item")],
            )
            .unwrap_err();
        assert!(matches!(err, ArborError::DuplicateField { .. }));
    }

    #[test]
    fn context_ctor_requires_a_registered_schema() {
        let schemas = Arc::new(SchemaRegistry::new());
        let mut contexts = ContextRegistry::with_default_contexts(schemas);

        let err = contexts
            .register("Ghost", BuildContext::from_parts)
            .unwrap_err();
        assert!(matches!(err, ArborError::UnregisteredKind { .. }));
    }

    #[test]
    fn custom_context_ctor_specializes_a_kind() {
        fn anonymous_name(parts: ContextParts) -> BuildContext {
            let ctx = BuildContext::from_parts(parts);
            let _ = ctx.place("id", Item::literal("anon"));
            ctx
        }

        let mut schemas = SchemaRegistry::new();
        schemas
            .register("Name", vec![FieldSpec::scalar("id")])
            .unwrap();
        let mut contexts = ContextRegistry::with_default_contexts(Arc::new(schemas));
        contexts.register("Name", anonymous_name).unwrap();

        let node = contexts.root_context("Name").unwrap().construct().unwrap();
        assert_eq!(
            node.scalar("id").and_then(Item::as_literal).and_then(|l| l.as_str()),
            Some("anon")
        );
    }

    #[test]
    fn schema_registry_reports_its_contents() {
        let mut schemas = SchemaRegistry::new();
        assert!(schemas.is_empty());
        schemas
            .register("Name", vec![FieldSpec::scalar("id")])
            .unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(schemas.contains("Name"));
        let schema = schemas.get("Name").unwrap();
        assert_eq!(schema.kind(), "Name");
        assert_eq!(schema.field_index("id"), Some(0));
        assert!(schema.spec("id").is_some());
    }

    #[test]
    fn alien_nodes_are_constructible_but_not_traversable() {
        // The data model does not require registration, traversal does.
        let alien = Node::new("Alien", vec![scalar_field("x", Item::literal(1.0))]);
        assert_eq!(alien.kind(), "Alien");

        let registry = registry();
        assert!(registry.context_for(&alien).is_err());
    }
}
