//! Scenario tests for the compiler: cycles, sharing, memoization and the
//! bean field policy, driven through the public API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use typeschema_core::{
    BeanIntrospector, CompileError, CompileOptions, Compiler, Converter, Dispatcher, ErrorCode,
    Field, FieldIntrospector, JsonType, Schema, SchemaDocument, SchemaId, SchemaKind, Session,
    TypeCatalog, TypeKey,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Bean introspection that counts how often each type is asked for.
#[derive(Clone, Default)]
struct CountingIntrospector {
    calls: Arc<Mutex<HashMap<TypeKey, usize>>>,
}

impl CountingIntrospector {
    fn calls_for(&self, key: TypeKey) -> usize {
        self.calls.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl FieldIntrospector for CountingIntrospector {
    fn list_fields(&self, catalog: &TypeCatalog, key: TypeKey) -> Vec<Field> {
        *self.calls.lock().unwrap().entry(key).or_default() += 1;
        BeanIntrospector.list_fields(catalog, key)
    }
}

fn property_names(doc: &SchemaDocument, id: SchemaId) -> Vec<String> {
    doc[id].properties().names().map(str::to_string).collect()
}

// ── Cycles ──────────────────────────────────────────────────────────────────

#[test]
fn test_linked_node() {
    let catalog = TypeCatalog::builder()
        .record("demo.Node", |r| r.field("value", "int").field("next", "demo.Node"))
        .build()
        .unwrap();
    let node = catalog.require("demo.Node").unwrap();

    let doc = Compiler::default().compile(&catalog, node).unwrap();
    let root = doc.root().unwrap();

    assert_eq!(doc[root].kind(), SchemaKind::Object);
    assert_eq!(doc[root].name(), Some("Node"));
    assert_eq!(property_names(&doc, root), vec!["value", "next"]);

    let value = &doc[doc[root].property("value").unwrap()];
    assert!(matches!(value.kind(), SchemaKind::Primitive(_)));

    let next = &doc[doc[root].property("next").unwrap()];
    assert_eq!(next.kind(), SchemaKind::Reference);
    assert_eq!(next.reference_target(), Some("#/components/schemas/Node"));
    assert!(next.properties().is_empty());
}

#[test]
fn test_mutual_recursion() {
    let catalog = TypeCatalog::builder()
        .record("demo.A", |r| r.field("b", "demo.B"))
        .record("demo.B", |r| r.field("a", "demo.A"))
        .build()
        .unwrap();
    let a = catalog.require("demo.A").unwrap();

    let doc = Compiler::default().compile(&catalog, a).unwrap();

    let names: Vec<&str> = doc.components().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["B", "A"]);

    let a_id = doc.component("A").unwrap();
    let b_id = doc.component("B").unwrap();
    assert_eq!(doc[a_id].kind(), SchemaKind::Object);
    assert_eq!(doc[b_id].kind(), SchemaKind::Object);

    let a_b = &doc[doc[a_id].property("b").unwrap()];
    let b_a = &doc[doc[b_id].property("a").unwrap()];
    assert_eq!(a_b.reference_target(), Some("#/components/schemas/B"));
    assert_eq!(b_a.reference_target(), Some("#/components/schemas/A"));
}

#[test]
fn test_three_type_cycle_every_reference_resolves() {
    let catalog = TypeCatalog::builder()
        .record("demo.X", |r| r.field("y", "demo.Y"))
        .record("demo.Y", |r| r.field("z", "demo.Z").field("x", "demo.X"))
        .record("demo.Z", |r| r.field("x", "demo.X").field("y", "demo.Y"))
        .build()
        .unwrap();
    let x = catalog.require("demo.X").unwrap();

    let doc = Compiler::default().compile(&catalog, x).unwrap();

    assert_eq!(doc.components().count(), 3);
    for (_, schema) in doc.graph().iter() {
        assert!(schema.is_resolved());
        if schema.is_reference() {
            let target = schema.reference_target().unwrap();
            let name = target.strip_prefix("#/components/schemas/").unwrap();
            assert!(doc.component(name).is_some(), "dangling {target}");
        }
    }
}

#[test]
fn test_cycle_through_collection() {
    let catalog = TypeCatalog::builder()
        .collection("demo.Children", Some("demo.Tree"))
        .record("demo.Tree", |r| r.field("label", "string").field("children", "demo.Children"))
        .build()
        .unwrap();
    let tree = catalog.require("demo.Tree").unwrap();

    let doc = Compiler::default().compile(&catalog, tree).unwrap();
    let root = doc.root().unwrap();
    let children = &doc[doc[root].property("children").unwrap()];

    assert_eq!(children.kind(), SchemaKind::Array);
    let items = &doc[children.items().unwrap()];
    assert_eq!(items.reference_target(), Some("#/components/schemas/Tree"));
}

// ── Sharing and memoization ─────────────────────────────────────────────────

#[test]
fn test_diamond_expands_shared_type_once() {
    let catalog = TypeCatalog::builder()
        .record("demo.Leaf", |r| r.field("n", "int"))
        .record("demo.Left", |r| r.field("leaf", "demo.Leaf"))
        .record("demo.Right", |r| r.field("leaf", "demo.Leaf"))
        .record("demo.Top", |r| r.field("left", "demo.Left").field("right", "demo.Right"))
        .build()
        .unwrap();
    let top = catalog.require("demo.Top").unwrap();
    let leaf = catalog.require("demo.Leaf").unwrap();

    let introspector = CountingIntrospector::default();
    let doc = Compiler::default()
        .with_introspector(introspector.clone())
        .compile(&catalog, top)
        .unwrap();

    assert_eq!(introspector.calls_for(leaf), 1);
    assert_eq!(introspector.total(), 4);

    let canonical = doc.schema_for(leaf).unwrap();
    let left = doc.component("Left").unwrap();
    let right = doc.component("Right").unwrap();
    let via_left = doc[left].property("leaf").unwrap();
    let via_right = doc[right].property("leaf").unwrap();

    assert_ne!(via_left, via_right);
    assert!(doc[via_left].is_reference());
    assert!(doc[via_right].is_reference());
    assert_eq!(doc.resolve(via_left), Some(canonical));
    assert_eq!(doc.resolve(via_right), Some(canonical));
}

#[test]
fn test_introspector_called_once_per_type_in_cycle() {
    let catalog = TypeCatalog::builder()
        .record("demo.A", |r| r.field("b", "demo.B").field("self_", "demo.A"))
        .record("demo.B", |r| r.field("a", "demo.A").field("b", "demo.B"))
        .build()
        .unwrap();
    let a = catalog.require("demo.A").unwrap();
    let b = catalog.require("demo.B").unwrap();

    let introspector = CountingIntrospector::default();
    Compiler::default()
        .with_introspector(introspector.clone())
        .compile(&catalog, a)
        .unwrap();

    assert_eq!(introspector.calls_for(a), 1);
    assert_eq!(introspector.calls_for(b), 1);
}

#[test]
fn test_second_root_reuses_completed_schema() {
    let catalog = TypeCatalog::builder()
        .record("demo.Inner", |r| r.field("n", "int"))
        .record("demo.Outer", |r| r.field("inner", "demo.Inner"))
        .build()
        .unwrap();
    let outer = catalog.require("demo.Outer").unwrap();
    let inner = catalog.require("demo.Inner").unwrap();

    let introspector = CountingIntrospector::default();
    let doc = Compiler::default()
        .with_introspector(introspector.clone())
        .compile_many(&catalog, [outer, inner, outer])
        .unwrap();

    assert_eq!(introspector.total(), 2);
    assert_eq!(doc.roots().len(), 3);
    assert_eq!(doc.roots()[1], doc.schema_for(inner).unwrap());
    assert_eq!(doc.roots()[0], doc.roots()[2]);
}

#[test]
fn test_property_order_is_deterministic() {
    let catalog = TypeCatalog::builder()
        .record("demo.Wide", |r| {
            r.field("zeta", "int")
                .field("alpha", "string")
                .field("mid", "double")
                .field("beta", "boolean")
        })
        .build()
        .unwrap();
    let wide = catalog.require("demo.Wide").unwrap();
    let compiler = Compiler::default();

    let first = compiler.compile(&catalog, wide).unwrap();
    let second = compiler.compile(&catalog, wide).unwrap();

    let expected = vec!["zeta", "alpha", "mid", "beta"];
    assert_eq!(property_names(&first, first.root().unwrap()), expected);
    assert_eq!(property_names(&second, second.root().unwrap()), expected);
    assert_eq!(first.to_json(), second.to_json());
}

// ── Field policy ────────────────────────────────────────────────────────────

#[test]
fn test_private_field_with_getter_included() {
    let catalog = TypeCatalog::builder()
        .record("demo.Person", |r| {
            r.private_field("age", "int")
                .private_field("secret", "string")
                .method("getAge")
        })
        .build()
        .unwrap();
    let person = catalog.require("demo.Person").unwrap();

    let doc = Compiler::default().compile(&catalog, person).unwrap();
    assert_eq!(property_names(&doc, doc.root().unwrap()), vec!["age"]);
}

#[test]
fn test_subtype_field_shadows_ancestor() {
    let catalog = TypeCatalog::builder()
        .record("demo.Base", |r| r.field("id", "int").field("note", "string"))
        .record("demo.Derived", |r| r.extends("demo.Base").field("id", "string"))
        .build()
        .unwrap();
    let derived = catalog.require("demo.Derived").unwrap();

    let doc = Compiler::default().compile(&catalog, derived).unwrap();
    let root = doc.root().unwrap();

    assert_eq!(property_names(&doc, root), vec!["id", "note"]);
    let id = &doc[doc[root].property("id").unwrap()];
    assert_eq!(id.kind(), SchemaKind::Primitive(JsonType::String));
    // The base type is never expanded on its own.
    assert!(doc.component("Base").is_none());
}

// ── Limits and errors ───────────────────────────────────────────────────────

fn chain(len: usize) -> TypeCatalog {
    let mut builder = TypeCatalog::builder();
    for i in 0..len {
        let next = format!("demo.T{}", i + 1);
        builder = if i + 1 < len {
            builder.record(&format!("demo.T{i}"), |r| r.field("next", &next))
        } else {
            builder.record(&format!("demo.T{i}"), |r| r.field("end", "int"))
        };
    }
    builder.build().unwrap()
}

#[test]
fn test_depth_limit_exceeded() {
    let catalog = chain(10);
    let root = catalog.require("demo.T0").unwrap();
    let options = CompileOptions {
        max_depth: 5,
        ..CompileOptions::default()
    };

    let err = Compiler::new(options).compile(&catalog, root).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::DepthExceeded);
    assert_eq!(err.path(), Some("T0.next.next.next.next.next.next"));
    assert_eq!(
        err.to_json(),
        json!({
            "code": "depth_exceeded",
            "message": "Schema too deep at T0.next.next.next.next.next.next (max: 5)",
            "path": "T0.next.next.next.next.next.next",
        })
    );
}

#[test]
fn test_depth_limit_not_reached() {
    let catalog = chain(10);
    let root = catalog.require("demo.T0").unwrap();
    // `T9.end` sits exactly ten levels below the root.
    let options = CompileOptions {
        max_depth: 10,
        ..CompileOptions::default()
    };

    let doc = Compiler::new(options).compile(&catalog, root).unwrap();
    assert_eq!(doc.components().count(), 10);
}

#[test]
fn test_cycles_do_not_count_against_depth() {
    let catalog = TypeCatalog::builder()
        .record("demo.Node", |r| r.field("next", "demo.Node").field("prev", "demo.Node"))
        .build()
        .unwrap();
    let node = catalog.require("demo.Node").unwrap();
    let options = CompileOptions {
        max_depth: 1,
        ..CompileOptions::default()
    };

    assert!(Compiler::new(options).compile(&catalog, node).is_ok());
}

#[test]
fn test_unknown_root_name() {
    let catalog = TypeCatalog::builder().build().unwrap();
    let err = Compiler::default()
        .compile_by_name(&catalog, &["demo.Nope"])
        .unwrap_err();

    assert!(matches!(err, CompileError::UnknownType { ref name } if name == "demo.Nope"));
}

/// Starts an expansion and queues a fix-up, but never completes the type.
struct AbandoningConverter;

impl Converter for AbandoningConverter {
    fn name(&self) -> &'static str {
        "abandoning"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        catalog[key].qualified_name() == "demo.Leak"
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        session.mark_in_progress(key)?;
        let placeholder = session.graph_mut().insert(Schema::placeholder());
        session.register_fixup(key, move |graph, done| {
            if let Some(target) = graph[done].ref_name("#/components/schemas/") {
                graph[placeholder].as_reference(target);
            }
        })?;
        Ok(placeholder)
    }
}

#[test]
fn test_unfinished_expansion_fails_the_build() {
    let catalog = TypeCatalog::builder()
        .record("demo.Leak", |r| r.field("n", "int"))
        .build()
        .unwrap();
    let leak = catalog.require("demo.Leak").unwrap();
    let dispatcher = Dispatcher::new().with(AbandoningConverter);

    let err = Compiler::default()
        .with_dispatcher(dispatcher)
        .compile(&catalog, leak)
        .unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::UnresolvedReference);
    assert!(
        matches!(err, CompileError::UnresolvedReference { ref type_name } if type_name == "demo.Leak")
    );
}

#[test]
fn test_root_key_from_another_catalog() {
    let small = TypeCatalog::builder().record("demo.Only", |r| r).build().unwrap();
    let large = TypeCatalog::builder()
        .record("demo.A", |r| r)
        .record("demo.B", |r| r)
        .record("demo.C", |r| r)
        .build()
        .unwrap();
    let foreign = large.require("demo.C").unwrap();

    let err = Compiler::default().compile(&small, foreign).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::UnknownType);
}
