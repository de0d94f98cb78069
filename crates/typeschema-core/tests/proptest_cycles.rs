//! Property-based tests over random, possibly cyclic record graphs.
//!
//! Invariants checked for every generated graph:
//! - compilation terminates successfully;
//! - each reachable record is introspected exactly once and appears exactly
//!   once as a component;
//! - every reference node in the output resolves to a component;
//! - compiling twice yields identical documents.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use typeschema_core::{
    BeanIntrospector, Compiler, Field, FieldIntrospector, TypeCatalog, TypeKey,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Target of a generated field.
#[derive(Debug, Clone)]
enum Target {
    Primitive(&'static str),
    Record(usize),
    ListOf(usize),
}

fn arb_primitive() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("int"), Just("string"), Just("boolean"), Just("date")]
}

fn arb_target(records: usize) -> impl Strategy<Value = Target> {
    prop_oneof![
        2 => arb_primitive().prop_map(Target::Primitive),
        3 => (0..records).prop_map(Target::Record),
        1 => (0..records).prop_map(Target::ListOf),
    ]
}

/// Adjacency list: `graph[i]` holds the field targets of record `i`.
fn arb_graph() -> impl Strategy<Value = Vec<Vec<Target>>> {
    (1usize..8).prop_flat_map(|records| {
        proptest::collection::vec(proptest::collection::vec(arb_target(records), 0..4), records)
    })
}

fn record_name(i: usize) -> String {
    format!("gen.R{i}")
}

fn list_name(i: usize) -> String {
    format!("gen.List{i}")
}

fn build_catalog(graph: &[Vec<Target>]) -> TypeCatalog {
    let mut builder = TypeCatalog::builder();
    for i in 0..graph.len() {
        builder = builder.collection(&list_name(i), Some(record_name(i).as_str()));
    }
    for (i, fields) in graph.iter().enumerate() {
        builder = builder.record(&record_name(i), |mut r| {
            for (f, target) in fields.iter().enumerate() {
                let ty = match target {
                    Target::Primitive(p) => p.to_string(),
                    Target::Record(j) => record_name(*j),
                    Target::ListOf(j) => list_name(*j),
                };
                r = r.field(&format!("f{f}"), &ty);
            }
            r
        });
    }
    builder.build().expect("generated catalog is valid")
}

fn reachable(graph: &[Vec<Target>], root: usize) -> HashSet<usize> {
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(i) = stack.pop() {
        for target in &graph[i] {
            if let Target::Record(j) | Target::ListOf(j) = target {
                if seen.insert(*j) {
                    stack.push(*j);
                }
            }
        }
    }
    seen
}

#[derive(Clone, Default)]
struct CountingIntrospector {
    calls: Arc<Mutex<HashMap<TypeKey, usize>>>,
}

impl FieldIntrospector for CountingIntrospector {
    fn list_fields(&self, catalog: &TypeCatalog, key: TypeKey) -> Vec<Field> {
        *self.calls.lock().unwrap().entry(key).or_default() += 1;
        BeanIntrospector.list_fields(catalog, key)
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_each_record_expanded_once(graph in arb_graph()) {
        let catalog = build_catalog(&graph);
        let root = catalog.require(&record_name(0)).unwrap();
        let introspector = CountingIntrospector::default();

        let doc = Compiler::default()
            .with_introspector(introspector.clone())
            .compile(&catalog, root)
            .unwrap();

        let expected = reachable(&graph, 0);
        let calls = introspector.calls.lock().unwrap();
        prop_assert_eq!(calls.len(), expected.len());
        prop_assert!(calls.values().all(|&n| n == 1));
        prop_assert_eq!(doc.components().count(), expected.len());
        for i in &expected {
            let key = catalog.require(&record_name(*i)).unwrap();
            prop_assert!(doc.schema_for(key).is_some());
        }
    }

    #[test]
    fn prop_references_resolve(graph in arb_graph()) {
        let catalog = build_catalog(&graph);
        let root = catalog.require(&record_name(0)).unwrap();

        let doc = Compiler::default().compile(&catalog, root).unwrap();

        for (id, schema) in doc.graph().iter() {
            prop_assert!(schema.is_resolved());
            if schema.is_reference() {
                let target = doc.resolve(id);
                prop_assert!(target.is_some(), "dangling {:?}", schema.reference_target());
                prop_assert!(!doc[target.unwrap()].is_reference());
            }
        }
    }

    #[test]
    fn prop_compilation_is_deterministic(graph in arb_graph()) {
        let catalog = build_catalog(&graph);
        let root = catalog.require(&record_name(0)).unwrap();
        let compiler = Compiler::default();

        let first = compiler.compile(&catalog, root).unwrap().to_json();
        let second = compiler.compile(&catalog, root).unwrap().to_json();
        prop_assert_eq!(first.to_string(), second.to_string());
    }
}
