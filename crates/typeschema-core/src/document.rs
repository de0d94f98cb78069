//! The result of a compilation.

use std::collections::HashMap;
use std::ops::Index;

use serde_json::{json, Map, Value};

use crate::schema::{Schema, SchemaGraph, SchemaId, SchemaKind};
use crate::types::TypeKey;

/// Root schemas plus every named component they reference.
///
/// Components are listed in the order their expansion finished, which is
/// stable for a given catalog and root list.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    graph: SchemaGraph,
    roots: Vec<SchemaId>,
    components: Vec<(String, SchemaId)>,
    by_type: HashMap<TypeKey, SchemaId>,
    ref_prefix: String,
}

impl SchemaDocument {
    pub(crate) fn new(
        graph: SchemaGraph,
        roots: Vec<SchemaId>,
        components: Vec<(String, SchemaId)>,
        by_type: HashMap<TypeKey, SchemaId>,
        ref_prefix: String,
    ) -> Self {
        Self {
            graph,
            roots,
            components,
            by_type,
            ref_prefix,
        }
    }

    /// The first root, if any root was compiled.
    pub fn root(&self) -> Option<SchemaId> {
        self.roots.first().copied()
    }

    /// Root schemas in the order they were requested.
    pub fn roots(&self) -> &[SchemaId] {
        &self.roots
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn component(&self, name: &str) -> Option<SchemaId> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, SchemaId)> {
        self.components.iter().map(|(n, id)| (n.as_str(), *id))
    }

    /// Canonical schema of a composite type, if it was expanded.
    pub fn schema_for(&self, key: TypeKey) -> Option<SchemaId> {
        self.by_type.get(&key).copied()
    }

    /// Follow a reference node to the component it names. Non-reference
    /// nodes resolve to themselves.
    pub fn resolve(&self, id: SchemaId) -> Option<SchemaId> {
        let schema = self.graph.get(id)?;
        if !schema.is_reference() {
            return Some(id);
        }
        let name = schema
            .reference_target()?
            .strip_prefix(self.ref_prefix.as_str())?;
        self.component(name)
    }

    /// Render as `{"roots": [...], "components": {"schemas": {...}}}`.
    ///
    /// A root that is itself a component renders as a `$ref` to it.
    pub fn to_json(&self) -> Value {
        let roots: Vec<Value> = self
            .roots
            .iter()
            .map(|&id| match self.graph[id].ref_name(&self.ref_prefix) {
                Some(target) if self.component_id_is(id) => json!({ "$ref": target }),
                _ => self.render(id),
            })
            .collect();

        let schemas: Map<String, Value> = self
            .components
            .iter()
            .map(|(name, id)| (name.clone(), self.render(*id)))
            .collect();

        json!({
            "roots": roots,
            "components": { "schemas": schemas },
        })
    }

    fn component_id_is(&self, id: SchemaId) -> bool {
        self.components.iter().any(|(_, c)| *c == id)
    }

    fn render(&self, id: SchemaId) -> Value {
        render_node(&self.graph, &self.graph[id])
    }
}

fn render_node(graph: &SchemaGraph, schema: &Schema) -> Value {
    let mut out = Map::new();
    match schema.kind() {
        SchemaKind::Object => {
            out.insert("type".into(), json!("object"));
            let properties: Map<String, Value> = schema
                .properties()
                .iter()
                .map(|(name, child)| (name.to_string(), render_node(graph, &graph[child])))
                .collect();
            out.insert("properties".into(), Value::Object(properties));
        }
        SchemaKind::Array => {
            out.insert("type".into(), json!("array"));
            if let Some(items) = schema.items() {
                out.insert("items".into(), render_node(graph, &graph[items]));
            }
        }
        SchemaKind::Primitive(json_type) => {
            out.insert("type".into(), json!(json_type.as_str()));
            if let Some(format) = schema.format() {
                out.insert("format".into(), json!(format));
            }
        }
        SchemaKind::Enum => {
            out.insert("type".into(), json!("string"));
            out.insert("enum".into(), json!(schema.enum_values()));
        }
        SchemaKind::Reference => {
            if let Some(target) = schema.reference_target() {
                out.insert("$ref".into(), json!(target));
            }
        }
    }
    Value::Object(out)
}

impl Index<SchemaId> for SchemaDocument {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.graph[id]
    }
}
