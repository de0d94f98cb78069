//! Schema nodes and the arena that owns them.
//!
//! Every node produced by a compilation lives in one [`SchemaGraph`] and is
//! addressed by a [`SchemaId`]. Children are stored as ids, so a node can be
//! allocated first and patched later: that is how a cycle placeholder turns
//! into a `$ref` once its target finishes expanding.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Handle to a node in a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u32);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// JSON Schema `type` of a primitive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Boolean,
    Integer,
    Number,
    String,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    Primitive(JsonType),
    Enum,
    /// Pointer to another node by name. Carries no content of its own.
    Reference,
}

/// Ordered `name -> child` mapping.
///
/// Iteration follows first-insertion order. Inserting a name that is already
/// present replaces its child but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, SchemaId)>,
}

impl Properties {
    /// Returns the child previously stored under `name`, if any.
    pub fn insert(&mut self, name: impl Into<String>, child: SchemaId) -> Option<SchemaId> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, child));
        }
        self.entries.push((name, child));
        None
    }

    pub fn get(&self, name: &str) -> Option<SchemaId> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SchemaId)> {
        self.entries.iter().map(|(n, id)| (n.as_str(), *id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One node of the output graph.
///
/// A node is either fully described (object, array, primitive, enum) or a
/// pure reference; [`as_reference`](Self::as_reference) strips all content
/// when converting the former into the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: Option<String>,
    kind: SchemaKind,
    properties: Properties,
    reference_target: Option<String>,
    items: Option<SchemaId>,
    format: Option<String>,
    enum_values: Vec<String>,
}

impl Schema {
    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            name: None,
            kind,
            properties: Properties::default(),
            reference_target: None,
            items: None,
            format: None,
            enum_values: Vec::new(),
        }
    }

    /// An empty named object, ready to receive properties.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::with_kind(SchemaKind::Object)
        }
    }

    pub fn array(items: Option<SchemaId>) -> Self {
        Self {
            items,
            ..Self::with_kind(SchemaKind::Array)
        }
    }

    pub fn primitive(json_type: JsonType, format: Option<&str>) -> Self {
        Self {
            format: format.map(str::to_string),
            ..Self::with_kind(SchemaKind::Primitive(json_type))
        }
    }

    pub fn enumeration(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            enum_values: values,
            ..Self::with_kind(SchemaKind::Enum)
        }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            reference_target: Some(target.into()),
            ..Self::with_kind(SchemaKind::Reference)
        }
    }

    /// A reference whose target is not known yet.
    pub fn placeholder() -> Self {
        Self::with_kind(SchemaKind::Reference)
    }

    pub fn add_property(&mut self, name: impl Into<String>, child: SchemaId) {
        self.properties.insert(name, child);
    }

    /// Turn this node into a pointer at `target`, dropping its own content.
    pub fn as_reference(&mut self, target: impl Into<String>) {
        *self = Self::reference(target);
    }

    /// The `$ref` string other nodes use to point at this one, or `None` for
    /// anonymous nodes.
    pub fn ref_name(&self, prefix: &str) -> Option<String> {
        self.name.as_deref().map(|name| format!("{prefix}{name}"))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<SchemaId> {
        self.properties.get(name)
    }

    pub fn reference_target(&self) -> Option<&str> {
        self.reference_target.as_deref()
    }

    pub fn items(&self) -> Option<SchemaId> {
        self.items
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn enum_values(&self) -> &[String] {
        &self.enum_values
    }

    pub fn is_reference(&self) -> bool {
        self.kind == SchemaKind::Reference
    }

    /// False only for a placeholder still waiting for its target.
    pub fn is_resolved(&self) -> bool {
        !self.is_reference() || self.reference_target.is_some()
    }
}

/// Arena of schema nodes for one compilation.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<Schema>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: Schema) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(schema);
        id
    }

    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: SchemaId) -> Option<&mut Schema> {
        self.nodes.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &Schema)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, schema)| (SchemaId(i as u32), schema))
    }
}

impl Index<SchemaId> for SchemaGraph {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.index()]
    }
}

impl IndexMut<SchemaId> for SchemaGraph {
    fn index_mut(&mut self, id: SchemaId) -> &mut Schema {
        &mut self.nodes[id.index()]
    }
}
