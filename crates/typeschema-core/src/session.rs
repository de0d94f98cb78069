//! One schema build.
//!
//! A [`Session`] owns everything that changes while types are converted: the
//! schema arena, the type registry, the component-name table and the current
//! walk position. Sessions are cheap and single-use; two sessions never share
//! state, so independent builds can run side by side on one
//! [`Compiler`](crate::compiler::Compiler).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::CompileOptions;
use crate::dispatch::Dispatcher;
use crate::document::SchemaDocument;
use crate::error::{CompileError, RegistryError};
use crate::introspect::{Field, FieldIntrospector};
use crate::registry::TypeRegistry;
use crate::schema::{SchemaGraph, SchemaId};
use crate::types::{TypeCatalog, TypeKey};

pub struct Session<'a> {
    catalog: &'a TypeCatalog,
    options: &'a CompileOptions,
    dispatcher: &'a Dispatcher,
    introspector: &'a dyn FieldIntrospector,
    graph: SchemaGraph,
    registry: TypeRegistry,
    names: ComponentNames,
    roots: Vec<SchemaId>,
    path: Vec<String>,
    depth: usize,
}

impl<'a> Session<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        options: &'a CompileOptions,
        dispatcher: &'a Dispatcher,
        introspector: &'a dyn FieldIntrospector,
    ) -> Self {
        Self {
            catalog,
            options,
            dispatcher,
            introspector,
            graph: SchemaGraph::new(),
            registry: TypeRegistry::new(),
            names: ComponentNames::default(),
            roots: Vec::new(),
            path: Vec::new(),
            depth: 0,
        }
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    pub fn options(&self) -> &'a CompileOptions {
        self.options
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SchemaGraph {
        &mut self.graph
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Qualified name of `key`, for messages and logs.
    pub fn type_name(&self, key: TypeKey) -> &'a str {
        self.catalog[key].qualified_name()
    }

    /// Current walk position, e.g. `Order.customer.address`.
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn list_fields(&self, key: TypeKey) -> Vec<Field> {
        self.introspector.list_fields(self.catalog, key)
    }

    /// The component name for `key`, assigned on first request.
    pub fn component_name(&mut self, key: TypeKey) -> String {
        self.names.name_for(self.catalog, key)
    }

    // -- registry protocol -------------------------------------------------

    pub fn mark_in_progress(&mut self, key: TypeKey) -> Result<(), CompileError> {
        self.registry
            .mark_in_progress(key)
            .map_err(|source| self.registry_error(key, source))
    }

    /// Publish `schema` as the finished expansion of `key`; returns the
    /// number of fix-ups that fired.
    pub fn complete(&mut self, key: TypeKey, schema: SchemaId) -> Result<usize, CompileError> {
        self.registry
            .complete(key, schema, &mut self.graph)
            .map_err(|source| self.registry_error(key, source))
    }

    pub fn register_fixup(
        &mut self,
        key: TypeKey,
        fixup: impl FnOnce(&mut SchemaGraph, SchemaId) + 'static,
    ) -> Result<(), CompileError> {
        self.registry
            .register_callback(key, fixup)
            .map_err(|source| self.registry_error(key, source))
    }

    fn registry_error(&self, key: TypeKey, source: RegistryError) -> CompileError {
        CompileError::Registry {
            type_name: self.type_name(key).to_string(),
            source,
        }
    }

    pub fn no_converter(&self, key: TypeKey) -> CompileError {
        CompileError::NoConverter {
            path: self.path(),
            type_name: self.type_name(key).to_string(),
        }
    }

    // -- walking -------------------------------------------------------------

    /// Convert the declared type of `field` one level below the current
    /// position.
    pub fn dispatch_field(&mut self, field: &Field) -> Result<SchemaId, CompileError> {
        self.enter(&field.name)?;
        let dispatcher = self.dispatcher;
        let result = dispatcher.dispatch_field(self, field);
        self.leave();
        result
    }

    fn enter(&mut self, segment: &str) -> Result<(), CompileError> {
        self.path.push(segment.to_string());
        self.depth += 1;
        if self.depth > self.options.max_depth {
            let err = CompileError::DepthExceeded {
                path: self.path(),
                max_depth: self.options.max_depth,
            };
            self.leave();
            return Err(err);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.path.pop();
        self.depth = self.depth.saturating_sub(1);
    }

    /// Convert a root type. Converting the same root again in this session
    /// returns the schema produced the first time.
    /// Fails with [`CompileError::UnknownType`] if `key` belongs to another
    /// catalog.
    pub fn compile_root(&mut self, key: TypeKey) -> Result<SchemaId, CompileError> {
        let catalog = self.catalog;
        let def = catalog.get(key).ok_or_else(|| CompileError::UnknownType {
            name: key.to_string(),
        })?;
        tracing::debug!(root = def.qualified_name(), "compiling root type");
        self.path.clear();
        self.depth = 0;
        self.path.push(def.simple_name().to_string());

        let dispatcher = self.dispatcher;
        let id = dispatcher.dispatch(self, key)?;

        self.path.clear();
        self.roots.push(id);
        Ok(id)
    }

    /// Close the session and hand back the finished document.
    pub fn finish(self) -> Result<SchemaDocument, CompileError> {
        if let Some(key) = self.registry.first_pending() {
            return Err(CompileError::UnresolvedReference {
                type_name: self.type_name(key).to_string(),
            });
        }

        let components: Vec<(String, SchemaId)> = self
            .registry
            .completed()
            .map(|(key, id)| {
                let name = self.graph[id]
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.catalog[key].simple_name().to_string());
                (name, id)
            })
            .collect();
        let by_type: HashMap<TypeKey, SchemaId> = self.registry.completed().collect();

        tracing::debug!(
            roots = self.roots.len(),
            components = components.len(),
            nodes = self.graph.len(),
            "schema compilation finished"
        );
        Ok(SchemaDocument::new(
            self.graph,
            self.roots,
            components,
            by_type,
            self.options.ref_prefix.clone(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Component naming
// ---------------------------------------------------------------------------

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("component name pattern is valid"))
}

/// Replace characters not allowed in a component name with `_`.
pub fn sanitize_component_name(raw: &str) -> String {
    name_pattern().replace_all(raw, "_").into_owned()
}

/// Session-wide component names. A type keeps its simple name unless another
/// type already took it; then its qualified name is used, and a numeric
/// suffix as a last resort.
#[derive(Debug, Default)]
struct ComponentNames {
    taken: HashMap<String, TypeKey>,
    assigned: HashMap<TypeKey, String>,
}

impl ComponentNames {
    fn name_for(&mut self, catalog: &TypeCatalog, key: TypeKey) -> String {
        if let Some(name) = self.assigned.get(&key) {
            return name.clone();
        }

        let def = &catalog[key];
        let mut name = sanitize_component_name(def.simple_name());
        if self.taken.contains_key(&name) {
            name = sanitize_component_name(def.qualified_name());
        }
        let base = name.clone();
        let mut suffix = 2;
        while self.taken.contains_key(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.taken.insert(name.clone(), key);
        self.assigned.insert(key, name.clone());
        name
    }
}
