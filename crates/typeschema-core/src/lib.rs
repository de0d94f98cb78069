//! Compile a graph of structural types into a `$ref`-linked schema document.
//!
//! Types are described by a [`TypeCatalog`]: records with fields, arrays,
//! collections, enums and built-in primitives. [`Compiler`] walks the graph
//! from one or more roots, expanding each record into a named `object`
//! component exactly once and pointing every use site at it with a reference.
//! Cycles are broken with placeholders that are patched as soon as the type
//! they point at finishes expanding.
//!
//! ```
//! use typeschema_core::{compile, CompileOptions, TypeCatalog};
//!
//! let catalog = TypeCatalog::builder()
//!     .record("demo.Node", |r| r.field("value", "int").field("next", "demo.Node"))
//!     .build()
//!     .unwrap();
//! let node = catalog.require("demo.Node").unwrap();
//!
//! let doc = compile(&catalog, node, &CompileOptions::default()).unwrap();
//! let root = &doc[doc.root().unwrap()];
//! let next = &doc[root.property("next").unwrap()];
//! assert_eq!(next.reference_target(), Some("#/components/schemas/Node"));
//! ```

pub mod compiler;
pub mod config;
pub mod converters;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod introspect;
pub mod registry;
pub mod schema;
pub mod session;
pub mod types;

pub use compiler::Compiler;
pub use config::CompileOptions;
pub use converters::Converter;
pub use dispatch::Dispatcher;
pub use document::SchemaDocument;
pub use error::{CompileError, ErrorCode, RegistryError};
pub use introspect::{BeanIntrospector, Field, FieldIntrospector};
pub use schema::{JsonType, Schema, SchemaGraph, SchemaId, SchemaKind};
pub use session::Session;
pub use types::{CatalogBuilder, Primitive, TypeCatalog, TypeDescriptor, TypeKey, Visibility};

/// Compile a single root with the standard converters and bean
/// introspection.
pub fn compile(
    catalog: &TypeCatalog,
    root: TypeKey,
    options: &CompileOptions,
) -> Result<SchemaDocument, CompileError> {
    Compiler::new(options.clone()).compile(catalog, root)
}
