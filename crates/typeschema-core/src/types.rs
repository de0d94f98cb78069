//! The input type graph.
//!
//! A [`TypeCatalog`] is the compiler's view of "the program's types": every
//! composite record, enum, array, collection and primitive the walk may reach.
//! Catalogs are built from serde-friendly [`TypeDescriptor`]s (usually loaded
//! from JSON) which name each other by qualified name; building the catalog
//! resolves those names into copyable [`TypeKey`] handles and validates the
//! graph once, so the compiler never has to deal with dangling names.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity of a type within one [`TypeCatalog`].
///
/// Two types may share a simple name; they never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
    fn from_index(index: usize) -> Self {
        TypeKey(index as u32)
    }

    /// Position of this type in its catalog.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Descriptors (serialized form)
// ---------------------------------------------------------------------------

/// Scalar types understood by the primitive converter.
///
/// Every primitive is pre-declared in each catalog under its kebab-case name
/// (`int`, `date-time`, ...), so descriptors can use those names directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Char,
    String,
    Date,
    DateTime,
}

impl Primitive {
    pub const ALL: [Primitive; 12] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Decimal,
        Primitive::Char,
        Primitive::String,
        Primitive::Date,
        Primitive::DateTime,
    ];

    /// The built-in catalog name of this primitive.
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::Char => "char",
            Primitive::String => "string",
            Primitive::Date => "date",
            Primitive::DateTime => "date-time",
        }
    }
}

/// Member visibility, as reported by the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

/// A declared field of a record, in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Qualified name of the field's declared type.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static", skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, rename = "final", skip_serializing_if = "is_false")]
    pub is_final: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            visibility,
            is_static: false,
            is_final: false,
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// Shape of a type, in serialized form. Element types are qualified names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Primitive {
        primitive: Primitive,
    },
    Array {
        element: String,
    },
    Collection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
    },
    Enum {
        variants: Vec<String>,
    },
    Record,
}

/// One type declaration, in serialized form.
///
/// ```json
/// { "name": "demo.Node", "kind": "record",
///   "fields": [ { "name": "next", "type": "demo.Node", "visibility": "public" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Qualified name; the identity of the type.
    pub name: String,
    /// Display name. Defaults to the last `.`/`$` segment of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_name: Option<String>,
    #[serde(flatten)]
    pub shape: TypeShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    /// Names of the methods declared directly on this type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            simple_name: None,
            shape,
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// Top-level JSON document accepted by [`TypeCatalog::from_json`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub types: Vec<TypeDescriptor>,
}

// ---------------------------------------------------------------------------
// Resolved form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Primitive(Primitive),
    Array(TypeKey),
    Collection(Option<TypeKey>),
    Enum(Vec<String>),
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeKey,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    qualified_name: String,
    simple_name: String,
    shape: Shape,
    superclass: Option<TypeKey>,
    fields: Vec<FieldDef>,
    methods: Vec<String>,
}

impl TypeDef {
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn superclass(&self) -> Option<TypeKey> {
        self.superclass
    }

    /// Fields declared directly on this type, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Methods declared directly on this type.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

fn default_simple_name(qualified: &str) -> &str {
    qualified
        .rsplit(|c: char| c == '.' || c == '$')
        .next()
        .unwrap_or(qualified)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// An immutable, validated set of types.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeKey>,
}

impl TypeCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Parse a [`CatalogDocument`] from JSON text and build the catalog.
    pub fn from_json(text: &str) -> Result<Self, CompileError> {
        let doc: CatalogDocument = serde_json::from_str(text)?;
        Self::from_descriptors(doc.types)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CompileError> {
        let doc: CatalogDocument = serde_json::from_reader(reader)?;
        Self::from_descriptors(doc.types)
    }

    /// Resolve and validate a set of descriptors.
    ///
    /// Fails when a name is declared twice (including shadowing a built-in
    /// primitive), when any referenced type is undeclared, or when a
    /// superclass chain or an array/collection element chain loops.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<Self, CompileError> {
        let descriptors: Vec<TypeDescriptor> = descriptors.into_iter().collect();
        let builtin_count = Primitive::ALL.len();

        let mut by_name: HashMap<String, TypeKey> = HashMap::new();
        for (i, primitive) in Primitive::ALL.iter().enumerate() {
            by_name.insert(primitive.as_str().to_string(), TypeKey::from_index(i));
        }
        for (i, desc) in descriptors.iter().enumerate() {
            if desc.name.is_empty() {
                return Err(CompileError::catalog("type declared with an empty name"));
            }
            let key = TypeKey::from_index(builtin_count + i);
            if by_name.insert(desc.name.clone(), key).is_some() {
                return Err(CompileError::catalog(format!(
                    "type `{}` is declared more than once",
                    desc.name
                )));
            }
        }

        let resolve = |name: &str, context: &dyn Fn() -> String| -> Result<TypeKey, CompileError> {
            by_name.get(name).copied().ok_or_else(|| {
                CompileError::catalog(format!("type `{name}` referenced by {} is not declared", context()))
            })
        };

        let mut types = Vec::with_capacity(builtin_count + descriptors.len());
        for primitive in Primitive::ALL {
            types.push(TypeDef {
                qualified_name: primitive.as_str().to_string(),
                simple_name: primitive.as_str().to_string(),
                shape: Shape::Primitive(primitive),
                superclass: None,
                fields: Vec::new(),
                methods: Vec::new(),
            });
        }

        for desc in descriptors {
            let owner = desc.name.as_str();
            let shape = match &desc.shape {
                TypeShape::Primitive { primitive } => Shape::Primitive(*primitive),
                TypeShape::Array { element } => {
                    Shape::Array(resolve(element, &|| format!("the elements of `{owner}`"))?)
                }
                TypeShape::Collection { element } => Shape::Collection(
                    element
                        .as_deref()
                        .map(|e| resolve(e, &|| format!("the elements of `{owner}`")))
                        .transpose()?,
                ),
                TypeShape::Enum { variants } => Shape::Enum(variants.clone()),
                TypeShape::Record => Shape::Record,
            };
            let superclass = desc
                .superclass
                .as_deref()
                .map(|s| resolve(s, &|| format!("the superclass of `{owner}`")))
                .transpose()?;
            let fields = desc
                .fields
                .iter()
                .map(|f| -> Result<FieldDef, CompileError> {
                    Ok(FieldDef {
                        name: f.name.clone(),
                        ty: resolve(&f.type_name, &|| format!("field `{}` of `{owner}`", f.name))?,
                        visibility: f.visibility,
                        is_static: f.is_static,
                        is_final: f.is_final,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let simple_name = desc
                .simple_name
                .clone()
                .unwrap_or_else(|| default_simple_name(&desc.name).to_string());

            types.push(TypeDef {
                qualified_name: desc.name,
                simple_name,
                shape,
                superclass,
                fields,
                methods: desc.methods,
            });
        }

        let catalog = TypeCatalog { types, by_name };
        catalog.check_superclass_chains()?;
        catalog.check_element_chains()?;
        Ok(catalog)
    }

    fn check_superclass_chains(&self) -> Result<(), CompileError> {
        for (i, def) in self.types.iter().enumerate() {
            let mut seen = HashSet::from([TypeKey::from_index(i)]);
            let mut current = def.superclass;
            while let Some(parent) = current {
                if !seen.insert(parent) {
                    return Err(CompileError::catalog(format!(
                        "superclass chain of `{}` is cyclic",
                        def.qualified_name
                    )));
                }
                current = self[parent].superclass;
            }
        }
        Ok(())
    }

    fn check_element_chains(&self) -> Result<(), CompileError> {
        for (i, def) in self.types.iter().enumerate() {
            let mut seen = HashSet::from([TypeKey::from_index(i)]);
            let mut current = element_of(&def.shape);
            while let Some(element) = current {
                if !seen.insert(element) {
                    return Err(CompileError::catalog(format!(
                        "element chain of `{}` is cyclic",
                        def.qualified_name
                    )));
                }
                current = element_of(&self[element].shape);
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup), but unknown names are an error.
    pub fn require(&self, name: &str) -> Result<TypeKey, CompileError> {
        self.lookup(name).ok_or_else(|| CompileError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn get(&self, key: TypeKey) -> Option<&TypeDef> {
        self.types.get(key.index())
    }

    /// Key of a built-in primitive.
    pub fn primitive(&self, primitive: Primitive) -> TypeKey {
        // Built-ins occupy the first slots in `Primitive::ALL` order.
        let index = Primitive::ALL
            .iter()
            .position(|p| *p == primitive)
            .unwrap_or_default();
        TypeKey::from_index(index)
    }

    pub fn is_boolean(&self, key: TypeKey) -> bool {
        matches!(self[key].shape, Shape::Primitive(Primitive::Boolean))
    }

    /// `key` followed by each of its ancestors, most-derived first.
    pub fn ancestors(&self, key: TypeKey) -> Ancestors<'_> {
        Ancestors {
            catalog: self,
            next: Some(key),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All types, built-in primitives first, then declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, def)| (TypeKey::from_index(i), def))
    }
}

fn element_of(shape: &Shape) -> Option<TypeKey> {
    match shape {
        Shape::Array(element) => Some(*element),
        Shape::Collection(element) => *element,
        _ => None,
    }
}

impl Index<TypeKey> for TypeCatalog {
    type Output = TypeDef;

    fn index(&self, key: TypeKey) -> &TypeDef {
        &self.types[key.index()]
    }
}

pub struct Ancestors<'a> {
    catalog: &'a TypeCatalog,
    next: Option<TypeKey>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (TypeKey, &'a TypeDef);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        let def = &self.catalog[key];
        self.next = def.superclass;
        Some((key, def))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Declare a catalog in code.
///
/// ```
/// use typeschema_core::types::TypeCatalog;
///
/// let catalog = TypeCatalog::builder()
///     .record("demo.Node", |r| r.field("value", "int").field("next", "demo.Node"))
///     .build()
///     .unwrap();
/// assert!(catalog.lookup("demo.Node").is_some());
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    descriptors: Vec<TypeDescriptor>,
}

impl CatalogBuilder {
    pub fn record(mut self, name: &str, build: impl FnOnce(RecordBuilder) -> RecordBuilder) -> Self {
        let record = build(RecordBuilder {
            descriptor: TypeDescriptor::new(name, TypeShape::Record),
        });
        self.descriptors.push(record.descriptor);
        self
    }

    pub fn enumeration(mut self, name: &str, variants: &[&str]) -> Self {
        self.descriptors.push(TypeDescriptor::new(
            name,
            TypeShape::Enum {
                variants: variants.iter().map(|v| v.to_string()).collect(),
            },
        ));
        self
    }

    pub fn array(mut self, name: &str, element: &str) -> Self {
        self.descriptors.push(TypeDescriptor::new(
            name,
            TypeShape::Array {
                element: element.to_string(),
            },
        ));
        self
    }

    pub fn collection(mut self, name: &str, element: Option<&str>) -> Self {
        self.descriptors.push(TypeDescriptor::new(
            name,
            TypeShape::Collection {
                element: element.map(str::to_string),
            },
        ));
        self
    }

    pub fn primitive(mut self, name: &str, primitive: Primitive) -> Self {
        self.descriptors
            .push(TypeDescriptor::new(name, TypeShape::Primitive { primitive }));
        self
    }

    pub fn descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> Result<TypeCatalog, CompileError> {
        TypeCatalog::from_descriptors(self.descriptors)
    }
}

pub struct RecordBuilder {
    descriptor: TypeDescriptor,
}

impl RecordBuilder {
    pub fn extends(mut self, superclass: &str) -> Self {
        self.descriptor.superclass = Some(superclass.to_string());
        self
    }

    pub fn simple_name(mut self, name: &str) -> Self {
        self.descriptor.simple_name = Some(name.to_string());
        self
    }

    /// Add a public instance field.
    pub fn field(self, name: &str, type_name: &str) -> Self {
        self.field_with(FieldDescriptor::new(name, type_name, Visibility::Public))
    }

    pub fn private_field(self, name: &str, type_name: &str) -> Self {
        self.field_with(FieldDescriptor::new(name, type_name, Visibility::Private))
    }

    pub fn field_with(mut self, field: FieldDescriptor) -> Self {
        self.descriptor.fields.push(field);
        self
    }

    pub fn method(mut self, name: &str) -> Self {
        self.descriptor.methods.push(name.to_string());
        self
    }
}
