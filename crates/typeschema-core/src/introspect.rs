//! Field discovery for composite types.
//!
//! The compiler never looks at a record's declared fields directly; it asks a
//! [`FieldIntrospector`] which fields are serializable. [`BeanIntrospector`]
//! is the default policy and follows the usual bean conventions: public
//! instance fields, or non-public fields with a matching accessor somewhere
//! in the ancestor chain.

use std::collections::HashSet;

use crate::types::{FieldDef, TypeCatalog, TypeKey, Visibility};

/// A serializable field of a composite type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Declared type of the field.
    pub ty: TypeKey,
    /// The type (the record itself or one of its ancestors) declaring it.
    pub declaring: TypeKey,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeKey, declaring: TypeKey) -> Self {
        Self {
            name: name.into(),
            ty,
            declaring,
        }
    }

    /// Synthetic field standing for the elements of an array or collection.
    pub fn element(container: TypeKey, element: TypeKey) -> Self {
        Self::new("items", element, container)
    }
}

/// Enumerates the serializable fields of a composite type.
///
/// Implementations must return fields in a stable order and at most one
/// field per name.
pub trait FieldIntrospector {
    fn list_fields(&self, catalog: &TypeCatalog, key: TypeKey) -> Vec<Field>;
}

/// Bean-convention field discovery.
///
/// Walks from `key` up through its superclasses. A field name seen on a more
/// derived type shadows the same name further up, whatever either field's
/// visibility. A surviving field is kept when:
///
/// * it is public, non-static and non-final, or
/// * it is not public and some type in the chain declares a method whose
///   lower-cased name is `get<lowercased field name>` (`is<...>` for boolean
///   fields).
///
/// Only the method name is considered; arity and return type are not
/// checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanIntrospector;

impl FieldIntrospector for BeanIntrospector {
    fn list_fields(&self, catalog: &TypeCatalog, key: TypeKey) -> Vec<Field> {
        let mut declared: Vec<(TypeKey, &FieldDef)> = Vec::new();
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut accessors: HashSet<String> = HashSet::new();

        for (current, def) in catalog.ancestors(key) {
            for field in def.fields() {
                if seen_names.insert(field.name.as_str()) {
                    declared.push((current, field));
                }
            }
            accessors.extend(accessor_names(def.methods()));
        }

        declared
            .into_iter()
            .filter(|(_, field)| is_bean_field(catalog, field, &accessors))
            .map(|(declaring, field)| Field::new(field.name.clone(), field.ty, declaring))
            .collect()
    }
}

/// Lower-cased names of all `get*`/`is*` methods.
fn accessor_names(methods: &[String]) -> impl Iterator<Item = String> + '_ {
    methods
        .iter()
        .filter(|m| m.starts_with("get") || m.starts_with("is"))
        .map(|m| m.to_lowercase())
}

fn is_bean_field(catalog: &TypeCatalog, field: &FieldDef, accessors: &HashSet<String>) -> bool {
    if field.visibility == Visibility::Public {
        return !field.is_static && !field.is_final;
    }

    let prefix = if catalog.is_boolean(field.ty) { "is" } else { "get" };
    accessors.contains(&format!("{prefix}{}", field.name.to_lowercase()))
}
