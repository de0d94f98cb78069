//! Converter selection.

use std::fmt;

use crate::converters::{
    ArrayConverter, CollectionConverter, CompositeConverter, Converter, EnumConverter,
    PrimitiveConverter,
};
use crate::error::CompileError;
use crate::introspect::Field;
use crate::schema::SchemaId;
use crate::session::Session;
use crate::types::TypeKey;

/// Ordered list of converters. The first one whose
/// [`can_convert`](Converter::can_convert) accepts a type handles it.
#[derive(Default)]
pub struct Dispatcher {
    converters: Vec<Box<dyn Converter>>,
}

impl Dispatcher {
    /// A dispatcher with no converters; every type is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set: primitive, array, collection, enum, then the
    /// composite catch-all.
    pub fn standard() -> Self {
        Self::new()
            .with(PrimitiveConverter)
            .with(ArrayConverter)
            .with(CollectionConverter)
            .with(EnumConverter)
            .with(CompositeConverter)
    }

    pub fn with(mut self, converter: impl Converter + 'static) -> Self {
        self.register(converter);
        self
    }

    /// Append `converter` after the ones already registered.
    pub fn register(&mut self, converter: impl Converter + 'static) {
        self.converters.push(Box::new(converter));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    pub fn select(&self, session: &Session<'_>, key: TypeKey) -> Option<&dyn Converter> {
        let catalog = session.catalog();
        self.converters
            .iter()
            .find(|c| c.can_convert(catalog, key))
            .map(|c| c.as_ref())
    }

    pub fn dispatch(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        let converter = self.select(session, key).ok_or_else(|| session.no_converter(key))?;
        tracing::trace!(
            converter = converter.name(),
            type_name = session.type_name(key),
            "dispatching type"
        );
        converter.convert(session, key)
    }

    pub fn dispatch_field(
        &self,
        session: &mut Session<'_>,
        field: &Field,
    ) -> Result<SchemaId, CompileError> {
        let converter = self
            .select(session, field.ty)
            .ok_or_else(|| session.no_converter(field.ty))?;
        tracing::trace!(
            converter = converter.name(),
            field = %field.name,
            type_name = session.type_name(field.ty),
            "dispatching field"
        );
        converter.convert_field(session, field)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("converters", &self.names())
            .finish()
    }
}
