//! Conversion strategies.
//!
//! Each strategy claims a family of types through [`Converter::can_convert`]
//! and builds their schema nodes. The [`Dispatcher`](crate::dispatch::Dispatcher)
//! tries strategies in registration order, so the narrow guards (primitive,
//! array, collection, enum) sit in front of the catch-all composite strategy.

mod array;
mod collection;
mod composite;
mod enumeration;
mod primitive;

pub use array::ArrayConverter;
pub use collection::CollectionConverter;
pub use composite::CompositeConverter;
pub use enumeration::EnumConverter;
pub use primitive::PrimitiveConverter;

use crate::error::CompileError;
use crate::introspect::Field;
use crate::schema::SchemaId;
use crate::session::Session;
use crate::types::{TypeCatalog, TypeKey};

/// A strategy turning one family of types into schema nodes.
///
/// Converters recurse through [`Session::dispatch_field`] rather than
/// calling each other, so every nested conversion goes through the same
/// depth guard and selection order.
pub trait Converter: Send + Sync {
    /// Stable identifier, used in logs.
    fn name(&self) -> &'static str;

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool;

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError>;

    /// Convert the declared type of `field`, for strategies that need to know
    /// where a type is used. Defaults to [`convert`](Self::convert).
    fn convert_field(
        &self,
        session: &mut Session<'_>,
        field: &Field,
    ) -> Result<SchemaId, CompileError> {
        self.convert(session, field.ty)
    }
}
