use crate::converters::Converter;
use crate::error::CompileError;
use crate::schema::{Schema, SchemaId};
use crate::session::Session;
use crate::types::{Shape, TypeCatalog, TypeKey};

/// Enums render inline as a string enumeration of their variant names.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumConverter;

impl Converter for EnumConverter {
    fn name(&self) -> &'static str {
        "enum-convertor"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        matches!(catalog[key].shape(), Shape::Enum(_))
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        let def = &session.catalog()[key];
        let Shape::Enum(variants) = def.shape() else {
            return Err(session.no_converter(key));
        };
        let schema = Schema::enumeration(def.simple_name(), variants.clone());
        Ok(session.graph_mut().insert(schema))
    }
}
