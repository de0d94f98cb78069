use crate::converters::Converter;
use crate::error::CompileError;
use crate::schema::{JsonType, Schema, SchemaId};
use crate::session::Session;
use crate::types::{Primitive, Shape, TypeCatalog, TypeKey};

/// Scalars: maps each [`Primitive`] onto a JSON `type` and `format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveConverter;

impl PrimitiveConverter {
    pub fn schema_type(primitive: Primitive) -> (JsonType, Option<&'static str>) {
        match primitive {
            Primitive::Boolean => (JsonType::Boolean, None),
            Primitive::Byte | Primitive::Short | Primitive::Int => {
                (JsonType::Integer, Some("int32"))
            }
            Primitive::Long => (JsonType::Integer, Some("int64")),
            Primitive::Float => (JsonType::Number, Some("float")),
            Primitive::Double => (JsonType::Number, Some("double")),
            Primitive::Decimal => (JsonType::Number, None),
            Primitive::Char | Primitive::String => (JsonType::String, None),
            Primitive::Date => (JsonType::String, Some("date")),
            Primitive::DateTime => (JsonType::String, Some("date-time")),
        }
    }
}

impl Converter for PrimitiveConverter {
    fn name(&self) -> &'static str {
        "primitive-convertor"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        matches!(catalog[key].shape(), Shape::Primitive(_))
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        let Shape::Primitive(primitive) = session.catalog()[key].shape() else {
            return Err(session.no_converter(key));
        };
        let (json_type, format) = Self::schema_type(*primitive);
        Ok(session
            .graph_mut()
            .insert(Schema::primitive(json_type, format)))
    }
}
