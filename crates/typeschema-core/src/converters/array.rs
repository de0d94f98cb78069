use crate::converters::Converter;
use crate::error::CompileError;
use crate::introspect::Field;
use crate::schema::{Schema, SchemaId};
use crate::session::Session;
use crate::types::{Shape, TypeCatalog, TypeKey};

/// Fixed arrays: an `array` node whose `items` is the element type,
/// converted at field level so composite elements become references.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayConverter;

impl Converter for ArrayConverter {
    fn name(&self) -> &'static str {
        "array-convertor"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        matches!(catalog[key].shape(), Shape::Array(_))
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        let Shape::Array(element) = session.catalog()[key].shape() else {
            return Err(session.no_converter(key));
        };
        let items = session.dispatch_field(&Field::element(key, *element))?;
        Ok(session.graph_mut().insert(Schema::array(Some(items))))
    }
}
