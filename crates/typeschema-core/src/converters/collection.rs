use crate::converters::Converter;
use crate::error::CompileError;
use crate::introspect::Field;
use crate::schema::{Schema, SchemaId};
use crate::session::Session;
use crate::types::{Shape, TypeCatalog, TypeKey};

/// Lists, sets and other collections. Without a declared element type the
/// node has no `items`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionConverter;

impl Converter for CollectionConverter {
    fn name(&self) -> &'static str {
        "collection-convertor"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        matches!(catalog[key].shape(), Shape::Collection(_))
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        let Shape::Collection(element) = session.catalog()[key].shape() else {
            return Err(session.no_converter(key));
        };
        let items = match element {
            Some(element) => Some(session.dispatch_field(&Field::element(key, *element))?),
            None => None,
        };
        Ok(session.graph_mut().insert(Schema::array(items)))
    }
}
