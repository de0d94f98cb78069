use crate::converters::{
    ArrayConverter, CollectionConverter, Converter, EnumConverter, PrimitiveConverter,
};
use crate::error::CompileError;
use crate::introspect::Field;
use crate::schema::{Schema, SchemaId};
use crate::session::Session;
use crate::types::{TypeCatalog, TypeKey};

/// Records and any other type the narrower strategies reject.
///
/// Each record expands at most once per session into a named `object` node
/// (its canonical schema, also listed as a document component). The walk is
/// depth-first; a type is marked in progress before its fields are visited,
/// so a field that leads back to a type still being expanded gets a
/// placeholder instead of another expansion. The placeholder is patched into
/// a `$ref` by a registry fix-up when the outer expansion completes, which
/// happens before [`convert`](Converter::convert) returns.
///
/// At field level ([`convert_field`](Converter::convert_field)) the
/// canonical node is never embedded; the field gets its own reference node.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeConverter;

impl Converter for CompositeConverter {
    fn name(&self) -> &'static str {
        "bean-convertor"
    }

    fn can_convert(&self, catalog: &TypeCatalog, key: TypeKey) -> bool {
        !(PrimitiveConverter.can_convert(catalog, key)
            || ArrayConverter.can_convert(catalog, key)
            || CollectionConverter.can_convert(catalog, key)
            || EnumConverter.can_convert(catalog, key))
    }

    fn convert(&self, session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
        if let Some(done) = session.registry().lookup(key) {
            tracing::trace!(type_name = session.type_name(key), "reusing completed schema");
            return Ok(done);
        }

        if session.registry().is_in_progress(key) {
            return defer_reference(session, key);
        }

        expand(session, key)
    }

    fn convert_field(
        &self,
        session: &mut Session<'_>,
        field: &Field,
    ) -> Result<SchemaId, CompileError> {
        let id = self.convert(session, field.ty)?;
        Ok(reference_to(session, id))
    }
}

/// First visit: build the object, field by field, then publish it.
fn expand(session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
    session.mark_in_progress(key)?;

    let name = session.component_name(key);
    tracing::debug!(
        type_name = session.type_name(key),
        component = %name,
        path = %session.path(),
        "expanding composite type"
    );
    let id = session.graph_mut().insert(Schema::object(name));

    for field in session.list_fields(key) {
        let child = session.dispatch_field(&field)?;
        session.graph_mut()[id].add_property(field.name, child);
    }

    let fired = session.complete(key, id)?;
    if fired > 0 {
        tracing::trace!(
            type_name = session.type_name(key),
            fixups = fired,
            "patched cycle placeholders"
        );
    }
    Ok(id)
}

/// `key` is an ancestor of itself in the current walk.
fn defer_reference(session: &mut Session<'_>, key: TypeKey) -> Result<SchemaId, CompileError> {
    let placeholder = session.graph_mut().insert(Schema::placeholder());
    let prefix = session.options().ref_prefix.clone();

    tracing::trace!(
        type_name = session.type_name(key),
        path = %session.path(),
        "cycle detected, deferring reference"
    );
    session.register_fixup(key, move |graph, done| {
        if let Some(target) = graph[done].ref_name(&prefix) {
            graph[placeholder].as_reference(target);
        }
    })?;
    Ok(placeholder)
}

/// A fresh reference node pointing at `id`, or `id` itself when it is
/// already a reference or has no name to point at.
fn reference_to(session: &mut Session<'_>, id: SchemaId) -> SchemaId {
    let schema = &session.graph()[id];
    if schema.is_reference() {
        return id;
    }
    let target = schema.ref_name(&session.options().ref_prefix);
    match target {
        Some(target) => session.graph_mut().insert(Schema::reference(target)),
        None => id,
    }
}
