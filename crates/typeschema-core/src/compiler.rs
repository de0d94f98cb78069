//! Entry point tying a dispatcher, an introspector and options together.

use std::fmt;

use crate::config::CompileOptions;
use crate::dispatch::Dispatcher;
use crate::document::SchemaDocument;
use crate::error::CompileError;
use crate::introspect::{BeanIntrospector, FieldIntrospector};
use crate::session::Session;
use crate::types::{TypeCatalog, TypeKey};

/// Reusable schema compiler.
///
/// A `Compiler` holds no per-build state: each call to
/// [`compile`](Self::compile) or [`compile_many`](Self::compile_many) runs in
/// a fresh [`Session`], so one compiler can be shared across threads.
pub struct Compiler {
    dispatcher: Dispatcher,
    introspector: Box<dyn FieldIntrospector + Send + Sync>,
    options: CompileOptions,
}

impl Compiler {
    /// Standard converters and bean introspection.
    pub fn new(options: CompileOptions) -> Self {
        Self {
            dispatcher: Dispatcher::standard(),
            introspector: Box::new(BeanIntrospector),
            options,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_introspector(
        mut self,
        introspector: impl FieldIntrospector + Send + Sync + 'static,
    ) -> Self {
        self.introspector = Box::new(introspector);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Open a session for incremental use. Most callers want
    /// [`compile`](Self::compile) instead.
    pub fn session<'a>(&'a self, catalog: &'a TypeCatalog) -> Session<'a> {
        Session::new(catalog, &self.options, &self.dispatcher, self.introspector.as_ref())
    }

    pub fn compile(&self, catalog: &TypeCatalog, root: TypeKey) -> Result<SchemaDocument, CompileError> {
        self.compile_many(catalog, [root])
    }

    /// Compile several roots into one document. Types shared between roots
    /// are expanded once.
    pub fn compile_many(
        &self,
        catalog: &TypeCatalog,
        roots: impl IntoIterator<Item = TypeKey>,
    ) -> Result<SchemaDocument, CompileError> {
        let mut session = self.session(catalog);
        for root in roots {
            session.compile_root(root)?;
        }
        session.finish()
    }

    /// Like [`compile_many`](Self::compile_many), with roots given by
    /// qualified name.
    pub fn compile_by_name<S: AsRef<str>>(
        &self,
        catalog: &TypeCatalog,
        roots: &[S],
    ) -> Result<SchemaDocument, CompileError> {
        let keys = roots
            .iter()
            .map(|name| catalog.require(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.compile_many(catalog, keys)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dispatcher", &self.dispatcher)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
