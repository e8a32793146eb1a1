//! The stub index extractor.
//!
//! One stateless operation per stub kind. Each operation reads only the stub
//! it is given (plus, for class objects and package attribution, a few parent
//! links) and reports occurrences to the sink. Nothing is cached between
//! calls, so a single service can be shared by every indexing thread.

use thiserror::Error;
use tracing::trace;

use super::{IndexId, IndexRegistry, IndexSink};
use crate::name::{FqName, Name, CLASS_OBJECT_NAME};
use crate::stubs::{
    AnnotationEntryStub, ClassOrObjectStub, FileStub, FunctionStub, PropertyStub, Stub, StubId,
};

/// Defects in the shape of a stub tree.
///
/// These point at a broken stub producer, not at malformed source, and abort
/// indexing of the affected file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubIndexError {
    #[error("class object {object} in {path} is owned by {found}, expected a class or object")]
    ClassObjectOwner {
        path: String,
        object: StubId,
        found: String,
    },
}

/// Index entry extraction, one operation per stub kind.
pub trait StubIndexService: Send + Sync {
    fn index_file(&self, stub: &Stub<'_, FileStub>, sink: &mut dyn IndexSink);

    fn index_class(&self, stub: &Stub<'_, ClassOrObjectStub>, sink: &mut dyn IndexSink);

    /// Fails only when a class object's owner cannot be resolved.
    fn index_object(
        &self,
        stub: &Stub<'_, ClassOrObjectStub>,
        sink: &mut dyn IndexSink,
    ) -> Result<(), StubIndexError>;

    fn index_function(&self, stub: &Stub<'_, FunctionStub>, sink: &mut dyn IndexSink);

    fn index_property(&self, stub: &Stub<'_, PropertyStub>, sink: &mut dyn IndexSink);

    fn index_annotation(&self, stub: &Stub<'_, AnnotationEntryStub>, sink: &mut dyn IndexSink);
}

/// The extractor. Borrows the registry; holds nothing else.
#[derive(Debug, Clone, Copy)]
pub struct StubIndexServiceImpl<'r> {
    registry: &'r IndexRegistry,
}

impl StubIndexServiceImpl<'static> {
    /// Extractor over the process-wide registry.
    pub fn global() -> Self {
        Self::new(IndexRegistry::global())
    }
}

impl Default for StubIndexServiceImpl<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'r> StubIndexServiceImpl<'r> {
    pub fn new(registry: &'r IndexRegistry) -> Self {
        Self { registry }
    }

    fn emit(&self, sink: &mut dyn IndexSink, index: IndexId, value: &str) {
        sink.occurrence(self.registry.key(index), value);
    }

    /// Short name, full name, supertypes and package for a class-like stub.
    fn index_class_like(
        &self,
        stub: &Stub<'_, ClassOrObjectStub>,
        name: Option<&str>,
        fq_name: Option<&FqName>,
        sink: &mut dyn IndexSink,
    ) {
        if let Some(name) = name {
            self.emit(sink, IndexId::ClassesByShortName, name);
        }
        if let Some(fq_name) = fq_name {
            self.emit(sink, IndexId::ClassesByFullName, fq_name.as_str());
        }
        self.index_super_names(stub, sink);
        self.record_class_or_object_by_package(stub, sink);
    }

    /// Supertype names are recorded as written. A hit in this index is only a
    /// candidate: aliases and same-named types in other scopes are not told apart.
    fn index_super_names(&self, stub: &Stub<'_, ClassOrObjectStub>, sink: &mut dyn IndexSink) {
        for super_name in &stub.super_names {
            self.emit(sink, IndexId::SupertypeReferences, super_name);
        }
    }

    /// Only direct children of the file are attributed to its package.
    fn record_class_or_object_by_package(
        &self,
        stub: &Stub<'_, ClassOrObjectStub>,
        sink: &mut dyn IndexSink,
    ) {
        if let Some(file) = stub.parent_stub().and_then(|p| p.as_file()) {
            self.emit(
                sink,
                IndexId::ClassesByPackage,
                file.package_fq_name.as_str(),
            );
        }
    }

    /// Resolve the fq name of the class owning a class object.
    ///
    /// The owner is exactly three hops up: object, class object wrapper,
    /// class body, owner.
    fn class_object_owner_fq_name(
        &self,
        stub: &Stub<'_, ClassOrObjectStub>,
    ) -> Result<Option<FqName>, StubIndexError> {
        let node = stub.node();
        let owner = node
            .parent_stub()
            .and_then(|p| p.parent_stub())
            .and_then(|p| p.parent_stub());

        match owner.as_ref().and_then(|o| o.as_class_or_object()) {
            Some(owner) => Ok(owner.fq_name.clone()),
            None => Err(StubIndexError::ClassObjectOwner {
                path: node.tree().path().to_string(),
                object: node.id(),
                found: owner
                    .map(|o| format!("{:?}", o))
                    .unwrap_or_else(|| "nothing".to_string()),
            }),
        }
    }
}

impl StubIndexService for StubIndexServiceImpl<'_> {
    fn index_file(&self, stub: &Stub<'_, FileStub>, sink: &mut dyn IndexSink) {
        self.emit(
            sink,
            IndexId::PackagesByName,
            stub.package_fq_name.as_str(),
        );
    }

    fn index_class(&self, stub: &Stub<'_, ClassOrObjectStub>, sink: &mut dyn IndexSink) {
        self.index_class_like(stub, stub.name.as_deref(), stub.fq_name.as_ref(), sink);
    }

    fn index_object(
        &self,
        stub: &Stub<'_, ClassOrObjectStub>,
        sink: &mut dyn IndexSink,
    ) -> Result<(), StubIndexError> {
        if stub.is_class_object {
            let owner_fq_name = self.class_object_owner_fq_name(stub)?;
            let fq_name = owner_fq_name.map(|owner| owner.child(&Name::class_object()));
            trace!(object = %stub.node().id(), ?fq_name, "indexing class object");
            self.index_class_like(stub, Some(CLASS_OBJECT_NAME), fq_name.as_ref(), sink);
            return Ok(());
        }

        if let Some(name) = stub.name.as_deref() {
            if stub.is_top_level {
                self.emit(sink, IndexId::TopLevelObjectsByShortName, name);
            }
        }
        self.index_class_like(stub, stub.name.as_deref(), stub.fq_name.as_ref(), sink);
        Ok(())
    }

    fn index_function(&self, stub: &Stub<'_, FunctionStub>, sink: &mut dyn IndexSink) {
        if let Some(name) = stub.name.as_deref() {
            self.emit(sink, IndexId::FunctionsByShortName, name);

            // Only top-level functions are offered in completion without an import.
            if stub.is_top_level {
                let index = if stub.is_extension {
                    IndexId::TopLevelExtensionFunctionsByShortName
                } else {
                    IndexId::TopLevelNonExtensionFunctionsByShortName
                };
                self.emit(sink, index, name);
            }

            if stub.is_probably_nothing_type {
                self.emit(sink, IndexId::ProbablyNothingFunctionsByShortName, name);
            }
        }

        // Nameless but syntactically broken functions may still carry an fq name.
        if let Some(fq_name) = &stub.fq_name {
            self.emit(sink, IndexId::TopLevelFunctionsByFullName, fq_name.as_str());
        }
    }

    fn index_property(&self, stub: &Stub<'_, PropertyStub>, sink: &mut dyn IndexSink) {
        if let Some(name) = stub.name.as_deref() {
            self.emit(sink, IndexId::PropertiesByShortName, name);

            if stub.is_top_level {
                let index = if stub.has_receiver_type_ref {
                    IndexId::TopLevelExtensionPropertiesByShortName
                } else {
                    IndexId::TopLevelNonExtensionPropertiesByShortName
                };
                self.emit(sink, index, name);
            }

            if stub.is_probably_nothing_type {
                self.emit(sink, IndexId::ProbablyNothingPropertiesByShortName, name);
            }
        }

        if stub.is_top_level {
            if let Some(fq_name) = &stub.fq_name {
                self.emit(sink, IndexId::TopLevelPropertiesByFullName, fq_name.as_str());
            }
        }
    }

    fn index_annotation(&self, stub: &Stub<'_, AnnotationEntryStub>, sink: &mut dyn IndexSink) {
        self.emit(sink, IndexId::AnnotationsByShortName, &stub.short_name);
    }
}
