//! Declaration stubs: syntax-only nodes describing one file's declarations.
//!
//! Stubs are produced by a parser outside this crate and are immutable once
//! built. Each file yields one [`StubTree`] whose root is the file stub; every
//! other node carries a single back-reference to its parent.
//!
//! # Tree shape
//!
//! ```text
//! File
//! ├── Class / Object
//! │   ├── ModifierList ── AnnotationEntry
//! │   └── ClassBody
//! │       ├── Function / Property
//! │       └── ClassObject ── Object (is_class_object)
//! ├── Function
//! └── Property
//! ```
//!
//! Only the shape around class objects is load-bearing for indexing: the
//! owner of a class object sits exactly three parent hops above it.

mod document;
mod tree;

pub use document::{ClassOrObjectDoc, StubDocument, StubNodeDoc};
pub use tree::{Stub, StubId, StubRef, StubTree, StubTreeBuilder, StubTreeError};

use serde::{Deserialize, Serialize};

use crate::name::FqName;

/// The file stub. Root of every tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileStub {
    /// Package of the file; root for the default package.
    pub package_fq_name: FqName,
}

/// A class or object declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassOrObjectStub {
    /// Written name. Absent for anonymous or malformed syntax.
    pub name: Option<String>,
    pub fq_name: Option<FqName>,
    /// Supertype names exactly as written in source, not resolved.
    pub super_names: Vec<String>,
    pub is_top_level: bool,
    /// True iff this is a class object (companion singleton owned by a class).
    pub is_class_object: bool,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionStub {
    pub name: Option<String>,
    pub fq_name: Option<FqName>,
    pub is_top_level: bool,
    /// Declared with a receiver type.
    pub is_extension: bool,
    /// Return type is syntactically known never to produce a value.
    pub is_probably_nothing_type: bool,
}

/// A property declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyStub {
    pub name: Option<String>,
    pub fq_name: Option<FqName>,
    pub is_top_level: bool,
    pub has_receiver_type_ref: bool,
    pub is_probably_nothing_type: bool,
}

/// An annotation usage, e.g. `@Deprecated`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationEntryStub {
    /// Simple name of the referenced annotation type.
    pub short_name: String,
}

/// Attribute-free structural nodes that sit between declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperKind {
    /// The `class object` declaration holding an object stub.
    ClassObject,
    /// The `{ ... }` body of a class or object.
    ClassBody,
    /// Modifiers and annotation entries of a declaration.
    ModifierList,
}

impl WrapperKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapperKind::ClassObject => "class_object",
            WrapperKind::ClassBody => "class_body",
            WrapperKind::ModifierList => "modifier_list",
        }
    }
}

/// Kind-specific payload of a stub node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubData {
    File(FileStub),
    Class(ClassOrObjectStub),
    Object(ClassOrObjectStub),
    Function(FunctionStub),
    Property(PropertyStub),
    AnnotationEntry(AnnotationEntryStub),
    Wrapper(WrapperKind),
}

impl StubData {
    /// Short kind label used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StubData::File(_) => "file",
            StubData::Class(_) => "class",
            StubData::Object(_) => "object",
            StubData::Function(_) => "function",
            StubData::Property(_) => "property",
            StubData::AnnotationEntry(_) => "annotation_entry",
            StubData::Wrapper(kind) => kind.as_str(),
        }
    }

    /// Annotation entries are leaves; everything else may own children.
    pub fn can_have_children(&self) -> bool {
        !matches!(self, StubData::AnnotationEntry(_))
    }
}
