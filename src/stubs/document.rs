//! JSON interchange format for stub trees.
//!
//! A stub document is what an external parser writes out for one source
//! file. Nodes are nested and tagged by `kind`:
//!
//! ```json
//! {
//!   "path": "src/p/q/A.kt",
//!   "package": "p.q",
//!   "children": [
//!     { "kind": "class", "name": "A", "fq_name": "p.q.A",
//!       "super_names": ["B"], "top_level": true, "children": [] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{
    AnnotationEntryStub, ClassOrObjectStub, FileStub, FunctionStub, PropertyStub, StubData,
    StubId, StubTree, StubTreeBuilder, StubTreeError, WrapperKind,
};
use crate::name::FqName;

/// A serialized file stub and everything under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubDocument {
    /// Source file path the stubs were built from.
    pub path: String,
    /// Package of the file. Omitted or empty for the default package.
    #[serde(default)]
    pub package: FqName,
    #[serde(default)]
    pub children: Vec<StubNodeDoc>,
}

/// One serialized stub node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StubNodeDoc {
    Class {
        #[serde(flatten)]
        decl: ClassOrObjectDoc,
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    Object {
        #[serde(flatten)]
        decl: ClassOrObjectDoc,
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    Function {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        fq_name: Option<FqName>,
        #[serde(default)]
        top_level: bool,
        #[serde(default)]
        extension: bool,
        #[serde(default)]
        probably_nothing: bool,
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    Property {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        fq_name: Option<FqName>,
        #[serde(default)]
        top_level: bool,
        #[serde(default)]
        receiver: bool,
        #[serde(default)]
        probably_nothing: bool,
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    AnnotationEntry {
        short_name: String,
    },
    ClassObject {
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    ClassBody {
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
    ModifierList {
        #[serde(default)]
        children: Vec<StubNodeDoc>,
    },
}

/// Shared attributes of serialized classes and objects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassOrObjectDoc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fq_name: Option<FqName>,
    #[serde(default)]
    pub super_names: Vec<String>,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub class_object: bool,
}

impl From<&ClassOrObjectDoc> for ClassOrObjectStub {
    fn from(doc: &ClassOrObjectDoc) -> Self {
        Self {
            name: doc.name.clone(),
            fq_name: doc.fq_name.clone(),
            super_names: doc.super_names.clone(),
            is_top_level: doc.top_level,
            is_class_object: doc.class_object,
        }
    }
}

impl StubDocument {
    /// Read a document from a JSON file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let doc: StubDocument = serde_json::from_str(&content)
            .with_context(|| format!("invalid stub document {}", path.display()))?;
        Ok(doc)
    }

    /// Build the immutable stub tree.
    pub fn to_tree(&self) -> Result<StubTree, StubTreeError> {
        let mut builder = StubTree::builder(
            self.path.clone(),
            FileStub {
                package_fq_name: self.package.clone(),
            },
        );
        let root = builder.root();
        for child in &self.children {
            child.attach(&mut builder, root)?;
        }
        Ok(builder.build())
    }
}

impl StubNodeDoc {
    fn attach(&self, builder: &mut StubTreeBuilder, parent: StubId) -> Result<(), StubTreeError> {
        let (data, children) = self.split();
        let id = builder.add(parent, data)?;
        for child in children {
            child.attach(builder, id)?;
        }
        Ok(())
    }

    fn split(&self) -> (StubData, &[StubNodeDoc]) {
        match self {
            StubNodeDoc::Class { decl, children } => {
                (StubData::Class(decl.into()), children.as_slice())
            }
            StubNodeDoc::Object { decl, children } => {
                (StubData::Object(decl.into()), children.as_slice())
            }
            StubNodeDoc::Function {
                name,
                fq_name,
                top_level,
                extension,
                probably_nothing,
                children,
            } => (
                StubData::Function(FunctionStub {
                    name: name.clone(),
                    fq_name: fq_name.clone(),
                    is_top_level: *top_level,
                    is_extension: *extension,
                    is_probably_nothing_type: *probably_nothing,
                }),
                children.as_slice(),
            ),
            StubNodeDoc::Property {
                name,
                fq_name,
                top_level,
                receiver,
                probably_nothing,
                children,
            } => (
                StubData::Property(PropertyStub {
                    name: name.clone(),
                    fq_name: fq_name.clone(),
                    is_top_level: *top_level,
                    has_receiver_type_ref: *receiver,
                    is_probably_nothing_type: *probably_nothing,
                }),
                children.as_slice(),
            ),
            StubNodeDoc::AnnotationEntry { short_name } => (
                StubData::AnnotationEntry(AnnotationEntryStub {
                    short_name: short_name.clone(),
                }),
                &[] as &[StubNodeDoc],
            ),
            StubNodeDoc::ClassObject { children } => {
                (StubData::Wrapper(WrapperKind::ClassObject), children.as_slice())
            }
            StubNodeDoc::ClassBody { children } => {
                (StubData::Wrapper(WrapperKind::ClassBody), children.as_slice())
            }
            StubNodeDoc::ModifierList { children } => {
                (StubData::Wrapper(WrapperKind::ModifierList), children.as_slice())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANION_DOC: &str = r#"
{
  "path": "p/Foo.kt",
  "package": "p",
  "children": [
    {
      "kind": "class",
      "name": "Foo",
      "fq_name": "p.Foo",
      "super_names": ["Base"],
      "top_level": true,
      "children": [
        { "kind": "modifier_list", "children": [
          { "kind": "annotation_entry", "short_name": "Deprecated" }
        ]},
        { "kind": "class_body", "children": [
          { "kind": "class_object", "children": [
            { "kind": "object", "class_object": true }
          ]},
          { "kind": "function", "name": "bar", "fq_name": "p.Foo.bar" }
        ]}
      ]
    }
  ]
}
"#;

    #[test]
    fn test_parse_document() {
        let doc: StubDocument = serde_json::from_str(COMPANION_DOC).unwrap();
        assert_eq!(doc.path, "p/Foo.kt");
        assert_eq!(doc.package, FqName::new("p"));
        assert_eq!(doc.children.len(), 1);
    }

    #[test]
    fn test_document_to_tree() {
        let doc: StubDocument = serde_json::from_str(COMPANION_DOC).unwrap();
        let tree = doc.to_tree().unwrap();

        let kinds: Vec<_> = tree.iter().map(|s| s.kind_name()).collect();
        assert_eq!(
            kinds,
            vec![
                "file",
                "class",
                "modifier_list",
                "annotation_entry",
                "class_body",
                "class_object",
                "object",
                "function",
            ]
        );

        let object = tree.iter().find_map(|s| s.as_object()).unwrap();
        assert!(object.is_class_object);
        assert!(object.name.is_none());
    }

    #[test]
    fn test_default_package() {
        let doc: StubDocument = serde_json::from_str(r#"{ "path": "Main.kt" }"#).unwrap();
        assert!(doc.package.is_root());
        let tree = doc.to_tree().unwrap();
        assert_eq!(tree.iter().count(), 1);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<StubDocument, _> = serde_json::from_str(
            r#"{ "path": "a.kt", "children": [ { "kind": "typealias" } ] }"#,
        );
        assert!(result.is_err());
    }
}
