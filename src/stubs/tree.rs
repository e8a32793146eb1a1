//! Arena storage for a file's stub tree.

use std::fmt;
use std::ops::Deref;

use thiserror::Error;

use super::{
    AnnotationEntryStub, ClassOrObjectStub, FileStub, FunctionStub, PropertyStub, StubData,
};

/// Errors raised while assembling a stub tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubTreeError {
    #[error("unknown parent stub #{0}")]
    UnknownParent(usize),
    #[error("{0} stub cannot own children")]
    NotAContainer(&'static str),
    #[error("file stub must be the root")]
    NestedFile,
}

/// Index of a node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubId(usize);

impl fmt::Display for StubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct StubNode {
    data: StubData,
    parent: Option<StubId>,
    children: Vec<StubId>,
}

/// Immutable stub tree for one file. The root is always the file stub.
#[derive(Debug, Clone)]
pub struct StubTree {
    path: String,
    nodes: Vec<StubNode>,
}

impl StubTree {
    /// Start building a tree rooted at the given file stub.
    pub fn builder(path: impl Into<String>, file: FileStub) -> StubTreeBuilder {
        StubTreeBuilder {
            path: path.into(),
            nodes: vec![StubNode {
                data: StubData::File(file),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Path of the source file this tree describes.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root(&self) -> StubRef<'_> {
        StubRef {
            tree: self,
            id: StubId(0),
        }
    }

    pub fn get(&self, id: StubId) -> Option<StubRef<'_>> {
        (id.0 < self.nodes.len()).then_some(StubRef { tree: self, id })
    }

    /// All nodes in pre-order, starting from the root.
    pub fn iter(&self) -> impl Iterator<Item = StubRef<'_>> + '_ {
        let mut stack = vec![StubId(0)];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
            Some(StubRef { tree: self, id })
        })
    }

    fn node(&self, id: StubId) -> &StubNode {
        &self.nodes[id.0]
    }
}

/// Incremental builder for a [`StubTree`].
#[derive(Debug)]
pub struct StubTreeBuilder {
    path: String,
    nodes: Vec<StubNode>,
}

impl StubTreeBuilder {
    /// Id of the file stub.
    pub fn root(&self) -> StubId {
        StubId(0)
    }

    /// Attach a new stub under `parent`.
    pub fn add(&mut self, parent: StubId, data: StubData) -> Result<StubId, StubTreeError> {
        if matches!(data, StubData::File(_)) {
            return Err(StubTreeError::NestedFile);
        }
        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or(StubTreeError::UnknownParent(parent.0))?;
        if !parent_node.data.can_have_children() {
            return Err(StubTreeError::NotAContainer(parent_node.data.kind_name()));
        }

        let id = StubId(self.nodes.len());
        self.nodes.push(StubNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn build(self) -> StubTree {
        StubTree {
            path: self.path,
            nodes: self.nodes,
        }
    }
}

/// Untyped handle to a node in a tree.
#[derive(Clone, Copy)]
pub struct StubRef<'t> {
    tree: &'t StubTree,
    id: StubId,
}

impl<'t> StubRef<'t> {
    pub fn id(&self) -> StubId {
        self.id
    }

    pub fn tree(&self) -> &'t StubTree {
        self.tree
    }

    pub fn data(&self) -> &'t StubData {
        &self.tree.node(self.id).data
    }

    pub fn kind_name(&self) -> &'static str {
        self.data().kind_name()
    }

    /// The parent node. None only for the file stub.
    pub fn parent_stub(&self) -> Option<StubRef<'t>> {
        self.tree.node(self.id).parent.map(|id| StubRef {
            tree: self.tree,
            id,
        })
    }

    /// Pair this node with its already-matched payload.
    pub(crate) fn typed<T>(&self, data: &'t T) -> Stub<'t, T> {
        Stub { node: *self, data }
    }

    pub fn as_file(&self) -> Option<Stub<'t, FileStub>> {
        match self.data() {
            StubData::File(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<Stub<'t, ClassOrObjectStub>> {
        match self.data() {
            StubData::Class(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<Stub<'t, ClassOrObjectStub>> {
        match self.data() {
            StubData::Object(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    /// Either a class or an object.
    pub fn as_class_or_object(&self) -> Option<Stub<'t, ClassOrObjectStub>> {
        match self.data() {
            StubData::Class(d) | StubData::Object(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<Stub<'t, FunctionStub>> {
        match self.data() {
            StubData::Function(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<Stub<'t, PropertyStub>> {
        match self.data() {
            StubData::Property(d) => Some(self.typed(d)),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<Stub<'t, AnnotationEntryStub>> {
        match self.data() {
            StubData::AnnotationEntry(d) => Some(self.typed(d)),
            _ => None,
        }
    }
}

impl fmt::Debug for StubRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind_name(), self.id)
    }
}

/// Typed handle: a node together with its kind-specific attributes.
///
/// Dereferences to the attribute struct, so `stub.name` reads the stub's name.
pub struct Stub<'t, T> {
    node: StubRef<'t>,
    data: &'t T,
}

impl<T> Clone for Stub<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Stub<'_, T> {}

impl<'t, T> Stub<'t, T> {
    pub fn node(&self) -> StubRef<'t> {
        self.node
    }

    pub fn parent_stub(&self) -> Option<StubRef<'t>> {
        self.node.parent_stub()
    }
}

impl<T> Deref for Stub<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<T> fmt::Debug for Stub<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}
