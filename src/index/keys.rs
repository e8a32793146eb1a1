//! The fixed set of stub indexes and the process-wide registry of their keys.

use std::fmt;

use once_cell::sync::OnceCell;
use phf::phf_map;
use serde::{Serialize, Serializer};

/// Every index the extractor can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexId {
    PackagesByName,
    ClassesByShortName,
    ClassesByFullName,
    ClassesByPackage,
    TopLevelObjectsByShortName,
    SupertypeReferences,
    FunctionsByShortName,
    TopLevelNonExtensionFunctionsByShortName,
    TopLevelExtensionFunctionsByShortName,
    ProbablyNothingFunctionsByShortName,
    PropertiesByShortName,
    TopLevelNonExtensionPropertiesByShortName,
    TopLevelExtensionPropertiesByShortName,
    ProbablyNothingPropertiesByShortName,
    TopLevelPropertiesByFullName,
    TopLevelFunctionsByFullName,
    AnnotationsByShortName,
}

impl IndexId {
    /// All indexes, in registry order.
    pub const ALL: [IndexId; 17] = [
        IndexId::PackagesByName,
        IndexId::ClassesByShortName,
        IndexId::ClassesByFullName,
        IndexId::ClassesByPackage,
        IndexId::TopLevelObjectsByShortName,
        IndexId::SupertypeReferences,
        IndexId::FunctionsByShortName,
        IndexId::TopLevelNonExtensionFunctionsByShortName,
        IndexId::TopLevelExtensionFunctionsByShortName,
        IndexId::ProbablyNothingFunctionsByShortName,
        IndexId::PropertiesByShortName,
        IndexId::TopLevelNonExtensionPropertiesByShortName,
        IndexId::TopLevelExtensionPropertiesByShortName,
        IndexId::ProbablyNothingPropertiesByShortName,
        IndexId::TopLevelPropertiesByFullName,
        IndexId::TopLevelFunctionsByFullName,
        IndexId::AnnotationsByShortName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexId::PackagesByName => "packages-by-name",
            IndexId::ClassesByShortName => "classes-by-short-name",
            IndexId::ClassesByFullName => "classes-by-full-name",
            IndexId::ClassesByPackage => "classes-by-package",
            IndexId::TopLevelObjectsByShortName => "top-level-objects-by-short-name",
            IndexId::SupertypeReferences => "supertype-references",
            IndexId::FunctionsByShortName => "functions-by-short-name",
            IndexId::TopLevelNonExtensionFunctionsByShortName => {
                "top-level-non-extension-functions-by-short-name"
            }
            IndexId::TopLevelExtensionFunctionsByShortName => {
                "top-level-extension-functions-by-short-name"
            }
            IndexId::ProbablyNothingFunctionsByShortName => {
                "probably-nothing-functions-by-short-name"
            }
            IndexId::PropertiesByShortName => "properties-by-short-name",
            IndexId::TopLevelNonExtensionPropertiesByShortName => {
                "top-level-non-extension-properties-by-short-name"
            }
            IndexId::TopLevelExtensionPropertiesByShortName => {
                "top-level-extension-properties-by-short-name"
            }
            IndexId::ProbablyNothingPropertiesByShortName => {
                "probably-nothing-properties-by-short-name"
            }
            IndexId::TopLevelPropertiesByFullName => "top-level-properties-by-full-name",
            IndexId::TopLevelFunctionsByFullName => "top-level-functions-by-full-name",
            IndexId::AnnotationsByShortName => "annotations-by-short-name",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        INDEX_NAMES.get(s).copied()
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static INDEX_NAMES: phf::Map<&'static str, IndexId> = phf_map! {
    "packages-by-name" => IndexId::PackagesByName,
    "classes-by-short-name" => IndexId::ClassesByShortName,
    "classes-by-full-name" => IndexId::ClassesByFullName,
    "classes-by-package" => IndexId::ClassesByPackage,
    "top-level-objects-by-short-name" => IndexId::TopLevelObjectsByShortName,
    "supertype-references" => IndexId::SupertypeReferences,
    "functions-by-short-name" => IndexId::FunctionsByShortName,
    "top-level-non-extension-functions-by-short-name" => IndexId::TopLevelNonExtensionFunctionsByShortName,
    "top-level-extension-functions-by-short-name" => IndexId::TopLevelExtensionFunctionsByShortName,
    "probably-nothing-functions-by-short-name" => IndexId::ProbablyNothingFunctionsByShortName,
    "properties-by-short-name" => IndexId::PropertiesByShortName,
    "top-level-non-extension-properties-by-short-name" => IndexId::TopLevelNonExtensionPropertiesByShortName,
    "top-level-extension-properties-by-short-name" => IndexId::TopLevelExtensionPropertiesByShortName,
    "probably-nothing-properties-by-short-name" => IndexId::ProbablyNothingPropertiesByShortName,
    "top-level-properties-by-full-name" => IndexId::TopLevelPropertiesByFullName,
    "top-level-functions-by-full-name" => IndexId::TopLevelFunctionsByFullName,
    "annotations-by-short-name" => IndexId::AnnotationsByShortName,
};

/// Stable key handed to sinks. Keys are only minted by an [`IndexRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    ordinal: u16,
    id: IndexId,
}

impl IndexKey {
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// Position of the index in the registry.
    pub fn ordinal(&self) -> u16 {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.id.as_str()
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for IndexKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Read-only mapping from index identity to its key.
#[derive(Debug)]
pub struct IndexRegistry {
    keys: Vec<IndexKey>,
}

/// Process-wide registry.
static GLOBAL_REGISTRY: OnceCell<IndexRegistry> = OnceCell::new();

impl IndexRegistry {
    fn new() -> Self {
        let keys = IndexId::ALL
            .iter()
            .enumerate()
            .map(|(ordinal, &id)| IndexKey {
                ordinal: ordinal as u16,
                id,
            })
            .collect();
        Self { keys }
    }

    /// The registry shared by every indexer in the process.
    ///
    /// Built on first use and never mutated afterwards.
    pub fn global() -> &'static IndexRegistry {
        GLOBAL_REGISTRY.get_or_init(IndexRegistry::new)
    }

    pub fn key(&self, id: IndexId) -> IndexKey {
        self.keys[id as usize]
    }

    pub fn keys(&self) -> &[IndexKey] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in IndexId::ALL {
            assert_eq!(IndexId::parse(id.as_str()), Some(id));
        }
        assert_eq!(IndexId::parse("classes"), None);
    }

    #[test]
    fn test_registry_is_shared() {
        let a = IndexRegistry::global();
        let b = IndexRegistry::global();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.keys().len(), 17);
    }

    #[test]
    fn test_key_ordinals_follow_registry_order() {
        let registry = IndexRegistry::global();
        for (i, key) in registry.keys().iter().enumerate() {
            assert_eq!(key.ordinal() as usize, i);
            assert_eq!(registry.key(key.id()), *key);
        }
    }

    #[test]
    fn test_key_display() {
        let key = IndexRegistry::global().key(IndexId::SupertypeReferences);
        assert_eq!(key.id(), IndexId::SupertypeReferences);
        assert_eq!(key.to_string(), "supertype-references");
    }
}
