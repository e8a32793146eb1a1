//! Simple and qualified declaration names.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Synthetic name under which a class object is addressed.
pub const CLASS_OBJECT_NAME: &str = "object";

/// A single identifier segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// The class object marker name.
    pub fn class_object() -> Self {
        Self(CLASS_OBJECT_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dot-separated qualified name, e.g. `org.example.Foo`.
///
/// The root (default package) is the empty string, which is also `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FqName(String);

impl FqName {
    /// Create a qualified name from its dotted form.
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The dotted string form. Empty for the root.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one segment.
    pub fn child(&self, name: &Name) -> Self {
        if self.is_root() {
            Self(name.as_str().to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FqName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FqName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child() {
        let object = Name::class_object();
        assert_eq!(FqName::new("p.q.A").child(&object).as_str(), "p.q.A.object");
        assert_eq!(FqName::default().child(&object).as_str(), "object");
        assert!(FqName::default().is_root());
        assert!(!FqName::new("p").is_root());
    }

    #[test]
    fn test_serde_as_string() {
        let fq: FqName = serde_json::from_str("\"p.q\"").unwrap();
        assert_eq!(fq, FqName::new("p.q"));
        assert_eq!(serde_json::to_string(&fq).unwrap(), "\"p.q\"");
    }
}
