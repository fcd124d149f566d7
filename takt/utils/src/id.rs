use std::fmt::Display;

/// A globally interned symbol.
pub type GSym = symbol_table::GlobalSymbol;

/// Represents an identifier: an operation name, an operator type name, a
/// process name, or a resource entity name.
///
/// Identifiers are interned in a global symbol table, so they are cheap to
/// copy and compare. Two identifiers are the same entity iff they intern to
/// the same symbol; no structural information is attached.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id {
    id: GSym,
}

impl Id {
    pub fn new<S: ToString>(id: S) -> Self {
        Id {
            id: GSym::from(id.to_string()),
        }
    }

    /// Returns the interned string backing this identifier.
    pub fn as_str(&self) -> &'static str {
        self.id.as_str()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id { id: GSym::from(s) }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id { id: GSym::from(s) }
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Id {
            id: GSym::from(s.as_str()),
        }
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl serde::Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Id::from(s))
    }
}

/// Structs that have an [Id] name.
pub trait GetName {
    /// Return a reference to the object's name
    fn name(&self) -> Id;
}
