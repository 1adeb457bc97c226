//! Core types: space/index identifiers and the field, index and space definitions.

use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

/// Numeric space identifier.
pub type SpaceId = u32;

/// Numeric index identifier, unique within its space.
pub type IndexId = u32;

/// A space, index or field name exactly as the server sent it.
///
/// Names arrive as MessagePack `str`, but nothing on the wire guarantees their
/// encoding, so the raw bytes are kept. Lookups compare bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Box<[u8]>);

impl Name {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as `&str`, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&[u8]> for Name {
    fn from(bytes: &[u8]) -> Self {
        Name(bytes.into())
    }
}

impl From<Vec<u8>> for Name {
    fn from(bytes: Vec<u8>) -> Self {
        Name(bytes.into_boxed_slice())
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name::from(name.as_bytes())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name::from(name.into_bytes())
    }
}

impl Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_string_lossy())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Some(name) => fmt::Debug::fmt(name, f),
            None => write!(f, "b\"{}\"", self.0.escape_ascii()),
        }
    }
}

/// Serialized as a string; invalid UTF-8 sequences become U+FFFD.
impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(NameVisitor)
    }
}

struct NameVisitor;

impl<'de> Visitor<'de> for NameVisitor {
    type Value = Name;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a name string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Name, E> {
        Ok(Name::from(v))
    }

    // The MessagePack deserializer hands over `str` payloads that are not
    // valid UTF-8 as bytes.
    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Name, E> {
        Ok(Name::from(v))
    }
}

/// Coarse type of a field or index part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    String,
    Numeric,
    Other,
}

impl FieldType {
    /// Map a server type name (`"unsigned"`, `"STR"`, `"scalar"`, ...) to its coarse type.
    ///
    /// Unknown names map to `Other`.
    pub fn from_type_name<N: AsRef<[u8]> + ?Sized>(name: &N) -> Self {
        const STRING: &[&str] = &["str", "string"];
        const NUMERIC: &[&str] = &[
            "num", "number", "unsigned", "uint", "integer", "int", "double", "float", "decimal",
        ];

        let name = name.as_ref();
        if STRING.iter().any(|t| t.as_bytes().eq_ignore_ascii_case(name)) {
            FieldType::String
        } else if NUMERIC.iter().any(|t| t.as_bytes().eq_ignore_ascii_case(name)) {
            FieldType::Numeric
        } else {
            FieldType::Other
        }
    }
}

/// One column of a space format, or one key part of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Zero-based field number in the tuple.
    pub ordinal: u32,
    pub name: Name,
    pub field_type: FieldType,
}

/// An index definition. `parts` are in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    pub id: IndexId,
    pub name: Name,
    pub parts: Vec<FieldSpec>,
}

/// A space definition with its format and indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceDef {
    pub id: SpaceId,
    pub name: Name,
    /// Field count declared by the server; 0 means unconstrained.
    pub field_count: u32,
    /// Format fields in on-disk order. Empty when the server sent no format.
    pub fields: Vec<FieldSpec>,
    /// Indexes keyed by name.
    pub indexes: HashMap<Name, IndexDef>,
}

impl SpaceDef {
    /// Look up an index by name.
    pub fn index(&self, name: impl AsRef<[u8]>) -> Option<&IndexDef> {
        self.indexes.get(name.as_ref())
    }

    /// Look up an index by id.
    ///
    /// Linear over the space's indexes, which are few.
    pub fn index_by_id(&self, id: IndexId) -> Option<&IndexDef> {
        self.indexes.values().find(|idx| idx.id == id)
    }

    /// Look up a format field by name.
    pub fn field(&self, name: impl AsRef<[u8]>) -> Option<&FieldSpec> {
        let name = name.as_ref();
        self.fields.iter().find(|f| f.name.as_bytes() == name)
    }

    /// Resolve a format field name to its ordinal.
    pub fn field_no(&self, name: impl AsRef<[u8]>) -> Option<u32> {
        self.field(name).map(|f| f.ordinal)
    }

    /// Insert or replace an index, keeping index ids unique within the space.
    pub(crate) fn put_index(&mut self, index: IndexDef) {
        let stale = self
            .indexes
            .iter()
            .find(|(name, idx)| idx.id == index.id && **name != index.name)
            .map(|(name, _)| name.clone());
        if let Some(stale) = stale {
            self.indexes.remove(&stale);
        }
        self.indexes.insert(index.name.clone(), index);
    }
}
