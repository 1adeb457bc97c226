//! `_space` row layout.
//!
//! `[id, owner, name, engine, field_count, flags?, format?]`
//!
//! Servers before 1.7 end the tuple after `field_count` or send a flags
//! string; newer ones send a flags map followed by the format array.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use super::{required, skip_rest, skip_value};
use crate::types::{FieldSpec, FieldType, Name, SpaceDef, SpaceId};

/// Number of trailing slots searched for the format array.
const TRAILING_SLOTS: usize = 2;

/// A decoded `_space` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceRecord {
    pub id: SpaceId,
    pub name: Name,
    pub field_count: u32,
    /// Format fields; empty when the row has no format.
    pub fields: Vec<FieldSpec>,
}

impl From<SpaceRecord> for SpaceDef {
    fn from(record: SpaceRecord) -> Self {
        SpaceDef {
            id: record.id,
            name: record.name,
            field_count: record.field_count,
            fields: record.fields,
            indexes: Default::default(),
        }
    }
}

impl<'de> Deserialize<'de> for SpaceRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(SpaceRecordVisitor)
    }
}

struct SpaceRecordVisitor;

impl<'de> Visitor<'de> for SpaceRecordVisitor {
    type Value = SpaceRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a _space tuple")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SpaceRecord, A::Error> {
        let id: SpaceId = required(&mut seq, 0, &self)?;
        let _owner: IgnoredAny = required(&mut seq, 1, &self)?;
        let name: Name = required(&mut seq, 2, &self)?;
        let _engine: IgnoredAny = required(&mut seq, 3, &self)?;
        let field_count: u32 = required(&mut seq, 4, &self)?;

        let mut fields = Vec::new();
        for _ in 0..TRAILING_SLOTS {
            match seq.next_element::<Trailing>()? {
                Some(Trailing::Format(format)) => {
                    fields = format;
                    break;
                }
                Some(Trailing::Skipped) => {}
                None => break,
            }
        }
        skip_rest(&mut seq)?;

        Ok(SpaceRecord {
            id,
            name,
            field_count,
            fields,
        })
    }
}

/// A trailing element: the format array, or anything else (flags).
enum Trailing {
    Format(Vec<FieldSpec>),
    Skipped,
}

impl<'de> Deserialize<'de> for Trailing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TrailingVisitor)
    }
}

struct TrailingVisitor;

impl<'de> Visitor<'de> for TrailingVisitor {
    type Value = Trailing;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a space format array or flags")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Trailing, A::Error> {
        let mut fields = Vec::new();
        while let Some(desc) = seq.next_element::<FieldDescriptor>()? {
            fields.push(FieldSpec {
                ordinal: field_ordinal::<A::Error>(fields.len())?,
                name: desc.name,
                field_type: desc.field_type,
            });
        }
        Ok(Trailing::Format(fields))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Trailing, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Trailing::Skipped)
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_bytes<E: de::Error>(self, _v: &[u8]) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Trailing, E> {
        Ok(Trailing::Skipped)
    }
}

/// Ordinal of the next format field, given how many precede it.
fn field_ordinal<E: de::Error>(position: usize) -> Result<u32, E> {
    u32::try_from(position)
        .map_err(|_| E::invalid_length(position, &"at most u32::MAX format fields"))
}

/// One format entry: `{name = ..., type = ...}` or `[name, type]`.
struct FieldDescriptor {
    name: Name,
    field_type: FieldType,
}

impl<'de> Deserialize<'de> for FieldDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldDescriptorVisitor)
    }
}

struct FieldDescriptorVisitor;

impl<'de> Visitor<'de> for FieldDescriptorVisitor {
    type Value = FieldDescriptor;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a field descriptor map or array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldDescriptor, A::Error> {
        let mut name = None;
        let mut type_name: Option<Name> = None;
        while let Some(key) = map.next_key::<Name>()? {
            match key.as_bytes() {
                b"name" => name = Some(map.next_value::<Name>()?),
                b"type" => type_name = Some(map.next_value()?),
                _ => skip_value(&mut map)?,
            }
        }
        let name = name.ok_or_else(|| de::Error::missing_field("name"))?;

        Ok(FieldDescriptor {
            name,
            field_type: type_name
                .as_ref()
                .map_or(FieldType::Other, FieldType::from_type_name),
        })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldDescriptor, A::Error> {
        let name: Name = required(&mut seq, 0, &self)?;
        let type_name: Option<Name> = seq.next_element()?;
        skip_rest(&mut seq)?;

        Ok(FieldDescriptor {
            name,
            field_type: type_name
                .as_ref()
                .map_or(FieldType::Other, FieldType::from_type_name),
        })
    }
}
