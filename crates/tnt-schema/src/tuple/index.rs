//! `_index` row layout.
//!
//! `[space_id, id, name, type, opts, parts]` where `parts` is an array of
//! `[field_no, type]` pairs or `{field = ..., type = ...}` maps. 1.6 servers
//! send `[space_id, id, name, type, unique, part_count, field_no, type, ...]`
//! with the parts flattened into the tuple itself.

use std::fmt;

use serde::de::{
    self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Unexpected, Visitor,
};

use super::{required, skip_rest, skip_value};
use crate::types::{FieldSpec, FieldType, IndexDef, IndexId, Name, SpaceDef, SpaceId};

/// Part count above which flattened parts are not preallocated.
const MAX_PREALLOCATED_PARTS: usize = 16;

/// A decoded `_index` row. Parts carry only ordinals until resolved against a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub space_id: SpaceId,
    pub id: IndexId,
    pub name: Name,
    pub parts: Vec<IndexPart>,
}

/// One key part of an index row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPart {
    pub ordinal: u32,
    pub field_type: FieldType,
}

impl IndexRecord {
    /// Build the index definition, naming each part after the space's format field.
    ///
    /// Parts whose ordinal the format does not cover get the name `field_<ordinal>`.
    pub fn resolve(self, space: &SpaceDef) -> IndexDef {
        let parts = self
            .parts
            .into_iter()
            .map(|part| {
                let name = space
                    .fields
                    .get(part.ordinal as usize)
                    .filter(|field| field.ordinal == part.ordinal)
                    .map(|field| field.name.clone())
                    .unwrap_or_else(|| Name::from(format!("field_{}", part.ordinal)));
                FieldSpec {
                    ordinal: part.ordinal,
                    name,
                    field_type: part.field_type,
                }
            })
            .collect();

        IndexDef {
            id: self.id,
            name: self.name,
            parts,
        }
    }
}

impl<'de> Deserialize<'de> for IndexRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(IndexRecordVisitor)
    }
}

struct IndexRecordVisitor;

impl<'de> Visitor<'de> for IndexRecordVisitor {
    type Value = IndexRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an _index tuple")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<IndexRecord, A::Error> {
        let space_id: SpaceId = required(&mut seq, 0, &self)?;
        let id: IndexId = required(&mut seq, 1, &self)?;
        let name: Name = required(&mut seq, 2, &self)?;
        let _index_type: IgnoredAny = required(&mut seq, 3, &self)?;
        let _unique_or_opts: IgnoredAny = required(&mut seq, 4, &self)?;

        let parts: Parts = required(&mut seq, 5, &self)?;
        let parts = match parts {
            Parts::List(parts) => parts,
            Parts::Flattened(count) => {
                let mut parts = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_PARTS));
                for i in 0..count as usize {
                    let ordinal: u32 = required(&mut seq, 6 + 2 * i, &self)?;
                    let type_name: Name = required(&mut seq, 7 + 2 * i, &self)?;
                    parts.push(IndexPart {
                        ordinal,
                        field_type: FieldType::from_type_name(&type_name),
                    });
                }
                parts
            }
        };
        skip_rest(&mut seq)?;

        Ok(IndexRecord {
            space_id,
            id,
            name,
            parts,
        })
    }
}

/// The sixth element: a nested parts array, or the 1.6 part count.
enum Parts {
    List(Vec<IndexPart>),
    Flattened(u32),
}

impl<'de> Deserialize<'de> for Parts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PartsVisitor)
    }
}

struct PartsVisitor;

impl<'de> Visitor<'de> for PartsVisitor {
    type Value = Parts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index parts array or part count")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Parts, E> {
        u32::try_from(v)
            .map(Parts::Flattened)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Parts, A::Error> {
        let mut parts = Vec::new();
        while let Some(part) = seq.next_element::<IndexPart>()? {
            parts.push(part);
        }
        Ok(Parts::List(parts))
    }
}

impl<'de> Deserialize<'de> for IndexPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IndexPartVisitor)
    }
}

struct IndexPartVisitor;

impl<'de> Visitor<'de> for IndexPartVisitor {
    type Value = IndexPart;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index part array or map")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<IndexPart, A::Error> {
        let ordinal: u32 = required(&mut seq, 0, &self)?;
        let type_name: Option<Name> = seq.next_element()?;
        skip_rest(&mut seq)?;

        Ok(IndexPart {
            ordinal,
            field_type: type_name
                .as_ref()
                .map_or(FieldType::Other, FieldType::from_type_name),
        })
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<IndexPart, A::Error> {
        let mut ordinal = None;
        let mut type_name: Option<Name> = None;
        while let Some(key) = map.next_key::<Name>()? {
            match key.as_bytes() {
                b"field" => ordinal = Some(map.next_value::<u32>()?),
                b"type" => type_name = Some(map.next_value()?),
                _ => skip_value(&mut map)?,
            }
        }
        let ordinal = ordinal.ok_or_else(|| de::Error::missing_field("field"))?;

        Ok(IndexPart {
            ordinal,
            field_type: type_name
                .as_ref()
                .map_or(FieldType::Other, FieldType::from_type_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tuple::decode_indexes;
    use crate::tuple::tests::msgpack;

    /// Helper: a space whose format names fields 0 and 1.
    fn make_space() -> SpaceDef {
        SpaceDef {
            id: 512,
            name: "users".into(),
            field_count: 0,
            fields: vec![
                FieldSpec {
                    ordinal: 0,
                    name: "id".into(),
                    field_type: FieldType::Numeric,
                },
                FieldSpec {
                    ordinal: 1,
                    name: "login".into(),
                    field_type: FieldType::String,
                },
            ],
            indexes: Default::default(),
        }
    }

    #[test]
    fn test_index_row_with_positional_parts() {
        let data = msgpack(&json!([[
            512,
            1,
            "by_login",
            "tree",
            {"unique": true},
            [[1, "string"], [0, "unsigned"]]
        ]]));

        let indexes = decode_indexes(&data).unwrap();
        let idx = &indexes[0];
        assert_eq!(idx.space_id, 512);
        assert_eq!(idx.id, 1);
        assert_eq!(idx.name, "by_login");
        assert_eq!(
            idx.parts,
            vec![
                IndexPart {
                    ordinal: 1,
                    field_type: FieldType::String
                },
                IndexPart {
                    ordinal: 0,
                    field_type: FieldType::Numeric
                },
            ]
        );
    }

    #[test]
    fn test_index_row_with_keyed_parts() {
        let data = msgpack(&json!([[
            512,
            0,
            "primary",
            "tree",
            {"unique": true},
            [{"field": 0, "type": "unsigned", "is_nullable": false}]
        ]]));

        let idx = &decode_indexes(&data).unwrap()[0];
        assert_eq!(idx.parts.len(), 1);
        assert_eq!(idx.parts[0].ordinal, 0);
        assert_eq!(idx.parts[0].field_type, FieldType::Numeric);
    }

    #[test]
    fn test_index_row_flattened_parts() {
        let flattened = msgpack(&json!([[512, 1, "by_login", "TREE", 1, 2, 1, "STR", 0, "NUM"]]));
        let nested = msgpack(&json!([[
            512, 1, "by_login", "tree", {"unique": true}, [[1, "str"], [0, "num"]]
        ]]));

        assert_eq!(
            decode_indexes(&flattened).unwrap(),
            decode_indexes(&nested).unwrap()
        );
    }

    #[test]
    fn test_index_row_flattened_parts_truncated() {
        let data = msgpack(&json!([[512, 1, "by_login", "TREE", 1, 2, 1, "STR"]]));
        let err = decode_indexes(&data).unwrap_err();
        assert!(err.reason.contains("length"), "got: {}", err.reason);
    }

    #[test]
    fn test_index_row_missing_parts() {
        let data = msgpack(&json!([[512, 0, "primary", "tree", {"unique": true}]]));
        assert!(decode_indexes(&data).is_err());
    }

    #[test]
    fn test_index_part_map_without_field() {
        let data = msgpack(&json!([[512, 0, "primary", "tree", {}, [{"type": "unsigned"}]]]));
        let err = decode_indexes(&data).unwrap_err();
        assert!(err.reason.contains("field"), "got: {}", err.reason);
    }

    #[test]
    fn test_index_part_type_mismatch() {
        let data = msgpack(&json!([[512, 0, "primary", "tree", {}, [["zero", "unsigned"]]]]));
        assert!(decode_indexes(&data).is_err());
    }

    #[test]
    fn test_resolve_names_parts_from_format() {
        let record = IndexRecord {
            space_id: 512,
            id: 1,
            name: "by_login".into(),
            parts: vec![
                IndexPart {
                    ordinal: 1,
                    field_type: FieldType::String,
                },
                IndexPart {
                    ordinal: 5,
                    field_type: FieldType::Numeric,
                },
            ],
        };

        let index = record.resolve(&make_space());
        assert_eq!(index.id, 1);
        assert_eq!(index.name, "by_login");
        assert_eq!(index.parts[0].name, "login");
        assert_eq!(index.parts[0].ordinal, 1);
        assert_eq!(index.parts[1].name, "field_5");
        assert_eq!(index.parts[1].field_type, FieldType::Numeric);
    }

    #[test]
    fn test_resolve_without_format() {
        let mut space = make_space();
        space.fields.clear();
        let record = IndexRecord {
            space_id: 512,
            id: 0,
            name: "primary".into(),
            parts: vec![IndexPart {
                ordinal: 0,
                field_type: FieldType::Numeric,
            }],
        };

        let index = record.resolve(&space);
        assert_eq!(index.parts[0].name, "field_0");
    }
}
