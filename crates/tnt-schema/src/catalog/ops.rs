//! Catalog operations: batch loading of spaces and indexes, and name resolution.
//!
//! Loads are all-or-nothing. A batch is decoded completely, checked against
//! the catalog and the needed storage is reserved before the first entry is
//! written, so a failed call leaves every lookup result unchanged.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::tuple;
use crate::types::{IndexDef, IndexId, Name, SpaceDef, SpaceId};

use super::SchemaCatalog;

impl SchemaCatalog {
    /// Load a `_space` / `_vspace` select result.
    ///
    /// Every decoded space replaces the definition of the same name outright,
    /// including the indexes loaded for it. A space that reuses the id of a
    /// differently named one evicts the older name.
    pub fn add_spaces(&mut self, data: &[u8]) -> Result<()> {
        let records = tuple::decode_spaces(data).inspect_err(|e| {
            warn!(offset = e.offset, error = %e, "rejected space batch");
        })?;

        self.reserve(records.len())?;

        let count = records.len();
        for record in records {
            self.put_space(record.into());
        }
        debug!(count, total = self.spaces.len(), "loaded space definitions");

        Ok(())
    }

    /// Load an `_index` / `_vindex` select result.
    ///
    /// Every row must belong to a space that is already in the catalog.
    /// Indexes replace the previous definition of the same name in their space.
    pub fn add_indexes(&mut self, data: &[u8]) -> Result<()> {
        let records = tuple::decode_indexes(data).inspect_err(|e| {
            warn!(offset = e.offset, error = %e, "rejected index batch");
        })?;

        let mut staged: Vec<(Name, IndexDef)> = Vec::new();
        staged.try_reserve_exact(records.len())?;
        for record in records {
            let Some(space) = self.space_by_id(record.space_id) else {
                warn!(
                    space_id = record.space_id,
                    index = %record.name,
                    "rejected index batch: unknown space"
                );
                return Err(Error::UnknownSpace {
                    space_id: record.space_id,
                    index: record.name,
                });
            };
            staged.push((space.name.clone(), record.resolve(space)));
        }

        let mut per_space: HashMap<&[u8], usize> = HashMap::new();
        for (space_name, _) in &staged {
            *per_space.entry(space_name.as_bytes()).or_default() += 1;
        }
        for (space_name, additional) in per_space {
            if let Some(space) = self.spaces.get_mut(space_name) {
                space.indexes.try_reserve(additional)?;
            }
        }

        let count = staged.len();
        for (space_name, index) in staged {
            if let Some(space) = self.spaces.get_mut(&space_name) {
                trace!(space = %space_name, index = %index.name, id = index.id, "put index");
                space.put_index(index);
            }
        }
        debug!(count, "loaded index definitions");

        Ok(())
    }

    /// Resolve a space name to its id.
    ///
    /// Names are compared as raw bytes, so `&str` and `&[u8]` both work.
    pub fn stosid(&self, space_name: impl AsRef<[u8]>) -> Option<SpaceId> {
        self.spaces.get(space_name.as_ref()).map(|space| space.id)
    }

    /// Resolve an index name within the space `space_id` to its id.
    pub fn stoiid(&self, space_id: SpaceId, index_name: impl AsRef<[u8]>) -> Option<IndexId> {
        self.space_by_id(space_id)?
            .index(index_name)
            .map(|index| index.id)
    }

    /// Resolve a format field name within the space `space_id` to its ordinal.
    pub fn stofid(&self, space_id: SpaceId, field_name: impl AsRef<[u8]>) -> Option<u32> {
        self.space_by_id(space_id)?.field_no(field_name)
    }

    /// Insert or replace a space, keeping both space ids and names unique.
    ///
    /// Storage must already be reserved.
    fn put_space(&mut self, space: SpaceDef) {
        if let Some(old_name) = self.space_names.remove(&space.id)
            && old_name != space.name
        {
            trace!(id = space.id, old = %old_name, new = %space.name, "space renamed");
            self.spaces.remove(&old_name);
        }
        if let Some(previous) = self.spaces.remove(&space.name) {
            trace!(space = %space.name, old_id = previous.id, new_id = space.id, "replacing space");
            if previous.id != space.id {
                self.space_names.remove(&previous.id);
            }
        }

        self.space_names.insert(space.id, space.name.clone());
        self.spaces.insert(space.name.clone(), space);
    }
}
