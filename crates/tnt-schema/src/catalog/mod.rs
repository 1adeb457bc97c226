//! Schema catalog: space and index definitions keyed for name-to-id resolution.
//!
//! The catalog owns every [`SpaceDef`] (and through them every index and
//! field). Spaces are keyed by name; a secondary id-to-name map serves the
//! lookups that start from a numeric space id.

mod ops;

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::error::Result;
use crate::types::{Name, SpaceDef, SpaceId};

/// Spaces reserved up front by [`CatalogHandle::new`].
pub const DEFAULT_SPACE_CAPACITY: usize = 64;

/// In-memory catalog of one server's spaces and indexes.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    spaces: HashMap<Name, SpaceDef>,
    space_names: HashMap<SpaceId, Name>,
}

impl SchemaCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog with room for `spaces` space definitions.
    pub fn with_capacity(spaces: usize) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.reserve(spaces)?;
        Ok(catalog)
    }

    fn reserve(&mut self, spaces: usize) -> Result<()> {
        self.spaces.try_reserve(spaces)?;
        self.space_names.try_reserve(spaces)?;
        Ok(())
    }

    /// Drop every space, index and field definition. The catalog stays usable.
    pub fn flush(&mut self) {
        let dropped = self.spaces.len();
        self.spaces = HashMap::new();
        self.space_names = HashMap::new();
        debug!(dropped, "schema catalog flushed");
    }

    /// Number of known spaces.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Iterate over all space definitions in no particular order.
    pub fn spaces(&self) -> impl Iterator<Item = &SpaceDef> {
        self.spaces.values()
    }

    /// Look up a space by name.
    pub fn space(&self, name: impl AsRef<[u8]>) -> Option<&SpaceDef> {
        self.spaces.get(name.as_ref())
    }

    /// Look up a space by id.
    pub fn space_by_id(&self, id: SpaceId) -> Option<&SpaceDef> {
        let name = self.space_names.get(&id)?;
        self.spaces.get(name)
    }
}

/// A catalog obtained from [`CatalogHandle::new`].
///
/// `Owned` catalogs were allocated by the handle itself and are freed by
/// [`CatalogHandle::delete`]. `Borrowed` catalogs belong to the caller, so
/// `delete` only resets them.
#[derive(Debug)]
pub enum CatalogHandle<'a> {
    Owned(Box<SchemaCatalog>),
    Borrowed(&'a mut SchemaCatalog),
}

impl<'a> CatalogHandle<'a> {
    /// Allocate a new catalog, or re-initialize `existing` in place.
    pub fn new(existing: Option<&'a mut SchemaCatalog>) -> Result<Self> {
        match existing {
            Some(catalog) => {
                catalog.flush();
                catalog.reserve(DEFAULT_SPACE_CAPACITY)?;
                Ok(CatalogHandle::Borrowed(catalog))
            }
            None => {
                let catalog = SchemaCatalog::with_capacity(DEFAULT_SPACE_CAPACITY)?;
                Ok(CatalogHandle::Owned(Box::new(catalog)))
            }
        }
    }

    /// Whether the catalog storage was allocated by this handle.
    pub fn is_owned(&self) -> bool {
        matches!(self, CatalogHandle::Owned(_))
    }

    /// Flush the catalog and release it if the handle owns it.
    pub fn delete(self) {
        match self {
            CatalogHandle::Owned(mut catalog) => {
                catalog.flush();
                drop(catalog);
            }
            CatalogHandle::Borrowed(catalog) => catalog.flush(),
        }
    }
}

impl Deref for CatalogHandle<'_> {
    type Target = SchemaCatalog;

    fn deref(&self) -> &SchemaCatalog {
        match self {
            CatalogHandle::Owned(catalog) => &**catalog,
            CatalogHandle::Borrowed(catalog) => &**catalog,
        }
    }
}

impl DerefMut for CatalogHandle<'_> {
    fn deref_mut(&mut self) -> &mut SchemaCatalog {
        match self {
            CatalogHandle::Owned(catalog) => &mut **catalog,
            CatalogHandle::Borrowed(catalog) => &mut **catalog,
        }
    }
}
