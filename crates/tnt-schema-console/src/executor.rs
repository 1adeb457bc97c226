use std::error::Error;
use std::path::Path;

use tnt_schema::SchemaCatalog;
use tnt_schema::types::SpaceDef;
use tracing::info;

use crate::commands::Command;

/// Structured result from executing a command.
pub enum CommandResult<'a> {
    /// All spaces, ordered by id (LIST).
    SpaceList(Vec<&'a SpaceDef>),
    /// One space (SPACE).
    Space(Option<&'a SpaceDef>),
    /// A resolved index or field id (INDEX, FIELD).
    Id {
        kind: &'static str,
        space_id: u32,
        name: String,
        id: Option<u32>,
    },
}

impl CommandResult<'_> {
    /// Whether the lookup found what it was asked for.
    pub fn found(&self) -> bool {
        match self {
            CommandResult::SpaceList(_) => true,
            CommandResult::Space(space) => space.is_some(),
            CommandResult::Id { id, .. } => id.is_some(),
        }
    }
}

/// Build a catalog from raw `_space` and (optionally) `_index` select results on disk.
pub fn load_catalog(
    spaces_path: &Path,
    indexes_path: Option<&Path>,
) -> Result<SchemaCatalog, Box<dyn Error>> {
    let mut catalog = SchemaCatalog::new();

    let spaces = std::fs::read(spaces_path)
        .map_err(|e| format!("cannot read {}: {e}", spaces_path.display()))?;
    catalog.add_spaces(&spaces)?;
    info!(path = %spaces_path.display(), spaces = catalog.len(), "loaded spaces");

    if let Some(path) = indexes_path {
        let indexes =
            std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        catalog.add_indexes(&indexes)?;
        info!(path = %path.display(), "loaded indexes");
    }

    Ok(catalog)
}

/// Execute a command against the catalog.
pub fn execute<'a>(catalog: &'a SchemaCatalog, cmd: &Command) -> CommandResult<'a> {
    match cmd {
        Command::List => {
            let mut spaces: Vec<&SpaceDef> = catalog.spaces().collect();
            spaces.sort_by_key(|space| space.id);
            CommandResult::SpaceList(spaces)
        }
        Command::Space { name } => CommandResult::Space(catalog.space(name)),
        Command::Index { space_id, name } => CommandResult::Id {
            kind: "index",
            space_id: *space_id,
            name: name.clone(),
            id: catalog.stoiid(*space_id, name),
        },
        Command::Field { space_id, name } => CommandResult::Id {
            kind: "field",
            space_id: *space_id,
            name: name.clone(),
            id: catalog.stofid(*space_id, name),
        },
    }
}
