use clap::Subcommand;

/// A console command, run against the loaded catalog.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every space with its id, field count and indexes.
    List,
    /// Describe one space by name.
    Space {
        name: String,
    },
    /// Resolve an index name within a space to its id.
    Index {
        space_id: u32,
        name: String,
    },
    /// Resolve a format field name within a space to its field number.
    Field {
        space_id: u32,
        name: String,
    },
}
