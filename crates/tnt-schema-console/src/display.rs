use serde_json::{Value, json};
use tnt_schema::types::{FieldSpec, SpaceDef};

use crate::executor::CommandResult;

/// Output mode for rendering command results.
pub enum OutputMode {
    /// Human-readable output.
    Pretty,
    /// Machine-parseable JSON (one JSON object per result on stdout).
    Json,
}

/// Render a command result to stdout in the given mode.
pub fn render(result: &CommandResult, mode: &OutputMode) {
    match result {
        CommandResult::SpaceList(spaces) => match mode {
            OutputMode::Pretty => print_space_list(spaces),
            OutputMode::Json => {
                let items: Vec<Value> = spaces.iter().map(|s| space_json(s)).collect();
                println!("{}", json!({"spaces": items}));
            }
        },
        CommandResult::Space(space) => match mode {
            OutputMode::Pretty => match space {
                Some(s) => print_space(s),
                None => println!("Space not found."),
            },
            OutputMode::Json => match space {
                Some(s) => println!("{}", json!({"found": true, "space": space_json(s)})),
                None => println!("{}", json!({"found": false})),
            },
        },
        CommandResult::Id {
            kind,
            space_id,
            name,
            id,
        } => match mode {
            OutputMode::Pretty => match id {
                Some(id) => println!("{id}"),
                None => println!("No {kind} '{name}' in space {space_id}."),
            },
            OutputMode::Json => println!(
                "{}",
                json!({
                    "kind": kind,
                    "space_id": space_id,
                    "name": name,
                    "found": id.is_some(),
                    "id": id,
                })
            ),
        },
    }
}

/// Render an error in the given mode (always to stderr).
pub fn render_error(err: &dyn std::fmt::Display, mode: &OutputMode) {
    match mode {
        OutputMode::Pretty => eprintln!("Error: {err}"),
        OutputMode::Json => eprintln!("{}", json!({"error": err.to_string()})),
    }
}

/// JSON form of a space, with indexes ordered by id.
fn space_json(space: &SpaceDef) -> Value {
    let mut indexes: Vec<_> = space.indexes.values().collect();
    indexes.sort_by_key(|idx| idx.id);
    json!({
        "id": space.id,
        "name": space.name,
        "field_count": space.field_count,
        "fields": space.fields,
        "indexes": indexes,
    })
}

fn print_space_list(spaces: &[&SpaceDef]) {
    if spaces.is_empty() {
        println!("No spaces.");
        return;
    }
    let width = spaces
        .iter()
        .map(|s| s.name.to_string_lossy().chars().count())
        .max()
        .unwrap_or(0);
    for space in spaces {
        println!(
            "{:>6}  {:<width$}  fields: {:<3} indexes: {}",
            space.id,
            space.name,
            space.fields.len(),
            space.indexes.len(),
        );
    }
}

fn print_space(space: &SpaceDef) {
    println!("Space '{}' (id {})", space.name, space.id);
    if space.field_count > 0 {
        println!("  Declared field count: {}", space.field_count);
    }
    if space.fields.is_empty() {
        println!("  Format: none");
    } else {
        println!("  Format:");
        for field in &space.fields {
            println!("    {}", format_field(field));
        }
    }

    let mut indexes: Vec<_> = space.indexes.values().collect();
    indexes.sort_by_key(|idx| idx.id);
    if indexes.is_empty() {
        println!("  Indexes: none");
    } else {
        println!("  Indexes:");
        for index in indexes {
            let parts: Vec<String> = index.parts.iter().map(format_field).collect();
            println!("    {:>3}  {}  ({})", index.id, index.name, parts.join(", "));
        }
    }
}

fn format_field(field: &FieldSpec) -> String {
    format!("#{} {}: {:?}", field.ordinal, field.name, field.field_type)
}
