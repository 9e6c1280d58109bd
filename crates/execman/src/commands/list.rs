//! List command

use anyhow::Result;
use execman_registry::ExecutableRecord;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::ListArgs;
use crate::context::Context;
use crate::output;

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Path")]
    path: String,
}

#[derive(Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    #[serde(flatten)]
    record: &'a ExecutableRecord,
}

pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let registry = ctx.load_registry()?;

    if args.json {
        let entries: Vec<ListEntry<'_>> = registry
            .iter()
            .map(|(name, record)| ListEntry {
                name: name.as_str(),
                record,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if registry.is_empty() {
        if !ctx.quiet {
            output::info("No managed executables");
        }
        return Ok(());
    }

    let rows: Vec<ListRow> = registry
        .iter()
        .map(|(name, record)| ListRow {
            name: name.clone(),
            version: record.version.clone(),
            platform: record.platform.clone(),
            installed: record.installed_at.format("%Y-%m-%d %H:%M").to_string(),
            path: record.path.display().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    Ok(())
}
