//! Remove command

use anyhow::{bail, Context as _, Result};
use std::fs;
use std::io::ErrorKind;

use crate::cli::RemoveArgs;
use crate::context::Context;
use crate::output;

pub fn run(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let _lock = ctx.lock_registry()?;
    let mut registry = ctx.load_registry()?;

    let Some(record) = registry.get(&args.name).cloned() else {
        bail!("'{}' is not managed by execman", args.name);
    };

    if !args.keep_file {
        match fs::remove_file(&record.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                output::warning(&format!("{} was already gone", record.path.display()));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to delete {}", record.path.display()));
            }
        }
    }

    registry.remove(&args.name);
    registry.save().context("Failed to save registry")?;

    output::success(&format!("Removed {} {}", args.name, record.version));
    if args.keep_file {
        output::kv("kept", &record.path.display().to_string());
    }

    Ok(())
}
