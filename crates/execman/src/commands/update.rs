//! Update command

use anyhow::{bail, Context as _, Result};

use crate::cli::UpdateArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: UpdateArgs, ctx: &Context) -> Result<()> {
    let installer = ctx.installer()?;
    let names: Vec<String> = args.name.into_iter().collect();
    let include_prereleases = args.pre || ctx.settings.include_prereleases;

    let _lock = ctx.lock_registry()?;
    let mut registry = ctx.load_registry()?;

    if registry.is_empty() && names.is_empty() {
        if !ctx.quiet {
            output::info("No managed executables");
        }
        return Ok(());
    }

    let report = installer
        .update(&mut registry, &names, args.force, include_prereleases)
        .await
        .context("Failed to record updates")?;

    for outcome in &report.outcomes {
        if outcome.updated {
            if outcome.from_version == outcome.to_version {
                output::success(&format!("Reinstalled {} {}", outcome.name, outcome.to_version));
            } else {
                output::success(&format!(
                    "Updated {} {} → {}",
                    outcome.name, outcome.from_version, outcome.to_version
                ));
            }
        } else if !ctx.quiet {
            output::info(&format!(
                "{} is up to date ({})",
                outcome.name, outcome.from_version
            ));
        }
    }

    for failed in &report.failures {
        output::stage_failure(&failed.name, &failed.failure);
    }

    if !report.failures.is_empty() {
        bail!(
            "{} of {} executable(s) failed to update",
            report.failures.len(),
            report.failures.len() + report.outcomes.len()
        );
    }

    if !ctx.quiet && report.updated_count() == 0 {
        output::success("Nothing to update");
    }

    Ok(())
}
