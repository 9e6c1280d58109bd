//! Check command

use anyhow::{bail, Result};
use execman_update::{BatchFailure, CheckReport};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::CheckArgs;
use crate::context::Context;
use crate::output;

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&CheckReport> for CheckRow {
    fn from(report: &CheckReport) -> Self {
        Self {
            name: report.name.clone(),
            current: report.current_version.clone(),
            latest: report.latest_version.clone(),
            status: if report.update_available {
                "update available".to_string()
            } else {
                "up to date".to_string()
            },
        }
    }
}

#[derive(Serialize)]
struct FailureEntry<'a> {
    name: &'a str,
    stage: &'static str,
    error: String,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    executables: &'a [CheckReport],
    updates_available: usize,
    failures: Vec<FailureEntry<'a>>,
}

pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let registry = ctx.load_registry()?;
    let names: Vec<String> = args.name.into_iter().collect();
    let include_prereleases = args.pre || ctx.settings.include_prereleases;

    if registry.is_empty() && names.is_empty() {
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&CheckOutput {
                    executables: &[],
                    updates_available: 0,
                    failures: Vec::new(),
                })?
            );
        } else if !ctx.quiet {
            output::info("No managed executables");
        }
        return Ok(());
    }

    let installer = ctx.installer()?;
    let spinner = (!args.json && !ctx.quiet).then(|| output::spinner("Checking for updates..."));
    let summary = installer
        .check(&registry, &names, include_prereleases)
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if args.json {
        let out = CheckOutput {
            executables: &summary.reports,
            updates_available: summary.updates_available(),
            failures: summary.failures.iter().map(failure_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let rows: Vec<CheckRow> = summary
            .reports
            .iter()
            .filter(|r| args.all || r.update_available)
            .map(CheckRow::from)
            .collect();

        if !rows.is_empty() {
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            println!("{}", table);
        }

        for failed in &summary.failures {
            output::stage_failure(&failed.name, &failed.failure);
        }

        if !ctx.quiet {
            match summary.updates_available() {
                0 if summary.failures.is_empty() => {
                    output::success("All executables are up to date")
                }
                0 => {}
                n => output::info(&format!(
                    "{} update(s) available, run 'execman update' to install",
                    n
                )),
            }
        }
    }

    if !summary.failures.is_empty() {
        bail!("{} executable(s) could not be checked", summary.failures.len());
    }

    Ok(())
}

fn failure_entry(failed: &BatchFailure) -> FailureEntry<'_> {
    FailureEntry {
        name: &failed.name,
        stage: failed.failure.stage.as_str(),
        error: failed.failure.error.to_string(),
    }
}
