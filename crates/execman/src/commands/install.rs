//! Install command

use anyhow::{Context as _, Result};
use execman_update::InstallRequest;

use crate::cli::InstallArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: InstallArgs, ctx: &Context) -> Result<()> {
    let installer = ctx.installer()?;

    let mut request = InstallRequest::new(&args.source);
    if let Some(name) = args.name {
        request = request.with_name(name);
    }
    if let Some(dir) = args.dir {
        request = request.with_install_dir(dir);
    }
    if args.pre {
        request = request.with_prereleases(true);
    }

    let _lock = ctx.lock_registry()?;
    let mut registry = ctx.load_registry()?;

    let outcome = installer
        .install(&mut registry, &request)
        .await
        .with_context(|| format!("Failed to install {}", args.source))?;

    let record = &outcome.record;
    match &outcome.previous_version {
        Some(previous) if *previous != record.version => output::success(&format!(
            "Installed {} {} (was {})",
            outcome.name, record.version, previous
        )),
        _ => output::success(&format!("Installed {} {}", outcome.name, record.version)),
    }
    output::kv("path", &record.path.display().to_string());
    output::kv("platform", &record.platform);
    if let Some(checksum) = &record.checksum {
        output::kv("checksum", checksum.as_str());
    }
    if !outcome.checksum_verified {
        output::warning("No published checksum for this asset; integrity was not verified");
    }

    Ok(())
}
