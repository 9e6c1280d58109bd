//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// execman - manage executables published as forge release assets
#[derive(Parser, Debug)]
#[command(name = "execman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the registry file
    #[arg(long, global = true, env = "EXECMAN_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Path to the settings file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install an executable from a release
    Install(InstallArgs),

    /// Check managed executables for newer releases
    Check(CheckArgs),

    /// Update managed executables to their latest releases
    Update(UpdateArgs),

    /// List managed executables
    List(ListArgs),

    /// Stop managing an executable
    Remove(RemoveArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Source, e.g. github.com/owner/project or owner/project@v1.2.0
    pub source: String,

    /// Local name (defaults to the project name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Install directory
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Consider prereleases
    #[arg(long)]
    pub pre: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only check this executable
    pub name: Option<String>,

    /// Consider prereleases
    #[arg(long)]
    pub pre: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also show executables that are up to date
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Only update this executable
    pub name: Option<String>,

    /// Consider prereleases
    #[arg(long)]
    pub pre: bool,

    /// Reinstall even when already on the latest release
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Executable to remove
    pub name: String,

    /// Keep the installed file, only drop it from the registry
    #[arg(long)]
    pub keep_file: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_with_globals() {
        let cli = Cli::try_parse_from([
            "execman",
            "-vv",
            "--registry",
            "/tmp/registry.json",
            "install",
            "acme/tool@v1.2.0",
            "--name",
            "tool2",
            "--pre",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.registry, Some(PathBuf::from("/tmp/registry.json")));
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.source, "acme/tool@v1.2.0");
                assert_eq!(args.name.as_deref(), Some("tool2"));
                assert!(args.pre);
                assert!(args.dir.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from(["execman", "check", "tool", "--json", "--all"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.name.as_deref(), Some("tool"));
                assert!(args.json && args.all && !args.pre);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_remove_requires_name() {
        assert!(Cli::try_parse_from(["execman", "remove"]).is_err());
    }
}
