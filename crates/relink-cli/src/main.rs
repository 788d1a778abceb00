//! relink CLI
//!
//! Maps a Python project's modules before and after a restructure and
//! rewrites imports to follow renamed modules.

mod commands;
mod menu;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::RunSettings;
use relink_core::{MatchStrategy, CONFIG_FILE_NAME};
use session::Session;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relink")]
#[command(about = "relink - Reconcile Python imports after a project restructure")]
#[command(version)]
struct Cli {
    /// Config file (default: ./.import_reconciler.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project and save a module map
    Scan {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        root: PathBuf,

        /// File name prefix, e.g. "original" or "new"
        #[arg(long)]
        prefix: Option<String>,

        /// Directory to write the module map to (default: configured mapping dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List saved module maps
    List,

    /// Print a saved module map
    Show {
        /// Module map file
        file: PathBuf,
    },

    /// Rewrite imports using two module maps
    Reconcile {
        /// Original module map (default: configured selection)
        #[arg(long, requires = "new")]
        old: Option<PathBuf>,

        /// New module map (default: configured selection)
        #[arg(long, requires = "old")]
        new: Option<PathBuf>,

        /// How old modules are matched to new ones: first-match or max-overlap
        #[arg(long, default_value_t = MatchStrategy::FirstMatch)]
        strategy: MatchStrategy,

        /// Skip running the test command afterwards
        #[arg(long)]
        no_verify: bool,

        /// Show the changes without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive menu (default)
    Menu,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let root = std::env::current_dir().context("Failed to read current directory")?;
    let config_path = cli
        .config
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    let mut session = Session::open(config_path, root, Box::new(std::io::stdout()))?;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Scan { root, prefix, out } => {
            commands::scan_project(&mut session, &root, prefix.as_deref(), out.as_deref())?;
        }
        Commands::List => {
            commands::list_mappings(&mut session)?;
        }
        Commands::Show { file } => commands::show_mapping(&mut session, &file)?,
        Commands::Reconcile {
            old,
            new,
            strategy,
            no_verify,
            dry_run,
            json,
        } => {
            let (old, new) = match (old, new) {
                (Some(old), Some(new)) => (old, new),
                _ => {
                    let (old, new) = session.config.selected_maps()?;
                    (old.to_path_buf(), new.to_path_buf())
                }
            };
            let settings = RunSettings {
                strategy,
                verify: !no_verify,
                dry_run,
                json,
            };
            commands::run_reconciliation(&mut session, &old, &new, settings)?;
        }
        Commands::Menu => {
            let stdin = std::io::stdin();
            menu::run(&mut session, &mut stdin.lock())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_out_flag() {
        let cli = Cli::try_parse_from(["relink", "scan", "src", "--prefix", "new", "--out", "maps"])
            .unwrap();

        let Some(Commands::Scan { root, prefix, out }) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(root, PathBuf::from("src"));
        assert_eq!(prefix.as_deref(), Some("new"));
        assert_eq!(out, Some(PathBuf::from("maps")));
    }

    #[test]
    fn test_reconcile_strategy_flag() {
        let cli = Cli::try_parse_from(["relink", "reconcile", "--strategy", "max-overlap"]).unwrap();
        let Some(Commands::Reconcile { strategy, .. }) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(strategy, MatchStrategy::MaxOverlap);

        let cli = Cli::try_parse_from(["relink", "reconcile"]).unwrap();
        let Some(Commands::Reconcile { strategy, .. }) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(strategy, MatchStrategy::FirstMatch);

        assert!(Cli::try_parse_from(["relink", "reconcile", "--strategy", "best"]).is_err());
    }
}
