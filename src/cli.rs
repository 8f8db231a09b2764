//! Command-line interface definitions for Trend Gene Map.
//!
//! Global options can be provided via flags or environment variables; each
//! subcommand maps onto one operation of the pipeline.

use crate::settings::Theme;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Trend Gene Map application.
///
/// # Examples
///
/// ```sh
/// # Fetch the current list and write a snapshot
/// trend_gene_map fetch -j ./json
///
/// # Analyze one topic (cached after the first call)
/// trend_gene_map analyze "某话题"
///
/// # Aggregate analysis plus big events
/// LLM_API_KEY=sk-... trend_gene_map overview --limit 30
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path of the local store holding settings and cached analyses
    #[arg(
        long,
        global = true,
        env = "TREND_GENE_MAP_STORE",
        default_value = "trend_gene_map_store.json"
    )]
    pub store: PathBuf,

    /// Keep settings and cache in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// API key for the completion service (overrides the stored one)
    #[arg(long, global = true, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the current trend list through the source chain
    Fetch {
        /// Print items as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Output directory for JSON snapshots
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },

    /// Gene-map analysis of a single topic, served from cache when possible
    Analyze {
        /// The topic title
        title: String,

        /// Drop any cached analysis first
        #[arg(long)]
        refresh: bool,
    },

    /// Aggregate analysis and big-event detection over the current list
    Overview {
        /// How many items to include (defaults to `analysis_limit`)
        #[arg(long)]
        limit: Option<usize>,

        /// Write the report to this Markdown file instead of stdout
        #[arg(short, long)]
        markdown_output: Option<PathBuf>,
    },

    /// Refresh the list periodically
    Watch {
        /// Seconds between refreshes (defaults to `refresh_secs`)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Inspect or change stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Store the completion-service API key
    SetKey { key: String },
    /// Remove the stored API key
    ClearKey,
    /// Set the display theme (dark or light)
    Theme { theme: Theme },
    /// Set the background opacity (0.0 to 1.0)
    Opacity { value: f32 },
    /// Remove the stored background image
    ClearBackground,
    /// Remove every cached analysis
    ClearCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_fetch_parsing() {
        let cli = Cli::parse_from(["trend_gene_map", "fetch", "-j", "./json"]);
        match cli.command {
            Command::Fetch {
                json,
                json_output_dir,
            } => {
                assert!(!json);
                assert_eq!(json_output_dir.as_deref(), Some("./json"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "trend_gene_map",
            "analyze",
            "某话题",
            "--refresh",
            "--ephemeral",
            "--store",
            "/tmp/store.json",
        ]);
        assert!(cli.ephemeral);
        assert_eq!(cli.store, PathBuf::from("/tmp/store.json"));
        match cli.command {
            Command::Analyze { title, refresh } => {
                assert_eq!(title, "某话题");
                assert!(refresh);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_settings_theme() {
        let cli = Cli::parse_from(["trend_gene_map", "settings", "theme", "light"]);
        assert!(matches!(
            cli.command,
            Command::Settings {
                action: SettingsAction::Theme { theme: Theme::Light }
            }
        ));
        assert!(Cli::try_parse_from(["trend_gene_map", "settings", "theme", "sepia"]).is_err());
    }

    #[test]
    fn test_cli_overview_limit() {
        let cli = Cli::parse_from(["trend_gene_map", "overview", "--limit", "20", "-m", "out.md"]);
        match cli.command {
            Command::Overview {
                limit,
                markdown_output,
            } => {
                assert_eq!(limit, Some(20));
                assert_eq!(markdown_output, Some(PathBuf::from("out.md")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
