//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::progress::AnimationKind;

/// Roadmapper - turns a product idea into a development roadmap
#[derive(Parser)]
#[command(
    name = "rmap",
    about = "Generate detailed, customized development roadmaps from a product idea",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a roadmap (interactive unless --no-interactive)
    Generate {
        /// Product idea
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,

        /// Progress animation (spinner, dots, bar, typing)
        #[arg(short, long)]
        animation: Option<AnimationKind>,

        /// Skip the clarification questions
        #[arg(long)]
        no_interactive: bool,

        /// Write the roadmap to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a roadmap, always asking clarification questions
    Interactive {
        /// Product idea
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,

        /// Progress animation (spinner, dots, bar, typing)
        #[arg(short, long)]
        animation: Option<AnimationKind>,
    },

    /// Generate a roadmap and save it into the output directory
    Save {
        /// Product idea
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,

        /// File name inside the configured output directory
        #[arg(short, long, default_value = "roadmap.md")]
        output_file: String,

        /// Progress animation (spinner, dots, bar, typing)
        #[arg(short, long)]
        animation: Option<AnimationKind>,

        /// Skip the clarification questions
        #[arg(long)]
        no_interactive: bool,
    },

    /// Full-screen front end: type ideas, watch progress, read the roadmap
    Tui {
        /// Progress animation (spinner, dots, bar, typing)
        #[arg(short, long)]
        animation: Option<AnimationKind>,
    },
}

impl Command {
    /// The idea words joined back into one description; empty for `tui`,
    /// which reads ideas on screen
    pub fn idea(&self) -> String {
        match self {
            Self::Generate { idea, .. } | Self::Interactive { idea, .. } | Self::Save { idea, .. } => idea.join(" "),
            Self::Tui { .. } => String::new(),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = log_dir().join("roadmapper.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Directory the log file lives in
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roadmapper")
        .join("logs")
}

/// Generate the after_help text with credential status and log location
pub fn generate_after_help(api_key_env: &str) -> String {
    debug!(%api_key_env, "generate_after_help: called");
    let key_present = std::env::var(api_key_env).map(|v| !v.trim().is_empty()).unwrap_or(false);

    let mut help = String::new();

    help.push_str("Credentials:\n");
    let icon = if key_present {
        debug!("generate_after_help: api key present");
        "\u{2705}"
    } else {
        debug!("generate_after_help: api key missing");
        "\u{274C}"
    };
    help.push_str(&format!("  {} {}\n", icon, api_key_env));

    help.push('\n');
    help.push_str("Animations: ");
    let names: Vec<&str> = AnimationKind::ALL.iter().map(AnimationKind::name).collect();
    help.push_str(&names.join(", "));
    help.push('\n');

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    debug!("generate_after_help: returning help text");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["rmap"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_generate_defaults() {
        let cli = Cli::parse_from(["rmap", "generate", "A water intake tracker"]);
        match cli.command {
            Some(Command::Generate {
                ref idea,
                animation,
                no_interactive,
                ref output,
            }) => {
                assert_eq!(idea, &vec!["A water intake tracker".to_string()]);
                assert!(animation.is_none());
                assert!(!no_interactive);
                assert!(output.is_none());
            }
            other => panic!("Expected Generate, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_generate_flags() {
        let cli = Cli::parse_from([
            "rmap",
            "generate",
            "--animation",
            "bar",
            "--no-interactive",
            "-o",
            "plan.md",
            "water",
            "tracker",
        ]);
        let command = cli.command.unwrap();
        assert_eq!(command.idea(), "water tracker");
        assert!(matches!(
            command,
            Command::Generate {
                animation: Some(AnimationKind::Bar),
                no_interactive: true,
                output: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_interactive() {
        let cli = Cli::parse_from(["rmap", "interactive", "-a", "typing", "idea"]);
        assert!(matches!(
            cli.command,
            Some(Command::Interactive {
                animation: Some(AnimationKind::Typing),
                ..
            })
        ));
    }

    #[test]
    fn test_cli_parse_save_default_file() {
        let cli = Cli::parse_from(["rmap", "save", "idea"]);
        if let Some(Command::Save { output_file, .. }) = cli.command {
            assert_eq!(output_file, "roadmap.md");
        } else {
            panic!("Expected Save command");
        }
    }

    #[test]
    fn test_cli_parse_tui() {
        let cli = Cli::parse_from(["rmap", "tui", "--animation", "dots"]);
        let command = cli.command.unwrap();
        assert!(matches!(
            command,
            Command::Tui {
                animation: Some(AnimationKind::Dots)
            }
        ));
        assert_eq!(command.idea(), "");
    }

    #[test]
    fn test_cli_rejects_unknown_animation() {
        let result = Cli::try_parse_from(["rmap", "generate", "--animation", "confetti", "idea"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_idea() {
        assert!(Cli::try_parse_from(["rmap", "generate"]).is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["rmap", "save", "idea", "-l", "debug", "-c", "/tmp/r.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.yml")));
    }

    #[test]
    fn test_after_help_mentions_log_path() {
        let help = generate_after_help("RMAP_TEST_UNSET_KEY_VAR");
        assert!(help.contains("\u{274C} RMAP_TEST_UNSET_KEY_VAR"));
        assert!(help.contains("spinner, dots, bar, typing"));
        assert!(help.contains("roadmapper.log"));
    }
}
