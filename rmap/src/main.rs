//! Roadmapper - staged roadmap generation
//!
//! CLI entry point: parses arguments, sets up logging, runs the pipeline.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use roadmapper::cli::{Cli, Command, generate_after_help, log_dir};
use roadmapper::config::{Config, LlmConfig};
use roadmapper::llm::create_client;
use roadmapper::output::{save_roadmap, write_roadmap};
use roadmapper::pipeline::{ConsoleReporter, GenerationSettings, Idea, Pipeline, PipelineError, ReadlineAnswers};
use roadmapper::progress::{AnimationKind, Terminal};
use roadmapper::prompts::PromptLoader;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // A file, not the terminal: the animation owns the terminal line
    let log_file = fs::File::create(log_dir.join("roadmapper.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help(&LlmConfig::default().api_key_env));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "Roadmapper loaded config");

    let Some(command) = cli.command else {
        debug!("main: no command, printing help");
        Cli::command().print_help()?;
        return Ok(());
    };

    println!("{}", format!("Roadmapper v{}", env!("CARGO_PKG_VERSION")).cyan().bold());

    if let Err(e) = dispatch(&config, command).await {
        tracing::error!(error = %format!("{:#}", e), "main: command failed");
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(hint) = retry_hint(&e) {
            eprintln!("{}", hint.yellow());
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(config: &Config, command: Command) -> Result<()> {
    debug!(?command, "dispatch: called");
    let idea = command.idea();
    match command {
        Command::Generate {
            animation,
            no_interactive,
            output,
            ..
        } => {
            debug!(?animation, no_interactive, ?output, "dispatch: matched Generate");
            let roadmap = cmd_generate(config, &idea, animation, !no_interactive).await?;
            match output {
                Some(path) => report_saved(write_roadmap(&path, &roadmap)?),
                None => print_roadmap(&roadmap),
            }
            Ok(())
        }
        Command::Interactive { animation, .. } => {
            debug!(?animation, "dispatch: matched Interactive");
            let roadmap = cmd_generate(config, &idea, animation, true).await?;
            print_roadmap(&roadmap);
            Ok(())
        }
        Command::Tui { animation } => {
            debug!(?animation, "dispatch: matched Tui");
            let kind = animation.unwrap_or(config.pipeline.animation);
            let pipeline = build_pipeline(config, Terminal::sink(), kind)?;
            roadmapper::tui::run(pipeline, kind).await
        }
        Command::Save {
            output_file,
            animation,
            no_interactive,
            ..
        } => {
            debug!(%output_file, ?animation, no_interactive, "dispatch: matched Save");
            let roadmap = cmd_generate(config, &idea, animation, !no_interactive).await?;
            report_saved(save_roadmap(&config.output.dir, &output_file, &roadmap)?);
            Ok(())
        }
    }
}

/// Build the pipeline from config and run it on one idea
async fn cmd_generate(
    config: &Config,
    idea: &str,
    animation: Option<AnimationKind>,
    interactive: bool,
) -> Result<String> {
    debug!(%idea, ?animation, interactive, "cmd_generate: called");
    let idea = Idea::new(idea)?;
    let kind = animation.unwrap_or(config.pipeline.animation);

    let terminal = Terminal::stdout();
    let mut pipeline = build_pipeline(config, terminal.clone(), kind)?;
    let mut reporter = ConsoleReporter::new(terminal.clone());

    println!("{} {}", "Idea:".bold(), idea);
    let result = if interactive {
        let mut answers = ReadlineAnswers::new(terminal)?;
        pipeline.run_interactive(&idea, kind, &mut answers, &mut reporter).await?
    } else {
        pipeline.run(&idea, &mut reporter).await?
    };

    Ok(result.text)
}

fn build_pipeline(config: &Config, terminal: Terminal, kind: AnimationKind) -> Result<Pipeline> {
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let root = std::env::current_dir().context("Failed to resolve working directory")?;
    Ok(
        Pipeline::new(llm, PromptLoader::new(root), GenerationSettings::from(&config.llm))
            .with_terminal(terminal)
            .with_animation(kind),
    )
}

fn print_roadmap(roadmap: &str) {
    println!();
    println!("{}", "Your Development Roadmap".green().bold());
    println!();
    println!("{}", roadmap);
}

fn report_saved(path: PathBuf) {
    println!("{} {}", "Roadmap saved to".green().bold(), path.display());
}

/// Suggest re-running when the service failure looks temporary
fn retry_hint(e: &eyre::Report) -> Option<String> {
    let Some(PipelineError::Generation { stage, source }) = e.downcast_ref::<PipelineError>() else {
        return None;
    };
    if let Some(wait) = source.retry_after() {
        return Some(format!("Rate limited during {} stage; try again in {}s.", stage, wait.as_secs()));
    }
    source
        .is_transient()
        .then(|| format!("The {} stage hit a temporary service error; running the command again may succeed.", stage))
}
