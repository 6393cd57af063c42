//! Unified Voice CLI - inspect and maintain a voice service data directory
//!
//! Inference backends are linked by embedding applications, so this binary
//! covers the operations that need no model: status, speaker listing and
//! deletion, engine availability and recommendations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use unified_voice::{ServiceConfig, SynthesisOptions, VoiceService, VoiceServiceBuilder, VERSION};

/// Unified Voice - voice-cloning service tools
#[derive(Parser, Debug)]
#[command(name = "unified-voice")]
#[command(author, version, about, long_about = None)]
#[command(long_about = "
Inspect and maintain the speaker registry and engine installation of a
voice-cloning service.

Examples:
  # Show engine availability and speaker counts
  unified-voice status

  # List enrolled speakers with metadata
  unified-voice speakers --details

  # Ask which engine suits a request
  unified-voice recommend \"Good morning\" --target-language en
")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Service configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show service status
    Status,

    /// List enrolled speakers
    Speakers {
        /// Print full records instead of ids
        #[arg(short, long)]
        details: bool,
    },

    /// Delete an enrolled speaker
    Delete {
        /// Speaker id
        id: String,
    },

    /// List engines that can currently be selected
    Engines,

    /// Recommend an engine for a request
    Recommend {
        /// Text to synthesize
        text: String,

        /// Requested emotion
        #[arg(long)]
        emotion: Option<String>,

        /// Free-form instruction
        #[arg(long)]
        instruction: Option<String>,

        /// Target language code (zh, en, jp, ...)
        #[arg(long)]
        target_language: Option<String>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "unified-voice.yaml")]
        output: PathBuf,
    },
}

fn setup_logging(verbose: bool) -> Result<()> {
    // RUST_LOG takes precedence over --verbose
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ServiceConfig::default()),
    }
}

fn open_service(config: ServiceConfig) -> Result<VoiceService> {
    let pb = create_spinner("Opening voice service...")?;
    let service = VoiceServiceBuilder::from_config(config)
        .build()
        .context("Failed to open voice service");
    pb.finish_and_clear();
    service
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    info!("Unified Voice v{}", VERSION);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::InitConfig { output } = &cli.command {
        let config = load_config(cli.config.as_ref())?;
        config
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Wrote configuration to {}", output.display());
        return Ok(());
    }

    let service = open_service(load_config(cli.config.as_ref())?)?;

    match cli.command {
        Commands::Status => print_json(&service.get_service_status())?,
        Commands::Speakers { details } => {
            if details {
                print_json(&service.get_speaker_details())?;
            } else {
                for id in service.list_available_speakers() {
                    println!("{}", id);
                }
            }
        }
        Commands::Delete { id } => {
            if service.delete_speaker(&id) {
                info!("Deleted speaker '{}'", id);
            } else {
                warn!("Speaker '{}' was not deleted", id);
                anyhow::bail!("Failed to delete speaker '{}'", id);
            }
        }
        Commands::Engines => {
            for engine in service.get_available_engines() {
                println!("{}", engine);
            }
        }
        Commands::Recommend {
            text,
            emotion,
            instruction,
            target_language,
        } => {
            let options = SynthesisOptions {
                emotion,
                instruction,
                target_language,
                ..Default::default()
            };
            print_json(&service.get_engine_recommendations(&text, &options))?;
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(dir: &tempfile::TempDir, args: &[&str]) -> Cli {
        let config_path = dir.path().join("unified-voice.yaml");
        ServiceConfig::with_data_dir(dir.path())
            .save(&config_path)
            .unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();
        let mut argv = vec!["unified-voice", "--config", config_arg.as_str()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_delete_unknown_speaker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(cli_for(&dir, &["delete", "ghost"])).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_engines_command_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(cli_for(&dir, &["engines"])).is_ok());
    }
}
