//! `screenpilot` - goal-driven on-device UI automation agent
//!
//! This binary hosts the agent loop for local development: goals run
//! against a scripted screen fixture instead of a live accessibility
//! layer, with the real model behind them.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use screenpilot_core::agent::AgentLoop;
use screenpilot_core::config::Config;
use screenpilot_core::llm::{GeminiClient, InferenceService};
use screenpilot_core::screen::redact::redact;

mod sim;

#[derive(Parser)]
#[command(
    name = "screenpilot",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Drive a device UI toward a natural-language goal"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a goal against a scripted screen fixture
    Run {
        /// Natural-language goal to pursue
        #[arg(long)]
        goal: String,
        /// JSON fixture describing the screen sequence
        #[arg(long)]
        script: PathBuf,
        /// Explicit config file (default: standard locations)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Pipe text through the privacy filter
    Redact {
        /// Text to scrub; stdin when omitted
        text: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            goal,
            script,
            config,
        } => run_goal(&goal, &script, config.as_deref()).await,
        Commands::Redact { text } => {
            let input = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };
            println!("{}", redact(&input));
            Ok(())
        }
        Commands::Config => {
            let config = Config::load().context("Failed to load configuration")?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_goal(goal: &str, script: &std::path::Path, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from(path).context("Failed to load configuration")?,
        None => Config::load().context("Failed to load configuration")?,
    };

    if let Some(data_dir) = screenpilot_core::config::get_data_dir() {
        screenpilot_core::logger::init(data_dir);
    }

    let screen = Arc::new(sim::ScriptedScreen::from_path(script)?);
    let service: Arc<dyn InferenceService> =
        Arc::new(GeminiClient::new(config.llm.clone()).context("Failed to build model client")?);

    let agent = Arc::new(AgentLoop::new(screen, service, &config));
    agent.set_status_callback(Arc::new(|message| println!("[agent] {}", message)));

    // Ctrl-C stops the loop at its next suspension point.
    let cancel = agent.cancel_token();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel.cancel();
    });

    let session = agent.run(goal).await?;
    println!(
        "session {} finished: {:?} after {} step(s)",
        session.id, session.status, session.step
    );
    if !session.last_message.is_empty() {
        println!("last message: {}", session.last_message);
    }
    Ok(())
}
