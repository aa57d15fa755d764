use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tapline_engine::cli::{self, OutputHandlers, RunOptions};
use tapline_engine::config::ConfigLoader;
use tapline_engine::executor::ActionExecutor;
use tapline_engine::formatter::format_schema;
use tapline_engine::runner::ScriptRunner;
use tapline_engine::schema;
use tapline_replay::{DeviceFixture, ReplayBridge};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tapline", version, about = "Run structured UI action scripts")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script against a recorded device
    Run {
        /// Script file (YAML or JSON)
        script: PathBuf,
        /// Device fixture to replay against
        #[arg(long)]
        device: PathBuf,
        /// Config file. Defaults to ./tapline.yaml, then ~/.tapline/config.yaml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the device event log as JSON after the run
        #[arg(long)]
        events: bool,
    },
    /// Check a script against the action schema without running it
    Validate {
        script: PathBuf,
    },
    /// List every action kind with its parameters
    Actions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries reports and event logs.
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ok = match args.command {
        Command::Run {
            script,
            device,
            config,
            events,
        } => run(script, device, config, events).await?,
        Command::Validate { script } => validate(script).await?,
        Command::Actions => {
            print!("{}", format_schema(schema::all()));
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    script: PathBuf,
    device: PathBuf,
    config: Option<PathBuf>,
    events: bool,
) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(config.as_deref())
        .await
        .context("loading configuration")?;
    let fixture = DeviceFixture::load(&device).await?;
    let script = cli::load_script(&script).await?;
    info!(actions = script.len(), device = %device.display(), "Loaded script");

    let delay = config.timing.inter_action_delay();
    let executor = ActionExecutor::new(ReplayBridge::new(fixture), config);
    let runner = ScriptRunner::new(executor, delay);
    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };
    let report = cli::run_script(&runner, &script, output, RunOptions::default()).await;

    if events {
        let bridge = runner.into_handler().into_bridge();
        println!("{}", serde_json::to_string_pretty(bridge.events())?);
    }
    Ok(report.succeeded())
}

async fn validate(script: PathBuf) -> anyhow::Result<bool> {
    let parsed = cli::load_script(&script).await?;
    let problems = cli::validate_script(&parsed);
    if problems.is_empty() {
        println!("{}: {} action(s), all valid", script.display(), parsed.len());
        return Ok(true);
    }
    for (index, reason) in &problems {
        eprintln!("action {}: [{}] {}", index + 1, reason.code(), reason);
    }
    Ok(false)
}
