mod script;

use std::fs;
use std::path::{Path, PathBuf};

use canvas::config::{CanvasConfig, ConfigError};
use canvas::doc::{Scene, SceneSnapshot};
use canvas::engine::{Action, EngineCore};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("scene has {0} invariant violation(s)")]
    Violations(usize),
}

#[derive(Parser, Debug)]
#[command(name = "inkboard", about = "Replay gesture scripts and check Inkboard scene snapshots")]
struct Cli {
    /// JSON config file; INKBOARD_* variables override its values.
    #[arg(long, env = "INKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive the engine through a recorded script and print the resulting snapshot.
    Replay {
        script: PathBuf,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Check a snapshot against the scene invariants.
    Validate { snapshot: PathBuf },
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Replay { script, pretty } => run_replay(config, &script, pretty),
        Command::Validate { snapshot } => run_validate(&snapshot),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<CanvasConfig, CliError> {
    let Some(path) = path else {
        return Ok(CanvasConfig::from_env());
    };
    let raw = read(path)?;
    let config = CanvasConfig::from_json(&raw)?.with_env_overrides();
    config.validate()?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

fn run_replay(config: CanvasConfig, path: &Path, pretty: bool) -> Result<(), CliError> {
    let raw = read(path)?;
    let steps = script::parse(&raw).map_err(|source| CliError::Json { path: path.to_owned(), source })?;
    let mut core = EngineCore::with_config(config);
    let actions = script::replay(&mut core, &steps);
    let commits = actions.iter().filter(|a| matches!(a, Action::SceneChanged)).count();
    info!(steps = steps.len(), actions = actions.len(), commits, "replay finished");

    let snapshot = core.snapshot();
    let rendered =
        if pretty { serde_json::to_string_pretty(&snapshot)? } else { serde_json::to_string(&snapshot)? };
    println!("{rendered}");
    Ok(())
}

fn run_validate(path: &Path) -> Result<(), CliError> {
    let raw = read(path)?;
    let snapshot: SceneSnapshot =
        serde_json::from_str(&raw).map_err(|source| CliError::Json { path: path.to_owned(), source })?;
    let scene = Scene::from_snapshot(snapshot);
    let violations = scene.check();
    if violations.is_empty() {
        println!("ok: {} elements, {} connections", scene.elements.len(), scene.connections.len());
        return Ok(());
    }
    for violation in &violations {
        println!("{violation}");
    }
    Err(CliError::Violations(violations.len()))
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}
