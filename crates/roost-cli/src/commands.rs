use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use roost_config::{ConfigLoader, RoostConfig};
use roost_core::{Result, RoostError, SystemClock};
use roost_engine::{SubprocessEngine, SubprocessEngineConfig};
use roost_runtime::{Harness, RoutineRegistry};
use roost_store::{MemorySessionStore, SessionStore, SqliteSessionStore};

/// Roost — run named autonomous routines with session continuity
#[derive(Parser)]
#[command(name = "roost", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to roost.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a routine by name, e.g. `roost run notes.handoff`
    Run {
        /// Registered routine name
        name: String,
    },
    /// List registered routines
    List,
    /// Show a routine's session strategy and capabilities
    Info {
        /// Registered routine name
        name: String,
    },
    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version info
    Version,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config default
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };

        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .json()
                .with_target(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .with_target(false)
                .init();
        }

        match self.command {
            Commands::Run { name } => cmd_run(config, &name).await,
            Commands::List => cmd_list(config),
            Commands::Info { name } => cmd_info(config, &name),
            Commands::Config { json } => cmd_config(config, json),
            Commands::Version => cmd_version(),
        }
    }
}

fn build_store(config: &RoostConfig) -> Result<Arc<dyn SessionStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemorySessionStore::new())),
        _ => Ok(Arc::new(SqliteSessionStore::open(
            &config.store.resolved_path(),
        )?)),
    }
}

fn build_registry(store: &Arc<dyn SessionStore>) -> Result<Arc<RoutineRegistry>> {
    let mut registry = RoutineRegistry::new();
    roost_routines::register_builtins(&mut registry, store)?;
    Ok(Arc::new(registry))
}

async fn cmd_run(config: RoostConfig, name: &str) -> Result<()> {
    let store = build_store(&config)?;
    let registry = build_registry(&store)?;
    let tz = config.harness.tz().map_err(RoostError::Config)?;
    let engine = Arc::new(SubprocessEngine::new(SubprocessEngineConfig {
        command: config.engine.command.clone(),
        base_args: config.engine.args.clone(),
        workdir: config.engine.workdir.clone(),
    }));

    let harness = Harness::new(
        registry,
        store,
        engine,
        Arc::new(SystemClock::new(tz)),
        config.engine.timeout(),
    );

    info!(routine = name, "running routine");
    let report = harness.run(name).await?;

    println!("{}", report.output);
    if let Some(err) = &report.commit_error {
        eprintln!("⚠️  session continuity lost: {err}");
    }
    info!(
        routine = name,
        run_id = %report.run_id,
        secs = report.duration.as_secs_f32(),
        "routine complete"
    );
    Ok(())
}

fn cmd_list(config: RoostConfig) -> Result<()> {
    let store = build_store(&config)?;
    let registry = build_registry(&store)?;

    if registry.is_empty() {
        println!("No routines registered.");
        return Ok(());
    }

    println!("Available routines:");
    for routine in registry.iter() {
        println!("  - {}", routine.name());
    }
    Ok(())
}

fn cmd_info(config: RoostConfig, name: &str) -> Result<()> {
    let store = build_store(&config)?;
    let registry = build_registry(&store)?;
    let routine = registry.get(name)?;
    let def = routine.definition();

    println!("Routine: {}", def.name);
    match &def.session_key {
        Some(key) => {
            println!("  Session key: {key}");
            println!("  Session TTL: {}s", def.session_ttl.as_secs());
        }
        None => println!("  Session key: (stateless)"),
    }
    if def.fork_session {
        println!(
            "  Forks from: {}",
            def.fork_from_key.as_deref().unwrap_or("(unset!)")
        );
    }
    let capabilities = routine.allowed_capabilities();
    println!(
        "  Allowed capabilities: {}",
        if capabilities.is_empty() {
            "(none)".to_string()
        } else {
            capabilities.join(", ")
        }
    );
    Ok(())
}

fn cmd_config(config: RoostConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| RoostError::Config(format!("failed to render config: {e}")))?;
        print!("{rendered}");
    }
    Ok(())
}

fn cmd_version() -> Result<()> {
    println!("roost v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
