/// Version injected at compile time via TCDB_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TCDB_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tcdb_provider::cloud::auth::list_regions;
use tcdb_provider::cloud::http::format_api_error;
use tcdb_provider::config::Config;
use tcdb_provider::data_source::{SecurityGroups, SecurityGroupsQuery};
use tcdb_provider::resource::{get_handler, schemas, StateDocument};
use tcdb_provider::{Provider, ProviderError};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative provider for Tencent Cloud DCDB
#[derive(Parser, Debug)]
#[command(name = "tcdb", version = VERSION, about, long_about = None)]
struct Args {
    /// Region to use, e.g. ap-guangzhou
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Send all API calls to this base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema of one resource type, or of all of them
    Schema {
        #[arg(value_name = "TYPE")]
        type_name: Option<String>,
    },
    /// Show what apply would do
    Plan {
        /// Resource type, e.g. tencentcloud_dcdb_account
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Desired configuration (YAML or JSON)
        #[arg(short, long)]
        desired: PathBuf,
        /// Current state file
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
    /// Converge the resource towards the desired configuration
    Apply {
        #[arg(short = 't', long = "type")]
        type_name: String,
        #[arg(short, long)]
        desired: PathBuf,
        /// State file, read if present and rewritten afterwards
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Refresh a state file from the vendor
    Read {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Build a state file from an existing resource id
    Import {
        #[arg(short = 't', long = "type")]
        type_name: String,
        #[arg(long)]
        id: String,
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Delete the resource recorded in a state file
    Delete {
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Query security groups
    SecurityGroups {
        #[arg(long, conflicts_with_all = ["name", "project_id"])]
        security_group_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        project_id: Option<i64>,
        /// Also write the results to this file
        #[arg(long)]
        result_output_file: Option<String>,
    },
    /// List well-known regions
    Regions,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(tracing_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tcdb {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tcdb").join("tcdb.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tcdb").join("tcdb.log");
    }
    PathBuf::from("tcdb.log")
}

/// Resolve configuration: file, then environment, then flags
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            config
        }
        None => Config::load()?,
    };

    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    Ok(config)
}

fn read_desired(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    // YAML is a superset of JSON, so one parser covers both
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_state(path: &Path) -> Result<Option<StateDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {}", path.display()))?;
    let doc: StateDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state {}", path.display()))?;
    Ok(Some(doc).filter(|d| !d.id.is_empty()))
}

fn require_state(path: &Path) -> Result<StateDocument> {
    read_state(path)?.with_context(|| format!("No resource recorded in {}", path.display()))
}

fn write_state(path: &Path, doc: &StateDocument) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write state {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level)?;

    if let Err(err) = run(&args).await {
        tracing::error!("{:#}", err);
        match err.downcast_ref::<ProviderError>() {
            Some(provider_err) => eprintln!("Error: {}", format_api_error(provider_err)),
            None => eprintln!("Error: {:#}", err),
        }
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Schema { type_name } => match type_name {
            Some(name) if name == tcdb_provider::data_source::security_groups::TYPE_NAME => {
                print_json(SecurityGroups.schema())
            }
            Some(name) => {
                let handler = get_handler(name).ok_or_else(|| ProviderError::UnknownType(name.clone()))?;
                print_json(handler.schema())
            }
            None => print_json(&schemas()),
        },
        Command::Regions => {
            for region in list_regions() {
                println!("{}", region);
            }
            Ok(())
        }
        Command::Plan {
            type_name,
            desired,
            state,
        } => {
            let handler = get_handler(type_name).ok_or_else(|| ProviderError::UnknownType(type_name.clone()))?;
            let desired = read_desired(desired)?;
            let prior = match state {
                Some(path) => read_state(path)?,
                None => None,
            };
            print_json(&handler.plan(prior.as_ref(), &desired)?)
        }
        command => {
            let config = load_config(args)?;
            let provider = Provider::from_config(&config).context("Failed to configure provider")?;
            run_remote(&provider, command).await
        }
    }
}

/// Commands that talk to the vendor
async fn run_remote(provider: &Provider, command: &Command) -> Result<()> {
    match command {
        Command::Apply {
            type_name,
            desired,
            state,
        } => {
            let handler = provider.resource(type_name)?;
            let desired = read_desired(desired)?;
            let prior = read_state(state)?;
            let had_prior = prior.is_some();
            let mut doc = prior.unwrap_or_else(|| StateDocument::absent(type_name));

            let result = handler.apply(provider, &mut doc, &desired).await;
            // A failed apply may still have deleted or recreated the resource
            if result.is_ok() || had_prior {
                write_state(state, &doc)?;
            }
            result?;
            print_json(&doc)
        }
        Command::Read { state } => {
            let mut doc = require_state(state)?;
            let handler = provider.resource(&doc.type_name)?;
            let result = handler.read(provider, &mut doc).await;
            write_state(state, &doc)?;
            result?;
            print_json(&doc)
        }
        Command::Import { type_name, id, state } => {
            let handler = provider.resource(type_name)?;
            let doc = handler.import(provider, id).await?;
            write_state(state, &doc)?;
            print_json(&doc)
        }
        Command::Delete { state } => {
            let mut doc = require_state(state)?;
            let handler = provider.resource(&doc.type_name)?;
            handler.delete(provider, &mut doc).await?;
            write_state(state, &doc)?;
            println!("deleted {}", doc.type_name);
            Ok(())
        }
        Command::SecurityGroups {
            security_group_id,
            name,
            project_id,
            result_output_file,
        } => {
            let query = SecurityGroupsQuery {
                security_group_id: security_group_id.clone(),
                name: name.clone(),
                project_id: *project_id,
                result_output_file: result_output_file.clone(),
            };
            print_json(&SecurityGroups.read(provider, &query).await?)
        }
        Command::Schema { .. } | Command::Plan { .. } | Command::Regions => {
            bail!("command does not need the vendor API")
        }
    }
}
