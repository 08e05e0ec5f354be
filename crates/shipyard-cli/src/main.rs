use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "shipyard",
    about = "Shipyard — rolling deployments onto a load-balanced fleet",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a revision of an application with a rolling update.
    ///
    /// Reads the fleet backend from the contexts file ($SHIPYARD_PROFILE
    /// selects the profile, default: "default"). Old instances are retired
    /// one by one as new ones become healthy; any failure restores the
    /// fleet to what it was before the run.
    Deploy(commands::deploy::DeployArgs),
    /// Manage fleet backend contexts
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },
}

#[derive(Subcommand)]
enum ContextAction {
    /// Add or update a profile in the contexts file
    Init {
        /// Profile name
        #[arg(short, long, default_value = shipyard_config::DEFAULT_PROFILE)]
        name: String,
        /// Base url of the fleet backend
        #[arg(long)]
        url: String,
        /// Credential sent as the Authorization header
        #[arg(long)]
        username: String,
        /// Contexts file (default: $HOME/.shipyard/contexts.toml)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Replace an existing profile with the same name
        #[arg(long)]
        force: bool,
    },
    /// List profiles in the contexts file
    List {
        /// Contexts file (default: ./contexts.toml, then $HOME/.shipyard/contexts.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,shipyard=debug"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Deploy(args) => commands::deploy::run(args).await,
        Commands::Context { action } => match action {
            ContextAction::Init {
                name,
                url,
                username,
                path,
                force,
            } => commands::context::init(&name, &url, &username, path.as_deref(), force),
            ContextAction::List { path } => commands::context::list(path.as_deref()),
        },
    }
}
