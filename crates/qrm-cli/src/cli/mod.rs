//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use qrm_core::config;
use qrm_core::logging::{self, LogTarget};

mod commands;

#[derive(Parser)]
#[command(name = "qrm")]
#[command(version)]
#[command(about = "QR Mini: sign in with an API key and browse your QR codes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Validate an API key, save the session and print your QR codes
    Login {
        /// The token from the website
        #[arg(value_name = "API_KEY", env = "QRM_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Print the QR codes of the saved session
    List {
        /// Print a table instead of the app view
        #[arg(long)]
        table: bool,
    },
    /// Inspect the saved session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Run the development proxy in front of the remote API
    Proxy {
        /// Address to listen on (overrides proxy.listen)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Upstream base URL (overrides proxy.target)
        #[arg(long, value_name = "URL")]
        target: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Show where the session is stored
    Path,
    /// Show the saved user id and a masked key
    Show,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // the interactive app owns the terminal, so it logs to a file
    let target = match cli.command {
        None => LogTarget::default_file(),
        Some(Commands::Proxy { .. }) => LogTarget::Stderr {
            default_filter: "info",
        },
        Some(_) => LogTarget::Stderr {
            default_filter: "warn",
        },
    };
    let _log_guard = logging::init(target).context("init logging")?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    // default to the interactive app
    let Some(command) = cli.command else {
        return commands::app::run(&config).await;
    };

    match command {
        Commands::Login { api_key } => commands::login::run(&config, &api_key).await,
        Commands::List { table } => commands::list::run(&config, table).await,
        Commands::Session { command } => match command {
            SessionCommands::Path => {
                commands::session::path(&config);
                Ok(())
            }
            SessionCommands::Show => commands::session::show(&config),
        },
        Commands::Proxy { listen, target } => {
            commands::proxy::run(&config, listen.as_deref(), target.as_deref()).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}
