use anyhow::Result;
use clap::{Parser, Subcommand};

use tagview::config::{self, TagviewConfig, Variant};
use tagview::{cli, logging};

#[derive(Debug, Parser)]
#[command(name = "tagview")]
#[command(about = "Live dashboard for an AprilTag pose detection backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll the backend and serve the live dashboard page
    Serve {
        /// Listen address (default: 127.0.0.1:8080)
        #[arg(long)]
        addr: Option<String>,
        /// Backend base URL, e.g. http://raspberrypi.local:5000
        #[arg(long)]
        backend: Option<String>,
        /// Page variant: full (default) or simple
        #[arg(long)]
        variant: Option<Variant>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Poll the backend and redraw the dashboard in the terminal
    Watch {
        /// Backend base URL
        #[arg(long)]
        backend: Option<String>,
        /// Page variant: full (default) or simple
        #[arg(long)]
        variant: Option<Variant>,
    },
    /// Fetch /stats once and print it
    Once {
        /// Backend base URL
        #[arg(long)]
        backend: Option<String>,
        /// Output format: table (default), json, html
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config, backend /stats and the video stream
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration and its sources
    Show,
    /// Write the default config to ~/.tagview/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `poller.interval_ms 500`
    Set { key: String, value: String },
    /// Reset ~/.tagview/config.toml to defaults
    Reset,
}

/// Command-line flags are the last config layer.
fn apply_flags(
    config: &mut TagviewConfig,
    addr: Option<String>,
    backend: Option<String>,
    variant: Option<Variant>,
) {
    if let Some(addr) = addr {
        config.web.addr = addr;
    }
    if let Some(backend) = backend {
        config.backend.url = backend;
    }
    if let Some(variant) = variant {
        config.general.variant = variant;
    }
}

fn main() -> Result<()> {
    let app = App::parse();
    let mut config = config::load();

    match app.command {
        Commands::Serve {
            addr,
            backend,
            variant,
            open,
        } => {
            apply_flags(&mut config, addr, backend, variant);
            logging::init(&config.logging);
            cli::run_serve(&config, open)
        }
        Commands::Watch { backend, variant } => {
            apply_flags(&mut config, None, backend, variant);
            logging::init(&config.logging);
            cli::run_watch(&config)
        }
        Commands::Once { backend, format } => {
            apply_flags(&mut config, None, backend, None);
            logging::init(&config.logging);
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_once(&config, fmt)
        }
        Commands::Health => cli::run_health(&config),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
