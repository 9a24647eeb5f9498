// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! plughost - discovers plugin modules in a directory and composes their services.
//!
//! This is the binary entry point for the plugin host.

mod inspect;
mod watch;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plughost_config::PluginHostConfig;

/// plughost - discovers plugin modules and composes their services.
#[derive(Parser, Debug)]
#[command(name = "plughost", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override `plugins.dir`.
    #[arg(long, global = true, value_name = "DIR")]
    plugin_dir: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build once and list loaded plugins and rejected modules.
    List,
    /// Build once and list every registered service key.
    Services,
    /// Rebuild whenever the plugin directory changes.
    Watch,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plughost_config::load_and_validate_path(path),
        None => plughost_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plughost_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &cli);

    init_tracing(&config.host.log_level);

    let use_color = !cli.plain && std::io::stdout().is_terminal();
    let result = match cli.command {
        Some(Commands::List) => inspect::run_list(&config, use_color),
        Some(Commands::Services) => inspect::run_services(&config),
        Some(Commands::Watch) => watch::run_watch(&config, use_color),
        None => {
            println!("plughost: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("plughost: {e}");
        std::process::exit(1);
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut PluginHostConfig, cli: &Cli) {
    if let Some(dir) = &cli.plugin_dir {
        config.plugins.dir = dir.clone();
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plughost={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
