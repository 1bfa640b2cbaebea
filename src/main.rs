use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod completion;
mod config;
mod error;
mod inventory;
mod models;
mod proxy;
mod ssh_config;
mod ssh_service;

use cli::Cli;
use config::{Action, ConfigManager, Settings};
use inventory::WalkMode;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is read by completion scripts.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("ssh_inventory={level}").parse()?),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let defaults = ConfigManager::new().load_config()?;
    let settings = Settings::resolve(cli, &defaults)?;
    debug!("Settings: {:?}", settings);

    run(&settings)
}

fn run(settings: &Settings) -> Result<()> {
    let client = settings.client.as_deref();

    match &settings.action {
        Action::Completion(kind) => {
            let inventory = inventory::walk(&settings.inventory, kind.walk_mode(client))?;
            println!("{}", completion::render(&inventory, *kind, client));
        }
        Action::SshString(host) => {
            let inventory = inventory::walk(&settings.inventory, walk_mode(client))?;
            if let Some(line) =
                ssh_service::ssh_string(&inventory, host, client, settings.quote_opts_quotes)
            {
                println!("{line}");
            }
        }
        Action::UpdateConfig => {
            let inventory = inventory::walk(&settings.inventory, walk_mode(client))?;
            ssh_config::write_client_configs(&inventory, &settings.config_dir)?;
            ssh_config::ensure_include(&settings.config_main, &settings.config_dir)?;
        }
    }

    Ok(())
}

fn walk_mode(client: Option<&str>) -> WalkMode<'_> {
    client.map_or(WalkMode::All, WalkMode::Client)
}
