use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use omnibus_cfg::ConfigSet;
use omnibus_core::load::{self, Sources};
use tracing_subscriber::EnvFilter;

/// Inspect and validate the configuration of an omnibus build.
#[derive(Parser)]
#[command(name = "omnibus", version, about, long_about = None)]
struct Cli {
    /// TOML file of `setting = value` pairs, defaults to `omnibus.toml` if it exists.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override a setting, e.g. `--set use_s3_caching=true`. Can be repeated.
    #[arg(short, long = "set", value_name = "SETTING=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every setting, or the value of a single one.
    Show {
        /// Name of the setting to print.
        name: Option<String>,
    },
    /// Check that the configuration is consistent.
    Validate,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let sources = Sources::from_process(cli.config, cli.overrides);
    tracing::debug!(
        file = ?sources.file,
        overrides = sources.overrides.len(),
        "loading configuration"
    );
    let configs = load::load(&sources).context("loading configuration")?;

    match cli.command {
        Command::Show { name } => show(&configs, name.as_deref()),
        Command::Validate => {
            if let Err(err) = omnibus_core::validate(&configs) {
                tracing::error!(%err, "configuration is invalid");
                return Err(err.into());
            }
            println!("configuration is valid");
            Ok(())
        }
    }
}

fn show(configs: &ConfigSet, name: Option<&str>) -> anyhow::Result<()> {
    match name {
        Some(name) => println!("{}", configs.display_value(name)?),
        None => print!("{configs}"),
    }
    Ok(())
}
