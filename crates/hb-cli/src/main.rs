use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hb_cli::commands::{diaper, export, feed, types, util};
use hb_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so report and CSV output stay clean on stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let input = util::resolve_input(cli.input.as_deref(), &config)?;
    let tables = util::load_log(&input)?;
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Types { json } => types::run(&mut stdout, &tables, *json)?,
        Commands::Diaper { json, domain } => {
            diaper::run(&mut stdout, &tables, &config, domain.map(Into::into), *json)?;
        }
        Commands::Feed { json } => feed::run(&mut stdout, &tables, &config, *json)?,
        Commands::Export { kind, output } => match output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                export::run(BufWriter::new(file), &tables, &config, *kind)?;
                tracing::info!(path = %path.display(), "export written");
            }
            None => export::run(&mut stdout, &tables, &config, *kind)?,
        },
    }

    Ok(())
}
