use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use rawdog::app::AppContext;
use rawdog::cli::{commands, Cli, Commands};

type LogLevel = reload::Handle<EnvFilter, Registry>;

/// Raise logging to `info` unless RUST_LOG says otherwise.
fn be_verbose(log_level: &LogLevel) -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        log_level.modify(|filter| *filter = EnvFilter::new("info"))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; quiet unless asked
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, log_level) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if cli.verbose {
        be_verbose(&log_level)?;
    }

    let dir = match cli.dir {
        Some(dir) => dir,
        None => AppContext::default_dir()?,
    };
    let mut ctx = AppContext::new(dir, &cli.configs)?;
    if ctx.config.verbose && !cli.verbose {
        be_verbose(&log_level)?;
    }

    ctx.startup()?;

    match &cli.command {
        Commands::Update { feed } => {
            commands::update(&mut ctx, feed.as_deref()).await?;
        }
        Commands::Write => {
            commands::write(&ctx)?;
        }
        Commands::Run => {
            commands::update(&mut ctx, None).await?;
            commands::write(&ctx)?;
        }
        Commands::List => {
            commands::list(&ctx)?;
        }
        Commands::ShowTemplate { item } => {
            commands::show_template(&ctx, *item)?;
        }
    }

    ctx.shutdown()?;
    if cli.command.mutates_state() {
        ctx.save()?;
    }

    Ok(())
}
