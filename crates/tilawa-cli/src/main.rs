//! CLI entry point - the composition root.
//!
//! Settings are resolved and validated before anything is wired, so a bad
//! configuration fails fast with a configuration exit code.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tilawa_cli::handlers::play::PlayArgs;
use tilawa_cli::{Cli, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads TILAWA_* values
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings()?;
    let ctx = bootstrap(settings);

    match cli.command {
        Commands::Probe => handlers::probe::execute(&ctx).await,
        Commands::Tracks { reciter } => handlers::tracks::execute(&ctx, reciter).await,
        Commands::Play {
            reciter,
            from,
            count,
            track_secs,
        } => {
            let args = PlayArgs {
                reciter,
                from,
                count,
                track_secs,
            };
            handlers::play::execute(&ctx, args).await
        }
        Commands::Speak {
            text,
            language,
            out,
        } => handlers::speak::execute(&ctx, &text, &language, &out).await,
    }
}
