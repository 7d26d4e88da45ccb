use clap::Parser;

use wingman::cli::Cli;
use wingman::core::style;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "wingman=debug" } else { "wingman=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        eprintln!("{}", style::error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}
