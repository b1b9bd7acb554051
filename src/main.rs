use clap::{Parser, Subcommand};
use newsletter_generator::config::AppConfig;
use newsletter_generator::pipeline::run_once;
use newsletter_generator::server::serve;
use newsletter_generator::types::RunOutcome;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "newsletter-generator", about = "Daily niche newsletter generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and send today's newsletter once, then exit.
    Run,
    /// Start the HTTP trigger surface.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_result = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    match dotenv_result {
        Ok(path) => debug!("Loaded env from {}", path.display()),
        Err(err) => debug!("No .env loaded: {}", err),
    }

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Command::Run => match run_once(&config).await {
            Ok(RunOutcome::Completed { title, report }) => {
                info!(
                    "Newsletter \"{}\" delivered: {} sent, {} failed",
                    title, report.sent, report.failed
                );
            }
            Ok(RunOutcome::Skipped) => info!("Newsletter run skipped"),
            Err(err) => {
                error!("Newsletter run failed: {}", err);
                std::process::exit(1);
            }
        },
        Command::Serve => serve(config).await?,
    }

    Ok(())
}
