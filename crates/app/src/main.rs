use anyhow::Result;
use clap::Parser;
use panic_button_app::{app::PanicButtonApp, cli, config, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = cli::Cli::parse();
    let config = config::Config::load()?;

    logging::init_logging(&config.logging, args.verbose);
    info!("Starting panic button v{}", env!("CARGO_PKG_VERSION"));

    let app = PanicButtonApp::build(config).await?;
    if let Some(alert) = app.start().await {
        info!(alert_id = ?alert.id, "Resumed active alert");
    }

    let output = cli::execute(&app, args.command).await?;
    println!("{}", output);

    Ok(())
}
