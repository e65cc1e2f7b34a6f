use appdb::{Config, crypto::generate_encryption_key, telemetry};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = appdb::config::Args::parse();

    // Key generation needs no configuration
    if args.generate_key {
        println!("{}", generate_encryption_key());
        return Ok(());
    }

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Initialize telemetry (tracing + optional OpenTelemetry)
    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);

    let result = run(&config, args.encrypt_plaintext_credentials).await;

    telemetry::shutdown_telemetry();
    result
}

async fn run(config: &Config, encrypt_plaintext_credentials: bool) -> anyhow::Result<()> {
    let pool = appdb::setup_database(config).await?;

    if encrypt_plaintext_credentials {
        let cipher = config.cipher()?;
        let count = appdb::encrypt_plaintext_credentials(&pool, &cipher).await?;
        tracing::info!(count, "Plaintext credential import complete");
    }

    pool.close().await;
    tracing::info!("Database is up to date");
    Ok(())
}
