use anyhow::Context;
use clap::Parser;
use hosting_inventory::config::LogFormat;
use hosting_inventory::utils::logger;
use hosting_inventory::{
    emit, ApiFetcher, CliConfig, InventoryBuilder, InventoryConfig, Output, OutputMode,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_format == LogFormat::Json);

    let mode = cli.mode();
    tracing::debug!("Output mode: {:?}", mode);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &mode {
        OutputMode::List => {
            let config =
                InventoryConfig::resolve(&cli).context("invalid inventory configuration")?;
            tracing::debug!(
                "Using API {} (key {}), static source {}",
                config.base_url,
                if config.api_key.is_empty() { "unset" } else { "set" },
                config.static_path.display()
            );

            let fetcher = ApiFetcher::new(&config).context("failed to create HTTP client")?;
            let inventory = InventoryBuilder::from_config(fetcher, &config)
                .build()
                .await
                .context("failed to build inventory")?;

            emit(&mut out, Output::List(&inventory)).context("failed to write inventory")?;
        }
        OutputMode::Host(hostname) => {
            emit(&mut out, Output::Host(hostname.as_deref()))
                .context("failed to write host variables")?;
        }
    }

    Ok(())
}
