use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use tracing::{debug, info};
use weather_pipeline::{
    BatchMetadata, BronzeStore, Config, Location, SilverPipeline, ingest_locations,
    provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-pipeline", version, about = "OpenWeather Bronze/Silver pipeline")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather API key and add locations interactively.
    Configure,

    /// Fetch current weather for every configured location into bronze storage.
    Ingest,

    /// Transform bronze snapshots into one Silver CSV.
    Transform {
        /// Bronze directory; defaults to `storage.bronze_path`.
        #[arg(long)]
        bronze: Option<PathBuf>,

        /// Output directory; defaults to `storage.silver_path`.
        #[arg(long)]
        silver: Option<PathBuf>,
    },

    /// Ingest, then transform.
    Run,
}

impl Cli {
    pub fn init_logging(&self) {
        use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

        let level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!(
                "weather_pipeline={level},weather_pipeline_cli={level}"
            )));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();

        debug!("Logging initialized at level: {level}");
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;
        config.apply_env();

        match self.command {
            Command::Configure => configure(config, self.config)?,
            Command::Ingest => ingest(&config).await?,
            Command::Transform { bronze, silver } => {
                let bronze = bronze.unwrap_or_else(|| config.storage.bronze_path.clone());
                let silver = silver.unwrap_or_else(|| config.storage.silver_path.clone());
                transform(bronze, silver)?;
            }
            Command::Run => {
                ingest(&config).await?;
                transform(
                    config.storage.bronze_path.clone(),
                    config.storage.silver_path.clone(),
                )?;
            }
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) if !path.exists() && matches!(self.command, Command::Configure) => {
                Ok(Config::default())
            }
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::config_file_path()?,
    };

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    loop {
        let add = Confirm::new("Add a location?")
            .with_default(config.locations.is_empty())
            .prompt()
            .context("Failed to read answer")?;
        if !add {
            break;
        }

        let city = Text::new("City:").prompt().context("Failed to read city")?;
        let country = Text::new("Country code (ISO 3166):")
            .prompt()
            .context("Failed to read country code")?;

        let location = Location::new(city.trim(), country.trim());
        if !config.add_location(location.clone()) {
            println!("{location} is already configured.");
        }
    }

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn ingest(config: &Config) -> anyhow::Result<()> {
    if config.locations.is_empty() {
        anyhow::bail!(
            "No locations configured.\n\
             Hint: run `weather-pipeline configure` and add at least one location."
        );
    }

    let provider = provider_from_config(config)?;
    let store = BronzeStore::new(&config.storage.bronze_path);

    let report = ingest_locations(
        provider.as_ref(),
        &config.locations,
        &store,
        config.retry_policy(),
    )
    .await;

    println!(
        "Ingestion: {} successful, {} failed",
        report.successful, report.failed
    );
    Ok(())
}

fn transform(bronze: PathBuf, silver: PathBuf) -> anyhow::Result<()> {
    info!("Starting Silver layer transformation");

    let pipeline = SilverPipeline::new()?;
    let summary = pipeline.run(&bronze, &silver, &BatchMetadata::new(Utc::now()))?;

    for err in &summary.errors {
        println!("  skipped {}: {}", err.path.display(), err.message);
    }
    match &summary.output {
        Some(path) => println!(
            "Transformation: {} successful, {} failed -> {}",
            summary.successful,
            summary.failed,
            path.display()
        ),
        None => println!(
            "Transformation: {} successful, {} failed (nothing written)",
            summary.successful, summary.failed
        ),
    }
    Ok(())
}
