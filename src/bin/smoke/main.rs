use anyhow::{Context, Result};
use clap::Parser;
use object_store_smoke::{
    AppBuilder, AppConfig, BucketName, ConfigOverrides, ConfigResolver, ConnectionDefaults,
    StepOutcome,
};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "object-store-smoke")]
#[command(about = "Create, upload, download, list and delete against an S3-compatible store", long_about = None)]
struct Cli {
    /// Endpoint URL (falls back to S3_ENDPOINT, then http://localhost:8333)
    #[arg(long)]
    endpoint: Option<String>,

    /// Region (falls back to S3_REGION, then us-east-1)
    #[arg(long)]
    region: Option<String>,

    /// Bucket name (falls back to S3_BUCKET, then email-attachments)
    #[arg(short, long)]
    bucket: Option<String>,

    /// Access key (falls back to S3_ACCESS_KEY)
    #[arg(long)]
    access_key: Option<String>,

    /// Secret key (falls back to S3_SECRET_KEY)
    #[arg(long)]
    secret_key: Option<String>,

    /// Put the bucket in the URL path rather than the host name
    #[arg(long, value_name = "BOOL")]
    path_style: Option<bool>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause between bucket creation and the first upload
    #[arg(long, default_value = "1000")]
    settle_delay_ms: u64,

    /// Leading path segment of the generated object key
    #[arg(long, default_value = "test")]
    key_prefix: String,

    /// Run against a process-local store instead of a server
    #[arg(long)]
    in_memory: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            path_style: self.path_style,
            timeout_secs: self.timeout_secs,
        }
    }

    fn app_builder(&self) -> Result<AppBuilder> {
        if self.in_memory {
            let bucket = self
                .bucket
                .clone()
                .unwrap_or_else(|| ConnectionDefaults::default().bucket);
            let bucket = BucketName::new(bucket).context("Invalid bucket name")?;
            return Ok(AppBuilder::new(AppConfig::in_memory(bucket)));
        }

        AppBuilder::from_resolver(&ConfigResolver::from_env(self.overrides()))
            .context("Failed to resolve S3 connection settings")
    }

    fn init_logging(&self) {
        let env_filter =
            EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging();

    let builder = cli
        .app_builder()?
        .with_settle_delay(Duration::from_millis(cli.settle_delay_ms))
        .with_key_prefix(cli.key_prefix.clone());

    match &builder.config().storage_backend {
        object_store_smoke::StorageBackend::S3(connection) => info!(
            endpoint = connection.endpoint(),
            region = connection.region(),
            bucket = %connection.bucket(),
            path_style = connection.path_style(),
            "Starting object store smoke test"
        ),
        object_store_smoke::StorageBackend::InMemory => info!(
            bucket = %builder.config().bucket,
            "Starting object store smoke test against in-memory store"
        ),
    }

    let app = builder.build().context("Failed to build application")?;
    let report = app.runner.run().await;

    for step in &report.steps {
        match step.outcome {
            StepOutcome::Passed { .. } => info!("{}", step),
            StepOutcome::Warned { .. } => warn!("{}", step),
            StepOutcome::Failed { .. } => error!("{}", step),
        }
    }

    report.into_result().context("Smoke test failed")?;
    info!("All tests passed");

    Ok(())
}
