use anyhow::{Context, anyhow};
use aws_config::BehaviorVersion;
use clap::Parser;
use lambda_runtime::{LambdaEvent, service_fn};
use s3_csv_loader::handler::{DbConfigBuilder, LoadResponse, Loader};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Loads CSV objects from S3 into MySQL tables named after the file
#[derive(Parser)]
struct Args {
    /// Database host
    #[arg(long, env = "DB_HOST")]
    db_host: String,

    /// Database port
    #[arg(long, env = "DB_PORT", default_value = "3306")]
    db_port: u16,

    /// Database username
    #[arg(long, env = "DB_USER", default_value = "admin")]
    db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    db_password: String,

    /// Database that receives the tables (created if missing)
    #[arg(long, env = "DB_NAME")]
    db_name: String,

    /// Seconds to wait for the database connection
    #[arg(long, env = "DB_CONNECT_TIMEOUT_SECS", default_value = "5")]
    connect_timeout_secs: u64,

    /// Seconds to wait for a concurrent load of the same table; 0 disables the lock
    #[arg(long, env = "TABLE_LOCK_TIMEOUT_SECS", default_value = "30")]
    table_lock_timeout_secs: u64,

    /// Handle the S3 event in this JSON file once and print the response,
    /// instead of serving Lambda invocations
    #[arg(long)]
    event: Option<PathBuf>,

    /// Quiet mode - only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing based on quiet mode; RUST_LOG takes precedence
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let default_filter = if args.quiet {
        "s3_csv_loader=warn,sqlx=warn"
    } else {
        "s3_csv_loader=info,sqlx=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let table_lock_timeout = match args.table_lock_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let db_config = DbConfigBuilder::default()
        .host(args.db_host)
        .port(args.db_port)
        .username(args.db_user)
        .password(args.db_password)
        .database(args.db_name)
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .table_lock_timeout(table_lock_timeout)
        .build()?;

    // Region and credentials come from the environment
    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let loader = Loader::from_aws_config(&aws_config, db_config);

    if let Some(event_path) = args.event {
        let raw = tokio::fs::read_to_string(&event_path)
            .await
            .with_context(|| format!("Failed to read event file {}", event_path.display()))?;
        let payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Event file {} is not JSON", event_path.display()))?;

        let response = loader.handle(payload).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let loader = &loader;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<LoadResponse, lambda_runtime::Error>(loader.handle(event.payload).await)
    }))
    .await
    .map_err(|err| anyhow!(err))
}
