//! CLI entry point for the GTFS-RT vehicle-position poller.
//!
//! `poll` runs one authenticated poll and archives the CSV block; an external
//! scheduler is expected to invoke it. `convert` runs the same decode and
//! formatting pipeline over a local file or public URL.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gtfs_rt_poller::{
    config::PollConfig,
    fetch::{BasicClient, DEFAULT_HEADER, fetch_bytes},
    fields::FieldSpec,
    infra::keys::{KeyStore, SsmKeyStore, StaticKeyStore},
    infra::storage::{LocalDirSink, ObjectSink, S3Sink},
    output::write_records,
    parser::parse_feed,
    poll::Poller,
};
use reqwest::Url;
use tokio::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_poller")]
#[command(about = "Archive GTFS-RT vehicle positions as CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one poll: fetch the feed with its API key and store the CSV block
    Poll(PollArgs),
    /// Convert a GTFS-RT feed from a file or URL to CSV
    Convert {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to write (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated subset of fields, in output order
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// List the fields extracted from each vehicle position
    ListFields,
}

#[derive(Args)]
struct PollArgs {
    /// Vehicle-position feed URL
    #[arg(long, env = "GTFS_VEHICLE_POSITION_URL")]
    feed_url: Url,

    /// SSM parameter name or ARN holding the feed API key
    #[arg(long, env = "API_KEY_PARAMETER_ARN", required_unless_present = "api_key")]
    api_key_parameter: Option<String>,

    /// Use this API key directly instead of reading it from SSM
    #[arg(long, env = "GTFS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Header the API key is sent in
    #[arg(long, env = "API_KEY_HEADER", default_value = DEFAULT_HEADER)]
    api_key_header: String,

    /// S3 bucket to store the CSV in (e.g., "my-bucket")
    #[arg(
        long,
        env = "OUTPUT_BUCKET_NAME",
        required_unless_present = "output_dir",
        conflicts_with = "output_dir"
    )]
    bucket: Option<String>,

    /// Local directory to store the CSV in instead of S3
    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Prefix prepended to every object key (e.g., "vehicle-positions/")
    #[arg(long, env = "OUTPUT_KEY_PREFIX", default_value = "")]
    key_prefix: String,

    /// Gzip the CSV before storing it
    #[arg(long, env = "OUTPUT_GZIP")]
    gzip: bool,

    /// Comma-separated subset of fields, in output order
    #[arg(long, env = "FEED_FIELDS", value_delimiter = ',')]
    fields: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr, plus a JSON rolling log file when LOG_FILE_PATH is set
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let mut _file_guard = None;
    let json_layer = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("gtfs_rt_poller.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            _file_guard = Some(guard);

            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(non_blocking_file)
                    .with_filter(
                        EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?),
                    ),
            )
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poll(args) => poll(args).await?,
        Commands::Convert {
            source,
            output,
            fields,
        } => {
            let spec = field_spec(&fields)?;
            let bytes = fetcher(&source).await?;
            let feed = parse_feed(&bytes)?;
            info!(
                feed_timestamp = feed.header.timestamp,
                entities = feed.entity.len(),
                "GTFS message decoded"
            );

            let records = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_records(BufWriter::new(file), &spec, &feed.entity)?
                }
                None => write_records(io::stdout().lock(), &spec, &feed.entity)?,
            };
            info!(records, "Conversion complete");
        }
        Commands::ListFields => {
            for (position, name) in FieldSpec::vehicle_positions().names().enumerate() {
                info!(position, name, "Field");
            }
        }
    }

    Ok(())
}

/// Builds the collaborators once and runs a single poll, printing the outcome
/// as JSON on stdout.
async fn poll(args: PollArgs) -> Result<()> {
    let aws = OnceCell::new();

    let keys: Box<dyn KeyStore> = match &args.api_key {
        Some(key) => Box::new(StaticKeyStore::new(key.clone())),
        None => Box::new(SsmKeyStore::new(
            aws.get_or_init(aws_config::load_from_env).await,
        )),
    };

    let sink: Box<dyn ObjectSink> = match (&args.bucket, &args.output_dir) {
        (Some(bucket), _) => {
            info!(bucket = %bucket, gzip = args.gzip, "S3 upload enabled");
            Box::new(S3Sink::new(
                aws.get_or_init(aws_config::load_from_env).await,
                bucket.clone(),
            ))
        }
        (None, Some(dir)) => {
            info!(dir = %dir.display(), gzip = args.gzip, "Local output enabled");
            Box::new(LocalDirSink::new(dir.clone()))
        }
        (None, None) => anyhow::bail!("either --bucket or --output-dir must be given"),
    };

    let config = PollConfig::new(
        args.feed_url,
        args.api_key_parameter.unwrap_or_default(),
    )
    .with_api_key_header(args.api_key_header)
    .with_key_prefix(args.key_prefix)
    .with_gzip(args.gzip)
    .with_fields(field_spec(&args.fields)?);

    let poller = Poller::new(keys, BasicClient::new(), sink, config);
    let outcome = poller.run_once().await?;
    info!(
        record_count = outcome.record_count,
        message = %outcome.message,
        "Poll finished"
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &outcome)?;
    writeln!(stdout)?;
    Ok(())
}

/// The full schema, or the named subset when any names are given.
fn field_spec(names: &[String]) -> Result<FieldSpec> {
    if names.is_empty() {
        Ok(FieldSpec::vehicle_positions())
    } else {
        Ok(FieldSpec::select(names)?)
    }
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(url), fields(source = %url))]
async fn fetcher(url: &str) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, url).await?
    } else {
        std::fs::read(url).with_context(|| format!("failed to read {url}"))?
    };
    Ok(bytes)
}
