#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;

use logsaw::app::config::{AwsConfiguration, Configuration, OutputConfiguration};
use logsaw::app::data_plane::cloudwatch_logs::{
    categorize_error, CloudWatchLogsClient, LogStreamSummary, LogsBackend, OrderBy, RetryPolicy,
};
use logsaw::app::tail::{
    build_filter_query, build_groups_query, build_streams_query, fetch_groups, fetch_streams,
    print_events, LiveTail,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("LOGSAW_GIT_COMMIT"),
    ")"
);

const DEFAULT_LOG_FILTER: &str = "logsaw=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,aws_smithy_http=warn,hyper=warn";

/// List, filter and tail AWS CloudWatch Logs
#[derive(Parser, Debug)]
#[command(name = "logsaw")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "List, filter and tail AWS CloudWatch Logs")]
pub struct Cli {
    /// AWS region (defaults to the SDK provider chain)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Shared config profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Override the CloudWatch Logs endpoint
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Retry throttled or failed requests up to N times instead of exiting
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List log groups
    Groups {
        /// Log group name prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// List streams in a log group
    Streams {
        /// Log group name
        group: String,

        /// Log stream name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Order streams by LogStreamName or LastEventTime
        #[arg(long, default_value = "LogStreamName")]
        order_by: OrderBy,

        /// Order streams descending
        #[arg(long)]
        descending: bool,
    },

    /// Continuously stream log events
    Watch {
        /// Log group name
        group: String,

        /// Log stream name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Event filter pattern
        #[arg(long)]
        filter: Option<String>,

        /// Where to start, e.g. -10m or 2024-03-10 (defaults to now)
        #[arg(long, default_value = "0s", allow_hyphen_values = true)]
        start: String,

        /// Print the message only, without timestamp, stream or colors
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Print log events in a time range
    Get {
        /// Log group name
        group: String,

        /// Log stream name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Event filter pattern
        #[arg(long)]
        filter: Option<String>,

        /// Start time, relative (-1h30m) or absolute (2024-03-10, RFC 3339)
        #[arg(long, allow_hyphen_values = true)]
        start: Option<String>,

        /// End time, relative or absolute
        #[arg(long, visible_alias = "stop", allow_hyphen_values = true)]
        end: Option<String>,

        /// Print timestamp and stream name with each message
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        format: FormatArgs,
    },
}

/// Message formatting shared by `watch` and `get`
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FormatArgs {
    /// Print each event as a JSON object (eventId, timestamp, message, ...)
    #[arg(long)]
    pub json: bool,

    /// Indent JSON messages
    #[arg(long)]
    pub expand: bool,

    /// Invert colors for light terminal themes
    #[arg(long)]
    pub invert: bool,

    /// Print JSON strings without escaping
    #[arg(long)]
    pub raw_string: bool,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Show timestamps in UTC instead of local time
    #[arg(long)]
    pub utc: bool,
}

impl FormatArgs {
    fn output(self, raw: bool, pretty: bool) -> OutputConfiguration {
        OutputConfiguration {
            raw,
            pretty,
            json: self.json,
            expand: self.expand,
            invert: self.invert,
            raw_string: self.raw_string,
            no_color: self.no_color,
            utc: self.utc,
        }
    }
}

impl Cli {
    fn aws_configuration(&self) -> AwsConfiguration {
        AwsConfiguration {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

fn init_logging() -> Result<Option<PathBuf>> {
    let Some(proj_dirs) = directories::ProjectDirs::from("com", "", "logsaw") else {
        return Ok(None);
    };

    let log_dir = proj_dirs.data_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_path = log_dir.join("logsaw.log");
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {:?}", log_path))?;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_env("LOGSAW_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::builder().parse(DEFAULT_LOG_FILTER))
        .context("Failed to parse log filter")?;

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false), // No ANSI colors in file
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(Some(log_path))
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "logsaw crashed!\nPanic occurred at: {}\nDetails: {}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
        );

        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "", "logsaw") {
            let crash_log_path = proj_dirs.data_dir().join("logs").join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
            }
        }

        eprintln!("\n{}", crash_msg);
    }));
}

/// Streams matching the configured prefix, used to scope `watch` and `get`
async fn resolve_streams<B>(
    backend: &B,
    config: &Configuration,
    retry: RetryPolicy,
) -> Result<Vec<LogStreamSummary>>
where
    B: LogsBackend + ?Sized,
{
    let Some(prefix) = config.prefix() else {
        return Ok(Vec::new());
    };

    let query = build_streams_query(&config.group, Some(prefix), OrderBy::LogStreamName, false);
    let streams = fetch_streams(backend, &query, retry).await?;

    if streams.is_empty() {
        eprintln!(
            "No streams found in {} with prefix {}, filtering on the prefix instead",
            config.group, prefix
        );
        logsaw::trace_warn!("No streams in {} match prefix {}", config.group, prefix);
    } else {
        logsaw::trace_info!(
            "Prefix {} matched {} streams in {}",
            prefix,
            streams.len(),
            config.group
        );
    }

    Ok(streams)
}

async fn run(cli: Cli) -> Result<()> {
    let retry = RetryPolicy::with_retries(cli.retries);
    let client = CloudWatchLogsClient::from_configuration(&cli.aws_configuration()).await;

    match cli.command {
        Command::Groups { prefix } => {
            let query = build_groups_query(prefix.as_deref());
            let groups = fetch_groups(&client, &query, retry).await?;

            let mut out = BufWriter::new(io::stdout().lock());
            for group in groups {
                writeln!(out, "{}", group.name)?;
            }
            out.flush()?;
        }

        Command::Streams {
            group,
            prefix,
            order_by,
            descending,
        } => {
            let config = Configuration {
                prefix,
                order_by,
                descending,
                ..Configuration::for_group(group)
            };
            let query = build_streams_query(
                &config.group,
                config.prefix(),
                config.order_by,
                config.descending,
            );
            let streams = fetch_streams(&client, &query, retry).await?;

            let mut out = BufWriter::new(io::stdout().lock());
            for stream in streams {
                writeln!(out, "{}", stream.name)?;
            }
            out.flush()?;
        }

        Command::Watch {
            group,
            prefix,
            filter,
            start,
            raw,
            format,
        } => {
            let config = Configuration {
                prefix,
                filter,
                start: Some(start),
                ..Configuration::for_group(group)
            };
            let output = format.output(raw, false);

            let known_streams = resolve_streams(&client, &config, retry).await?;
            let query = build_filter_query(&config, &known_streams, Utc::now());

            let tail = LiveTail::new(
                &client,
                query,
                output.formatter(),
                output.tail_mode(),
                BufWriter::new(io::stdout().lock()),
            )
            .with_retry(retry);

            match tail.run().await? {}
        }

        Command::Get {
            group,
            prefix,
            filter,
            start,
            end,
            pretty,
            format,
        } => {
            let config = Configuration {
                prefix,
                filter,
                start,
                end,
                ..Configuration::for_group(group)
            };
            let output = format.output(false, pretty);

            let known_streams = resolve_streams(&client, &config, retry).await?;
            let query = build_filter_query(&config, &known_streams, Utc::now());

            let mut out = BufWriter::new(io::stdout().lock());
            print_events(
                &client,
                &query,
                &output.formatter(),
                output.fetch_mode(),
                retry,
                &mut out,
            )
            .await?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    setup_panic_handler();

    let cli = Cli::parse();

    match init_logging() {
        Ok(Some(log_path)) => tracing::info!("Logging initialized to: {:?}", log_path),
        Ok(None) => {}
        Err(e) => eprintln!("Logging disabled: {:#}", e),
    }

    tracing::info!("logsaw {} starting: {:?}", LONG_VERSION, cli.command);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let category = categorize_error(&e, "request");
            logsaw::trace_error!("Exiting after {} error: {:?}", category.short_label(), e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
