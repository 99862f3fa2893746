//! `mention-bot` executable: parses flags, installs tracing and runs the bot.

use std::path::PathBuf;

use clap::Parser;
use mention_bot::base::{config::Config, types::Void};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Name reported to the trace collector.
const SERVICE_NAME: &str = "mention-bot";

/// Keeps Yammer mention groups and answers directed messages.
///
/// Settings are read from `MENTION_BOT_*` environment variables and a TOML file.
/// Credentials missing there are taken from the store document (`cache.json` by
/// default), which also holds the groups.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML settings file; `.hidden/config.toml` is used when present and this is omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log more: `-v` for debug output, `-vv` for trace output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the console log layer and the OTLP span exporter.
fn init_tracing(level: LevelFilter) -> Void {
    let console = tracing_subscriber::fmt::layer().with_file(true).with_line_number(true).with_target(false).with_span_events(FmtSpan::CLOSE);

    let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build();
    let spans = tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME));

    tracing_subscriber::registry().with(spans).with(level).with(console).init();

    Ok(())
}

#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    init_tracing(args.level())?;

    let config = Config::load(args.config.as_deref())?;

    mention_bot::start(config).await
}
