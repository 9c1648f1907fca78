//! eventfeed CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, debug};

use eventfeed_client::cli::Cli;
use eventfeed_client::error::ClientResult;
use eventfeed_client::render::render_text;
use eventfeed_core::{TracingConfig, TracingOutputFormat, init_tracing};
use eventfeed_server::{EventFeed, FeedConfig, handle_events_request};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<ExitCode> {
    let config = cli.apply(FeedConfig::from_env());
    debug!(
        cache_dir = %config.cache_dir.display(),
        per_page = config.per_page,
        configured = config.planning_center.is_configured(),
        "loaded configuration"
    );
    let feed = EventFeed::from_config(config)?;

    if cli.json {
        let response = handle_events_request(&feed, cli.per_page, cli.details).await;
        println!("{}", serde_json::to_string_pretty(&response.body)?);
        return Ok(if response.is_success() {
            ExitCode::SUCCESS
        } else if response.is_temporarily_unavailable() {
            ExitCode::from(2)
        } else {
            ExitCode::FAILURE
        });
    }

    let events = feed.get_events(cli.per_page).await?;
    println!("{}", render_text(&events, &cli.format_options(), &cli.no_events_text));
    Ok(ExitCode::SUCCESS)
}
