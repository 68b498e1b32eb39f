//! server-status - host health and token spend reports
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use chrono::Utc;
use clap::Parser;
use std::process::ExitCode;

use server_status::cli::args::{Commands, ReportArgs};
use server_status::cli::{Cli, OutputFormat};
use server_status::core::logging;
use server_status::render::RenderOptions;
use server_status::storage::ResolvedConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env);
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    // Until config is resolved, errors follow the CLI flags only.
    let mut error_format = if cli.json {
        OutputFormat::Json
    } else {
        cli.format.unwrap_or_default()
    };
    let mut error_pretty = cli.pretty;
    let mut error_color = server_status::util::env::should_use_color(cli.no_color);

    let result = match ResolvedConfig::resolve(&cli) {
        Ok(config) => {
            error_format = config.format;
            error_pretty = config.pretty;
            error_color = !config.no_color && error_color;
            run(cli, &config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            let error_output =
                server_status::render::error::render_error(&e, error_format, error_color, error_pretty);
            eprintln!("{error_output}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, config: &ResolvedConfig) -> server_status::Result<()> {
    let now = Utc::now();
    let options = RenderOptions {
        pretty: config.pretty,
        color: !config.no_color && server_status::util::env::should_use_color(config.no_color),
        verbose: config.verbose,
    };

    match cli.command {
        None if cli.now => {
            server_status::cli::report::execute(&ReportArgs::default(), config, options, now).await
        }
        None => {
            print_quickstart();
            Ok(())
        }
        Some(Commands::Report(args)) => {
            server_status::cli::report::execute(&args, config, options, now).await
        }
        Some(Commands::Trend(args)) => server_status::cli::trend::execute(&args, config, options, now),
        Some(Commands::Config(command)) => server_status::cli::config::execute(command, config, now),
    }
}

/// Print quickstart help when no command is given.
fn print_quickstart() {
    println!(
        r"server-status - host health and token spend reports

Samples RAM, swap, CPU, disk and temperature, checks the local model daemon
and document store, totals token spend from the usage ledger, and queues a
Dutch report for the notification channel.

USAGE:
    server-status [OPTIONS] [COMMAND]

COMMANDS:
    report          Build the report, print it and queue it
    trend           Token spend per day, week or month
    config          Show the configuration or its path

QUICK START:
    server-status --now                     # Report now (same as `report`)
    server-status report --no-deliver       # Print only, skip the outbox
    server-status report --month 2026-02    # Costs for another month
    server-status trend --bucket week --last 4
    server-status config path

MACHINE OUTPUT:
    server-status --now --json --pretty

For more help: server-status --help
"
    );
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
}
