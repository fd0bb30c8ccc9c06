#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod follow;

use std::io::IsTerminal;

use clap::Parser;
use eyre::WrapErr;
use linetrace_config::{Config, Logging};
use linetrace_core::Shutdown;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    let loaded = load_config(&cli);
    let logging = loaded.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    init_tracing(cli.json, cli.log_level.as_deref(), &logging);

    let result = loaded.and_then(|cfg| dispatch(&cli, &cfg));
    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn load_config(cli: &Cli) -> eyre::Result<Config> {
    match cli.config.as_deref() {
        Some(path) => linetrace_config::load_file(path).map_err(follow::config_error),
        None => Ok(Config::default()),
    }
}

fn dispatch(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Run(args) => {
            let shutdown = Shutdown::new();
            let handle = shutdown.handle();
            ctrlc::set_handler(move || handle.trigger()).wrap_err("install Ctrl-C handler")?;

            let summary = follow::run_follow(cfg, args, &shutdown)?;
            if cli.json {
                println!("{}", follow::summary_json(&summary, cfg, args));
            } else {
                println!("{}", follow::summary_text(&summary));
            }
            Ok(())
        }
        Commands::SelfCheck => {
            let msg = follow::self_check(cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "self_check": "ok", "message": msg }));
            } else {
                println!("{msg}");
            }
            Ok(())
        }
    }
}

/// Console layer on stderr (pretty or JSON), plus an optional JSON file layer.
/// Precedence for the level: `RUST_LOG`, then `--log-level`, then `logging.level`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &Logging) {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(path) = logging.file.as_deref() {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let prefix = path
            .file_name()
            .map_or_else(|| "linetrace.log".into(), |n| n.to_string_lossy().into_owned());
        let rotation = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::Rotation::DAILY,
            Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
            _ => tracing_appender::rolling::Rotation::NEVER,
        };
        match tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(prefix)
            .build(dir)
        {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(writer)
                        .boxed(),
                );
            }
            Err(e) => eprintln!("warning: log file {} disabled: {e}", path.display()),
        }
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}
