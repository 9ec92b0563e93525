//! drouet
//!
//! Resolves a site's configuration from defaults, config files, the
//! environment and command-line flags, then builds the site once or keeps
//! rebuilding it in watch mode.

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use drouet::cli::{self, Cli, Command};
use drouet::config::{DeprecationChecker, FlagSet, ResolveInputs, SettingRegistry};
use drouet::error::ConfigError;
use drouet::logging::{self, DistinctLogger};
use drouet::report;
use drouet::site::LoggingBuilder;
use drouet::version::SiteVersion;
use drouet::watch::{self, DEFAULT_DEBOUNCE, ReloadCoordinator};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Exit status for errors the user can fix (bad config, bad flag value).
const USER_ERROR_EXIT: u8 = 255;

#[tokio::main]
async fn main() -> ExitCode {
    let command = Cli::command();
    let matches = match command.clone().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => e.exit(),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match logging::init(&cli.global.log_options()) {
        Ok(Some(path)) => debug!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    }

    let flag_sets = cli::flag_sets(&command, &matches);
    match run(cli, flag_sets).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

async fn run(cli: Cli, flag_sets: Vec<FlagSet>) -> Result<()> {
    let inputs = ResolveInputs::from_flags(flag_sets)?;
    let deprecations =
        DeprecationChecker::new(Arc::new(DistinctLogger::warn()), SiteVersion::CURRENT);
    let coordinator = Arc::new(ReloadCoordinator::new(
        SettingRegistry::standard(),
        inputs,
        Arc::new(LoggingBuilder),
        deprecations,
    ));

    let config = coordinator.resolve()?;
    debug!(
        "Resolved {} settings from {} config file(s)",
        config.all_settings().len(),
        config.config_files().len()
    );

    match cli.command {
        Some(Command::Config(_)) => {
            let verbose = config.get_bool("verbose").unwrap_or(false);
            let mut out = std::io::stdout().lock();
            report::print_settings(&config, verbose, &mut out)?;
            out.flush()?;
        }
        Some(Command::Server(args)) => {
            coordinator.build()?;
            if args.watch {
                watch_until_interrupted(coordinator).await?;
            }
        }
        None => {
            coordinator.build()?;
            if cli.watch {
                watch_until_interrupted(coordinator).await?;
            }
        }
    }
    Ok(())
}

async fn watch_until_interrupted(coordinator: Arc<ReloadCoordinator>) -> Result<()> {
    info!("Watching for changes. Press Ctrl+C to stop");
    watch::watch_until(coordinator, DEFAULT_DEBOUNCE, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl+C: {}", e);
        }
    })
    .await
}

/// Print `err` and pick the exit status: user errors get a usage hint.
fn report_error(err: &anyhow::Error) -> ExitCode {
    let config_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>());
    match config_error {
        Some(cause) if cause.is_user_error() => {
            eprintln!("Error: {}", cause);
            eprintln!("Run 'drouet help' for usage.");
            ExitCode::from(USER_ERROR_EXIT)
        }
        _ => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
