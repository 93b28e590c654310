use std::fs::File;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use waypoint::app::{App, Mode};
use waypoint::core::config::{self, CliOverrides, ResolvedConfig, WaypointConfig};
use waypoint::core::failure::Failure;
use waypoint::core::state::State;
use waypoint::features::auth::{self, AppSnapshot};
use waypoint::navigation::{Decision, NavigationError};
use waypoint::presentation::console::{describe, describe_decision, report};
use waypoint::presentation::map_failure;

#[derive(Parser)]
#[command(name = "waypoint", about = "Feature state containers with guarded navigation")]
struct Args {
    /// User API base URL (overrides config and WAYPOINT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level written to waypoint.log
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit one login per user in quick succession; only the last one counts
    Login {
        #[arg(required = true)]
        users: Vec<String>,

        /// Resolve this path once the login has settled
        #[arg(long)]
        then: Option<String>,

        /// Read users from the local cache instead of the API
        #[arg(long)]
        offline: bool,
    },
    /// Resolve a path against a signed-in or signed-out snapshot
    Resolve {
        path: String,

        #[arg(long)]
        authenticated: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let overrides = CliOverrides {
        base_url: args.base_url,
        log_level: args.log_level,
    };
    let loaded = config::load_config();
    let fallback = WaypointConfig::default();
    let resolved = config::resolve(loaded.as_ref().unwrap_or(&fallback), &overrides);

    // Initialize file logger - writes to waypoint.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = config::log_level_filter(&resolved.log_level);
    if let Ok(log_file) = File::create("waypoint.log") {
        let _ = WriteLogger::init(level.unwrap_or(LevelFilter::Debug), log_config, log_file);
    }
    if level.is_none() {
        log::warn!(
            "Unknown log level '{}', falling back to debug",
            resolved.log_level
        );
    }

    log::info!("Waypoint starting up");

    let outcome = match loaded {
        Ok(_) => run(args.command, resolved).await,
        Err(e) => Err(Failure::from(e)),
    };
    match outcome {
        Ok(code) => code,
        Err(failure) => {
            report(&failure);
            eprintln!("error: {}", map_failure(&failure).text);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, resolved: ResolvedConfig) -> Result<ExitCode, Failure> {
    match command {
        Command::Login {
            users,
            then,
            offline,
        } => {
            let mode = if offline { Mode::Offline } else { Mode::Online };
            let app = App::compose(resolved, mode)?;

            let mut states = app.auth.subscribe();
            for user in users {
                app.auth.dispatch(auth::login_submitted(user))?;
            }

            let settled = states.next_settled().await;
            let failed = matches!(settled, Some(State::Failure(_)));
            if let Some(state) = &settled {
                println!("{}", describe(state));
            }

            let code = match then {
                Some(path) => print_resolution(&path, app.resolve(&path)),
                None if failed => ExitCode::FAILURE,
                None => ExitCode::SUCCESS,
            };

            app.shutdown().await;
            Ok(code)
        }
        Command::Resolve {
            path,
            authenticated,
        } => {
            let app = App::compose(resolved, Mode::Offline)?;
            let snapshot = AppSnapshot {
                authenticated,
                user_id: authenticated.then(|| "cli".to_string()),
            };
            let code = print_resolution(&path, app.navigator.resolve(&path, &snapshot));
            app.shutdown().await;
            Ok(code)
        }
    }
}

fn print_resolution(path: &str, outcome: Result<Decision, NavigationError>) -> ExitCode {
    match outcome {
        Ok(decision) => {
            println!("{}", describe_decision(path, &decision));
            ExitCode::SUCCESS
        }
        Err(e) => {
            let failure = Failure::from(e);
            report(&failure);
            println!("{path}: {}", map_failure(&failure).text);
            ExitCode::FAILURE
        }
    }
}
