use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check_db;
mod predict;
mod train;

#[derive(Debug, Parser)]
#[command(name = "gigcoach_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit the forecasting model on a user's earnings and store the next-month forecast.
    Train {
        user_id: i32,

        /// Fit and report, but do not write the forecast.
        #[arg(long)]
        dry_run: bool,
    },

    /// Read earnings records as JSON on stdin and print a prediction as JSON on stdout.
    Predict {
        #[arg(long, value_enum, default_value_t = ModelArg::Average)]
        model: ModelArg,
    },

    /// Connect to the database and count users.
    CheckDb,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Average,
    Seasonal,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // A bad environment is reported by each command in its own framing.
    let settings = gigcoach_core::config::Settings::from_env();
    let _sentry_guard = settings.as_ref().ok().and_then(init_sentry);

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Train { user_id, dry_run } => match &settings {
            Ok(settings) => train::run(settings, user_id, dry_run).await,
            Err(e) => Err(anyhow::anyhow!("invalid configuration: {e:#}")),
        },
        Command::Predict { model } => predict::run(model, settings.as_ref()),
        Command::CheckDb => check_db::run(settings.as_ref()).await,
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

fn init_sentry(settings: &gigcoach_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
