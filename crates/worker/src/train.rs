use std::process::ExitCode;

use gigcoach_core::config::Settings;
use gigcoach_core::forecast::seasonal::SeasonalTrend;
use gigcoach_core::forecast::Forecaster;
use gigcoach_core::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Persist,
    DryRun,
}

impl RunMode {
    fn from_flag(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Persist
        }
    }

    /// Migrations, the user lock and the forecast insert are all skipped on a dry run.
    fn writes(self) -> bool {
        self == RunMode::Persist
    }
}

pub async fn run(settings: &Settings, user_id: i32, dry_run: bool) -> anyhow::Result<ExitCode> {
    let mode = RunMode::from_flag(dry_run);
    let pool = storage::connect(settings.require_database_url()?).await?;

    if !mode.writes() {
        let outcome = train_user(&pool, settings, user_id, mode).await;
        pool.close().await;
        return outcome.map(|()| ExitCode::SUCCESS);
    }

    storage::migrate(&pool).await?;

    let Some(lock) = storage::lock::try_acquire_user_lock(&pool, user_id).await? else {
        tracing::warn!(user_id, "user lock not acquired; another training run in progress");
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = train_user(&pool, settings, user_id, mode).await;

    if let Err(e) = lock.release().await {
        tracing::warn!(user_id, error = %e, "failed to release user lock");
    }
    pool.close().await;

    outcome.map(|()| ExitCode::SUCCESS)
}

async fn train_user(
    pool: &sqlx::PgPool,
    settings: &Settings,
    user_id: i32,
    mode: RunMode,
) -> anyhow::Result<()> {
    let series = storage::earnings::fetch_series(pool, user_id).await?;
    if series.is_empty() {
        tracing::info!(user_id, "no earnings data; skipping forecast");
        println!("No data found for user_id {user_id}");
        return Ok(());
    }

    let model = SeasonalTrend::from_settings(settings);
    let forecast = model.forecast(&series)?;

    tracing::info!(
        user_id,
        points = series.len(),
        forecast_date = %forecast.forecast_date,
        predicted_amount = forecast.predicted_amount,
        method = forecast.method.as_str(),
        dry_run = !mode.writes(),
        "forecast generated"
    );

    if !mode.writes() {
        println!(
            "Dry run: forecast for user {user_id} on {} would be ₹{}",
            forecast.forecast_date, forecast.predicted_amount
        );
        return Ok(());
    }

    let forecast_id = storage::forecasts::insert(pool, user_id, &forecast).await?;
    tracing::info!(user_id, forecast_id, "persisted forecast");

    println!(
        "Successfully generated forecast for user {user_id}: ₹{}",
        forecast.predicted_amount
    );
    Ok(())
}
