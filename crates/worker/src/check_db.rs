use std::process::ExitCode;

use gigcoach_core::config::Settings;
use gigcoach_core::storage;

pub async fn run(settings: Result<&Settings, &anyhow::Error>) -> anyhow::Result<ExitCode> {
    let checked = match settings {
        Ok(settings) => connect_and_count(settings).await,
        Err(e) => Err(anyhow::anyhow!("invalid configuration: {e:#}")),
    };
    match checked {
        Ok(users) => {
            println!("Database connection successful!");
            println!("Found {users} users in the database");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, "database check failed");
            println!("Database connection failed: {err:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn connect_and_count(settings: &Settings) -> anyhow::Result<i64> {
    let pool = storage::connect(settings.require_database_url()?).await?;
    let users = storage::users::count_users(&pool).await?;
    pool.close().await;
    Ok(users)
}
