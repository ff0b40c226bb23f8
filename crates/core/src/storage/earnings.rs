use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::earnings::EarningsPoint;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EarningsRow {
    pub id: i64,
    pub user_id: i32,
    pub date: NaiveDate,
    pub amount: f64,
}

/// All earnings for a user, oldest first.
pub async fn fetch_series(pool: &sqlx::PgPool, user_id: i32) -> anyhow::Result<Vec<EarningsPoint>> {
    let rows = sqlx::query_as::<_, (NaiveDate, f64)>(
        "SELECT date, amount::float8 FROM earnings WHERE user_id = $1 ORDER BY date",
    )
    .persistent(false)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select earnings failed (user_id={user_id})"))?;

    Ok(rows
        .into_iter()
        .map(|(date, amount)| EarningsPoint { date, amount })
        .collect())
}

/// Monthly amounts newest first, for dashboard aggregates.
pub async fn fetch_amounts_newest_first(
    pool: &sqlx::PgPool,
    user_id: i32,
) -> anyhow::Result<Vec<f64>> {
    sqlx::query_scalar::<_, f64>(
        "SELECT amount::float8 FROM earnings WHERE user_id = $1 ORDER BY date DESC",
    )
    .persistent(false)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select earnings amounts failed (user_id={user_id})"))
}

pub async fn insert(
    pool: &sqlx::PgPool,
    user_id: i32,
    date: NaiveDate,
    amount: f64,
) -> anyhow::Result<EarningsRow> {
    anyhow::ensure!(amount.is_finite(), "amount must be finite");

    sqlx::query_as::<_, EarningsRow>(
        "INSERT INTO earnings (user_id, date, amount) VALUES ($1, $2, $3::float8) \
         RETURNING id::int8 AS id, user_id, date, amount::float8 AS amount",
    )
    .persistent(false)
    .bind(user_id)
    .bind(date)
    .bind(amount)
    .fetch_one(pool)
    .await
    .context("insert earnings failed")
}
