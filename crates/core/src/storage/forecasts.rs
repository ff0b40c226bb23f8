use anyhow::Context;

use crate::domain::earnings::Forecast;

// Only the columns every deployed schema carries.
const INSERT_FORECAST: &str = "INSERT INTO forecasts (user_id, forecast_date, predicted_amount) \
     VALUES ($1, $2, $3::int8) \
     RETURNING id::int8";

pub async fn insert(pool: &sqlx::PgPool, user_id: i32, forecast: &Forecast) -> anyhow::Result<i64> {
    sqlx::query_scalar::<_, i64>(INSERT_FORECAST)
        .persistent(false)
        .bind(user_id)
        .bind(forecast.forecast_date)
        .bind(forecast.predicted_amount)
        .fetch_one(pool)
        .await
        .with_context(|| format!("insert forecasts failed (user_id={user_id})"))
}

pub async fn latest_predicted_amount(
    pool: &sqlx::PgPool,
    user_id: i32,
) -> anyhow::Result<Option<f64>> {
    sqlx::query_scalar::<_, f64>(
        "SELECT predicted_amount::float8 FROM forecasts \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .persistent(false)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select latest forecast failed (user_id={user_id})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_MIGRATION: &str = include_str!("../../migrations/20250801000000_init.sql");

    fn table_definition<'a>(sql: &'a str, table: &str) -> &'a str {
        let start = sql
            .find(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
            .unwrap();
        let end = start + sql[start..].find(");").unwrap();
        &sql[start..end]
    }

    #[test]
    fn insert_columns_exist_in_forecasts_schema() {
        let def = table_definition(INIT_MIGRATION, "forecasts");
        let cols = INSERT_FORECAST
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(cols, _)| cols)
            .unwrap();
        for col in cols.split(',').map(str::trim) {
            assert!(def.contains(&format!("\n    {col} ")), "missing column {col}");
        }
    }

    #[test]
    fn forecasts_schema_has_no_extra_required_columns() {
        let def = table_definition(INIT_MIGRATION, "forecasts");
        assert!(!def.contains("method"));
    }
}
