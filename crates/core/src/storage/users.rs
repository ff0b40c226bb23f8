use anyhow::Context;

pub async fn find_user_id_by_phone(
    pool: &sqlx::PgPool,
    phone_number: &str,
) -> anyhow::Result<Option<i32>> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE phone_number = $1")
        .persistent(false)
        .bind(phone_number)
        .fetch_optional(pool)
        .await
        .context("select users by phone_number failed")
}

pub async fn count_users(pool: &sqlx::PgPool) -> anyhow::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .persistent(false)
        .fetch_one(pool)
        .await
        .context("count users failed")
}
