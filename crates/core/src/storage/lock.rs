use anyhow::Context;

// Advisory locks are scoped to the Postgres session. Used to keep two training runs for the
// same user from writing forecasts at the same time.
const LOCK_NAMESPACE: i64 = 0x4749_4743_0000; // "GIGC"

fn lock_key_for_user(user_id: i32) -> i64 {
    LOCK_NAMESPACE ^ i64::from(user_id)
}

/// Holds a dedicated connection so the session-scoped lock is released on the same session.
pub struct UserLock {
    conn: sqlx::pool::PoolConnection<sqlx::Postgres>,
    user_id: i32,
}

pub async fn try_acquire_user_lock(
    pool: &sqlx::PgPool,
    user_id: i32,
) -> anyhow::Result<Option<UserLock>> {
    let key = lock_key_for_user(user_id);
    let mut conn = pool.acquire().await.context("acquire connection for lock failed")?;
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;

    Ok(acquired.0.then_some(UserLock { conn, user_id }))
}

impl UserLock {
    pub async fn release(mut self) -> anyhow::Result<()> {
        let key = lock_key_for_user(self.user_id);
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;
        Ok(())
    }
}
