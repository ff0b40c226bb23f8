use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gigcoach_core::domain::earnings::EarningsPoint;
use gigcoach_core::stats::DashboardStats;
use gigcoach_core::storage;
use gigcoach_core::storage::earnings::EarningsRow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = gigcoach_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();
    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match storage::connect(db_url).await {
            Ok(pool) => match storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState { pool };

    let app = router(state);

    let port = settings.port.unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/api/earnings", post(add_earnings))
        .route("/api/forecast/:phone_number", get(get_earnings_history))
        .route("/api/latest-forecast/:phone_number", get(get_latest_forecast))
        .route("/api/dashboard-stats/:phone_number", get(get_dashboard_stats))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "GigCoach AI Server is Running! 🚀"
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    pool: Option<PgPool>,
}

impl AppState {
    fn pool(&self) -> Result<&PgPool, ApiError> {
        self.pool
            .as_ref()
            .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable"))
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: anyhow::Error, what: &str) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "{what}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

async fn require_user(pool: &PgPool, phone_number: &str, what: &str) -> Result<i32, ApiError> {
    storage::users::find_user_id_by_phone(pool, phone_number)
        .await
        .map_err(|e| ApiError::internal(e, what))?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "User not found"))
}

#[derive(Debug, Deserialize)]
struct AddEarningsRequest {
    phone_number: Option<String>,
    date: Option<NaiveDate>,
    amount: Option<f64>,
}

impl AddEarningsRequest {
    fn validate(self) -> Result<(String, NaiveDate, f64), ApiError> {
        let missing = || {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "Missing required fields: phone_number, date, amount",
            )
        };

        let phone_number = self
            .phone_number
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;
        let date = self.date.ok_or_else(missing)?;
        let amount = self.amount.ok_or_else(missing)?;
        if !amount.is_finite() {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "amount must be a finite number"));
        }
        Ok((phone_number, date, amount))
    }
}

#[derive(Debug, Serialize)]
struct AddEarningsResponse {
    message: &'static str,
    data: EarningsRow,
}

async fn add_earnings(
    State(state): State<AppState>,
    payload: Result<Json<AddEarningsRequest>, JsonRejection>,
) -> Result<Json<AddEarningsResponse>, ApiError> {
    let Json(req) = payload?;
    let (phone_number, date, amount) = req.validate()?;
    let pool = state.pool()?;

    let user_id = require_user(pool, &phone_number, "error adding earnings").await?;
    let row = storage::earnings::insert(pool, user_id, date, amount)
        .await
        .map_err(|e| ApiError::internal(e, "error adding earnings"))?;

    tracing::info!(user_id, %date, "earnings added");

    Ok(Json(AddEarningsResponse {
        message: "Earnings data added successfully",
        data: row,
    }))
}

#[derive(Debug, Serialize)]
struct EarningsHistoryResponse {
    message: &'static str,
    user_id: i32,
    data: Vec<EarningsPoint>,
}

async fn get_earnings_history(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<EarningsHistoryResponse>, ApiError> {
    let pool = state.pool()?;
    let user_id = require_user(pool, &phone_number, "error fetching earnings history").await?;

    let data = storage::earnings::fetch_series(pool, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "error fetching earnings history"))?;
    if data.is_empty() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "No earnings data found for user",
        ));
    }

    Ok(Json(EarningsHistoryResponse {
        message: "Historical data found",
        user_id,
        data,
    }))
}

#[derive(Debug, Serialize)]
struct LatestForecastResponse {
    predicted_amount: f64,
}

async fn get_latest_forecast(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<LatestForecastResponse>, ApiError> {
    let pool = state.pool()?;
    let not_found = || ApiError::new(StatusCode::NOT_FOUND, "No forecast found for this user.");

    let user_id = storage::users::find_user_id_by_phone(pool, &phone_number)
        .await
        .map_err(|e| ApiError::internal(e, "error fetching latest forecast"))?
        .ok_or_else(not_found)?;

    let predicted_amount = storage::forecasts::latest_predicted_amount(pool, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "error fetching latest forecast"))?
        .ok_or_else(not_found)?;

    Ok(Json(LatestForecastResponse { predicted_amount }))
}

async fn get_dashboard_stats(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<DashboardStats>, ApiError> {
    let pool = state.pool()?;
    let what = "error fetching dashboard stats";

    // Unknown users get the zero-history dashboard.
    let Some(user_id) = storage::users::find_user_id_by_phone(pool, &phone_number)
        .await
        .map_err(|e| ApiError::internal(e, what))?
    else {
        return Ok(Json(gigcoach_core::stats::dashboard_stats(&[], None)));
    };

    let amounts = storage::earnings::fetch_amounts_newest_first(pool, user_id)
        .await
        .map_err(|e| ApiError::internal(e, what))?;
    let latest = storage::forecasts::latest_predicted_amount(pool, user_id)
        .await
        .map_err(|e| ApiError::internal(e, what))?;

    Ok(Json(gigcoach_core::stats::dashboard_stats(&amounts, latest)))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
