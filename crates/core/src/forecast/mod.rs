use crate::domain::earnings::{EarningsPoint, Forecast, ForecastMethod};

pub mod average;
pub mod seasonal;
mod solve;

pub trait Forecaster {
    fn method(&self) -> ForecastMethod;

    fn forecast(&self, series: &[EarningsPoint]) -> anyhow::Result<Forecast>;
}

/// Truncates toward zero, like an integer cast of the model output.
pub(crate) fn truncate_amount(value: f64) -> anyhow::Result<i64> {
    anyhow::ensure!(value.is_finite(), "forecast value is not finite: {value}");
    let truncated = value.trunc();
    anyhow::ensure!(
        truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64,
        "forecast value out of range: {value}"
    );
    Ok(truncated as i64)
}

pub(crate) fn validate_series(series: &[EarningsPoint]) -> anyhow::Result<()> {
    anyhow::ensure!(!series.is_empty(), "no earnings data");
    for p in series {
        anyhow::ensure!(
            p.amount.is_finite(),
            "earnings amount must be finite (date={}, amount={})",
            p.date,
            p.amount
        );
    }
    Ok(())
}
