use super::{truncate_amount, validate_series, Forecaster};
use crate::domain::earnings::{EarningsPoint, Forecast, ForecastMethod};
use crate::time::calendar::next_month_start;

/// Fallback model: the integer-truncated mean of all observed amounts, dated to the first
/// day of the month after the latest observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAverage;

pub fn truncated_mean(amounts: &[f64]) -> anyhow::Result<i64> {
    anyhow::ensure!(!amounts.is_empty(), "no earnings data");
    let sum: f64 = amounts.iter().sum();
    truncate_amount(sum / amounts.len() as f64)
}

impl Forecaster for SimpleAverage {
    fn method(&self) -> ForecastMethod {
        ForecastMethod::SimpleAverage
    }

    fn forecast(&self, series: &[EarningsPoint]) -> anyhow::Result<Forecast> {
        validate_series(series)?;

        let amounts: Vec<f64> = series.iter().map(|p| p.amount).collect();
        let latest = series
            .iter()
            .map(|p| p.date)
            .max()
            .ok_or_else(|| anyhow::anyhow!("no earnings data"))?;

        Ok(Forecast {
            forecast_date: next_month_start(latest)?,
            predicted_amount: truncated_mean(&amounts)?,
            method: self.method(),
        })
    }
}
