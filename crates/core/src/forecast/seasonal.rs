use anyhow::Context;
use chrono::NaiveDate;

use super::solve::least_squares;
use super::{truncate_amount, validate_series, Forecaster};
use crate::config::Settings;
use crate::domain::earnings::{EarningsPoint, Forecast, ForecastMethod};
use crate::time::calendar::add_days;

pub const DEFAULT_HORIZON_DAYS: i64 = 30;
pub const DEFAULT_YEARLY_ORDER: usize = 10;

const YEAR_DAYS: f64 = 365.25;

// Penalty on the (scaled) Fourier coefficients. Trend terms are unpenalized.
const SEASONAL_RIDGE: f64 = 0.01;

/// Additive linear trend plus yearly Fourier seasonality, fit by least squares.
///
/// `y(t) = a + b * t / span + sum_k (c_k sin(2 pi k t / 365.25) + d_k cos(2 pi k t / 365.25))`
///
/// The forecast is the model evaluated `horizon_days` past the latest observation.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalTrend {
    pub yearly_order: usize,
    pub horizon_days: i64,
}

impl Default for SeasonalTrend {
    fn default() -> Self {
        Self {
            yearly_order: DEFAULT_YEARLY_ORDER,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone)]
struct FittedModel {
    origin: NaiveDate,
    span_days: f64,
    y_scale: f64,
    trend: bool,
    order: usize,
    coef: Vec<f64>,
}

impl FittedModel {
    fn row(&self, t_days: f64) -> Vec<f64> {
        design_row(t_days, self.span_days, self.trend, self.order)
    }

    fn predict(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        let row = self.row(t);
        let scaled: f64 = row.iter().zip(&self.coef).map(|(x, c)| x * c).sum();
        scaled * self.y_scale
    }
}

fn design_row(t_days: f64, span_days: f64, trend: bool, order: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + 2 * order);
    row.push(1.0);
    if trend {
        row.push(t_days / span_days);
    }
    for k in 1..=order {
        let angle = 2.0 * std::f64::consts::PI * (k as f64) * t_days / YEAR_DAYS;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

/// Number of yearly harmonics the series can carry.
///
/// Harmonics need at least one full year of history, and the parameter count
/// (`2 + 2 * order`) stays within half the number of points.
fn supported_order(requested: usize, points: usize, span_days: f64) -> usize {
    if span_days < YEAR_DAYS {
        return 0;
    }
    let budget = (points / 2).saturating_sub(2) / 2;
    requested.min(budget)
}

impl SeasonalTrend {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            yearly_order: settings.forecast_yearly_order,
            horizon_days: settings.forecast_horizon_days,
        }
    }

    fn fit(&self, series: &[EarningsPoint]) -> anyhow::Result<FittedModel> {
        validate_series(series)?;

        let mut sorted = series.to_vec();
        sorted.sort_by_key(|p| p.date);

        let origin = sorted[0].date;
        let last = sorted[sorted.len() - 1].date;
        let span_days = (last - origin).num_days() as f64;

        let y_scale = sorted
            .iter()
            .fold(0.0_f64, |acc, p| acc.max(p.amount.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y: Vec<f64> = sorted.iter().map(|p| p.amount / y_scale).collect();
        let n = sorted.len();

        if n == 1 || span_days <= 0.0 {
            return Ok(FittedModel {
                origin,
                span_days,
                y_scale,
                trend: false,
                order: 0,
                coef: vec![y.iter().sum::<f64>() / n as f64],
            });
        }

        let order = supported_order(self.yearly_order, n, span_days);
        let rows: Vec<Vec<f64>> = sorted
            .iter()
            .map(|p| design_row((p.date - origin).num_days() as f64, span_days, true, order))
            .collect();
        let mut ridge = vec![0.0, 0.0];
        ridge.extend(std::iter::repeat(SEASONAL_RIDGE).take(2 * order));

        // Two distinct dates make the trend columns full rank; the ridge covers the harmonics.
        let coef = least_squares(&rows, &y, &ridge)
            .with_context(|| format!("normal equations singular (points={n}, yearly_order={order})"))?;

        tracing::debug!(
            points = n,
            span_days,
            yearly_order = order,
            "seasonal trend model fitted"
        );

        Ok(FittedModel {
            origin,
            span_days,
            y_scale,
            trend: true,
            order,
            coef,
        })
    }
}

impl Forecaster for SeasonalTrend {
    fn method(&self) -> ForecastMethod {
        ForecastMethod::SeasonalTrend
    }

    fn forecast(&self, series: &[EarningsPoint]) -> anyhow::Result<Forecast> {
        anyhow::ensure!(self.horizon_days >= 1, "horizon_days must be >= 1");

        let model = self.fit(series)?;
        let latest = series
            .iter()
            .map(|p| p.date)
            .max()
            .ok_or_else(|| anyhow::anyhow!("no earnings data"))?;
        let forecast_date = add_days(latest, self.horizon_days)?;
        let yhat = model.predict(forecast_date);

        Ok(Forecast {
            forecast_date,
            predicted_amount: truncate_amount(yhat)?,
            method: self.method(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_every_30_days(n: usize, f: impl Fn(f64) -> f64) -> Vec<EarningsPoint> {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let t = (i * 30) as f64;
                EarningsPoint {
                    date: origin + chrono::Duration::days((i * 30) as i64),
                    amount: f(t),
                }
            })
            .collect()
    }

    #[test]
    fn single_point_forecasts_that_value() {
        let series = series_every_30_days(1, |_| 42000.0);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_eq!(f.predicted_amount, 42000);
        assert_eq!(f.forecast_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn constant_series_stays_flat() {
        let series = series_every_30_days(14, |_| 5000.0);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert!((f.predicted_amount - 5000).abs() <= 1, "got {}", f.predicted_amount);
    }

    #[test]
    fn extrapolates_linear_trend() {
        let series = series_every_30_days(12, |t| 10000.0 + 50.0 * t);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        // Last t = 330, target t = 360.
        assert!((f.predicted_amount - 28000).abs() <= 1, "got {}", f.predicted_amount);
        assert_eq!(f.method, ForecastMethod::SeasonalTrend);
    }

    #[test]
    fn recovers_yearly_cycle() {
        let truth = |t: f64| 20000.0 + 5000.0 * (2.0 * std::f64::consts::PI * t / YEAR_DAYS).sin();
        let series = series_every_30_days(24, truth);
        let model = SeasonalTrend {
            yearly_order: 1,
            horizon_days: 30,
        };
        let f = model.forecast(&series).unwrap();
        let expected = truth((23 * 30 + 30) as f64);
        assert!(
            (f.predicted_amount as f64 - expected).abs() < 100.0,
            "got {}, expected {expected}",
            f.predicted_amount
        );
    }

    #[test]
    fn same_day_points_fall_back_to_mean() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let series = vec![
            EarningsPoint { date: d, amount: 100.0 },
            EarningsPoint { date: d, amount: 301.0 },
        ];
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_eq!(f.predicted_amount, 200);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let mut series = series_every_30_days(6, |t| 1000.0 + t);
        series.reverse();
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        // Last t = 150, target t = 180.
        assert!((f.predicted_amount - 1180).abs() <= 1, "got {}", f.predicted_amount);
    }

    #[test]
    fn rejects_empty_series() {
        assert!(SeasonalTrend::default().forecast(&[]).is_err());
    }

    fn daily_series(amounts: &[f64]) -> Vec<EarningsPoint> {
        let origin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| EarningsPoint {
                date: origin + chrono::Duration::days(i as i64),
                amount,
            })
            .collect()
    }

    fn assert_within_observed_range(series: &[EarningsPoint], predicted: i64) {
        let lo = series.iter().map(|p| p.amount).fold(f64::INFINITY, f64::min);
        let hi = series.iter().map(|p| p.amount).fold(f64::NEG_INFINITY, f64::max);
        let p = predicted as f64;
        assert!(p >= lo && p <= hi, "forecast {predicted} outside [{lo}, {hi}]");
    }

    #[test]
    fn noisy_year_of_months_stays_in_range() {
        let amounts = [
            25000.0, 31000.0, 27000.0, 33000.0, 26000.0, 29000.0, 32000.0, 25500.0, 30000.0,
            28000.0, 26500.0, 31500.0,
        ];
        let series = series_every_30_days(amounts.len(), |t| amounts[(t / 30.0) as usize]);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_within_observed_range(&series, f.predicted_amount);
    }

    #[test]
    fn short_daily_series_stay_in_range() {
        let alternating: Vec<f64> = (0..22)
            .map(|i| if i % 2 == 0 { 1000.0 } else { 1200.0 })
            .collect();
        let series = daily_series(&alternating);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_within_observed_range(&series, f.predicted_amount);

        let scattered: Vec<f64> = (0..60).map(|i| 1000.0 + ((i * 137) % 401) as f64).collect();
        let series = daily_series(&scattered);
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_within_observed_range(&series, f.predicted_amount);
    }

    #[test]
    fn noisy_two_year_cycle_stays_in_range() {
        let noise = [
            900.0, -1200.0, 300.0, 1400.0, -700.0, -100.0, 1100.0, -1500.0, 600.0, -300.0,
            1000.0, -900.0,
        ];
        let series = series_every_30_days(24, |t| {
            let i = (t / 30.0) as usize;
            20000.0 + 5000.0 * (2.0 * std::f64::consts::PI * t / YEAR_DAYS).sin() + noise[i % 12]
        });
        let f = SeasonalTrend::default().forecast(&series).unwrap();
        assert_within_observed_range(&series, f.predicted_amount);
    }

    #[test]
    fn harmonics_need_a_full_year_and_enough_points() {
        assert_eq!(supported_order(10, 12, 330.0), 0);
        assert_eq!(supported_order(10, 60, 59.0), 0);
        assert_eq!(supported_order(10, 24, 690.0), 5);
        assert_eq!(supported_order(10, 14, 390.0), 2);
        assert_eq!(supported_order(10, 5, 400.0), 0);
        assert_eq!(supported_order(3, 100, 800.0), 3);
    }
}
