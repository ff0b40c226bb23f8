use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observed earnings row, as scanned from the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// A loosely-typed earnings record handed to the prediction filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsRecord {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    SeasonalTrend,
    SimpleAverage,
}

impl ForecastMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastMethod::SeasonalTrend => "seasonal_trend",
            ForecastMethod::SimpleAverage => "simple_average",
        }
    }

    /// Tag reported by the prediction filter.
    pub fn note(self) -> &'static str {
        match self {
            ForecastMethod::SeasonalTrend => "seasonal_trend_used",
            ForecastMethod::SimpleAverage => "simple_average_used",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub forecast_date: NaiveDate,
    pub predicted_amount: i64,
    pub method: ForecastMethod,
}
