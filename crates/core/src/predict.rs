//! JSON-in, JSON-out prediction filter.
//!
//! Input is a JSON array of `{"date": "YYYY-MM-DD"?, "amount": number}` records. Output is a
//! single JSON object: either a prediction or `{"error": "..."}`.

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::domain::earnings::{EarningsPoint, EarningsRecord, ForecastMethod};
use crate::forecast::average::truncated_mean;
use crate::forecast::seasonal::SeasonalTrend;
use crate::forecast::Forecaster;
use crate::time::calendar::next_month_start;

pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, Copy)]
pub enum PredictModel {
    Average,
    Seasonal(SeasonalTrend),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictOutput {
    Prediction {
        prediction: i64,
        next_month: NaiveDate,
        note: &'static str,
    },
    Error {
        error: String,
    },
}

impl PredictOutput {
    pub fn exit_code(&self) -> i32 {
        match self {
            PredictOutput::Prediction { .. } => 0,
            PredictOutput::Error { .. } => 1,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("failed to serialize output: {e}") }).to_string()
        })
    }
}

pub fn run(input: &str, model: PredictModel, today: NaiveDate) -> PredictOutput {
    match predict(input, model, today) {
        Ok(out) => out,
        Err(err) => PredictOutput::Error {
            error: format!("{err:#}"),
        },
    }
}

/// `null`, `false`, `0`, `""`, `[]` and `{}` all mean no data.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn predict(input: &str, model: PredictModel, today: NaiveDate) -> anyhow::Result<PredictOutput> {
    let value: Value = serde_json::from_str(input).context("input is not valid JSON")?;
    if is_empty_value(&value) {
        return Ok(PredictOutput::Error {
            error: NO_DATA.to_string(),
        });
    }

    let records: Vec<EarningsRecord> = serde_json::from_value(value)
        .context("input is not a JSON array of earnings records")?;

    match model {
        PredictModel::Average => {
            let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
            anyhow::ensure!(
                amounts.iter().all(|a| a.is_finite()),
                "earnings amounts must be finite"
            );
            let latest = records.iter().filter_map(|r| r.date).max().unwrap_or(today);

            Ok(PredictOutput::Prediction {
                prediction: truncated_mean(&amounts)?,
                next_month: next_month_start(latest)?,
                note: ForecastMethod::SimpleAverage.note(),
            })
        }
        PredictModel::Seasonal(seasonal) => {
            let series = records
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let date = r
                        .date
                        .with_context(|| format!("record {i} has no date; the seasonal model needs one"))?;
                    Ok(EarningsPoint {
                        date,
                        amount: r.amount,
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let forecast = seasonal.forecast(&series)?;
            Ok(PredictOutput::Prediction {
                prediction: forecast.predicted_amount,
                next_month: forecast.forecast_date,
                note: forecast.method.note(),
            })
        }
    }
}
