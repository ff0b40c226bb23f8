use std::io::Read;
use std::process::ExitCode;

use chrono::NaiveDate;
use gigcoach_core::config::Settings;
use gigcoach_core::forecast::seasonal::SeasonalTrend;
use gigcoach_core::predict::{PredictModel, PredictOutput};

use crate::ModelArg;

pub fn run(model: ModelArg, settings: Result<&Settings, &anyhow::Error>) -> anyhow::Result<ExitCode> {
    let mut input = String::new();
    let out = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => render(&input, model, settings, chrono::Utc::now().date_naive()),
        Err(e) => PredictOutput::Error {
            error: format!("failed to read stdin: {e}"),
        },
    };

    if let PredictOutput::Error { error } = &out {
        tracing::warn!(error = %error, "prediction failed");
    }

    println!("{}", out.to_json());
    Ok(ExitCode::from(out.exit_code() as u8))
}

fn render(
    input: &str,
    model: ModelArg,
    settings: Result<&Settings, &anyhow::Error>,
    today: NaiveDate,
) -> PredictOutput {
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            return PredictOutput::Error {
                error: format!("invalid configuration: {e:#}"),
            }
        }
    };

    let model = match model {
        ModelArg::Average => PredictModel::Average,
        ModelArg::Seasonal => PredictModel::Seasonal(SeasonalTrend::from_settings(settings)),
    };
    gigcoach_core::predict::run(input, model, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(horizon_days: i64) -> Settings {
        Settings {
            database_url: None,
            sentry_dsn: None,
            port: None,
            forecast_horizon_days: horizon_days,
            forecast_yearly_order: 10,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 14).unwrap()
    }

    #[test]
    fn configuration_errors_are_reported_as_json() {
        let err = anyhow::anyhow!("PORT is invalid (got abc)");
        let out = render(r#"[{"amount": 10}]"#, ModelArg::Average, Err(&err), today());
        assert_eq!(out.exit_code(), 1);

        let v: serde_json::Value = serde_json::from_str(&out.to_json()).unwrap();
        let msg = v["error"].as_str().unwrap();
        assert!(msg.contains("PORT is invalid"), "got {msg}");
    }

    #[test]
    fn seasonal_model_honours_configured_horizon() {
        let s = settings(7);
        let input = r#"[{"date": "2025-06-01", "amount": 500}, {"date": "2025-07-01", "amount": 500}]"#;
        let out = render(input, ModelArg::Seasonal, Ok(&s), today());
        match out {
            PredictOutput::Prediction { next_month, .. } => {
                assert_eq!(next_month, NaiveDate::from_ymd_opt(2025, 7, 8).unwrap());
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn average_model_ignores_forecast_settings() {
        let s = settings(7);
        let out = render(r#"[{"amount": 10}, {"amount": 20}]"#, ModelArg::Average, Ok(&s), today());
        assert_eq!(out.exit_code(), 0);
    }
}
