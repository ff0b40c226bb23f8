use serde::Serialize;

const BASE_GIG_SCORE: i64 = 300;
const MAX_GIG_SCORE: i64 = 850;
const POINTS_PER_MONTH: i64 = 20;
const MAX_HISTORY_POINTS: i64 = 200;
const STABILITY_BONUS: i64 = 50;
const STABLE_VOLATILITY: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub avg_income: AvgIncome,
    pub ai_forecast: AiForecast,
    pub gig_score: GigScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvgIncome {
    pub current: i64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiForecast {
    pub current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GigScore {
    pub current: i64,
}

/// `amounts_newest_first` must be ordered by date descending.
pub fn dashboard_stats(amounts_newest_first: &[f64], latest_forecast: Option<f64>) -> DashboardStats {
    let mut avg_income = AvgIncome {
        current: 0,
        change: 0.0,
    };

    if amounts_newest_first.len() > 1 {
        let total: f64 = amounts_newest_first.iter().sum();
        avg_income.current = round_half_up(total / amounts_newest_first.len() as f64);

        let last_month = amounts_newest_first[0];
        let prev_month = amounts_newest_first[1];
        if prev_month > 0.0 {
            avg_income.change = (last_month - prev_month) / prev_month;
        }
    }

    DashboardStats {
        avg_income,
        ai_forecast: AiForecast {
            current: latest_forecast.unwrap_or(0.0),
        },
        gig_score: GigScore {
            current: gig_score(amounts_newest_first),
        },
    }
}

pub fn gig_score(amounts: &[f64]) -> i64 {
    if amounts.is_empty() {
        return BASE_GIG_SCORE;
    }

    let months = amounts.len() as i64;
    let mut score = BASE_GIG_SCORE + (months * POINTS_PER_MONTH).min(MAX_HISTORY_POINTS);

    // A single observation has no spread and counts as stable.
    let stable = sample_std_dev(amounts).map_or(true, |sd| sd < STABLE_VOLATILITY);
    if stable {
        score += STABILITY_BONUS;
    }

    score.min(MAX_GIG_SCORE)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}
