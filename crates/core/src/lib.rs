pub mod domain;
pub mod forecast;
pub mod predict;
pub mod stats;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    use crate::forecast::seasonal::{DEFAULT_HORIZON_DAYS, DEFAULT_YEARLY_ORDER};

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,
        pub forecast_horizon_days: i64,
        pub forecast_yearly_order: usize,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = parse_var::<u16>("PORT", std::env::var("PORT").ok())?;

            let forecast_horizon_days = parse_var::<i64>(
                "FORECAST_HORIZON_DAYS",
                std::env::var("FORECAST_HORIZON_DAYS").ok(),
            )?
            .unwrap_or(DEFAULT_HORIZON_DAYS);
            anyhow::ensure!(
                forecast_horizon_days >= 1,
                "FORECAST_HORIZON_DAYS must be >= 1"
            );

            let forecast_yearly_order = parse_var::<usize>(
                "FORECAST_YEARLY_ORDER",
                std::env::var("FORECAST_YEARLY_ORDER").ok(),
            )?
            .unwrap_or(DEFAULT_YEARLY_ORDER);

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port,
                forecast_horizon_days,
                forecast_yearly_order,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    /// Unset or blank means "use the default"; anything else must parse.
    fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> anyhow::Result<Option<T>> {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{name} is invalid (got {raw})"))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn unset_and_blank_values_use_defaults() {
            assert_eq!(parse_var::<u16>("PORT", None).unwrap(), None);
            assert_eq!(parse_var::<u16>("PORT", Some("  ".into())).unwrap(), None);
        }

        #[test]
        fn valid_values_parse() {
            assert_eq!(parse_var::<u16>("PORT", Some("8080".into())).unwrap(), Some(8080));
            assert_eq!(
                parse_var::<usize>("FORECAST_YEARLY_ORDER", Some(" 4 ".into())).unwrap(),
                Some(4)
            );
        }

        #[test]
        fn invalid_values_are_errors_for_every_setting() {
            let err = parse_var::<u16>("PORT", Some("abc".into())).unwrap_err();
            assert!(err.to_string().contains("PORT"));
            let err = parse_var::<i64>("FORECAST_HORIZON_DAYS", Some("soon".into())).unwrap_err();
            assert!(err.to_string().contains("FORECAST_HORIZON_DAYS"));
            assert!(parse_var::<usize>("FORECAST_YEARLY_ORDER", Some("-1".into())).is_err());
        }
    }
}
