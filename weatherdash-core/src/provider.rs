use crate::{Config, WeatherError, WeatherSnapshot, provider::visualcrossing::VisualCrossingFetcher};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod visualcrossing;

/// One network round-trip to the weather provider.
///
/// Implementations make a single attempt: no retry, no backoff.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the provider client from config.
pub fn fetcher_from_config(config: &Config) -> anyhow::Result<VisualCrossingFetcher> {
    let api_key = config.api_key()?;
    Ok(VisualCrossingFetcher::with_base_url(api_key.to_owned(), config.base_url().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = fetcher_from_config(&cfg).unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `weatherdash configure`"));
    }

    #[test]
    fn fetcher_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(fetcher_from_config(&cfg).is_ok());
    }
}
