use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use crate::{error::WeatherError, model::WeatherSnapshot};

use super::WeatherFetcher;

/// Visual Crossing timeline endpoint; the location is appended as a path segment.
pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Single-attempt client for the Visual Crossing timeline API.
///
/// Requests `unitGroup=us`, so every snapshot arrives in °F and mph.
#[derive(Debug, Clone)]
pub struct VisualCrossingFetcher {
    api_key: String,
    base_url: String,
    http: Client,
}

impl VisualCrossingFetcher {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self { api_key, base_url, http: Client::new() }
    }

    fn location_url(&self, location: &str) -> Result<Url, WeatherError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            WeatherError::RequestFailed(format!("invalid base URL '{}': {err}", self.base_url))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                WeatherError::RequestFailed(format!("base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(location);

        Ok(url)
    }
}

#[async_trait]
impl WeatherFetcher for VisualCrossingFetcher {
    async fn fetch(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        let url = self.location_url(location)?;
        debug!(%url, "requesting forecast");

        let res = self
            .http
            .get(url)
            .query(&[
                ("unitGroup", "us"),
                ("key", self.api_key.as_str()),
                ("contentType", "json"),
            ])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            info!(location, "provider rate limit reached");
            return Err(WeatherError::RateLimited);
        }

        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::RequestFailed(format!(
                "provider responded with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let snapshot: WeatherSnapshot = serde_json::from_str(&body)
            .map_err(|err| WeatherError::MalformedResponse(err.to_string()))?;

        info!(
            location,
            resolved = %snapshot.resolved_address,
            days = snapshot.days.len(),
            "fetched forecast"
        );

        Ok(snapshot)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
