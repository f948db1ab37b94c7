/// Discriminant of [`WeatherError`], handy for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    RequestFailed,
    MalformedResponse,
}

/// Failures of a single fetch.
///
/// Cloneable so it can live inside the published [`WeatherState`](crate::session::WeatherState).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    #[error("provider rate limit reached")]
    RateLimited,
    #[error("weather request failed: {0}")]
    RequestFailed(String),
    #[error("provider returned an unexpected payload: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::RateLimited => ErrorKind::RateLimited,
            WeatherError::RequestFailed(_) => ErrorKind::RequestFailed,
            WeatherError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// Fixed text shown to the user. Details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::RateLimited => "Too many requests. Please try again later.",
            ErrorKind::RequestFailed | ErrorKind::MalformedResponse => {
                "Failed to fetch weather data"
            }
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    /// Drops the request URL: it carries the API key in its query string.
    fn from(err: reqwest::Error) -> Self {
        WeatherError::RequestFailed(err.without_url().to_string())
    }
}
