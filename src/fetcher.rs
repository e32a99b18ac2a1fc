use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetch_error::FetchError;

/// Current-weather endpoint queried for live readings.
pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

// Per-request timeout; a slow city's lookup is aborted on its own without
// affecting sibling requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the current-weather endpoint.
///
/// Issues one GET per city with `q=<city>&appid=<key>&units=metric` and reads
/// the numeric `main.temp` field (degrees Celsius) out of the JSON response.
#[derive(Clone)]
pub struct WeatherFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherFetcher {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key)
    }

    /// Custom base URL, used by tests to point at a local mock server.
    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            api_key,
        }
    }

    #[instrument(skip(self), fields(city = %city))]
    pub async fn fetch_current_temperature(&self, city: &str) -> Result<f64, FetchError> {
        debug!("Requesting current weather");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!("Received response with status {}", status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        let body: serde_json::Value = response.json().await?;
        body.pointer("/main/temp")
            .and_then(|value| value.as_f64())
            .ok_or_else(|| FetchError::MissingTemperature(city.to_string()))
    }
}
