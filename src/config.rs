use std::env;

use crate::fetcher::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the live weather source. Required - there is no
    /// default baked into the binary.
    pub openweather_api_key: String,
    pub weather_api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            openweather_api_key: env::var("OPENWEATHER_API_KEY")?,
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}
