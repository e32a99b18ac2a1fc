#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The weather source rejected the API credential (HTTP 401). The caller
    /// should prompt for a new key rather than retry.
    #[error("Weather source rejected the API credential")]
    Unauthorized,
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Weather source returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("Response for city '{0}' has no numeric temperature field")]
    MissingTemperature(String),
}
