// # NASA APOD Client
//
// This crate provides the NASA Astronomy Picture of the Day client for the
// apod-core engine.
//
// ## Scope
//
// - One HTTP GET per `fetch` call
// - Finite request timeout (30 seconds unless configured)
// - Status codes mapped to `FetchOutcome` variants, never to errors
// - Video records carry a thumbnail (`thumbs=true` is always requested)
// - NO retry logic (a retry is a new `resolve` call by the caller)
// - NO caching (owned by ContentCache)
// - NO background tasks
//
// ## Outcome Mapping
//
// | Response                                  | Outcome             |
// |-------------------------------------------|---------------------|
// | 2xx with a well-formed record             | `Success`           |
// | 2xx with an unusable body                 | `InvalidResponse`   |
// | 404                                       | `NotYetPublished`   |
// | 400 "Date must be between ..."            | `NotYetPublished`   |
// | any other status, timeout, refused socket | `RemoteUnavailable` |
//
// ## Security Requirements
//
// - The API key NEVER appears in logs, Debug output or outcome messages
// - Construction fails fast if the key is empty
//
// ## API Reference
//
// - GET `https://api.nasa.gov/planetary/apod?api_key=...&date=YYYY-MM-DD&thumbs=true`
// - Without `date` the API answers with its current record

use apod_core::config::ClientConfig;
use apod_core::traits::{ContentClient, ContentClientFactory, FetchOutcome};
use apod_core::{ContentRecord, Error, MediaType, ProviderRegistry, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

pub use apod_core::config::DEFAULT_NASA_BASE_URL;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker in the 400 body NASA returns for dates outside its archive
const OUT_OF_RANGE_MARKER: &str = "Date must be between";

/// Longest slice of an error body kept in an outcome message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// NASA APOD client
///
/// Stateless and single-shot. Cheap to share: the inner `reqwest::Client`
/// pools connections.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct NasaApodClient {
    /// api.nasa.gov key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Endpoint url, without query
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for NasaApodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NasaApodClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NasaApodClient {
    /// Create a new NASA APOD client
    ///
    /// # Parameters
    ///
    /// - `api_key`: api.nasa.gov key (`DEMO_KEY` works with low rate limits)
    /// - `base_url`: Endpoint url, normally [`DEFAULT_NASA_BASE_URL`]
    /// - `timeout`: Upper bound for one request, connect included
    ///
    /// # Errors
    ///
    /// `Error::Config` for an empty key or a zero timeout, `Error::Http` if
    /// the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("NASA API key cannot be empty"));
        }
        if timeout.is_zero() {
            return Err(Error::config("NASA client timeout must be > 0"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into(),
            client,
        })
    }

    /// Client for the public endpoint with the default timeout
    pub fn with_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_NASA_BASE_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// Endpoint url
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace every occurrence of the key in `text`
    fn redact(&self, text: &str) -> String {
        text.replace(&self.api_key, "<REDACTED>")
    }

    /// Outcome for a non-2xx response
    fn map_error_status(&self, status: reqwest::StatusCode, body: &str) -> FetchOutcome {
        let excerpt: String = self.redact(body.trim()).chars().take(MAX_ERROR_BODY_CHARS).collect();

        match status.as_u16() {
            404 => FetchOutcome::NotYetPublished,
            400 if body.contains(OUT_OF_RANGE_MARKER) => FetchOutcome::NotYetPublished,
            401 | 403 => FetchOutcome::RemoteUnavailable(format!(
                "Authentication failed: invalid or missing API key. Status: {}",
                status
            )),
            429 => FetchOutcome::RemoteUnavailable(format!(
                "Rate limit exceeded. Please retry later. Status: {}",
                status
            )),
            500..=599 => FetchOutcome::RemoteUnavailable(format!(
                "NASA server error (transient): {} - {}",
                status, excerpt
            )),
            _ => FetchOutcome::RemoteUnavailable(format!(
                "APOD request failed: {} - {}",
                status, excerpt
            )),
        }
    }
}

#[async_trait]
impl ContentClient for NasaApodClient {
    /// Fetch the record for `date`, or the current record when `None`
    ///
    /// Exactly one GET. Every failure comes back as a `FetchOutcome`.
    async fn fetch(&self, date: Option<NaiveDate>) -> FetchOutcome {
        match date {
            Some(date) => tracing::debug!("Requesting APOD for {}", date),
            None => tracing::debug!("Requesting current APOD"),
        }

        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[("api_key", self.api_key.as_str()), ("thumbs", "true")]);
        if let Some(date) = date {
            request = request.query(&[("date", date.format("%Y-%m-%d").to_string())]);
        }

        // reqwest errors carry the request url, which holds the key
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let cause = describe_transport_error(e);
                tracing::warn!("APOD request failed: {}", cause);
                return FetchOutcome::RemoteUnavailable(cause);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let cause = describe_transport_error(e);
                tracing::warn!("Failed to read APOD response body: {}", cause);
                return FetchOutcome::RemoteUnavailable(cause);
            }
        };

        if !status.is_success() {
            let outcome = self.map_error_status(status, &body);
            tracing::debug!("APOD answered {}: {}", status, outcome.kind());
            return outcome;
        }

        match parse_record(&body) {
            Ok(record) => {
                tracing::debug!("Received APOD for {}: {}", record.date(), record.title());
                FetchOutcome::Success(record)
            }
            Err(e) => {
                tracing::warn!("Unusable APOD payload: {}", e);
                FetchOutcome::InvalidResponse(e.to_string())
            }
        }
    }

    fn client_name(&self) -> &'static str {
        "nasa"
    }
}

fn describe_transport_error(e: reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "HTTP request failed"
    };
    format!("{}: {}", kind, e.without_url())
}

/// APOD API response body
#[derive(Debug, Deserialize)]
struct ApodResponse {
    date: String,
    title: String,
    explanation: String,
    media_type: String,
    url: Option<String>,
    hdurl: Option<String>,
    thumbnail_url: Option<String>,
    copyright: Option<String>,
}

/// Why a 2xx body could not become a record
#[derive(Debug, thiserror::Error)]
enum PayloadError {
    #[error("malformed APOD payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date in APOD payload: {0:?}")]
    Date(String),

    #[error("unsupported media type: {0:?}")]
    MediaType(String),

    #[error("APOD payload has no media url")]
    MissingUrl,
}

fn parse_record(body: &str) -> std::result::Result<ContentRecord, PayloadError> {
    let raw: ApodResponse = serde_json::from_str(body)?;

    let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d")
        .map_err(|_| PayloadError::Date(raw.date.clone()))?;
    let media_type =
        MediaType::from_label(&raw.media_type).ok_or(PayloadError::MediaType(raw.media_type))?;
    let url = raw
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or(PayloadError::MissingUrl)?;

    let mut record = ContentRecord::new(date, raw.title, raw.explanation, media_type, url);
    if let Some(hdurl) = non_blank(raw.hdurl) {
        record = record.with_hd_media_url(hdurl);
    }
    if let Some(thumbnail) = non_blank(raw.thumbnail_url) {
        record = record.with_thumbnail_url(thumbnail);
    }
    if let Some(copyright) = non_blank(raw.copyright) {
        record = record.with_attribution(copyright);
    }
    Ok(record)
}

/// Trimmed value, or None when empty
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Factory for creating NASA clients
pub struct NasaFactory;

impl ContentClientFactory for NasaFactory {
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn ContentClient>> {
        match config {
            ClientConfig::Nasa {
                api_key,
                base_url,
                timeout_secs,
            } => Ok(Box::new(NasaApodClient::new(
                api_key.clone(),
                base_url.clone(),
                Duration::from_secs(*timeout_secs),
            )?)),
            _ => Err(Error::config("Invalid config for NASA client")),
        }
    }
}

/// Register the NASA client with a registry
///
/// # Example
///
/// ```rust
/// use apod_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::with_builtin_stores();
/// apod_client_nasa::register(&registry);
/// assert!(registry.has_client("nasa"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_client("nasa", Box::new(NasaFactory));
}
