//! Transport adapter for the Abstract API IP geolocation endpoint
//!
//! One blocking HTTP GET per lookup. Non-200 statuses and transport failures
//! map onto the [`LookupError`] taxonomy; no retries are attempted.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use ureq::Agent;

use crate::config::IpscopeConfig;

/// Result type for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;

/// Failure taxonomy for a single lookup. Every variant is terminal for the
/// current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Empty or missing input address; no network call was made
    InvalidInput(String),
    /// Upstream rejected the API key (401)
    Unauthorized,
    /// Upstream rate limit exceeded (429)
    RateLimited,
    /// Upstream rejected the supplied address (422 on the specific-address path)
    UnprocessableAddress(String),
    /// Any other non-200 status from upstream
    UpstreamStatus(u16),
    /// Request timed out
    Timeout,
    /// Could not connect to upstream
    Connection(String),
    /// Any other transport-level failure
    Transport(String),
    /// 200 response with a body that is not valid JSON
    InvalidBody(String),
    /// 200 response missing the required `ip_address` field
    InvalidResponse,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidInput(input) => {
                write!(f, "invalid input address: {:?}", input)
            }
            LookupError::Unauthorized => {
                write!(f, "invalid API key, please check your credentials")
            }
            LookupError::RateLimited => {
                write!(f, "API rate limit exceeded, please try again later")
            }
            LookupError::UnprocessableAddress(addr) => {
                write!(f, "upstream rejected address: {}", addr)
            }
            LookupError::UpstreamStatus(code) => {
                write!(f, "API returned status code {}", code)
            }
            LookupError::Timeout => write!(f, "request timed out"),
            LookupError::Connection(e) => write!(f, "could not connect to API: {}", e),
            LookupError::Transport(e) => write!(f, "transport error: {}", e),
            LookupError::InvalidBody(e) => write!(f, "could not parse API response: {}", e),
            LookupError::InvalidResponse => {
                write!(f, "API response is missing required fields")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Blocking client for the Abstract API IP geolocation service
///
/// Holds two pre-built agents: one with the lookup timeout and one with the
/// shorter connectivity-probe timeout.
pub struct GeoClient {
    api_key: String,
    base_url: String,
    agent: Agent,
    probe_agent: Agent,
}

impl GeoClient {
    /// Create a new client from configuration
    pub fn new(config: &IpscopeConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('?').to_string(),
            agent: build_agent(config.lookup_timeout()),
            probe_agent: build_agent(config.connect_timeout()),
        }
    }

    /// Retrieve raw IP information for the caller's current public IP
    pub fn fetch_current(&self) -> LookupResult<Value> {
        self.request(None)
    }

    /// Retrieve raw IP information for a specific IP address
    ///
    /// An empty or blank address fails immediately with
    /// [`LookupError::InvalidInput`] without touching the network.
    pub fn fetch_for_address(&self, address: &str) -> LookupResult<Value> {
        if address.trim().is_empty() {
            return Err(LookupError::InvalidInput(address.to_string()));
        }
        self.request(Some(address.trim()))
    }

    /// Probe the API endpoint; true iff it answers with a 200
    pub fn check_connectivity(&self) -> bool {
        let url = self.lookup_url(None);
        match self.probe_agent.get(&url).call() {
            Ok(resp) => resp.status().as_u16() == 200,
            Err(e) => {
                tracing::debug!("connectivity probe failed: {}", e);
                false
            }
        }
    }

    fn lookup_url(&self, address: Option<&str>) -> String {
        match address {
            Some(addr) => format!(
                "{}?api_key={}&ip_address={}",
                self.base_url, self.api_key, addr
            ),
            None => format!("{}?api_key={}", self.base_url, self.api_key),
        }
    }

    fn request(&self, address: Option<&str>) -> LookupResult<Value> {
        let url = self.lookup_url(address);
        tracing::debug!(address = address.unwrap_or("<current>"), "fetching IP info");

        let mut resp = match self.agent.get(&url).call() {
            Ok(resp) => resp,
            Err(e) => return Err(classify_transport(e)),
        };

        match resp.status().as_u16() {
            200 => resp
                .body_mut()
                .read_json::<Value>()
                .map_err(|e| LookupError::InvalidBody(e.to_string())),
            401 => Err(LookupError::Unauthorized),
            429 => Err(LookupError::RateLimited),
            // Upstream only emits 422 for a malformed target address, so the
            // current-IP path treats it as a generic failure.
            422 if address.is_some() => Err(LookupError::UnprocessableAddress(
                address.unwrap_or_default().to_string(),
            )),
            code => Err(LookupError::UpstreamStatus(code)),
        }
    }
}

fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn classify_transport(err: ureq::Error) -> LookupError {
    match err {
        ureq::Error::Timeout(_) => LookupError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => LookupError::Timeout,
        ureq::Error::Io(e) => LookupError::Connection(e.to_string()),
        e @ (ureq::Error::ConnectionFailed | ureq::Error::HostNotFound) => {
            LookupError::Connection(e.to_string())
        }
        e => LookupError::Transport(e.to_string()),
    }
}
