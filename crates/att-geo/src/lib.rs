//! Reverse geocoding for attendance events.
//!
//! Resolves GPS coordinates captured at clock time into a display address
//! and city using the OpenStreetMap Nominatim API. Geocoding is strictly
//! best-effort: a clock event must never fail because the resolver is
//! down, so callers go through [`Client::resolve_best_effort`], which
//! degrades to bare coordinates on any error.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use att_core::GeoPoint;

/// Default request timeout for geocoding calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
/// Nominatim requires an identifying User-Agent.
const USER_AGENT: &str = concat!("attendance-ledger/", env!("CARGO_PKG_VERSION"));

/// Geocoding client errors.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API returned a non-success status.
    #[error("geocoding API returned status {status}")]
    Status { status: reqwest::StatusCode },
    /// Failed to parse the response body.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A resolved place for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPlace {
    /// Full display address, when the resolver found one.
    pub address: Option<String>,
    /// Best-match locality name, when the resolver found one.
    pub city: Option<String>,
}

/// Nominatim reverse-geocoding client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client against the public Nominatim endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, GeoError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Creates a client against a custom endpoint (self-hosted Nominatim
    /// or a test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(GeoError::ClientBuild)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Resolves coordinates to an address and city.
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> Result<ResolvedPlace, GeoError> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("format", "json"), ("lat", lat.as_str()), ("lon", lon.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status { status });
        }
        let body = response.text().await?;
        parse_place(&body)
    }

    /// Resolves coordinates, degrading to an empty place on any failure.
    ///
    /// The failure is logged and swallowed so the caller can record the
    /// event with bare coordinates.
    pub async fn resolve_best_effort(&self, latitude: f64, longitude: f64) -> ResolvedPlace {
        match self.resolve(latitude, longitude).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!(latitude, longitude, error = %err, "geocoding failed");
                ResolvedPlace::default()
            }
        }
    }
}

/// Attaches a resolved place to a coordinate pair.
#[must_use]
pub fn located(latitude: f64, longitude: f64, place: ResolvedPlace) -> GeoPoint {
    GeoPoint {
        latitude,
        longitude,
        address: place.address,
        city: place.city,
    }
}

#[derive(Debug, Deserialize)]
struct ReversePayload {
    display_name: Option<String>,
    #[serde(default)]
    address: AddressPayload,
}

/// Nominatim's address object varies by place type; the locality can
/// appear under any of these keys depending on settlement size.
#[derive(Debug, Deserialize, Default)]
struct AddressPayload {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
}

impl AddressPayload {
    fn locality(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.county)
    }
}

fn parse_place(body: &str) -> Result<ResolvedPlace, GeoError> {
    let payload: ReversePayload =
        serde_json::from_str(body).map_err(|err| GeoError::InvalidResponse(err.to_string()))?;
    Ok(ResolvedPlace {
        address: payload.display_name,
        city: payload.address.locality(),
    })
}
