use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::criteria::haversine_km;
use crate::models::{Coordinates, MenteeProfile, MentorProfile, PairKey};

const USER_AGENT: &str = concat!("mentora-algo/", env!("CARGO_PKG_VERSION"));
const COUNTRY_BIAS: &str = "Switzerland";
const MAX_RETRIES: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REQUESTS_PER_MINUTE: usize = 40;

const CACHE_CAPACITY: u64 = 10_000;
const CACHE_TTL_SECS: u64 = 86_400;

/// Errors that can occur when talking to a geocoding backend
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Shared caches for geocoding results and pair distances.
///
/// Both caches live in memory only. Failed lookups are cached as `None`
/// so a location that cannot be resolved is queried once, not once per
/// pair. Tests pre-populate the location cache to stay off the network.
#[derive(Clone)]
pub struct GeoCache {
    locations: moka::future::Cache<String, Option<Coordinates>>,
    distances: moka::future::Cache<String, f64>,
}

impl GeoCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let locations = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        let distances = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            locations,
            distances,
        }
    }

    pub async fn location(&self, key: &str) -> Option<Option<Coordinates>> {
        self.locations.get(key).await
    }

    pub async fn store_location(&self, key: String, coords: Option<Coordinates>) {
        self.locations.insert(key, coords).await;
    }

    pub async fn distance(&self, from: Coordinates, to: Coordinates) -> Option<f64> {
        self.distances.get(&distance_key(from, to)).await
    }

    pub async fn store_distance(&self, from: Coordinates, to: Coordinates, km: f64) {
        self.distances.insert(distance_key(from, to), km).await;
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY, CACHE_TTL_SECS)
    }
}

/// Order-insensitive cache key for a coordinate pair.
fn distance_key(a: Coordinates, b: Coordinates) -> String {
    let left = format!("{:.6},{:.6}", a.lat, a.lon);
    let right = format!("{:.6},{:.6}", b.lat, b.lon);
    if left <= right {
        format!("{}|{}", left, right)
    } else {
        format!("{}|{}", right, left)
    }
}

/// Sliding-window request limiter.
///
/// Tracks send instants in a window and delays callers once the window
/// is full, so burst traffic never exceeds the upstream's rate policy.
struct RequestWindow {
    capacity: usize,
    window: Duration,
    sent: tokio::sync::Mutex<VecDeque<Instant>>,
}

impl RequestWindow {
    fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            sent: tokio::sync::Mutex::new(VecDeque::new()),
        }
    }

    async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = sent.front() {
                    if now.duration_since(oldest) >= self.window {
                        sent.pop_front();
                    } else {
                        break;
                    }
                }
                if sent.len() < self.capacity {
                    sent.push_back(now);
                    None
                } else {
                    sent.front()
                        .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                }
            };

            match wait {
                None => return,
                Some(delay) => sleep(delay).await,
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Backend<'a> {
    Nominatim,
    OpenCage(&'a str),
}

/// Geocoding client
///
/// Resolves free-text locations against a Nominatim-compatible search
/// endpoint, with an OpenCage-compatible fallback when an API key is
/// configured. Queries are biased towards the local country first and
/// retried with linear backoff on transport errors.
pub struct GeocodeClient {
    nominatim_url: String,
    opencage_url: String,
    opencage_api_key: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
    client: Client,
    cache: GeoCache,
    limiter: RequestWindow,
}

impl GeocodeClient {
    /// Create a new geocoding client
    pub fn new(
        nominatim_url: String,
        opencage_url: String,
        opencage_api_key: Option<String>,
        cache: GeoCache,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            nominatim_url,
            opencage_url,
            opencage_api_key,
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            client,
            cache,
            limiter: RequestWindow::new(REQUESTS_PER_MINUTE, Duration::from_secs(60)),
        }
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Resolve a free-text location to coordinates, consulting the cache
    /// first. Unresolvable locations are cached negatively and yield `None`.
    pub async fn resolve(&self, location: &str) -> Option<Coordinates> {
        let query = location.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.location(query).await {
            return cached;
        }

        let resolved = self.geocode(query).await;
        if resolved.is_none() {
            warn!("could not geocode location '{}'", query);
        }
        self.cache.store_location(query.to_string(), resolved).await;
        resolved
    }

    /// Great-circle distance between two coordinates, via the distance cache.
    pub async fn distance_km(&self, from: Coordinates, to: Coordinates) -> f64 {
        if let Some(cached) = self.cache.distance(from, to).await {
            return cached;
        }
        let km = haversine_km(from, to);
        self.cache.store_distance(from, to, km).await;
        km
    }

    /// Resolve both cohorts' locations and compute the distance for every
    /// pair where both sides resolved. Pairs with an unresolved side are
    /// absent from the result.
    pub async fn pair_distances(
        &self,
        mentees: &[MenteeProfile],
        mentors: &[MentorProfile],
    ) -> BTreeMap<PairKey, f64> {
        let mut distances = BTreeMap::new();
        for mentee in mentees {
            let Some(from) = self.resolve_field(mentee.location.as_deref()).await else {
                continue;
            };
            for mentor in mentors {
                let Some(to) = self.resolve_field(mentor.location.as_deref()).await else {
                    continue;
                };
                let key = PairKey::new(mentee.id.as_str(), mentor.id.as_str());
                distances.insert(key, self.distance_km(from, to).await);
            }
        }
        distances
    }

    async fn resolve_field(&self, location: Option<&str>) -> Option<Coordinates> {
        match location {
            Some(text) => self.resolve(text).await,
            None => None,
        }
    }

    async fn geocode(&self, query: &str) -> Option<Coordinates> {
        let biased = format!("{}, {}", query, COUNTRY_BIAS);
        if let Some(coords) = self.with_retries(Backend::Nominatim, &biased).await {
            return Some(coords);
        }
        if let Some(coords) = self.with_retries(Backend::Nominatim, query).await {
            return Some(coords);
        }
        if let Some(key) = self.opencage_api_key.as_deref() {
            if let Some(coords) = self.with_retries(Backend::OpenCage(key), query).await {
                return Some(coords);
            }
        }
        None
    }

    async fn with_retries(&self, backend: Backend<'_>, query: &str) -> Option<Coordinates> {
        for attempt in 1..=self.max_retries {
            match self.search(backend, query).await {
                Ok(found) => return found,
                Err(e) if attempt < self.max_retries => {
                    let delay = self.retry_delay * attempt;
                    debug!(
                        "geocoding attempt {} for '{}' failed ({}), retrying in {:?}",
                        attempt, query, e, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        "geocoding '{}' failed after {} attempts: {}",
                        query, self.max_retries, e
                    );
                }
            }
        }
        None
    }

    async fn search(
        &self,
        backend: Backend<'_>,
        query: &str,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        match backend {
            Backend::Nominatim => self.search_nominatim(query).await,
            Backend::OpenCage(key) => self.search_opencage(query, key).await,
        }
    }

    async fn search_nominatim(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.limiter.acquire().await;

        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.nominatim_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(format!(
                "geocoding backend returned {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let results = json
            .as_array()
            .ok_or_else(|| GeocodeError::InvalidResponse("expected a result array".into()))?;

        let Some(hit) = results.first() else {
            return Ok(None);
        };

        match (as_f64(hit.get("lat")), as_f64(hit.get("lon"))) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinates { lat, lon })),
            _ => Err(GeocodeError::InvalidResponse(
                "result missing lat/lon".into(),
            )),
        }
    }

    async fn search_opencage(
        &self,
        query: &str,
        api_key: &str,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        self.limiter.acquire().await;

        let url = format!(
            "{}?q={}&key={}&limit=1",
            self.opencage_url.trim_end_matches('/'),
            urlencoding::encode(query),
            api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(format!(
                "geocoding backend returned {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let results = json
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| GeocodeError::InvalidResponse("missing results array".into()))?;

        let Some(hit) = results.first() else {
            return Ok(None);
        };
        let geometry = hit
            .get("geometry")
            .ok_or_else(|| GeocodeError::InvalidResponse("result missing geometry".into()))?;

        match (as_f64(geometry.get("lat")), as_f64(geometry.get("lng"))) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinates { lat, lon })),
            _ => Err(GeocodeError::InvalidResponse(
                "geometry missing lat/lng".into(),
            )),
        }
    }
}

/// Nominatim encodes coordinates as strings, OpenCage as numbers.
fn as_f64(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
