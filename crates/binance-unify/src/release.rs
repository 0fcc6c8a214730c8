//! Latest-release lookup with a time-bounded cache.
//!
//! Checks the project's GitHub releases feed so operators can tell whether a
//! newer engine is available. Lookups degrade rather than fail: any fetch
//! problem yields the `"unknown"` sentinel and is retried on the next call,
//! while successful answers are cached for an hour.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ReleaseError;
use crate::record::SCHEMA_VERSION;

/// GitHub API endpoint for this project's newest published release.
const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/ccheney/binance-unify/releases/latest";

/// Version string reported when the latest release cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// How long a successful lookup stays valid, in seconds.
const CACHE_TTL_SECS: i64 = 3600;

/// Release metadata as returned by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    /// The release tag, e.g. `"0.16.0"`.
    pub tag_name: String,
}

/// Source of latest-release metadata.
#[async_trait]
pub trait ReleaseFetcher: Send + Sync {
    /// Fetch the newest published release.
    async fn latest_release(&self) -> Result<ReleaseInfo, ReleaseError>;
}

/// Fetches release metadata from the GitHub releases API.
#[derive(Debug, Clone, Default)]
pub struct GithubReleaseFetcher {
    client: reqwest::Client,
}

impl GithubReleaseFetcher {
    /// Build a fetcher with its own HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReleaseFetcher for GithubReleaseFetcher {
    async fn latest_release(&self) -> Result<ReleaseInfo, ReleaseError> {
        // GitHub rejects requests without a User-Agent.
        let response = self
            .client
            .get(LATEST_RELEASE_URL)
            .header(reqwest::header::USER_AGENT, "binance-unify")
            .send()
            .await?
            .error_for_status()?;
        let info: ReleaseInfo = response.json().await?;
        if info.tag_name.is_empty() {
            return Err(ReleaseError::MissingTag);
        }
        Ok(info)
    }
}

/// Time source, injectable for tests.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    version: String,
    fetched_at: DateTime<Utc>,
}

/// Caching view over a [`ReleaseFetcher`].
pub struct ReleaseMonitor<F, C = SystemClock> {
    fetcher: F,
    clock: C,
    cache: Mutex<Option<CacheEntry>>,
}

impl<F: ReleaseFetcher> ReleaseMonitor<F> {
    /// Build a monitor over `fetcher` using the wall clock.
    pub fn new(fetcher: F) -> Self {
        Self::with_clock(fetcher, SystemClock)
    }
}

impl<F: ReleaseFetcher, C: Clock> ReleaseMonitor<F, C> {
    /// Build a monitor with an explicit time source.
    pub fn with_clock(fetcher: F, clock: C) -> Self {
        Self {
            fetcher,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// The latest released version, or [`UNKNOWN_VERSION`] when the lookup
    /// fails. Failures are not cached; the next call retries.
    pub async fn latest_version(&self) -> String {
        let now = self.clock.now();
        {
            let cache = self.cache.lock();
            if let Some(entry) = cache.as_ref() {
                if (now - entry.fetched_at).num_seconds() < CACHE_TTL_SECS {
                    return entry.version.clone();
                }
            }
        }

        match self.fetcher.latest_release().await {
            Ok(info) => {
                debug!(version = %info.tag_name, "fetched latest release");
                let mut cache = self.cache.lock();
                *cache = Some(CacheEntry {
                    version: info.tag_name.clone(),
                    fetched_at: now,
                });
                info.tag_name
            }
            Err(error) => {
                warn!(%error, "latest release lookup failed");
                UNKNOWN_VERSION.to_owned()
            }
        }
    }

    /// Whether a release newer than the running version is published.
    ///
    /// `false` when the lookup fails; a dev-build suffix on the running
    /// version is ignored for the comparison.
    pub async fn is_update_available(&self) -> bool {
        let latest = self.latest_version().await;
        if latest == UNKNOWN_VERSION {
            return false;
        }
        let running = SCHEMA_VERSION.trim_end_matches(".dev");
        latest != running
    }
}
