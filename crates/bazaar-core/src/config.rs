// ── Console configuration ──
//
// Everything the console needs to reach the API. Built by the
// config crate from a profile, or directly in tests.

use std::time::Duration;

use bazaar_api::{ApiAreas, TlsMode, TransportConfig};
use url::Url;

use crate::store::CacheConfig;

/// Connection and cache settings for one back-office [`Console`](crate::Console).
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API root, e.g. `https://api.example.com`.
    pub api_url: Url,
    pub areas: ApiAreas,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    pub cache: CacheConfig,
}

impl ConsoleConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            areas: ApiAreas::default(),
            tls: TlsMode::System,
            timeout: TransportConfig::default().timeout,
            cache: CacheConfig::default(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            ..TransportConfig::default()
        }
        .with_timeout(self.timeout)
    }
}
