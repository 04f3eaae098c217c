use std::time::Duration;

use bon::Builder;

use crate::session::{DiscoveryPolicy, TrendCodes};

/// Settings for one device session.
///
/// Timeouts are disabled unless set: a session left in `Discovering` or
/// `Connecting` otherwise waits for the transport indefinitely.
///
/// ```
/// use std::time::Duration;
///
/// let config = pipstream::SessionConfig::builder()
///     .connect_timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(Some(Duration::from_secs(10)), config.connect_timeout());
/// assert_eq!(None, config.discovery_timeout());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SessionConfig {
    #[builder(default)]
    trend_codes: TrendCodes,
    #[builder(default)]
    discovery_policy: DiscoveryPolicy,
    discovery_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionConfig {
    #[must_use]
    pub fn trend_codes(&self) -> TrendCodes {
        self.trend_codes
    }

    #[must_use]
    pub fn discovery_policy(&self) -> DiscoveryPolicy {
        self.discovery_policy
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Option<Duration> {
        self.discovery_timeout
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }
}
