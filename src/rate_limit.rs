// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tracing::{info, warn};

/// Environment variable names for rate limiting configuration
pub const SEND_RATE_LIMIT_ENV: &str = "MAILGATE_SEND_RATE_LIMIT";
pub const RECIPIENT_COOLDOWN_ENV: &str = "MAILGATE_RECIPIENT_COOLDOWN";
pub const RATE_LIMIT_ENABLED_ENV: &str = "MAILGATE_RATE_LIMIT_ENABLED";

/// Default rate limit values
pub const DEFAULT_SEND_RATE_LIMIT: u32 = 30; // 30 send requests per minute per IP
pub const DEFAULT_RECIPIENT_COOLDOWN: u64 = 60; // 60 seconds between emails to the same recipient

/// Configuration for the gateway's rate limiting mechanisms
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    /// Number of send requests allowed per minute per client IP
    pub send_rate_limit: u32,
    /// Cooldown period in seconds between emails to the same recipient
    pub recipient_cooldown: u64,
    /// Whether rate limiting is enabled
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            send_rate_limit: DEFAULT_SEND_RATE_LIMIT,
            recipient_cooldown: DEFAULT_RECIPIENT_COOLDOWN,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Load rate limit configuration from environment variables or use defaults
    pub fn from_env() -> Self {
        let send_rate_limit = std::env::var(SEND_RATE_LIMIT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEND_RATE_LIMIT);

        let recipient_cooldown = std::env::var(RECIPIENT_COOLDOWN_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RECIPIENT_COOLDOWN);

        let enabled = std::env::var(RATE_LIMIT_ENABLED_ENV)
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        Self {
            send_rate_limit,
            recipient_cooldown,
            enabled,
        }
    }
}

/// Simple timestamp for rate limiting
#[derive(Debug, Clone, Copy)]
struct Timestamp(std::time::SystemTime);

impl Timestamp {
    fn now() -> Self {
        Timestamp(std::time::SystemTime::now())
    }

    fn elapsed(&self) -> Duration {
        self.0.elapsed().unwrap_or_else(|_| Duration::from_secs(0))
    }
}

/// Enforces a cooldown period between emails to the same recipient, so a
/// misbehaving caller cannot flood a single inbox.
pub struct RecipientRateLimiter {
    /// LRU cache that maps recipient addresses to last-send timestamps
    cache: Mutex<LruCache<String, Timestamp>>,
    /// Cooldown period between sends to the same recipient
    cooldown: Duration,
    /// Whether rate limiting is enabled
    enabled: bool,
}

impl RecipientRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let cache = Mutex::new(LruCache::new(NonZeroUsize::new(1000).unwrap()));
        let cooldown = Duration::from_secs(config.recipient_cooldown);

        Self {
            cache,
            cooldown,
            enabled: config.enabled,
        }
    }

    /// Check whether a recipient may receive an email now.
    /// Returns Some(remaining_seconds) if rate-limited, None if allowed.
    pub fn check_recipient(&self, recipient: &str) -> Option<u64> {
        if !self.enabled {
            return None;
        }

        let now = Timestamp::now();
        let mut cache = self.cache.lock().unwrap();

        if let Some(last_time) = cache.get(recipient) {
            let elapsed = last_time.elapsed();
            if elapsed < self.cooldown {
                let remaining = self.cooldown.saturating_sub(elapsed);
                return Some(remaining.as_secs());
            }
        }

        cache.put(recipient.to_string(), now);
        None
    }
}

/// Fixed-window limiter for send requests, keyed by client IP.
pub struct SendRateLimiter {
    /// Maps IP -> (count, last_reset_time)
    attempts: Mutex<HashMap<String, (u32, Timestamp)>>,
    /// Maximum requests allowed per window
    max_attempts: u32,
    /// Window length (one minute)
    period: Duration,
    /// Whether rate limiting is enabled
    enabled: bool,
}

impl SendRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts: config.send_rate_limit,
            period: Duration::from_secs(60),
            enabled: config.enabled,
        }
    }

    /// Check whether an IP address may make a send request.
    /// Returns true if allowed, false if rate-limited.
    pub fn check_ip(&self, ip: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Timestamp::now();
        let mut attempts = self.attempts.lock().unwrap();

        let entry = attempts.entry(ip.to_string()).or_insert((0, now));

        // If the window has elapsed, reset the counter
        if entry.1.elapsed() >= self.period {
            *entry = (1, now); // Reset with this attempt counted
            return true;
        }

        if entry.0 < self.max_attempts {
            entry.0 += 1;
            true
        } else {
            warn!("Rate limited send request from IP: {}", ip);
            false
        }
    }
}

/// Process-wide rate limiters, built once at startup.
pub struct RateLimiters {
    pub send_limiter: SendRateLimiter,
    pub recipient_limiter: RecipientRateLimiter,
    pub config: RateLimitConfig,
}

impl RateLimiters {
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::from_env())
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        info!("Rate limiting configuration:");
        info!("  Enabled: {}", config.enabled);
        info!(
            "  Send rate limit: {} per minute per IP",
            config.send_rate_limit
        );
        info!(
            "  Recipient cooldown: {} seconds per recipient",
            config.recipient_cooldown
        );

        let send_limiter = SendRateLimiter::new(&config);
        let recipient_limiter = RecipientRateLimiter::new(&config);

        Self {
            send_limiter,
            recipient_limiter,
            config,
        }
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new()
    }
}
