// SPDX-License-Identifier: Apache-2.0
use std::thread;
use std::time::Duration;

use mailgate::rate_limit::{RateLimitConfig, RecipientRateLimiter, SendRateLimiter};

#[test]
fn test_recipient_cooldown() {
    let config = RateLimitConfig {
        send_rate_limit: 30,
        recipient_cooldown: 2, // short cooldown for testing (2 seconds)
        enabled: true,
    };

    let limiter = RecipientRateLimiter::new(&config);
    let recipient = "customer@example.com";

    // First send should be allowed
    assert!(limiter.check_recipient(recipient).is_none());

    // Second immediate send should be rate limited
    let cooldown = limiter.check_recipient(recipient);
    assert!(cooldown.is_some());

    // A different recipient is unaffected
    assert!(limiter.check_recipient("other@example.com").is_none());

    // Wait for cooldown to expire
    thread::sleep(Duration::from_secs(3));

    // Should be allowed again
    assert!(limiter.check_recipient(recipient).is_none());
}

#[test]
fn test_send_rate_limiter() {
    let config = RateLimitConfig {
        send_rate_limit: 3, // only allow 3 requests per window
        recipient_cooldown: 60,
        enabled: true,
    };

    let limiter = SendRateLimiter::new(&config);
    let test_ip = "192.168.1.1";

    // First three requests should be allowed
    assert!(limiter.check_ip(test_ip));
    assert!(limiter.check_ip(test_ip));
    assert!(limiter.check_ip(test_ip));

    // Fourth request should be blocked
    assert!(!limiter.check_ip(test_ip));

    // Different IP should still be allowed
    assert!(limiter.check_ip("192.168.1.2"));
}

#[test]
fn test_rate_limiting_disabled() {
    let config = RateLimitConfig {
        send_rate_limit: 1,
        recipient_cooldown: 300,
        enabled: false,
    };

    let send_limiter = SendRateLimiter::new(&config);
    let recipient_limiter = RecipientRateLimiter::new(&config);

    // Even excessive attempts should be allowed when disabled
    for _ in 0..10 {
        assert!(send_limiter.check_ip("192.168.1.1"));
        assert!(recipient_limiter.check_recipient("customer@example.com").is_none());
    }
}
