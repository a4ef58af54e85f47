use std::{env, time::Duration};

use tokio::time;
use tracing::{debug, info};

use crate::{rate_limit::RateLimiter, registry::Registry};

fn env_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Periodically evicts expired sessions and forgets idle rate-limit windows.
pub async fn start_cleanup_task(registry: Registry, rate_limiter: RateLimiter) {
    let cleanup_interval_secs = env_secs("CLEANUP_INTERVAL_SECONDS", 60);
    let inactive_timeout_secs = env_secs("INACTIVE_GAME_TIMEOUT_SECONDS", 600);
    let max_age_secs = env_secs("MAX_GAME_AGE_SECONDS", 86400);

    let mut interval = time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));

    info!(
        "Started game cleanup task: checking every {}s, inactive timeout: {}s, max age: {}s",
        cleanup_interval_secs, inactive_timeout_secs, max_age_secs
    );

    loop {
        interval.tick().await;
        let removed = registry.cleanup(
            Duration::from_secs(inactive_timeout_secs),
            Duration::from_secs(max_age_secs),
        );

        if removed > 0 {
            info!(
                "Cleaned up {} expired games, {} remaining",
                removed,
                registry.len()
            );
        }

        let pruned = rate_limiter.prune();
        if pruned > 0 {
            debug!(
                "Forgot {} idle rate limit windows, {} still tracked",
                pruned,
                rate_limiter.tracked_clients()
            );
        }
    }
}
