use std::{
    env,
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Limits how many games each client may create per window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    games_per_window: u32,
    window: Duration,
    clients: Arc<DashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(games_per_window: u32, window: Duration) -> Self {
        Self {
            games_per_window,
            window,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// One-minute windows sized by `RATE_LIMIT_GAMES_PER_MINUTE` (default 10).
    pub fn from_env() -> Self {
        let games_per_minute = env::var("RATE_LIMIT_GAMES_PER_MINUTE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(10);
        debug!("Rate limit: {} games per minute", games_per_minute);
        Self::new(games_per_minute, Duration::from_secs(60))
    }

    pub fn games_per_window(&self) -> u32 {
        self.games_per_window
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Records one game creation for `ip`, or rejects it once the client
    /// has used up its current window.
    #[instrument(level = "trace", skip(self))]
    pub fn check(&self, ip: IpAddr) -> Result<(), Status> {
        let now = Instant::now();
        let mut window = self.clients.entry(ip).or_insert(Window {
            started: now,
            used: 0,
        });

        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                used: 0,
            };
        }

        if window.used < self.games_per_window {
            window.used += 1;
            debug!(
                "Rate limit check passed for {} ({}/{})",
                ip, window.used, self.games_per_window
            );
            Ok(())
        } else {
            warn!("Rate limit exceeded for {} - rejecting request", ip);
            Err(Status::TooManyRequests)
        }
    }

    /// Forgets clients whose window has run out; they would start from a
    /// fresh budget anyway. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let mut pruned = 0;
        self.clients.retain(|_, window| {
            let keep = window.started.elapsed() < self.window;
            if !keep {
                pruned += 1;
            }
            keep
        });
        pruned
    }
}

/// Reverse proxies whose forwarding headers are believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Vec<IpAddr>);

fn parse_proxies(value: &str) -> Vec<IpAddr> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!("Ignoring invalid trusted proxy address {:?}", entry);
                None
            }
        })
        .collect()
}

impl TrustedProxies {
    pub fn new(proxies: Vec<IpAddr>) -> Self {
        Self(proxies)
    }

    /// Comma separated addresses from `TRUSTED_PROXIES`; none by default.
    pub fn from_env() -> Self {
        let proxies = env::var("TRUSTED_PROXIES")
            .map(|value| parse_proxies(&value))
            .unwrap_or_default();
        if !proxies.is_empty() {
            debug!("Trusting forwarding headers from {:?}", proxies);
        }
        Self(proxies)
    }

    fn trusts(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// The peer address, unless the peer is a trusted proxy. Then the nearest
/// untrusted hop of `X-Forwarded-For` is used, falling back to `X-Real-IP`.
fn resolve_client_ip(
    peer: Option<IpAddr>,
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    trusted: &TrustedProxies,
) -> IpAddr {
    let peer = peer.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    if !trusted.trusts(&peer) {
        return peer;
    }

    forwarded_for
        .into_iter()
        .flat_map(|header| header.rsplit(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .find(|hop| !trusted.trusts(hop))
        .or_else(|| real_ip.and_then(|ip| ip.trim().parse().ok()))
        .unwrap_or(peer)
}

/// Address of the caller.
pub struct ClientIp(pub IpAddr);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let untrusted = TrustedProxies::default();
        let trusted = req.rocket().state::<TrustedProxies>().unwrap_or(&untrusted);

        let ip = resolve_client_ip(
            req.remote().map(|addr| addr.ip()),
            req.headers().get_one("X-Forwarded-For"),
            req.headers().get_one("X-Real-IP"),
            trusted,
        );

        request::Outcome::Success(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    #[test]
    fn window_runs_dry_after_budget() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let client = ip("10.0.0.1");

        for _ in 0..3 {
            assert!(limiter.check(client).is_ok());
        }
        assert_eq!(limiter.check(client), Err(Status::TooManyRequests));
    }

    #[test]
    fn budget_returns_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        let client = ip("10.0.0.1");
        assert!(limiter.check(client).is_ok());
        assert!(limiter.check(client).is_err());

        std::thread::sleep(Duration::from_millis(25));

        assert!(limiter.check(client).is_ok());
    }

    #[test]
    fn limiter_tracks_clients_separately() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let a = ip("10.0.0.1");
        let b = ip("10.0.0.2");

        assert!(limiter.check(a).is_ok());
        assert!(limiter.check(a).is_ok());

        assert_eq!(limiter.check(a), Err(Status::TooManyRequests));
        assert!(limiter.check(b).is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn prune_forgets_expired_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        limiter.check(ip("10.0.0.1")).unwrap();
        limiter.check(ip("10.0.0.2")).unwrap();
        assert_eq!(limiter.prune(), 0);

        std::thread::sleep(Duration::from_millis(25));
        limiter.check(ip("10.0.0.3")).unwrap();

        assert_eq!(limiter.prune(), 2);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn headers_from_untrusted_peers_are_ignored() {
        let peer = Some(ip("203.0.113.7"));

        assert_eq!(
            resolve_client_ip(
                peer,
                Some("10.9.9.9"),
                Some("10.8.8.8"),
                &TrustedProxies::default()
            ),
            ip("203.0.113.7")
        );
    }

    #[test]
    fn trusted_proxy_forwards_nearest_untrusted_hop() {
        let trusted = TrustedProxies::new(vec![ip("127.0.0.1"), ip("10.0.0.254")]);

        assert_eq!(
            resolve_client_ip(
                Some(ip("127.0.0.1")),
                Some("1.2.3.4, 198.51.100.20, 10.0.0.254"),
                None,
                &trusted
            ),
            ip("198.51.100.20")
        );
        assert_eq!(
            resolve_client_ip(Some(ip("127.0.0.1")), None, Some("198.51.100.9"), &trusted),
            ip("198.51.100.9")
        );
        assert_eq!(
            resolve_client_ip(Some(ip("127.0.0.1")), Some("garbage"), None, &trusted),
            ip("127.0.0.1")
        );
    }

    #[test]
    fn missing_peer_counts_as_localhost() {
        assert_eq!(
            resolve_client_ip(None, Some("10.9.9.9"), None, &TrustedProxies::default()),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn proxy_list_skips_blank_and_invalid_entries() {
        assert_eq!(
            parse_proxies(" 10.0.0.1, ,not-an-ip,::1"),
            vec![ip("10.0.0.1"), ip("::1")]
        );
    }
}
