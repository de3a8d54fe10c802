use governor::{
    clock::QuantaClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};

/// A rate limiter for managing connection attempts per source IP.
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    /// The underlying rate limiter instance, shared across instances.
    limiter: Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, QuantaClock, NoOpMiddleware>>,
}

impl ConnectionRateLimiter {
    /// Creates a new `ConnectionRateLimiter` with a specified rate limit.
    ///
    /// # Panics
    ///
    /// Panics if `per_second` is zero; `ServerConfig::validate` rejects that
    /// before the limiter is built.
    pub fn new(per_second: u32) -> Self {
        let burst_size = NonZeroU32::new(per_second).expect("Rate limit must be greater than 0");

        let quota = Quota::with_period(Duration::from_secs(1))
            .expect("non-zero period")
            .allow_burst(burst_size);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Waits until a connection from the given address is allowed.
    ///
    /// Returns `true` once the request is within the rate limit policy.
    pub async fn check(&self, addr: IpAddr) -> bool {
        self.limiter.until_key_ready(&addr).await;
        true
    }
}
