use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

// FBRef bans aggressive crawlers, so stay well under their documented
// limits. The bootstrap API and the archive tolerate far more than this.
const REQ_PER_SEC: NonZeroU32 = nonzero!(2u32);
const MS_BETWEEN_REQ: Duration = Duration::from_millis(500);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
    ms_between_req: SpecificGovernorRateLimiter,
}

impl RateLimiter {
    pub fn new() -> Self {
        // Limit to X total req/sec on average.
        let req_per_sec = GovernorRateLimiter::direct(Quota::per_second(REQ_PER_SEC));

        // No two requests closer together than Y ms.
        let ms_between_req =
            GovernorRateLimiter::direct(Quota::with_period(MS_BETWEEN_REQ).unwrap());

        RateLimiter {
            req_per_sec,
            ms_between_req,
        }
    }

    pub async fn wait_until_ready(&self) {
        // Await the average cap first: callers that clear it still queue up
        // behind the spacing limiter, which releases one caller per period.
        self.req_per_sec.until_ready().await;
        self.ms_between_req.until_ready().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
