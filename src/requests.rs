use std::time::Duration;

use anyhow::bail;
use log::warn;
use reqwest::{Client, ClientBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;

use crate::ratelimit::RateLimiter;

/// How many times a single GET is retried after a 429 before giving up.
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 5;
/// Ceiling on an honored Retry-After; a broken or hostile header must not
/// park a job for hours.
const MAX_RETRY_AFTER_SECS: u64 = 120;

// FBRef serves an error page to the reqwest default agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = ClientBuilder::new().user_agent(USER_AGENT).build()?;
        let rate_limiter = RateLimiter::new();
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// GET a URL, pacing ourselves with the rate limiter and retrying a
    /// bounded number of times when the server answers 429.
    pub async fn fetch_url_response(&self, url: &str) -> anyhow::Result<Response> {
        let mut attempt = 0u32;
        loop {
            // Wait (non-blocking) until we're allowed to make a request
            // according to our self-imposed rate-limiting policy.
            self.rate_limiter.wait_until_ready().await;

            let response = self.client.get(url).send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            let Some(delay) = next_retry(attempt, retry_after_secs(&response)) else {
                bail!("still rate limited after {MAX_RETRIES} retries: {url}");
            };
            warn!(
                "429 from {url}, backing off for {}s (attempt {})",
                delay.as_secs(),
                attempt + 1
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn fetch_url_body(&self, url: &str) -> anyhow::Result<String> {
        let response = self.fetch_url_response(url).await?;
        ensure_success(&response, url)?;
        let body = response.text().await?;
        Ok(body)
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let response = self.fetch_url_response(url).await?;
        ensure_success(&response, url)?;
        let decoded = response.json::<T>().await?;
        Ok(decoded)
    }
}

fn ensure_success(response: &Response, url: &str) -> anyhow::Result<()> {
    if !response.status().is_success() {
        bail!("request to {url} failed with status {}", response.status());
    }
    Ok(())
}

/// Delta-seconds form only. The HTTP-date form is rare enough on the sites
/// we scrape that falling back to exponential backoff is fine.
fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// The whole retry policy for one 429: how long to wait before attempt
/// `attempt + 1`, or `None` once the retry budget is spent.
fn next_retry(attempt: u32, retry_after: Option<u64>) -> Option<Duration> {
    if attempt >= MAX_RETRIES {
        return None;
    }
    Some(retry_delay(attempt, retry_after))
}

/// Server-provided delay wins, clamped to [`MAX_RETRY_AFTER_SECS`];
/// otherwise back off exponentially from [`BACKOFF_BASE_SECS`].
fn retry_delay(attempt: u32, retry_after: Option<u64>) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)),
        None => Duration::from_secs(BACKOFF_BASE_SECS << attempt),
    }
}
