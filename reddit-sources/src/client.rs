use brandscope_core::SourceError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Browser-like user agent. Reddit's public endpoints reject obvious bot
/// agents far more aggressively than browser ones.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_client(user_agent: &str) -> Client {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client")
}

/// Map a non-success HTTP response onto the source error taxonomy.
/// 403 is an IP-level block, distinguishable from transient failures so the
/// orchestrator can stop retrying the source within the run.
pub fn error_from_response(response: &Response, resource: &str) -> SourceError {
    let status = response.status();
    match status.as_u16() {
        403 => SourceError::Blocked {
            resource: resource.to_string(),
        },
        429 => SourceError::RateLimited {
            retry_after: retry_after_seconds(response).unwrap_or(60),
        },
        code => SourceError::Unavailable {
            reason: format!("{resource} returned HTTP {code}"),
        },
    }
}

/// Map a transport-level failure. Timeouts are transient.
pub fn error_from_transport(err: reqwest::Error, resource: &str) -> SourceError {
    let reason = if err.is_timeout() {
        format!("{resource} request timed out")
    } else {
        format!("{resource}: {err}")
    };
    SourceError::Unavailable { reason }
}

fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
