// HTTP client configuration and utilities

use lingo_core::ServiceError;
use std::time::Duration;

/// Longest error body kept for diagnostics
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            // Synthesis of a long dialogue can take a while before the first byte
            read: Duration::from_secs(60),
            write: Duration::from_secs(30),
        }
    }
}

/// Create a configured HTTP agent with proper timeouts and settings
pub fn create_http_agent(timeouts: HttpTimeouts) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeouts.connect)
        .timeout_read(timeouts.read)
        .timeout_write(timeouts.write)
        .user_agent(concat!("lingo-audio/", env!("CARGO_PKG_VERSION")))
        .redirects(5)
        .build()
}

/// Map a ureq failure onto the service boundary error
pub fn classify_error(err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(429, _) => ServiceError::RateLimited,
        ureq::Error::Status(code, response) => {
            let mut message = response
                .into_string()
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            ServiceError::Status { code, message }
        }
        ureq::Error::Transport(transport) => ServiceError::Network(transport.to_string()),
    }
}

/// Backoff policy for rate-limited requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Retry a request with exponential backoff while it is rate limited
/// Any other failure is returned immediately
pub fn retry_rate_limited<T, F>(policy: &RetryPolicy, mut request: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Result<T, ServiceError>,
{
    let mut attempt = 0;
    loop {
        match request() {
            Err(ServiceError::RateLimited) if attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "Rate limited (attempt {}), retrying after {:?}",
                    attempt + 1,
                    delay
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}
