// HTTP transport for the speech-synthesis boundary

pub mod client;
pub mod synth;

pub use client::{create_http_agent, retry_rate_limited, HttpTimeouts, RetryPolicy};
pub use synth::{HttpSynthConfig, HttpSynthesizer};
