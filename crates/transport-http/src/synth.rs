// Speech synthesis over HTTP
// POSTs the text as a form and expects raw s16le mono PCM back

use crate::client::{classify_error, create_http_agent, retry_rate_limited, HttpTimeouts, RetryPolicy};
use lingo_core::{ServiceError, SpeechSynthesizer, PCM_SAMPLE_RATE};
use std::io::Read;

/// Upper bound on a synthesized payload (about ten minutes at 24 kHz)
const MAX_PCM_BYTES: u64 = 10 * 60 * PCM_SAMPLE_RATE as u64 * 2;

#[derive(Debug, Clone)]
pub struct HttpSynthConfig {
    pub endpoint: String,
    pub voice: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
    pub timeouts: HttpTimeouts,
}

impl HttpSynthConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            voice: "default".to_string(),
            api_key: None,
            retry: RetryPolicy::default(),
            timeouts: HttpTimeouts::default(),
        }
    }
}

pub struct HttpSynthesizer {
    agent: ureq::Agent,
    config: HttpSynthConfig,
}

impl HttpSynthesizer {
    pub fn new(config: HttpSynthConfig) -> Self {
        log::info!("HTTP synthesizer for {} (voice={})", config.endpoint, config.voice);
        Self {
            agent: create_http_agent(config.timeouts),
            config,
        }
    }

    pub fn config(&self) -> &HttpSynthConfig {
        &self.config
    }

    fn request_once(&self, text: &str) -> Result<Vec<u8>, ServiceError> {
        let sample_rate = PCM_SAMPLE_RATE.to_string();
        let mut request = self
            .agent
            .post(&self.config.endpoint)
            .set("Accept", "audio/pcm, application/octet-stream");
        if let Some(key) = &self.config.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response = request
            .send_form(&[
                ("text", text),
                ("voice", self.config.voice.as_str()),
                ("format", "s16le"),
                ("sample_rate", sample_rate.as_str()),
            ])
            .map_err(classify_error)?;

        let mut pcm = Vec::new();
        response
            .into_reader()
            .take(MAX_PCM_BYTES)
            .read_to_end(&mut pcm)
            .map_err(|e| ServiceError::Network(format!("Failed to read audio: {}", e)))?;

        if pcm.is_empty() {
            return Err(ServiceError::InvalidResponse("Empty audio payload".to_string()));
        }
        Ok(pcm)
    }
}

impl SpeechSynthesizer for HttpSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidResponse("Nothing to synthesize".to_string()));
        }

        let pcm = retry_rate_limited(&self.config.retry, || self.request_once(text))?;
        log::debug!("Synthesized {} bytes of PCM", pcm.len());
        Ok(pcm)
    }
}
