// External service boundaries consumed by the lesson layer

use crate::error::ServiceError;

/// Turns text into raw s16le mono PCM at `PCM_SAMPLE_RATE`
/// Implementations own their retry policy; the engine never retries
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, ServiceError>;
}

/// Structured feedback on a recorded recitation attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    /// 0 - 100
    pub score: u8,
    pub transcription: String,
    pub pronunciation_analysis: String,
    pub intonation_analysis: String,
    pub tips: Vec<String>,
}

/// Transcribes and scores a learner's recording against the reference text
pub trait RecitationAssessor: Send + Sync {
    fn assess(
        &self,
        recording: &[u8],
        reference_text: &str,
    ) -> std::result::Result<Assessment, ServiceError>;
}
