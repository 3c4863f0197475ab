// Core types and traits for the Lingo audio engine

pub mod callback;
pub mod error;
pub mod player;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use callback::{EndedCallback, PlaybackCallbacks, ProgressCallback, ThrottledProgress};
pub use error::{AudioError, Result, ServiceError};
pub use player::AudioTransport;
pub use service::{Assessment, RecitationAssessor, SpeechSynthesizer};
pub use state::{PlaybackStatus, PlayerState};

/// Sample rate of every PCM payload exchanged with the synthesis boundary
pub const PCM_SAMPLE_RATE: u32 = 24_000;
