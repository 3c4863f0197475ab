// Error handling for the audio engine and its service boundaries

use std::fmt;

/// Failures reported by an external service (speech synthesis, assessment)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service refused the request because of its rate limit
    RateLimited,

    /// The service answered with a non-success status
    Status { code: u16, message: String },

    /// The request never reached the service or the connection dropped
    Network(String),

    /// The service answered, but the payload was unusable
    InvalidResponse(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::RateLimited => write!(f, "rate limited"),
            ServiceError::Status { code, message } => write!(f, "status {}: {}", code, message),
            ServiceError::Network(msg) => write!(f, "network: {}", msg),
            ServiceError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Audio engine error types
#[derive(Debug, Clone)]
pub enum AudioError {
    /// Failed to initialize an output context or stream
    InitializationError(String),

    /// Audio could not be loaded
    LoadError(String),

    /// Playback error
    PlaybackError(String),

    /// Operation not valid in the current state
    InvalidState(String),

    /// Audio format not supported
    UnsupportedFormat(String),

    /// Output device missing, blocked or failed to resume
    DeviceError(String),

    /// Thread/synchronization error
    ThreadError(String),

    /// External service failure, kept intact for the caller
    Service(ServiceError),

    /// Generic error
    Other(String),
}

impl AudioError {
    /// True when the underlying cause is a service rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AudioError::Service(ServiceError::RateLimited))
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AudioError::InitializationError(msg) => write!(f, "Initialization error: {}", msg),
            AudioError::LoadError(msg) => write!(f, "Load error: {}", msg),
            AudioError::PlaybackError(msg) => write!(f, "Playback error: {}", msg),
            AudioError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            AudioError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            AudioError::DeviceError(msg) => write!(f, "Device error: {}", msg),
            AudioError::ThreadError(msg) => write!(f, "Thread error: {}", msg),
            AudioError::Service(err) => write!(f, "Service error: {}", err),
            AudioError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Service(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

// Conversion implementations
impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Other(format!("IO error: {}", err))
    }
}

impl From<ServiceError> for AudioError {
    fn from(err: ServiceError) -> Self {
        AudioError::Service(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_distinguishable() {
        let err: AudioError = ServiceError::RateLimited.into();
        assert!(err.is_rate_limited());
        assert!(!AudioError::LoadError("x".into()).is_rate_limited());
    }

    #[test]
    fn test_display() {
        let err = AudioError::Service(ServiceError::Status {
            code: 503,
            message: "busy".into(),
        });
        assert_eq!(err.to_string(), "Service error: status 503: busy");
        assert_eq!(
            AudioError::DeviceError("no output".into()).to_string(),
            "Device error: no output"
        );
    }
}
