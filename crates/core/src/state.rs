// Player state as seen from outside the transport engine

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No buffer loaded
    Idle,
    /// Buffer loaded, positioned at the start
    Loaded,
    /// A source is rendering
    Playing,
    /// Halted with a frozen, resumable offset
    Paused,
    /// Explicitly reset to the start; the buffer stays loaded
    Stopped,
}

impl PlayerState {
    /// Whether a buffer is available to play
    pub fn has_buffer(self) -> bool {
        !matches!(self, PlayerState::Idle)
    }

    /// Checks a transition against the transport state machine
    pub fn can_transition_to(self, to: PlayerState) -> bool {
        use PlayerState::*;

        match (self, to) {
            // Loading is allowed from anywhere, including mid-playback
            (_, Loaded) => true,
            // Release
            (_, Idle) => true,

            (Loaded, Playing) | (Paused, Playing) | (Stopped, Playing) => true,
            // Seek while playing restarts the span
            (Playing, Playing) => true,

            (Playing, Paused) => true,
            // Seek while paused keeps the paused state
            (Paused, Paused) => true,
            (Loaded, Paused) | (Stopped, Paused) => true,

            (Playing, Stopped) | (Paused, Stopped) | (Loaded, Stopped) | (Stopped, Stopped) => true,

            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Loaded => "loaded",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
        }
    }
}

/// Snapshot of the transport for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlayerState,
    /// Current playback position in seconds
    pub position_secs: f64,
    /// Loaded buffer duration in seconds
    pub duration_secs: f64,
    pub playback_rate: f32,
    pub looping: bool,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            position_secs: 0.0,
            duration_secs: 0.0,
            playback_rate: 1.0,
            looping: false,
        }
    }
}

impl PlaybackStatus {
    /// Position as a percentage of the duration, 0 when nothing is loaded
    pub fn progress_percent(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        (self.position_secs / self.duration_secs * 100.0).clamp(0.0, 100.0)
    }
}
