// Transport contract shared by the engine and its hosts

use crate::callback::{EndedCallback, ProgressCallback};
use crate::error::Result;
use crate::state::{PlaybackStatus, PlayerState};

/// Core transport trait
/// Operations on a player without a loaded buffer are silent no-ops
pub trait AudioTransport: Send {
    /// Decode raw s16le PCM and make it the current buffer, position 0
    fn load(&mut self, pcm: &[u8]) -> Result<()>;

    /// Start or resume playback from the current offset
    fn play(
        &mut self,
        on_progress: Option<ProgressCallback>,
        on_ended: Option<EndedCallback>,
        looping: bool,
    ) -> Result<()>;

    /// Freeze the position and halt output
    fn pause(&mut self);

    /// Halt output and reset the position to 0
    fn stop(&mut self);

    /// Move to `seconds`, restarting output if it was playing
    fn seek(&mut self, seconds: f64) -> Result<()>;

    /// Set playback rate/speed (1.0 = normal speed)
    fn set_rate(&mut self, rate: f32) -> Result<()>;

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Loaded buffer duration in seconds, 0 when nothing is loaded
    fn duration(&self) -> f64;

    fn state(&self) -> PlayerState;

    fn status(&self) -> PlaybackStatus;

    /// Release all resources; later calls have no observable effect
    fn release(&mut self);
}
