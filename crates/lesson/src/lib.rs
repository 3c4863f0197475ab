// Lesson layer: dialogue content and the pure views driven by playback

pub mod dialogue;
pub mod highlight;
pub mod speech;
pub mod stage;
pub mod store;
pub mod waveform;

pub use dialogue::{Dialogue, DialogueLine};
pub use highlight::{active_line, progress_percent, LineTimeline, LINE_SEPARATOR_ALLOWANCE};
pub use speech::{load_speech, SpeechCache};
pub use stage::{LearningStep, VisibilityMode};
pub use store::{LessonProgress, MemoryStore, SessionStore};
pub use waveform::{compute_peaks, render, Peak, WaveformBar};
