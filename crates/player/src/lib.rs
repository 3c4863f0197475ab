// PCM transport engine: player, progress polling and the owning session

mod player;
mod poll;
mod session;

pub use player::{PcmPlayer, PlayerConfig};
pub use poll::{PollControl, PollMode, PollTask, DEFAULT_POLL_INTERVAL};
pub use session::{Session, SessionConfig};
