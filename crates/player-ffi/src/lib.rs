// FFI bridge for Lingo Audio
// C ABI over one process-wide session and its players

use lingo_core::{
    AudioError, AudioTransport, EndedCallback, PlayerState, ProgressCallback, Result,
    ThrottledProgress,
};
use lingo_player::{PcmPlayer, Session};
use lingo_renderer_cpal::CpalFactory;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::os::raw::c_void;
use std::sync::{Arc, Once};

/// Progress callback: `(user_data, current_secs, duration_secs)`
///
/// Runs on the progress thread. It must not call back into the same player;
/// hand the event to the host's own thread instead.
pub type LingoProgressCallback = extern "C" fn(*mut c_void, f64, f64);

/// Invoked once when non-looping playback reaches its end
pub type LingoEndedCallback = extern "C" fn(*mut c_void);

/// Host pointer passed back to callbacks untouched
struct UserData(*mut c_void);

// The host guarantees the pointer stays valid and usable from any thread
// until the player is released or play is called again
unsafe impl Send for UserData {}

impl UserData {
    fn ptr(&self) -> *mut c_void {
        self.0
    }
}

type SharedPlayer = Arc<Mutex<PcmPlayer>>;

static SESSION: Lazy<Session> = Lazy::new(|| Session::new(Arc::new(CpalFactory)));
static PLAYER_REGISTRY: Lazy<Mutex<HashMap<i64, SharedPlayer>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_PLAYER_ID: Lazy<Mutex<i64>> = Lazy::new(|| Mutex::new(1));
static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}

fn register_player(player: PcmPlayer) -> i64 {
    let mut next = NEXT_PLAYER_ID.lock();
    let id = *next;
    *next += 1;
    drop(next);

    PLAYER_REGISTRY
        .lock()
        .insert(id, Arc::new(Mutex::new(player)));
    id
}

/// Look up a player without keeping the registry locked
fn lookup(id: i64) -> Result<SharedPlayer> {
    PLAYER_REGISTRY
        .lock()
        .get(&id)
        .cloned()
        .ok_or_else(|| AudioError::InvalidState(format!("Invalid player ID: {}", id)))
}

fn with_player_mut<R>(id: i64, f: impl FnOnce(&mut PcmPlayer) -> Result<R>) -> Result<R> {
    let player = lookup(id)?;
    let mut player = player.lock();
    f(&mut player)
}

fn with_player<R>(id: i64, f: impl FnOnce(&PcmPlayer) -> R) -> Result<R> {
    let player = lookup(id)?;
    let player = player.lock();
    Ok(f(&player))
}

fn to_code(result: Result<()>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            log::error!("FFI error: {}", err);
            -1
        }
    }
}

fn state_code(state: PlayerState) -> i32 {
    match state {
        PlayerState::Idle => 0,
        PlayerState::Loaded => 1,
        PlayerState::Playing => 2,
        PlayerState::Paused => 3,
        PlayerState::Stopped => 4,
    }
}

fn progress_callback(
    callback: Option<LingoProgressCallback>,
    user_data: UserData,
    interval_ms: u32,
) -> Option<ProgressCallback> {
    let callback = callback?;
    let forward: ProgressCallback =
        Box::new(move |current, duration| callback(user_data.ptr(), current, duration));
    if interval_ms == 0 {
        Some(forward)
    } else {
        Some(ThrottledProgress::new(forward, interval_ms as u64).into_callback())
    }
}

fn ended_callback(
    callback: Option<LingoEndedCallback>,
    user_data: UserData,
) -> Option<EndedCallback> {
    let callback = callback?;
    Some(Box::new(move || callback(user_data.ptr())))
}

// -------------------------------
// C ABI
// -------------------------------

/// Create a player on the shared output context; returns its id or -1
#[no_mangle]
pub extern "C" fn lingo_player_create() -> i64 {
    init_logging();
    match SESSION.create_player() {
        Ok(player) => register_player(player),
        Err(err) => {
            log::error!("Failed to create player: {}", err);
            -1
        }
    }
}

/// Load s16le mono PCM at 24 kHz
#[no_mangle]
pub extern "C" fn lingo_player_load_pcm(player_id: i64, data: *const u8, len: usize) -> i32 {
    if data.is_null() && len > 0 {
        return -1;
    }
    let pcm: &[u8] = if len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };
    to_code(with_player_mut(player_id, |p| p.load(pcm)))
}

/// Start playback. `progress_interval_ms` of 0 reports every poll
#[no_mangle]
pub extern "C" fn lingo_player_play(
    player_id: i64,
    looping: bool,
    on_progress: Option<LingoProgressCallback>,
    on_ended: Option<LingoEndedCallback>,
    user_data: *mut c_void,
    progress_interval_ms: u32,
) -> i32 {
    let progress = progress_callback(on_progress, UserData(user_data), progress_interval_ms);
    let ended = ended_callback(on_ended, UserData(user_data));
    to_code(with_player_mut(player_id, |p| p.play(progress, ended, looping)))
}

#[no_mangle]
pub extern "C" fn lingo_player_pause(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| {
        p.pause();
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn lingo_player_stop(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| {
        p.stop();
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn lingo_player_seek(player_id: i64, seconds: f64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.seek(seconds)))
}

#[no_mangle]
pub extern "C" fn lingo_player_set_rate(player_id: i64, rate: f32) -> i32 {
    to_code(with_player_mut(player_id, |p| p.set_rate(rate)))
}

/// Position in seconds, -1 for an unknown player
#[no_mangle]
pub extern "C" fn lingo_player_current_time(player_id: i64) -> f64 {
    match with_player(player_id, |p| p.current_time()) {
        Ok(time) => time,
        Err(err) => {
            log::error!("Failed to get position: {}", err);
            -1.0
        }
    }
}

#[no_mangle]
pub extern "C" fn lingo_player_duration(player_id: i64) -> f64 {
    match with_player(player_id, |p| p.duration()) {
        Ok(duration) => duration,
        Err(err) => {
            log::error!("Failed to get duration: {}", err);
            -1.0
        }
    }
}

/// 0 idle, 1 loaded, 2 playing, 3 paused, 4 stopped, -1 unknown player
#[no_mangle]
pub extern "C" fn lingo_player_state(player_id: i64) -> i32 {
    match with_player(player_id, |p| p.state()) {
        Ok(state) => state_code(state),
        Err(err) => {
            log::error!("Failed to get state: {}", err);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn lingo_player_release(player_id: i64) -> i32 {
    let removed = PLAYER_REGISTRY.lock().remove(&player_id);
    match removed {
        Some(player) => {
            player.lock().release();
            0
        }
        None => -1,
    }
}
