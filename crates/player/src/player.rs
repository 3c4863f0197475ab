// PCM transport engine
// One decoded buffer, one source node at a time, position derived from the
// output context clock while playing

use crate::poll::{PollControl, PollMode, PollTask};
use lingo_core::{
    AudioError, AudioTransport, EndedCallback, PlaybackCallbacks, PlaybackStatus, PlayerState,
    ProgressCallback, Result,
};
use lingo_decode::AudioBuffer;
use lingo_renderer_api::{OutputContext, SourceNode, SourceParams};
use parking_lot::Mutex;
use std::sync::Arc;

/// Player configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerConfig {
    pub poll: PollMode,
}

/// Which position source is authoritative
enum Transport {
    /// Halted; `offset` is the position
    Stopped { offset: f64 },
    /// Rendering; position = offset_at_start + (clock - clock_at_start) * rate
    Playing {
        offset_at_start: f64,
        clock_at_start: f64,
        looping: bool,
        source: Box<dyn SourceNode>,
    },
}

/// Outcome of one progress poll
enum Frame {
    Progress { current: f64, duration: f64 },
    Ended,
    Idle,
}

/// State shared between the owning thread and the progress poll
struct Shared {
    buffer: Option<Arc<AudioBuffer>>,
    transport: Transport,
    rate: f32,
    state: PlayerState,
    /// Bumped whenever a play span ends; stale poll frames compare against it
    generation: u64,
    released: bool,
}

impl Shared {
    fn new() -> Self {
        Self {
            buffer: None,
            transport: Transport::Stopped { offset: 0.0 },
            rate: 1.0,
            state: PlayerState::Idle,
            generation: 0,
            released: false,
        }
    }

    fn is_playing(&self) -> bool {
        matches!(self.transport, Transport::Playing { .. })
    }

    fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, |buffer| buffer.duration())
    }

    fn looping(&self) -> bool {
        matches!(self.transport, Transport::Playing { looping: true, .. })
    }

    fn position(&self, now: f64) -> f64 {
        match &self.transport {
            Transport::Stopped { offset } => *offset,
            Transport::Playing {
                offset_at_start,
                clock_at_start,
                looping,
                ..
            } => {
                let raw = offset_at_start + (now - clock_at_start).max(0.0) * self.rate as f64;
                let duration = self.duration();
                if *looping && duration > 0.0 {
                    raw.rem_euclid(duration)
                } else {
                    raw.min(duration)
                }
            }
        }
    }

    /// Stop any active source and park the transport at `offset`
    /// Returns the loop flag of the span that was playing, if any
    fn halt(&mut self, offset: f64) -> Option<bool> {
        let previous = std::mem::replace(&mut self.transport, Transport::Stopped { offset });
        match previous {
            Transport::Playing { source, looping, .. } => {
                source.stop();
                self.generation += 1;
                Some(looping)
            }
            Transport::Stopped { .. } => None,
        }
    }

    fn set_state(&mut self, new_state: PlayerState) {
        if self.state == new_state {
            return;
        }
        if !self.state.can_transition_to(new_state) {
            log::warn!("Unexpected transition from {:?} to {:?}", self.state, new_state);
        }
        log::debug!("Player state changed to: {:?}", new_state);
        self.state = new_state;
    }

    fn frame(&mut self, now: f64, generation: u64) -> Frame {
        if self.generation != generation {
            return Frame::Idle;
        }

        let ended = match &self.transport {
            Transport::Playing { source, looping, .. } => !*looping && source.has_ended(),
            Transport::Stopped { .. } => return Frame::Idle,
        };

        if ended {
            self.halt(0.0);
            self.set_state(PlayerState::Loaded);
            Frame::Ended
        } else {
            Frame::Progress {
                current: self.position(now),
                duration: self.duration(),
            }
        }
    }
}

/// Runs one poll; callbacks are invoked after the state lock is released
fn run_frame(
    shared: &Mutex<Shared>,
    callbacks: &Mutex<PlaybackCallbacks>,
    context: &OutputContext,
    generation: Option<u64>,
) -> PollControl {
    let frame = {
        let mut shared = shared.lock();
        let generation = generation.unwrap_or(shared.generation);
        shared.frame(context.current_time(), generation)
    };

    match frame {
        Frame::Progress { current, duration } => {
            callbacks.lock().progress(current, duration);
            PollControl::Continue
        }
        Frame::Ended => {
            log::info!("Playback reached natural end");
            callbacks.lock().ended();
            PollControl::Break
        }
        Frame::Idle => PollControl::Break,
    }
}

/// Streaming PCM player bound to a shared output context
pub struct PcmPlayer {
    context: OutputContext,
    config: PlayerConfig,
    shared: Arc<Mutex<Shared>>,
    callbacks: Arc<Mutex<PlaybackCallbacks>>,
    poll: Option<PollTask>,
}

impl PcmPlayer {
    pub fn new(context: OutputContext, config: PlayerConfig) -> Self {
        log::info!("PcmPlayer::new ({:?})", config.poll);
        Self {
            context,
            config,
            shared: Arc::new(Mutex::new(Shared::new())),
            callbacks: Arc::new(Mutex::new(PlaybackCallbacks::default())),
            poll: None,
        }
    }

    pub fn context(&self) -> &OutputContext {
        &self.context
    }

    pub fn is_playing(&self) -> bool {
        self.shared.lock().is_playing()
    }

    pub fn playback_rate(&self) -> f32 {
        self.shared.lock().rate
    }

    /// Run one progress poll on the calling thread
    /// Hosts using `PollMode::External` call this once per frame
    pub fn tick(&self) {
        run_frame(&self.shared, &self.callbacks, &self.context, None);
    }

    fn cancel_poll(&mut self) {
        if let Some(mut task) = self.poll.take() {
            task.cancel();
        }
    }

    /// Start a source from the parked offset with the installed callbacks
    fn start_span(&mut self, looping: bool) -> Result<()> {
        self.cancel_poll();

        let (generation, offset) = {
            let mut shared = self.shared.lock();
            let buffer = match shared.buffer.clone() {
                Some(buffer) => buffer,
                None => return Ok(()),
            };
            let offset = match shared.transport {
                Transport::Stopped { offset } => offset,
                Transport::Playing { .. } => {
                    return Err(AudioError::InvalidState(
                        "A source is already active".to_string(),
                    ))
                }
            };

            let params = SourceParams {
                buffer,
                offset,
                rate: shared.rate,
                looping,
            };
            let source = match self.context.start_source(params) {
                Ok(source) => source,
                Err(e) => {
                    log::error!("Failed to start source at {:.3}s: {}", offset, e);
                    // A seek halted a playing span; keep the target reachable
                    if shared.state == PlayerState::Playing {
                        shared.set_state(PlayerState::Paused);
                    }
                    return Err(e);
                }
            };
            shared.transport = Transport::Playing {
                offset_at_start: offset,
                clock_at_start: self.context.current_time(),
                looping,
                source,
            };
            shared.set_state(PlayerState::Playing);
            (shared.generation, offset)
        };

        log::info!("Playback started at {:.3}s (loop={})", offset, looping);

        if let PollMode::Background(interval) = self.config.poll {
            let shared = self.shared.clone();
            let callbacks = self.callbacks.clone();
            let context = self.context.clone();
            let spawned = PollTask::spawn(interval, move || {
                run_frame(&shared, &callbacks, &context, Some(generation))
            });

            match spawned {
                Ok(task) => self.poll = Some(task),
                Err(e) => {
                    // Without a poll the end event can never fire; do not keep playing
                    log::error!("Progress poll unavailable, stopping: {}", e);
                    let mut shared = self.shared.lock();
                    shared.halt(offset);
                    shared.set_state(PlayerState::Paused);
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

impl AudioTransport for PcmPlayer {
    fn load(&mut self, pcm: &[u8]) -> Result<()> {
        log::info!("load called ({} bytes)", pcm.len());
        let buffer = Arc::new(lingo_decode::decode(pcm, self.context.sample_rate()));

        {
            let mut shared = self.shared.lock();
            if shared.released {
                log::debug!("load ignored, player released");
                return Ok(());
            }
            shared.halt(0.0);
            shared.buffer = Some(buffer);
            shared.set_state(PlayerState::Loaded);
        }
        self.cancel_poll();
        Ok(())
    }

    fn play(
        &mut self,
        on_progress: Option<ProgressCallback>,
        on_ended: Option<EndedCallback>,
        looping: bool,
    ) -> Result<()> {
        {
            let shared = self.shared.lock();
            if shared.released || shared.buffer.is_none() {
                log::debug!("play ignored, nothing loaded");
                return Ok(());
            }
            if shared.is_playing() {
                log::debug!("play ignored, already playing");
                return Ok(());
            }
        }

        // Leaves the player untouched if the device refuses to start
        self.context.ensure_running()?;

        // A poll that just saw the natural end still owes the previous
        // callbacks their end event; let it deliver before swapping
        self.cancel_poll();
        *self.callbacks.lock() = PlaybackCallbacks::new(on_progress, on_ended);
        self.start_span(looping)
    }

    fn pause(&mut self) {
        {
            let mut shared = self.shared.lock();
            if !shared.is_playing() {
                return;
            }
            let offset = shared.position(self.context.current_time());
            shared.halt(offset);
            shared.set_state(PlayerState::Paused);
            log::info!("Playback paused at {:.3}s", offset);
        }
        self.cancel_poll();
    }

    fn stop(&mut self) {
        {
            let mut shared = self.shared.lock();
            if shared.released {
                return;
            }
            shared.halt(0.0);
            if shared.buffer.is_some() {
                shared.set_state(PlayerState::Stopped);
            }
        }
        self.cancel_poll();
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        let target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

        let resume = {
            let mut shared = self.shared.lock();
            if shared.released || shared.buffer.is_none() {
                return Ok(());
            }
            let resume = shared.halt(target);
            if resume.is_none() {
                shared.set_state(PlayerState::Paused);
            }
            resume
        };
        self.cancel_poll();

        log::debug!("seek to {:.3}s (restart={})", target, resume.is_some());
        match resume {
            Some(looping) => self.start_span(looping),
            None => Ok(()),
        }
    }

    fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AudioError::InvalidState(format!(
                "Playback rate must be > 0, got {}",
                rate
            )));
        }

        let now = self.context.current_time();
        let mut shared = self.shared.lock();
        let previous = shared.rate;
        if let Transport::Playing {
            offset_at_start,
            clock_at_start,
            source,
            ..
        } = &mut shared.transport
        {
            // Fold the elapsed span at the old rate so the new rate only
            // applies from now on
            *offset_at_start += (now - *clock_at_start).max(0.0) * previous as f64;
            *clock_at_start = now;
            source.set_rate(rate);
        }
        shared.rate = rate;
        log::debug!("playback rate {} -> {}", previous, rate);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.shared.lock().position(self.context.current_time())
    }

    fn duration(&self) -> f64 {
        self.shared.lock().duration()
    }

    fn state(&self) -> PlayerState {
        self.shared.lock().state
    }

    fn status(&self) -> PlaybackStatus {
        let now = self.context.current_time();
        let shared = self.shared.lock();
        PlaybackStatus {
            state: shared.state,
            position_secs: shared.position(now),
            duration_secs: shared.duration(),
            playback_rate: shared.rate,
            looping: shared.looping(),
        }
    }

    fn release(&mut self) {
        {
            let mut shared = self.shared.lock();
            if shared.released {
                return;
            }
            shared.halt(0.0);
            shared.buffer = None;
            shared.released = true;
            shared.set_state(PlayerState::Idle);
        }
        self.cancel_poll();
        self.callbacks.lock().clear();
        log::info!("PcmPlayer released");
    }
}

impl Drop for PcmPlayer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_renderer_api::{OutputBackend, OutputSpec, VirtualOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    const RATE: usize = 24_000;

    fn pcm_seconds(seconds: usize) -> Vec<u8> {
        vec![0u8; seconds * RATE * 2]
    }

    fn setup(poll: PollMode) -> (PcmPlayer, Arc<VirtualOutput>) {
        let output = Arc::new(VirtualOutput::new(OutputSpec::default()));
        let player = PcmPlayer::new(OutputContext::new(output.clone()), PlayerConfig { poll });
        (player, output)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    /// Records everything the player reports
    #[derive(Clone, Default)]
    struct Recorder {
        progress: Arc<Mutex<Vec<(f64, f64)>>>,
        ended: Arc<AtomicUsize>,
    }

    impl Recorder {
        fn callbacks(&self) -> (Option<ProgressCallback>, Option<EndedCallback>) {
            let progress = self.progress.clone();
            let ended = self.ended.clone();
            (
                Some(Box::new(move |c, d| progress.lock().push((c, d)))),
                Some(Box::new(move || {
                    ended.fetch_add(1, Ordering::SeqCst);
                })),
            )
        }

        fn ended(&self) -> usize {
            self.ended.load(Ordering::SeqCst)
        }

        fn progress_count(&self) -> usize {
            self.progress.lock().len()
        }
    }

    fn play_with(player: &mut PcmPlayer, recorder: &Recorder, looping: bool) {
        let (progress, ended) = recorder.callbacks();
        player.play(progress, ended, looping).unwrap();
    }

    #[test]
    fn test_play_before_load_is_noop() {
        let (mut player, output) = setup(PollMode::External);
        player.play(None, None, false).unwrap();

        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.duration(), 0.0);
        assert_eq!(output.resume_count(), 0);
    }

    #[test]
    fn test_play_resumes_suspended_context() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(1)).unwrap();
        player.play(None, None, false).unwrap();

        assert_eq!(output.resume_count(), 1);
        assert!(player.is_playing());
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();

        output.advance(1.5);
        player.pause();
        assert_close(player.current_time(), 1.5);
        assert_eq!(player.state(), PlayerState::Paused);

        // Paused position does not drift with the context clock
        output.advance(3.0);
        assert_close(player.current_time(), 1.5);

        player.play(None, None, false).unwrap();
        assert_close(player.current_time(), 1.5);
        output.advance(0.5);
        assert_close(player.current_time(), 2.0);
    }

    #[test]
    fn test_seek_while_playing_keeps_playing() {
        let (mut player, output) = setup(PollMode::External);
        let recorder = Recorder::default();
        player.load(&pcm_seconds(10)).unwrap();
        play_with(&mut player, &recorder, false);

        output.advance(1.0);
        player.seek(5.0).unwrap();
        assert_close(player.current_time(), 5.0);
        assert!(player.is_playing());
        assert_eq!(output.active_sources(), 1);

        output.advance(1.0);
        assert_close(player.current_time(), 6.0);

        // Callbacks survive the restart
        player.tick();
        assert_eq!(recorder.progress_count(), 1);
    }

    #[test]
    fn test_seek_while_paused() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();

        player.seek(4.0).unwrap();
        assert_close(player.current_time(), 4.0);
        assert!(!player.is_playing());
        assert_eq!(output.active_sources(), 0);

        player.play(None, None, false).unwrap();
        output.advance(1.0);
        assert_close(player.current_time(), 5.0);
    }

    #[test]
    fn test_negative_seek_floors_at_zero() {
        let (mut player, _output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.seek(-3.0).unwrap();
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn test_second_play_does_not_add_a_source() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();
        player.play(None, None, false).unwrap();

        assert_eq!(output.active_sources(), 1);
    }

    #[test]
    fn test_loop_wraps_and_never_ends() {
        let (mut player, output) = setup(PollMode::External);
        let recorder = Recorder::default();
        player.load(&pcm_seconds(10)).unwrap();
        play_with(&mut player, &recorder, true);

        output.advance(12.0);
        assert_close(player.current_time(), 2.0);

        player.tick();
        assert_eq!(recorder.ended(), 0);
        assert!(player.is_playing());
        let last = *recorder.progress.lock().last().unwrap();
        assert_close(last.0, 2.0);
        assert_close(last.1, 10.0);
    }

    #[test]
    fn test_natural_end_fires_once() {
        let (mut player, output) = setup(PollMode::External);
        let recorder = Recorder::default();
        player.load(&pcm_seconds(2)).unwrap();
        play_with(&mut player, &recorder, false);

        output.advance(1.0);
        player.tick();
        assert_eq!(recorder.progress_count(), 1);
        assert_eq!(recorder.ended(), 0);

        output.advance(1.5);
        player.tick();
        assert_eq!(recorder.ended(), 1);
        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Loaded);
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(output.active_sources(), 0);

        output.advance(5.0);
        player.tick();
        player.tick();
        assert_eq!(recorder.ended(), 1);
        assert_eq!(recorder.progress_count(), 1);
    }

    #[test]
    fn test_position_capped_at_duration_before_end_is_polled() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(2)).unwrap();
        player.play(None, None, false).unwrap();

        output.advance(3.0);
        assert_close(player.current_time(), 2.0);
    }

    #[test]
    fn test_progress_is_delivered_in_order() {
        let (mut player, output) = setup(PollMode::External);
        let recorder = Recorder::default();
        player.load(&pcm_seconds(10)).unwrap();
        play_with(&mut player, &recorder, false);

        for _ in 0..5 {
            output.advance(0.25);
            player.tick();
        }

        let progress = recorder.progress.lock();
        assert_eq!(progress.len(), 5);
        assert!(progress.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_close(progress[4].0, 1.25);
    }

    #[test]
    fn test_stop_resets_position_and_keeps_buffer() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();
        output.advance(3.0);

        player.stop();
        assert_eq!(player.current_time(), 0.0);
        assert!(!player.is_playing());
        assert_close(player.duration(), 10.0);
        assert_eq!(player.state(), PlayerState::Stopped);
        assert_eq!(output.active_sources(), 0);
    }

    #[test]
    fn test_load_while_playing_stops_source() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();
        output.advance(2.0);

        player.load(&pcm_seconds(3)).unwrap();
        assert_eq!(output.active_sources(), 0);
        assert!(!player.is_playing());
        assert_eq!(player.current_time(), 0.0);
        assert_close(player.duration(), 3.0);
        assert_eq!(player.state(), PlayerState::Loaded);
    }

    #[test]
    fn test_rate_change_applies_from_now() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();

        output.advance(1.0);
        player.set_rate(2.0).unwrap();
        output.advance(1.0);
        assert_close(player.current_time(), 3.0);
        assert_eq!(player.playback_rate(), 2.0);

        assert!(player.set_rate(0.0).is_err());
        assert!(player.set_rate(f32::NAN).is_err());
        assert_eq!(player.playback_rate(), 2.0);
    }

    #[test]
    fn test_rate_set_while_paused_used_on_next_play() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.set_rate(1.5).unwrap();
        player.play(None, None, false).unwrap();

        output.advance(2.0);
        assert_close(player.current_time(), 3.0);
    }

    #[test]
    fn test_blocked_resume_leaves_player_ready() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(5)).unwrap();
        output.set_fail_resume(true);

        let result = player.play(None, None, false);
        assert!(matches!(result, Err(AudioError::DeviceError(_))));
        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Loaded);
        assert_eq!(output.active_sources(), 0);

        output.set_fail_resume(false);
        player.play(None, None, false).unwrap();
        assert!(player.is_playing());
    }

    #[test]
    fn test_status_snapshot() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(4)).unwrap();
        player.play(None, None, true).unwrap();
        output.advance(1.0);

        let status = player.status();
        assert_eq!(status.state, PlayerState::Playing);
        assert!(status.looping);
        assert_close(status.position_secs, 1.0);
        assert_close(status.progress_percent(), 25.0);
    }

    #[test]
    fn test_release_makes_player_inert() {
        let (mut player, output) = setup(PollMode::External);
        let recorder = Recorder::default();
        player.load(&pcm_seconds(5)).unwrap();
        play_with(&mut player, &recorder, false);

        player.release();
        assert_eq!(output.active_sources(), 0);
        assert_eq!(player.state(), PlayerState::Idle);

        player.load(&pcm_seconds(5)).unwrap();
        player.play(None, None, false).unwrap();
        output.advance(1.0);
        player.tick();

        assert!(!player.is_playing());
        assert_eq!(player.duration(), 0.0);
        assert_eq!(recorder.progress_count(), 0);
    }

    #[test]
    fn test_teardown_cancels_background_poll() {
        let (mut player, output) = setup(PollMode::Background(Duration::from_millis(2)));
        let recorder = Recorder::default();
        player.load(&pcm_seconds(10)).unwrap();
        play_with(&mut player, &recorder, false);

        thread::sleep(Duration::from_millis(40));
        assert!(recorder.progress_count() > 0);

        drop(player);
        let seen = recorder.progress_count();
        output.advance(1.0);
        thread::sleep(Duration::from_millis(40));

        assert_eq!(recorder.progress_count(), seen);
        assert_eq!(output.active_sources(), 0);
    }

    #[test]
    fn test_pause_cancels_background_poll() {
        let (mut player, _output) = setup(PollMode::Background(Duration::from_millis(2)));
        let recorder = Recorder::default();
        player.load(&pcm_seconds(10)).unwrap();
        play_with(&mut player, &recorder, false);

        thread::sleep(Duration::from_millis(30));
        player.pause();
        let seen = recorder.progress_count();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(recorder.progress_count(), seen);
    }

    #[test]
    fn test_background_poll_reports_natural_end_once() {
        let (mut player, output) = setup(PollMode::Background(Duration::from_millis(2)));
        let recorder = Recorder::default();
        player.load(&pcm_seconds(1)).unwrap();
        play_with(&mut player, &recorder, false);

        output.advance(1.5);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(recorder.ended(), 1);
        assert!(!player.is_playing());

        output.advance(1.0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(recorder.ended(), 1);
    }

    #[test]
    fn test_replay_right_after_end_keeps_end_with_its_span() {
        let (mut player, output) = setup(PollMode::Background(Duration::from_millis(1)));
        player.load(&pcm_seconds(1)).unwrap();

        let first_ended = Arc::new(AtomicUsize::new(0));
        let counter = first_ended.clone();
        let slow_ended: EndedCallback = Box::new(move || {
            thread::sleep(Duration::from_millis(50));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        player.play(None, Some(slow_ended), false).unwrap();

        output.advance(1.5);
        let mut waited = 0;
        while player.is_playing() && waited < 2_000 {
            thread::sleep(Duration::from_millis(1));
            waited += 1;
        }
        assert!(!player.is_playing());

        // The first span's end is still being delivered when the replay lands
        let second = Recorder::default();
        play_with(&mut player, &second, false);

        assert_eq!(first_ended.load(Ordering::SeqCst), 1);
        assert_eq!(second.ended(), 0);
        assert!(player.is_playing());
        assert_close(player.current_time(), 0.0);

        player.stop();
        assert_eq!(second.ended(), 0);
    }

    #[test]
    fn test_seek_failure_parks_player_at_target() {
        let (mut player, output) = setup(PollMode::External);
        player.load(&pcm_seconds(10)).unwrap();
        player.play(None, None, false).unwrap();
        output.advance(1.0);

        output.close();
        assert!(player.seek(5.0).is_err());

        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Paused);
        assert_eq!(player.status().state, PlayerState::Paused);
        assert_close(player.current_time(), 5.0);
        assert_eq!(output.active_sources(), 0);
    }
}
