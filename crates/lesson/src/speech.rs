// Reference speech loading with a per-text PCM cache

use lingo_core::{AudioError, AudioTransport, Result, ServiceError, SpeechSynthesizer};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const DEFAULT_CACHE_ENTRIES: usize = 32;

/// Synthesized PCM keyed by source text, evicting the oldest entry first
pub struct SpeechCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Arc<Vec<u8>>>,
    order: VecDeque<String>,
}

impl SpeechCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<u8>>> {
        self.inner.lock().entries.get(text).cloned()
    }

    pub fn insert(&self, text: &str, pcm: Vec<u8>) -> Arc<Vec<u8>> {
        let pcm = Arc::new(pcm);
        let mut inner = self.inner.lock();
        if inner.entries.insert(text.to_string(), pcm.clone()).is_none() {
            inner.order.push_back(text.to_string());
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        pcm
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl Default for SpeechCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES)
    }
}

/// Synthesize `text` (or reuse cached audio) and load it into `player`
///
/// A rate limit is returned as `AudioError::Service(RateLimited)` so hosts
/// can tell the learner to wait; any other synthesis failure becomes a
/// `LoadError`. On failure the player is left untouched.
pub fn load_speech(
    player: &mut dyn AudioTransport,
    synth: &dyn SpeechSynthesizer,
    cache: &SpeechCache,
    text: &str,
) -> Result<()> {
    let pcm = match cache.get(text) {
        Some(pcm) => {
            log::debug!("Speech cache hit ({} chars)", text.chars().count());
            pcm
        }
        None => match synth.synthesize(text) {
            Ok(pcm) if pcm.is_empty() => {
                return Err(AudioError::LoadError(
                    "Synthesis returned no audio".to_string(),
                ))
            }
            Ok(pcm) => cache.insert(text, pcm),
            Err(ServiceError::RateLimited) => {
                log::warn!("Speech synthesis rate limited");
                return Err(ServiceError::RateLimited.into());
            }
            Err(e) => {
                log::error!("Speech synthesis failed: {}", e);
                return Err(AudioError::LoadError(format!(
                    "Could not synthesize speech: {}",
                    e
                )));
            }
        },
    };

    player.load(&pcm)
}
