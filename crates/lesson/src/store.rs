// Persisted per-dialogue UI state

use crate::stage::{LearningStep, VisibilityMode};
use parking_lot::Mutex;
use std::collections::HashMap;

/// String key-value persistence provided by the host
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process store for tests and hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

const STEP_KEY: &str = "step";
const DRAFT_KEY: &str = "dictation";
const VISIBILITY_KEY: &str = "visibility";

/// Typed view of one dialogue's saved state
pub struct LessonProgress<'a> {
    store: &'a dyn SessionStore,
    dialogue_id: String,
}

impl<'a> LessonProgress<'a> {
    pub fn new(store: &'a dyn SessionStore, dialogue_id: impl Into<String>) -> Self {
        Self {
            store,
            dialogue_id: dialogue_id.into(),
        }
    }

    fn key(&self, field: &str) -> String {
        format!("lesson.{}.{}", self.dialogue_id, field)
    }

    /// Last step visited; unknown or missing values start from the beginning
    pub fn step(&self) -> LearningStep {
        self.store
            .get(&self.key(STEP_KEY))
            .and_then(|value| match value.parse() {
                Ok(step) => Some(step),
                Err(e) => {
                    log::warn!("Ignoring stored step: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn set_step(&self, step: LearningStep) {
        self.store.set(&self.key(STEP_KEY), step.as_str());
    }

    pub fn dictation_draft(&self) -> String {
        self.store.get(&self.key(DRAFT_KEY)).unwrap_or_default()
    }

    pub fn set_dictation_draft(&self, text: &str) {
        if text.is_empty() {
            self.store.remove(&self.key(DRAFT_KEY));
        } else {
            self.store.set(&self.key(DRAFT_KEY), text);
        }
    }

    pub fn visibility(&self) -> VisibilityMode {
        self.store
            .get(&self.key(VISIBILITY_KEY))
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_visibility(&self, mode: VisibilityMode) {
        self.store.set(&self.key(VISIBILITY_KEY), mode.as_str());
    }

    /// Forget everything saved for this dialogue
    pub fn reset(&self) {
        for field in [STEP_KEY, DRAFT_KEY, VISIBILITY_KEY] {
            self.store.remove(&self.key(field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_saved() {
        let store = MemoryStore::new();
        let progress = LessonProgress::new(&store, "cafe-1");

        assert_eq!(progress.step(), LearningStep::BlindListening);
        assert_eq!(progress.dictation_draft(), "");
        assert_eq!(progress.visibility(), VisibilityMode::Hidden);
    }

    #[test]
    fn test_values_are_scoped_per_dialogue() {
        let store = MemoryStore::new();
        let cafe = LessonProgress::new(&store, "cafe-1");
        let train = LessonProgress::new(&store, "train-2");

        cafe.set_step(LearningStep::Recitation);
        cafe.set_dictation_draft("Hello the re");
        train.set_visibility(VisibilityMode::Visible);

        assert_eq!(cafe.step(), LearningStep::Recitation);
        assert_eq!(cafe.dictation_draft(), "Hello the re");
        assert_eq!(cafe.visibility(), VisibilityMode::Hidden);
        assert_eq!(train.step(), LearningStep::BlindListening);
        assert_eq!(train.visibility(), VisibilityMode::Visible);
    }

    #[test]
    fn test_corrupt_step_falls_back() {
        let store = MemoryStore::new();
        store.set("lesson.cafe-1.step", "karaoke");
        assert_eq!(
            LessonProgress::new(&store, "cafe-1").step(),
            LearningStep::BlindListening
        );
    }

    #[test]
    fn test_reset_and_empty_draft() {
        let store = MemoryStore::new();
        let progress = LessonProgress::new(&store, "cafe-1");
        progress.set_step(LearningStep::Dictation);
        progress.set_dictation_draft("draft");
        progress.set_dictation_draft("");
        assert_eq!(store.len(), 1);

        progress.reset();
        assert!(store.is_empty());
    }
}
