// Dialogue content model

/// One spoken line of a dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
    pub translation: Option<String>,
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            translation: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Length used by the active-line heuristic, in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A lesson dialogue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialogue {
    /// Stable key for persisted progress
    pub id: String,
    pub title: String,
    pub lines: Vec<DialogueLine>,
}

impl Dialogue {
    pub fn new(id: impl Into<String>, title: impl Into<String>, lines: Vec<DialogueLine>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text sent for synthesis: every line, one per row
    pub fn script(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
