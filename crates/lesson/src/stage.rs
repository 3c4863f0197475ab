// Learning steps and transcript visibility

use std::fmt;
use std::str::FromStr;

/// The four stages a learner walks through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LearningStep {
    /// Listen without the transcript; the active line is highlighted
    #[default]
    BlindListening,
    /// Type what is heard while scrubbing the audio
    Dictation,
    ReadAlong,
    /// Record an attempt and have it assessed
    Recitation,
}

impl LearningStep {
    pub const ALL: [LearningStep; 4] = [
        LearningStep::BlindListening,
        LearningStep::Dictation,
        LearningStep::ReadAlong,
        LearningStep::Recitation,
    ];

    pub fn next(self) -> Option<LearningStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<LearningStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LearningStep::BlindListening => "blind_listening",
            LearningStep::Dictation => "dictation",
            LearningStep::ReadAlong => "read_along",
            LearningStep::Recitation => "recitation",
        }
    }

    /// Whether the step plays the reference audio with line highlighting
    pub fn highlights_lines(self) -> bool {
        self == LearningStep::BlindListening
    }
}

impl fmt::Display for LearningStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("Unknown learning step: {}", s))
    }
}

/// Whether the transcript is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityMode {
    #[default]
    Hidden,
    Visible,
}

impl VisibilityMode {
    pub fn toggled(self) -> Self {
        match self {
            VisibilityMode::Hidden => VisibilityMode::Visible,
            VisibilityMode::Visible => VisibilityMode::Hidden,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VisibilityMode::Hidden => "hidden",
            VisibilityMode::Visible => "visible",
        }
    }
}

impl FromStr for VisibilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hidden" => Ok(VisibilityMode::Hidden),
            "visible" => Ok(VisibilityMode::Visible),
            other => Err(format!("Unknown visibility mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        assert_eq!(LearningStep::BlindListening.next(), Some(LearningStep::Dictation));
        assert_eq!(LearningStep::Recitation.next(), None);
        assert_eq!(LearningStep::BlindListening.previous(), None);
        assert_eq!(LearningStep::Recitation.previous(), Some(LearningStep::ReadAlong));
        assert!(LearningStep::Dictation < LearningStep::ReadAlong);
    }

    #[test]
    fn test_step_keys() {
        for step in LearningStep::ALL {
            assert_eq!(step.as_str().parse::<LearningStep>(), Ok(step));
        }
        assert!("karaoke".parse::<LearningStep>().is_err());
    }

    #[test]
    fn test_visibility() {
        assert_eq!(VisibilityMode::default(), VisibilityMode::Hidden);
        assert_eq!(VisibilityMode::Hidden.toggled(), VisibilityMode::Visible);
        assert_eq!("visible".parse::<VisibilityMode>(), Ok(VisibilityMode::Visible));
    }
}
