// Progress to active-line mapping
//
// Approximation: the playback position is mapped proportionally onto the
// concatenated text length of the dialogue. There is no per-line timing, so
// lines with unusual speaking pace will highlight early or late.

use crate::dialogue::Dialogue;

/// Characters added per line for the pause between lines
pub const LINE_SEPARATOR_ALLOWANCE: usize = 2;

/// At or above this progress no line is considered active
const END_THRESHOLD_PERCENT: f64 = 99.9;

/// Percentage of `duration` reached at `current`, 0 when duration is unknown
pub fn progress_percent(current: f64, duration: f64) -> f64 {
    if duration > 0.0 && current.is_finite() {
        (current / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Cumulative `[start, end)` character spans of each line
#[derive(Debug, Clone, PartialEq)]
pub struct LineTimeline {
    spans: Vec<(usize, usize)>,
    total: usize,
}

impl LineTimeline {
    pub fn from_lengths<I>(lengths: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut spans = Vec::new();
        let mut total = 0;
        for len in lengths {
            let start = total;
            total += len + LINE_SEPARATOR_ALLOWANCE;
            spans.push((start, total));
        }
        Self { spans, total }
    }

    pub fn new(dialogue: &Dialogue) -> Self {
        Self::from_lengths(dialogue.lines.iter().map(|line| line.char_len()))
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn spans(&self) -> &[(usize, usize)] {
        &self.spans
    }

    /// Index of the line active at `progress` percent
    pub fn active_line(&self, progress: f64) -> Option<usize> {
        if !progress.is_finite() || progress <= 0.0 || progress >= END_THRESHOLD_PERCENT {
            return None;
        }
        if self.total == 0 {
            return None;
        }

        let pos = progress / 100.0 * self.total as f64;
        self.spans
            .iter()
            .position(|&(start, end)| pos >= start as f64 && pos < end as f64)
    }
}

/// Shorthand for a one-off lookup
pub fn active_line(dialogue: &Dialogue, progress: f64) -> Option<usize> {
    LineTimeline::new(dialogue).active_line(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::DialogueLine;

    fn dialogue(texts: &[&str]) -> Dialogue {
        Dialogue::new(
            "d",
            "d",
            texts.iter().map(|t| DialogueLine::new("A", *t)).collect(),
        )
    }

    #[test]
    fn test_spans_include_separator() {
        let timeline = LineTimeline::from_lengths([8, 18]);
        assert_eq!(timeline.spans(), &[(0, 10), (10, 30)]);
        assert_eq!(timeline.total(), 30);
    }

    #[test]
    fn test_no_active_line_at_edges() {
        let d = dialogue(&["Hello!", "How are you?"]);
        assert_eq!(active_line(&d, 0.0), None);
        assert_eq!(active_line(&d, -5.0), None);
        assert_eq!(active_line(&d, 99.9), None);
        assert_eq!(active_line(&d, 100.0), None);
        assert_eq!(active_line(&d, f64::NAN), None);
    }

    #[test]
    fn test_active_line_boundaries() {
        // Spans: [0, 10) and [10, 30) of 30
        let timeline = LineTimeline::from_lengths([8, 18]);

        assert_eq!(timeline.active_line(1.0), Some(0));
        assert_eq!(timeline.active_line(30.0), Some(0));
        // 10 / 30 is exactly the start of the second line
        assert_eq!(timeline.active_line(100.0 / 3.0 + 1e-9), Some(1));
        assert_eq!(timeline.active_line(50.0), Some(1));
        assert_eq!(timeline.active_line(99.8), Some(1));
    }

    #[test]
    fn test_empty_dialogue_has_no_active_line() {
        assert_eq!(active_line(&dialogue(&[]), 50.0), None);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(2.5, 10.0), 25.0);
        assert_eq!(progress_percent(1.0, 0.0), 0.0);
        assert_eq!(progress_percent(20.0, 10.0), 100.0);
    }
}
