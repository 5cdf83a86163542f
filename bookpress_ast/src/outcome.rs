//! Per-chapter rendering outcomes.
//!
//! A malformed token sequence inside one chapter must not take down the
//! export of its siblings, so renderers report each chapter as a typed
//! outcome instead of raising. The payload type is whatever the renderer
//! accumulates -- flow blocks for the document target, nothing for the
//! page target, which draws as it goes.

use std::fmt;

/// Why a chapter's token walk stopped early
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterFault {
    /// Index of the token at which the walk gave up
    pub token_index: usize,
    /// Human-readable description of what was wrong
    pub reason: String,
}

impl ChapterFault {
    /// Construct a fault at the given token index
    pub fn at<S: Into<String>>(token_index: usize, reason: S) -> Self {
        ChapterFault {
            token_index,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ChapterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token {}: {}", self.token_index, self.reason)
    }
}

impl std::error::Error for ChapterFault {}

/// The result of rendering one chapter
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome<T> {
    /// The whole chapter rendered
    Success(T),
    /// Rendering stopped partway; whatever was produced first is kept
    Partial(T, ChapterFault),
    /// Nothing could be rendered
    Failed(ChapterFault),
}

impl<T> ChapterOutcome<T> {
    /// The fault, if the chapter did not fully render
    pub fn fault(&self) -> Option<&ChapterFault> {
        match self {
            ChapterOutcome::Success(_) => None,
            ChapterOutcome::Partial(_, fault) | ChapterOutcome::Failed(fault) => Some(fault),
        }
    }

    /// Whatever output the chapter produced before any fault
    pub fn into_payload(self) -> Option<T> {
        match self {
            ChapterOutcome::Success(payload) | ChapterOutcome::Partial(payload, _) => Some(payload),
            ChapterOutcome::Failed(_) => None,
        }
    }

    /// Whether the chapter rendered in full
    pub fn is_success(&self) -> bool {
        matches!(self, ChapterOutcome::Success(_))
    }
}

/// One chapter's entry in an export report
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRecord {
    /// Zero-based position of the chapter in reading order
    pub index: usize,
    /// The chapter's title
    pub title: String,
    /// The chapter's fault, if it did not fully render
    pub fault: Option<ChapterFault>,
}

/// Aggregated per-chapter outcomes for a whole export.
///
/// The binary output is produced regardless; the report is how callers find
/// out that a chapter only partially rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// One record per chapter, in reading order
    pub chapters: Vec<ChapterRecord>,
}

impl ExportReport {
    /// Record the outcome of one chapter
    pub fn record<T>(&mut self, index: usize, title: &str, outcome: &ChapterOutcome<T>) {
        self.chapters.push(ChapterRecord {
            index,
            title: title.to_string(),
            fault: outcome.fault().cloned(),
        });
    }

    /// The chapters which did not fully render
    pub fn faulted(&self) -> impl Iterator<Item = &ChapterRecord> {
        self.chapters.iter().filter(|c| c.fault.is_some())
    }

    /// Whether every chapter rendered in full
    pub fn is_clean(&self) -> bool {
        self.chapters.iter().all(|c| c.fault.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_outcome_keeps_payload_and_fault() {
        let outcome = ChapterOutcome::Partial(vec![1, 2], ChapterFault::at(7, "unpaired close"));
        assert!(!outcome.is_success());
        assert_eq!(outcome.fault().map(|f| f.token_index), Some(7));
        assert_eq!(outcome.into_payload(), Some(vec![1, 2]));
    }

    #[test]
    fn report_tracks_faulted_chapters() {
        let mut report = ExportReport::default();
        report.record(0, "One", &ChapterOutcome::Success(()));
        report.record(1, "Two", &ChapterOutcome::<()>::Failed(ChapterFault::at(0, "bad")));
        report.record(2, "Three", &ChapterOutcome::Success(()));
        assert!(!report.is_clean());
        let faulted: Vec<_> = report.faulted().map(|c| c.index).collect();
        assert_eq!(faulted, vec![1]);
    }
}
