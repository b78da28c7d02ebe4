//! Final report synthesis.
//!
//! Deterministic and pure: the report is a function of the brief and
//! the accumulated notes, with no model call on the way out. A run
//! whose workers all failed still yields a report saying so.

use std::fmt::Write as _;

use crate::types::{Note, NoteKind};

/// Folds accumulated notes into the caller-visible report.
pub struct Aggregator;

impl Aggregator {
    /// Synthesize the final report for `brief` from `notes`.
    pub fn synthesize(brief: &str, notes: &[Note]) -> String {
        let findings: Vec<&Note> = notes
            .iter()
            .filter(|n| n.kind == NoteKind::Finding && !n.text.is_empty())
            .collect();
        let failed = notes.iter().filter(|n| n.kind == NoteKind::Failure).count();
        let cancelled = notes
            .iter()
            .filter(|n| n.kind == NoteKind::Cancellation)
            .count();

        if findings.is_empty() {
            return Self::fallback(brief, notes, failed, cancelled);
        }

        let mut report = format!("Report: {brief}\n\nFindings:\n");
        for note in &findings {
            let marker = if note.degraded { " [partial]" } else { "" };
            let _ = writeln!(report, "- {}{marker}", note.text);
        }
        if failed + cancelled > 0 {
            let _ = write!(
                report,
                "\nIncomplete coverage: {failed} sub-task(s) failed, \
                 {cancelled} cancelled."
            );
        }
        report
    }

    /// No findings at all: say so rather than inventing an answer.
    fn fallback(brief: &str, notes: &[Note], failed: usize, cancelled: usize) -> String {
        let mut report = format!(
            "Insufficient information was gathered to answer: {brief}\n\n\
             No sub-task produced findings ({failed} failed, {cancelled} cancelled)."
        );
        let reasons: Vec<&str> = notes
            .iter()
            .filter(|n| n.kind == NoteKind::Failure)
            .map(|n| n.text.as_str())
            .collect();
        if !reasons.is_empty() {
            report.push_str("\n\nReported failures:\n");
            for reason in reasons {
                let _ = writeln!(report, "- {reason}");
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::ids::TaskId;

    fn finding(text: &str) -> Note {
        Note {
            kind: NoteKind::Finding,
            task_id: Some(TaskId::from_raw("t1")),
            text: text.into(),
            degraded: false,
        }
    }

    fn failure(text: &str) -> Note {
        Note {
            kind: NoteKind::Failure,
            task_id: Some(TaskId::from_raw("t2")),
            text: text.into(),
            degraded: false,
        }
    }

    #[test]
    fn findings_are_listed_in_order() {
        let notes = vec![finding("X weighs 3kg"), finding("Y weighs 5kg")];
        let report = Aggregator::synthesize("compare X and Y", &notes);
        assert!(report.contains("compare X and Y"));
        let x = report.find("X weighs").unwrap();
        let y = report.find("Y weighs").unwrap();
        assert!(x < y);
    }

    #[test]
    fn degraded_findings_are_marked_partial() {
        let mut note = finding("capped result");
        note.degraded = true;
        let report = Aggregator::synthesize("brief", &[note]);
        assert!(report.contains("capped result [partial]"));
    }

    #[test]
    fn partial_failure_is_reported_alongside_findings() {
        let notes = vec![finding("X weighs 3kg"), failure("provider refused")];
        let report = Aggregator::synthesize("compare X and Y", &notes);
        assert!(report.contains("X weighs 3kg"));
        assert!(report.contains("1 sub-task(s) failed"));
    }

    #[test]
    fn no_findings_yields_insufficient_information() {
        let notes = vec![failure("provider refused"), failure("timeout")];
        let report = Aggregator::synthesize("compare X and Y", &notes);
        assert!(report.contains("Insufficient information"));
        assert!(report.contains("provider refused"));
        assert!(report.contains("timeout"));
    }

    #[test]
    fn empty_notes_still_produce_a_report() {
        let report = Aggregator::synthesize("compare X and Y", &[]);
        assert!(report.contains("Insufficient information"));
        assert!(report.contains("0 failed, 0 cancelled"));
    }

    #[test]
    fn reflections_are_not_findings() {
        let notes = vec![Note::reflection("still thinking")];
        let report = Aggregator::synthesize("brief", &notes);
        assert!(report.contains("Insufficient information"));
        assert!(!report.contains("still thinking"));
    }

    #[test]
    fn empty_finding_text_is_skipped() {
        let notes = vec![finding(""), finding("real result")];
        let report = Aggregator::synthesize("brief", &notes);
        assert!(report.contains("real result"));
        assert!(!report.contains("- \n"));
    }
}
