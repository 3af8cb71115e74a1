//! Reconciliation of pushed log state
//!
//! Snapshots replace the held entries wholesale. Executing updates are
//! merged into the entry with the same id, touching only the fields they
//! carry. Expand/collapse flags live beside the entries, keyed by id, so
//! neither operation disturbs them.

use std::collections::HashSet;
use std::mem;

use apiwatch_core::domain::log::{Completion, EntryStatus, ExecutionState, LogEntry};
use apiwatch_core::dto::log::ExecutingUpdate;
use tracing::debug;

/// What applying one executing update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No held entry has this id; the next snapshot will introduce it
    UnknownEntry,
    /// The entry already completed and is frozen
    Terminal,
    /// Nothing carried by the update differs from the held entry
    Unchanged,
    Applied {
        output_changed: bool,
        completed: bool,
    },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Entries currently displayed, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSet {
    entries: Vec<LogEntry>,
}

impl LogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace everything with an authoritative snapshot
    pub fn replace(&mut self, snapshot: Vec<LogEntry>) {
        self.entries = snapshot;
    }

    /// Merge one executing update into the entry it names
    pub fn apply(&mut self, update: &ExecutingUpdate) -> UpdateOutcome {
        match self.entries.iter_mut().find(|entry| entry.id == update.id) {
            Some(entry) => merge(entry, update),
            None => {
                debug!("Ignoring update for unknown entry {}", update.id);
                UpdateOutcome::UnknownEntry
            }
        }
    }
}

fn merge(entry: &mut LogEntry, update: &ExecutingUpdate) -> UpdateOutcome {
    let ExecutionState::Executing { prints } = &mut entry.state else {
        return UpdateOutcome::Terminal;
    };

    let mut output_changed = false;
    if let Some(output) = update.output() {
        if output != prints.as_str() {
            *prints = output.to_string();
            output_changed = true;
        }
    }

    if update.status == Some(EntryStatus::Completed) {
        match update.status_code {
            Some(status_code) => {
                let completion = Completion {
                    status_code,
                    response_body: update.response_body.clone().unwrap_or_default(),
                    response_time_ms: update.response_time_ms.unwrap_or(0.0),
                    prints: mem::take(prints),
                };
                entry.state = ExecutionState::Completed(completion);
                return UpdateOutcome::Applied {
                    output_changed,
                    completed: true,
                };
            }
            None => debug!(
                "Completion for {} carries no status code, waiting for snapshot",
                entry.id
            ),
        }
    }

    if output_changed {
        UpdateOutcome::Applied {
            output_changed,
            completed: false,
        }
    } else {
        UpdateOutcome::Unchanged
    }
}

/// Which entries the user has expanded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    expanded: HashSet<String>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flip the flag for `id`, returning the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    /// Forget flags for ids no longer held
    pub fn retain_known(&mut self, logs: &LogSet) {
        self.expanded.retain(|id| logs.get(id).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{completed, executing};

    fn update(id: &str, prints: &str) -> ExecutingUpdate {
        ExecutingUpdate {
            id: id.to_string(),
            status: Some(EntryStatus::Executing),
            prints: Some(prints.to_string()),
            ..Default::default()
        }
    }

    fn completion(id: &str, code: u16) -> ExecutingUpdate {
        ExecutingUpdate {
            id: id.to_string(),
            status: Some(EntryStatus::Completed),
            prints: Some("hi world\nbye".to_string()),
            status_code: Some(code),
            response_body: Some("{\"ok\":true}".to_string()),
            response_time_ms: Some(42.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_id_leaves_set_unchanged() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi"), completed("b", 200)]);
        let before = logs.clone();

        assert_eq!(logs.apply(&update("zzz", "x")), UpdateOutcome::UnknownEntry);
        assert_eq!(logs, before);
    }

    #[test]
    fn test_cumulative_prints_replace_buffer() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi")]);
        let before = logs.get("a").cloned().unwrap();

        let outcome = logs.apply(&update("a", "hi world"));

        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                output_changed: true,
                completed: false
            }
        );
        let after = logs.get("a").unwrap();
        assert_eq!(after.prints(), "hi world");
        assert_eq!(after.status(), EntryStatus::Executing);
        // Everything the update does not carry is untouched
        assert_eq!(
            LogEntry {
                state: before.state.clone(),
                ..after.clone()
            },
            before
        );
    }

    #[test]
    fn test_update_touches_only_its_entry() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", ""), executing("b", "x"), completed("c", 404)]);
        let before = logs.clone();

        logs.apply(&update("b", "xy"));

        assert_eq!(logs.entries()[0], before.entries()[0]);
        assert_eq!(logs.entries()[2], before.entries()[2]);
        assert_eq!(logs.get("b").unwrap().prints(), "xy");
    }

    #[test]
    fn test_stdout_alias_is_accepted() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "")]);

        let outcome = logs.apply(&ExecutingUpdate {
            id: "a".to_string(),
            stdout: Some("from stdout".to_string()),
            ..Default::default()
        });

        assert!(outcome.is_applied());
        assert_eq!(logs.get("a").unwrap().prints(), "from stdout");
    }

    #[test]
    fn test_same_buffer_is_unchanged() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi")]);

        assert_eq!(logs.apply(&update("a", "hi")), UpdateOutcome::Unchanged);
    }

    #[test]
    fn test_completion_moves_to_terminal_state() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi")]);

        let outcome = logs.apply(&completion("a", 201));

        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                output_changed: true,
                completed: true
            }
        );
        match &logs.get("a").unwrap().state {
            ExecutionState::Completed(done) => {
                assert_eq!(done.status_code, 201);
                assert_eq!(done.prints, "hi world\nbye");
                assert_eq!(done.response_time_ms, 42.0);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_completed_entries_are_frozen() {
        let mut logs = LogSet::new();
        logs.replace(vec![completed("a", 200)]);
        let before = logs.clone();

        assert_eq!(logs.apply(&update("a", "late output")), UpdateOutcome::Terminal);
        assert_eq!(logs.apply(&completion("a", 500)), UpdateOutcome::Terminal);
        assert_eq!(logs, before);
    }

    #[test]
    fn test_completion_without_code_keeps_executing() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi")]);

        let outcome = logs.apply(&ExecutingUpdate {
            id: "a".to_string(),
            status: Some(EntryStatus::Completed),
            prints: Some("hi!".to_string()),
            ..Default::default()
        });

        assert!(outcome.is_applied());
        assert_eq!(logs.get("a").unwrap().status(), EntryStatus::Executing);
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut logs = LogSet::new();
        logs.replace(vec![executing("a", "hi"), completed("b", 200)]);

        let snapshot = vec![completed("c", 500)];
        logs.replace(snapshot.clone());

        assert_eq!(logs.entries(), snapshot.as_slice());
        assert!(logs.get("a").is_none());
    }

    #[test]
    fn test_expand_state_survives_snapshot() {
        let mut logs = LogSet::new();
        let mut expanded = ExpandState::new();
        logs.replace(vec![executing("a", ""), executing("b", "")]);

        assert!(expanded.toggle("a"));
        expanded.expand("b");
        logs.replace(vec![completed("a", 200)]);
        expanded.retain_known(&logs);

        assert!(expanded.is_expanded("a"));
        assert!(!expanded.is_expanded("b"));
        assert!(!expanded.toggle("a"));
        assert!(!expanded.is_expanded("a"));
    }
}
