//! Commit modes and the confirmation gate.

use serde::{Deserialize, Serialize};

/// How a reconciliation turns into writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Upsert and delete in the same request.
    AutoCommit,
    /// Deletions are proposed first and only applied once confirmed.
    PreviewThenCommit,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoCommit => "auto_commit",
            Self::PreviewThenCommit => "preview_then_commit",
        }
    }
}

/// What a sync request does after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDecision {
    /// Deletions are pending; nothing is written.
    Propose,
    /// Apply upserts and deletions.
    Commit,
    /// The caller declined the deletions; nothing is written.
    Abort,
}

impl SyncDecision {
    /// Decide from the mode, the caller's `confirmDelete` and whether the
    /// reconciliation deletes anything.
    ///
    /// With nothing to delete there is nothing to confirm and every mode
    /// commits. An explicit `confirmDelete: false` aborts in any mode.
    pub fn decide(mode: SyncMode, confirm_delete: Option<bool>, has_deletions: bool) -> Self {
        if !has_deletions {
            return Self::Commit;
        }
        match (mode, confirm_delete) {
            (_, Some(false)) => Self::Abort,
            (_, Some(true)) => Self::Commit,
            (SyncMode::AutoCommit, None) => Self::Commit,
            (SyncMode::PreviewThenCommit, None) => Self::Propose,
        }
    }

    /// Status string reported to the caller.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Propose => "pending_confirmation",
            Self::Commit => "committed",
            Self::Abort => "aborted",
        }
    }

    pub fn writes(&self) -> bool {
        matches!(self, Self::Commit)
    }
}

/// Row counts written by a committed sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppliedChanges {
    /// Root rows inserted or updated.
    pub upserted: usize,
    pub doors: usize,
    pub fire_doors: usize,
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_delete_always_commits() {
        for mode in [SyncMode::AutoCommit, SyncMode::PreviewThenCommit] {
            for confirm in [None, Some(true), Some(false)] {
                assert_eq!(SyncDecision::decide(mode, confirm, false), SyncDecision::Commit);
            }
        }
    }

    #[test]
    fn preview_mode_gates_deletions() {
        let mode = SyncMode::PreviewThenCommit;
        assert_eq!(SyncDecision::decide(mode, None, true), SyncDecision::Propose);
        assert_eq!(SyncDecision::decide(mode, Some(true), true), SyncDecision::Commit);
        assert_eq!(SyncDecision::decide(mode, Some(false), true), SyncDecision::Abort);
    }

    #[test]
    fn auto_commit_honors_an_explicit_decline() {
        let mode = SyncMode::AutoCommit;
        assert_eq!(SyncDecision::decide(mode, None, true), SyncDecision::Commit);
        assert_eq!(SyncDecision::decide(mode, Some(false), true), SyncDecision::Abort);
    }

    #[test]
    fn statuses() {
        assert_eq!(SyncDecision::Propose.status(), "pending_confirmation");
        assert_eq!(SyncDecision::Commit.status(), "committed");
        assert_eq!(SyncDecision::Abort.status(), "aborted");
        assert!(!SyncDecision::Propose.writes());
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(serde_json::to_value(SyncMode::PreviewThenCommit).unwrap(), "preview_then_commit");
        assert_eq!(
            serde_json::from_value::<SyncMode>(serde_json::json!("auto_commit")).unwrap(),
            SyncMode::AutoCommit
        );
    }
}
