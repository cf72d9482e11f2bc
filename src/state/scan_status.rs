/// Scan job lifecycle states
///
/// A job moves strictly forward through `Queued -> Visiting -> Analyzing ->
/// Completed`, and may drop to `Failed` from any non-terminal state.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    // ===== Active States =====
    /// Job has been created and is waiting to run
    Queued,

    /// The crawl frontier is fetching pages
    Visiting,

    /// Crawl metrics are final; estimation and narrative are running
    Analyzing,

    // ===== Terminal States =====
    /// Result bundle assembled and recorded
    Completed,

    /// Job failed; the error message is recorded alongside
    Failed,
}

impl ScanStatus {
    /// Returns true if this is a terminal state (no further mutation allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the job is still running or waiting to run
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        match (self, next) {
            (Self::Queued, Self::Visiting)
            | (Self::Visiting, Self::Analyzing)
            | (Self::Analyzing, Self::Completed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Visiting => "visiting",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "visiting" => Some(Self::Visiting),
            "analyzing" => Some(Self::Analyzing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Visiting,
            Self::Analyzing,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!ScanStatus::Queued.is_terminal());
        assert!(!ScanStatus::Visiting.is_terminal());
        assert!(!ScanStatus::Analyzing.is_terminal());

        assert!(ScanStatus::Completed.is_terminal());
        assert!(ScanStatus::Failed.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(ScanStatus::Queued.can_transition_to(ScanStatus::Visiting));
        assert!(ScanStatus::Visiting.can_transition_to(ScanStatus::Analyzing));
        assert!(ScanStatus::Analyzing.can_transition_to(ScanStatus::Completed));

        // No skipping ahead or going back
        assert!(!ScanStatus::Queued.can_transition_to(ScanStatus::Analyzing));
        assert!(!ScanStatus::Queued.can_transition_to(ScanStatus::Completed));
        assert!(!ScanStatus::Visiting.can_transition_to(ScanStatus::Completed));
        assert!(!ScanStatus::Analyzing.can_transition_to(ScanStatus::Visiting));
        assert!(!ScanStatus::Visiting.can_transition_to(ScanStatus::Visiting));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        assert!(ScanStatus::Queued.can_transition_to(ScanStatus::Failed));
        assert!(ScanStatus::Visiting.can_transition_to(ScanStatus::Failed));
        assert!(ScanStatus::Analyzing.can_transition_to(ScanStatus::Failed));

        assert!(!ScanStatus::Completed.can_transition_to(ScanStatus::Failed));
        assert!(!ScanStatus::Failed.can_transition_to(ScanStatus::Failed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [ScanStatus::Completed, ScanStatus::Failed] {
            for next in ScanStatus::all_states() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} should be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in ScanStatus::all_states() {
            let db_str = state.to_db_string();
            let parsed = ScanStatus::from_db_string(db_str);
            assert_eq!(Some(state), parsed, "Failed roundtrip for {:?}", state);
        }
        assert_eq!(ScanStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_display_and_serde_agree() {
        for state in ScanStatus::all_states() {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }
}
