use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "submissionstatus", rename_all = "UPPERCASE")]
pub(crate) enum SubmissionStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl SubmissionStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Statuses a record may hold immediately before moving to `self`.
    /// Nothing ever moves back to `Pending`.
    pub(crate) fn predecessors(self) -> &'static [SubmissionStatus] {
        match self {
            Self::Pending => &[],
            Self::Processing => &[Self::Pending],
            Self::Complete => &[Self::Processing],
            Self::Failed => &[Self::Pending, Self::Processing],
        }
    }

    pub(crate) fn can_transition_to(self, next: SubmissionStatus) -> bool {
        next.predecessors().contains(&self)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SubmissionStatus::{self, *};

    const ALL: [SubmissionStatus; 4] = [Pending, Processing, Complete, Failed];

    #[test]
    fn status_only_moves_forward() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Complete));
        assert!(Processing.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Complete));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Complete.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Complete));
    }

    #[test]
    fn nothing_returns_to_pending() {
        for status in ALL {
            assert!(!status.can_transition_to(Pending), "{status} must not return to PENDING");
        }
    }

    #[test]
    fn terminal_statuses_have_no_successor() {
        for status in ALL.into_iter().filter(|status| status.is_terminal()) {
            for next in ALL {
                assert!(!status.can_transition_to(next), "{status} -> {next}");
            }
        }
    }

    #[test]
    fn serializes_as_uppercase() {
        assert_eq!(serde_json::to_value(Processing).unwrap(), "PROCESSING");
        let parsed: SubmissionStatus = serde_json::from_value("COMPLETE".into()).unwrap();
        assert_eq!(parsed, Complete);
    }
}
