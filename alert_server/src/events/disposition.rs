//! What happens to an alert once an analyst acts on it.

use serde::{Deserialize, Serialize};

/// The analyst's judgment of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Nothing wrong: record it and move on.
    AllClear,
    /// A real problem: tell the team, then record it.
    Issue,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::AllClear => "all_clear",
            Disposition::Issue => "issue",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DispositionEvent {
    /// Chart rendered and notes field open.
    Viewed,
    /// The chat message for an issue was delivered.
    NotificationSent,
    /// The annotation row was appended.
    AnnotationRecorded { disposition: Disposition },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionState {
    #[default]
    Viewing,
    Recorded,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("alert already recorded; select it again to record another disposition")]
    AlreadyRecorded,
    #[error("issue must be announced before it is recorded")]
    NotNotified,
}

/// Aggregate state for one alert selection.
#[derive(Debug, Clone, Default)]
pub struct DispositionAggregate {
    pub state: DispositionState,
    pub notified: bool,
    pub disposition: Option<Disposition>,
}

impl DispositionAggregate {
    pub fn apply(&mut self, event: &DispositionEvent) -> Result<(), TransitionError> {
        if self.state == DispositionState::Recorded {
            return Err(TransitionError::AlreadyRecorded);
        }
        match event {
            DispositionEvent::Viewed => {
                self.notified = false;
                self.disposition = None;
            }
            DispositionEvent::NotificationSent => {
                self.notified = true;
            }
            DispositionEvent::AnnotationRecorded { disposition } => {
                if *disposition == Disposition::Issue && !self.notified {
                    return Err(TransitionError::NotNotified);
                }
                self.disposition = Some(*disposition);
                self.state = DispositionState::Recorded;
            }
        }
        Ok(())
    }

    /// Start a fresh selection in `Viewing`.
    pub fn viewing() -> Self {
        let mut aggregate = Self::default();
        // Viewed is always legal from the default state.
        let _ = aggregate.apply(&DispositionEvent::Viewed);
        aggregate
    }
}
