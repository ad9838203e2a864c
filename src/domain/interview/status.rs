//! Session lifecycle status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The lifecycle state of an interview session.
///
/// - `Collecting`: turns are being exchanged
/// - `Complete`: the model signalled it has everything; read-only from here on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Collecting,
    Complete,
}

impl SessionStatus {
    /// Returns true if the session takes further user turns.
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, Self::Collecting)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (SessionStatus::Collecting, SessionStatus::Complete))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Collecting => vec![SessionStatus::Complete],
            SessionStatus::Complete => vec![],
        }
    }
}
