//! Resolution stages: CheckCache → ResolveEnglish → Translate → PersistAndReturn.
//! English requests skip Translate; cache hits end straight away.

use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CheckCache,
    ResolveEnglish,
    Translate,
    PersistAndReturn,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::CheckCache => write!(f, "CheckCache"),
            Stage::ResolveEnglish => write!(f, "ResolveEnglish"),
            Stage::Translate => write!(f, "Translate"),
            Stage::PersistAndReturn => write!(f, "PersistAndReturn"),
        }
    }
}

impl Stage {
    /// Returns whether moving from `self` to `next` is valid.
    pub fn can_transition_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::CheckCache, Stage::ResolveEnglish)
                | (Stage::CheckCache, Stage::PersistAndReturn) // cache hit
                | (Stage::ResolveEnglish, Stage::Translate)
                | (Stage::ResolveEnglish, Stage::PersistAndReturn) // English request or not found
                | (Stage::Translate, Stage::PersistAndReturn)
        )
    }
}

/// Per-request stage tracker. Not shared between requests, so no locking.
pub struct StageTracker {
    current: Stage,
    subject: String,
}

impl StageTracker {
    pub fn new(subject: &str) -> Self {
        Self {
            current: Stage::CheckCache,
            subject: subject.to_string(),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Move to `next`. An invalid move is logged and refused; the tracker
    /// keeps its current stage.
    pub fn advance(&mut self, next: Stage) -> bool {
        if !self.current.can_transition_to(next) {
            warn!(subject = %self.subject, from = %self.current, to = %next, "invalid stage transition");
            return false;
        }
        trace!(subject = %self.subject, from = %self.current, to = %next, "stage_transition");
        self.current = next;
        true
    }
}
