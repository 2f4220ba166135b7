//! Per-index retry state machine
//!
//! Every attempt produces a [`FetchOutcome`]; [`transition`] is the only
//! place that decides what that outcome means for the page index.

use crate::normalizer::DocRecord;
use std::fmt;

/// Classified result of one fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page was rendered, normalized and persisted
    Success(DocRecord),

    /// The index carries no documentation; never retried
    EmptyPage,

    /// Transient failure (render error, timeout, persistence error)
    Failure(String),
}

/// State of one page index during a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active State =====
    /// Not resolved yet; `attempts` attempts have been made
    Pending { attempts: u32 },

    // ===== Terminal States =====
    /// A record was persisted
    Succeeded,

    /// An empty marker was persisted
    EmptyConfirmed,

    /// Every attempt failed; nothing was persisted
    Abandoned,
}

impl PageState {
    /// State of an index before its first attempt
    pub fn initial() -> Self {
        Self::Pending { attempts: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }

    /// Attempts made so far, if still pending
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Pending { attempts } => Some(*attempts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Succeeded => "succeeded",
            Self::EmptyConfirmed => "empty",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advances `state` by the outcome of one attempt
///
/// Terminal states absorb every outcome. A failure on the `max_attempts`-th
/// attempt abandons the index.
pub fn transition(state: PageState, outcome: &FetchOutcome, max_attempts: u32) -> PageState {
    let PageState::Pending { attempts } = state else {
        return state;
    };
    let attempts = attempts + 1;

    match outcome {
        FetchOutcome::Success(_) => PageState::Succeeded,
        FetchOutcome::EmptyPage => PageState::EmptyConfirmed,
        FetchOutcome::Failure(_) if attempts >= max_attempts => PageState::Abandoned,
        FetchOutcome::Failure(_) => PageState::Pending { attempts },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> FetchOutcome {
        FetchOutcome::Failure("render timed out".to_string())
    }

    #[test]
    fn test_success_and_empty_are_terminal() {
        let state = transition(
            PageState::initial(),
            &FetchOutcome::Success(DocRecord::default()),
            3,
        );
        assert_eq!(state, PageState::Succeeded);

        let state = transition(PageState::initial(), &FetchOutcome::EmptyPage, 3);
        assert_eq!(state, PageState::EmptyConfirmed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failures_abandon_after_max_attempts() {
        let mut state = PageState::initial();
        let mut steps = 0;
        while !state.is_terminal() {
            state = transition(state, &failure(), 3);
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(state, PageState::Abandoned);
    }

    #[test]
    fn test_failure_counts_attempts() {
        let state = transition(PageState::initial(), &failure(), 3);
        assert_eq!(state, PageState::Pending { attempts: 1 });
        assert_eq!(state.attempts(), Some(1));

        let state = transition(state, &FetchOutcome::EmptyPage, 3);
        assert_eq!(state, PageState::EmptyConfirmed);
        assert_eq!(state.attempts(), None);
    }

    #[test]
    fn test_single_attempt_budget() {
        assert_eq!(
            transition(PageState::initial(), &failure(), 1),
            PageState::Abandoned
        );
    }

    #[test]
    fn test_terminal_states_absorb() {
        for terminal in [
            PageState::Succeeded,
            PageState::EmptyConfirmed,
            PageState::Abandoned,
        ] {
            assert_eq!(transition(terminal, &failure(), 3), terminal);
            assert_eq!(transition(terminal, &FetchOutcome::EmptyPage, 3), terminal);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::initial().to_string(), "pending");
        assert_eq!(PageState::EmptyConfirmed.to_string(), "empty");
    }
}
