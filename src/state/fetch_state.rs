/// Fetch state definitions for tracking each discovered image URL
///
/// Every URL found in the input document walks through these states exactly once.
use std::fmt;

/// Represents the current state of one discovered image URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// URL extracted from the document, not yet looked up
    Pending,

    /// A usable cache entry with an existing file was found
    CacheHit,

    /// A network fetch has been dispatched for this URL
    Downloading,

    // ===== Terminal States =====
    /// A local file path is available for this URL
    Resolved,

    /// The fetch errored; the URL contributes nothing to the result
    Failed,
}

impl FetchState {
    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Pending -> CacheHit    -> Resolved
    /// Pending -> Downloading -> Resolved | Failed
    /// ```
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::CacheHit)
                | (Self::Pending, Self::Downloading)
                | (Self::CacheHit, Self::Resolved)
                | (Self::Downloading, Self::Resolved)
                | (Self::Downloading, Self::Failed)
        )
    }

    /// Performs a transition, rejecting illegal moves
    pub fn transition(&mut self, next: FetchState) -> crate::Result<()> {
        if !self.can_transition_to(next) {
            return Err(crate::MontageError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Returns a short lowercase label used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CacheHit => "cache_hit",
            Self::Downloading => "downloading",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the local file for a resolved URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageOrigin {
    /// Reused from a previous run's cache entry
    Cached,
    /// Freshly retrieved during this run
    Downloaded,
}

impl ImageOrigin {
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(FetchState::Resolved.is_success());

        assert!(!FetchState::Failed.is_success());
        assert!(!FetchState::CacheHit.is_success());
    }

    #[test]
    fn test_cache_hit_path() {
        let mut state = FetchState::Pending;
        state.transition(FetchState::CacheHit).unwrap();
        state.transition(FetchState::Resolved).unwrap();
        assert_eq!(state, FetchState::Resolved);
    }

    #[test]
    fn test_download_paths() {
        let mut ok = FetchState::Pending;
        ok.transition(FetchState::Downloading).unwrap();
        ok.transition(FetchState::Resolved).unwrap();
        assert!(ok.is_success());

        let mut failed = FetchState::Pending;
        failed.transition(FetchState::Downloading).unwrap();
        failed.transition(FetchState::Failed).unwrap();
        assert!(!failed.is_success());
    }

    #[test]
    fn test_cache_hit_cannot_fail() {
        assert!(!FetchState::CacheHit.can_transition_to(FetchState::Failed));
        assert!(!FetchState::Pending.can_transition_to(FetchState::Resolved));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [
            FetchState::Pending,
            FetchState::CacheHit,
            FetchState::Downloading,
            FetchState::Resolved,
            FetchState::Failed,
        ] {
            assert!(!FetchState::Resolved.can_transition_to(next));
            assert!(!FetchState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_invalid_transition_is_error() {
        let mut state = FetchState::Resolved;
        let err = state.transition(FetchState::Downloading).unwrap_err();
        assert!(matches!(
            err,
            crate::MontageError::InvalidTransition {
                from: FetchState::Resolved,
                to: FetchState::Downloading
            }
        ));
        assert_eq!(state, FetchState::Resolved);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FetchState::CacheHit), "cache_hit");
        assert_eq!(format!("{}", FetchState::Downloading), "downloading");
    }
}
