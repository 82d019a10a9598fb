/// Pagination state definitions for index discovery
///
/// After each index page the discoverer transitions to either `Continue` or a
/// terminal `Stop`. Stopping is never an error: the identifiers accumulated so
/// far are always returned.
use crate::crawler::FetchFailure;
use std::fmt;

/// Why index discovery stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    // ===== Clean Termination =====
    /// The configured page bound was reached
    MaxPagesReached,

    /// The index returned HTTP 404 for the next page
    NotFound,

    /// The page contained no listing identifiers
    EmptyPage,

    /// The page repeated the previous page's identifier set
    RepeatedPage,

    // ===== Degraded Termination =====
    /// The page could not be fetched (timeout, rate limit exhausted, server error)
    FetchFailed(FetchFailure),

    // ===== Special =====
    /// The caller cancelled the run
    Cancelled,
}

impl StopReason {
    /// Returns true if pagination ended on a normal end-of-index signal
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            Self::MaxPagesReached | Self::NotFound | Self::EmptyPage | Self::RepeatedPage
        )
    }

    /// Returns true if the source became unreachable mid-walk
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::FetchFailed(_))
    }

    /// Short machine-readable label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxPagesReached => "max_pages_reached",
            Self::NotFound => "not_found",
            Self::EmptyPage => "empty_page",
            Self::RepeatedPage => "repeated_page",
            Self::FetchFailed(_) => "fetch_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(failure) => write!(f, "{} ({})", self.as_str(), failure),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Outcome of examining one index page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// Fetch the next page
    Continue,

    /// Pagination has ended
    Stop(StopReason),
}

impl DiscoveryState {
    /// Returns true if no further pages will be fetched
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop(_))
    }

    /// Returns the stop reason, if terminal
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Continue => None,
            Self::Stop(reason) => Some(*reason),
        }
    }
}

impl From<FetchFailure> for DiscoveryState {
    /// Maps a failed index fetch onto the matching stop state
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::NotFound => Self::Stop(StopReason::NotFound),
            FetchFailure::Cancelled => Self::Stop(StopReason::Cancelled),
            other => Self::Stop(StopReason::FetchFailed(other)),
        }
    }
}
