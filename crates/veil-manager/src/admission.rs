#![forbid(unsafe_code)]

//! Admission outcomes and duplicate-burst suppression.
//!
//! Upstream notifications are redundant: the same choice can arrive several
//! times within a few milliseconds. [`DuplicateFilter`] remembers the
//! fingerprints admitted in a sliding window and refuses repeats.
//!
//! # Invariants
//!
//! - A fingerprint is recorded only when it passes the filter.
//! - Entries older than the window are pruned before every check, so the
//!   filter's memory is bounded by the admission rate times the window.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use veil_core::{GateRefusal, Instant, RequestError, RequestFingerprint, SurfaceId};

/// Why a show-request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The request content is malformed.
    Malformed(RequestError),
    /// The host is not in a state that permits modals.
    Refused(GateRefusal),
    /// A structurally identical request was admitted `age` ago.
    Duplicate { age: Duration },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed request: {err}"),
            Self::Refused(refusal) => write!(f, "refused by host: {refusal}"),
            Self::Duplicate { age } => {
                write!(f, "duplicate of a request admitted {}ms ago", age.as_millis())
            }
        }
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Refused(refusal) => Some(refusal),
            Self::Duplicate { .. } => None,
        }
    }
}

/// Result of [`ModalManager::request_show`](crate::ModalManager::request_show).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Admission {
    /// Admitted; the surface will be populated once the settle delay elapses.
    Started { surface: SurfaceId },
    /// Another modal is in flight; the request waits at `position` (1-based).
    Queued { position: usize },
    /// Refused. The request's callback has been dropped without being called.
    Rejected(Rejection),
}

impl Admission {
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Sliding-window memory of recently admitted fingerprints.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    window: Duration,
    recent: VecDeque<(RequestFingerprint, Instant)>,
}

impl DuplicateFilter {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent: VecDeque::new(),
        }
    }

    /// Refuse `fingerprint` if it was recorded within the window, else record it.
    ///
    /// # Errors
    ///
    /// Returns the age of the earlier admission.
    pub fn check_and_record(
        &mut self,
        fingerprint: RequestFingerprint,
        now: Instant,
    ) -> Result<(), Duration> {
        self.prune(now);
        if let Some((_, at)) = self.recent.iter().find(|(seen, _)| *seen == fingerprint) {
            return Err(now.saturating_duration_since(*at));
        }
        self.recent.push_back((fingerprint, now));
        Ok(())
    }

    fn prune(&mut self, now: Instant) {
        while let Some((_, at)) = self.recent.front() {
            if now.saturating_duration_since(*at) < self.window {
                break;
            }
            self.recent.pop_front();
        }
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.recent.clear();
    }

    /// Number of fingerprints currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
