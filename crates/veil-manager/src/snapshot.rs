#![forbid(unsafe_code)]

//! Introspection for supervisory and debug collaborators.
//!
//! Two surfaces are exposed: a point-in-time [`ManagerSnapshot`], and a
//! stream of [`ModalActivity`] events delivered to observers registered
//! through [`ModalManager::subscribe`](crate::ModalManager::subscribe).
//!
//! Observers are stored as `Weak` callbacks and pruned lazily on the next
//! notification after their [`Subscription`] guard is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use veil_core::{DismissTrigger, ModalKind, SurfaceId};

use crate::stack::TrackedModal;

/// Phase of the presentation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhaseKind {
    /// Nothing in flight.
    Idle,
    /// Admitted, waiting for the settle delay.
    Admitting,
    /// Visible and listening for dismissal.
    Displaying,
    /// Exit transition running.
    Dismissing,
}

/// Point-in-time view of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ManagerSnapshot {
    pub active_modals: usize,
    pub stack_counter: u32,
    pub is_presenting: bool,
    pub pending_queue: usize,
    /// Titles of the queued requests, oldest first.
    pub pending_titles: Vec<String>,
    pub phase: PhaseKind,
    /// Individual dismissal handlers currently subscribed.
    pub live_handlers: usize,
    pub shown_total: u64,
    pub rejected_total: u64,
    /// Queued requests dropped at drain time or by a force close.
    pub dropped_total: u64,
    pub dismissed_total: u64,
    /// Title of the most recently displayed modal.
    pub last_shown: Option<String>,
    /// Tracked surfaces, bottom to top.
    pub tracked: Vec<TrackedModal>,
}

/// Something observable happened inside the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum ModalActivity {
    Queued {
        title: String,
        position: usize,
    },
    Rejected {
        kind: ModalKind,
        reason: String,
    },
    Shown {
        surface: SurfaceId,
        title: String,
        stack_order: u32,
    },
    Dismissing {
        surface: SurfaceId,
        trigger: DismissTrigger,
    },
    Dismissed {
        surface: SurfaceId,
    },
    Selected {
        surface: SurfaceId,
        ordinal: usize,
    },
    /// An admitted request was discarded before it could be shown.
    Dropped {
        title: String,
        reason: String,
    },
    ForceClosed {
        dropped: usize,
    },
}

type Callback = RefCell<dyn FnMut(&ModalActivity)>;

/// RAII guard for an activity observer. Dropping it unsubscribes.
#[must_use = "dropping this guard unsubscribes the observer"]
pub struct Subscription {
    _callback: Rc<Callback>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct Observers {
    callbacks: Vec<Weak<Callback>>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, callback: impl FnMut(&ModalActivity) + 'static) -> Subscription {
        let callback: Rc<Callback> = Rc::new(RefCell::new(callback));
        self.callbacks.push(Rc::downgrade(&callback));
        Subscription {
            _callback: callback,
        }
    }

    pub(crate) fn notify(&mut self, activity: &ModalActivity) {
        self.callbacks.retain(|weak| weak.strong_count() > 0);
        for weak in &self.callbacks {
            let Some(callback) = weak.upgrade() else {
                continue;
            };
            // A re-entrant notification from inside an observer is skipped.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(activity);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
