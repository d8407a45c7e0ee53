#![forbid(unsafe_code)]

//! Dismissal handler subscriptions.
//!
//! Each displayed modal gets exactly one handler set: close control,
//! backdrop and cancel key. Any of them firing releases all three at once,
//! so a second trigger on the same modal finds nothing to fire and a
//! dismissed modal never keeps listening.
//!
//! # Invariants
//!
//! - At most one live set per surface; installing over a live set releases it first.
//! - `release` is idempotent.

use ahash::AHashMap;
use bitflags::bitflags;
use tracing::debug;
use veil_core::{DismissTrigger, SurfaceId};

bitflags! {
    /// Dismissal triggers a handler set listens for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DismissTriggers: u8 {
        const CLOSE_CONTROL = 1;
        const BACKDROP = 1 << 1;
        const CANCEL_KEY = 1 << 2;
    }
}

impl DismissTriggers {
    /// The handler flag for a trigger. Selection is not a handler: option
    /// entries are part of the surface content.
    #[must_use]
    pub fn for_trigger(trigger: DismissTrigger) -> Option<Self> {
        match trigger {
            DismissTrigger::CloseControl => Some(Self::CLOSE_CONTROL),
            DismissTrigger::Backdrop => Some(Self::BACKDROP),
            DismissTrigger::CancelKey => Some(Self::CANCEL_KEY),
            DismissTrigger::Selection => None,
        }
    }
}

/// Identifier of one installed handler set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerSetId(u64);

impl HandlerSetId {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct HandlerSet {
    id: HandlerSetId,
    triggers: DismissTriggers,
}

/// Live dismissal handlers, keyed by surface.
#[derive(Debug)]
pub struct HandlerRegistry {
    sets: AHashMap<SurfaceId, HandlerSet>,
    next_id: u64,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: AHashMap::new(),
            next_id: 1,
        }
    }

    /// Install all three dismissal triggers for `surface`.
    pub fn install(&mut self, surface: SurfaceId) -> HandlerSetId {
        if let Some(stale) = self.release(surface) {
            debug!(target: "veil::handlers", %surface, stale = stale.id(), "released stale handler set");
        }
        let id = HandlerSetId(self.next_id);
        self.next_id += 1;
        self.sets.insert(
            surface,
            HandlerSet {
                id,
                triggers: DismissTriggers::all(),
            },
        );
        id
    }

    /// Whether `surface` currently listens for `trigger`.
    #[must_use]
    pub fn accepts(&self, surface: SurfaceId, trigger: DismissTriggers) -> bool {
        self.sets
            .get(&surface)
            .is_some_and(|set| set.triggers.contains(trigger))
    }

    #[must_use]
    pub fn is_live(&self, surface: SurfaceId) -> bool {
        self.sets.contains_key(&surface)
    }

    /// Unsubscribe every trigger of `surface`'s set.
    pub fn release(&mut self, surface: SurfaceId) -> Option<HandlerSetId> {
        self.sets.remove(&surface).map(|set| set.id)
    }

    /// Unsubscribe everything. Returns the number of sets released.
    pub fn clear(&mut self) -> usize {
        let released = self.sets.len();
        self.sets.clear();
        released
    }

    /// Number of individual live handlers across all sets.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.sets
            .values()
            .map(|set| set.triggers.bits().count_ones() as usize)
            .sum()
    }
}
