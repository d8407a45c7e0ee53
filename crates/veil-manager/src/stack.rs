#![forbid(unsafe_code)]

//! Stacking order for tracked modal surfaces.
//!
//! The `ModalStack` records which surfaces are currently visible and the
//! paint/interaction priority assigned to each. Insertion order is stacking
//! order: the last entry is the most recently tracked modal.
//!
//! # Invariants
//!
//! - Stack order is strictly increasing: a newly tracked surface is always
//!   above every surface already tracked.
//! - The counter grows by a fixed step per `track` and returns to its base
//!   value whenever the stack becomes empty.
//! - A surface appears at most once.
//!
//! # Failure Modes
//!
//! - `untrack()` of an untracked surface returns `false` (no panic).
//! - `order_of()` for an untracked surface returns `None`.
//! - Counter overflow saturates at `u32::MAX`; it is reset long before that
//!   in practice because every dismissal that empties the stack resets it.
//!
//! # Example
//!
//! ```ignore
//! let mut stack = ModalStack::new(1000, 10);
//!
//! let first = stack.track(SurfaceId::CHOICE);          // 1010
//! let second = stack.track(SurfaceId::new("ship"));    // 1020
//! assert!(stack.is_top(SurfaceId::new("ship")));
//!
//! stack.untrack(SurfaceId::new("ship"));
//! stack.untrack(SurfaceId::CHOICE);
//! assert_eq!(stack.counter(), 1000);
//! ```

use veil_core::{ManagerConfig, SurfaceId};

/// A currently visible surface and its stacking priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackedModal {
    pub surface: SurfaceId,
    pub stack_order: u32,
}

/// Visible surfaces in stacking order (bottom to top).
#[derive(Debug, Clone)]
pub struct ModalStack {
    modals: Vec<TrackedModal>,
    base: u32,
    step: u32,
    counter: u32,
}

impl Default for ModalStack {
    fn default() -> Self {
        Self::new(1000, 10)
    }
}

impl ModalStack {
    /// Create an empty stack. A zero `step` is treated as one.
    #[must_use]
    pub fn new(base: u32, step: u32) -> Self {
        Self {
            modals: Vec::new(),
            base,
            step: step.max(1),
            counter: base,
        }
    }

    #[must_use]
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(config.stack_base, config.stack_step)
    }

    // --- Stack Operations ---

    /// Track a surface, assigning it a priority above every tracked surface.
    ///
    /// A surface that is already tracked is re-stacked on top.
    /// Returns the assigned stack order.
    pub fn track(&mut self, surface: SurfaceId) -> u32 {
        self.counter = self.counter.saturating_add(self.step);
        let stack_order = self.counter;
        if let Some(idx) = self.modals.iter().position(|m| m.surface == surface) {
            self.modals.remove(idx);
        }
        self.modals.push(TrackedModal {
            surface,
            stack_order,
        });
        stack_order
    }

    /// Stop tracking a surface.
    ///
    /// Returns `true` if the surface was tracked. Resets the counter when the
    /// stack becomes empty.
    pub fn untrack(&mut self, surface: SurfaceId) -> bool {
        let Some(idx) = self.modals.iter().position(|m| m.surface == surface) else {
            return false;
        };
        self.modals.remove(idx);
        if self.modals.is_empty() {
            self.counter = self.base;
        }
        true
    }

    /// Drop every tracked surface and reset the counter.
    ///
    /// Returns the surfaces that were tracked, bottom to top.
    pub fn clear(&mut self) -> Vec<TrackedModal> {
        self.counter = self.base;
        std::mem::take(&mut self.modals)
    }

    // --- State Queries ---

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modals.is_empty()
    }

    /// Number of tracked surfaces.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.modals.len()
    }

    #[must_use]
    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.modals.iter().any(|m| m.surface == surface)
    }

    /// Whether `surface` is the most recently tracked surface.
    #[must_use]
    pub fn is_top(&self, surface: SurfaceId) -> bool {
        self.top().is_some_and(|m| m.surface == surface)
    }

    #[must_use]
    pub fn top(&self) -> Option<TrackedModal> {
        self.modals.last().copied()
    }

    #[must_use]
    pub fn order_of(&self, surface: SurfaceId) -> Option<u32> {
        self.modals
            .iter()
            .find(|m| m.surface == surface)
            .map(|m| m.stack_order)
    }

    /// Current counter value (the order of the most recent `track`).
    #[inline]
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Tracked surfaces, bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrackedModal> {
        self.modals.iter()
    }

    /// Tracked surfaces, top to bottom.
    pub fn iter_top_down(&self) -> impl Iterator<Item = &TrackedModal> {
        self.modals.iter().rev()
    }
}
