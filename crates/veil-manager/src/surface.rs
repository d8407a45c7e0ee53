#![forbid(unsafe_code)]

//! Modal surfaces and the registry that owns them.
//!
//! A surface is the visual element a modal is painted into. Rendering is
//! the host's business; the manager only drives a surface through its
//! lifecycle: reset, populate, stack, enter, exit, hide.
//!
//! # Failure Modes
//!
//! - A surface whose structural elements are missing reports
//!   `has_structure() == false`; the manager treats that as a recoverable
//!   wiring defect and never populates it.
//! - Registering a second surface with the same id replaces the first.

use ahash::AHashMap;
use veil_core::{ChoiceOptions, ModalKind, SurfaceId};

/// One interactive entry in a choice surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceEntry {
    /// 1-based ordinal reported to the request's callback.
    pub ordinal: usize,
    /// Ordinal-prefixed label, e.g. `"2. Go south"`.
    pub label: String,
}

/// Content handed to a surface when it is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceContent {
    pub kind: ModalKind,
    pub title: String,
    pub entries: Vec<ChoiceEntry>,
}

impl SurfaceContent {
    /// Build choice content with one ordinal-prefixed entry per option.
    #[must_use]
    pub fn choice(title: &str, options: &ChoiceOptions) -> Self {
        Self {
            kind: ModalKind::Choice,
            title: title.to_owned(),
            entries: options
                .numbered()
                .map(|(ordinal, label)| ChoiceEntry { ordinal, label })
                .collect(),
        }
    }

    /// Entry labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }
}

/// A visual surface the manager can present a modal on.
pub trait ModalSurface {
    /// Stable identifier of this surface.
    fn id(&self) -> SurfaceId;

    /// Whether the title, entry list and close control are all present.
    fn has_structure(&self) -> bool;

    /// Clear any residual content and make the surface non-visible.
    ///
    /// A no-op when nothing is showing.
    fn reset(&mut self);

    /// Replace the surface content.
    fn populate(&mut self, content: &SurfaceContent);

    /// Apply the paint/interaction priority.
    fn set_stack_order(&mut self, order: u32);

    /// Make the surface visible and start its entrance transition.
    fn begin_entrance(&mut self);

    /// Start the exit transition. The surface stays visible until [`hide`](Self::hide).
    fn begin_exit(&mut self);

    /// Make the surface non-visible after its exit transition.
    fn hide(&mut self);

    /// Hide immediately, bypassing transitions, and clear content.
    fn force_hide(&mut self) {
        self.reset();
    }
}

/// All surfaces known to the manager, keyed by id.
#[derive(Default)]
pub struct SurfaceRegistry {
    surfaces: AHashMap<SurfaceId, Box<dyn ModalSurface>>,
}

impl std::fmt::Debug for SurfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl SurfaceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface, returning the one it replaced, if any.
    pub fn register(&mut self, surface: Box<dyn ModalSurface>) -> Option<Box<dyn ModalSurface>> {
        self.surfaces.insert(surface.id(), surface)
    }

    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&(dyn ModalSurface + 'static)> {
        self.surfaces.get(&id).map(|surface| &**surface)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut (dyn ModalSurface + 'static)> {
        match self.surfaces.get_mut(&id) {
            Some(surface) => Some(surface.as_mut()),
            None => None,
        }
    }

    #[must_use]
    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// Registered ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.surfaces.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn ModalSurface + 'static)> {
        self.surfaces.values_mut().map(|surface| &mut **surface)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
