#![forbid(unsafe_code)]

//! Input events routed to the manager, and the dismissal triggers they map to.

use std::fmt;

/// Stable identifier of a modal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SurfaceId(&'static str);

impl SurfaceId {
    /// The surface rendering [`ModalKind::Choice`](crate::ModalKind::Choice).
    pub const CHOICE: Self = Self("choice-modal");

    #[must_use]
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Exact target of a pointer event on a modal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The dimmed backdrop itself.
    Backdrop,
    /// Anything inside the modal content box.
    Content,
}

/// Keyboard input relevant to modals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The cancel key (Escape).
    Cancel,
    Other(char),
}

/// Events the host forwards to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    /// The dedicated close control was activated.
    CloseControl { surface: SurfaceId },
    /// A click or tap landed on the surface.
    BackdropClick { surface: SurfaceId, target: HitTarget },
    /// A key was pressed anywhere in the application.
    Key(Key),
    /// An option entry was activated.
    Select { surface: SurfaceId, ordinal: usize },
}

/// What caused a modal to be dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DismissTrigger {
    CloseControl,
    Backdrop,
    CancelKey,
    /// An option was selected.
    Selection,
}

impl fmt::Display for DismissTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CloseControl => "close_control",
            Self::Backdrop => "backdrop",
            Self::CancelKey => "cancel_key",
            Self::Selection => "selection",
        };
        f.write_str(name)
    }
}
