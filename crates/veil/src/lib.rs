#![forbid(unsafe_code)]

//! veil public facade.
//!
//! Re-exports the request and host types from `veil-core` and the
//! presentation manager from `veil-manager`. Most applications only need
//! the [`prelude`].
//!
//! ```ignore
//! use veil::prelude::*;
//!
//! let mut manager = ModalManager::new(ManagerConfig::default(), host).with_surface(surface);
//! let admission = manager.request_show(
//!     ModalRequest::choice("Pick one", ["Go north", "Go south"], |n| send_choice(n)),
//!     Instant::now(),
//! );
//! ```

pub use veil_core::{
    ChoiceOptions, ConfigError, DismissTrigger, GateRefusal, HitTarget, HostState, Instant,
    InteractionState, Key, ManagerConfig, ModalEvent, ModalKind, ModalRequest, RequestError,
    SurfaceId,
};
pub use veil_manager::{
    Admission, Dispatched, EventOutcome, ManagerSnapshot, ModalActivity, ModalManager,
    ModalSurface, PhaseKind, Rejection, Subscription, SurfaceContent,
};

#[cfg(feature = "serde")]
pub use veil_core::remote::RemoteEvent;

pub mod prelude {
    //! Everything needed to drive a manager from an application loop.

    pub use crate::{
        Admission, DismissTrigger, Dispatched, EventOutcome, HitTarget, HostState, Instant,
        InteractionState, Key, ManagerConfig, ModalEvent, ModalManager, ModalRequest,
        ModalSurface, SurfaceContent, SurfaceId,
    };
}
