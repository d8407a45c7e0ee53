#![forbid(unsafe_code)]

//! Modal presentation manager.
//!
//! [`ModalManager`] decides whether, when and in what order a requested
//! modal is shown. It serializes concurrent show-requests through a FIFO
//! queue, keeps a strictly increasing stacking order for tracked surfaces,
//! and guarantees every displayed modal can be dismissed through three
//! independent triggers without leaking handlers.
//!
//! # Execution model
//!
//! Everything runs on one control thread. Time never passes inside the
//! manager: callers pass the current [`Instant`](veil_core::Instant) and call
//! [`ModalManager::tick`] when [`ModalManager::next_deadline`] is reached.
//! Between two calls arbitrary other events may arrive; the phase machine
//! (`Idle → Admitting → Displaying → Dismissing → Idle`) and the pending
//! queue are the only concurrency-control primitives.
//!
//! # Example
//!
//! ```ignore
//! use veil_core::{ManagerConfig, ModalRequest};
//! use veil_manager::ModalManager;
//!
//! let mut manager = ModalManager::new(ManagerConfig::default(), host)
//!     .with_surface(choice_surface);
//!
//! manager.request_show(ModalRequest::choice("Pick one", ["Go north", "Go south"], send), now);
//! manager.tick(now + settle);
//! ```

pub mod admission;
pub mod handlers;
pub mod manager;
pub mod queue;
pub mod snapshot;
pub mod stack;
pub mod surface;

pub use admission::{Admission, DuplicateFilter, Rejection};
pub use handlers::{DismissTriggers, HandlerRegistry, HandlerSetId};
pub use manager::{Dispatched, EventOutcome, ModalManager};
pub use queue::{PendingQueue, QueuedRequest};
pub use snapshot::{ManagerSnapshot, ModalActivity, PhaseKind, Subscription};
pub use stack::{ModalStack, TrackedModal};
pub use surface::{ChoiceEntry, ModalSurface, SurfaceContent, SurfaceRegistry};
