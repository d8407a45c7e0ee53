#![forbid(unsafe_code)]

//! Core types for the veil modal presentation manager.
//!
//! This crate provides:
//! - [`ModalRequest`] and its validated form [`ValidatedRequest`]
//! - [`HostState`] for the external interaction-state collaborators
//! - [`ModalEvent`] for the user input the manager reacts to
//! - [`ManagerConfig`] for timing and stacking policy
//!
//! Optional features add remote event decoding (`serde`), TOML policy files
//! (`policy-config`) and subscriber bootstrap (`logging`, `tracing-json`).

pub mod config;
pub mod event;
pub mod host;
#[cfg(feature = "logging")]
pub mod logging;
#[cfg(feature = "serde")]
pub mod remote;
pub mod request;

pub use config::{ConfigError, ManagerConfig};
pub use event::{DismissTrigger, HitTarget, Key, ModalEvent, SurfaceId};
pub use host::{GateRefusal, HostState, InteractionState, check_gate};
pub use request::{
    ChoiceOptions, ModalKind, ModalRequest, OnSelect, RequestError, RequestFingerprint,
    ValidatedRequest,
};

/// Monotonic timestamp used for every scheduling decision.
pub use web_time::Instant;
