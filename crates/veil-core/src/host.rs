#![forbid(unsafe_code)]

//! Host collaborators consulted before a modal may appear.
//!
//! The manager never owns screen or session state. It polls a [`HostState`]
//! synchronously at admission, at display time and when draining its queue.

use std::fmt;

/// Coarse interaction state reported by the host's screen machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InteractionState {
    Initializing,
    Menu,
    Loading,
    /// The one state in which modals are permitted.
    Active,
    Other,
}

impl InteractionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Menu => "menu",
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the host application, polled by the manager.
pub trait HostState {
    /// Which screen is currently active.
    fn interaction_state(&self) -> InteractionState;

    /// Whether the host is still initializing or loading a session.
    fn is_initializing(&self) -> bool;

    /// Whether a live interactive session exists.
    fn has_live_session(&self) -> bool;
}

/// Why the host refused to let a modal appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRefusal {
    /// The host is not in [`InteractionState::Active`].
    NotInteractive(InteractionState),
    /// The host is initializing.
    Initializing,
    /// No live session; the request outlived its originating session.
    NoSession,
}

impl fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInteractive(state) => write!(f, "host is not interactive (state: {state})"),
            Self::Initializing => write!(f, "host is initializing"),
            Self::NoSession => write!(f, "no live session"),
        }
    }
}

impl std::error::Error for GateRefusal {}

/// Check every host gate in order: interaction state, initialization, session.
///
/// # Errors
///
/// Returns the first gate that refuses.
pub fn check_gate(host: &dyn HostState) -> Result<(), GateRefusal> {
    match host.interaction_state() {
        InteractionState::Active => {}
        other => return Err(GateRefusal::NotInteractive(other)),
    }
    if host.is_initializing() {
        return Err(GateRefusal::Initializing);
    }
    if !host.has_live_session() {
        return Err(GateRefusal::NoSession);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        state: InteractionState,
        initializing: bool,
        session: bool,
    }

    impl HostState for Fixed {
        fn interaction_state(&self) -> InteractionState {
            self.state
        }
        fn is_initializing(&self) -> bool {
            self.initializing
        }
        fn has_live_session(&self) -> bool {
            self.session
        }
    }

    fn host(state: InteractionState, initializing: bool, session: bool) -> Fixed {
        Fixed {
            state,
            initializing,
            session,
        }
    }

    #[test]
    fn active_ready_host_passes() {
        assert_eq!(check_gate(&host(InteractionState::Active, false, true)), Ok(()));
    }

    #[test]
    fn non_active_states_refused() {
        for state in [
            InteractionState::Initializing,
            InteractionState::Menu,
            InteractionState::Loading,
            InteractionState::Other,
        ] {
            assert_eq!(
                check_gate(&host(state, false, true)),
                Err(GateRefusal::NotInteractive(state))
            );
        }
    }

    #[test]
    fn state_checked_before_initialization() {
        assert_eq!(
            check_gate(&host(InteractionState::Loading, true, false)),
            Err(GateRefusal::NotInteractive(InteractionState::Loading))
        );
    }

    #[test]
    fn initializing_refused() {
        assert_eq!(
            check_gate(&host(InteractionState::Active, true, true)),
            Err(GateRefusal::Initializing)
        );
    }

    #[test]
    fn missing_session_refused() {
        assert_eq!(
            check_gate(&host(InteractionState::Active, false, false)),
            Err(GateRefusal::NoSession)
        );
    }

    #[test]
    fn refusal_display() {
        assert_eq!(
            GateRefusal::NotInteractive(InteractionState::Menu).to_string(),
            "host is not interactive (state: menu)"
        );
    }
}
