#![forbid(unsafe_code)]

//! Integration tests: which show-requests are honored, queued or refused.

use proptest::prelude::*;
use veil_core::{GateRefusal, InteractionState, ModalKind, ModalRequest, RequestError};
use veil_harness::{ActivityLog, Rig, SelectionRecorder, strategy};
use veil_manager::{Admission, ModalActivity, PhaseKind, Rejection};

// ============================================================================
// Content validation
// ============================================================================

#[test]
fn empty_options_never_display() {
    let mut rig = Rig::new();
    let admission = rig.show("x", &[]);
    assert_eq!(
        admission,
        Admission::Rejected(Rejection::Malformed(RequestError::EmptyOptions))
    );

    rig.advance_ms(1_000);
    let snapshot = rig.snapshot();
    assert_eq!(snapshot.active_modals, 0);
    assert!(!snapshot.is_presenting);
    assert_eq!(rig.surface.log().entrances, 0);
    assert!(rig.selections.is_empty());
}

#[test]
fn missing_options_never_display() {
    let mut rig = Rig::new();
    let request = ModalRequest::from_parts(
        ModalKind::Choice,
        "x",
        None,
        rig.selections.callback("x"),
    );
    let admission = rig.manager.request_show(request, rig.clock.now());
    assert_eq!(
        admission.rejection(),
        Some(&Rejection::Malformed(RequestError::MissingOptions))
    );
    rig.advance_ms(1_000);
    assert_eq!(rig.surface.log().entrances, 0);
    assert!(rig.selections.is_empty());
}

#[test]
fn blank_options_never_display() {
    let mut rig = Rig::new();
    let admission = rig.show("x", &["", "   ", "\t"]);
    assert_eq!(
        admission.rejection(),
        Some(&Rejection::Malformed(RequestError::NoValidOptions {
            discarded: 3
        }))
    );
    assert_eq!(rig.snapshot().rejected_total, 1);
}

#[test]
fn options_are_trimmed_and_blanks_dropped() {
    let mut rig = Rig::new();
    assert!(rig.show("Pick", &["  Go north ", "", "Go south"]).is_started());
    rig.settle();
    assert_eq!(rig.surface.log().labels(), vec!["1. Go north", "2. Go south"]);
}

#[test]
fn blank_title_uses_default() {
    let mut rig = Rig::new();
    assert!(rig.show("   ", &["a"]).is_started());
    rig.settle();
    assert_eq!(rig.snapshot().last_shown.as_deref(), Some("Make a Choice"));
}

// ============================================================================
// Host gates
// ============================================================================

#[test]
fn refused_outside_active_state() {
    for state in [
        InteractionState::Initializing,
        InteractionState::Menu,
        InteractionState::Loading,
        InteractionState::Other,
    ] {
        let mut rig = Rig::new();
        rig.host.set_state(state);
        assert_eq!(
            rig.show("x", &["a"]),
            Admission::Rejected(Rejection::Refused(GateRefusal::NotInteractive(state)))
        );
        assert_eq!(rig.snapshot().pending_queue, 0);
    }
}

#[test]
fn refused_while_initializing() {
    let mut rig = Rig::new();
    rig.host.set_initializing(true);
    assert_eq!(
        rig.show("x", &["a"]).rejection(),
        Some(&Rejection::Refused(GateRefusal::Initializing))
    );
}

#[test]
fn refused_without_session() {
    let mut rig = Rig::new();
    rig.host.set_session(false);
    assert_eq!(
        rig.show("x", &["a"]).rejection(),
        Some(&Rejection::Refused(GateRefusal::NoSession))
    );
}

#[test]
fn gate_is_checked_before_content() {
    let mut rig = Rig::new();
    rig.host.set_state(InteractionState::Menu);
    assert!(matches!(
        rig.show("x", &[]).rejection(),
        Some(Rejection::Refused(_))
    ));
}

#[test]
fn refused_requests_are_not_queued() {
    let mut rig = Rig::new();
    assert!(rig.show("first", &["a"]).is_started());
    rig.host.set_session(false);
    assert!(rig.show("second", &["b"]).rejection().is_some());
    assert_eq!(rig.snapshot().pending_queue, 0);
}

// ============================================================================
// Duplicate suppression
// ============================================================================

#[test]
fn duplicate_within_window_displays_once() {
    let mut rig = Rig::new();
    let log = ActivityLog::attach(&mut rig.manager);
    assert!(rig.show("x", &["a", "b"]).is_started());
    rig.advance_ms(200);
    assert!(matches!(
        rig.show("x", &[" a ", "b", ""]).rejection(),
        Some(Rejection::Duplicate { .. })
    ));

    // Dismiss and let everything settle; nothing else appears.
    rig.send(veil_core::ModalEvent::Key(veil_core::Key::Cancel));
    rig.advance_ms(5_000);
    assert_eq!(log.shown_titles(), vec!["x"]);
    assert_eq!(rig.surface.log().entrances, 1);
}

#[test]
fn identical_request_after_window_is_admitted() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &["a"]).is_started());
    rig.settle();
    rig.send(veil_core::ModalEvent::Key(veil_core::Key::Cancel));
    rig.advance_ms(500);
    assert!(!rig.manager.is_presenting());
    assert!(rig.show("x", &["a"]).is_started());
}

#[test]
fn different_content_is_not_a_duplicate() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("x", &["b"]).is_queued());
    assert!(rig.show("y", &["a"]).is_queued());
}

#[test]
fn rejections_are_observable() {
    let mut rig = Rig::new();
    let log = ActivityLog::attach(&mut rig.manager);
    let _ = rig.show("x", &[]);
    assert_eq!(
        log.events(),
        vec![ModalActivity::Rejected {
            kind: ModalKind::Choice,
            reason: "malformed request: request option list is empty".into(),
        }]
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn any_valid_request_displays_exactly_once(
        title in "[A-Za-z ]{0,12}",
        options in strategy::valid_options(),
    ) {
        let mut rig = Rig::new();
        let recorder = SelectionRecorder::new();
        let request = ModalRequest::choice(title, options.clone(), recorder.callback("p"));
        let admission = rig.manager.request_show(request, rig.clock.now());
        prop_assert!(admission.is_started());

        rig.settle();
        prop_assert_eq!(rig.manager.phase(), PhaseKind::Displaying);
        let log = rig.surface.log();
        prop_assert_eq!(log.entrances, 1);
        let expected = options.iter().filter(|o| !o.trim().is_empty()).count();
        prop_assert_eq!(log.labels().len(), expected);
        prop_assert!(recorder.is_empty());
    }

    #[test]
    fn all_blank_options_never_display(blanks in proptest::collection::vec(" {0,3}", 0..5)) {
        let mut rig = Rig::new();
        let recorder = SelectionRecorder::new();
        let request = ModalRequest::choice("x", blanks, recorder.callback("x"));
        let admission = rig.manager.request_show(request, rig.clock.now());
        let is_malformed = matches!(admission.rejection(), Some(Rejection::Malformed(_)));
        prop_assert!(is_malformed);
        rig.advance_ms(1_000);
        prop_assert_eq!(rig.surface.log().entrances, 0);
        prop_assert!(recorder.is_empty());
    }
}
