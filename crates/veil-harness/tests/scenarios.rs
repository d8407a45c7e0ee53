#![forbid(unsafe_code)]

//! End-to-end scenarios driven through the public facade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use veil::prelude::*;
use veil_core::remote::RemoteEvent;
use veil_harness::{ActivityLog, ManualClock, RecordingSurface, Rig, ScriptedHost, snapshot_json};
use veil_manager::{ModalActivity, PhaseKind};

// ============================================================================
// Choice flow
// ============================================================================

#[test]
fn pick_one_of_two() {
    let mut rig = Rig::new();
    let admission = rig.show("Pick one", &["Go north", "Go south"]);
    assert_eq!(
        admission,
        Admission::Started {
            surface: SurfaceId::CHOICE
        }
    );
    rig.settle();

    let log = rig.surface.log();
    assert!(log.visible);
    assert_eq!(log.content.as_ref().map(|c| c.title.as_str()), Some("Pick one"));
    assert_eq!(log.labels(), vec!["1. Go north", "2. Go south"]);

    let outcome = rig.send(ModalEvent::Select {
        surface: SurfaceId::CHOICE,
        ordinal: 2,
    });
    assert_eq!(
        outcome,
        EventOutcome::Selected {
            surface: SurfaceId::CHOICE,
            ordinal: 2
        }
    );
    assert_eq!(rig.selections.calls(), vec![("Pick one".to_owned(), 2)]);

    rig.advance_ms(300);
    assert!(!rig.surface.is_visible());
    assert_eq!(rig.snapshot().active_modals, 0);
}

#[test]
fn selection_callback_requests_follow_up_on_shared_manager() {
    let surface = RecordingSurface::choice();
    let mut clock = ManualClock::new();
    let manager = Rc::new(RefCell::new(
        ModalManager::new(ManagerConfig::default(), ScriptedHost::active())
            .with_surface(surface.clone()),
    ));

    let follow_up = Rc::new(RefCell::new(None));
    let handle = Rc::downgrade(&manager);
    let admitted = Rc::clone(&follow_up);
    let selected_at = clock.now() + Duration::from_millis(50);
    let first = ModalRequest::choice("first", ["Dock", "Leave"], move |_| {
        if let Some(manager) = handle.upgrade() {
            let admission = manager
                .borrow_mut()
                .request_show(ModalRequest::choice("second", ["Trade"], |_| {}), selected_at);
            *admitted.borrow_mut() = Some(admission);
        }
    });
    assert!(manager.borrow_mut().request_show(first, clock.now()).is_started());
    manager.borrow_mut().tick(clock.advance_ms(50));

    let dispatched = manager.borrow_mut().dispatch_event(
        ModalEvent::Select {
            surface: SurfaceId::CHOICE,
            ordinal: 1,
        },
        clock.now(),
    );
    assert!(matches!(dispatched.invoke(), EventOutcome::Selected { .. }));
    assert_eq!(
        follow_up.borrow().clone(),
        Some(Admission::Queued { position: 1 })
    );

    manager.borrow_mut().tick(clock.advance_ms(300));
    manager.borrow_mut().tick(clock.advance_ms(100));
    manager.borrow_mut().tick(clock.advance_ms(50));
    assert_eq!(surface.log().shown_titles, vec!["first", "second"]);
    assert_eq!(surface.log().max_concurrent, 1);
}

#[test]
fn empty_request_leaves_no_trace() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &[]).rejection().is_some());
    rig.advance_ms(1_000);
    let snapshot = rig.snapshot();
    assert_eq!(snapshot.active_modals, 0);
    assert_eq!(snapshot.pending_queue, 0);
    assert!(!rig.surface.is_visible());
    assert!(rig.selections.is_empty());
}

#[test]
fn two_requests_never_overlap() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("y", &["b"]).is_queued());

    rig.settle();
    assert_eq!(rig.snapshot().last_shown.as_deref(), Some("x"));
    assert_eq!(rig.snapshot().active_modals, 1);

    rig.send(ModalEvent::Select {
        surface: SurfaceId::CHOICE,
        ordinal: 1,
    });
    rig.settle();
    assert_eq!(rig.snapshot().last_shown.as_deref(), Some("y"));
    assert_eq!(rig.snapshot().active_modals, 1);
    assert_eq!(rig.surface.log().max_concurrent, 1);
    assert_eq!(rig.selections.calls(), vec![("x".to_owned(), 1)]);
}

#[test]
fn zero_delay_policy_shows_on_the_same_tick() {
    let config = ManagerConfig::new()
        .settle_delay(Duration::ZERO)
        .exit_transition(Duration::ZERO)
        .drain_delay(Duration::ZERO);
    let mut rig = Rig::with_config(config);
    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("y", &["b"]).is_queued());

    rig.manager.tick(rig.clock.now());
    assert_eq!(rig.manager.phase(), PhaseKind::Displaying);

    rig.send(ModalEvent::Key(Key::Cancel));
    rig.manager.tick(rig.clock.now());
    assert_eq!(rig.manager.phase(), PhaseKind::Displaying);
    assert_eq!(rig.surface.log().shown_titles, vec!["x", "y"]);
}

#[test]
fn exit_completion_signal_starts_next_modal() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("y", &["b"]).is_queued());
    rig.settle();
    rig.send(ModalEvent::CloseControl {
        surface: SurfaceId::CHOICE,
    });

    // The host reports the transition finished early.
    rig.clock.advance_ms(120);
    assert!(rig.manager.complete_exit(SurfaceId::CHOICE, rig.clock.now()));
    assert_eq!(
        rig.manager.next_deadline(),
        Some(rig.clock.now() + Duration::from_millis(100))
    );
    rig.settle();
    assert_eq!(rig.surface.log().shown_titles, vec!["x", "y"]);
}

// ============================================================================
// Supervision
// ============================================================================

#[test]
fn force_close_recovers_a_stuck_surface() {
    let mut rig = Rig::new();
    let ship = RecordingSurface::new(SurfaceId::new("ship-modal"));
    rig.manager.register_surface(ship.clone());

    // A caller shows the ship surface directly, bypassing the manager.
    let mut rogue = ship.clone();
    rogue.begin_entrance();
    assert!(ship.is_visible());

    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("y", &["b"]).is_queued());
    rig.settle();

    let log = ActivityLog::attach(&mut rig.manager);
    assert_eq!(rig.manager.force_close_all(), 1);
    assert!(!ship.is_visible());
    assert!(!rig.surface.is_visible());
    assert_eq!(ship.log().force_hides, 1);

    let snapshot = rig.snapshot();
    assert_eq!(snapshot.active_modals, 0);
    assert_eq!(snapshot.pending_queue, 0);
    assert_eq!(snapshot.stack_counter, 1000);
    assert_eq!(snapshot.live_handlers, 0);
    assert!(!snapshot.is_presenting);
    assert_eq!(log.events(), vec![ModalActivity::ForceClosed { dropped: 1 }]);

    // Nothing fires late, and the callbacks were never invoked.
    rig.advance_ms(5_000);
    assert!(!rig.surface.is_visible());
    assert!(rig.selections.is_empty());
}

#[test]
fn force_close_is_idempotent_when_idle() {
    let mut rig = Rig::new();
    assert_eq!(rig.manager.force_close_all(), 0);
    assert_eq!(rig.manager.force_close_all(), 0);
    assert!(!rig.manager.is_presenting());
    assert!(rig.show("x", &["a"]).is_started());
}

#[test]
fn snapshot_serializes_for_debug_tooling() {
    let mut rig = Rig::new();
    assert!(rig.show("x", &["a"]).is_started());
    assert!(rig.show("y", &["b"]).is_queued());
    rig.settle();

    let json = snapshot_json(&rig.snapshot()).expect("snapshot serializes");
    assert_eq!(json["active_modals"], 1);
    assert_eq!(json["stack_counter"], 1010);
    assert_eq!(json["is_presenting"], true);
    assert_eq!(json["pending_queue"], 1);
    assert_eq!(json["pending_titles"], serde_json::json!(["y"]));
    assert_eq!(json["phase"], "displaying");
    assert_eq!(json["live_handlers"], 3);
    assert_eq!(json["last_shown"], "x");
    assert_eq!(json["tracked"][0]["surface"], "choice-modal");
    assert_eq!(json["tracked"][0]["stack_order"], 1010);
}

#[test]
fn activity_serializes_for_debug_tooling() {
    let mut rig = Rig::new();
    let log = ActivityLog::attach(&mut rig.manager);
    assert!(rig.show("x", &["a"]).is_started());
    rig.settle();
    rig.send(ModalEvent::Key(Key::Cancel));

    let events: Vec<serde_json::Value> = log
        .events()
        .iter()
        .map(|activity| serde_json::to_value(activity).expect("activity serializes"))
        .collect();
    assert_eq!(events[0]["event"], "shown");
    assert_eq!(events[0]["surface"], "choice-modal");
    assert_eq!(events[0]["title"], "x");
    assert_eq!(events[0]["stack_order"], 1010);
    assert_eq!(events[1]["event"], "dismissing");
    assert_eq!(events[1]["trigger"], "cancel_key");
}

#[test]
fn subscription_stops_on_drop() {
    let mut rig = Rig::new();
    let log = ActivityLog::attach(&mut rig.manager);
    assert!(rig.show("x", &["a"]).is_started());
    rig.settle();
    drop(log);

    let log = ActivityLog::attach(&mut rig.manager);
    rig.send(ModalEvent::Key(Key::Cancel));
    assert_eq!(log.events().len(), 1);
}

// ============================================================================
// Remote events and policy
// ============================================================================

#[test]
fn remote_choice_event_reaches_the_surface() {
    let host = ScriptedHost::active();
    let surface = RecordingSurface::choice();
    let mut clock = ManualClock::new();
    let mut manager =
        ModalManager::new(ManagerConfig::default(), host).with_surface(surface.clone());

    let picked = Rc::new(Cell::new(0));
    let sink = Rc::clone(&picked);
    let event: RemoteEvent = serde_json::from_str(
        r#"{"type":"encounter","message":"A derelict drifts past","choices":["Board it", 7, "  Leave  "]}"#,
    )
    .expect("valid event json");
    let request = event
        .choice_request(move |n| sink.set(n))
        .expect("offers a choice");

    assert!(manager.request_show(request, clock.now()).is_started());
    manager.tick(clock.advance_ms(50));
    assert_eq!(surface.log().labels(), vec!["1. Board it", "2. Leave"]);

    manager.handle_event(
        ModalEvent::Select {
            surface: SurfaceId::CHOICE,
            ordinal: 2,
        },
        clock.now(),
    );
    assert_eq!(picked.get(), 2);
}

#[test]
fn combat_events_do_not_request_modals() {
    let event: RemoteEvent =
        serde_json::from_str(r#"{"type":"combat_start","choices":["Fight","Flee"]}"#)
            .expect("valid event json");
    assert!(event.choice_request(|_| {}).is_none());
}

#[test]
fn policy_file_drives_timings() {
    let config = ManagerConfig::from_toml_str(
        r#"
        settle_delay_ms = 10
        exit_transition_ms = 20
        drain_delay_ms = 0
        stack_base = 500
        stack_step = 5
        default_title = "Choose"
        "#,
    )
    .expect("valid policy");

    let mut rig = Rig::with_config(config);
    assert!(rig.show("", &["a"]).is_started());
    rig.advance_ms(10);
    assert_eq!(rig.manager.phase(), PhaseKind::Displaying);
    assert_eq!(rig.surface.log().stack_order, Some(505));
    assert_eq!(rig.snapshot().last_shown.as_deref(), Some("Choose"));

    rig.send(ModalEvent::Key(Key::Cancel));
    rig.advance_ms(20);
    assert!(!rig.manager.is_presenting());
    assert_eq!(rig.snapshot().stack_counter, 500);
}
