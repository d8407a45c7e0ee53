#![forbid(unsafe_code)]

//! Reference fixtures for exercising the modal manager deterministically.
//!
//! - [`RecordingSurface`]: a [`ModalSurface`] that records every lifecycle
//!   call into a shared [`SurfaceLog`].
//! - [`ScriptedHost`]: a [`HostState`] whose answers tests flip at will.
//! - [`ManualClock`]: a monotonic clock that only moves when told to.
//! - [`SelectionRecorder`]: builds `on_select` callbacks and records calls.
//! - [`ActivityLog`]: collects [`ModalActivity`] through a subscription.
//!
//! Strategies for property tests live in [`strategy`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;
use veil_core::{HostState, InteractionState, ManagerConfig, ModalRequest, SurfaceId};
use veil_manager::{
    ManagerSnapshot, ModalActivity, ModalManager, ModalSurface, Subscription, SurfaceContent,
};
use web_time::Instant;

// ============================================================================
// Surface
// ============================================================================

/// Everything a [`RecordingSurface`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceLog {
    pub visible: bool,
    pub exiting: bool,
    pub content: Option<SurfaceContent>,
    pub stack_order: Option<u32>,
    pub resets: usize,
    pub entrances: usize,
    pub exits: usize,
    pub hides: usize,
    pub force_hides: usize,
    /// Titles in the order they were populated.
    pub shown_titles: Vec<String>,
    /// Highest number of times this surface was visible at once. Always 0 or 1.
    pub max_concurrent: usize,
}

impl SurfaceLog {
    /// Labels currently populated, e.g. `["1. Go north", "2. Go south"]`.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.content
            .as_ref()
            .map(|content| content.labels().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// A surface that records its lifecycle.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    id: SurfaceId,
    structured: Rc<Cell<bool>>,
    log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            structured: Rc::new(Cell::new(true)),
            log: Rc::new(RefCell::new(SurfaceLog::default())),
        }
    }

    /// The surface for choice modals.
    #[must_use]
    pub fn choice() -> Self {
        Self::new(SurfaceId::CHOICE)
    }

    /// A surface whose title, list or close control is missing.
    #[must_use]
    pub fn broken(id: SurfaceId) -> Self {
        let surface = Self::new(id);
        surface.structured.set(false);
        surface
    }

    /// Toggle structural completeness, through any clone.
    pub fn set_structured(&self, structured: bool) {
        self.structured.set(structured);
    }

    /// Copy of the log so far.
    #[must_use]
    pub fn log(&self) -> SurfaceLog {
        self.log.borrow().clone()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.log.borrow().visible
    }
}

impl ModalSurface for RecordingSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn has_structure(&self) -> bool {
        self.structured.get()
    }

    fn reset(&mut self) {
        let mut log = self.log.borrow_mut();
        log.resets += 1;
        log.visible = false;
        log.exiting = false;
        log.content = None;
    }

    fn populate(&mut self, content: &SurfaceContent) {
        let mut log = self.log.borrow_mut();
        log.shown_titles.push(content.title.clone());
        log.content = Some(content.clone());
    }

    fn set_stack_order(&mut self, order: u32) {
        self.log.borrow_mut().stack_order = Some(order);
    }

    fn begin_entrance(&mut self) {
        let mut log = self.log.borrow_mut();
        let concurrent = usize::from(log.visible) + 1;
        log.max_concurrent = log.max_concurrent.max(concurrent);
        log.visible = true;
        log.exiting = false;
        log.entrances += 1;
    }

    fn begin_exit(&mut self) {
        let mut log = self.log.borrow_mut();
        log.exiting = true;
        log.exits += 1;
    }

    fn hide(&mut self) {
        let mut log = self.log.borrow_mut();
        log.visible = false;
        log.exiting = false;
        log.hides += 1;
    }

    fn force_hide(&mut self) {
        self.reset();
        self.log.borrow_mut().force_hides += 1;
    }
}

// ============================================================================
// Host
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct HostAnswers {
    state: InteractionState,
    initializing: bool,
    session: bool,
}

/// Host whose answers can be changed while the manager holds a clone.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    answers: Rc<Cell<HostAnswers>>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::active()
    }
}

impl ScriptedHost {
    /// Interactive, initialized, with a live session.
    #[must_use]
    pub fn active() -> Self {
        Self {
            answers: Rc::new(Cell::new(HostAnswers {
                state: InteractionState::Active,
                initializing: false,
                session: true,
            })),
        }
    }

    pub fn set_state(&self, state: InteractionState) {
        self.update(|answers| answers.state = state);
    }

    pub fn set_initializing(&self, initializing: bool) {
        self.update(|answers| answers.initializing = initializing);
    }

    pub fn set_session(&self, session: bool) {
        self.update(|answers| answers.session = session);
    }

    fn update(&self, f: impl FnOnce(&mut HostAnswers)) {
        let mut answers = self.answers.get();
        f(&mut answers);
        self.answers.set(answers);
    }
}

impl HostState for ScriptedHost {
    fn interaction_state(&self) -> InteractionState {
        self.answers.get().state
    }

    fn is_initializing(&self) -> bool {
        self.answers.get().initializing
    }

    fn has_live_session(&self) -> bool {
        self.answers.get().session
    }
}

// ============================================================================
// Clock
// ============================================================================

/// A clock that only moves when advanced.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: Instant,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Instant::now(),
        }
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Move forward by `ms` milliseconds and return the new time.
    pub fn advance_ms(&mut self, ms: u64) -> Instant {
        self.advance(Duration::from_millis(ms))
    }

    pub fn advance(&mut self, by: Duration) -> Instant {
        self.now += by;
        trace!(target: "veil::harness", advanced_ms = by.as_millis() as u64, "clock advanced");
        self.now
    }
}

// ============================================================================
// Callbacks and observers
// ============================================================================

/// Records every `on_select` invocation as `(tag, ordinal)`.
#[derive(Debug, Clone, Default)]
pub struct SelectionRecorder {
    calls: Rc<RefCell<Vec<(String, usize)>>>,
}

impl SelectionRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records its invocation under `tag`.
    pub fn callback(&self, tag: impl Into<String>) -> impl FnOnce(usize) + 'static {
        let calls = Rc::clone(&self.calls);
        let tag = tag.into();
        move |ordinal| calls.borrow_mut().push((tag, ordinal))
    }

    /// A choice request whose callback is recorded under its title.
    #[must_use]
    pub fn choice(&self, title: &str, options: &[&str]) -> ModalRequest {
        ModalRequest::choice(title, options.iter().copied(), self.callback(title))
    }

    #[must_use]
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}

/// Activity observed through a manager subscription.
#[derive(Debug)]
pub struct ActivityLog {
    events: Rc<RefCell<Vec<ModalActivity>>>,
    _subscription: Subscription,
}

impl ActivityLog {
    pub fn attach(manager: &mut ModalManager) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = manager.subscribe(move |activity| sink.borrow_mut().push(activity.clone()));
        Self {
            events,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<ModalActivity> {
        self.events.borrow().clone()
    }

    /// Titles of every `Shown` event, in order.
    #[must_use]
    pub fn shown_titles(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|activity| match activity {
                ModalActivity::Shown { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Rig
// ============================================================================

/// A manager wired to a recording choice surface, a scripted host and a
/// manual clock.
#[derive(Debug)]
pub struct Rig {
    pub manager: ModalManager,
    pub surface: RecordingSurface,
    pub host: ScriptedHost,
    pub clock: ManualClock,
    pub selections: SelectionRecorder,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ManagerConfig) -> Self {
        let surface = RecordingSurface::choice();
        let host = ScriptedHost::active();
        let manager = ModalManager::new(config, host.clone()).with_surface(surface.clone());
        Self {
            manager,
            surface,
            host,
            clock: ManualClock::new(),
            selections: SelectionRecorder::new(),
        }
    }

    /// Submit a recorded choice request at the current time.
    pub fn show(&mut self, title: &str, options: &[&str]) -> veil_manager::Admission {
        let request = self.selections.choice(title, options);
        self.manager.request_show(request, self.clock.now())
    }

    /// Advance the clock and run due transitions.
    pub fn advance_ms(&mut self, ms: u64) {
        let now = self.clock.advance_ms(ms);
        self.manager.tick(now);
    }

    /// Advance exactly to the next deadline, if any. Returns whether time moved.
    pub fn step(&mut self) -> bool {
        let Some(deadline) = self.manager.next_deadline() else {
            return false;
        };
        let now = self.clock.now();
        if deadline > now {
            self.clock.advance(deadline.saturating_duration_since(now));
        }
        self.manager.tick(self.clock.now());
        true
    }

    /// Step until nothing is scheduled or a modal is displaying.
    pub fn settle(&mut self) {
        while self.manager.displayed().is_none() && self.step() {}
    }

    /// Deliver an event at the current time.
    pub fn send(&mut self, event: veil_core::ModalEvent) -> veil_manager::EventOutcome {
        self.manager.handle_event(event, self.clock.now())
    }

    #[must_use]
    pub fn snapshot(&self) -> ManagerSnapshot {
        self.manager.snapshot()
    }
}

/// Serialize a snapshot the way debug tooling consumes it.
///
/// # Errors
///
/// Returns the serializer error, which cannot occur for well-formed snapshots.
pub fn snapshot_json(snapshot: &ManagerSnapshot) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(snapshot)
}

/// Install a compact test subscriber once per process.
pub fn init_test_logging() -> bool {
    veil_core::logging::init(veil_core::logging::LogFormat::Compact)
}

// ============================================================================
// Strategies
// ============================================================================

pub mod strategy {
    //! `proptest` strategies for requests and input events.

    use proptest::prelude::*;
    use veil_core::{HitTarget, Key, ModalEvent, SurfaceId};

    /// A raw option that may be blank or padded.
    pub fn raw_option() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => "[a-z]{1,8}( [a-z]{1,8})?",
            1 => Just(String::new()),
            1 => " {1,4}",
            1 => " [a-z]{1,6} ",
        ]
    }

    /// An option list with at least one non-blank entry.
    pub fn valid_options() -> impl Strategy<Value = Vec<String>> {
        (
            "[a-z]{1,8}",
            proptest::collection::vec(raw_option(), 0..6),
            any::<prop::sample::Index>(),
        )
            .prop_map(|(anchor, mut rest, at)| {
                let index = at.index(rest.len() + 1);
                rest.insert(index, anchor);
                rest
            })
    }

    /// Any dismissal input aimed at the choice surface.
    pub fn dismissal_event() -> impl Strategy<Value = ModalEvent> {
        prop_oneof![
            Just(ModalEvent::CloseControl {
                surface: SurfaceId::CHOICE
            }),
            Just(ModalEvent::BackdropClick {
                surface: SurfaceId::CHOICE,
                target: HitTarget::Backdrop
            }),
            Just(ModalEvent::BackdropClick {
                surface: SurfaceId::CHOICE,
                target: HitTarget::Content
            }),
            Just(ModalEvent::Key(Key::Cancel)),
            any::<char>().prop_map(|c| ModalEvent::Key(Key::Other(c))),
        ]
    }
}
