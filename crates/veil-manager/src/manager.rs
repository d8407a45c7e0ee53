#![forbid(unsafe_code)]

//! The modal presentation state machine.
//!
//! [`ModalManager`] owns the stack, the pending queue, the live dismissal
//! handlers and the single in-flight modal. A request moves through
//!
//! ```text
//! Idle ──request_show──▶ Admitting ──settle──▶ Displaying
//!   ▲                        │                     │ close / backdrop / cancel / select
//!   │                 gate refused or              ▼
//!   │                 surface broken           Dismissing
//!   │                        │                     │ exit transition
//!   └──────── drain ◀────────┴─────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - `is_presenting()` is true exactly while the phase is not `Idle`, that
//!   is from admission until the surface is untracked.
//! - A queued request only starts from `Idle`, oldest first.
//! - Every displayed modal has exactly one live handler set, released as a
//!   whole by the first dismissal trigger.
//! - `on_select` is invoked at most once and only on a genuine selection.
//!
//! # Failure Modes
//!
//! - Host refuses at display or drain time: the request is dropped, its
//!   callback is never invoked, and draining continues.
//! - Surface missing or structurally incomplete: logged as an error, the
//!   request is dropped, and the manager returns to `Idle` and drains.
//! - A stuck surface left visible by a caller that bypassed the manager is
//!   recovered with [`ModalManager::force_close_all`].

use std::fmt;

use tracing::{debug, error, info, trace, warn};
use veil_core::{
    ChoiceOptions, ConfigError, DismissTrigger, HitTarget, HostState, Instant, Key,
    ManagerConfig, ModalEvent, ModalRequest, OnSelect, SurfaceId, ValidatedRequest, check_gate,
};

use crate::admission::{Admission, DuplicateFilter, Rejection};
use crate::handlers::{DismissTriggers, HandlerRegistry};
use crate::queue::PendingQueue;
use crate::snapshot::{ManagerSnapshot, ModalActivity, Observers, PhaseKind, Subscription};
use crate::stack::ModalStack;
use crate::surface::{ModalSurface, SurfaceContent, SurfaceRegistry};

const TARGET: &str = "veil::manager";

/// What [`ModalManager::handle_event`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// No live handler matched.
    Ignored,
    /// A dismissal trigger fired and the exit transition started.
    Dismissing {
        surface: SurfaceId,
        trigger: DismissTrigger,
    },
    /// An option was selected and dismissal started.
    Selected { surface: SurfaceId, ordinal: usize },
}

/// The result of [`ModalManager::dispatch_event`].
///
/// Holds the selection callback, if any, so the caller can invoke it after
/// releasing its borrow of the manager. The callback may then request a
/// follow-up modal from the same manager.
#[must_use = "a selection callback is dropped unless `invoke` is called"]
pub struct Dispatched {
    outcome: EventOutcome,
    pending: Option<(OnSelect, usize)>,
}

impl Dispatched {
    fn outcome(outcome: EventOutcome) -> Self {
        Self {
            outcome,
            pending: None,
        }
    }

    /// What the manager did with the event.
    #[inline]
    pub fn event_outcome(&self) -> EventOutcome {
        self.outcome
    }

    /// Whether invoking will call a selection callback.
    #[inline]
    pub fn has_callback(&self) -> bool {
        self.pending.is_some()
    }

    /// Call the selection callback, if one is pending.
    pub fn invoke(self) -> EventOutcome {
        if let Some((on_select, ordinal)) = self.pending {
            on_select(ordinal);
        }
        self.outcome
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatched")
            .field("outcome", &self.outcome)
            .field("has_callback", &self.pending.is_some())
            .finish()
    }
}

/// The modal currently on screen.
struct Presented {
    surface: SurfaceId,
    options: ChoiceOptions,
    on_select: OnSelect,
}

impl fmt::Debug for Presented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presented")
            .field("surface", &self.surface)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum Phase {
    Idle {
        drain_at: Option<Instant>,
    },
    Admitting {
        request: ValidatedRequest,
        settle_until: Instant,
    },
    Displaying(Presented),
    Dismissing {
        surface: SurfaceId,
        exit_until: Instant,
    },
}

impl Phase {
    const IDLE: Self = Self::Idle { drain_at: None };

    fn kind(&self) -> PhaseKind {
        match self {
            Self::Idle { .. } => PhaseKind::Idle,
            Self::Admitting { .. } => PhaseKind::Admitting,
            Self::Displaying(_) => PhaseKind::Displaying,
            Self::Dismissing { .. } => PhaseKind::Dismissing,
        }
    }

    fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Idle { drain_at } => *drain_at,
            Self::Admitting { settle_until, .. } => Some(*settle_until),
            Self::Displaying(_) => None,
            Self::Dismissing { exit_until, .. } => Some(*exit_until),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    shown: u64,
    rejected: u64,
    dropped: u64,
    dismissed: u64,
    last_shown: Option<String>,
}

/// Decides whether, when and in what order requested modals are shown.
pub struct ModalManager {
    config: ManagerConfig,
    host: Box<dyn HostState>,
    surfaces: SurfaceRegistry,
    stack: ModalStack,
    handlers: HandlerRegistry,
    duplicates: DuplicateFilter,
    queue: PendingQueue,
    phase: Phase,
    observers: Observers,
    counters: Counters,
}

impl fmt::Debug for ModalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalManager")
            .field("phase", &self.phase)
            .field("stack", &self.stack)
            .field("queue", &self.queue.len())
            .field("surfaces", &self.surfaces)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ModalManager {
    /// Create a manager consulting `host` for its admission gates.
    #[must_use]
    pub fn new(config: ManagerConfig, host: impl HostState + 'static) -> Self {
        Self {
            stack: ModalStack::from_config(&config),
            duplicates: DuplicateFilter::new(config.duplicate_window),
            config,
            host: Box::new(host),
            surfaces: SurfaceRegistry::new(),
            handlers: HandlerRegistry::new(),
            queue: PendingQueue::new(),
            phase: Phase::IDLE,
            observers: Observers::default(),
            counters: Counters::default(),
        }
    }

    /// Like [`new`](Self::new), but rejects an inconsistent policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the policy fails validation.
    pub fn try_new(config: ManagerConfig, host: impl HostState + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, host))
    }

    /// Builder form of [`register_surface`](Self::register_surface).
    #[must_use]
    pub fn with_surface(mut self, surface: impl ModalSurface + 'static) -> Self {
        self.register_surface(surface);
        self
    }

    /// Make a surface available for presentation, replacing any surface
    /// registered under the same id.
    pub fn register_surface(&mut self, surface: impl ModalSurface + 'static) {
        let id = surface.id();
        if self.surfaces.register(Box::new(surface)).is_some() {
            debug!(target: TARGET, surface = %id, "replaced registered surface");
        }
    }

    // --- Admission ---

    /// Submit a show-request.
    ///
    /// The request is checked against the host gates, validated, and
    /// checked for duplicate bursts. An admitted request starts immediately
    /// when nothing is in flight and nothing is waiting; otherwise it joins
    /// the back of the queue. A rejected request's callback is dropped
    /// without ever being called.
    pub fn request_show(&mut self, request: ModalRequest, now: Instant) -> Admission {
        let kind = request.kind();
        let request = match self.admit(request, now) {
            Ok(request) => request,
            Err(rejection) => {
                self.counters.rejected += 1;
                match &rejection {
                    Rejection::Malformed(_) | Rejection::Refused(_) => {
                        warn!(target: TARGET, %kind, reason = %rejection, "show-request rejected");
                    }
                    Rejection::Duplicate { .. } => {
                        debug!(target: TARGET, %kind, reason = %rejection, "duplicate show-request suppressed");
                    }
                }
                self.observers.notify(&ModalActivity::Rejected {
                    kind,
                    reason: rejection.to_string(),
                });
                return Admission::Rejected(rejection);
            }
        };

        if self.is_presenting() || !self.queue.is_empty() {
            let title = request.title.clone();
            let position = self.queue.push(request, now);
            if let Phase::Idle { drain_at } = &mut self.phase {
                drain_at.get_or_insert(now);
            }
            debug!(target: TARGET, %title, position, phase = ?self.phase.kind(), "show-request queued");
            self.observers
                .notify(&ModalActivity::Queued { title, position });
            return Admission::Queued { position };
        }

        let surface = request.kind.surface_id();
        self.begin(request, now);
        Admission::Started { surface }
    }

    fn admit(&mut self, request: ModalRequest, now: Instant) -> Result<ValidatedRequest, Rejection> {
        check_gate(self.host.as_ref()).map_err(Rejection::Refused)?;
        let request = request
            .validate(&self.config.default_title)
            .map_err(Rejection::Malformed)?;
        self.duplicates
            .check_and_record(request.fingerprint(), now)
            .map_err(|age| Rejection::Duplicate { age })?;
        Ok(request)
    }

    fn begin(&mut self, request: ValidatedRequest, at: Instant) {
        let surface = request.kind.surface_id();
        // Clear residue from a previous modal that never finished cleanly.
        if !self.stack.contains(surface)
            && let Some(target) = self.surfaces.get_mut(surface)
        {
            target.reset();
        }
        debug!(target: TARGET, %surface, title = %request.title, "admitting modal");
        self.phase = Phase::Admitting {
            request,
            settle_until: at + self.config.settle_delay,
        };
    }

    // --- Time ---

    /// When [`tick`](Self::tick) next has work to do, if ever.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.phase.deadline()
    }

    /// Run every transition whose deadline is at or before `now`.
    ///
    /// Transitions are replayed at their scheduled instants, so a late tick
    /// produces the same sequence as punctual ones.
    pub fn tick(&mut self, now: Instant) {
        while let Some(deadline) = self.phase.deadline() {
            if now < deadline {
                break;
            }
            match std::mem::replace(&mut self.phase, Phase::IDLE) {
                Phase::Admitting { request, .. } => self.display(request, deadline),
                Phase::Dismissing { surface, .. } => self.finish_dismissal(surface, deadline),
                Phase::Idle { .. } => self.drain(deadline),
                displaying @ Phase::Displaying(_) => {
                    self.phase = displaying;
                    break;
                }
            }
        }
    }

    fn display(&mut self, request: ValidatedRequest, at: Instant) {
        let surface = request.kind.surface_id();

        if let Err(refusal) = check_gate(self.host.as_ref()) {
            self.drop_request(&request.title, &refusal.to_string());
            self.release(at);
            return;
        }

        let ready = self
            .surfaces
            .get(surface)
            .is_some_and(|target| target.has_structure());
        if !ready {
            error!(
                target: TARGET,
                %surface,
                title = %request.title,
                registered = self.surfaces.contains(surface),
                "modal surface is missing its structure; releasing"
            );
            self.drop_request(&request.title, "surface structure missing");
            self.release(at);
            return;
        }

        debug_assert!(!request.options.is_empty());
        let content = SurfaceContent::choice(&request.title, &request.options);
        let stack_order = self.stack.track(surface);
        if let Some(target) = self.surfaces.get_mut(surface) {
            target.populate(&content);
            target.set_stack_order(stack_order);
            target.begin_entrance();
        }
        self.handlers.install(surface);

        info!(
            target: TARGET,
            %surface,
            title = %request.title,
            options = request.options.len(),
            stack_order,
            "modal shown"
        );
        self.counters.shown += 1;
        self.counters.last_shown = Some(request.title.clone());
        self.observers.notify(&ModalActivity::Shown {
            surface,
            title: request.title,
            stack_order,
        });
        self.phase = Phase::Displaying(Presented {
            surface,
            options: request.options,
            on_select: request.on_select,
        });
    }

    /// Return to `Idle`, draining at `at` if anything is waiting.
    fn release(&mut self, at: Instant) {
        self.phase = Phase::Idle {
            drain_at: (!self.queue.is_empty()).then_some(at),
        };
    }

    fn drop_request(&mut self, title: &str, reason: &str) {
        self.counters.dropped += 1;
        warn!(target: TARGET, %title, %reason, "admitted request dropped");
        self.observers.notify(&ModalActivity::Dropped {
            title: title.to_owned(),
            reason: reason.to_owned(),
        });
    }

    fn drain(&mut self, at: Instant) {
        while let Some(entry) = self.queue.pop_front() {
            match check_gate(self.host.as_ref()) {
                Ok(()) => {
                    trace!(
                        target: TARGET,
                        title = %entry.request.title,
                        waited_ms = at.saturating_duration_since(entry.enqueued_at).as_millis() as u64,
                        "draining queued request"
                    );
                    self.begin(entry.request, at);
                    return;
                }
                Err(refusal) => self.drop_request(&entry.request.title, &refusal.to_string()),
            }
        }
        self.phase = Phase::IDLE;
    }

    // --- Dismissal ---

    /// Route a user input event to the live dismissal handlers.
    ///
    /// A selection callback runs before this returns. When the manager is
    /// shared (for example behind `Rc<RefCell<_>>`) and the callback may
    /// call back into it, use [`dispatch_event`](Self::dispatch_event)
    /// instead.
    pub fn handle_event(&mut self, event: ModalEvent, now: Instant) -> EventOutcome {
        self.dispatch_event(event, now).invoke()
    }

    /// Route a user input event without running the selection callback.
    ///
    /// Dismissal has already started when this returns; the caller invokes
    /// the returned [`Dispatched`] once its borrow of the manager ends.
    pub fn dispatch_event(&mut self, event: ModalEvent, now: Instant) -> Dispatched {
        let outcome = match event {
            ModalEvent::CloseControl { surface } => {
                self.trigger(surface, DismissTrigger::CloseControl, now)
            }
            ModalEvent::BackdropClick {
                surface,
                target: HitTarget::Backdrop,
            } => self.trigger(surface, DismissTrigger::Backdrop, now),
            ModalEvent::BackdropClick {
                target: HitTarget::Content,
                ..
            } => EventOutcome::Ignored,
            ModalEvent::Key(Key::Cancel) => {
                let top = self
                    .stack
                    .iter_top_down()
                    .map(|tracked| tracked.surface)
                    .find(|surface| self.handlers.accepts(*surface, DismissTriggers::CANCEL_KEY));
                match top {
                    Some(surface) => self.trigger(surface, DismissTrigger::CancelKey, now),
                    None => EventOutcome::Ignored,
                }
            }
            ModalEvent::Key(Key::Other(_)) => EventOutcome::Ignored,
            ModalEvent::Select { surface, ordinal } => return self.select(surface, ordinal, now),
        };
        Dispatched::outcome(outcome)
    }

    fn trigger(&mut self, surface: SurfaceId, trigger: DismissTrigger, now: Instant) -> EventOutcome {
        let listening = DismissTriggers::for_trigger(trigger)
            .is_some_and(|flag| self.handlers.accepts(surface, flag));
        if !listening {
            trace!(target: TARGET, %surface, %trigger, "no live handler");
            return EventOutcome::Ignored;
        }
        match self.begin_dismissal(surface, trigger, now) {
            Some(_) => EventOutcome::Dismissing { surface, trigger },
            None => EventOutcome::Ignored,
        }
    }

    fn select(&mut self, surface: SurfaceId, ordinal: usize, now: Instant) -> Dispatched {
        let valid = matches!(
            &self.phase,
            Phase::Displaying(presented)
                if presented.surface == surface && presented.options.contains_ordinal(ordinal)
        );
        if !valid {
            trace!(target: TARGET, %surface, ordinal, "selection ignored");
            return Dispatched::outcome(EventOutcome::Ignored);
        }
        let Some(presented) = self.begin_dismissal(surface, DismissTrigger::Selection, now) else {
            return Dispatched::outcome(EventOutcome::Ignored);
        };
        self.observers
            .notify(&ModalActivity::Selected { surface, ordinal });
        Dispatched {
            outcome: EventOutcome::Selected { surface, ordinal },
            pending: Some((presented.on_select, ordinal)),
        }
    }

    /// Release every handler of `surface` and start its exit transition.
    fn begin_dismissal(
        &mut self,
        surface: SurfaceId,
        trigger: DismissTrigger,
        now: Instant,
    ) -> Option<Presented> {
        let presented = match std::mem::replace(&mut self.phase, Phase::IDLE) {
            Phase::Displaying(presented) if presented.surface == surface => presented,
            other => {
                self.phase = other;
                return None;
            }
        };
        self.handlers.release(surface);
        if let Some(target) = self.surfaces.get_mut(surface) {
            target.begin_exit();
        }
        info!(target: TARGET, %surface, %trigger, "modal dismissing");
        self.observers
            .notify(&ModalActivity::Dismissing { surface, trigger });
        self.phase = Phase::Dismissing {
            surface,
            exit_until: now + self.config.exit_transition,
        };
        Some(presented)
    }

    /// Signal that `surface`'s exit transition finished ahead of its deadline.
    ///
    /// Returns `false` when `surface` is not dismissing.
    pub fn complete_exit(&mut self, surface: SurfaceId, now: Instant) -> bool {
        if !matches!(self.phase, Phase::Dismissing { surface: dismissing, .. } if dismissing == surface)
        {
            return false;
        }
        self.phase = Phase::IDLE;
        self.finish_dismissal(surface, now);
        self.tick(now);
        true
    }

    fn finish_dismissal(&mut self, surface: SurfaceId, at: Instant) {
        if let Some(target) = self.surfaces.get_mut(surface) {
            target.hide();
        }
        self.stack.untrack(surface);
        self.counters.dismissed += 1;
        debug!(target: TARGET, %surface, pending = self.queue.len(), "modal dismissed");
        self.observers.notify(&ModalActivity::Dismissed { surface });
        self.phase = Phase::Idle {
            drain_at: (!self.queue.is_empty()).then(|| at + self.config.drain_delay),
        };
    }

    // --- Supervision ---

    /// Hide every registered surface immediately and reset all state.
    ///
    /// Bypasses exit transitions, drops the in-flight request and every
    /// queued one without invoking their callbacks. Safe to call at any
    /// time, including when nothing is showing. Returns the number of
    /// queued requests dropped.
    pub fn force_close_all(&mut self) -> usize {
        for surface in self.surfaces.iter_mut() {
            surface.force_hide();
        }
        let untracked = self.stack.clear().len();
        let released = self.handlers.clear();
        let dropped = self.queue.clear();
        self.duplicates.clear();
        let interrupted = std::mem::replace(&mut self.phase, Phase::IDLE).kind();
        self.counters.dropped += dropped as u64;

        warn!(
            target: TARGET,
            untracked,
            released,
            dropped,
            interrupted = ?interrupted,
            "force-closed all modals"
        );
        self.observers
            .notify(&ModalActivity::ForceClosed { dropped });
        dropped
    }

    /// Observe manager activity until the returned guard is dropped.
    pub fn subscribe(&mut self, observer: impl FnMut(&ModalActivity) + 'static) -> Subscription {
        self.observers.subscribe(observer)
    }

    #[must_use]
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            active_modals: self.stack.depth(),
            stack_counter: self.stack.counter(),
            is_presenting: self.is_presenting(),
            pending_queue: self.queue.len(),
            pending_titles: self.queue.titles().map(str::to_owned).collect(),
            phase: self.phase.kind(),
            live_handlers: self.handlers.live_count(),
            shown_total: self.counters.shown,
            rejected_total: self.counters.rejected,
            dropped_total: self.counters.dropped,
            dismissed_total: self.counters.dismissed,
            last_shown: self.counters.last_shown.clone(),
            tracked: self.stack.iter().copied().collect(),
        }
    }

    // --- State Queries ---

    /// Whether a modal is between admission and untracking.
    #[inline]
    #[must_use]
    pub fn is_presenting(&self) -> bool {
        !matches!(self.phase, Phase::Idle { .. })
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// Surface currently displayed and accepting selections.
    #[must_use]
    pub fn displayed(&self) -> Option<SurfaceId> {
        match &self.phase {
            Phase::Displaying(presented) => Some(presented.surface),
            _ => None,
        }
    }

    #[must_use]
    pub fn stack(&self) -> &ModalStack {
        &self.stack
    }

    #[must_use]
    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
