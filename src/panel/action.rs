//! In-flight collaborator actions as an explicit state machine.
//!
//! Each panel action (refresh, export, ...) owns an [`ActionSlot`]. Starting
//! an action issues a ticket; a completion is applied only if its ticket is
//! still the live one, so a cancelled or superseded request can never
//! overwrite newer state.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::logger::ActivityLog;
use crate::logger::jsonl::{EventType, LogEntry, Severity};

// ──────────────────── action vocabulary ────────────────────

/// Named panel actions that would reach an external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Refresh,
    Export,
    GenerateReport,
    ScheduleReport,
    RunTests,
    SyncIntegration,
}

impl ActionKind {
    pub const ALL: [Self; 6] = [
        Self::Refresh,
        Self::Export,
        Self::GenerateReport,
        Self::ScheduleReport,
        Self::RunTests,
        Self::SyncIntegration,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Export => "export",
            Self::GenerateReport => "generate_report",
            Self::ScheduleReport => "schedule_report",
            Self::RunTests => "run_tests",
            Self::SyncIntegration => "sync_integration",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Refresh => "Refresh",
            Self::Export => "Export",
            Self::GenerateReport => "Generate report",
            Self::ScheduleReport => "Schedule report",
            Self::RunTests => "Run tests",
            Self::SyncIntegration => "Sync integration",
        }
    }

    /// Label shown on the button while the action is pending.
    #[must_use]
    pub const fn busy_label(self) -> &'static str {
        match self {
            Self::Refresh => "Refreshing...",
            Self::Export => "Exporting...",
            Self::GenerateReport => "Generating...",
            Self::ScheduleReport => "Scheduling...",
            Self::RunTests => "Running...",
            Self::SyncIntegration => "Syncing...",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ActionKind {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.token() == wanted)
            .ok_or_else(|| DashError::InvalidFacet {
                panel: "action",
                axis: "kind",
                value: s.to_string(),
            })
    }
}

/// What a panel hands its collaborator: which action, from where, and the
/// panel's current filter or report settings as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub panel: String,
    pub kind: ActionKind,
    pub payload: serde_json::Value,
}

impl ActionRequest {
    pub fn new(panel: &str, kind: ActionKind, payload: serde_json::Value) -> Self {
        Self {
            panel: panel.to_string(),
            kind,
            payload,
        }
    }
}

/// Successful collaborator result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub message: String,
    /// Echo of what was acted upon, for display.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

/// Failure carried inside [`ActionState::Failure`]. Owned and cloneable, unlike
/// [`DashError`], so it can sit in view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&DashError> for ActionError {
    fn from(err: &DashError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ──────────────────── state machine ────────────────────

/// Identifies one started action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

/// Lifecycle of one asynchronous action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActionState<T> {
    Idle,
    Pending { ticket: Ticket },
    Success { value: T },
    Failure { error: ActionError },
}

impl<T> Default for ActionState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ActionState<T> {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending { .. } => "pending",
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}

/// Holds one action's state and hands out tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSlot<T> {
    state: ActionState<T>,
    next_ticket: u64,
}

impl<T> Default for ActionSlot<T> {
    fn default() -> Self {
        Self {
            state: ActionState::Idle,
            next_ticket: 1,
        }
    }
}

impl<T> ActionSlot<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ActionState<T> {
        &self.state
    }

    /// The trigger stays disabled while pending.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.state.is_pending()
    }

    /// Enter `Pending` under a fresh ticket. Any earlier ticket goes stale.
    pub fn begin(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.state = ActionState::Pending { ticket };
        ticket
    }

    /// Apply a completion. Returns `false` and changes nothing when `ticket`
    /// is not the live one.
    pub fn complete(&mut self, ticket: Ticket, result: std::result::Result<T, ActionError>) -> bool {
        match self.state {
            ActionState::Pending { ticket: live } if live == ticket => {
                self.state = match result {
                    Ok(value) => ActionState::Success { value },
                    Err(error) => ActionState::Failure { error },
                };
                true
            }
            _ => false,
        }
    }

    /// Abandon the pending action, if any. Returns its ticket.
    pub fn cancel(&mut self) -> Option<Ticket> {
        match self.state {
            ActionState::Pending { ticket } => {
                self.state = ActionState::Idle;
                Some(ticket)
            }
            _ => None,
        }
    }

    /// Back to `Idle` after a result was shown.
    pub fn dismiss(&mut self) {
        if !self.state.is_pending() {
            self.state = ActionState::Idle;
        }
    }
}

// ──────────────────── collaborator seam ────────────────────

/// External system that performs panel actions. Implementations block; the
/// runner calls them off the UI thread.
pub trait Collaborator: Send + Sync {
    fn perform(&self, request: &ActionRequest) -> Result<ActionOutcome>;
}

/// Default collaborator: waits a fixed latency, then succeeds.
#[derive(Debug, Clone)]
pub struct StubCollaborator {
    latency: Duration,
}

impl StubCollaborator {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Collaborator for StubCollaborator {
    fn perform(&self, request: &ActionRequest) -> Result<ActionOutcome> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(ActionOutcome {
            message: format!("{} finished for {}", request.kind.label(), request.panel),
            data: request.payload.clone(),
        })
    }
}

// ──────────────────── runner ────────────────────

/// Result delivered back to the owning thread.
#[derive(Debug, Clone)]
pub struct ActionCompletion {
    pub ticket: Ticket,
    pub request: ActionRequest,
    pub result: std::result::Result<ActionOutcome, ActionError>,
    pub elapsed: Duration,
}

/// Runs collaborator calls on worker threads and funnels completions into
/// one channel drained by the owner of the slots.
pub struct ActionRunner {
    collaborator: Arc<dyn Collaborator>,
    log: ActivityLog,
    tx: Sender<ActionCompletion>,
    rx: Receiver<ActionCompletion>,
}

impl ActionRunner {
    pub fn new(collaborator: Arc<dyn Collaborator>, log: ActivityLog) -> Self {
        let (tx, rx) = unbounded();
        Self {
            collaborator,
            log,
            tx,
            rx,
        }
    }

    /// Begin `request` on `slot` and hand it to a worker thread.
    pub fn start(
        &self,
        slot: &mut ActionSlot<ActionOutcome>,
        request: ActionRequest,
    ) -> Result<Ticket> {
        let ticket = slot.begin();
        self.log.record(
            &LogEntry::new(EventType::ActionStarted, Severity::Info)
                .panel(&request.panel)
                .action(request.kind.token()),
        );

        let collaborator = Arc::clone(&self.collaborator);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("c2s-action-{}", ticket.0))
            .spawn(move || {
                let started = Instant::now();
                let result = collaborator.perform(&request);
                let elapsed = started.elapsed();
                // The receiver lives as long as the runner.
                let _ = tx.send(ActionCompletion {
                    ticket,
                    request,
                    result: result.map_err(|e| ActionError::from(&e)),
                    elapsed,
                });
            });

        if let Err(e) = spawned {
            let err = DashError::Runtime {
                details: format!("failed to spawn action worker: {e}"),
            };
            slot.complete(ticket, Err(ActionError::from(&err)));
            return Err(err);
        }
        Ok(ticket)
    }

    /// Cancel whatever `slot` has pending.
    pub fn cancel(&self, slot: &mut ActionSlot<ActionOutcome>, panel: &str, kind: ActionKind) {
        if let Some(ticket) = slot.cancel() {
            self.log.record(
                &LogEntry::new(EventType::ActionCancelled, Severity::Info)
                    .panel(panel)
                    .action(kind.token())
                    .details(format!("ticket {}", ticket.0)),
            );
        }
    }

    /// Apply a completion to its slot. The outcome is logged only once it
    /// lands; a stale one is logged as discarded instead.
    pub fn apply(&self, slot: &mut ActionSlot<ActionOutcome>, completion: ActionCompletion) -> bool {
        let entry = completion_entry(&completion);
        let ActionCompletion {
            ticket,
            request,
            result,
            ..
        } = completion;
        let applied = slot.complete(ticket, result);
        if applied {
            self.log.record(&entry);
        } else {
            self.log.record(
                &LogEntry::new(EventType::ActionCancelled, Severity::Info)
                    .panel(&request.panel)
                    .action(request.kind.token())
                    .details(format!("stale result for ticket {} discarded", ticket.0)),
            );
        }
        applied
    }

    /// Next completion, if one is ready.
    pub fn try_recv(&self) -> Option<ActionCompletion> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<ActionCompletion>> {
        match self.rx.recv_timeout(timeout) {
            Ok(c) => Ok(Some(c)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DashError::ChannelClosed {
                component: "action-runner",
            }),
        }
    }

    /// Start `request` and block until its own completion has been applied.
    pub fn run_to_completion(
        &self,
        slot: &mut ActionSlot<ActionOutcome>,
        request: ActionRequest,
        timeout: Duration,
    ) -> Result<()> {
        let ticket = self.start(slot, request)?;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DashError::ActionFailed {
                    action: "wait",
                    details: format!("no result within {} ms", timeout.as_millis()),
                });
            }
            if let Some(completion) = self.recv_timeout(remaining)? {
                let mine = completion.ticket == ticket;
                self.apply(slot, completion);
                if mine {
                    return Ok(());
                }
            }
        }
    }
}

/// Log line for a finished action, to record once the result is applied.
#[must_use]
pub fn completion_entry(completion: &ActionCompletion) -> LogEntry {
    let duration_ms = u64::try_from(completion.elapsed.as_millis()).unwrap_or(u64::MAX);
    let mut entry = match &completion.result {
        Ok(outcome) => {
            let mut e =
                LogEntry::new(EventType::ActionCompleted, Severity::Info).details(&*outcome.message);
            e.ok = Some(true);
            e
        }
        Err(err) => {
            let mut e = LogEntry::new(EventType::ActionFailed, Severity::Error);
            e.ok = Some(false);
            e.error_code = Some(err.code.clone());
            e.error_message = Some(err.message.clone());
            e
        }
    }
    .panel(&completion.request.panel)
    .action(completion.request.kind.token());
    entry.duration_ms = Some(duration_ms);
    entry
}
