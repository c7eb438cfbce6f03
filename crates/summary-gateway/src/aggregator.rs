//! Scatter-gather aggregator.
//!
//! One run dispatches the three dependency calls as independent tasks, then
//! classifies their outcomes in arrival order against the shared deadline:
//!
//! ```text
//!              ┌──────────── spawn ────────────┐
//!              ▼               ▼               ▼
//!         identity(C)      access(C)      context(O)
//!              │               │               │
//!              └──── try_send ─┴── try_send ───┘
//!                              ▼
//!                 mpsc (capacity 3, one slot each)
//!                              │
//!                 select! { outcome | deadline }
//!                              │
//!        ┌─────────────────────┼──────────────────────┐
//!        ▼                     ▼                      ▼
//!   critical error        deadline fired         all classified
//!   → fail fast           → degraded result      → full or
//!                           if both critical       degraded result
//!                           stored, else
//!                           CriticalTimeout
//! ```
//!
//! Producers never block on the handoff: each owns a dedicated channel slot,
//! so a task that finishes after the run has returned deposits its outcome
//! into a dropped receiver and exits.

use crate::domain::deadline::{Deadline, Fired};
use crate::domain::error::AggregationFailure;
use crate::domain::types::{
    AccessPayload, AggregationRequest, AggregationResult, ContextPayload, Dependency,
    DependencyOutcome, DependencyPayload, IdentityPayload,
};
use crate::ports::{AccessClient, Clock, ContextClient, IdentityClient, SystemClock};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument, Span};

/// The three backends one run fans out to.
#[derive(Clone)]
pub struct DependencyClients {
    pub identity: Arc<dyn IdentityClient>,
    pub access: Arc<dyn AccessClient>,
    pub context: Arc<dyn ContextClient>,
}

/// Scatter-gather aggregator for the chat summary.
///
/// Holds no per-run state; concurrent runs share only the client handles.
#[derive(Clone)]
pub struct Aggregator {
    clients: DependencyClients,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    pub fn new(clients: DependencyClients) -> Self {
        Self {
            clients,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp `completed_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one aggregation bounded by `deadline`.
    ///
    /// Returns as soon as the outcome is decided: on the first critical
    /// failure, when all three dependencies have reported, or when the
    /// deadline fires. Calls still in flight at that point keep running
    /// until they observe the deadline themselves; their results are
    /// discarded.
    pub async fn aggregate(
        &self,
        request: &AggregationRequest,
        deadline: &Deadline,
    ) -> Result<AggregationResult, AggregationFailure> {
        let started = Instant::now();
        let mut outcomes = self.scatter(request, deadline);
        let result = self.gather(&mut outcomes, deadline, started).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(summary) => info!(
                user_id = request.user_id(),
                chat_id = request.chat_id(),
                elapsed_ms,
                degraded = summary.degraded,
                "Aggregation completed"
            ),
            Err(failure) => error!(
                user_id = request.user_id(),
                chat_id = request.chat_id(),
                elapsed_ms,
                cause = failure.cause.as_str(),
                detail = %failure.detail,
                "Aggregation failed"
            ),
        }

        result
    }

    /// Spawn one task per dependency and return the collection point.
    fn scatter(
        &self,
        request: &AggregationRequest,
        deadline: &Deadline,
    ) -> mpsc::Receiver<DependencyOutcome> {
        let (tx, rx) = mpsc::channel(Dependency::ALL.len());
        let span = Span::current();

        {
            let client = Arc::clone(&self.clients.identity);
            let deadline = deadline.clone();
            let user_id = request.user_id().to_owned();
            let tx = tx.clone();
            tokio::spawn(
                async move {
                    let result = client.get_user(&deadline, &user_id).await;
                    deliver(&tx, DependencyOutcome::identity(result));
                }
                .instrument(span.clone()),
            );
        }

        {
            let client = Arc::clone(&self.clients.access);
            let deadline = deadline.clone();
            let user_id = request.user_id().to_owned();
            let chat_id = request.chat_id().to_owned();
            let tx = tx.clone();
            tokio::spawn(
                async move {
                    let result = client.check_access(&deadline, &user_id, &chat_id).await;
                    deliver(&tx, DependencyOutcome::access(result));
                }
                .instrument(span.clone()),
            );
        }

        {
            let client = Arc::clone(&self.clients.context);
            let deadline = deadline.clone();
            let chat_id = request.chat_id().to_owned();
            tokio::spawn(
                async move {
                    let result = client.get_context(&deadline, &chat_id).await;
                    deliver(&tx, DependencyOutcome::context(result));
                }
                .instrument(span),
            );
        }

        rx
    }

    /// Classify outcomes until the run is decided.
    async fn gather(
        &self,
        outcomes: &mut mpsc::Receiver<DependencyOutcome>,
        deadline: &Deadline,
        started: Instant,
    ) -> Result<AggregationResult, AggregationFailure> {
        let mut gathered = Gathered::new(started);

        while !gathered.is_complete() {
            tokio::select! {
                // Outcomes already queued win over a deadline firing in the
                // same poll.
                biased;
                received = outcomes.recv() => match received {
                    Some(outcome) => gathered.classify(outcome)?,
                    None => {
                        // Every producer exited; a missing critical outcome
                        // means its task died without reporting.
                        return gathered
                            .settle(self.clock.now())
                            .map_err(|pending| AggregationFailure::vanished(pending[0]));
                    }
                },
                fired = deadline.fired() => {
                    return gathered.settle(self.clock.now()).map_err(|pending| match fired {
                        Fired::Expired => {
                            AggregationFailure::critical_timeout(&pending, deadline.budget())
                        }
                        Fired::Cancelled => AggregationFailure::cancelled(&pending),
                    });
                }
            }
        }

        gathered
            .settle(self.clock.now())
            .map_err(|pending| AggregationFailure::vanished(pending[0]))
    }
}

/// Hand an outcome to the collection point without waiting.
///
/// The channel has one slot per producer, so the only possible failure is a
/// receiver that already returned; the outcome is then irrelevant.
fn deliver(tx: &mpsc::Sender<DependencyOutcome>, outcome: DependencyOutcome) {
    let dependency = outcome.dependency;
    if tx.try_send(outcome).is_err() {
        debug!(dependency = %dependency, "Late outcome discarded");
    }
}

#[derive(Debug, Default)]
enum ContextSlot {
    #[default]
    Pending,
    Delivered(ContextPayload),
    Failed,
}

/// Consumer-owned accumulator for one run.
#[derive(Debug)]
struct Gathered {
    started: Instant,
    identity: Option<IdentityPayload>,
    access: Option<AccessPayload>,
    context: ContextSlot,
}

impl Gathered {
    fn new(started: Instant) -> Self {
        Self {
            started,
            identity: None,
            access: None,
            context: ContextSlot::Pending,
        }
    }

    /// Apply the critical/optional policy to one outcome.
    ///
    /// A critical error short-circuits the run; an optional error only marks
    /// the result as degraded.
    fn classify(&mut self, outcome: DependencyOutcome) -> Result<(), AggregationFailure> {
        let dependency = outcome.dependency;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        match outcome.result {
            Ok(payload) => {
                debug!(dependency = %dependency, elapsed_ms, "Dependency succeeded");
                match payload {
                    DependencyPayload::Identity(p) => self.identity = Some(p),
                    DependencyPayload::Access(p) => self.access = Some(p),
                    DependencyPayload::Context(p) => self.context = ContextSlot::Delivered(p),
                }
                Ok(())
            }
            Err(err) if dependency.is_critical() => {
                error!(dependency = %dependency, elapsed_ms, error = %err, "Critical dependency failed");
                Err(AggregationFailure::critical(dependency, &err))
            }
            Err(err) => {
                warn!(dependency = %dependency, elapsed_ms, error = %err, "Optional dependency failed, degrading");
                self.context = ContextSlot::Failed;
                Ok(())
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.identity.is_some()
            && self.access.is_some()
            && !matches!(self.context, ContextSlot::Pending)
    }

    /// Build the result from what has been stored so far.
    ///
    /// Fails with the still-pending critical dependencies if either critical
    /// payload is missing. A context still pending counts as not delivered.
    fn settle(
        self,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AggregationResult, Vec<Dependency>> {
        match (self.identity, self.access) {
            (Some(identity), Some(access)) => {
                if matches!(self.context, ContextSlot::Pending) {
                    warn!(dependency = %Dependency::Context, "Optional dependency did not report in time, degrading");
                }
                let context = match self.context {
                    ContextSlot::Delivered(payload) => Some(payload),
                    ContextSlot::Pending | ContextSlot::Failed => None,
                };
                Ok(AggregationResult {
                    identity,
                    access,
                    degraded: context.is_none(),
                    context,
                    completed_at,
                })
            }
            (identity, access) => {
                let mut pending = Vec::with_capacity(2);
                if identity.is_none() {
                    pending.push(Dependency::Identity);
                }
                if access.is_none() {
                    pending.push(Dependency::Access);
                }
                Err(pending)
            }
        }
    }
}
