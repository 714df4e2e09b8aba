use crate::client::{fetch_collection, Endpoint, FetchOutcome, HttpGet, AGENTS, PRDS};
use crate::error::FetchFailure;
use crate::model::{Agent, Collection, Prd};
use crate::observer::{TracingObserver, Transition, TransitionObserver};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Loading,
    Ready,
    Partial,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Partial => "partial",
            Phase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Ready | Phase::Partial | Phase::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideFailure {
    pub collection: Collection,
    pub failure: FetchFailure,
}

impl SideFailure {
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.collection.label(), self.failure.user_message())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DashboardState {
    Initializing,
    Loading,
    Ready {
        agents: Vec<Agent>,
        prds: Vec<Prd>,
    },
    /// One side failed; its collection is empty and the failure is kept.
    Partial {
        agents: Vec<Agent>,
        prds: Vec<Prd>,
        failed: SideFailure,
    },
    /// Nothing is exposed to the surface besides the reason.
    Failed {
        reason: String,
        failures: Vec<SideFailure>,
    },
}

impl DashboardState {
    pub fn phase(&self) -> Phase {
        match self {
            DashboardState::Initializing => Phase::Initializing,
            DashboardState::Loading => Phase::Loading,
            DashboardState::Ready { .. } => Phase::Ready,
            DashboardState::Partial { .. } => Phase::Partial,
            DashboardState::Failed { .. } => Phase::Failed,
        }
    }

    /// Combines both settled outcomes into exactly one terminal state.
    pub fn reduce(agents: FetchOutcome<Agent>, prds: FetchOutcome<Prd>) -> Self {
        let failures = [
            agents.failure().map(|f| SideFailure {
                collection: Collection::Agents,
                failure: f.clone(),
            }),
            prds.failure().map(|f| SideFailure {
                collection: Collection::Prds,
                failure: f.clone(),
            }),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        // An undecodable body means the backend contract is broken; don't show half a page.
        if failures.iter().any(|s| s.failure.is_decode()) {
            return DashboardState::Failed {
                reason: failure_reason(&failures),
                failures,
            };
        }

        match (agents, prds) {
            (FetchOutcome::Success(agents), FetchOutcome::Success(prds)) => {
                DashboardState::Ready { agents, prds }
            }
            (FetchOutcome::Success(agents), FetchOutcome::Failure(failure)) => {
                DashboardState::Partial {
                    agents,
                    prds: Vec::new(),
                    failed: SideFailure {
                        collection: Collection::Prds,
                        failure,
                    },
                }
            }
            (FetchOutcome::Failure(failure), FetchOutcome::Success(prds)) => {
                DashboardState::Partial {
                    agents: Vec::new(),
                    prds,
                    failed: SideFailure {
                        collection: Collection::Agents,
                        failure,
                    },
                }
            }
            (FetchOutcome::Failure(_), FetchOutcome::Failure(_)) => DashboardState::Failed {
                reason: failure_reason(&failures),
                failures,
            },
        }
    }
}

fn failure_reason(failures: &[SideFailure]) -> String {
    failures
        .iter()
        .map(SideFailure::user_message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The pair of endpoints one dashboard loads.
#[derive(Clone, Copy, Debug)]
pub struct DashboardEndpoints {
    pub agents: Endpoint<Agent>,
    pub prds: Endpoint<Prd>,
}

impl Default for DashboardEndpoints {
    fn default() -> Self {
        Self {
            agents: AGENTS,
            prds: PRDS,
        }
    }
}

/// Issues both requests at once and resolves only after both have settled.
pub async fn load_both<H: HttpGet>(
    transport: &H,
    endpoints: DashboardEndpoints,
) -> (FetchOutcome<Agent>, FetchOutcome<Prd>) {
    futures::join!(
        fetch_collection(transport, endpoints.agents),
        fetch_collection(transport, endpoints.prds)
    )
}

/// Proof that a fetch cycle was started; results must be handed back with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    cycle: u64,
}

impl FetchTicket {
    pub fn cycle(self) -> u64 {
        self.cycle
    }
}

pub struct DashboardMachine<O = TracingObserver> {
    state: DashboardState,
    cycle: u64,
    detached: bool,
    observer: O,
}

impl DashboardMachine<TracingObserver> {
    pub fn new() -> Self {
        Self::with_observer(TracingObserver)
    }
}

impl Default for DashboardMachine<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: TransitionObserver> DashboardMachine<O> {
    pub fn with_observer(observer: O) -> Self {
        Self {
            state: DashboardState::Initializing,
            cycle: 0,
            detached: false,
            observer,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// The surface is attached and stable; start the first cycle.
    ///
    /// Only the first call from `Initializing` does anything.
    pub fn surface_ready(&mut self) -> Option<FetchTicket> {
        if self.detached || self.state.phase() != Phase::Initializing {
            return None;
        }
        Some(self.begin_cycle())
    }

    /// Throws away the terminal state and starts a full re-fetch.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.detached || !self.state.phase().is_terminal() {
            return None;
        }
        Some(self.begin_cycle())
    }

    /// Applies both outcomes at once. Returns false when the ticket is stale.
    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        agents: FetchOutcome<Agent>,
        prds: FetchOutcome<Prd>,
    ) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.transition(DashboardState::reduce(agents, prds));
        true
    }

    /// The cycle blew up before any outcome could be determined.
    pub fn abort(&mut self, ticket: FetchTicket, reason: impl Into<String>) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.transition(DashboardState::Failed {
            reason: reason.into(),
            failures: Vec::new(),
        });
        true
    }

    /// The surface is gone. Anything still in flight is dropped on arrival.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    fn begin_cycle(&mut self) -> FetchTicket {
        self.cycle += 1;
        self.transition(DashboardState::Loading);
        FetchTicket { cycle: self.cycle }
    }

    fn accepts(&self, ticket: FetchTicket) -> bool {
        let fresh = !self.detached
            && ticket.cycle == self.cycle
            && self.state.phase() == Phase::Loading;
        if !fresh {
            tracing::debug!(
                ticket = ticket.cycle,
                current = self.cycle,
                detached = self.detached,
                "discarding stale fetch result"
            );
        }
        fresh
    }

    fn transition(&mut self, next: DashboardState) {
        let from = self.state.phase();
        let detail = match &next {
            DashboardState::Partial { failed, .. } => Some(failed.user_message()),
            DashboardState::Failed { reason, .. } => Some(reason.clone()),
            _ => None,
        };
        self.state = next;
        self.observer.on_transition(&Transition {
            cycle: self.cycle,
            from,
            to: self.state.phase(),
            detail: detail.as_deref(),
        });
    }
}

/// Runs one full cycle for hosts that can hold the machine across the await.
pub async fn run_cycle<H, O>(
    machine: &mut DashboardMachine<O>,
    ticket: FetchTicket,
    transport: &H,
    endpoints: DashboardEndpoints,
) -> bool
where
    H: HttpGet,
    O: TransitionObserver,
{
    let (agents, prds) = load_both(transport, endpoints).await;
    machine.settle(ticket, agents, prds)
}
