use crate::machine::Phase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<'a> {
    pub cycle: u64,
    pub from: Phase,
    pub to: Phase,
    pub detail: Option<&'a str>,
}

/// Diagnostics hook called once per state change of a dashboard machine.
pub trait TransitionObserver {
    fn on_transition(&self, transition: &Transition<'_>);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&self, t: &Transition<'_>) {
        match t.to {
            Phase::Failed | Phase::Partial => tracing::warn!(
                cycle = t.cycle,
                from = t.from.as_str(),
                to = t.to.as_str(),
                detail = t.detail.unwrap_or_default(),
                "dashboard state changed"
            ),
            _ => tracing::info!(
                cycle = t.cycle,
                from = t.from.as_str(),
                to = t.to.as_str(),
                "dashboard state changed"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&self, _transition: &Transition<'_>) {}
}
