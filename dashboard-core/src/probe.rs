//! Reachability checks behind the diagnostics pages.

use crate::client::{HttpGet, HEALTH_PATH};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub name: String,
    pub target: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Success,
    Failed,
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Success => "SUCCESS",
            Verdict::Failed => "FAILED",
            Verdict::Error => "ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub name: String,
    pub target: String,
    pub verdict: Verdict,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// External service, backend by absolute origin, and backend through the proxy.
pub fn default_targets(backend_origin: &str, external_url: &str) -> Vec<ProbeTarget> {
    let origin = backend_origin.trim_end_matches('/');
    vec![
        ProbeTarget::new("External Service", external_url),
        ProbeTarget::new("Backend Service (full URL)", format!("{origin}{HEALTH_PATH}")),
        ProbeTarget::new("Backend Service (relative URL)", HEALTH_PATH),
    ]
}

pub async fn probe<H: HttpGet>(transport: &H, target: &ProbeTarget) -> ProbeReport {
    let mut report = ProbeReport {
        name: target.name.clone(),
        target: target.target.clone(),
        verdict: Verdict::Error,
        status_code: None,
        error: None,
        data: None,
    };

    match transport.get(&target.target).await {
        Ok(reply) => {
            report.status_code = Some(reply.status);
            if reply.is_success() {
                report.verdict = Verdict::Success;
                report.data = serde_json::from_str(&reply.body).ok();
            } else {
                report.verdict = Verdict::Failed;
            }
        }
        Err(fault) => report.error = Some(fault.0),
    }

    tracing::debug!(
        name = %report.name,
        verdict = report.verdict.as_str(),
        status = ?report.status_code,
        "probe finished"
    );
    report
}

/// Probes every target at once. Reports come back in target order.
pub async fn run_probes<H: HttpGet>(transport: &H, targets: &[ProbeTarget]) -> Vec<ProbeReport> {
    futures::future::join_all(targets.iter().map(|t| probe(transport, t))).await
}
