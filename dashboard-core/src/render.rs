//! What the dashboard shows for each state, independent of any markup.

use crate::machine::{DashboardState, SideFailure};
use crate::model::{Agent, Collection, Prd};
use crate::projection::{agent_tone, format_created, prd_tone, summarize, StatusTone, Summary};
use chrono::Locale;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Surface {
    Busy {
        label: &'static str,
    },
    Populated {
        summary: Summary,
        sections: Vec<Section>,
        warning: Option<String>,
    },
    Error {
        reason: String,
        can_retry: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Section {
    pub collection: Collection,
    pub heading: String,
    pub body: SectionBody,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Items { items: Vec<ItemView> },
    /// Loaded fine, just nothing there yet.
    Empty { message: String },
    /// This side failed while the other one loaded.
    Unavailable { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub tone: StatusTone,
    pub badge: Option<&'static str>,
    pub links: Vec<Link>,
    pub version: Option<String>,
    pub created: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub href: String,
}

pub fn render(state: &DashboardState, locale: Locale) -> Surface {
    match state {
        DashboardState::Initializing => Surface::Busy {
            label: "Initializing...",
        },
        DashboardState::Loading => Surface::Busy {
            label: "Loading dashboard...",
        },
        DashboardState::Ready { agents, prds } => Surface::Populated {
            summary: summarize(agents, prds),
            sections: vec![
                agent_section(agents, None, locale),
                prd_section(prds, None, locale),
            ],
            warning: None,
        },
        DashboardState::Partial {
            agents,
            prds,
            failed,
        } => Surface::Populated {
            summary: summarize(agents, prds),
            sections: vec![
                agent_section(agents, failed_for(failed, Collection::Agents), locale),
                prd_section(prds, failed_for(failed, Collection::Prds), locale),
            ],
            warning: Some(format!(
                "Some data could not be loaded. {}",
                failed.user_message()
            )),
        },
        DashboardState::Failed { reason, .. } => Surface::Error {
            reason: reason.clone(),
            can_retry: true,
        },
    }
}

fn failed_for(failed: &SideFailure, collection: Collection) -> Option<&SideFailure> {
    (failed.collection == collection).then_some(failed)
}

fn agent_section(agents: &[Agent], failed: Option<&SideFailure>, locale: Locale) -> Section {
    section(
        Collection::Agents,
        agents.iter().map(|a| agent_item(a, locale)).collect(),
        failed,
    )
}

fn prd_section(prds: &[Prd], failed: Option<&SideFailure>, locale: Locale) -> Section {
    section(
        Collection::Prds,
        prds.iter().map(|p| prd_item(p, locale)).collect(),
        failed,
    )
}

fn section(collection: Collection, items: Vec<ItemView>, failed: Option<&SideFailure>) -> Section {
    let label = collection.label();
    let heading = format!("{label} ({})", items.len());
    let body = if let Some(failed) = failed {
        SectionBody::Unavailable {
            message: format!(
                "{label} could not be loaded: {}",
                failed.failure.user_message()
            ),
        }
    } else if items.is_empty() {
        SectionBody::Empty {
            message: format!("No {} yet", collection.noun()),
        }
    } else {
        SectionBody::Items { items }
    };
    Section {
        collection,
        heading,
        body,
    }
}

pub fn agent_item(agent: &Agent, locale: Locale) -> ItemView {
    let links = [
        ("View", agent.deployment_url.as_deref()),
        ("Health Check", agent.health_check_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, href)| {
        safe_href(href?).map(|href| Link {
            label,
            href: href.to_string(),
        })
    })
    .collect();

    ItemView {
        id: agent.id.clone(),
        title: agent.name.clone(),
        description: agent.description.clone(),
        status: agent.status.clone(),
        tone: agent_tone(&agent.status),
        badge: None,
        links,
        version: agent.version.clone().filter(|v| !v.trim().is_empty()),
        created: format_created(agent.created_at.as_deref(), locale),
    }
}

pub fn prd_item(prd: &Prd, locale: Locale) -> ItemView {
    ItemView {
        id: prd.id.clone(),
        title: prd.title.clone(),
        description: prd.description.clone(),
        status: prd.status.clone(),
        tone: prd_tone(&prd.status),
        badge: prd.prd_type.map(|t| t.as_str()),
        links: Vec::new(),
        version: None,
        created: format_created(prd.created_at.as_deref(), locale),
    }
}

/// Only plain web links make it onto the page.
fn safe_href(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://")).then_some(trimmed)
}
