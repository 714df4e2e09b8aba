//! Server-rendered dashboard and connectivity diagnostics.

use crate::transport::ReqwestTransport;
use axum::{extract::State, response::Html, routing::get, Json, Router};
use chrono::Locale;
use dashboard_core::probe::{run_probes, ProbeReport, ProbeTarget, Verdict};
use dashboard_core::render::{render, ItemView, Section, SectionBody, Surface};
use dashboard_core::{run_cycle, DashboardEndpoints, DashboardMachine};
use std::fmt::Write;
use std::sync::Arc;

#[derive(Clone)]
pub struct PageState {
    /// Talks to the backend origin directly.
    pub backend: ReqwestTransport,
    /// Talks to this server, so relative probes go through the proxy.
    pub loopback: ReqwestTransport,
    pub probe_targets: Arc<Vec<ProbeTarget>>,
}

pub fn pages_router(state: PageState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_page))
        .route("/diagnostics/connectivity", get(connectivity_page))
        .route("/diagnostics/connectivity.json", get(connectivity_json))
        .with_state(state)
}

async fn dashboard_page(State(state): State<PageState>) -> Html<String> {
    // The page is built in one pass on the server, so the surface is ready immediately.
    let mut machine = DashboardMachine::new();
    if let Some(ticket) = machine.surface_ready() {
        run_cycle(
            &mut machine,
            ticket,
            &state.backend,
            DashboardEndpoints::default(),
        )
        .await;
    }
    Html(dashboard_html(&render(machine.state(), Locale::en_US)))
}

async fn connectivity_page(State(state): State<PageState>) -> Html<String> {
    Html(diagnostics_html(&probe_all(&state).await))
}

async fn connectivity_json(State(state): State<PageState>) -> Json<Vec<ProbeReport>> {
    Json(probe_all(&state).await)
}

async fn probe_all(state: &PageState) -> Vec<ProbeReport> {
    // Absolute targets ignore the transport base, so one transport serves every probe.
    run_probes(&state.loopback, &state.probe_targets).await
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;background:#f9fafb}\
.layout{display:grid;grid-template-columns:1fr 1fr;gap:1.5rem}\
.panel{background:#fff;border-radius:8px;padding:1rem;box-shadow:0 1px 2px #0002}\
.meta{color:#6b7280;font-size:.85rem}.badge{padding:0 .5rem;border-radius:9px;font-size:.8rem}\
.ok{background:#dcfce7;color:#166534}.progress{background:#fef9c3;color:#854d0e}\
.warn{background:#fee2e2;color:#991b1b}.neutral{background:#f3f4f6;color:#1f2937}\
.type{background:#dbeafe;color:#1e40af}.stats{display:flex;gap:3rem}.stat b{font-size:1.6rem;display:block}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

pub fn dashboard_html(surface: &Surface) -> String {
    let mut body = String::from("<h1>AI Agent Factory</h1>");
    match surface {
        Surface::Busy { label } => {
            let _ = write!(body, "<p class=\"meta\">{}</p>", escape(label));
        }
        Surface::Error { reason, can_retry } => {
            let _ = write!(
                body,
                "<div class=\"panel warn\"><strong>Error:</strong> {}</div>",
                escape(reason)
            );
            if *can_retry {
                body.push_str("<p><a href=\"/dashboard\">Retry</a></p>");
            }
        }
        Surface::Populated {
            summary,
            sections,
            warning,
        } => {
            if let Some(warning) = warning {
                let _ = write!(body, "<div class=\"panel warn\">{}</div>", escape(warning));
            }
            body.push_str("<div class=\"layout\">");
            for section in sections {
                section_html(&mut body, section);
            }
            body.push_str("</div>");
            let _ = write!(
                body,
                "<section class=\"panel\"><h2>System Status</h2><div class=\"stats\">\
                 <div class=\"stat\"><b>{}</b>Total Agents</div>\
                 <div class=\"stat\"><b>{}</b>Active Agents</div>\
                 <div class=\"stat\"><b>{}</b>Total PRDs</div></div></section>",
                summary.total_agents, summary.active_agents, summary.total_prds
            );
        }
    }
    page("AI Agent Factory", &body)
}

fn section_html(out: &mut String, section: &Section) {
    let _ = write!(
        out,
        "<section class=\"panel\"><h2>{}</h2>",
        escape(&section.heading)
    );
    match &section.body {
        SectionBody::Items { items } => {
            out.push_str("<ul>");
            for item in items {
                item_html(out, item);
            }
            out.push_str("</ul>");
        }
        SectionBody::Empty { message } => {
            let _ = write!(out, "<p class=\"meta\">{}</p>", escape(message));
        }
        SectionBody::Unavailable { message } => {
            let _ = write!(out, "<p class=\"warn\">{}</p>", escape(message));
        }
    }
    out.push_str("</section>");
}

fn item_html(out: &mut String, item: &ItemView) {
    let _ = write!(
        out,
        "<li><div><b>{}</b></div><div class=\"meta\">{}</div><div><span class=\"badge {}\">{}</span>",
        escape(&item.title),
        escape(&item.description),
        item.tone.css_class(),
        escape(&item.status)
    );
    if let Some(badge) = item.badge {
        let _ = write!(out, " <span class=\"badge type\">{}</span>", escape(badge));
    }
    if let Some(version) = &item.version {
        let _ = write!(out, " <span class=\"meta\">Version: {}</span>", escape(version));
    }
    if let Some(created) = &item.created {
        let _ = write!(out, " <span class=\"meta\">Created: {}</span>", escape(created));
    }
    for link in &item.links {
        let _ = write!(
            out,
            " <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
            escape(&link.href),
            escape(link.label)
        );
    }
    out.push_str("</div></li>");
}

pub fn diagnostics_html(reports: &[ProbeReport]) -> String {
    let mut body = String::from("<h1>Connectivity Test</h1>");
    for report in reports {
        let class = if report.verdict == Verdict::Success {
            "ok"
        } else {
            "warn"
        };
        let _ = write!(
            body,
            "<div class=\"panel\"><h3>{}</h3><p class=\"meta\">{}</p><p class=\"badge {class}\">Status: {}</p>",
            escape(&report.name),
            escape(&report.target),
            report.verdict.as_str()
        );
        if let Some(code) = report.status_code {
            let _ = write!(body, "<p class=\"meta\">Status Code: {code}</p>");
        }
        if let Some(error) = &report.error {
            let _ = write!(body, "<p class=\"warn\">Error: {}</p>", escape(error));
        }
        if let Some(data) = &report.data {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_default();
            let _ = write!(
                body,
                "<details><summary>View Data</summary><pre>{}</pre></details>",
                escape(&pretty)
            );
        }
        body.push_str("</div>");
    }
    page("Connectivity Test", &body)
}
