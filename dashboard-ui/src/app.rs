use crate::bridge::{browser_locale, BrowserTransport, ConsoleObserver};
use dashboard_core::client::HEALTH_PATH;
use dashboard_core::probe::{run_probes, ProbeReport, ProbeTarget, Verdict};
use dashboard_core::projection::Summary;
use dashboard_core::render::{render, ItemView, Section, SectionBody, Surface};
use dashboard_core::{load_both, DashboardEndpoints, DashboardMachine, DashboardState, FetchTicket};
use leptos::*;
use wasm_bindgen_futures::spawn_local;

#[component]
pub fn App() -> impl IntoView {
    let machine = store_value(DashboardMachine::with_observer(ConsoleObserver));
    let state = create_rw_signal(DashboardState::Initializing);
    let locale = browser_locale();

    let sync = move || {
        machine.with_value(|m| state.set(m.state().clone()));
    };

    let start = move |ticket: Option<FetchTicket>| {
        let Some(ticket) = ticket else {
            return;
        };
        sync();
        spawn_local(async move {
            let (agents, prds) = load_both(&BrowserTransport, DashboardEndpoints::default()).await;
            // None once the component is gone; false when a newer cycle owns the machine.
            let applied = machine
                .try_update_value(|m| m.settle(ticket, agents, prds))
                .unwrap_or(false);
            if applied {
                sync();
            }
        });
    };

    // Effects first run after the view is mounted, which is the readiness signal.
    create_effect(move |_| {
        start(machine.try_update_value(|m| m.surface_ready()).flatten());
    });

    on_cleanup(move || {
        let _ = machine.try_update_value(|m| m.detach());
    });

    let retry = move || start(machine.try_update_value(|m| m.retry()).flatten());

    view! {
      <h1>"AI Agent Factory"</h1>
      {move || match render(&state.get(), locale) {
          Surface::Busy { label } => view! { <p class="meta">{label}</p> }.into_view(),
          Surface::Error { reason, can_retry } => view! {
            <div class="panel warn"><strong>"Error: "</strong>{reason}</div>
            {can_retry.then(|| view! { <button on:click=move |_| retry()>"Retry"</button> })}
          }
          .into_view(),
          Surface::Populated { summary, sections, warning } => view! {
            {warning.map(|w| view! { <div class="panel warn">{w}</div> })}
            <div class="layout">
              {sections.into_iter().map(|section| view! { <SectionPanel section=section/> }).collect_view()}
            </div>
            <SystemStatus summary=summary/>
          }
          .into_view(),
      }}
      <Diagnostics/>
    }
}

#[component]
fn SectionPanel(section: Section) -> impl IntoView {
    let body = match section.body {
        SectionBody::Items { items } => view! {
          <ul>{items.into_iter().map(|item| view! { <ItemCard item=item/> }).collect_view()}</ul>
        }
        .into_view(),
        SectionBody::Empty { message } => view! { <p class="meta">{message}</p> }.into_view(),
        SectionBody::Unavailable { message } => view! { <p class="warn">{message}</p> }.into_view(),
    };

    view! {
      <section class="panel">
        <h2>{section.heading}</h2>
        {body}
      </section>
    }
}

#[component]
fn ItemCard(item: ItemView) -> impl IntoView {
    view! {
      <li>
        <div><b>{item.title}</b></div>
        <div class="meta">{item.description}</div>
        <div>
          <span class=format!("badge {}", item.tone.css_class())>{item.status}</span>
          {item.badge.map(|b| view! { " " <span class="badge type">{b}</span> })}
          {item.version.map(|v| view! { " " <span class="meta">{format!("Version: {v}")}</span> })}
          {item.created.map(|c| view! { " " <span class="meta">{format!("Created: {c}")}</span> })}
          {item
              .links
              .into_iter()
              .map(|link| view! {
                " " <a href=link.href target="_blank" rel="noopener noreferrer">{link.label}</a>
              })
              .collect_view()}
        </div>
      </li>
    }
}

#[component]
fn SystemStatus(summary: Summary) -> impl IntoView {
    view! {
      <section class="panel">
        <h2>"System Status"</h2>
        <div class="stats">
          <div class="stat"><b>{summary.total_agents}</b>"Total Agents"</div>
          <div class="stat"><b>{summary.active_agents}</b>"Active Agents"</div>
          <div class="stat"><b>{summary.total_prds}</b>"Total PRDs"</div>
        </div>
      </section>
    }
}

#[component]
fn Diagnostics() -> impl IntoView {
    let reports = create_rw_signal(Vec::<ProbeReport>::new());
    let running = create_rw_signal(false);

    let run = move || {
        running.set(true);
        spawn_local(async move {
            let targets = [ProbeTarget::new("Backend Service (relative URL)", HEALTH_PATH)];
            let found = run_probes(&BrowserTransport, &targets).await;
            let _ = reports.try_set(found);
            let _ = running.try_set(false);
        });
    };

    view! {
      <section class="panel">
        <h2>"Connectivity"</h2>
        <button disabled=move || running.get() on:click=move |_| run()>"Run checks"</button>
        <For
          each=move || reports.get()
          key=|r| r.target.clone()
          children=move |r| view! { <ProbeRow report=r/> }
        />
      </section>
    }
}

#[component]
fn ProbeRow(report: ProbeReport) -> impl IntoView {
    let class = if report.verdict == Verdict::Success {
        "ok"
    } else {
        "warn"
    };
    let data = report
        .data
        .as_ref()
        .and_then(|d| serde_json::to_string_pretty(d).ok());

    view! {
      <div class="probe">
        <h3>{report.name}</h3>
        <p class="meta">{report.target}</p>
        <p class=format!("badge {class}")>{format!("Status: {}", report.verdict.as_str())}</p>
        {report.status_code.map(|code| view! { <p class="meta">{format!("Status Code: {code}")}</p> })}
        {report.error.map(|e| view! { <p class="warn">{format!("Error: {e}")}</p> })}
        {data.map(|pretty| view! {
          <details>
            <summary>"View Data"</summary>
            <pre>{pretty}</pre>
          </details>
        })}
      </div>
    }
}
