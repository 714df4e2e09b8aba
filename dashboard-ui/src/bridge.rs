//! Browser side of the transport seam.

use chrono::Locale;
use dashboard_core::projection::locale_from_tag;
use dashboard_core::{
    HttpGet, HttpReply, Phase, Transition, TransitionObserver, TransportFault,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCache, RequestInit, Response};

/// `window.fetch` with the HTTP cache bypassed. Relative targets resolve
/// against the page origin, so `/api/*` goes through whatever proxy serves it.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

impl HttpGet for BrowserTransport {
    async fn get(&self, target: &str) -> Result<HttpReply, TransportFault> {
        let window = web_sys::window().ok_or_else(|| TransportFault("window not available".into()))?;

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_cache(RequestCache::NoStore);
        let request = Request::new_with_str_and_init(target, &init).map_err(fault)?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(fault)?;
        let response: Response = value.dyn_into().map_err(fault)?;
        let status = response.status();
        let text = JsFuture::from(response.text().map_err(fault)?)
            .await
            .map_err(fault)?;

        Ok(HttpReply {
            status,
            body: text.as_string().unwrap_or_default(),
        })
    }
}

fn fault(value: JsValue) -> TransportFault {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "network error".to_string());
    TransportFault(message)
}

pub fn browser_locale() -> Locale {
    web_sys::window()
        .and_then(|w| w.navigator().language())
        .map(|tag| locale_from_tag(&tag))
        .unwrap_or(Locale::en_US)
}

/// Machine transitions in the devtools console; failures go out as warnings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleObserver;

impl TransitionObserver for ConsoleObserver {
    fn on_transition(&self, transition: &Transition<'_>) {
        let line = JsValue::from_str(&console_line(transition));
        match transition.to {
            Phase::Failed | Phase::Partial => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }
}

fn console_line(t: &Transition<'_>) -> String {
    let mut line = format!(
        "[dashboard] cycle {}: {} -> {}",
        t.cycle,
        t.from.as_str(),
        t.to.as_str()
    );
    if let Some(detail) = t.detail {
        line.push_str(" (");
        line.push_str(detail);
        line.push(')');
    }
    line
}
