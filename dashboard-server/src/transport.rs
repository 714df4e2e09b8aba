use dashboard_core::{HttpGet, HttpReply, TransportFault};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::io::ErrorKind;
use std::time::Duration;

/// Native transport. Relative targets resolve against `base`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base: String,
}

impl ReqwestTransport {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base))
    }

    /// Same as `new`, but redirects are handed back to the caller untouched.
    pub fn without_redirects(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn resolve(&self, target: &str) -> String {
        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            target.to_string()
        } else if target.starts_with('/') {
            format!("{}{target}", self.base)
        } else {
            format!("{}/{target}", self.base)
        }
    }
}

impl HttpGet for ReqwestTransport {
    async fn get(&self, target: &str) -> Result<HttpReply, TransportFault> {
        let url = self.resolve(target);
        let resp = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| describe(&url, e))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| describe(&url, e))?;
        Ok(HttpReply { status, body })
    }
}

/// Timeouts and refused connections get a fixed text, anything else the innermost cause.
fn describe(url: &str, err: reqwest::Error) -> TransportFault {
    tracing::debug!(%url, error = %err, "transport error");
    if err.is_timeout() {
        return TransportFault("request timed out".into());
    }

    let mut innermost: &(dyn std::error::Error + 'static) = &err;
    while let Some(source) = innermost.source() {
        if source
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == ErrorKind::ConnectionRefused)
        {
            return TransportFault("connection refused".into());
        }
        innermost = source;
    }
    TransportFault(innermost.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_targets() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/", Duration::from_secs(1)).expect("client");
        assert_eq!(
            transport.resolve("/api/v1/agents"),
            "http://localhost:8000/api/v1/agents"
        );
        assert_eq!(
            transport.resolve("api/v1/prds"),
            "http://localhost:8000/api/v1/prds"
        );
        assert_eq!(
            transport.resolve("https://httpbin.org/get"),
            "https://httpbin.org/get"
        );
    }
}
