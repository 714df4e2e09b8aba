use crate::client::{HttpGet, HttpReply};
use crate::error::TransportFault;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// In-memory transport answering each target from a fixed script.
///
/// Every call records `start:<target>` and `end:<target>` and yields once in
/// between, so tests can tell concurrent issuance from sequential.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, Result<HttpReply, TransportFault>>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn ok(self, target: &str, body: &str) -> Self {
        self.status(target, 200, body)
    }

    pub fn status(mut self, target: &str, status: u16, body: &str) -> Self {
        self.replies.insert(
            target.to_string(),
            Ok(HttpReply {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn fault(mut self, target: &str, message: &str) -> Self {
        self.replies
            .insert(target.to_string(), Err(TransportFault(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().expect("log").clone()
    }

    fn record(&self, entry: String) {
        if let Ok(mut guard) = self.log.lock() {
            guard.push(entry);
        }
    }
}

impl HttpGet for ScriptedTransport {
    async fn get(&self, target: &str) -> Result<HttpReply, TransportFault> {
        self.record(format!("start:{target}"));
        YieldOnce(false).await;
        self.record(format!("end:{target}"));
        self.replies
            .get(target)
            .cloned()
            .unwrap_or_else(|| Err(TransportFault(format!("no route to {target}"))))
    }
}

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
