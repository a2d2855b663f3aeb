//! Shared fixtures: a scripted upstream and SSE helpers
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use chat_relay::config::StreamLimits;
use chat_relay::error::RelayError;
use chat_relay::types::{ConversationMessage, RelayEvent};
use chat_relay::upstream::{UpstreamByteStream, UpstreamProvider, classify_http_error};

/// What the fake upstream does when a stream is opened
#[derive(Debug, Clone)]
pub enum Script {
    /// Serve these body reads, then close
    Body(Vec<Bytes>),
    /// Serve these body reads, then stall forever
    BodyThenStall(Vec<Bytes>),
    /// Answer with a non-success status
    Reject { status: u16, body: String },
    /// Never answer
    Hang,
}

/// Set when the body handed out by [`FakeUpstream`] is dropped.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct FakeUpstream {
    script: Script,
    calls: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl FakeUpstream {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn body<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Script::Body(to_bytes(chunks)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamProvider for FakeUpstream {
    fn name(&self) -> &str {
        "fake"
    }

    async fn open_stream(
        &self,
        _messages: &[ConversationMessage],
    ) -> Result<UpstreamByteStream, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (chunks, stall) = match &self.script {
            Script::Body(chunks) => (chunks.clone(), false),
            Script::BodyThenStall(chunks) => (chunks.clone(), true),
            Script::Reject { status, body } => return Err(classify_http_error(*status, body)),
            Script::Hang => futures::future::pending().await,
        };

        let flag = ReleaseFlag(self.released.clone());
        let reads = futures::stream::iter(chunks.into_iter().map(Ok::<_, RelayError>));
        let body = if stall {
            reads.chain(futures::stream::pending()).boxed()
        } else {
            reads.boxed()
        };

        Ok(body
            .map(move |read| {
                let _held = &flag;
                read
            })
            .boxed())
    }
}

pub fn to_bytes<I, S>(chunks: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    chunks.into_iter().map(|c| Bytes::from(c.into())).collect()
}

/// One upstream `data:` frame carrying a content delta
pub fn delta(text: &str) -> String {
    let payload = serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": { "content": text }, "finish_reason": null }]
    });
    format!("data: {payload}\n\n")
}

pub fn done() -> String {
    "data: [DONE]\n\n".to_string()
}

/// Full upstream body: one frame per delta, then the sentinel
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|d| delta(d)).collect();
    body.push_str(&done());
    body
}

/// Parse a relay response body back into events
pub fn parse_client_body(body: &str) -> Vec<RelayEvent> {
    body.split("\n\n")
        .filter_map(|block| {
            block
                .lines()
                .find_map(|line| line.strip_prefix("data:"))
                .map(|data| RelayEvent::from_data(data).expect("relay event"))
        })
        .collect()
}

pub fn contents(events: &[RelayEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RelayEvent::Content { content } => Some(content.clone()),
            _ => None,
        })
        .collect()
}

pub fn limits(idle_secs: u64, max_secs: u64) -> StreamLimits {
    StreamLimits {
        idle_timeout: std::time::Duration::from_secs(idle_secs),
        max_duration: std::time::Duration::from_secs(max_secs),
    }
}
