//! Hand-written fakes for the network seams, shared by the unit tests.

use crate::api::{ChatCompletion, Completion};
use crate::error::{Error, Result};
use crate::models::TokenUsage;
use crate::sources::JsonFetch;
use serde_json::Value;
use std::collections::HashMap;
use std::future::{Future, ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Completion fake driven by a closure over `(system, user)`.
pub struct FnCompletion<F> {
    f: F,
}

impl<F> FnCompletion<F>
where
    F: Fn(&str, &str) -> Result<Completion> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ChatCompletion for FnCompletion<F>
where
    F: Fn(&str, &str) -> Result<Completion> + Send + Sync,
{
    fn complete(&self, system: &str, user: &str) -> impl Future<Output = Result<Completion>> + Send {
        ready((self.f)(system, user))
    }
}

/// A completion fake that always answers `content` with `usage(10)`.
pub fn replying(
    content: impl Into<String>,
) -> FnCompletion<impl Fn(&str, &str) -> Result<Completion> + Send + Sync> {
    let content = content.into();
    FnCompletion::new(move |_: &str, _: &str| {
        Ok(Completion {
            content: content.clone(),
            usage: Some(usage(10)),
        })
    })
}

pub fn usage(total: u64) -> TokenUsage {
    TokenUsage {
        total_tokens: total,
        prompt_tokens: total - total / 2,
        completion_tokens: total / 2,
    }
}

/// A well-formed gene-map answer with the given score.
pub fn analysis_json(score: u8) -> String {
    serde_json::json!({
        "viralityScore": score,
        "sentiment": {"label": "中性", "analysis": "讨论平稳"},
        "domain": {"label": "社会", "analysis": "民生话题"},
        "contentForm": {"label": "图文", "analysis": "以图文为主"},
        "lifecycle": {"label": "爆发期", "analysis": "热度快速上升"},
        "keywords": ["关键词一", "关键词二", "关键词三", "关键词一"]
    })
    .to_string()
}

/// URL-keyed fetch fake. Unknown URLs fail with a transport error.
#[derive(Default)]
pub struct MapFetch {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl MapFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), body);
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl JsonFetch for MapFetch {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value>> + Send {
        self.calls.lock().unwrap().push(url.to_string());
        let result = self
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("connection refused: {url}")));
        ready(result)
    }
}

/// Wraps another fake and sleeps `delay` before every call.
///
/// `started()` counts calls that have begun, `finished()` those that returned.
pub struct Delayed<T> {
    inner: T,
    delay: Duration,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl<T> Delayed<T> {
    pub fn new(inner: T, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            started: Arc::default(),
            finished: Arc::default(),
        }
    }

    pub fn started(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.started)
    }

    pub fn finished(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.finished)
    }
}

impl<T: ChatCompletion + Sync> ChatCompletion for Delayed<T> {
    async fn complete(&self, system: &str, user: &str) -> Result<Completion> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = self.inner.complete(system, user).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl<T: JsonFetch + Sync> JsonFetch for Delayed<T> {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = self.inner.get_json(url).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}
