//! Trend sources and the fallback chain that combines them.
//!
//! The chain walks a fixed sequence of tiers, strictly one after another:
//!
//! | Tier | What it does | Falls through when |
//! |------|--------------|--------------------|
//! | `Primary` | GET the primary endpoint via the relay | transport error, non-JSON, list path missing/empty |
//! | `Backup` | same, backup endpoint | same |
//! | `Generative` | ask the completion service to synthesize items | any error, including a missing credential |
//! | `Placeholder` | fixed two-item notice list | never |
//!
//! There are no retries within a tier.

pub mod feed;
pub mod normalize;

pub use feed::{HttpFeed, JsonFetch, SourceEndpoint};

use crate::api::ChatCompletion;
use crate::error::{Error, Result};
use crate::models::{Category, TrendItem};
use crate::prompts;
use crate::utils::extract_json;
use chrono::Local;
use feed::extract_list;
use normalize::{normalize_generated, normalize_source_entries};
use serde::Deserialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// How many items the generative tier asks for.
pub const GENERATED_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Backup,
    Generative,
    Placeholder,
}

impl Tier {
    /// The tier to try after this one fails.
    pub fn next(self) -> Tier {
        match self {
            Tier::Primary => Tier::Backup,
            Tier::Backup => Tier::Generative,
            Tier::Generative | Tier::Placeholder => Tier::Placeholder,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Primary => "primary",
            Tier::Backup => "backup",
            Tier::Generative => "generative",
            Tier::Placeholder => "placeholder",
        })
    }
}

/// Items from one fetch cycle and the tier that produced them.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub source: Tier,
    pub items: Vec<TrendItem>,
}

#[derive(Deserialize)]
struct GeneratedTrends {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// The terminal list shown when no tier produced data.
pub fn placeholder_items() -> Vec<TrendItem> {
    vec![
        TrendItem {
            rank: 1,
            title: "网络连接失败，无法获取实时热搜".to_string(),
            hot_value: 0,
            category: Category::DEFAULT,
            heat_rise: Some(0),
            description: Some("主备数据源均不可用，请检查网络或代理设置后刷新".to_string()),
        },
        TrendItem {
            rank: 2,
            title: "未配置 API Key，无法生成模拟数据".to_string(),
            hot_value: 0,
            category: Category::DEFAULT,
            heat_rise: Some(0),
            description: Some("配置 API Key 后可在数据源不可用时生成模拟热搜".to_string()),
        },
    ]
}

pub struct SourceChain<F, C> {
    fetch: F,
    completion: C,
    proxy: String,
    primary: SourceEndpoint,
    backup: SourceEndpoint,
}

impl<F: JsonFetch, C: ChatCompletion> SourceChain<F, C> {
    pub fn new(
        fetch: F,
        completion: C,
        proxy: impl Into<String>,
        primary: SourceEndpoint,
        backup: SourceEndpoint,
    ) -> Self {
        Self {
            fetch,
            completion,
            proxy: proxy.into(),
            primary,
            backup,
        }
    }

    /// Run the chain until a tier yields items. Never fails.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_trends(&self) -> FetchOutcome {
        let t0 = Instant::now();
        let mut tier = Tier::Primary;
        loop {
            let attempt = match tier {
                Tier::Primary => self.from_endpoint(&self.primary).await,
                Tier::Backup => self.from_endpoint(&self.backup).await,
                Tier::Generative => self.generate().await,
                Tier::Placeholder => Ok(placeholder_items()),
            };
            match attempt {
                Ok(items) => {
                    info!(
                        %tier,
                        count = items.len(),
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        "Trend fetch complete"
                    );
                    return FetchOutcome {
                        source: tier,
                        items,
                    };
                }
                Err(e) => {
                    let next = tier.next();
                    warn!(%tier, %next, error = %e, "Trend tier failed; falling through");
                    tier = next;
                }
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(url = %endpoint.url))]
    async fn from_endpoint(&self, endpoint: &SourceEndpoint) -> Result<Vec<TrendItem>> {
        let body = self.fetch.get_json(&endpoint.proxied_url(&self.proxy)).await?;
        let entries = extract_list(&body, &endpoint.list_path)?;
        let items = normalize_source_entries(entries);
        if items.is_empty() {
            return Err(Error::MalformedResponse("no entry carried a title".into()));
        }
        Ok(items)
    }

    #[instrument(level = "info", skip_all)]
    async fn generate(&self) -> Result<Vec<TrendItem>> {
        let today = Local::now().date_naive().to_string();
        let completion = self
            .completion
            .complete(
                prompts::GENERATE_SYSTEM,
                &prompts::generate_user(GENERATED_COUNT, &today),
            )
            .await?;
        let generated: GeneratedTrends = serde_json::from_str(extract_json(&completion.content))?;
        let items = normalize_generated(&generated.items);
        if items.is_empty() {
            return Err(Error::MalformedResponse("generated list is empty".into()));
        }
        info!(count = items.len(), usage = ?completion.usage, "Synthesized trend items");
        Ok(items)
    }
}
