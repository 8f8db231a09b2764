//! Gene-map analysis over the completion service.
//!
//! Three operations share one structured call, but each degrades
//! differently when the service misbehaves:
//!
//! | Operation | Missing credential | Any other failure |
//! |-----------|--------------------|-------------------|
//! | [`Analyst::analyze_item`] | error | fallback record |
//! | [`Analyst::analyze_aggregate`] | error | [`Error::AnalysisFailed`] |
//! | [`Analyst::detect_big_events`] | error | empty list |
//!
//! [`Analyst::overview`] runs the last two concurrently and sums their usage.

use crate::api::ChatCompletion;
use crate::error::{Error, Result};
use crate::models::{BigEvent, GeneMapAnalysis, TokenUsage, TrendItem};
use crate::prompts;
use crate::utils::{extract_json, looks_truncated, truncate_for_log};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// How many items aggregate prompts include by default.
pub const DEFAULT_ANALYSIS_LIMIT: usize = 50;

/// A gene-map analysis plus the usage of the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub analysis: GeneMapAnalysis,
    pub usage: Option<TokenUsage>,
    /// `true` when this is the fixed record returned after a failed call.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BigEvents {
    pub events: Vec<BigEvent>,
    pub usage: Option<TokenUsage>,
}

/// Aggregate analysis and event list produced together.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub analysis: GeneMapAnalysis,
    pub events: Vec<BigEvent>,
    /// Sum of both calls' usage; absent counters count as zero.
    pub usage: TokenUsage,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventsPayload {
    Wrapped {
        #[serde(default)]
        events: Vec<BigEvent>,
    },
    Bare(Vec<BigEvent>),
}

#[derive(Debug)]
pub struct Analyst<C> {
    completion: C,
}

impl<C: ChatCompletion> Analyst<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }

    /// One completion call parsed into `T`.
    async fn structured<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<(T, Option<TokenUsage>)> {
        let completion = self.completion.complete(system, user).await?;
        let payload = extract_json(&completion.content);
        match serde_json::from_str::<T>(payload) {
            Ok(value) => Ok((value, completion.usage)),
            Err(e) => {
                warn!(
                    truncated = looks_truncated(&e),
                    error = %e,
                    response_preview = %truncate_for_log(payload, 300),
                    "Model returned non-conforming JSON"
                );
                Err(e.into())
            }
        }
    }

    /// Analyze a single trend title.
    ///
    /// # Errors
    ///
    /// Only [`Error::MissingCredential`]; every other failure yields
    /// [`GeneMapAnalysis::fallback`] with `fallback: true`.
    #[instrument(level = "info", skip(self))]
    pub async fn analyze_item(&self, title: &str) -> Result<Analysis> {
        let t0 = Instant::now();
        match self
            .structured::<GeneMapAnalysis>(prompts::ITEM_SYSTEM, &prompts::item_user(title))
            .await
        {
            Ok((analysis, usage)) => {
                info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Item analyzed");
                Ok(Analysis {
                    analysis: analysis.normalized(),
                    usage,
                    fallback: false,
                })
            }
            Err(Error::MissingCredential) => Err(Error::MissingCredential),
            Err(e) => {
                warn!(error = %e, "Item analysis failed; using fallback record");
                Ok(Analysis {
                    analysis: GeneMapAnalysis::fallback(),
                    usage: None,
                    fallback: true,
                })
            }
        }
    }

    /// Analyze the first `limit` items as a whole.
    ///
    /// # Errors
    ///
    /// [`Error::MissingCredential`], or [`Error::AnalysisFailed`] for any
    /// other failure. There is no fallback record.
    #[instrument(level = "info", skip_all, fields(items = items.len(), limit = limit))]
    pub async fn analyze_aggregate(&self, items: &[TrendItem], limit: usize) -> Result<Analysis> {
        let t0 = Instant::now();
        match self
            .structured::<GeneMapAnalysis>(
                prompts::AGGREGATE_SYSTEM,
                &prompts::aggregate_user(items, limit),
            )
            .await
        {
            Ok((analysis, usage)) => {
                info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Aggregate analyzed");
                Ok(Analysis {
                    analysis: analysis.normalized(),
                    usage,
                    fallback: false,
                })
            }
            Err(Error::MissingCredential) => Err(Error::MissingCredential),
            Err(e) => Err(Error::AnalysisFailed(e.to_string())),
        }
    }

    /// Flag long-running topics among the first `limit` items.
    ///
    /// # Errors
    ///
    /// Only [`Error::MissingCredential`]; other failures yield no events.
    #[instrument(level = "info", skip_all, fields(items = items.len(), limit = limit))]
    pub async fn detect_big_events(&self, items: &[TrendItem], limit: usize) -> Result<BigEvents> {
        match self
            .structured::<EventsPayload>(prompts::EVENTS_SYSTEM, &prompts::events_user(items, limit))
            .await
        {
            Ok((payload, usage)) => {
                let events = match payload {
                    EventsPayload::Wrapped { events } | EventsPayload::Bare(events) => events,
                };
                debug!(count = events.len(), "Big events detected");
                Ok(BigEvents { events, usage })
            }
            Err(Error::MissingCredential) => Err(Error::MissingCredential),
            Err(e) => {
                warn!(error = %e, "Big event detection failed; reporting none");
                Ok(BigEvents {
                    events: Vec::new(),
                    usage: None,
                })
            }
        }
    }

    /// Aggregate analysis and big-event detection, run concurrently.
    ///
    /// Waits for both; fails if either fails.
    #[instrument(level = "info", skip_all, fields(items = items.len(), limit = limit))]
    pub async fn overview(&self, items: &[TrendItem], limit: usize) -> Result<Overview> {
        let (aggregate, events) = futures::future::join(
            self.analyze_aggregate(items, limit),
            self.detect_big_events(items, limit),
        )
        .await;
        let (aggregate, events) = (aggregate?, events?);

        let usage = aggregate.usage.unwrap_or_default() + events.usage.unwrap_or_default();
        info!(
            events = events.events.len(),
            total_tokens = usage.total_tokens,
            "Overview complete"
        );
        Ok(Overview {
            analysis: aggregate.analysis,
            events: events.events,
            usage,
        })
    }
}
