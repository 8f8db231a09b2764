//! Prompt text for the completion service.
//!
//! Each request pairs a fixed system prompt with a user prompt built from the
//! current trend list. Every prompt asks for a single JSON value so answers
//! can go straight to serde.

use crate::models::{Category, TrendItem};
use itertools::Itertools;

pub const ITEM_SYSTEM: &str = r#"You are a social-media trend analyst. Analyze one trending topic and answer with a single JSON object:
{
  "viralityScore": 0-100 integer,
  "sentiment":   {"label": "2-4 字标签", "analysis": "one or two sentences"},
  "domain":      {"label": "...", "analysis": "..."},
  "contentForm": {"label": "...", "analysis": "..."},
  "lifecycle":   {"label": "萌芽期|爆发期|高峰期|衰退期", "analysis": "..."},
  "keywords": ["3 to 8 short keywords"]
}
Answer in Chinese. Output JSON only."#;

pub const AGGREGATE_SYSTEM: &str = r#"You are a social-media trend analyst. You receive the current trending list and describe the overall climate as a single JSON object with the same shape as a per-topic analysis:
{
  "viralityScore": 0-100 integer for the list as a whole,
  "sentiment":   {"label": "...", "analysis": "..."},
  "domain":      {"label": "dominant domains", "analysis": "..."},
  "contentForm": {"label": "...", "analysis": "..."},
  "lifecycle":   {"label": "...", "analysis": "..."},
  "keywords": ["3 to 8 keywords for the whole list"]
}
Answer in Chinese. Output JSON only."#;

pub const EVENTS_SYSTEM: &str = r#"You are a social-media trend analyst. From the trending list, pick the topics that have most likely been trending for an extended time (big events). Answer with a single JSON object:
{"events": [{"title": "exact title from the list", "reason": "why it is a big event", "durationLabel": "e.g. 持续3天"}]}
Return an empty list when nothing qualifies. Output JSON only."#;

pub const GENERATE_SYSTEM: &str = r#"You simulate a Chinese social-media hot-search board. Produce plausible, varied trending topics for today as a single JSON object:
{"items": [{"rank": 1, "title": "...", "hotValue": integer, "category": "one of the allowed categories", "description": "one sentence"}]}
Output JSON only."#;

pub fn item_user(title: &str) -> String {
    format!("Trending topic: {title}")
}

/// Compact `rank. title (hot)` listing of the first `limit` items.
pub fn trend_listing(items: &[TrendItem], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .map(|i| format!("{}. {} ({})", i.rank, i.title, i.hot_value))
        .join("\n")
}

pub fn aggregate_user(items: &[TrendItem], limit: usize) -> String {
    format!(
        "Current trending list (top {}):\n{}",
        limit.min(items.len()),
        trend_listing(items, limit)
    )
}

pub fn events_user(items: &[TrendItem], limit: usize) -> String {
    format!(
        "Trending list:\n{}\n\nWhich of these are big events?",
        trend_listing(items, limit)
    )
}

pub fn generate_user(count: usize, date: &str) -> String {
    let categories = Category::ALL.iter().map(|c| c.label()).join("、");
    format!(
        "Date: {date}\nGenerate {count} topics ranked 1..{count}, hotValue descending between 100000 and 10000000.\nAllowed categories: {categories}"
    )
}
