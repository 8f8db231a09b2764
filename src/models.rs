//! Data models for trend items and their gene-map analyses.
//!
//! This module defines the core data structures used throughout the application:
//! - [`TrendItem`]: One ranked topic from a single fetch cycle
//! - [`Category`]: The closed set of topical categories
//! - [`GeneMapAnalysis`]: LLM-produced four-dimension analysis with keywords
//! - [`BigEvent`]: A long-running topic flagged by event detection
//! - [`TokenUsage`]: Usage counters returned by the completion service
//! - [`TrendSnapshot`]: A fetch cycle as written to disk
//!
//! Field names serialize as camelCase to match the JSON exchanged with the
//! completion service and the snapshot files.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Add;

/// Topical category assigned to a trend item.
///
/// Serialized as its Chinese label, which is also what the completion
/// service is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "娱乐明星")]
    Entertainment,
    #[serde(rename = "体育赛事")]
    Sports,
    #[serde(rename = "科技数码")]
    Technology,
    #[serde(rename = "财经商业")]
    Finance,
    #[serde(rename = "国际时事")]
    World,
    #[serde(rename = "社会民生")]
    Society,
}

impl Category {
    /// Category used when nothing else matches.
    pub const DEFAULT: Category = Category::Society;

    pub const ALL: [Category; 6] = [
        Category::Entertainment,
        Category::Sports,
        Category::Technology,
        Category::Finance,
        Category::World,
        Category::Society,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Entertainment => "娱乐明星",
            Category::Sports => "体育赛事",
            Category::Technology => "科技数码",
            Category::Finance => "财经商业",
            Category::World => "国际时事",
            Category::Society => "社会民生",
        }
    }

    /// Resolve a label produced by an external party, falling back to
    /// [`Category::DEFAULT`] for anything outside the fixed set.
    pub fn from_label(label: &str) -> Category {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Category::DEFAULT)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A ranked trending topic for one fetch cycle.
///
/// Titles are assumed unique within a snapshot; they double as the
/// analysis cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendItem {
    pub rank: u32,
    pub title: String,
    pub hot_value: u64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_rise: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One labeled dimension of a gene-map analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub label: String,
    pub analysis: String,
}

impl Dimension {
    pub fn new(label: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            analysis: analysis.into(),
        }
    }
}

/// Gene-map analysis of a single item or of a whole snapshot.
///
/// Immutable once built; single-item analyses are cached by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneMapAnalysis {
    #[serde(deserialize_with = "lenient_score")]
    pub virality_score: u8,
    pub sentiment: Dimension,
    pub domain: Dimension,
    pub content_form: Dimension,
    pub lifecycle: Dimension,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Upper bound on keywords kept from a model answer.
pub const MAX_KEYWORDS: usize = 8;

impl GeneMapAnalysis {
    /// The record returned for a per-item analysis that could not be produced.
    pub fn fallback() -> Self {
        let unknown = || Dimension::new("未知", "暂无分析");
        Self {
            virality_score: 0,
            sentiment: unknown(),
            domain: unknown(),
            content_form: unknown(),
            lifecycle: unknown(),
            keywords: Vec::new(),
        }
    }

    /// Trim, de-duplicate and cap the keyword list.
    pub fn normalized(mut self) -> Self {
        self.keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unique()
            .take(MAX_KEYWORDS)
            .collect();
        self
    }
}

/// Accepts integers, floats and numeric strings; clamps into 0..=100.
fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let raw = raw.ok_or_else(|| {
        <D::Error as serde::de::Error>::custom(format!("invalid score: {value}"))
    })?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// A topic judged to have been trending for an extended duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigEvent {
    pub title: String,
    pub reason: String,
    pub duration_label: String,
}

/// Token counters reported by the completion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            total_tokens: self.total_tokens + rhs.total_tokens,
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
        }
    }
}

/// One fetch cycle as written by `fetch --json-output-dir`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrendSnapshot {
    /// The date of the fetch in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the fetch.
    pub local_time: String,
    /// Which tier of the source chain produced the items.
    pub source: String,
    pub items: Vec<TrendItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Technology).unwrap();
        assert_eq!(json, "\"科技数码\"");
        let back: Category = serde_json::from_str("\"社会民生\"").unwrap();
        assert_eq!(back, Category::Society);
    }

    #[test]
    fn test_category_from_unknown_label_is_default() {
        assert_eq!(Category::from_label("娱乐明星"), Category::Entertainment);
        assert_eq!(Category::from_label(" 财经商业 "), Category::Finance);
        assert_eq!(Category::from_label("天气"), Category::DEFAULT);
        assert_eq!(Category::from_label(""), Category::DEFAULT);
    }

    #[test]
    fn test_analysis_parses_camel_case_and_lenient_score() {
        let raw = r#"{
            "viralityScore": "87.6",
            "sentiment": {"label": "正面", "analysis": "整体积极"},
            "domain": {"label": "科技", "analysis": "数码产品"},
            "contentForm": {"label": "图文", "analysis": "以图片为主"},
            "lifecycle": {"label": "爆发期", "analysis": "快速上升"},
            "keywords": ["手机", " 发布会 ", "手机", ""]
        }"#;
        let parsed: GeneMapAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.virality_score, 88);
        let parsed = parsed.normalized();
        assert_eq!(parsed.keywords, vec!["手机", "发布会"]);
        assert_eq!(parsed.content_form.label, "图文");
    }

    #[test]
    fn test_score_is_clamped() {
        let raw = r#"{
            "viralityScore": 250,
            "sentiment": {"label": "a", "analysis": "b"},
            "domain": {"label": "a", "analysis": "b"},
            "contentForm": {"label": "a", "analysis": "b"},
            "lifecycle": {"label": "a", "analysis": "b"}
        }"#;
        let parsed: GeneMapAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.virality_score, 100);
        assert!(parsed.keywords.is_empty());
    }

    #[test]
    fn test_keywords_capped() {
        let mut analysis = GeneMapAnalysis::fallback();
        analysis.keywords = (0..12).map(|i| format!("k{i}")).collect();
        assert_eq!(analysis.normalized().keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_fallback_is_all_unknown() {
        let f = GeneMapAnalysis::fallback();
        assert_eq!(f.virality_score, 0);
        for d in [&f.sentiment, &f.domain, &f.content_form, &f.lifecycle] {
            assert_eq!(d.label, "未知");
        }
    }

    #[test]
    fn test_token_usage_adds() {
        let a = TokenUsage { total_tokens: 10, prompt_tokens: 7, completion_tokens: 3 };
        let b = TokenUsage { total_tokens: 5, prompt_tokens: 1, completion_tokens: 4 };
        assert_eq!(a + b, TokenUsage { total_tokens: 15, prompt_tokens: 8, completion_tokens: 7 });
    }

    #[test]
    fn test_trend_item_skips_absent_optionals() {
        let item = TrendItem {
            rank: 1,
            title: "话题".into(),
            hot_value: 10,
            category: Category::Society,
            heat_rise: None,
            description: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"rank":1,"title":"话题","hotValue":10,"category":"社会民生"}"#
        );
    }
}
