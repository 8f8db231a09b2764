//! Markdown rendering of trend lists and analyses for the terminal or a file.

use crate::analysis::Overview;
use crate::models::{GeneMapAnalysis, TokenUsage, TrendItem};
use std::fmt::Write;

/// Render `items` as a Markdown table.
pub fn trends_to_markdown(items: &[TrendItem]) -> String {
    let mut md = String::new();
    md.push_str("| # | 话题 | 热度 | 10分钟上升 | 分类 |\n");
    md.push_str("|---|------|------|------------|------|\n");
    for item in items {
        let rise = item
            .heat_rise
            .map(|r| format!("+{r}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            item.rank,
            item.title.replace('|', "\\|"),
            item.hot_value,
            rise,
            item.category
        );
    }
    md
}

/// Render one gene-map analysis under `heading`.
pub fn analysis_to_markdown(heading: &str, analysis: &GeneMapAnalysis) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "## {heading}\n");
    let _ = writeln!(md, "**传播指数:** {}/100\n", analysis.virality_score);
    for (name, dim) in [
        ("情感", &analysis.sentiment),
        ("领域", &analysis.domain),
        ("内容形式", &analysis.content_form),
        ("生命周期", &analysis.lifecycle),
    ] {
        let _ = writeln!(md, "- **{name}:** {} — {}", dim.label, dim.analysis);
    }
    if !analysis.keywords.is_empty() {
        let _ = writeln!(md, "\n**关键词:** {}", analysis.keywords.join(" · "));
    }
    md
}

fn usage_line(usage: &TokenUsage) -> String {
    format!(
        "_tokens: {} total ({} prompt / {} completion)_",
        usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
    )
}

/// Render an aggregate overview with its big events.
pub fn overview_to_markdown(overview: &Overview) -> String {
    let mut md = analysis_to_markdown("整体态势", &overview.analysis);
    md.push_str("\n## 大事件\n\n");
    if overview.events.is_empty() {
        md.push_str("暂无\n");
    }
    for event in &overview.events {
        let _ = writeln!(
            md,
            "- **{}** ({}) — {}",
            event.title, event.duration_label, event.reason
        );
    }
    let _ = writeln!(md, "\n{}", usage_line(&overview.usage));
    md
}
