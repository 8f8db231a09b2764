//! Turning raw entries into [`TrendItem`]s.
//!
//! Source entries are coerced permissively: missing numbers default, numeric
//! strings are accepted, and only an entry without a usable title is dropped.

use crate::classifier::classify;
use crate::heat::estimate_rise;
use crate::models::{Category, TrendItem};
use serde_json::Value;

/// Upper bound on items in one fetch cycle.
pub const MAX_ITEMS: usize = 51;

/// Non-negative integer from a number or numeric string; floats are floored
/// and negatives clamp to zero.
fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    let as_float = match value? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u);
            }
            n.as_f64()?
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if as_float.is_finite() && as_float > 0.0 {
        Some(as_float.floor() as u64)
    } else {
        Some(0)
    }
}

fn lenient_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Rank from `value` when positive, else the 1-based `index`.
fn rank_or_position(value: Option<&Value>, index: usize) -> u32 {
    lenient_u64(value)
        .filter(|r| *r > 0)
        .and_then(|r| u32::try_from(r).ok())
        .unwrap_or((index + 1) as u32)
}

/// Normalize entries of a source response (`{word, hot_value, position}`).
///
/// Category and heat rise are always derived locally.
pub fn normalize_source_entries(entries: &[Value]) -> Vec<TrendItem> {
    entries
        .iter()
        .take(MAX_ITEMS)
        .enumerate()
        .filter_map(|(index, entry)| {
            let title = lenient_text(entry.get("word"))?;
            let hot_value = lenient_u64(entry.get("hot_value")).unwrap_or(0);
            Some(TrendItem {
                rank: rank_or_position(entry.get("position"), index),
                category: classify(&title),
                heat_rise: Some(estimate_rise(hot_value)),
                hot_value,
                title,
                description: None,
            })
        })
        .collect()
}

/// Normalize items synthesized by the completion service
/// (`{rank, title, hotValue, category, description}`).
///
/// The generated category is trusted. A missing `heatRise` is back-filled
/// with an estimate.
pub fn normalize_generated(entries: &[Value]) -> Vec<TrendItem> {
    entries
        .iter()
        .take(MAX_ITEMS)
        .enumerate()
        .filter_map(|(index, entry)| {
            let title = lenient_text(entry.get("title"))?;
            let hot_value = lenient_u64(entry.get("hotValue")).unwrap_or(0);
            let category = entry
                .get("category")
                .and_then(Value::as_str)
                .map(Category::from_label)
                .unwrap_or(Category::DEFAULT);
            Some(TrendItem {
                rank: rank_or_position(entry.get("rank"), index),
                title,
                hot_value,
                category,
                heat_rise: lenient_u64(entry.get("heatRise"))
                    .or_else(|| Some(estimate_rise(hot_value))),
                description: lenient_text(entry.get("description")),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_example_entry_normalizes() {
        let entries = vec![json!({"word": "测试话题后续", "hot_value": 5_000_000, "position": 3})];
        let items = normalize_source_entries(&entries);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.rank, 3);
        assert_eq!(item.title, "测试话题后续");
        assert_eq!(item.hot_value, 5_000_000);
        assert_eq!(item.category, Category::Society);
        let rise = item.heat_rise.unwrap();
        assert!((50_000..400_000).contains(&rise), "rise={rise}");
    }

    #[test]
    fn test_rank_falls_back_to_position_in_list() {
        let entries = vec![
            json!({"word": "甲", "hot_value": 10}),
            json!({"word": "乙", "hot_value": 9, "position": 0}),
            json!({"word": "丙", "hot_value": 8, "position": -4}),
            json!({"word": "丁", "hot_value": 7, "position": "7"}),
        ];
        let ranks: Vec<u32> = normalize_source_entries(&entries).iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_source_category_is_discarded() {
        let entries = vec![json!({"word": "华为手机发布会", "hot_value": 1, "category": "娱乐明星"})];
        assert_eq!(normalize_source_entries(&entries)[0].category, Category::Technology);
    }

    #[test]
    fn test_hot_value_coercion() {
        let entries = vec![
            json!({"word": "a", "hot_value": "12345"}),
            json!({"word": "b", "hot_value": 99.9}),
            json!({"word": "c", "hot_value": -5}),
            json!({"word": "d"}),
            json!({"word": "e", "hot_value": "lots"}),
        ];
        let hot: Vec<u64> = normalize_source_entries(&entries).iter().map(|i| i.hot_value).collect();
        assert_eq!(hot, vec![12345, 99, 0, 0, 0]);
    }

    #[test]
    fn test_entries_without_title_are_skipped() {
        let entries = vec![json!({"hot_value": 1}), json!({"word": "  "}), json!("x"), json!({"word": "ok"})];
        let items = normalize_source_entries(&entries);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].rank, 4);
    }

    #[test]
    fn test_truncates_to_max_items() {
        let entries: Vec<Value> = (0..80)
            .map(|i| json!({"word": format!("话题{i}"), "hot_value": 1000 - i}))
            .collect();
        let items = normalize_source_entries(&entries);
        assert_eq!(items.len(), MAX_ITEMS);
        assert_eq!(items.last().unwrap().rank, MAX_ITEMS as u32);
    }

    #[test]
    fn test_generated_items_trust_category() {
        let entries = vec![
            json!({"rank": 1, "title": "测试话题后续", "hotValue": 800000, "category": "科技数码", "description": "说明"}),
            json!({"rank": 0, "title": "其他", "hotValue": "500", "category": "不存在"}),
        ];
        let items = normalize_generated(&entries);
        assert_eq!(items[0].category, Category::Technology);
        assert_eq!(items[0].description.as_deref(), Some("说明"));
        assert!(items[0].heat_rise.is_some());
        assert_eq!(items[1].rank, 2);
        assert_eq!(items[1].hot_value, 500);
        assert_eq!(items[1].category, Category::DEFAULT);
    }

    #[test]
    fn test_generated_heat_rise_is_kept_when_present() {
        let entries = vec![
            json!({"rank": 1, "title": "甲", "hotValue": 1_000_000, "heatRise": "12345"}),
            json!({"rank": 2, "title": "乙", "hotValue": 1_000_000}),
        ];
        let items = normalize_generated(&entries);
        assert_eq!(items[0].heat_rise, Some(12_345));
        let estimated = items[1].heat_rise.unwrap();
        assert!((10_000..80_000).contains(&estimated), "rise={estimated}");
    }
}
