//! Keyword-scoring category classifier.
//!
//! Each category owns a fixed list of keyword substrings. A title scores one
//! point per keyword it contains (case-sensitive, no tokenization); the
//! category with the strictly highest score wins, ties go to the category
//! listed first, and a title with no hits falls back to [`Category::DEFAULT`].

use crate::models::Category;

/// Keyword table, in tie-breaking order.
static KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Entertainment,
        &[
            "明星", "演唱会", "电影", "综艺", "官宣", "恋情", "票房", "电视剧", "偶像", "歌手",
            "热播", "导演",
        ],
    ),
    (
        Category::Sports,
        &[
            "比赛", "夺冠", "冠军", "球队", "足球", "篮球", "国足", "奥运", "世界杯", "NBA",
            "运动员", "联赛", "赛季",
        ],
    ),
    (
        Category::Technology,
        &[
            "手机", "芯片", "AI", "人工智能", "苹果", "华为", "发布会", "科技", "数码", "机器人",
            "新能源", "互联网",
        ],
    ),
    (
        Category::Finance,
        &[
            "股市", "A股", "基金", "经济", "房价", "涨价", "降息", "银行", "上市", "财报", "黄金",
            "油价", "消费",
        ],
    ),
    (
        Category::World,
        &[
            "美国", "俄罗斯", "乌克兰", "日本", "联合国", "总统", "外交", "国际", "欧盟", "中东",
            "以色列", "特朗普",
        ],
    ),
    (
        Category::Society,
        &[
            "警方", "通报", "学生", "高考", "医院", "地震", "暴雨", "事故", "政策", "养老", "就业",
            "教育",
        ],
    ),
];

/// Number of keywords of `keywords` that occur in `title`.
fn score(title: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| title.contains(*k)).count()
}

/// Map a free-text trend title onto a category. Total over all inputs.
pub fn classify(title: &str) -> Category {
    let mut best = Category::DEFAULT;
    let mut best_score = 0usize;
    for (category, keywords) in KEYWORDS {
        let s = score(title, keywords);
        if s > best_score {
            best = *category;
            best_score = s;
        }
    }
    best
}
